mod user_commands;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    clawpress_config::ClawpressConfig,
    clawpress_gateway::{
        state::{GatewayState, open_pool},
        users::{SqliteUserStore, UserStore},
    },
    clawpress_onboarding::{ConnectionConfig, SiteFacts, wizard::run_wizard},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "clawpress", about = "ClawPress: give your site an AI assistant")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery in ./ and ~/.config/clawpress/).
    #[arg(long, global = true, env = "CLAWPRESS_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind to (overrides config value).
    #[arg(long, global = true)]
    bind: Option<String>,
    /// Port to listen on (overrides config value).
    #[arg(long, global = true)]
    port: Option<u16>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the admin server (default when no subcommand is provided).
    Serve,
    /// Create the site's assistant from the terminal.
    Onboard,
    /// Account management.
    User {
        #[command(subcommand)]
        action: user_commands::UserAction,
    },
    /// Print the snippet an external agent needs to act as the assistant.
    ConnectionConfig {
        /// Assistant display name.
        #[arg(long)]
        name: String,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "clawpress starting");

    let config = clawpress_config::discover_and_load_from(cli.config.as_deref())?;

    match cli.command {
        None | Some(Commands::Serve) => {
            let bind = cli.bind.unwrap_or_else(|| config.server.bind.clone());
            let port = cli.port.unwrap_or(config.server.port);
            let state = GatewayState::open(config).await?;
            clawpress_gateway::server::start_gateway(
                &bind,
                port,
                state,
                clawpress_web::web_routes(),
            )
            .await
        },
        Some(Commands::Onboard) => onboard(&config).await,
        Some(Commands::User { action }) => user_commands::handle_user(action, &config).await,
        Some(Commands::ConnectionConfig { name }) => {
            let name = name.trim();
            if name.is_empty() {
                anyhow::bail!("--name must not be empty");
            }
            let snippet = ConnectionConfig::new(&config.site.base_url(), name);
            println!("{}", snippet.to_pretty_json()?);
            Ok(())
        },
    }
}

async fn onboard(config: &ClawpressConfig) -> anyhow::Result<()> {
    let store = SqliteUserStore::new(open_pool(config).await?).await?;
    if let Some(existing) = store.find_assistant().await? {
        println!(
            "{} is already set up. Chat: {}",
            existing.display_name,
            clawpress_onboarding::service::chat_url(&config.site.base_url())
        );
        return Ok(());
    }

    let site = SiteFacts::from_config(&config.site);
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut out = std::io::stdout();
    let created = run_wizard(&mut input, &mut out, &store, &site, &config.site.base_url()).await?;
    if created.is_none() {
        println!();
        println!("Setup cancelled.");
    }
    Ok(())
}
