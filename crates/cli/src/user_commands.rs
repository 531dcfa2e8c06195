use {
    anyhow::Result,
    clap::Subcommand,
    clawpress_config::ClawpressConfig,
    clawpress_gateway::{
        state::open_pool,
        users::{NewUser, Role, SqliteUserStore, UserStore},
    },
};

#[derive(Subcommand)]
pub enum UserAction {
    /// Create an account that can sign in to the admin pages.
    Add {
        #[arg(long)]
        login: String,
        #[arg(long)]
        email: String,
        /// Sign-in password.
        #[arg(long, env = "CLAWPRESS_PASSWORD")]
        password: String,
        /// One of administrator, editor, author, contributor, subscriber.
        #[arg(long, default_value = "administrator")]
        role: String,
        /// Name shown in the roster (defaults to the login).
        #[arg(long)]
        display_name: Option<String>,
    },
    /// List every account.
    List,
}

pub async fn handle_user(action: UserAction, config: &ClawpressConfig) -> Result<()> {
    let store = SqliteUserStore::new(open_pool(config).await?).await?;
    match action {
        UserAction::Add {
            login,
            email,
            password,
            role,
            display_name,
        } => {
            let role: Role = role.parse().map_err(anyhow::Error::msg)?;
            if role == Role::AiAssistant {
                anyhow::bail!("assistant accounts are created with `clawpress onboard`");
            }
            let user = store
                .create_user(NewUser {
                    display_name: display_name.unwrap_or_else(|| login.clone()),
                    login,
                    email,
                    password: Some(password),
                    roles: vec![role],
                })
                .await?;
            println!("Created {} ({}) with id {}", user.login, role.label(), user.id);
        },
        UserAction::List => {
            let users = store.list().await?;
            if users.is_empty() {
                println!("No users yet.");
            }
            for user in &users {
                println!(
                    "  {:>4}  {:<20} {:<28} {}",
                    user.id,
                    user.login,
                    user.email,
                    user.role_labels()
                );
            }
        },
    }
    Ok(())
}
