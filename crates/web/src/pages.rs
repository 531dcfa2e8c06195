//! Page handlers for the admin screens and sign-in.

use {
    axum::{
        Form,
        extract::{Path, State},
        http::{HeaderMap, StatusCode, header::SET_COOKIE},
        response::{IntoResponse, Redirect, Response},
    },
    clawpress_gateway::{
        ajax::AJAX_PATH,
        auth::{clear_session_cookie, session_cookie},
        auth_middleware::{CurrentUser, Viewer, session_token},
        nonce::NonceAction,
        server::AppState,
        users::Capability,
    },
    clawpress_onboarding::{
        AVATAR_PALETTE, DEFAULT_AVATAR, Vibe,
        service::CHAT_PAGE_PATH,
    },
    serde::Deserialize,
    tracing::{debug, info, warn},
};

use crate::{
    admin::{AdminScreen, USERS_PAGE_PATH, users_page_notice},
    avatar::user_avatar,
    error::Result,
    profile::assistant_section,
    templates::{
        ChatBootstrap, ChatHeader, ChatTemplate, Chrome, LoginTemplate, ProfileTemplate,
        RosterRow, SetupBootstrap, SetupTemplate, UsersTemplate, VibeOption, render_page,
        script_safe_json,
    },
};

pub const LOGIN_PATH: &str = "/login";

const INVALID_LOGIN: &str = "Invalid username or password.";

fn login_redirect() -> Response {
    Redirect::to(LOGIN_PATH).into_response()
}

fn forbidden() -> Response {
    (
        StatusCode::FORBIDDEN,
        "Sorry, you are not allowed to access this page.",
    )
        .into_response()
}

/// The viewer when signed in with `capability`, otherwise the response to send
/// instead.
fn require(viewer: Option<Viewer>, capability: Capability) -> std::result::Result<Viewer, Response> {
    let Some(viewer) = viewer else {
        return Err(login_redirect());
    };
    if !viewer.can(capability) {
        debug!(user_id = viewer.user.id, ?capability, "page denied");
        return Err(forbidden());
    }
    Ok(viewer)
}

pub async fn home(CurrentUser(viewer): CurrentUser) -> Redirect {
    if viewer.is_some() {
        Redirect::to(USERS_PAGE_PATH)
    } else {
        Redirect::to(LOGIN_PATH)
    }
}

// ── Roster and profile ───────────────────────────────────────────────────────

pub async fn users_page(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
) -> Result<Response> {
    let viewer = match require(viewer, Capability::ListUsers) {
        Ok(viewer) => viewer,
        Err(response) => return Ok(response),
    };
    let gw = &state.gateway;
    let store = gw.users.as_ref();
    let assistant = store.find_assistant().await?;

    let mut rows = Vec::new();
    for user in store.list().await? {
        rows.push(RosterRow {
            avatar_html: user_avatar(store, &user).await,
            id: user.id,
            roles: user.role_labels(),
            display_name: user.display_name,
            login: user.login,
            email: user.email,
        });
    }

    let chrome = Chrome::new(
        gw,
        AdminScreen::Users,
        "Users",
        Some(&viewer),
        assistant.as_ref(),
    );
    let template = UsersTemplate {
        chrome: &chrome,
        notice: users_page_notice(AdminScreen::Users, assistant.is_some()),
        rows: &rows,
    };
    render_page(&template, &chrome, StatusCode::OK)
}

pub async fn profile_page(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Response> {
    let Some(viewer) = viewer else {
        return Ok(login_redirect());
    };
    if viewer.user.id != id && !viewer.can(Capability::ManageOptions) {
        return Ok(forbidden());
    }
    let gw = &state.gateway;
    let store = gw.users.as_ref();
    let Some(user) = store.get(id).await? else {
        return Ok((StatusCode::NOT_FOUND, "Invalid user ID.").into_response());
    };

    let assistant = store.find_assistant().await?;
    let avatar_html = user_avatar(store, &user).await;
    let section = assistant_section(store, &user).await?;
    let chrome = Chrome::new(
        gw,
        AdminScreen::Profile,
        format!("Edit User {}", user.display_name),
        Some(&viewer),
        assistant.as_ref(),
    );
    let template = ProfileTemplate {
        chrome: &chrome,
        user: &user,
        avatar_html: &avatar_html,
        roles: user.role_labels(),
        section,
    };
    render_page(&template, &chrome, StatusCode::OK)
}

// ── Assistant ────────────────────────────────────────────────────────────────

pub async fn setup_page(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
) -> Result<Response> {
    let viewer = match require(viewer, Capability::ManageOptions) {
        Ok(viewer) => viewer,
        Err(response) => return Ok(response),
    };
    let gw = &state.gateway;
    if let Some(assistant) = gw.users.find_assistant().await? {
        debug!(assistant = assistant.id, "assistant exists, skipping setup");
        return Ok(Redirect::to(CHAT_PAGE_PATH).into_response());
    }

    let bootstrap = SetupBootstrap {
        ajax_url: AJAX_PATH,
        nonce: viewer.nonce(gw, NonceAction::CreateAssistant),
        site_url: gw.base_url(),
        site: &gw.site,
        default_avatar: DEFAULT_AVATAR,
    };
    let chrome = Chrome::new(
        gw,
        AdminScreen::Setup,
        "Create Your Assistant",
        Some(&viewer),
        None,
    );
    let template = SetupTemplate {
        chrome: &chrome,
        site: &gw.site,
        about_preview: gw.site.about_preview(),
        palette: &AVATAR_PALETTE,
        vibes: Vibe::ALL
            .into_iter()
            .map(|vibe| VibeOption {
                value: vibe.as_str(),
                text: vibe.choice_text(),
            })
            .collect(),
        bootstrap_json: script_safe_json(&bootstrap),
    };
    render_page(&template, &chrome, StatusCode::OK)
}

pub async fn chat_page(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
) -> Result<Response> {
    let viewer = match require(viewer, Capability::ManageOptions) {
        Ok(viewer) => viewer,
        Err(response) => return Ok(response),
    };
    let gw = &state.gateway;
    let store = gw.users.as_ref();
    let assistant = store.find_assistant().await?;

    let (header, bootstrap_json) = match &assistant {
        Some(assistant) => {
            let avatar = store.avatar_glyph(assistant.id).await?;
            let bootstrap = ChatBootstrap {
                name: assistant.display_name.clone(),
                avatar: avatar.clone(),
                context: store.assistant_context(assistant.id).await?,
                ajax_url: AJAX_PATH.to_owned(),
                nonce: viewer.nonce(gw, NonceAction::AssistantChat),
                user_id: assistant.id,
                site_title: gw.site.title.clone(),
            };
            let header = ChatHeader {
                avatar,
                name: assistant.display_name.clone(),
            };
            (Some(header), script_safe_json(&bootstrap))
        },
        None => (None, "null".to_owned()),
    };

    let title = assistant
        .as_ref()
        .map_or_else(|| "Assistant".to_owned(), |a| a.display_name.clone());
    let chrome = Chrome::new(
        gw,
        AdminScreen::Chat,
        title,
        Some(&viewer),
        assistant.as_ref(),
    );
    let template = ChatTemplate {
        chrome: &chrome,
        header,
        bootstrap_json,
    };
    render_page(&template, &chrome, StatusCode::OK)
}

// ── Sign-in ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub login: String,
    pub password: String,
}

pub async fn login_page(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
) -> Result<Response> {
    if viewer.is_some() {
        return Ok(Redirect::to(USERS_PAGE_PATH).into_response());
    }
    render_login(&state, None, "", StatusCode::OK)
}

pub async fn login_submit(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let gw = &state.gateway;
    let login = form.login.trim();
    match gw.users.authenticate(login, &form.password).await? {
        Some(user) => {
            let token = gw.sessions.create(user.id).await?;
            info!(user_id = user.id, login = %user.login, "signed in");
            Ok((
                [(SET_COOKIE, session_cookie(&token, gw.sessions.ttl_secs()))],
                Redirect::to(USERS_PAGE_PATH),
            )
                .into_response())
        },
        None => {
            warn!(login, "sign-in rejected");
            render_login(&state, Some(INVALID_LOGIN), login, StatusCode::UNAUTHORIZED)
        },
    }
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers)
        && let Err(e) = state.gateway.sessions.delete(token).await
    {
        warn!(error = %e, "failed to delete session");
    }
    (
        [(SET_COOKIE, clear_session_cookie())],
        Redirect::to(LOGIN_PATH),
    )
        .into_response()
}

fn render_login(
    state: &AppState,
    error: Option<&str>,
    login: &str,
    status: StatusCode,
) -> Result<Response> {
    let chrome = Chrome::new(&state.gateway, AdminScreen::Login, "Log In", None, None);
    let template = LoginTemplate {
        chrome: &chrome,
        error,
        login,
    };
    render_page(&template, &chrome, status)
}
