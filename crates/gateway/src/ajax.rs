//! Action-style endpoint: one form-encoded POST route, dispatched on the
//! `action` field. Responses use the `{"success": bool, "data": ...}`
//! envelope the admin scripts expect.

use std::collections::HashMap;

use {
    axum::{
        Form, Json,
        extract::State,
        http::StatusCode,
        response::{IntoResponse, Response},
    },
    clawpress_onboarding::{
        CreateAssistantError, NewAssistant, service::CreateAssistantRequest,
    },
    serde::Serialize,
    tracing::{info, warn},
};

use crate::{
    auth_middleware::{CurrentUser, Viewer},
    nonce::NonceAction,
    server::AppState,
    state::GatewayState,
    users::Capability,
};

/// Endpoint every admin action posts to.
pub const AJAX_PATH: &str = "/admin/ajax";

pub const CREATE_ASSISTANT_ACTION: &str = "clawpress_create_assistant";

pub const MOCK_ACTION: &str = "clawpress_assistant_mock_action";

/// Form field carrying the request token.
pub const NONCE_FIELD: &str = "_nonce";

#[derive(Debug, thiserror::Error)]
pub enum AjaxError {
    #[error("Not allowed.")]
    Unauthorized,
    #[error("{0}")]
    Validation(&'static str),
    #[error("{0}")]
    Rejected(String),
    #[error("Unknown action.")]
    UnknownAction,
    #[error("Something went wrong.")]
    Internal(#[source] anyhow::Error),
}

impl AjaxError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::FORBIDDEN,
            Self::Validation(_) | Self::UnknownAction => StatusCode::BAD_REQUEST,
            Self::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CreateAssistantError> for AjaxError {
    fn from(e: CreateAssistantError) -> Self {
        match e {
            CreateAssistantError::Rejected(message) => Self::Rejected(message),
            CreateAssistantError::Internal(e) => Self::Internal(e),
        }
    }
}

impl IntoResponse for AjaxError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(Envelope {
                success: false,
                data: Some(self.to_string()),
            }),
        )
            .into_response()
    }
}

#[derive(Debug, Serialize)]
struct Envelope<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

/// Payload of a successful creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssistantCreated {
    pub user_id: i64,
    pub chat_url: String,
}

pub async fn ajax_handler(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    let gw = &state.gateway;
    let action = fields.get("action").map(String::as_str).unwrap_or_default();
    let result = match action {
        CREATE_ASSISTANT_ACTION => create_assistant(gw, viewer.as_ref(), &fields)
            .await
            .map(|created| {
                Json(Envelope {
                    success: true,
                    data: Some(created),
                })
                .into_response()
            }),
        MOCK_ACTION => mock_action(gw, viewer.as_ref(), &fields).map(|()| {
            Json(Envelope::<()> {
                success: true,
                data: None,
            })
            .into_response()
        }),
        _ => Err(AjaxError::UnknownAction),
    };

    result.unwrap_or_else(|e| {
        match &e {
            AjaxError::Internal(source) => warn!(action, error = %source, "action failed"),
            other => warn!(action, error = %other, "action rejected"),
        }
        e.into_response()
    })
}

/// Validate the submission, check token and capability, then hand it to the
/// creation collaborator.
pub async fn create_assistant(
    gw: &GatewayState,
    viewer: Option<&Viewer>,
    fields: &HashMap<String, String>,
) -> Result<AssistantCreated, AjaxError> {
    let assistant = NewAssistant::from_request(&creation_request(fields))
        .map_err(|e| AjaxError::Validation(e.0))?;
    authorize(gw, viewer, fields, NonceAction::CreateAssistant)?;

    let user_id = gw.creator.create_assistant(&assistant).await?;
    info!(user_id, name = %assistant.name, "assistant created");
    Ok(AssistantCreated {
        user_id,
        chat_url: gw.chat_url(),
    })
}

/// Acknowledge a chat-side action. Nothing is stored.
pub fn mock_action(
    gw: &GatewayState,
    viewer: Option<&Viewer>,
    fields: &HashMap<String, String>,
) -> Result<(), AjaxError> {
    authorize(gw, viewer, fields, NonceAction::AssistantChat)
}

fn authorize(
    gw: &GatewayState,
    viewer: Option<&Viewer>,
    fields: &HashMap<String, String>,
    action: NonceAction,
) -> Result<(), AjaxError> {
    let viewer = viewer.ok_or(AjaxError::Unauthorized)?;
    let token = fields.get(NONCE_FIELD).map(String::as_str).unwrap_or_default();
    if !viewer.verify_nonce(gw, token, action) {
        return Err(AjaxError::Unauthorized);
    }
    if !viewer.can(Capability::ManageOptions) {
        return Err(AjaxError::Unauthorized);
    }
    Ok(())
}

fn creation_request(fields: &HashMap<String, String>) -> CreateAssistantRequest {
    let field = |name: &str| fields.get(name).cloned();
    CreateAssistantRequest {
        name: field("name"),
        avatar: field("avatar"),
        vibe: field("vibe"),
        goals: field("goals"),
        extra: field("extra"),
        site_title: field("site_title"),
        site_tagline: field("site_tagline"),
        about_content: field("about_content"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn error_status_codes() {
        assert_eq!(AjaxError::Unauthorized.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AjaxError::Validation("Name is required.").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AjaxError::Rejected("taken".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(AjaxError::UnknownAction.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AjaxError::Internal(anyhow::anyhow!("db gone")).to_string(),
            "Something went wrong."
        );
    }

    #[test]
    fn envelope_shapes() {
        let ok = serde_json::to_value(Envelope {
            success: true,
            data: Some(AssistantCreated {
                user_id: 3,
                chat_url: "http://x/admin/assistant/chat".into(),
            }),
        })
        .unwrap();
        assert_eq!(
            ok,
            serde_json::json!({"success": true, "data": {"user_id": 3, "chat_url": "http://x/admin/assistant/chat"}})
        );

        let bare = serde_json::to_value(Envelope::<()> {
            success: true,
            data: None,
        })
        .unwrap();
        assert_eq!(bare, serde_json::json!({"success": true}));
    }

    #[test]
    fn request_fields_are_picked_from_form() {
        let fields: HashMap<String, String> = [
            ("action", CREATE_ASSISTANT_ACTION),
            ("name", "Sage"),
            ("vibe", "playful"),
            ("_nonce", "abc"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();
        let req = creation_request(&fields);
        assert_eq!(req.name.as_deref(), Some("Sage"));
        assert_eq!(req.vibe.as_deref(), Some("playful"));
        assert_eq!(req.goals, None);
    }
}
