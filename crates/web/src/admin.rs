//! Admin chrome: which screen is showing, the navigation menu, and the
//! "create your assistant" notice on the roster.

use {
    clawpress_gateway::users::User,
    clawpress_onboarding::service::{CHAT_PAGE_PATH, SETUP_PAGE_PATH},
};

pub const USERS_PAGE_PATH: &str = "/admin/users";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminScreen {
    Users,
    Profile,
    Setup,
    Chat,
    Login,
}

/// Informational banner with a call to action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: &'static str,
    pub body: &'static str,
    pub action_label: &'static str,
    pub action_href: &'static str,
}

/// The roster's invitation to run the setup wizard. Only on the roster, and
/// only while no assistant exists.
pub fn users_page_notice(screen: AdminScreen, assistant_exists: bool) -> Option<Notice> {
    if screen != AdminScreen::Users || assistant_exists {
        return None;
    }
    Some(Notice {
        title: "Want a hand around here?",
        body: "Create an AI assistant who knows your site and can help you manage it.",
        action_label: "Create Your Assistant",
        action_href: SETUP_PAGE_PATH,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub label: String,
    pub href: &'static str,
    pub active: bool,
}

/// Navigation entries. The setup page never appears here; the chat entry
/// only once an assistant exists.
pub fn admin_menu(screen: AdminScreen, assistant: Option<&User>) -> Vec<MenuItem> {
    if screen == AdminScreen::Login {
        return Vec::new();
    }
    let mut items = vec![MenuItem {
        label: "Users".to_owned(),
        href: USERS_PAGE_PATH,
        active: matches!(screen, AdminScreen::Users | AdminScreen::Profile),
    }];
    if let Some(assistant) = assistant {
        items.push(MenuItem {
            label: format!("\u{1f4ac} {}", assistant.display_name),
            href: CHAT_PAGE_PATH,
            active: screen == AdminScreen::Chat,
        });
    }
    items
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use clawpress_gateway::users::Role;

    use super::*;

    fn sage() -> User {
        User {
            id: 2,
            login: "sage".into(),
            display_name: "Sage".into(),
            email: String::new(),
            roles: vec![Role::AiAssistant],
            created_at: 0,
        }
    }

    #[test]
    fn notice_only_on_roster_without_assistant() {
        let notice = users_page_notice(AdminScreen::Users, false).unwrap();
        assert_eq!(notice.action_href, "/admin/assistant/setup");
        assert_eq!(notice.action_label, "Create Your Assistant");

        assert!(users_page_notice(AdminScreen::Users, true).is_none());
        for screen in [
            AdminScreen::Profile,
            AdminScreen::Setup,
            AdminScreen::Chat,
            AdminScreen::Login,
        ] {
            assert!(users_page_notice(screen, false).is_none());
        }
    }

    #[test]
    fn chat_entry_follows_assistant() {
        let menu = admin_menu(AdminScreen::Users, None);
        assert_eq!(menu.len(), 1);
        assert!(menu[0].active);

        let assistant = sage();
        let menu = admin_menu(AdminScreen::Chat, Some(&assistant));
        assert_eq!(menu[1].label, "\u{1f4ac} Sage");
        assert_eq!(menu[1].href, "/admin/assistant/chat");
        assert!(menu[1].active);
        assert!(!menu[0].active);
        assert!(menu.iter().all(|i| i.href != "/admin/assistant/setup"));

        assert!(admin_menu(AdminScreen::Login, Some(&assistant)).is_empty());
    }
}
