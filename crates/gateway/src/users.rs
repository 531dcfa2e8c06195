//! User accounts, roles and per-user metadata.
//!
//! The assistant is an ordinary account carrying the `ai_assistant` role. Its
//! avatar glyph and context live in the metadata table under
//! [`AVATAR_META_KEY`] and [`CONTEXT_META_KEY`].

use std::{fmt, str::FromStr};

use {
    anyhow::Result,
    async_trait::async_trait,
    clawpress_onboarding::{
        AssistantContext, AssistantCreator, CreateAssistantError, NewAssistant,
        avatar::avatar_or_default,
    },
    serde::{Deserialize, Serialize},
    sqlx::SqlitePool,
    tracing::{debug, info, warn},
};

use crate::auth::{hash_password, now_secs, verify_password};

/// Metadata key holding the assistant's avatar glyph.
pub const AVATAR_META_KEY: &str = "clawpress_avatar_emoji";

/// Metadata key holding the assistant's context as a JSON object.
pub const CONTEXT_META_KEY: &str = "clawpress_assistant_context";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Administrator,
    Editor,
    Author,
    Contributor,
    Subscriber,
    AiAssistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ManageOptions,
    ListUsers,
    EditPosts,
    Read,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Self::Administrator,
        Self::Editor,
        Self::Author,
        Self::Contributor,
        Self::Subscriber,
        Self::AiAssistant,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Administrator => "administrator",
            Self::Editor => "editor",
            Self::Author => "author",
            Self::Contributor => "contributor",
            Self::Subscriber => "subscriber",
            Self::AiAssistant => "ai_assistant",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Administrator => "Administrator",
            Self::Editor => "Editor",
            Self::Author => "Author",
            Self::Contributor => "Contributor",
            Self::Subscriber => "Subscriber",
            Self::AiAssistant => "AI Assistant",
        }
    }

    pub fn capabilities(self) -> &'static [Capability] {
        use Capability::*;
        match self {
            Self::Administrator => &[ManageOptions, ListUsers, EditPosts, Read],
            Self::Editor | Self::Author | Self::AiAssistant => &[EditPosts, Read],
            Self::Contributor | Self::Subscriber => &[Read],
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s.trim())
            .ok_or_else(|| format!("unknown role: {s}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub login: String,
    pub display_name: String,
    pub email: String,
    pub roles: Vec<Role>,
    pub created_at: i64,
}

impl User {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.roles
            .iter()
            .any(|r| r.capabilities().contains(&capability))
    }

    pub fn role_labels(&self) -> String {
        self.roles
            .iter()
            .map(|r| r.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Whether `user` is an assistant account.
pub fn is_ai_assistant(user: &User) -> bool {
    user.has_role(Role::AiAssistant)
}

/// Parameters for creating a regular account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub login: String,
    pub display_name: String,
    pub email: String,
    pub password: Option<String>,
    pub roles: Vec<Role>,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    login: String,
    display_name: String,
    email: String,
    roles: String,
    created_at: i64,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            roles: parse_roles(&r.roles),
            login: r.login,
            display_name: r.display_name,
            email: r.email,
            created_at: r.created_at,
        }
    }
}

fn parse_roles(raw: &str) -> Vec<Role> {
    raw.split(',')
        .filter(|s| !s.trim().is_empty())
        .filter_map(|s| match s.parse() {
            Ok(role) => Some(role),
            Err(e) => {
                warn!(error = %e, "ignoring stored role");
                None
            },
        })
        .collect()
}

fn join_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// Login name derived from a display name: lowercase letters and digits
/// (any script) joined by single hyphens.
pub fn assistant_login(name: &str) -> String {
    let mut login = String::new();
    for c in name.chars() {
        if c.is_alphanumeric() {
            login.extend(c.to_lowercase());
        } else if !login.is_empty() && !login.ends_with('-') {
            login.push('-');
        }
    }
    let login = login.trim_end_matches('-');
    if login.is_empty() {
        "assistant".to_owned()
    } else {
        login.to_owned()
    }
}

/// Attempts at claiming a login before giving up on concurrent inserts.
const LOGIN_ATTEMPTS: usize = 3;

fn duplicate_name(name: &str) -> String {
    format!("A user named \"{name}\" already exists.")
}

const USER_COLUMNS: &str = "id, login, display_name, email, roles, created_at";

const HAS_ASSISTANT_ROLE: &str = "(',' || roles || ',') LIKE '%,ai_assistant,%'";

/// Read access to accounts, as used by the pages and the request handlers.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, id: i64) -> Result<Option<User>>;

    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn list(&self) -> Result<Vec<User>>;

    /// The oldest account carrying the assistant role.
    async fn find_assistant(&self) -> Result<Option<User>>;

    async fn get_meta(&self, user_id: i64, key: &str) -> Result<Option<String>>;

    /// The account matching `login` and `password`, if any.
    async fn authenticate(&self, login: &str, password: &str) -> Result<Option<User>>;

    /// Stored avatar glyph, or the default robot.
    async fn avatar_glyph(&self, user_id: i64) -> Result<String> {
        let stored = self.get_meta(user_id, AVATAR_META_KEY).await?;
        Ok(avatar_or_default(stored.as_deref()).to_owned())
    }

    /// Stored context. Missing or unreadable metadata yields an empty context.
    async fn assistant_context(&self, user_id: i64) -> Result<AssistantContext> {
        let Some(raw) = self.get_meta(user_id, CONTEXT_META_KEY).await? else {
            return Ok(AssistantContext::default());
        };
        Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(user_id, error = %e, "stored assistant context is not valid JSON");
            AssistantContext::default()
        }))
    }
}

/// SQLite-backed user store.
pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    async fn init(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                login         TEXT NOT NULL UNIQUE,
                display_name  TEXT NOT NULL,
                email         TEXT NOT NULL DEFAULT '',
                password_hash TEXT,
                roles         TEXT NOT NULL DEFAULT '',
                created_at    INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS user_meta (
                user_id    INTEGER NOT NULL,
                meta_key   TEXT NOT NULL,
                meta_value TEXT NOT NULL,
                PRIMARY KEY (user_id, meta_key)
            )",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn create_user(&self, params: NewUser) -> Result<User> {
        let password_hash = params.password.as_deref().map(hash_password).transpose()?;
        let now = now_secs();
        let result = sqlx::query(
            "INSERT INTO users (login, display_name, email, password_hash, roles, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&params.login)
        .bind(&params.display_name)
        .bind(&params.email)
        .bind(&password_hash)
        .bind(join_roles(&params.roles))
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!(user_id = id, login = %params.login, "user created");
        Ok(User {
            id,
            login: params.login,
            display_name: params.display_name,
            email: params.email,
            roles: params.roles,
            created_at: now,
        })
    }

    pub async fn set_meta(&self, user_id: i64, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO user_meta (user_id, meta_key, meta_value) VALUES (?, ?, ?)
             ON CONFLICT(user_id, meta_key) DO UPDATE SET meta_value = excluded.meta_value",
        )
        .bind(user_id)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Whether another assistant already goes by `display_name`.
    async fn assistant_name_taken(&self, display_name: &str) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as(&format!(
            "SELECT id FROM users
             WHERE display_name = ? COLLATE NOCASE AND {HAS_ASSISTANT_ROLE}
             LIMIT 1"
        ))
        .bind(display_name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    /// `base`, or the first of `base-2`, `base-3`, ... nobody has claimed.
    async fn free_login(&self, base: &str) -> Result<String> {
        let mut candidate = base.to_owned();
        for suffix in 2u32.. {
            let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE login = ?")
                .bind(&candidate)
                .fetch_optional(&self.pool)
                .await?;
            if row.is_none() {
                break;
            }
            candidate = format!("{base}-{suffix}");
        }
        Ok(candidate)
    }

    /// Insert the account and its metadata. `None` when `login` was claimed
    /// in the meantime.
    async fn insert_assistant(
        &self,
        assistant: &NewAssistant,
        login: &str,
    ) -> Result<Option<i64>, CreateAssistantError> {
        let context = serde_json::to_string(&assistant.context).map_err(anyhow::Error::from)?;
        let mut tx = self.pool.begin().await.map_err(anyhow::Error::from)?;

        let inserted = sqlx::query(
            "INSERT INTO users (login, display_name, email, roles, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(login)
        .bind(&assistant.name)
        .bind(format!("{login}@assistant.invalid"))
        .bind(Role::AiAssistant.as_str())
        .bind(now_secs())
        .execute(&mut *tx)
        .await;
        let id = match inserted {
            Ok(result) => result.last_insert_rowid(),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => return Ok(None),
            Err(e) => return Err(anyhow::Error::from(e).into()),
        };

        for (key, value) in [
            (AVATAR_META_KEY, assistant.avatar.as_str()),
            (CONTEXT_META_KEY, context.as_str()),
        ] {
            sqlx::query("INSERT INTO user_meta (user_id, meta_key, meta_value) VALUES (?, ?, ?)")
                .bind(id)
                .bind(key)
                .bind(value)
                .execute(&mut *tx)
                .await
                .map_err(anyhow::Error::from)?;
        }

        tx.commit().await.map_err(anyhow::Error::from)?;
        Ok(Some(id))
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn get(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower(?) LIMIT 1"
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn list(&self) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_assistant(&self) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE {HAS_ASSISTANT_ROLE} ORDER BY id ASC LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn get_meta(&self, user_id: i64, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT meta_value FROM user_meta WHERE user_id = ? AND meta_key = ?")
                .bind(user_id)
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(v,)| v))
    }

    async fn authenticate(&self, login: &str, password: &str) -> Result<Option<User>> {
        let row: Option<(i64, Option<String>)> =
            sqlx::query_as("SELECT id, password_hash FROM users WHERE login = ?")
                .bind(login.trim())
                .fetch_optional(&self.pool)
                .await?;
        let Some((id, Some(hash))) = row else {
            return Ok(None);
        };
        if !verify_password(password, &hash) {
            return Ok(None);
        }
        self.get(id).await
    }
}

#[async_trait]
impl AssistantCreator for SqliteUserStore {
    async fn create_assistant(
        &self,
        assistant: &NewAssistant,
    ) -> Result<i64, CreateAssistantError> {
        if self.assistant_name_taken(&assistant.name).await? {
            return Err(CreateAssistantError::Rejected(duplicate_name(
                &assistant.name,
            )));
        }
        let base = assistant_login(&assistant.name);
        for _ in 0..LOGIN_ATTEMPTS {
            let login = self.free_login(&base).await?;
            if let Some(id) = self.insert_assistant(assistant, &login).await? {
                info!(user_id = id, login = %login, "assistant account created");
                return Ok(id);
            }
            debug!(login = %login, "login claimed concurrently, retrying");
        }
        Err(anyhow::anyhow!("no free login for assistant {:?}", assistant.name).into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use clawpress_onboarding::{DEFAULT_AVATAR, Vibe};

    use super::*;

    async fn store() -> SqliteUserStore {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        SqliteUserStore::new(pool).await.unwrap()
    }

    fn admin() -> NewUser {
        NewUser {
            login: "admin".into(),
            display_name: "Admin".into(),
            email: "Admin@Example.com".into(),
            password: Some("hunter2".into()),
            roles: vec![Role::Administrator],
        }
    }

    fn sage() -> NewAssistant {
        NewAssistant {
            name: "Sage".into(),
            avatar: "\u{1f989}".into(),
            context: AssistantContext {
                vibe: Some(Vibe::Playful),
                goals: "writing posts".into(),
                ..Default::default()
            },
        }
    }

    #[test]
    fn roles_parse_and_grant_capabilities() {
        assert_eq!("ai_assistant".parse::<Role>(), Ok(Role::AiAssistant));
        assert!("owner".parse::<Role>().is_err());
        assert_eq!(
            parse_roles("editor,,bogus,ai_assistant"),
            vec![Role::Editor, Role::AiAssistant]
        );

        let user = User {
            id: 1,
            login: "e".into(),
            display_name: "E".into(),
            email: String::new(),
            roles: vec![Role::Editor],
            created_at: 0,
        };
        assert!(user.can(Capability::EditPosts));
        assert!(!user.can(Capability::ManageOptions));
        assert!(!is_ai_assistant(&user));
    }

    #[test]
    fn login_is_slugified() {
        assert_eq!(assistant_login("Sage"), "sage");
        assert_eq!(assistant_login("  Mr. Owl 2 "), "mr-owl-2");
        assert_eq!(assistant_login("\u{1f989}"), "assistant");
        assert_eq!(assistant_login("\u{3a8}\u{3c5}\u{3c7}\u{3ae}"), "\u{3c8}\u{3c5}\u{3c7}\u{3ae}");
        assert_ne!(assistant_login("Zo\u{eb}"), assistant_login("Zo\u{e9}"));
    }

    #[tokio::test]
    async fn create_and_authenticate_user() {
        let store = store().await;
        let user = store.create_user(admin()).await.unwrap();
        assert!(user.can(Capability::ManageOptions));

        let found = store.authenticate("admin", "hunter2").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));
        assert!(store.authenticate("admin", "nope").await.unwrap().is_none());
        assert!(store.authenticate("ghost", "hunter2").await.unwrap().is_none());

        let by_email = store.get_by_email("admin@example.com").await.unwrap();
        assert_eq!(by_email.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn assistant_creation_stores_meta() {
        let store = store().await;
        store.create_user(admin()).await.unwrap();
        assert!(store.find_assistant().await.unwrap().is_none());

        let id = store.create_assistant(&sage()).await.unwrap();
        let assistant = store.find_assistant().await.unwrap().unwrap();
        assert_eq!(assistant.id, id);
        assert_eq!(assistant.login, "sage");
        assert!(is_ai_assistant(&assistant));

        assert_eq!(store.avatar_glyph(id).await.unwrap(), "\u{1f989}");
        let ctx = store.assistant_context(id).await.unwrap();
        assert_eq!(ctx.vibe, Some(Vibe::Playful));
        assert_eq!(ctx.goals, "writing posts");

        // assistants cannot sign in
        assert!(store.authenticate("sage", "").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected() {
        let store = store().await;
        store.create_assistant(&sage()).await.unwrap();

        let mut again = sage();
        again.name = "sage".into();
        match store.create_assistant(&again).await {
            Err(CreateAssistantError::Rejected(msg)) => {
                assert_eq!(msg, "A user named \"sage\" already exists.");
            },
            other => panic!("expected rejection, got {other:?}"),
        }
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn login_clash_picks_next_free_login() {
        let store = store().await;
        store
            .create_user(NewUser {
                login: "assistant".into(),
                display_name: "Front Desk".into(),
                email: "desk@example.com".into(),
                password: None,
                roles: vec![Role::Editor],
            })
            .await
            .unwrap();
        store
            .create_user(NewUser {
                login: "assistant-2".into(),
                display_name: "Back Office".into(),
                email: "office@example.com".into(),
                password: None,
                roles: vec![Role::Editor],
            })
            .await
            .unwrap();

        let mut robot = sage();
        robot.name = "\u{1f916}".into();
        let id = store.create_assistant(&robot).await.unwrap();
        let created = store.get(id).await.unwrap().unwrap();
        assert_eq!(created.login, "assistant-3");
        assert_eq!(created.display_name, "\u{1f916}");

        // A plain "sage" login held by a non-assistant does not block Sage.
        store
            .create_user(NewUser {
                login: "sage".into(),
                display_name: "Sage Gardener".into(),
                email: "gardener@example.com".into(),
                password: None,
                roles: vec![Role::Author],
            })
            .await
            .unwrap();
        let id = store.create_assistant(&sage()).await.unwrap();
        assert_eq!(store.get(id).await.unwrap().unwrap().login, "sage-2");
    }

    #[tokio::test]
    async fn non_latin_name_is_not_mistaken_for_a_duplicate() {
        let store = store().await;
        let mut psyche = sage();
        psyche.name = "\u{3a8}\u{3c5}\u{3c7}\u{3ae}".into();
        let first = store.create_assistant(&psyche).await.unwrap();

        let mut zoe = sage();
        zoe.name = "Zo\u{eb}".into();
        store.create_assistant(&zoe).await.unwrap();
        zoe.name = "Zo\u{e9}".into();
        store.create_assistant(&zoe).await.unwrap();

        assert_eq!(
            store.get(first).await.unwrap().unwrap().login,
            "\u{3c8}\u{3c5}\u{3c7}\u{3ae}"
        );
        assert_eq!(store.list().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn missing_meta_falls_back() {
        let store = store().await;
        let user = store.create_user(admin()).await.unwrap();
        assert_eq!(store.avatar_glyph(user.id).await.unwrap(), DEFAULT_AVATAR);
        assert_eq!(
            store.assistant_context(user.id).await.unwrap(),
            AssistantContext::default()
        );

        store
            .set_meta(user.id, CONTEXT_META_KEY, "not json")
            .await
            .unwrap();
        assert_eq!(
            store.assistant_context(user.id).await.unwrap(),
            AssistantContext::default()
        );
    }
}
