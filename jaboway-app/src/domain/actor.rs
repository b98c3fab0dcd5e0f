use serde::{Deserialize, Serialize};
use std::fmt;

pub const ADMIN_DISPLAY_NAME: &str = "Admin";
pub const GUEST_DISPLAY_NAME: &str = "Guest";
const GUEST_PREFIX: &str = "guest_";

/// Key used in every vote and report ledger.
///
/// Either an account id or a `guest_<millis>_<random>` token. Ledgers never
/// look at which kind it is.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn from_account(account_id: uuid::Uuid) -> Self {
        Self(account_id.to_string())
    }

    pub fn generate_guest() -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        let random: u64 = rand::random();
        Self(format!("{GUEST_PREFIX}{millis}_{random}"))
    }

    pub fn is_guest(&self) -> bool {
        self.0.starts_with(GUEST_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActorId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A signed-in account as reported by the authentication subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: uuid::Uuid,
    pub email: Option<String>,
    pub full_name: Option<String>,
}

impl AuthUser {
    /// Display name for a freshly created profile.
    pub fn default_display_name(&self) -> String {
        if let Some(name) = self.full_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        self.email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .filter(|local| !local.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| "Pengguna Baru".to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: uuid::Uuid,
    pub display_name: String,
    #[serde(default)]
    pub is_blocked: bool,
}

/// Who is performing an action. Passed explicitly into every core operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    pub actor_id: ActorId,
    pub account: Option<Profile>,
    pub is_admin: bool,
}

impl ActorContext {
    pub fn guest(guest_id: ActorId) -> Self {
        Self {
            actor_id: guest_id,
            account: None,
            is_admin: false,
        }
    }

    pub fn account(profile: Profile) -> Self {
        Self {
            actor_id: ActorId::from_account(profile.id),
            account: Some(profile),
            is_admin: false,
        }
    }

    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    pub fn account_id(&self) -> Option<uuid::Uuid> {
        self.account.as_ref().map(|p| p.id)
    }

    pub fn is_blocked(&self) -> bool {
        self.account.as_ref().is_some_and(|p| p.is_blocked)
    }

    pub fn is_signed_in(&self) -> bool {
        self.account.is_some()
    }

    /// Name shown on content this actor creates.
    pub fn display_name(&self) -> &str {
        match (&self.account, self.is_admin) {
            (_, true) => ADMIN_DISPLAY_NAME,
            (Some(profile), false) => &profile.display_name,
            (None, false) => GUEST_DISPLAY_NAME,
        }
    }

    pub fn owns(&self, author_id: Option<uuid::Uuid>) -> bool {
        matches!((self.account_id(), author_id), (Some(me), Some(author)) if me == author)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str, blocked: bool) -> Profile {
        Profile {
            id: uuid::Uuid::new_v4(),
            display_name: name.to_string(),
            is_blocked: blocked,
        }
    }

    #[test]
    fn test_guest_id_shape() {
        let id = ActorId::generate_guest();
        assert!(id.is_guest());
        let parts: Vec<&str> = id.as_str().splitn(3, '_').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[1].parse::<i64>().is_ok());
    }

    #[test]
    fn test_account_actor_uses_account_id() {
        let p = profile("Budi", false);
        let ctx = ActorContext::account(p.clone());
        assert_eq!(ctx.actor_id.as_str(), p.id.to_string());
        assert!(!ctx.actor_id.is_guest());
        assert_eq!(ctx.display_name(), "Budi");
        assert!(ctx.owns(Some(p.id)));
        assert!(!ctx.owns(None));
    }

    #[test]
    fn test_admin_display_name_wins() {
        let ctx = ActorContext::account(profile("Budi", false)).with_admin(true);
        assert_eq!(ctx.display_name(), ADMIN_DISPLAY_NAME);
        let guest = ActorContext::guest(ActorId::generate_guest());
        assert_eq!(guest.display_name(), GUEST_DISPLAY_NAME);
    }

    #[test]
    fn test_blocked_only_applies_to_accounts() {
        assert!(ActorContext::account(profile("Sari", true)).is_blocked());
        assert!(!ActorContext::guest(ActorId::generate_guest()).is_blocked());
    }

    #[test]
    fn test_default_display_name_fallbacks() {
        let mut user = AuthUser {
            id: uuid::Uuid::new_v4(),
            email: Some("dewi@example.com".to_string()),
            full_name: Some("Dewi Lestari".to_string()),
        };
        assert_eq!(user.default_display_name(), "Dewi Lestari");
        user.full_name = Some("  ".to_string());
        assert_eq!(user.default_display_name(), "dewi");
        user.email = None;
        assert_eq!(user.default_display_name(), "Pengguna Baru");
    }
}
