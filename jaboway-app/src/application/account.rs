use super::state::SharedState;
use crate::domain::{AuthUser, Profile};
use crate::infrastructure::remote::{rows, AuthProvider, Query, RemoteStore, Table};
use jaboway_errors::AppError;
use std::sync::Arc;

pub struct AccountService {
    remote: Arc<dyn RemoteStore>,
    auth: Arc<dyn AuthProvider>,
    state: SharedState,
}

impl AccountService {
    pub fn new(remote: Arc<dyn RemoteStore>, auth: Arc<dyn AuthProvider>, state: SharedState) -> Self {
        Self {
            remote,
            auth,
            state,
        }
    }

    /// Resolves an access token into the caller's profile. `None` for unknown tokens.
    pub async fn sign_in(&self, access_token: &str) -> Result<Option<Profile>, AppError> {
        let Some(user) = self.auth.user_for_token(access_token).await? else {
            return Ok(None);
        };
        self.ensure_profile(&user).await.map(Some)
    }

    /// Loads the profile of a signed-in account, creating it on first sign-in.
    pub async fn ensure_profile(&self, user: &AuthUser) -> Result<Profile, AppError> {
        let existing = self
            .remote
            .select(Table::Profiles, Query::all().eq("id", user.id))
            .await?;

        let profile = match existing.into_iter().next() {
            Some(row) => rows::profile_from_row(row)?,
            None => {
                let row = rows::new_profile_row(user.id, &user.default_display_name());
                let created = rows::profile_from_row(self.remote.insert(Table::Profiles, row).await?)?;
                tracing::info!(profile_id = %created.id, "profile created");
                created
            }
        };

        {
            let mut state = self.state.lock();
            state.profiles.insert(profile.id, profile.clone());
        }

        if profile.is_blocked {
            tracing::warn!(profile_id = %profile.id, "blocked account refused");
            return Err(AppError::AccountBlocked);
        }
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::remote::MemoryStore;
    use serde_json::json;
    use uuid::Uuid;

    fn service(store: Arc<MemoryStore>) -> AccountService {
        AccountService::new(store.clone(), store, SharedState::new())
    }

    #[tokio::test]
    async fn test_first_sign_in_creates_profile() {
        let store = Arc::new(MemoryStore::new());
        let user = AuthUser {
            id: Uuid::new_v4(),
            email: Some("andi@example.com".to_string()),
            full_name: None,
        };
        store.register_user(user.clone());

        let profile = service(store.clone())
            .sign_in(&user.id.to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.display_name, "andi");
        assert_eq!(store.rows(Table::Profiles).len(), 1);

        let again = service(store.clone()).ensure_profile(&user).await.unwrap();
        assert_eq!(again, profile);
        assert_eq!(store.rows(Table::Profiles).len(), 1);
    }

    #[tokio::test]
    async fn test_blocked_profile_is_refused() {
        let store = Arc::new(MemoryStore::new());
        let id = Uuid::new_v4();
        store
            .insert(
                Table::Profiles,
                json!({ "id": id, "display_name": "Joko", "is_blocked": true }),
            )
            .await
            .unwrap();
        let result = service(store).sign_in(&id.to_string()).await;
        assert_eq!(result, Err(AppError::AccountBlocked));
    }

    #[tokio::test]
    async fn test_unknown_token_is_anonymous() {
        let store = Arc::new(MemoryStore::new());
        assert_eq!(service(store).sign_in("").await, Ok(None));
    }
}
