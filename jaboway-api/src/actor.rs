use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jaboway_app::application::{GuestIdStore, IdentityResolver};
use jaboway_app::domain::ActorContext;
use jaboway_app::AppContext;
use jaboway_errors::AppError;
use std::sync::Arc;
use tower_sessions::Session;

const GUEST_ID_KEY: &str = "guest_id";
const ADMIN_KEY: &str = "admin_mode";

/// The caller of the current request.
pub struct Actor(pub ActorContext);

impl FromRequestParts<AppContext> for Actor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, ctx: &AppContext) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, ctx)
            .await
            .map_err(|(_, message)| AppError::Internal(message.to_string()))?;

        let account = match bearer_token(parts) {
            Some(token) => {
                let profile = ctx.accounts.sign_in(token).await?;
                if profile.is_none() {
                    tracing::debug!("unknown access token, continuing as guest");
                }
                profile
            }
            None => None,
        };

        let is_admin = is_admin(&session).await;
        let resolver = IdentityResolver::new(Arc::new(SessionGuestStore(session)));
        Ok(Actor(resolver.actor_context(account, is_admin).await))
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub async fn is_admin(session: &Session) -> bool {
    session
        .get::<bool>(ADMIN_KEY)
        .await
        .ok()
        .flatten()
        .unwrap_or(false)
}

pub async fn set_admin(session: &Session, enabled: bool) -> Result<(), AppError> {
    let result = if enabled {
        session.insert(ADMIN_KEY, true).await
    } else {
        session.remove::<bool>(ADMIN_KEY).await.map(|_| ())
    };
    result.map_err(|e| AppError::Internal(e.to_string()))
}

/// Keeps the guest id in the cookie session, the way a browser would keep it
/// in local storage.
struct SessionGuestStore(Session);

#[async_trait]
impl GuestIdStore for SessionGuestStore {
    async fn load(&self) -> Result<Option<String>, AppError> {
        self.0
            .get::<String>(GUEST_ID_KEY)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    async fn save(&self, guest_id: &str) -> Result<(), AppError> {
        self.0
            .insert(GUEST_ID_KEY, guest_id)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }
}
