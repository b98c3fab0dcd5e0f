use crate::domain::{ActorContext, ActorId, Profile};
use async_trait::async_trait;
use jaboway_errors::AppError;
use std::sync::{Arc, OnceLock};

/// Where a guest's id survives between visits.
#[async_trait]
pub trait GuestIdStore: Send + Sync {
    async fn load(&self) -> Result<Option<String>, AppError>;

    async fn save(&self, guest_id: &str) -> Result<(), AppError>;
}

/// Decides which actor id keys ledgers for the current caller.
///
/// Never fails: when the guest store is unusable, an ephemeral id is used
/// for as long as this resolver lives.
pub struct IdentityResolver {
    store: Arc<dyn GuestIdStore>,
    ephemeral: OnceLock<ActorId>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn GuestIdStore>) -> Self {
        Self {
            store,
            ephemeral: OnceLock::new(),
        }
    }

    pub async fn resolve(&self, account: Option<&Profile>) -> ActorId {
        match account {
            Some(profile) => ActorId::from_account(profile.id),
            None => self.guest_id().await,
        }
    }

    pub async fn actor_context(&self, account: Option<Profile>, is_admin: bool) -> ActorContext {
        let context = match account {
            Some(profile) => ActorContext::account(profile),
            None => ActorContext::guest(self.guest_id().await),
        };
        context.with_admin(is_admin)
    }

    pub async fn guest_id(&self) -> ActorId {
        if let Some(id) = self.ephemeral.get() {
            return id.clone();
        }

        match self.store.load().await {
            Ok(Some(stored)) => return ActorId::new(stored),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "guest id storage unreadable, using ephemeral id");
                return self.ephemeral.get_or_init(ActorId::generate_guest).clone();
            }
        }

        let generated = ActorId::generate_guest();
        if let Err(e) = self.store.save(generated.as_str()).await {
            tracing::warn!(error = %e, "guest id not persisted, using ephemeral id");
            return self.ephemeral.get_or_init(|| generated).clone();
        }
        tracing::debug!(guest_id = %generated, "new guest id");
        generated
    }
}
