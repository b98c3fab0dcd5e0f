use crate::application::{AccountService, AdminService, ForumService, GuideService, SharedState};
use crate::config::{AppConfig, Backend};
use crate::infrastructure::remote::{rows, AuthProvider, MemoryStore, Order, Query, RemoteStore, Table};
use crate::infrastructure::AdminGate;
use jaboway_errors::AppError;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppContext {
    pub state: SharedState,
    pub guides: Arc<GuideService>,
    pub forum: Arc<ForumService>,
    pub admin: Arc<AdminService>,
    pub accounts: Arc<AccountService>,
    remote: Arc<dyn RemoteStore>,
}

impl AppContext {
    pub fn new(remote: Arc<dyn RemoteStore>, auth: Arc<dyn AuthProvider>, gate: AdminGate) -> Self {
        let state = SharedState::new();
        Self {
            guides: Arc::new(GuideService::new(remote.clone(), state.clone())),
            forum: Arc::new(ForumService::new(remote.clone(), state.clone())),
            admin: Arc::new(AdminService::new(remote.clone(), state.clone(), gate)),
            accounts: Arc::new(AccountService::new(remote.clone(), auth, state.clone())),
            state,
            remote,
        }
    }

    /// Context over a fresh in-memory backend, which is returned alongside.
    pub fn new_in_memory(gate: AdminGate) -> (Self, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let context = Self::new(store.clone(), store.clone(), gate);
        (context, store)
    }

    #[cfg(feature = "supabase")]
    pub fn new_supabase(url: &str, api_key: &str, gate: AdminGate) -> Result<Self, AppError> {
        use crate::infrastructure::remote::{SupabaseAuth, SupabaseStore};

        let base = if url.ends_with('/') {
            url.to_string()
        } else {
            format!("{url}/")
        };
        let base = url::Url::parse(&base)
            .map_err(|e| AppError::Internal(format!("SUPABASE_URL tidak valid: {e}")))?;
        Ok(Self::new(
            Arc::new(SupabaseStore::new(base.clone(), api_key.to_string())),
            Arc::new(SupabaseAuth::new(base, api_key.to_string())),
            gate,
        ))
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let gate = AdminGate::new(config.admin_password_hash.clone())?;
        if !gate.is_enabled() {
            tracing::info!("JABOWAY_ADMIN_PASSWORD_HASH not set, admin mode disabled");
        }

        match &config.backend {
            Backend::Memory => {
                tracing::info!("Using in-memory backend");
                Ok(Self::new_in_memory(gate).0)
            }
            #[cfg(feature = "supabase")]
            Backend::Supabase { url, api_key } => {
                tracing::info!("Using Supabase backend at {}", url);
                Self::new_supabase(url, api_key, gate)
            }
            #[cfg(not(feature = "supabase"))]
            Backend::Supabase { .. } => Err(AppError::Internal(
                "built without the supabase feature".to_string(),
            )),
        }
    }

    /// Re-fetches every collection and replaces the mirror.
    pub async fn reload(&self) -> Result<(), AppError> {
        let profile_rows = self.remote.select(Table::Profiles, Query::all()).await?;
        let guide_rows = self
            .remote
            .select(Table::Guides, Query::all().order(Order::Descending("created_at")))
            .await?;
        let thread_rows = self
            .remote
            .select(Table::Threads, Query::all().order(Order::Descending("created_at")))
            .await?;
        let post_rows = self
            .remote
            .select(Table::Posts, Query::all().order(Order::Ascending("created_at")))
            .await?;

        let profiles = rows::profile_map(profile_rows)?;
        let guides = guide_rows
            .into_iter()
            .map(|row| rows::guide_from_row(row, &profiles))
            .collect::<Result<Vec<_>, _>>()?;
        let threads = rows::assemble_threads(thread_rows, post_rows, &profiles)?;

        tracing::info!(
            guides = guides.len(),
            threads = threads.len(),
            profiles = profiles.len(),
            "mirror reloaded"
        );
        let mut state = self.state.lock();
        state.guides.replace_all(guides);
        state.threads.replace_all(threads);
        state.profiles = profiles;
        Ok(())
    }
}
