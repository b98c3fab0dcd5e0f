use super::authorization::require_admin;
use super::state::SharedState;
use crate::domain::{ActorContext, Guide, GuideStatus, Profile, Thread, ADMIN_DISPLAY_NAME};
use crate::infrastructure::remote::{rows, RemoteStore, Table};
use crate::infrastructure::AdminGate;
use jaboway_errors::AppError;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct ReviewQueue {
    pub pending_guides: Vec<Guide>,
    pub reported_threads: Vec<Thread>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentOverview {
    pub admin_guides: Vec<Guide>,
    pub user_guides: Vec<Guide>,
    pub admin_threads: Vec<Thread>,
    pub user_threads: Vec<Thread>,
}

pub struct AdminService {
    remote: Arc<dyn RemoteStore>,
    state: SharedState,
    gate: AdminGate,
}

impl AdminService {
    pub fn new(remote: Arc<dyn RemoteStore>, state: SharedState, gate: AdminGate) -> Self {
        Self {
            remote,
            state,
            gate,
        }
    }

    pub fn is_available(&self) -> bool {
        self.gate.is_enabled()
    }

    /// Checks the admin password. The caller keeps the resulting mode.
    pub fn login(&self, password: &str) -> Result<(), AppError> {
        self.gate.verify(password)?;
        tracing::info!("admin mode entered");
        Ok(())
    }

    pub fn queue(&self, actor: &ActorContext) -> Result<ReviewQueue, AppError> {
        require_admin(actor)?;
        let state = self.state.lock();
        Ok(ReviewQueue {
            pending_guides: state
                .guides
                .iter()
                .filter(|g| g.status == GuideStatus::Pending)
                .cloned()
                .collect(),
            reported_threads: state
                .threads
                .iter()
                .filter(|t| t.reports.reached_threshold())
                .cloned()
                .collect(),
        })
    }

    /// Published content split by author. Pending guides only show in [`Self::queue`].
    pub fn content(&self, actor: &ActorContext) -> Result<ContentOverview, AppError> {
        require_admin(actor)?;
        let state = self.state.lock();
        let (admin_guides, user_guides): (Vec<Guide>, Vec<Guide>) = state
            .guides
            .iter()
            .filter(|g| g.is_approved())
            .cloned()
            .partition(Guide::is_admin_authored);
        let (admin_threads, user_threads): (Vec<Thread>, Vec<Thread>) =
            state.threads.iter().cloned().partition(|t| {
                t.opening_post()
                    .is_some_and(|p| p.author.display_name == ADMIN_DISPLAY_NAME)
            });
        Ok(ContentOverview {
            admin_guides,
            user_guides,
            admin_threads,
            user_threads,
        })
    }

    pub fn users(&self, actor: &ActorContext) -> Result<Vec<Profile>, AppError> {
        require_admin(actor)?;
        let state = self.state.lock();
        let mut users: Vec<Profile> = state.profiles.values().cloned().collect();
        users.sort_by(|a, b| a.display_name.to_lowercase().cmp(&b.display_name.to_lowercase()));
        Ok(users)
    }

    /// Sets the blocked flag remotely, then on every mirrored post by that user.
    pub async fn block_user(
        &self,
        actor: &ActorContext,
        user_id: Uuid,
        blocked: bool,
    ) -> Result<Profile, AppError> {
        require_admin(actor)?;
        if !self.state.lock().profiles.contains_key(&user_id) {
            return Err(AppError::not_found("Pengguna"));
        }

        let row = self
            .remote
            .update(
                Table::Profiles,
                &user_id.to_string(),
                json!({ "is_blocked": blocked }),
            )
            .await?;
        let profile = rows::profile_from_row(row)?;

        let mut state = self.state.lock();
        state.profiles.insert(profile.id, profile.clone());
        let affected: Vec<Uuid> = state
            .threads
            .iter()
            .filter(|t| t.posts.iter().any(|p| p.author.id == Some(user_id)))
            .map(|t| t.id)
            .collect();
        for thread_id in affected {
            state.threads.update(thread_id, |t| {
                for post in t.posts.iter_mut().filter(|p| p.author.id == Some(user_id)) {
                    post.author.is_blocked = blocked;
                }
            });
        }
        tracing::info!(%user_id, blocked, "user block status changed");
        Ok(profile)
    }
}
