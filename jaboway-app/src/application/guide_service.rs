use super::authorization::{
    ensure_can_modify_guide, ensure_not_blocked, require_admin, require_member,
};
use super::optimistic::confirm;
use super::state::SharedState;
use crate::domain::{
    ActorContext, Guide, GuideDraft, GuideFilter, GuidePage, GuideStatus, NewGuide, PageWindow,
};
use crate::infrastructure::remote::{rows, Procedure, RemoteStore, Table};
use jaboway_errors::AppError;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

const GUIDE: &str = "Panduan";

pub struct GuideService {
    remote: Arc<dyn RemoteStore>,
    state: SharedState,
}

impl GuideService {
    pub fn new(remote: Arc<dyn RemoteStore>, state: SharedState) -> Self {
        Self { remote, state }
    }

    /// Approved guides matching the filter, newest first.
    pub fn list(&self, filter: &GuideFilter) -> Vec<Guide> {
        let state = self.state.lock();
        state
            .guides
            .iter()
            .filter(|g| g.is_approved() && g.matches(filter))
            .cloned()
            .collect()
    }

    pub fn page(&self, filter: &GuideFilter, window: PageWindow) -> GuidePage {
        let matches = self.list(filter);
        let total = matches.len();
        let guides: Vec<Guide> = matches.into_iter().take(window.visible).collect();
        GuidePage {
            has_more: guides.len() < total,
            guides,
            total,
        }
    }

    /// The actor's own guides in any status.
    pub fn contributions(&self, actor: &ActorContext) -> Vec<Guide> {
        let state = self.state.lock();
        state
            .guides
            .iter()
            .filter(|g| match actor.account_id() {
                Some(id) if g.profile_id == Some(id) => true,
                _ => actor.is_admin && g.is_admin_authored(),
            })
            .cloned()
            .collect()
    }

    fn find(&self, id: Uuid) -> Result<Guide, AppError> {
        self.state
            .lock()
            .guides
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::not_found(GUIDE))
    }

    /// Opens a guide and counts the view. A failed view write keeps the old count.
    pub async fn open(&self, actor: &ActorContext, id: Uuid) -> Result<Guide, AppError> {
        let guide = self.find(id)?;
        if !guide.is_approved() && !actor.is_admin && !actor.owns(guide.profile_id) {
            return Err(AppError::not_found(GUIDE));
        }

        let views = guide.views + 1;
        match self
            .remote
            .update(Table::Guides, &id.to_string(), json!({ "views": views }))
            .await
        {
            Ok(_) => {
                let mut state = self.state.lock();
                Ok(state
                    .guides
                    .update(id, |g| {
                        g.views = views;
                        g.clone()
                    })
                    .unwrap_or(Guide { views, ..guide }))
            }
            Err(e) => {
                tracing::warn!(guide_id = %id, error = %e, "view count not saved");
                Ok(guide)
            }
        }
    }

    /// Writes remotely first; the mirror only changes once the row exists.
    pub async fn create(&self, actor: &ActorContext, draft: &GuideDraft) -> Result<Guide, AppError> {
        require_member(actor, "membuat panduan")?;
        let content = draft.validate(actor)?;
        let new_guide = NewGuide::new(content, actor.is_admin);
        let row = serde_json::to_value(&new_guide).map_err(|e| AppError::Internal(e.to_string()))?;

        let stored = self.remote.insert(Table::Guides, row).await.map_err(|e| {
            tracing::error!(error = %e, "guide insert failed");
            AppError::from(e)
        })?;

        let mut state = self.state.lock();
        let guide = rows::guide_from_row(stored, &state.profiles)?;
        tracing::info!(guide_id = %guide.id, status = ?guide.status, "guide created");
        state.guides.prepend(guide.clone());
        Ok(guide)
    }

    /// Applies the edit locally, then confirms it through `handle_edit_guide`.
    pub async fn update(
        &self,
        actor: &ActorContext,
        id: Uuid,
        draft: &GuideDraft,
    ) -> Result<Guide, AppError> {
        ensure_not_blocked(actor)?;
        let current = self.find(id)?;
        ensure_can_modify_guide(actor, &current)?;
        let content = draft.validate(actor)?;
        let update_data =
            serde_json::to_value(&content).map_err(|e| AppError::Internal(e.to_string()))?;

        let (snapshot, edited) = {
            let mut state = self.state.lock();
            state
                .guides
                .stage(id, |g| {
                    g.apply_edit(&content);
                    g.clone()
                })
                .ok_or_else(|| AppError::not_found(GUIDE))?
        };

        confirm(
            &self.state,
            snapshot,
            self.remote.rpc(
                Procedure::EditGuide,
                json!({ "guide_id_in": id, "update_data": update_data }),
            ),
        )
        .await?;
        tracing::info!(guide_id = %id, "guide updated");
        Ok(edited)
    }

    pub async fn delete(&self, actor: &ActorContext, id: Uuid) -> Result<(), AppError> {
        ensure_not_blocked(actor)?;
        let guide = self.find(id)?;
        ensure_can_modify_guide(actor, &guide)?;

        self.remote
            .rpc(Procedure::DeleteGuide, json!({ "guide_id_in": id }))
            .await
            .map_err(|e| {
                tracing::error!(guide_id = %id, error = %e, "guide delete failed");
                AppError::from(e)
            })?;

        self.state.lock().guides.remove(id);
        tracing::info!(guide_id = %id, "guide deleted");
        Ok(())
    }

    pub async fn approve(&self, actor: &ActorContext, id: Uuid) -> Result<Guide, AppError> {
        require_admin(actor)?;
        let guide = self.find(id)?;
        if guide.is_approved() {
            tracing::debug!(guide_id = %id, "guide already approved");
            return Ok(guide);
        }

        self.remote
            .update(Table::Guides, &id.to_string(), json!({ "status": GuideStatus::Approved }))
            .await?;

        let mut state = self.state.lock();
        let approved = state
            .guides
            .update(id, |g| {
                g.status = GuideStatus::Approved;
                g.clone()
            })
            .ok_or_else(|| AppError::not_found(GUIDE))?;
        tracing::info!(guide_id = %id, "guide approved");
        Ok(approved)
    }
}
