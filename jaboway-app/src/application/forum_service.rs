//! Threads, posts, trust votes and crowd moderation.

use super::authorization::{
    ensure_can_modify_post, ensure_can_report_post, ensure_not_blocked, require_admin,
    require_member,
};
use super::optimistic::confirm;
use super::state::SharedState;
use crate::domain::{
    validate_post_text, ActorContext, Post, PostReportOutcome, ReportReason, Thread,
    ThreadCategory, ThreadForm, ThreadReportOutcome, ThreadView, VoteType,
};
use crate::infrastructure::remote::{rows, Procedure, RemoteStore, Table};
use jaboway_errors::AppError;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

const THREAD: &str = "Diskusi";
const POST: &str = "Komentar";

/// How a post deletion was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    /// Requested by the author or an admin.
    Manual,
    /// The report threshold was crossed; ownership is not checked.
    AutoModeration,
}

pub struct ForumService {
    remote: Arc<dyn RemoteStore>,
    state: SharedState,
}

impl ForumService {
    pub fn new(remote: Arc<dyn RemoteStore>, state: SharedState) -> Self {
        Self { remote, state }
    }

    pub fn list(&self, actor: &ActorContext, category: Option<ThreadCategory>) -> Vec<ThreadView> {
        let state = self.state.lock();
        state
            .threads
            .iter()
            .filter(|t| t.is_visible_to(actor.is_admin))
            .filter(|t| category.map_or(true, |c| t.category == c))
            .map(|t| ThreadView::new(t.clone(), &actor.actor_id))
            .collect()
    }

    fn find(&self, id: Uuid) -> Result<Thread, AppError> {
        self.state
            .lock()
            .threads
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::not_found(THREAD))
    }

    fn find_post(&self, thread_id: Uuid, post_id: Uuid) -> Result<(Thread, Post), AppError> {
        let thread = self.find(thread_id)?;
        let post = thread
            .post(post_id)
            .cloned()
            .ok_or_else(|| AppError::not_found(POST))?;
        Ok((thread, post))
    }

    pub fn thread(&self, actor: &ActorContext, id: Uuid) -> Result<ThreadView, AppError> {
        let thread = self.find(id)?;
        if !thread.is_visible_to(actor.is_admin) {
            return Err(AppError::not_found(THREAD));
        }
        Ok(ThreadView::new(thread, &actor.actor_id))
    }

    /// Opens a thread and counts the view. A failed view write keeps the old count.
    pub async fn open_thread(&self, actor: &ActorContext, id: Uuid) -> Result<ThreadView, AppError> {
        require_member(actor, "membuka diskusi")?;
        let thread = self.find(id)?;
        if !thread.is_visible_to(actor.is_admin) {
            return Err(AppError::not_found(THREAD));
        }

        let views = thread.views + 1;
        let thread = match self
            .remote
            .update(Table::Threads, &id.to_string(), json!({ "views": views }))
            .await
        {
            Ok(_) => {
                let mut state = self.state.lock();
                state
                    .threads
                    .update(id, |t| {
                        t.views = views;
                        t.clone()
                    })
                    .unwrap_or(Thread { views, ..thread })
            }
            Err(e) => {
                tracing::warn!(thread_id = %id, error = %e, "view count not saved");
                thread
            }
        };
        Ok(ThreadView::new(thread, &actor.actor_id))
    }

    /// Inserts the thread row, then its opening post.
    pub async fn create_thread(
        &self,
        actor: &ActorContext,
        form: &ThreadForm,
    ) -> Result<ThreadView, AppError> {
        require_member(actor, "membuat diskusi")?;
        let title = form.title.trim();
        if title.is_empty() || form.text.trim().is_empty() {
            return Err(AppError::validation(
                "Judul diskusi dan pesan pertama tidak boleh kosong.",
            ));
        }
        let text = validate_post_text(&form.text)?;

        let thread_row = self
            .remote
            .insert(Table::Threads, rows::new_thread_row(title, form.category))
            .await?;
        let thread_id = thread_row
            .get("id")
            .and_then(|v| v.as_str())
            .and_then(|id| Uuid::parse_str(id).ok())
            .ok_or_else(|| AppError::Internal("thread tanpa id".to_string()))?;

        let post_row = match self
            .remote
            .insert(Table::Posts, rows::new_post_row(thread_id, actor, &text))
            .await
        {
            Ok(row) => row,
            Err(e) => {
                tracing::error!(%thread_id, error = %e, "opening post insert failed, removing empty thread");
                if let Err(cleanup) = self
                    .remote
                    .rpc(Procedure::DeleteThread, json!({ "thread_id_in": thread_id }))
                    .await
                {
                    tracing::error!(%thread_id, error = %cleanup, "empty thread left behind");
                }
                return Err(e.into());
            }
        };

        let mut state = self.state.lock();
        let post = rows::post_from_row(post_row, &state.profiles)?;
        let thread = rows::thread_from_row(thread_row, vec![post])?;
        tracing::info!(thread_id = %thread.id, "thread created");
        state.threads.prepend(thread.clone());
        Ok(ThreadView::new(thread, &actor.actor_id))
    }

    pub async fn add_post(
        &self,
        actor: &ActorContext,
        thread_id: Uuid,
        text: &str,
    ) -> Result<Post, AppError> {
        let text = validate_post_text(text)?;
        require_member(actor, "berkomentar")?;
        self.find(thread_id)?;

        let row = self
            .remote
            .insert(Table::Posts, rows::new_post_row(thread_id, actor, &text))
            .await?;

        let mut state = self.state.lock();
        let post = rows::post_from_row(row, &state.profiles)?;
        state
            .threads
            .update(thread_id, |t| t.posts.push(post.clone()))
            .ok_or_else(|| AppError::not_found(THREAD))?;
        Ok(post)
    }

    /// Toggles or switches the actor's vote, applied before the remote write.
    pub async fn cast_vote(
        &self,
        actor: &ActorContext,
        thread_id: Uuid,
        vote: VoteType,
    ) -> Result<ThreadView, AppError> {
        ensure_not_blocked(actor)?;

        let (snapshot, (thread, now)) = {
            let mut state = self.state.lock();
            state
                .threads
                .stage(thread_id, |t| {
                    let now = t.votes.cast(&actor.actor_id, vote);
                    (t.clone(), now)
                })
                .ok_or_else(|| AppError::not_found(THREAD))?
        };

        confirm(
            &self.state,
            snapshot,
            self.remote.rpc(
                Procedure::ThreadVote,
                json!({
                    "thread_id_in": thread_id,
                    "vote_type_in": vote,
                    "voter_id_in": actor.actor_id,
                }),
            ),
        )
        .await?;

        match now {
            Some(v) => tracing::debug!(%thread_id, vote = v.as_str(), "vote recorded"),
            None => tracing::debug!(%thread_id, "vote retracted"),
        }
        Ok(ThreadView::new(thread, &actor.actor_id))
    }

    pub async fn report_thread(
        &self,
        actor: &ActorContext,
        thread_id: Uuid,
        reason: ReportReason,
    ) -> Result<ThreadReportOutcome, AppError> {
        ensure_not_blocked(actor)?;
        let reason = reason.validate()?;
        let thread = self.find(thread_id)?;

        let Some(reports) = thread.reports.with_report(&actor.actor_id) else {
            tracing::debug!(%thread_id, "thread already reported by actor");
            return Ok(ThreadReportOutcome::AlreadyReported);
        };

        self.remote
            .update(
                Table::Threads,
                &thread_id.to_string(),
                rows::reports_column(&reports),
            )
            .await?;

        let mut state = self.state.lock();
        let thread = state
            .threads
            .update(thread_id, |t| {
                t.reports = reports;
                t.clone()
            })
            .ok_or_else(|| AppError::not_found(THREAD))?;
        tracing::info!(
            %thread_id,
            reason = reason.label(),
            reports = thread.reports.len(),
            "thread reported"
        );
        Ok(ThreadReportOutcome::Reported {
            thread: Box::new(thread),
        })
    }

    /// Records a report; the report that reaches the threshold removes the post.
    pub async fn report_post(
        &self,
        actor: &ActorContext,
        thread_id: Uuid,
        post_id: Uuid,
        reason: ReportReason,
    ) -> Result<PostReportOutcome, AppError> {
        let reason = reason.validate()?;
        let (thread, post) = self.find_post(thread_id, post_id)?;
        ensure_can_report_post(actor, &post)?;

        let Some(reports) = post.reports.with_report(&actor.actor_id) else {
            tracing::debug!(%post_id, "post already reported by actor");
            return Ok(PostReportOutcome::AlreadyReported);
        };
        tracing::info!(%post_id, reason = reason.label(), reports = reports.len(), "post reported");

        if reports.reached_threshold() && is_removable(&thread, post_id) {
            self.delete_post(actor, thread_id, post_id, DeleteMode::AutoModeration)
                .await?;
            return Ok(PostReportOutcome::AutoRemoved { post_id });
        }

        self.remote
            .update(Table::Posts, &post_id.to_string(), rows::reports_column(&reports))
            .await?;

        let blocked_removal = reports.reached_threshold();
        let mut state = self.state.lock();
        let post = state
            .threads
            .update(thread_id, |t| {
                t.post_mut(post_id).map(|p| {
                    p.reports = reports;
                    p.clone()
                })
            })
            .flatten()
            .ok_or_else(|| AppError::not_found(POST))?;

        if blocked_removal {
            tracing::warn!(%thread_id, %post_id, "report threshold reached on a post that must stay");
            return Ok(PostReportOutcome::RemovalBlocked {
                post: Box::new(post),
            });
        }
        Ok(PostReportOutcome::Reported {
            post: Box::new(post),
        })
    }

    /// Changes a post's text before `handle_edit_post` confirms it.
    pub async fn edit_post(
        &self,
        actor: &ActorContext,
        thread_id: Uuid,
        post_id: Uuid,
        text: &str,
    ) -> Result<Post, AppError> {
        ensure_not_blocked(actor)?;
        let text = validate_post_text(text)?;
        let (_, post) = self.find_post(thread_id, post_id)?;
        ensure_can_modify_post(actor, &post)?;

        let (snapshot, edited) = {
            let mut state = self.state.lock();
            state
                .threads
                .stage(thread_id, |t| {
                    t.post_mut(post_id).map(|p| {
                        p.text = text.clone();
                        p.clone()
                    })
                })
                .ok_or_else(|| AppError::not_found(THREAD))?
        };
        let edited = edited.ok_or_else(|| AppError::not_found(POST))?;

        confirm(
            &self.state,
            snapshot,
            self.remote.rpc(
                Procedure::EditPost,
                json!({ "post_id_in": post_id, "new_content_in": text }),
            ),
        )
        .await?;
        Ok(edited)
    }

    /// Removes a post locally, then through `handle_delete_post`. A thread
    /// always keeps at least one post, and its opening post while replies exist.
    pub async fn delete_post(
        &self,
        actor: &ActorContext,
        thread_id: Uuid,
        post_id: Uuid,
        mode: DeleteMode,
    ) -> Result<(), AppError> {
        let (thread, post) = self.find_post(thread_id, post_id)?;
        if mode == DeleteMode::Manual {
            ensure_not_blocked(actor)?;
            ensure_can_modify_post(actor, &post)?;
        }
        if thread.posts.len() <= 1 {
            return Err(AppError::validation(
                "Tidak bisa menghapus satu-satunya post.",
            ));
        }
        if !is_removable(&thread, post_id) {
            return Err(AppError::validation(
                "Post pembuka tidak bisa dihapus selama masih ada balasan.",
            ));
        }

        let (snapshot, _) = {
            let mut state = self.state.lock();
            state
                .threads
                .stage(thread_id, |t| t.posts.retain(|p| p.id != post_id))
                .ok_or_else(|| AppError::not_found(THREAD))?
        };

        confirm(
            &self.state,
            snapshot,
            self.remote
                .rpc(Procedure::DeletePost, json!({ "post_id_in": post_id })),
        )
        .await?;

        match mode {
            DeleteMode::Manual => tracing::info!(%thread_id, %post_id, "post deleted"),
            DeleteMode::AutoModeration => {
                tracing::info!(%thread_id, %post_id, "post removed by report threshold")
            }
        }
        Ok(())
    }

    /// Removes a thread and all of its posts. Admin only.
    pub async fn delete_thread(&self, actor: &ActorContext, thread_id: Uuid) -> Result<(), AppError> {
        require_admin(actor)?;
        self.find(thread_id)?;

        self.remote
            .rpc(Procedure::DeleteThread, json!({ "thread_id_in": thread_id }))
            .await
            .map_err(|e| {
                tracing::error!(%thread_id, error = %e, "thread delete failed");
                AppError::from(e)
            })?;

        self.state.lock().threads.remove(thread_id);
        tracing::info!(%thread_id, "thread deleted");
        Ok(())
    }
}

/// A post may leave its thread only if another post remains and it did not open the thread.
fn is_removable(thread: &Thread, post_id: Uuid) -> bool {
    thread.posts.len() > 1 && thread.opening_post().map(|p| p.id) != Some(post_id)
}
