use crate::actor::Actor;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use jaboway_app::application::DeleteMode;
use jaboway_app::domain::{
    Post, PostReportOutcome, ReportReason, ThreadCategory, ThreadForm, ThreadReportOutcome,
    ThreadView, VoteType,
};
use jaboway_app::AppContext;
use jaboway_errors::AppError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/threads", get(list).post(create))
        .route("/threads/{id}", get(open).delete(remove))
        .route("/threads/{id}/votes", post(vote))
        .route("/threads/{id}/reports", post(report_thread))
        .route("/threads/{id}/posts", post(add_post))
        .route("/threads/{id}/posts/{post_id}", patch(edit_post).delete(delete_post))
        .route("/threads/{id}/posts/{post_id}/reports", post(report_post))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    category: Option<ThreadCategory>,
}

#[derive(Debug, Deserialize)]
struct VoteBody {
    vote: VoteType,
}

#[derive(Debug, Deserialize)]
struct ReportBody {
    reason: ReportReason,
}

#[derive(Debug, Deserialize)]
struct PostBody {
    text: String,
}

/// A report outcome together with the notice shown to the reporter.
#[derive(Serialize)]
struct ReportResponse<T> {
    notice: &'static str,
    #[serde(flatten)]
    outcome: T,
}

async fn list(
    State(ctx): State<AppContext>,
    Actor(actor): Actor,
    Query(query): Query<ListQuery>,
) -> Json<Vec<ThreadView>> {
    Json(ctx.forum.list(&actor, query.category))
}

async fn create(
    State(ctx): State<AppContext>,
    Actor(actor): Actor,
    Json(form): Json<ThreadForm>,
) -> Result<(StatusCode, Json<ThreadView>), AppError> {
    let thread = ctx.forum.create_thread(&actor, &form).await?;
    Ok((StatusCode::CREATED, Json(thread)))
}

async fn open(
    State(ctx): State<AppContext>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<ThreadView>, AppError> {
    Ok(Json(ctx.forum.open_thread(&actor, id).await?))
}

async fn remove(
    State(ctx): State<AppContext>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    ctx.forum.delete_thread(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn vote(
    State(ctx): State<AppContext>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(body): Json<VoteBody>,
) -> Result<Json<ThreadView>, AppError> {
    Ok(Json(ctx.forum.cast_vote(&actor, id, body.vote).await?))
}

async fn report_thread(
    State(ctx): State<AppContext>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(body): Json<ReportBody>,
) -> Result<Json<ReportResponse<ThreadReportOutcome>>, AppError> {
    let outcome = ctx.forum.report_thread(&actor, id, body.reason).await?;
    Ok(Json(ReportResponse {
        notice: outcome.notice(),
        outcome,
    }))
}

async fn add_post(
    State(ctx): State<AppContext>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(body): Json<PostBody>,
) -> Result<(StatusCode, Json<Post>), AppError> {
    let post = ctx.forum.add_post(&actor, id, &body.text).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn edit_post(
    State(ctx): State<AppContext>,
    Actor(actor): Actor,
    Path((id, post_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<PostBody>,
) -> Result<Json<Post>, AppError> {
    Ok(Json(ctx.forum.edit_post(&actor, id, post_id, &body.text).await?))
}

async fn delete_post(
    State(ctx): State<AppContext>,
    Actor(actor): Actor,
    Path((id, post_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    ctx.forum
        .delete_post(&actor, id, post_id, DeleteMode::Manual)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn report_post(
    State(ctx): State<AppContext>,
    Actor(actor): Actor,
    Path((id, post_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<ReportBody>,
) -> Result<Json<ReportResponse<PostReportOutcome>>, AppError> {
    let outcome = ctx.forum.report_post(&actor, id, post_id, body.reason).await?;
    Ok(Json(ReportResponse {
        notice: outcome.notice(),
        outcome,
    }))
}
