use crate::actor::{self, Actor};
use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use jaboway_app::application::{ContentOverview, ReviewQueue};
use jaboway_app::domain::Profile;
use jaboway_app::AppContext;
use jaboway_errors::AppError;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use uuid::Uuid;

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/admin/login", post(login))
        .route("/admin/logout", post(logout))
        .route("/admin/queue", get(queue))
        .route("/admin/content", get(content))
        .route("/admin/users", get(users))
        .route("/admin/users/{id}/block", put(block))
}

#[derive(Debug, Deserialize)]
struct LoginBody {
    password: String,
}

#[derive(Debug, Deserialize)]
struct BlockBody {
    blocked: bool,
}

#[derive(Serialize)]
struct AdminMode {
    is_admin: bool,
}

async fn login(
    State(ctx): State<AppContext>,
    session: Session,
    Json(body): Json<LoginBody>,
) -> Result<Json<AdminMode>, AppError> {
    ctx.admin.login(&body.password)?;
    actor::set_admin(&session, true).await?;
    Ok(Json(AdminMode { is_admin: true }))
}

async fn logout(session: Session) -> Result<Json<AdminMode>, AppError> {
    actor::set_admin(&session, false).await?;
    tracing::info!("admin mode left");
    Ok(Json(AdminMode { is_admin: false }))
}

async fn queue(
    State(ctx): State<AppContext>,
    Actor(actor): Actor,
) -> Result<Json<ReviewQueue>, AppError> {
    Ok(Json(ctx.admin.queue(&actor)?))
}

async fn content(
    State(ctx): State<AppContext>,
    Actor(actor): Actor,
) -> Result<Json<ContentOverview>, AppError> {
    Ok(Json(ctx.admin.content(&actor)?))
}

async fn users(
    State(ctx): State<AppContext>,
    Actor(actor): Actor,
) -> Result<Json<Vec<Profile>>, AppError> {
    Ok(Json(ctx.admin.users(&actor)?))
}

async fn block(
    State(ctx): State<AppContext>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(body): Json<BlockBody>,
) -> Result<Json<Profile>, AppError> {
    Ok(Json(ctx.admin.block_user(&actor, id, body.blocked).await?))
}
