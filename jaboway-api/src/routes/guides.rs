use crate::actor::Actor;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use jaboway_app::domain::{City, Guide, GuideCategory, GuideDraft, GuideFilter, GuidePage, PageWindow};
use jaboway_app::AppContext;
use jaboway_errors::AppError;
use serde::Deserialize;
use uuid::Uuid;

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/guides", get(list).post(create))
        .route("/guides/mine", get(mine))
        .route("/guides/{id}", get(open).patch(update).delete(remove))
        .route("/guides/{id}/approve", post(approve))
}

#[derive(Debug, Default, Deserialize)]
struct GuideQuery {
    city: Option<City>,
    category: Option<GuideCategory>,
    q: Option<String>,
    visible: Option<usize>,
}

async fn list(State(ctx): State<AppContext>, Query(query): Query<GuideQuery>) -> Json<GuidePage> {
    let filter = GuideFilter {
        city: query.city,
        category: query.category,
        query: query.q,
    };
    let window = query.visible.map(PageWindow::new).unwrap_or_default();
    Json(ctx.guides.page(&filter, window))
}

async fn mine(State(ctx): State<AppContext>, Actor(actor): Actor) -> Json<Vec<Guide>> {
    Json(ctx.guides.contributions(&actor))
}

async fn create(
    State(ctx): State<AppContext>,
    Actor(actor): Actor,
    Json(draft): Json<GuideDraft>,
) -> Result<(StatusCode, Json<Guide>), AppError> {
    let guide = ctx.guides.create(&actor, &draft).await?;
    Ok((StatusCode::CREATED, Json(guide)))
}

async fn open(
    State(ctx): State<AppContext>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Guide>, AppError> {
    Ok(Json(ctx.guides.open(&actor, id).await?))
}

async fn update(
    State(ctx): State<AppContext>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
    Json(draft): Json<GuideDraft>,
) -> Result<Json<Guide>, AppError> {
    Ok(Json(ctx.guides.update(&actor, id, &draft).await?))
}

async fn remove(
    State(ctx): State<AppContext>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    ctx.guides.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn approve(
    State(ctx): State<AppContext>,
    Actor(actor): Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Guide>, AppError> {
    Ok(Json(ctx.guides.approve(&actor, id).await?))
}
