mod admin;
mod guides;
mod threads;

use crate::actor::Actor;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use jaboway_app::domain::ActorContext;
use jaboway_app::AppContext;
use jaboway_errors::AppError;
use tower_sessions::cookie::SameSite;
use tower_sessions::{MemoryStore as SessionStore, SessionManagerLayer};

/// All JSON endpoints under `/api`, with the cookie session they rely on.
pub fn router(ctx: AppContext, secure_cookies: bool) -> Router {
    let session_layer = SessionManagerLayer::new(SessionStore::default())
        .with_secure(secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_name("jaboway-session");

    let api = Router::new()
        .route("/me", get(me))
        .route("/reload", post(reload))
        .merge(guides::routes())
        .merge(threads::routes())
        .merge(admin::routes());

    Router::new()
        .nest("/api", api)
        .layer(session_layer)
        .with_state(ctx)
}

async fn me(Actor(actor): Actor) -> Json<ActorContext> {
    Json(actor)
}

async fn reload(State(ctx): State<AppContext>) -> Result<StatusCode, AppError> {
    ctx.reload().await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request};
    use jaboway_app::domain::AuthUser;
    use jaboway_app::infrastructure::AdminGate;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    struct Reply {
        status: StatusCode,
        cookie: Option<String>,
        body: Value,
    }

    async fn send(app: &Router, request: Request<Body>) -> Reply {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        Reply {
            status,
            cookie,
            body,
        }
    }

    fn json_request(method: Method, uri: &str) -> axum::http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
    }

    fn thread_body() -> Value {
        json!({ "title": "Parkir di Stasiun Depok", "text": "Berapa tarif per jam?" })
    }

    #[tokio::test]
    async fn test_guest_id_survives_between_requests() {
        let (ctx, _store) = AppContext::new_in_memory(AdminGate::disabled());
        let app = router(ctx, false);

        let first = send(&app, Request::get("/api/me").body(Body::empty()).unwrap()).await;
        assert_eq!(first.status, StatusCode::OK);
        let guest_id = first.body["actor_id"].as_str().unwrap().to_string();
        assert!(guest_id.starts_with("guest_"));
        let cookie = first.cookie.unwrap();

        let second = send(
            &app,
            Request::get("/api/me")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(second.body["actor_id"].as_str(), Some(guest_id.as_str()));
    }

    #[tokio::test]
    async fn test_guest_cannot_create_thread() {
        let (ctx, _store) = AppContext::new_in_memory(AdminGate::disabled());
        let app = router(ctx, false);

        let reply = send(
            &app,
            json_request(Method::POST, "/api/threads")
                .body(Body::from(thread_body().to_string()))
                .unwrap(),
        )
        .await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            reply.body["message"].as_str(),
            Some("Anda harus login untuk membuat diskusi.")
        );
    }

    #[tokio::test]
    async fn test_bearer_token_acts_as_member() {
        let (ctx, store) = AppContext::new_in_memory(AdminGate::disabled());
        let user_id = Uuid::new_v4();
        store.register_user(AuthUser {
            id: user_id,
            email: Some("sari@example.com".to_string()),
            full_name: Some("Sari".to_string()),
        });
        let app = router(ctx, false);

        let created = send(
            &app,
            json_request(Method::POST, "/api/threads")
                .header(header::AUTHORIZATION, format!("Bearer {user_id}"))
                .body(Body::from(thread_body().to_string()))
                .unwrap(),
        )
        .await;
        assert_eq!(created.status, StatusCode::CREATED);
        assert_eq!(created.body["posts"][0]["author"]["display_name"], "Sari");

        let listed = send(&app, Request::get("/api/threads").body(Body::empty()).unwrap()).await;
        assert_eq!(listed.body.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_admin_routes_need_admin_mode() {
        let (ctx, _store) = AppContext::new_in_memory(AdminGate::disabled());
        let app = router(ctx, false);

        let queue = send(&app, Request::get("/api/admin/queue").body(Body::empty()).unwrap()).await;
        assert_eq!(queue.status, StatusCode::FORBIDDEN);

        let login = send(
            &app,
            json_request(Method::POST, "/api/admin/login")
                .body(Body::from(json!({ "password": "rahasia" }).to_string()))
                .unwrap(),
        )
        .await;
        assert_eq!(login.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_unknown_thread_is_not_found() {
        let (ctx, _store) = AppContext::new_in_memory(AdminGate::disabled());
        let app = router(ctx, false);

        let reply = send(
            &app,
            json_request(Method::POST, &format!("/api/threads/{}/votes", Uuid::new_v4()))
                .body(Body::from(json!({ "vote": "green" }).to_string()))
                .unwrap(),
        )
        .await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
    }
}
