use axum::{routing::get, Router};
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{auth, habits};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(auth::router())
        .merge(habits::router())
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

/// Serves until Ctrl-C/SIGTERM, then closes the store.
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let addr = state.config.bind_addr();
    let store = state.store.clone();
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        let req = match body {
            Some(b) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn signup_and_login(app: &Router, email: &str) -> String {
        let (status, body) = call(
            app,
            Method::POST,
            "/signup",
            None,
            Some(json!({"email": email, "username": "runner", "password": "pw-123456"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "User created");

        let (status, body) = call(
            app,
            Method::POST,
            "/login",
            None,
            Some(json!({"email": email, "password": "pw-123456"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token_type"], "bearer");
        body["access_token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn habit_lifecycle() {
        let app = build_app(AppState::fake());
        let token = signup_and_login(&app, "ann@example.com").await;

        let (status, body) = call(
            &app,
            Method::POST,
            "/habits",
            Some(&token),
            Some(json!({"name": "Run"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let id = body["id"].as_str().unwrap().to_string();

        let (status, body) = call(&app, Method::GET, "/habits", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["name"], "Run");
        assert_eq!(body[0]["streak"], 0);
        assert_eq!(body[0]["completion_dates"], json!([]));

        let done_uri = format!("/habits/{id}/done");
        let (status, body) = call(&app, Method::PUT, &done_uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["streak"], 1);
        assert_eq!(body["message"], "Habit marked as done");

        let (status, body) = call(&app, Method::PUT, &done_uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Habit already completed today");

        let (_, body) = call(&app, Method::GET, "/habits", Some(&token), None).await;
        let today = time::OffsetDateTime::now_utc().date();
        let rendered = format!(
            "{:04}-{:02}-{:02}",
            today.year(),
            u8::from(today.month()),
            today.day()
        );
        assert_eq!(body[0]["completion_dates"], json!([rendered]));

        let habit_uri = format!("/habits/{id}");
        let (status, _) = call(
            &app,
            Method::PUT,
            &habit_uri,
            Some(&token),
            Some(json!({"name": "Jog"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(
            &app,
            Method::PUT,
            &habit_uri,
            Some(&token),
            Some(json!({"streak": 99})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("streak"));

        let (status, body) = call(&app, Method::DELETE, &habit_uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Habit deleted successfully");

        let (status, _) = call(&app, Method::DELETE, &habit_uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn other_users_habits_are_hidden() {
        let app = build_app(AppState::fake());
        let owner = signup_and_login(&app, "owner@example.com").await;
        let intruder = signup_and_login(&app, "intruder@example.com").await;

        let (_, body) = call(
            &app,
            Method::POST,
            "/habits",
            Some(&owner),
            Some(json!({"name": "Run"})),
        )
        .await;
        let id = body["id"].as_str().unwrap().to_string();

        let (status, body) = call(&app, Method::GET, "/habits", Some(&intruder), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));

        let done_uri = format!("/habits/{id}/done");
        let (status, body) = call(&app, Method::PUT, &done_uri, Some(&intruder), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Habit not found");

        let habit_uri = format!("/habits/{id}");
        let (status, _) = call(
            &app,
            Method::PUT,
            &habit_uri,
            Some(&intruder),
            Some(json!({"name": "Mine"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&app, Method::DELETE, &habit_uri, Some(&intruder), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn auth_failures() {
        let app = build_app(AppState::fake());

        let (status, _) = call(&app, Method::GET, "/habits", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(&app, Method::GET, "/habits", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        signup_and_login(&app, "ann@example.com").await;
        let (status, body) = call(
            &app,
            Method::POST,
            "/signup",
            None,
            Some(json!({"email": "ann@example.com", "username": "again", "password": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Email already registered");

        let (status, body) = call(
            &app,
            Method::POST,
            "/login",
            None,
            Some(json!({"email": "ann@example.com", "password": "wrong"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "Invalid credentials");
    }

    #[tokio::test]
    async fn malformed_requests_get_json_bad_request() {
        let app = build_app(AppState::fake());
        let token = signup_and_login(&app, "ann@example.com").await;

        let (status, body) =
            call(&app, Method::POST, "/habits", Some(&token), Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("missing field `name`"));

        let (status, body) =
            call(&app, Method::PUT, "/habits/not-a-uuid/done", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("UUID"));

        let (status, body) =
            call(&app, Method::DELETE, "/habits/42", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].is_string());

        let (status, body) = call(
            &app,
            Method::POST,
            "/login",
            None,
            Some(json!({"email": "ann@example.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("password"));

        let (status, body) = call(
            &app,
            Method::POST,
            "/signup",
            None,
            Some(json!({"email": "bob@example.com", "password": "pw"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("username"));
    }

    #[tokio::test]
    async fn habit_for_deleted_user_token_is_not_found() {
        let state = AppState::fake();
        let keys = <crate::auth::jwt::JwtKeys as axum::extract::FromRef<AppState>>::from_ref(&state);
        let app = build_app(state);
        let token = keys.sign(uuid::Uuid::new_v4(), "ghost@example.com").unwrap();

        let (status, body) = call(
            &app,
            Method::POST,
            "/habits",
            Some(&token),
            Some(json!({"name": "Run"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "User not found");
    }
}
