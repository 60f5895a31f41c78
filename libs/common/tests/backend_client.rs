//! Integration tests for the backend request client
//!
//! These tests bind a stub backend on an ephemeral port and verify header
//! injection, payload decoding and error normalization.

use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode},
    routing::{delete, get, post},
};
use common::{
    BackendClient, BackendError,
    models::{HourRecord, User},
};
use serde_json::{Value, json};
use std::time::Duration;
use tokio::net::TcpListener;

async fn spawn_stub() -> String {
    let app = Router::new()
        .route(
            "/api/users/usuarios/mi_perfil/",
            get(|headers: HeaderMap| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                if auth != "Token good-token" {
                    return (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Invalid token."})));
                }
                (
                    StatusCode::OK,
                    Json(json!({
                        "id": 5, "username": "ana", "email": "ana@x.org",
                        "rol": "becario", "sexo": "F"
                    })),
                )
            }),
        )
        .route(
            "/api/records/registros-horas/pendientes/",
            get(|| async {
                Json(json!([{
                    "id": 1, "becario": 5, "actividad": 2,
                    "horas_reportadas": "1.50", "estado_aprobacion": "P",
                    "fecha_registro": "2025-10-12T10:00:00Z"
                }]))
            }),
        )
        .route(
            "/api/activities/actividades/",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"titulo": ["Este campo es requerido."]})),
                )
            }),
        )
        .route(
            "/api/activities/actividades/9/",
            delete(|| async { StatusCode::NO_CONTENT }),
        )
        .route(
            "/slow/",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json(json!({}))
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let addr = listener.local_addr().expect("stub addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server");
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_token_header_and_decoding() -> Result<(), Box<dyn std::error::Error>> {
    let base = spawn_stub().await;
    let client = BackendClient::new(base, Duration::from_secs(5))?;

    let me: User = client.get("/api/users/usuarios/mi_perfil/", "good-token").await?;
    assert_eq!(me.id, 5);

    let pending: Vec<HourRecord> = client
        .get("/api/records/registros-horas/pendientes/", "good-token")
        .await?;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].horas_reportadas.value(), 1.5);
    Ok(())
}

#[tokio::test]
async fn test_unauthorized_is_returned_not_redirected() -> Result<(), Box<dyn std::error::Error>> {
    let base = spawn_stub().await;
    let client = BackendClient::new(base, Duration::from_secs(5))?;

    let err = client
        .get::<User>("/api/users/usuarios/mi_perfil/", "stale-token")
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.status(), 401);
    assert_eq!(err.data()["detail"], "Invalid token.");
    Ok(())
}

#[tokio::test]
async fn test_field_errors_are_kept() -> Result<(), Box<dyn std::error::Error>> {
    let base = spawn_stub().await;
    let client = BackendClient::new(base, Duration::from_secs(5))?;

    let err = client
        .post::<_, Value>("/api/activities/actividades/", Some("t"), &json!({}))
        .await
        .unwrap_err();
    assert_eq!(err.status(), 400);
    assert_eq!(err.data()["titulo"][0], "Este campo es requerido.");
    Ok(())
}

#[tokio::test]
async fn test_empty_success_body() -> Result<(), Box<dyn std::error::Error>> {
    let base = spawn_stub().await;
    let client = BackendClient::new(base, Duration::from_secs(5))?;
    client.delete("/api/activities/actividades/9/", "t").await?;
    Ok(())
}

#[tokio::test]
async fn test_timeout_and_unreachable_are_transport_errors() -> Result<(), Box<dyn std::error::Error>>
{
    let base = spawn_stub().await;
    let client = BackendClient::new(base, Duration::from_millis(200))?;
    let err = client.get::<Value>("/slow/", "t").await.unwrap_err();
    assert!(matches!(err, BackendError::Transport(_)));
    assert_eq!(err.status(), 500);

    let client = BackendClient::new("http://127.0.0.1:9", Duration::from_secs(1))?;
    let err = client.get::<Value>("/anything/", "t").await.unwrap_err();
    assert!(matches!(err, BackendError::Transport(_)));
    Ok(())
}
