//! End-to-end tests of the portal against a stub backend

use auth::{AuthState, SessionManager, jwt::SessionTokenService};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use common::BackendClient;
use portal::AppState;
use reqwest::redirect::Policy;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

type Decisions = Arc<Mutex<Vec<Value>>>;

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Token ")
        .map(str::to_string)
}

/// Known tokens are accepted; `stale-token` is always rejected
fn authorized(headers: &HeaderMap) -> Result<String, (StatusCode, Json<Value>)> {
    match token(headers) {
        Some(t) if t == "admin-token" || t == "intern-token" => Ok(t),
        _ => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Token inválido."})),
        )),
    }
}

fn users() -> Value {
    json!([
        {"id": 1, "username": "admin", "email": "admin@x.org", "first_name": "Rosa", "rol": "administrador", "sexo": "F"},
        {"id": 2, "username": "ana", "email": "ana@x.org", "first_name": "Ana, \"la jefa\"", "rol": "becario", "sexo": "F",
         "meta_horas_voluntariado_externo": "10.00"},
        {"id": 3, "username": "luis", "email": "luis@x.org", "rol": "becario", "sexo": "M"}
    ])
}

fn records() -> Value {
    json!([
        {"id": 5, "becario": 2, "becario_nombre": "Ana", "actividad": 1, "descripcion_manual": "Feria",
         "horas_reportadas": "3.50", "estado_aprobacion": "P", "fecha_registro": "2025-10-12T10:00:00Z",
         "actividad_detalle": {"id": 1, "titulo": "Feria", "tipo": "Externa", "fecha": "2025-10-12",
                               "duracion_horas": "4.00", "modalidad": "P", "en_catalogo": true}},
        {"id": 6, "becario": 2, "becario_nombre": "Ana", "actividad": 1, "horas_reportadas": "2.00",
         "estado_aprobacion": "A", "fecha_registro": "2025-09-02T10:00:00Z"},
        {"id": 7, "becario": 3, "becario_nombre": "Luis", "actividad": 2, "horas_reportadas": "1.00",
         "estado_aprobacion": "P", "fecha_registro": "2025-10-20T10:00:00Z"}
    ])
}

fn activities() -> Value {
    json!([
        {"id": 1, "titulo": "Feria", "tipo": "Externa", "fecha": "2025-10-12", "duracion_horas": "4.00",
         "modalidad": "P", "en_catalogo": true, "becarios_asignados": [2]},
        {"id": 2, "titulo": "Club de conversación", "tipo": "Chat", "fecha": "2025-10-20",
         "duracion_horas": "1.00", "modalidad": "V", "en_catalogo": true}
    ])
}

async fn spawn_backend(decisions: Decisions) -> String {
    let app = Router::new()
        .route(
            "/api/users/auth/login/",
            post(|Json(body): Json<Value>| async move {
                let (token, user) = match body["email"].as_str() {
                    Some("admin@x.org") => ("admin-token", users()[0].clone()),
                    Some("ana@x.org") => ("intern-token", users()[1].clone()),
                    Some("old@x.org") => ("stale-token", users()[2].clone()),
                    _ => return (StatusCode::BAD_REQUEST, Json(json!({"detail": "Credenciales incorrectas"}))),
                };
                (StatusCode::OK, Json(json!({"token": token, "user": user})))
            }),
        )
        .route(
            "/api/users/usuarios/",
            get(|headers: HeaderMap| async move {
                authorized(&headers)?;
                Ok::<_, (StatusCode, Json<Value>)>(Json(users()))
            })
            .post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                authorized(&headers)?;
                if body["email"] == "dup@x.org" {
                    return Err((
                        StatusCode::BAD_REQUEST,
                        Json(json!({"email": ["Ya existe un usuario con este correo."]})),
                    ));
                }
                let mut user = body.clone();
                user["id"] = json!(10);
                Ok((StatusCode::CREATED, Json(user)))
            }),
        )
        .route(
            "/api/users/usuarios/mi_perfil/",
            get(|headers: HeaderMap| async move {
                let token = authorized(&headers)?;
                let index = if token == "admin-token" { 0 } else { 1 };
                Ok::<_, (StatusCode, Json<Value>)>(Json(users()[index].clone()))
            }),
        )
        .route(
            "/api/users/usuarios/obtener_pregunta_seguridad/",
            post(|Json(body): Json<Value>| async move {
                if body["email"] == "ana@x.org" {
                    (StatusCode::OK, Json(json!({"pregunta_seguridad": "¿Color favorito?"})))
                } else {
                    (StatusCode::NOT_FOUND, Json(json!({"error": "Usuario no encontrado"})))
                }
            }),
        )
        .route(
            "/api/users/usuarios/configuracion_inicial/",
            post(|headers: HeaderMap| async move {
                authorized(&headers)?;
                Ok::<_, (StatusCode, Json<Value>)>(Json(json!({"message": "Configuración completada"})))
            }),
        )
        .route(
            "/api/activities/actividades/",
            get(|headers: HeaderMap| async move {
                authorized(&headers)?;
                Ok::<_, (StatusCode, Json<Value>)>(Json(activities()))
            }),
        )
        .route(
            "/api/activities/actividades/catalogo/",
            get(|headers: HeaderMap| async move {
                authorized(&headers)?;
                Ok::<_, (StatusCode, Json<Value>)>(Json(activities()))
            }),
        )
        .route(
            "/api/records/registros-horas/",
            get(|headers: HeaderMap| async move {
                authorized(&headers)?;
                Ok::<_, (StatusCode, Json<Value>)>(Json(records()))
            }),
        )
        .route(
            "/api/records/registros-horas/pendientes/",
            get(|headers: HeaderMap| async move {
                authorized(&headers)?;
                let pending: Vec<Value> = records()
                    .as_array()
                    .unwrap()
                    .iter()
                    .filter(|r| r["estado_aprobacion"] == "P")
                    .cloned()
                    .collect();
                Ok::<_, (StatusCode, Json<Value>)>(Json(Value::Array(pending)))
            }),
        )
        .route(
            "/api/records/registros-horas/:id/",
            get(|headers: HeaderMap, Path(id): Path<i64>| async move {
                authorized(&headers)?;
                records()
                    .as_array()
                    .unwrap()
                    .iter()
                    .find(|r| r["id"] == id)
                    .cloned()
                    .map(Json)
                    .ok_or((StatusCode::NOT_FOUND, Json(json!({"detail": "No encontrado."}))))
            }),
        )
        .route(
            "/api/records/registros-horas/:id/aprobar_rechazar/",
            post(
                |State(decisions): State<Decisions>, headers: HeaderMap, Json(body): Json<Value>| async move {
                    authorized(&headers)?;
                    decisions.lock().unwrap().push(body);
                    Ok::<_, (StatusCode, Json<Value>)>(Json(json!({"message": "Registro aprobado correctamente"})))
                },
            ),
        )
        .with_state(decisions);

    serve(app).await
}

async fn spawn_portal(backend_url: &str) -> String {
    let backend = BackendClient::new(backend_url, Duration::from_secs(5)).unwrap();
    let tokens = SessionTokenService::new("test-secret", Duration::from_secs(600));
    let auth = AuthState::new(backend.clone(), SessionManager::new(tokens), false);
    serve(portal::routes::create_router(AppState::new(auth, backend, None))).await
}

struct Harness {
    portal: String,
    decisions: Decisions,
    http: reqwest::Client,
}

impl Harness {
    async fn start() -> Self {
        let decisions = Decisions::default();
        let backend = spawn_backend(decisions.clone()).await;
        Harness {
            portal: spawn_portal(&backend).await,
            decisions,
            http: reqwest::Client::builder()
                .redirect(Policy::none())
                .build()
                .unwrap(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.portal, path)
    }

    /// Log in and return the `name=value` session cookie
    async fn login(&self, email: &str) -> String {
        let response = self
            .http
            .post(self.url("/auth/login"))
            .json(&json!({"email": email, "password": "secret123"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        response
            .headers()
            .get_all("set-cookie")
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|c| c.starts_with("session-token="))
            .and_then(|c| c.split(';').next())
            .expect("session cookie")
            .to_string()
    }

    async fn get(&self, path: &str, cookie: Option<&str>) -> reqwest::Response {
        let mut request = self.http.get(self.url(path));
        if let Some(cookie) = cookie {
            request = request.header("cookie", cookie);
        }
        request.send().await.unwrap()
    }

    async fn post(&self, path: &str, cookie: Option<&str>, body: Value) -> reqwest::Response {
        let mut request = self.http.post(self.url(path)).json(&body);
        if let Some(cookie) = cookie {
            request = request.header("cookie", cookie);
        }
        request.send().await.unwrap()
    }
}

#[tokio::test]
async fn test_health_is_public() {
    let harness = Harness::start().await;
    let response = harness.get("/health", None).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_pages_without_cookie_redirect_to_login() {
    let harness = Harness::start().await;

    let response = harness.get("/dashboard/admin/overview", None).await;
    assert_eq!(response.status(), 307);
    assert_eq!(
        response.headers()["location"],
        "/auth/login?callbackUrl=%2Fdashboard%2Fadmin%2Foverview"
    );
}

#[tokio::test]
async fn test_admin_overview() {
    let harness = Harness::start().await;
    let cookie = harness.login("admin@x.org").await;

    let response = harness.get("/dashboard/admin/overview", Some(&cookie)).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["kpis"]["users"], 3);
    assert_eq!(body["kpis"]["pendingEntries"], 2);
    assert_eq!(body["kpis"]["pendingHours"], 4.5);
    assert_eq!(body["kpis"]["distinctTypes"], 2);
    assert_eq!(body["hoursPerMonth"][0]["month"], "oct");
}

#[tokio::test]
async fn test_intern_is_sent_home_from_admin_pages() {
    let harness = Harness::start().await;
    let cookie = harness.login("ana@x.org").await;

    let response = harness.get("/dashboard/admin/interns", Some(&cookie)).await;
    assert_eq!(response.status(), 303);
    assert_eq!(response.headers()["location"], "/dashboard/interns/overview");

    let response = harness.get("/dashboard/interns/overview", Some(&cookie)).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["profile"]["username"], "ana");
    assert_eq!(body["assignedActivities"], 1);
    assert_eq!(body["approvedHours"], 2.0);
}

#[tokio::test]
async fn test_user_table_filters() {
    let harness = Harness::start().await;
    let cookie = harness.login("admin@x.org").await;

    let response = harness
        .get("/dashboard/admin/interns?q=LUIS&rol=becario", Some(&cookie))
        .await;
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["total"], 3);
    assert_eq!(body["shown"], 1);
    assert_eq!(body["rows"][0]["id"], 3);
}

#[tokio::test]
async fn test_approve_pending_record_once() {
    let harness = Harness::start().await;
    let cookie = harness.login("admin@x.org").await;

    let response = harness
        .get("/dashboard/admin/activity/hours/5", Some(&cookie))
        .await;
    let detail: Value = response.json().await.unwrap();
    assert_eq!(detail["actions"], json!(["aprobar", "rechazar"]));

    let response = harness
        .post("/dashboard/admin/activity/hours/5/approve", Some(&cookie), json!({}))
        .await;
    assert_eq!(response.status(), 200);
    let envelope: Value = response.json().await.unwrap();
    assert_eq!(envelope["error"], false);
    assert_eq!(envelope["message"], "Registro actualizado correctamente");
    assert_eq!(envelope["data"]["estado_aprobacion"], "A");

    {
        let decisions = harness.decisions.lock().unwrap();
        assert_eq!(decisions.len(), 1);
        let body = &decisions[0];
        assert_eq!(body["accion"], "aprobar");
        assert_eq!(body["estado_aprobacion"], "A");
        assert_eq!(body["administrador_aprobo"], 1);
        assert_eq!(body["becario"], 2);
        assert_eq!(body["horas_reportadas"], "3.50");
        assert!(body["fecha_aprobacion"].is_string());
    }

    // Record 6 is already approved: refused without reaching the backend
    let response = harness
        .post("/dashboard/admin/activity/hours/6/reject", Some(&cookie), json!({}))
        .await;
    assert_eq!(response.status(), 409);
    let envelope: Value = response.json().await.unwrap();
    assert_eq!(envelope["error"], true);
    assert_eq!(harness.decisions.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_user_validation() {
    let harness = Harness::start().await;
    let cookie = harness.login("admin@x.org").await;
    let form = |email: &str, birth: &str| {
        json!({
            "username": "nuevo", "email": email, "password": "secret123", "rol": "becario",
            "first_name": "Nue", "last_name": "Vo", "sexo": "O", "fecha_nacimiento": birth,
            "carrera": "Física", "universidad": "UNI", "semestre": "1"
        })
    };

    let response = harness
        .post("/dashboard/admin/interns/new", Some(&cookie), form("nuevo@x.org", "2000-01-01"))
        .await;
    assert_eq!(response.status(), 201);
    let envelope: Value = response.json().await.unwrap();
    assert_eq!(envelope["data"]["id"], 10);
    assert_eq!(envelope["data"]["fecha_nacimiento"], "2000-01-01");

    let response = harness
        .post("/dashboard/admin/interns/new", Some(&cookie), form("dup@x.org", "2000-01-01"))
        .await;
    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["fieldErrors"]["email"], "Ya existe un usuario con este correo.");

    let response = harness
        .post("/dashboard/admin/interns/new", Some(&cookie), form("kid@x.org", "2030-01-01"))
        .await;
    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["fieldErrors"]["fecha_nacimiento"],
        "El usuario debe tener al menos 15 años"
    );
}

#[tokio::test]
async fn test_rejected_backend_token_ends_session() {
    let harness = Harness::start().await;
    let cookie = harness.login("old@x.org").await;

    let response = harness.get("/dashboard/profile", Some(&cookie)).await;
    assert_eq!(response.status(), 303);
    assert_eq!(response.headers()["location"], "/auth/login");
    let cleared = response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|c| c.starts_with("session-token=;") || c.starts_with("session-token=\"\""));
    assert!(cleared);
}

#[tokio::test]
async fn test_csv_export() {
    let harness = Harness::start().await;

    let response = harness.get("/api/export/csv", None).await;
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "No autorizado");

    let cookie = harness.login("admin@x.org").await;
    let response = harness.get("/api/export/csv", Some(&cookie)).await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "text/csv; charset=utf-8");
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"informe.csv\""
    );

    let csv = response.text().await.unwrap();
    assert!(csv.starts_with("section,id,name,email,sexo,user_id,hours,date,activity_type,estado_aprobacion\n"));
    assert!(csv.contains("\"Ana, \"\"la jefa\"\"\""));
    // 1 header + 3 users + 2 pending records
    assert_eq!(csv.lines().count(), 6);
}

#[tokio::test]
async fn test_pdf_exports() {
    let harness = Harness::start().await;
    let cookie = harness.login("admin@x.org").await;

    let response = harness.get("/api/export/pdf", Some(&cookie)).await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "application/pdf");
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"informe.pdf\""
    );
    let bytes = response.bytes().await.unwrap();
    assert!(bytes.starts_with(b"%PDF"));

    let response = harness
        .get("/api/export/table/activities?tipo=Chat", Some(&cookie))
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"activities.pdf\""
    );

    let response = harness.get("/api/export/table/courses", Some(&cookie)).await;
    assert_eq!(response.status(), 404);

    let intern = harness.login("ana@x.org").await;
    let response = harness.get("/api/export/table/users", Some(&intern)).await;
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn test_account_proxies() {
    let harness = Harness::start().await;

    let response = harness
        .post("/api/users/security-question/", None, json!({"email": "nadie@x.org"}))
        .await;
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Usuario no encontrado");

    let response = harness
        .post("/api/users/security-question/", None, json!({"email": "ana@x.org"}))
        .await;
    assert_eq!(response.status(), 200);

    let setup = json!({
        "nueva_password": "nuevaClave1",
        "confirmar_password": "nuevaClave1",
        "pregunta_seguridad": "¿Cuál es tu color favorito?",
        "respuesta_seguridad": "azul"
    });
    let response = harness
        .post("/api/users/configuracion-inicial/", None, setup.clone())
        .await;
    assert_eq!(response.status(), 401);

    let cookie = harness.login("ana@x.org").await;
    let response = harness
        .post("/api/users/configuracion-inicial/", Some(&cookie), setup)
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Configuración completada");
}

#[tokio::test]
async fn test_log_hours_validation() {
    let harness = Harness::start().await;
    let cookie = harness.login("ana@x.org").await;

    let response = harness
        .post(
            "/dashboard/interns/activity/1/hours",
            Some(&cookie),
            json!({"horas_reportadas": 30}),
        )
        .await;
    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["fieldErrors"]["horas_reportadas"], "Máximo 24 horas por registro");
}
