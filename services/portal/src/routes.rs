//! Portal routes
//!
//! Pages are served as JSON view-models under the paths the web UI uses.
//! Page loads fail with [`PortalError::LoadData`]; mutations answer with
//! the uniform [`Envelope`].

use auth::{CurrentSession, RequireAdmin, Session, session_gate};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Local;
use common::{
    BackendError,
    models::{Activity, Decision, HourRecord, User},
};
use export::{OverviewReport, TableRow, csv::build_report_csv, table_pdf};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    AppState,
    actions::ActionResult,
    dashboard::{AdminOverview, InternOverview},
    error::{ActionError, Envelope, PortalError, PortalResult},
    forms::{
        ActivityForm, CreateUserForm, InitialSetupForm, LogHoursForm, ProfileForm,
        ResetPasswordForm, SecurityQuestionForm,
    },
    tables::{TableKind, TablePage, TableQuery},
};

/// Create the router for the portal service
pub fn create_router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/dashboard/admin/overview", get(admin_overview))
        .route("/dashboard/admin/interns", get(list_interns))
        .route("/dashboard/admin/interns/new", post(create_intern))
        .route(
            "/dashboard/admin/interns/:id",
            get(get_intern).patch(update_intern).delete(delete_intern),
        )
        .route(
            "/dashboard/admin/activity",
            get(list_activities).post(create_activity),
        )
        .route("/dashboard/admin/activity/hours", get(list_hours))
        .route("/dashboard/admin/activity/hours/:id", get(get_hours))
        .route("/dashboard/admin/activity/hours/:id/approve", post(approve_hours))
        .route("/dashboard/admin/activity/hours/:id/reject", post(reject_hours))
        .route(
            "/dashboard/admin/activity/:id",
            get(get_activity).patch(update_activity).delete(delete_activity),
        );

    let intern_routes = Router::new()
        .route("/dashboard/interns/overview", get(intern_overview))
        .route("/dashboard/interns/activity", get(intern_activity))
        .route("/dashboard/interns/activity/:id/hours", post(log_hours))
        .route("/dashboard/profile", get(my_profile).patch(update_my_profile));

    let api_routes = Router::new()
        .route("/api/export/csv", get(export_csv))
        .route("/api/export/pdf", get(export_pdf))
        .route("/api/export/table/:kind", get(export_table))
        .route("/api/users/configuracion-inicial/", post(initial_setup))
        .route("/api/users/security-question/", post(security_question))
        .route("/api/users/reset-password-security/", post(reset_password_security));

    let auth_routes = auth::routes::create_router(state.auth.clone());

    Router::new()
        .route("/health", get(health_check))
        .merge(admin_routes)
        .merge(intern_routes)
        .merge(api_routes)
        .with_state(state)
        .merge(auth_routes)
        .layer(middleware::from_fn(session_gate))
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "portal"
    }))
}

/// Admin overview datasets are optional: a failed fetch shows as empty
fn or_empty<T>(result: ActionResult<Vec<T>>, what: &str) -> PortalResult<Vec<T>> {
    match result {
        Ok(items) => Ok(items),
        Err(e) if e.is_unauthorized() => Err(PortalError::LoadData(e)),
        Err(e) => {
            warn!("Overview without {}: {}", what, e);
            Ok(Vec::new())
        }
    }
}

/// Admin dashboard KPIs and charts
pub async fn admin_overview(
    State(state): State<AppState>,
    RequireAdmin(session): RequireAdmin,
) -> PortalResult<Json<AdminOverview>> {
    let (users, pending, activities) = tokio::join!(
        state.users.list_users(&session),
        state.records.list_pending_hours(&session),
        state.activities.list_activities(&session),
    );

    Ok(Json(AdminOverview::build(
        &or_empty(users, "users")?,
        &or_empty(pending, "pending hours")?,
        &or_empty(activities, "activities")?,
    )))
}

/// User table
pub async fn list_interns(
    State(state): State<AppState>,
    RequireAdmin(session): RequireAdmin,
    Query(query): Query<TableQuery>,
) -> PortalResult<Json<TablePage<User>>> {
    let users = state
        .users
        .list_users(&session)
        .await
        .map_err(PortalError::LoadData)?;
    let total = users.len();
    Ok(Json(TablePage::new(total, query.filter_users(users))))
}

/// Create a user
pub async fn create_intern(
    State(state): State<AppState>,
    RequireAdmin(session): RequireAdmin,
    Json(form): Json<CreateUserForm>,
) -> PortalResult<Envelope<User>> {
    const FALLBACK: &str = "An error occurred while creating the user";

    let new_user = form
        .validate(Local::now().date_naive())
        .map_err(ActionError::Validation)
        .map_err(PortalError::action(FALLBACK))?;
    let user = state
        .users
        .create_user(&session, &new_user)
        .await
        .map_err(PortalError::action(FALLBACK))?;

    info!("User {} created by {}", user.id, session.user_id());
    Ok(Envelope::success("User created successfully", 201, user))
}

pub async fn get_intern(
    State(state): State<AppState>,
    RequireAdmin(session): RequireAdmin,
    Path(id): Path<i64>,
) -> PortalResult<Json<User>> {
    let user = state
        .users
        .get_user(&session, id)
        .await
        .map_err(PortalError::LoadData)?;
    Ok(Json(user))
}

pub async fn update_intern(
    State(state): State<AppState>,
    RequireAdmin(session): RequireAdmin,
    Path(id): Path<i64>,
    Json(form): Json<ProfileForm>,
) -> PortalResult<Envelope<User>> {
    const FALLBACK: &str = "An error occurred while updating the user";

    let patch = form
        .validate()
        .map_err(ActionError::Validation)
        .map_err(PortalError::action(FALLBACK))?;
    let user = state
        .users
        .update_user(&session, id, &patch)
        .await
        .map_err(PortalError::action(FALLBACK))?;
    Ok(Envelope::success("User updated successfully", 200, user))
}

pub async fn delete_intern(
    State(state): State<AppState>,
    RequireAdmin(session): RequireAdmin,
    Path(id): Path<i64>,
) -> PortalResult<Envelope<()>> {
    state
        .users
        .delete_user(&session, id)
        .await
        .map_err(PortalError::action("An error occurred while deleting the user"))?;
    Ok(Envelope::success("User deleted successfully", 200, ()))
}

/// Activity table
pub async fn list_activities(
    State(state): State<AppState>,
    RequireAdmin(session): RequireAdmin,
    Query(query): Query<TableQuery>,
) -> PortalResult<Json<TablePage<Activity>>> {
    let activities = state
        .activities
        .list_activities(&session)
        .await
        .map_err(PortalError::LoadData)?;
    let total = activities.len();
    Ok(Json(TablePage::new(total, query.filter_activities(activities))))
}

pub async fn create_activity(
    State(state): State<AppState>,
    RequireAdmin(session): RequireAdmin,
    Json(form): Json<ActivityForm>,
) -> PortalResult<Envelope<Activity>> {
    const FALLBACK: &str = "Error creating activity";

    let new_activity = form
        .validate_new()
        .map_err(ActionError::Validation)
        .map_err(PortalError::action(FALLBACK))?;
    let activity = state
        .activities
        .create_activity(&session, &new_activity)
        .await
        .map_err(PortalError::action(FALLBACK))?;
    Ok(Envelope::success("Activity created successfully", 201, activity))
}

pub async fn get_activity(
    State(state): State<AppState>,
    RequireAdmin(session): RequireAdmin,
    Path(id): Path<i64>,
) -> PortalResult<Json<Activity>> {
    let activity = state
        .activities
        .get_activity(&session, id)
        .await
        .map_err(PortalError::LoadData)?;
    Ok(Json(activity))
}

/// Edit an activity or its assigned interns
pub async fn update_activity(
    State(state): State<AppState>,
    RequireAdmin(session): RequireAdmin,
    Path(id): Path<i64>,
    Json(form): Json<ActivityForm>,
) -> PortalResult<Envelope<Activity>> {
    const FALLBACK: &str = "Error updating activity";

    let patch = form
        .validate_patch()
        .map_err(ActionError::Validation)
        .map_err(PortalError::action(FALLBACK))?;
    let activity = state
        .activities
        .update_activity(&session, id, &patch)
        .await
        .map_err(PortalError::action(FALLBACK))?;
    Ok(Envelope::success("Activity updated successfully", 200, activity))
}

pub async fn delete_activity(
    State(state): State<AppState>,
    RequireAdmin(session): RequireAdmin,
    Path(id): Path<i64>,
) -> PortalResult<Envelope<()>> {
    state
        .activities
        .delete_activity(&session, id)
        .await
        .map_err(PortalError::action("Error deleting activity"))?;
    Ok(Envelope::success("Activity deleted successfully", 200, ()))
}

/// Hour records table, optionally one approval state
pub async fn list_hours(
    State(state): State<AppState>,
    RequireAdmin(session): RequireAdmin,
    Query(query): Query<TableQuery>,
) -> PortalResult<Json<TablePage<HourRecord>>> {
    let records = state
        .records
        .list_hour_records(&session)
        .await
        .map_err(PortalError::LoadData)?;
    let total = records.len();
    Ok(Json(TablePage::new(total, query.filter_records(records))))
}

/// Hour record with the decisions still available on it
#[derive(Debug, Serialize)]
pub struct HourRecordDetail {
    #[serde(flatten)]
    pub record: HourRecord,
    pub estado_label: &'static str,
    pub actions: &'static [Decision],
}

impl From<HourRecord> for HourRecordDetail {
    fn from(record: HourRecord) -> Self {
        HourRecordDetail {
            estado_label: record.estado_aprobacion.label(),
            actions: record.estado_aprobacion.available_decisions(),
            record,
        }
    }
}

pub async fn get_hours(
    State(state): State<AppState>,
    RequireAdmin(session): RequireAdmin,
    Path(id): Path<i64>,
) -> PortalResult<Json<HourRecordDetail>> {
    let record = state
        .records
        .get_hour_record(&session, id)
        .await
        .map_err(PortalError::LoadData)?;
    Ok(Json(record.into()))
}

async fn decide(
    state: &AppState,
    session: &Session,
    id: i64,
    decision: Decision,
) -> PortalResult<Envelope<HourRecordDetail>> {
    let record = state
        .records
        .decide_hour_record(session, id, decision)
        .await
        .map_err(PortalError::action("Error aprobando/rechazando registro horas"))?;
    Ok(Envelope::success(
        "Registro actualizado correctamente",
        200,
        record.into(),
    ))
}

pub async fn approve_hours(
    State(state): State<AppState>,
    RequireAdmin(session): RequireAdmin,
    Path(id): Path<i64>,
) -> PortalResult<Envelope<HourRecordDetail>> {
    decide(&state, &session, id, Decision::Approve).await
}

pub async fn reject_hours(
    State(state): State<AppState>,
    RequireAdmin(session): RequireAdmin,
    Path(id): Path<i64>,
) -> PortalResult<Envelope<HourRecordDetail>> {
    decide(&state, &session, id, Decision::Reject).await
}

/// Intern dashboard: own progress against hour goals
pub async fn intern_overview(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> PortalResult<Json<InternOverview>> {
    let (profile, activities, records) = tokio::try_join!(
        state.users.my_profile(&session),
        state.activities.list_activities(&session),
        state.records.list_hour_records(&session),
    )
    .map_err(PortalError::LoadData)?;

    Ok(Json(InternOverview::build(profile, &activities, &records)))
}

#[derive(Debug, Serialize)]
pub struct InternActivityPage {
    pub catalog: Vec<Activity>,
    pub records: Vec<HourRecord>,
}

/// Catalog to log hours against, with the intern's own records
pub async fn intern_activity(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> PortalResult<Json<InternActivityPage>> {
    let (catalog, records) = tokio::try_join!(
        state.activities.list_catalog(&session),
        state.records.list_hour_records(&session),
    )
    .map_err(PortalError::LoadData)?;

    let user_id = session.user_id();
    let records = records.into_iter().filter(|r| r.becario == user_id).collect();
    Ok(Json(InternActivityPage { catalog, records }))
}

/// Log hours on an activity
pub async fn log_hours(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<i64>,
    Json(mut form): Json<LogHoursForm>,
) -> PortalResult<Envelope<HourRecord>> {
    const FALLBACK: &str = "Error creating registro horas";

    form.actividad = id.to_string();
    let new_record = form
        .validate()
        .map_err(ActionError::Validation)
        .map_err(PortalError::action(FALLBACK))?;
    let record = state
        .records
        .create_hour_record(&session, &new_record)
        .await
        .map_err(PortalError::action(FALLBACK))?;
    Ok(Envelope::success("Horas registradas correctamente", 201, record))
}

pub async fn my_profile(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> PortalResult<Json<User>> {
    let profile = state
        .users
        .my_profile(&session)
        .await
        .map_err(PortalError::LoadData)?;
    Ok(Json(profile))
}

pub async fn update_my_profile(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(form): Json<ProfileForm>,
) -> PortalResult<Envelope<User>> {
    const FALLBACK: &str = "Error al actualizar el usuario";

    let patch = form
        .validate()
        .map_err(ActionError::Validation)
        .map_err(PortalError::action(FALLBACK))?;
    let user = state
        .users
        .update_user(&session, session.user_id(), &patch)
        .await
        .map_err(PortalError::action(FALLBACK))?;
    Ok(Envelope::success("Perfil actualizado correctamente", 200, user))
}

/// Export routes answer JSON errors instead of redirecting
fn export_error(e: ActionError) -> PortalError {
    match e.status() {
        401 => PortalError::Unauthorized,
        403 => PortalError::Forbidden,
        _ => PortalError::LoadData(e),
    }
}

fn attachment(content_type: &str, filename: &str, body: impl IntoResponse) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

async fn report_data(state: &AppState, session: &Session) -> PortalResult<(Vec<User>, Vec<HourRecord>)> {
    tokio::try_join!(
        state.users.list_users(session),
        state.records.list_pending_hours(session),
    )
    .map_err(export_error)
}

/// Users and pending hours as one CSV
pub async fn export_csv(
    State(state): State<AppState>,
    session: Option<CurrentSession>,
) -> PortalResult<Response> {
    let CurrentSession(session) = session.ok_or(PortalError::Unauthorized)?;
    let (users, pending) = report_data(&state, &session).await?;

    let csv = build_report_csv(&users, &pending)?;
    info!(
        "CSV export for user {}: {} users, {} pending records",
        session.user_id(),
        users.len(),
        pending.len()
    );
    Ok(attachment("text/csv; charset=utf-8", "informe.csv", csv))
}

/// Overview report as PDF
pub async fn export_pdf(
    State(state): State<AppState>,
    session: Option<CurrentSession>,
) -> PortalResult<Response> {
    let CurrentSession(session) = session.ok_or(PortalError::Unauthorized)?;
    let (users, pending) = report_data(&state, &session).await?;

    let logo = state.logo.clone();
    let generated_at = Local::now();
    let pdf = tokio::task::spawn_blocking(move || {
        OverviewReport::from_data(&users, &pending).render(logo.as_deref().map(Vec::as_slice), generated_at)
    })
    .await??;

    info!("PDF export for user {}: {} bytes", session.user_id(), pdf.len());
    Ok(attachment("application/pdf", "informe.pdf", pdf))
}

async fn render_table<R>(kind: TableKind, rows: Vec<R>, logo: Option<Arc<Vec<u8>>>) -> PortalResult<Vec<u8>>
where
    R: TableRow + Send + 'static,
{
    let generated_at = Local::now();
    let pdf = tokio::task::spawn_blocking(move || {
        table_pdf(
            kind.title(),
            &kind.columns(),
            &rows,
            logo.as_deref().map(Vec::as_slice),
            generated_at,
        )
    })
    .await??;
    Ok(pdf)
}

/// One admin table, with its filters applied, as PDF
pub async fn export_table(
    State(state): State<AppState>,
    session: Option<CurrentSession>,
    Path(kind): Path<String>,
    Query(query): Query<TableQuery>,
) -> PortalResult<Response> {
    let CurrentSession(session) = session.ok_or(PortalError::Unauthorized)?;
    if !session.role().is_admin() {
        return Err(PortalError::Forbidden);
    }
    let kind = TableKind::parse(&kind).ok_or(PortalError::NotFound)?;
    let logo = state.logo.clone();

    let pdf = match kind {
        TableKind::Users => {
            let users = state.users.list_users(&session).await.map_err(export_error)?;
            render_table(kind, query.filter_users(users), logo).await?
        }
        TableKind::Activities => {
            let activities = state
                .activities
                .list_activities(&session)
                .await
                .map_err(export_error)?;
            render_table(kind, query.filter_activities(activities), logo).await?
        }
        TableKind::Hours => {
            let records = state
                .records
                .list_hour_records(&session)
                .await
                .map_err(export_error)?;
            render_table(kind, query.filter_records(records), logo).await?
        }
    };

    Ok(attachment("application/pdf", kind.filename(), pdf))
}

/// Hand the backend's own answer back to the browser
fn passthrough(result: ActionResult<Value>, what: &str) -> Response {
    match result {
        Ok(data) => Json(data).into_response(),
        Err(ActionError::Backend(e @ (BackendError::Unauthorized { .. } | BackendError::Status { .. }))) => {
            let status = StatusCode::from_u16(e.status()).unwrap_or(StatusCode::BAD_GATEWAY);
            (status, Json(e.data())).into_response()
        }
        Err(e) => {
            error!("{} API error: {}", what, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Error interno del servidor"})),
            )
                .into_response()
        }
    }
}

fn invalid_form(errors: auth::validation::FieldErrors) -> PortalError {
    PortalError::action("Error interno del servidor")(ActionError::Validation(errors))
}

/// First login setup, forwarded with the session token
pub async fn initial_setup(
    State(state): State<AppState>,
    session: Option<CurrentSession>,
    Json(form): Json<InitialSetupForm>,
) -> PortalResult<Response> {
    let CurrentSession(session) = session.ok_or(PortalError::Unauthorized)?;
    form.validate().map_err(invalid_form)?;

    let result = state.accounts.initial_setup(&session, &form).await;
    Ok(passthrough(result, "Initial setup"))
}

pub async fn security_question(
    State(state): State<AppState>,
    Json(form): Json<SecurityQuestionForm>,
) -> PortalResult<Response> {
    form.validate().map_err(invalid_form)?;

    let result = state.accounts.security_question(&form).await;
    Ok(passthrough(result, "Security question"))
}

pub async fn reset_password_security(
    State(state): State<AppState>,
    Json(form): Json<ResetPasswordForm>,
) -> PortalResult<Response> {
    form.validate().map_err(invalid_form)?;

    let result = state.accounts.reset_password_security(&form).await;
    Ok(passthrough(result, "Reset password security"))
}
