//! Hour record actions

use auth::Session;
use chrono::Utc;
use common::{
    BackendClient,
    models::{Decision, HourRecord, NewHourRecord},
};
use serde_json::Value;
use tracing::{info, warn};

use super::{ActionResult, fetch_list, item_path};

pub const RECORDS_PATH: &str = "/api/records/registros-horas/";
pub const PENDING_PATH: &str = "/api/records/registros-horas/pendientes/";

/// Actions on `/api/records/registros-horas/`
#[derive(Debug, Clone)]
pub struct HourRecordActions {
    backend: BackendClient,
}

impl HourRecordActions {
    pub fn new(backend: BackendClient) -> Self {
        HourRecordActions { backend }
    }

    /// Records visible to the caller; interns only see their own
    pub async fn list_hour_records(&self, session: &Session) -> ActionResult<Vec<HourRecord>> {
        info!("Listing hour records for user {}", session.user_id());
        fetch_list(&self.backend, RECORDS_PATH, session.token()).await
    }

    pub async fn list_pending_hours(&self, session: &Session) -> ActionResult<Vec<HourRecord>> {
        info!("Listing pending hours for user {}", session.user_id());
        fetch_list(&self.backend, PENDING_PATH, session.token()).await
    }

    pub async fn get_hour_record(&self, session: &Session, id: i64) -> ActionResult<HourRecord> {
        info!("Fetching hour record {}", id);
        Ok(self.backend.get(&item_path(RECORDS_PATH, id), session.token()).await?)
    }

    pub async fn create_hour_record(&self, session: &Session, record: &NewHourRecord) -> ActionResult<HourRecord> {
        info!(
            "User {} logging {} hours on activity {}",
            session.user_id(),
            record.horas_reportadas,
            record.actividad
        );
        Ok(self
            .backend
            .post(RECORDS_PATH, Some(session.token()), record)
            .await?)
    }

    /// Approve or reject a pending record
    ///
    /// The record is fetched first: a record that is no longer pending is
    /// refused locally and the decision endpoint is never called. The
    /// backend expects the full record body alongside `accion`.
    pub async fn decide_hour_record(
        &self,
        session: &Session,
        id: i64,
        decision: Decision,
    ) -> ActionResult<HourRecord> {
        info!("User {} deciding '{}' on record {}", session.user_id(), decision.action(), id);

        let mut record = self.get_hour_record(session, id).await?;
        let decided_at = Utc::now();
        let body = record
            .decision_request(decision, session.user_id(), decided_at)
            .inspect_err(|e| warn!("Record {} not decided: {}", id, e))?;

        let path = format!("{}aprobar_rechazar/", item_path(RECORDS_PATH, id));
        let _: Value = self
            .backend
            .post(&path, Some(session.token()), &body)
            .await?;

        record.estado_aprobacion = body.estado_aprobacion;
        record.fecha_aprobacion = Some(decided_at);
        record.administrador_aprobo = Some(session.user_id());
        Ok(record)
    }
}
