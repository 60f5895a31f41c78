//! Hour record model and its approval state machine
//!
//! A record starts `Pending` and moves exactly once into `Approved` or
//! `Rejected`. Terminal records never go back to pending.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::activity::Activity;
use super::hours::HoursAmount;
use super::timestamp;

/// Approval state of an hour record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ApprovalState {
    #[default]
    #[serde(rename = "P", alias = "PENDIENTE", alias = "pendiente")]
    Pending,
    #[serde(rename = "A", alias = "APROBADO", alias = "aprobado")]
    Approved,
    #[serde(rename = "R", alias = "RECHAZADO", alias = "rechazado")]
    Rejected,
}

impl ApprovalState {
    pub fn code(&self) -> &'static str {
        match self {
            ApprovalState::Pending => "P",
            ApprovalState::Approved => "A",
            ApprovalState::Rejected => "R",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ApprovalState::Pending => "Pendiente",
            ApprovalState::Approved => "Aprobado",
            ApprovalState::Rejected => "Rechazado",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "P" => Some(ApprovalState::Pending),
            "A" => Some(ApprovalState::Approved),
            "R" => Some(ApprovalState::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ApprovalState::Pending)
    }

    /// Decisions an administrator may still take on a record in this state
    pub fn available_decisions(&self) -> &'static [Decision] {
        match self {
            ApprovalState::Pending => &[Decision::Approve, Decision::Reject],
            ApprovalState::Approved | ApprovalState::Rejected => &[],
        }
    }

    /// Apply an administrator decision
    pub fn apply(self, decision: Decision) -> Result<ApprovalState, TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError::AlreadyDecided(self));
        }
        Ok(decision.target_state())
    }
}

/// Administrator decision on a pending record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    #[serde(rename = "aprobar")]
    Approve,
    #[serde(rename = "rechazar")]
    Reject,
}

impl Decision {
    /// Value of the `accion` field expected by the backend
    pub fn action(&self) -> &'static str {
        match self {
            Decision::Approve => "aprobar",
            Decision::Reject => "rechazar",
        }
    }

    pub fn target_state(&self) -> ApprovalState {
        match self {
            Decision::Approve => ApprovalState::Approved,
            Decision::Reject => ApprovalState::Rejected,
        }
    }
}

/// Rejected state transition
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Record was already decided ({})", .0.label())]
    AlreadyDecided(ApprovalState),
}

/// Hour record as returned by `/api/records/registros-horas/`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HourRecord {
    pub id: i64,
    pub becario: i64,
    #[serde(default)]
    pub becario_nombre: Option<String>,
    pub actividad: i64,
    #[serde(default)]
    pub actividad_detalle: Option<Activity>,
    #[serde(default)]
    pub descripcion_manual: Option<String>,
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub fecha_registro: Option<DateTime<Utc>>,
    pub horas_reportadas: HoursAmount,
    #[serde(default)]
    pub estado_aprobacion: ApprovalState,
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub fecha_aprobacion: Option<DateTime<Utc>>,
    #[serde(default)]
    pub administrador_aprobo: Option<i64>,
}

impl HourRecord {
    /// Title of the embedded activity, if the backend sent it
    pub fn activity_title(&self) -> Option<&str> {
        self.actividad_detalle.as_ref().map(|a| a.titulo.as_str())
    }

    /// Build the full decision body; the backend wants a complete
    /// representation rather than a partial patch
    pub fn decision_request(
        &self,
        decision: Decision,
        admin_id: i64,
        decided_at: DateTime<Utc>,
    ) -> Result<DecisionRequest, TransitionError> {
        let estado_aprobacion = self.estado_aprobacion.apply(decision)?;

        Ok(DecisionRequest {
            becario: self.becario,
            actividad: self.actividad,
            descripcion_manual: self.descripcion_manual.clone().unwrap_or_default(),
            horas_reportadas: self.horas_reportadas,
            estado_aprobacion,
            fecha_aprobacion: decided_at,
            administrador_aprobo: admin_id,
            accion: decision,
        })
    }
}

/// Body posted to `/api/records/registros-horas/{id}/aprobar_rechazar/`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionRequest {
    pub becario: i64,
    pub actividad: i64,
    pub descripcion_manual: String,
    pub horas_reportadas: HoursAmount,
    pub estado_aprobacion: ApprovalState,
    pub fecha_aprobacion: DateTime<Utc>,
    pub administrador_aprobo: i64,
    pub accion: Decision,
}

/// Payload an intern posts to log hours
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHourRecord {
    pub actividad: i64,
    pub descripcion_manual: String,
    pub horas_reportadas: HoursAmount,
}
