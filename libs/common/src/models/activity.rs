//! Activity model and related functionality

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::hours::HoursAmount;
use super::timestamp;

/// Kind of activity; each kind counts towards one hour goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityType {
    Interna,
    Externa,
    Taller,
    Chat,
    #[serde(other)]
    Otro,
}

impl ActivityType {
    pub const ALL: [ActivityType; 4] = [
        ActivityType::Interna,
        ActivityType::Externa,
        ActivityType::Taller,
        ActivityType::Chat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Interna => "Interna",
            ActivityType::Externa => "Externa",
            ActivityType::Taller => "Taller",
            ActivityType::Chat => "Chat",
            ActivityType::Otro => "Otros",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        ActivityType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
    }
}

/// Where the activity takes place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modality {
    /// In person
    P,
    /// Virtual
    V,
    #[serde(other)]
    Unknown,
}

impl Modality {
    pub fn label(&self) -> &'static str {
        match self {
            Modality::P => "Presencial",
            Modality::V => "Virtual",
            Modality::Unknown => "",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "P" => Some(Modality::P),
            "V" => Some(Modality::V),
            _ => None,
        }
    }
}

/// Intern assigned to an activity, as embedded by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssignedIntern {
    pub id: i64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Activity entity as returned by `/api/activities/actividades/`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Activity {
    pub id: i64,
    pub titulo: String,
    #[serde(default)]
    pub descripcion: Option<String>,
    pub tipo: ActivityType,
    pub fecha: NaiveDate,
    pub duracion_horas: HoursAmount,
    #[serde(default)]
    pub competencia_desarrollada: Option<String>,
    pub modalidad: Modality,
    #[serde(default)]
    pub organizacion: Option<String>,
    #[serde(default)]
    pub facilitador: Option<String>,
    #[serde(default)]
    pub creador: Option<i64>,
    #[serde(default)]
    pub creador_nombre: Option<String>,
    #[serde(default)]
    pub en_catalogo: bool,
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub fecha_creacion: Option<DateTime<Utc>>,
    #[serde(default)]
    pub becarios_asignados: Vec<i64>,
    #[serde(default)]
    pub becarios_asignados_info: Vec<AssignedIntern>,
}

impl Activity {
    /// Whether the given intern is assigned to this activity
    pub fn is_assigned_to(&self, user_id: i64) -> bool {
        self.becarios_asignados.contains(&user_id)
            || self.becarios_asignados_info.iter().any(|i| i.id == user_id)
    }
}

/// New activity creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewActivity {
    pub titulo: String,
    #[serde(default)]
    pub descripcion: Option<String>,
    pub tipo: ActivityType,
    pub fecha: NaiveDate,
    pub duracion_horas: HoursAmount,
    #[serde(default)]
    pub competencia_desarrollada: Option<String>,
    pub modalidad: Modality,
    #[serde(default)]
    pub organizacion: Option<String>,
    #[serde(default)]
    pub facilitador: Option<String>,
    pub en_catalogo: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub becarios_asignados: Vec<i64>,
}

/// Partial activity update sent with PATCH
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateActivity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub titulo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tipo: Option<ActivityType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duracion_horas: Option<HoursAmount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competencia_desarrollada: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modalidad: Option<Modality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizacion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facilitador: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub en_catalogo: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub becarios_asignados: Option<Vec<i64>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_backend_activity_shape() {
        let activity: Activity = serde_json::from_value(json!({
            "id": 3,
            "titulo": "Taller de lectura",
            "descripcion": null,
            "tipo": "Taller",
            "fecha": "2025-10-12",
            "duracion_horas": "2.00",
            "modalidad": "V",
            "en_catalogo": true,
            "fecha_creacion": "2025-10-01T09:00:00Z",
            "becarios_asignados_info": [{"id": 9, "username": "ana"}]
        }))
        .unwrap();
        assert_eq!(activity.tipo, ActivityType::Taller);
        assert_eq!(activity.duracion_horas.value(), 2.0);
        assert!(activity.is_assigned_to(9));
        assert!(!activity.is_assigned_to(10));
        assert!(activity.fecha_creacion.is_some());
    }

    #[test]
    fn test_unknown_type_falls_back() {
        let kind: ActivityType = serde_json::from_str("\"Voluntariado\"").unwrap();
        assert_eq!(kind, ActivityType::Otro);
        assert_eq!(ActivityType::parse("Chat"), Some(ActivityType::Chat));
        assert_eq!(ActivityType::parse("Otros"), None);
    }

    #[test]
    fn test_patch_only_sends_changed_fields() {
        let patch = UpdateActivity {
            becarios_asignados: Some(vec![1, 2]),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({"becarios_asignados": [1, 2]})
        );
    }
}
