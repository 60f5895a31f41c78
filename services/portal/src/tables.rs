//! Table filters and export column sets

use common::models::{Activity, ActivityType, ApprovalState, HourRecord, Role, User};
use export::Column;
use serde::{Deserialize, Serialize};

/// Query string of the admin tables and their exports
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableQuery {
    pub q: Option<String>,
    pub rol: Option<String>,
    pub tipo: Option<String>,
    pub estado: Option<String>,
}

impl TableQuery {
    fn needle(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }

    /// Users whose name, email or username contains `q`, optionally of one role
    pub fn filter_users(&self, users: Vec<User>) -> Vec<User> {
        let needle = self.needle();
        let role = self.rol.as_deref().and_then(Role::parse);

        users
            .into_iter()
            .filter(|u| role.is_none_or(|r| u.rol == r))
            .filter(|u| {
                needle.as_deref().is_none_or(|n| {
                    [u.display_name(), u.email.clone(), u.username.clone()]
                        .iter()
                        .any(|field| field.to_lowercase().contains(n))
                })
            })
            .collect()
    }

    /// Activities whose title contains `q`, optionally of one type
    pub fn filter_activities(&self, activities: Vec<Activity>) -> Vec<Activity> {
        let needle = self.needle();
        let kind = self.tipo.as_deref().and_then(ActivityType::parse);

        activities
            .into_iter()
            .filter(|a| kind.is_none_or(|k| a.tipo == k))
            .filter(|a| {
                needle
                    .as_deref()
                    .is_none_or(|n| a.titulo.to_lowercase().contains(n))
            })
            .collect()
    }

    /// Records in one approval state; an unknown or missing state keeps all
    pub fn filter_records(&self, records: Vec<HourRecord>) -> Vec<HourRecord> {
        let state = self.estado.as_deref().and_then(ApprovalState::parse);
        let needle = self.needle();

        records
            .into_iter()
            .filter(|r| state.is_none_or(|s| r.estado_aprobacion == s))
            .filter(|r| {
                needle.as_deref().is_none_or(|n| {
                    let name = r.becario_nombre.as_deref().unwrap_or_default();
                    let title = r.activity_title().unwrap_or_default();
                    name.to_lowercase().contains(n) || title.to_lowercase().contains(n)
                })
            })
            .collect()
    }
}

/// A filtered table, as served to the admin pages
#[derive(Debug, Serialize)]
pub struct TablePage<T> {
    pub rows: Vec<T>,
    pub total: usize,
    pub shown: usize,
}

impl<T> TablePage<T> {
    pub fn new(total: usize, rows: Vec<T>) -> Self {
        TablePage {
            shown: rows.len(),
            rows,
            total,
        }
    }
}

/// Tables that can be exported to PDF
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Users,
    Activities,
    Hours,
}

impl TableKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "users" => Some(TableKind::Users),
            "activities" => Some(TableKind::Activities),
            "hours" => Some(TableKind::Hours),
            _ => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            TableKind::Users => "Usuarios",
            TableKind::Activities => "Actividades",
            TableKind::Hours => "Registros de horas",
        }
    }

    pub fn filename(&self) -> &'static str {
        match self {
            TableKind::Users => "users.pdf",
            TableKind::Activities => "activities.pdf",
            TableKind::Hours => "hours.pdf",
        }
    }

    /// Columns of the matching admin table; display-only columns are not exported
    pub fn columns(&self) -> Vec<Column> {
        match self {
            TableKind::Users => vec![
                Column::display(""),
                Column::new("username", "Usuario"),
                Column::new("email", "Correo"),
                Column::new("rol", "Rol"),
                Column::new("fecha_nacimiento", "Nacimiento"),
                Column::display("Acciones"),
            ],
            TableKind::Activities => vec![
                Column::display(""),
                Column::new("titulo", "Título"),
                Column::new("tipo", "Tipo"),
                Column::new("fecha", "Fecha"),
                Column::new("duracion_horas", "Duración (h)"),
                Column::new("modalidad", "Modalidad"),
                Column::new("organizacion", "Organización"),
                Column::new("facilitador", "Facilitador"),
                Column::display("Acciones"),
            ],
            TableKind::Hours => vec![
                Column::display(""),
                Column::new("becario_nombre", "Becario"),
                Column::new("actividad_detalle.titulo", "Actividad"),
                Column::new("horas_reportadas", "Horas reportadas"),
                Column::new("descripcion_manual", "Descripción"),
                Column::new("fecha_registro", "Fecha registro"),
                Column::new("estado_aprobacion", "Estado"),
                Column::display("Acciones"),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use export::table::accessor_columns;
    use serde_json::json;

    fn users() -> Vec<User> {
        serde_json::from_value(json!([
            {"id": 1, "username": "admin", "email": "rosa@x.org", "first_name": "Rosa", "rol": "administrador"},
            {"id": 2, "username": "ana", "email": "ana@x.org", "first_name": "Ana", "last_name": "Ruiz", "rol": "becario"},
            {"id": 3, "username": "luis", "email": "lm@x.org", "rol": "becario"}
        ]))
        .unwrap()
    }

    #[test]
    fn test_user_search_is_case_insensitive() {
        let query = TableQuery {
            q: Some("RUIZ".into()),
            ..Default::default()
        };
        let found = query.filter_users(users());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 2);
    }

    #[test]
    fn test_user_role_filter() {
        let query = TableQuery {
            rol: Some("becario".into()),
            q: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(query.filter_users(users()).len(), 2);
    }

    #[test]
    fn test_record_state_filter() {
        let records: Vec<HourRecord> = serde_json::from_value(json!([
            {"id": 1, "becario": 2, "actividad": 1, "horas_reportadas": "1", "estado_aprobacion": "P"},
            {"id": 2, "becario": 2, "actividad": 1, "horas_reportadas": "2", "estado_aprobacion": "A"}
        ]))
        .unwrap();

        let pending = TableQuery {
            estado: Some("P".into()),
            ..Default::default()
        };
        assert_eq!(pending.filter_records(records.clone()).len(), 1);

        let unknown = TableQuery {
            estado: Some("X".into()),
            ..Default::default()
        };
        assert_eq!(unknown.filter_records(records).len(), 2);
    }

    #[test]
    fn test_export_columns_skip_display_only() {
        let columns = TableKind::Hours.columns();
        let exported = accessor_columns(&columns);
        assert_eq!(exported.len(), 6);
        assert_eq!(exported[0].label(), "Becario");
        assert_eq!(TableKind::parse("hours"), Some(TableKind::Hours));
        assert_eq!(TableKind::parse("courses"), None);
    }
}
