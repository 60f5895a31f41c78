//! User model and related functionality

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::hours::HoursAmount;

/// Minimum age, in years, of any user created through the portal
pub const MINIMUM_AGE_YEARS: u32 = 15;

/// Role carried by every user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "administrador")]
    Administrador,
    /// Interns, and any role the portal does not know about
    #[default]
    #[serde(rename = "becario", other)]
    Becario,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrador => "administrador",
            Role::Becario => "becario",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Administrador)
    }

    /// Route a user of this role lands on after login
    pub fn landing_route(&self) -> &'static str {
        match self {
            Role::Administrador => "/dashboard/admin/overview",
            Role::Becario => "/dashboard/interns/overview",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "administrador" => Some(Role::Administrador),
            "becario" => Some(Role::Becario),
            _ => None,
        }
    }
}

/// Sex as recorded by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Sex {
    M,
    F,
    O,
    #[default]
    #[serde(rename = "", other)]
    Unknown,
}

impl Sex {
    pub fn code(&self) -> &'static str {
        match self {
            Sex::M => "M",
            Sex::F => "F",
            Sex::O => "O",
            Sex::Unknown => "",
        }
    }

    /// Label used by the dashboard distribution
    pub fn label(&self) -> &'static str {
        match self {
            Sex::M => "Hombre",
            Sex::F => "Mujer",
            Sex::O | Sex::Unknown => "Desconocido",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "M" => Some(Sex::M),
            "F" => Some(Sex::F),
            "O" => Some(Sex::O),
            _ => None,
        }
    }
}

/// User entity as returned by `/api/users/usuarios/`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub rol: Role,
    #[serde(default)]
    pub sexo: Sex,
    #[serde(default)]
    pub fecha_nacimiento: Option<NaiveDate>,
    #[serde(default)]
    pub carrera: String,
    #[serde(default)]
    pub universidad: String,
    #[serde(default)]
    pub semestre: String,
    #[serde(default)]
    pub meta_horas_voluntariado_interno: Option<HoursAmount>,
    #[serde(default)]
    pub meta_horas_voluntariado_externo: Option<HoursAmount>,
    #[serde(default)]
    pub meta_horas_chat_ingles: Option<HoursAmount>,
    #[serde(default)]
    pub meta_horas_talleres: Option<HoursAmount>,
    #[serde(default)]
    pub configuracion_inicial_completada: bool,
}

impl User {
    /// Full name, or the username when no name is recorded
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }

    /// Hour goals per category, missing goals count as zero
    pub fn goals(&self) -> HourGoals {
        HourGoals {
            voluntariado_interno: self.meta_horas_voluntariado_interno.unwrap_or_default(),
            voluntariado_externo: self.meta_horas_voluntariado_externo.unwrap_or_default(),
            chat_ingles: self.meta_horas_chat_ingles.unwrap_or_default(),
            talleres: self.meta_horas_talleres.unwrap_or_default(),
        }
    }
}

/// Per-category hour targets of an intern
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct HourGoals {
    pub voluntariado_interno: HoursAmount,
    pub voluntariado_externo: HoursAmount,
    pub chat_ingles: HoursAmount,
    pub talleres: HoursAmount,
}

/// New user creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub rol: Role,
    pub sexo: Sex,
    /// Serialized as `YYYY-MM-DD`, the format the backend DateField expects
    pub fecha_nacimiento: NaiveDate,
    pub carrera: String,
    pub universidad: String,
    pub semestre: String,
}

/// Partial user update sent with PATCH
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateUser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rol: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sexo: Option<Sex>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_nacimiento: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrera: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub universidad: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semestre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_horas_voluntariado_interno: Option<HoursAmount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_horas_voluntariado_externo: Option<HoursAmount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_horas_chat_ingles: Option<HoursAmount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_horas_talleres: Option<HoursAmount>,
}

/// Latest birth date accepted on `today`
///
/// February 29th cutoffs clamp to February 28th in non-leap years.
pub fn age_cutoff(today: NaiveDate) -> NaiveDate {
    today
        .checked_sub_months(Months::new(MINIMUM_AGE_YEARS * 12))
        .unwrap_or(NaiveDate::MIN)
}

/// Whether someone born on `birth_date` is old enough on `today`
pub fn meets_minimum_age(birth_date: NaiveDate, today: NaiveDate) -> bool {
    birth_date <= age_cutoff(today)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_age_gate_boundary() {
        let today = date(2026, 10, 17);
        assert!(meets_minimum_age(date(2011, 10, 17), today));
        assert!(!meets_minimum_age(date(2011, 10, 18), today));
        assert!(meets_minimum_age(date(1990, 1, 1), today));
    }

    #[test]
    fn test_age_cutoff_leap_day() {
        assert_eq!(age_cutoff(date(2028, 2, 29)), date(2013, 2, 28));
    }

    #[test]
    fn test_unknown_role_is_intern() {
        let user: User = serde_json::from_value(json!({
            "id": 1, "username": "ana", "email": "ana@x.org", "rol": "coordinador"
        }))
        .unwrap();
        assert_eq!(user.rol, Role::Becario);
        assert_eq!(user.sexo, Sex::Unknown);
        assert_eq!(user.display_name(), "ana");
    }

    #[test]
    fn test_backend_user_shape() {
        let user: User = serde_json::from_value(json!({
            "id": 7,
            "username": "admin",
            "email": "admin@x.org",
            "first_name": "Rosa",
            "last_name": "Paz",
            "rol": "administrador",
            "sexo": "F",
            "fecha_nacimiento": null,
            "meta_horas_talleres": "12.00"
        }))
        .unwrap();
        assert!(user.rol.is_admin());
        assert_eq!(user.display_name(), "Rosa Paz");
        assert_eq!(user.goals().talleres.value(), 12.0);
        assert_eq!(user.goals().chat_ingles.value(), 0.0);
    }

    #[test]
    fn test_new_user_birth_date_format() {
        let payload = NewUser {
            username: "juan".into(),
            email: "juan@x.org".into(),
            password: "secret123".into(),
            first_name: "Juan".into(),
            last_name: "Lopez".into(),
            rol: Role::Becario,
            sexo: Sex::M,
            fecha_nacimiento: date(2001, 3, 9),
            carrera: "Derecho".into(),
            universidad: "UCA".into(),
            semestre: "4".into(),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["fecha_nacimiento"], "2001-03-09");
        assert_eq!(value["rol"], "becario");
    }
}
