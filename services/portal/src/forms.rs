//! Server-side form validation
//!
//! Forms arrive as JSON. Inputs may be sent as strings or as numbers, so
//! every field is read as text and parsed while validating. A form either
//! turns into the payload sent to the backend or into [`FieldErrors`].

use auth::validation::{FieldErrors, validate_email, validate_min_chars};
use chrono::NaiveDate;
use common::models::{
    ActivityType, HoursAmount, Modality, NewActivity, NewHourRecord, NewUser, Role, Sex,
    UpdateActivity, UpdateUser, user::meets_minimum_age,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::actions::users::UNDERAGE_MESSAGE;

pub const PASSWORD_MIN: usize = 8;
pub const MAX_HOURS_PER_RECORD: f64 = 24.0;
pub const MAX_DESCRIPTION_CHARS: usize = 500;
pub const MIN_ACTIVITY_HOURS: f64 = 0.25;

/// Read any JSON scalar as text; `null` and missing fields become empty
fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

/// Record a failed parse under `name`
fn field<T>(errors: &mut FieldErrors, name: &str, outcome: Result<T, String>) -> Option<T> {
    match outcome {
        Ok(value) => Some(value),
        Err(message) => {
            errors.add(name, message);
            None
        }
    }
}

/// Like [`field`], but a blank input is simply absent
fn present<T>(
    errors: &mut FieldErrors,
    name: &str,
    raw: &str,
    parse: impl FnOnce(&str) -> Result<T, String>,
) -> Option<T> {
    if raw.trim().is_empty() {
        None
    } else {
        field(errors, name, parse(raw))
    }
}

fn optional(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// `YYYY-MM-DD`, or the date part of an ISO timestamp
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

fn parse_hours(raw: &str, invalid: &str) -> Result<HoursAmount, String> {
    HoursAmount::parse(raw)
        .filter(|h| h.value() >= 0.0)
        .ok_or_else(|| invalid.to_string())
}

/// Admin form creating a user
#[derive(Clone, Default, Deserialize)]
pub struct CreateUserForm {
    #[serde(default, deserialize_with = "text")]
    pub username: String,
    #[serde(default, deserialize_with = "text")]
    pub email: String,
    #[serde(default, deserialize_with = "text")]
    pub password: String,
    #[serde(default, deserialize_with = "text")]
    pub rol: String,
    #[serde(default, deserialize_with = "text")]
    pub first_name: String,
    #[serde(default, deserialize_with = "text")]
    pub last_name: String,
    #[serde(default, deserialize_with = "text")]
    pub sexo: String,
    #[serde(default, deserialize_with = "text")]
    pub fecha_nacimiento: String,
    #[serde(default, deserialize_with = "text")]
    pub carrera: String,
    #[serde(default, deserialize_with = "text")]
    pub universidad: String,
    #[serde(default, deserialize_with = "text")]
    pub semestre: String,
}

impl CreateUserForm {
    pub fn validate(&self, today: NaiveDate) -> Result<NewUser, FieldErrors> {
        let mut errors = FieldErrors::default();

        errors.check(
            "username",
            validate_min_chars(&self.username, 4, "Ingresa al menos 4 caracteres"),
        );
        errors.check(
            "email",
            validate_email(&self.email).map_err(|_| "Ingresa un correo valido".to_string()),
        );
        if self.password.chars().count() < PASSWORD_MIN {
            errors.add("password", "La contrasena debe tener 8 caracteres");
        }
        let rol = field(
            &mut errors,
            "rol",
            Role::parse(self.rol.trim()).ok_or_else(|| "Selecciona un rol valido".to_string()),
        );
        errors.check(
            "first_name",
            validate_min_chars(&self.first_name, 2, "Ingresa al menos 2 caracteres"),
        );
        errors.check(
            "last_name",
            validate_min_chars(&self.last_name, 2, "Ingresa al menos 2 caracteres"),
        );
        let sexo = field(
            &mut errors,
            "sexo",
            Sex::parse(self.sexo.trim()).ok_or_else(|| "Selecciona el sexo".to_string()),
        );
        let birth_date = field(
            &mut errors,
            "fecha_nacimiento",
            validate_birth_date(&self.fecha_nacimiento, today),
        );
        errors.check(
            "carrera",
            validate_min_chars(&self.carrera, 2, "Ingresa el nombre de la carrera"),
        );
        errors.check(
            "universidad",
            validate_min_chars(&self.universidad, 2, "Ingresa el nombre de la universidad"),
        );
        errors.check(
            "semestre",
            validate_min_chars(&self.semestre, 1, "Ingresa el semestre actual"),
        );

        match (rol, sexo, birth_date) {
            (Some(rol), Some(sexo), Some(fecha_nacimiento)) if errors.is_empty() => Ok(NewUser {
                username: self.username.trim().to_string(),
                email: self.email.trim().to_string(),
                password: self.password.clone(),
                first_name: self.first_name.trim().to_string(),
                last_name: self.last_name.trim().to_string(),
                rol,
                sexo,
                fecha_nacimiento,
                carrera: self.carrera.trim().to_string(),
                universidad: self.universidad.trim().to_string(),
                semestre: self.semestre.trim().to_string(),
            }),
            _ => Err(errors),
        }
    }
}

/// Birth date between 1900-01-01 and the age cutoff
pub fn validate_birth_date(raw: &str, today: NaiveDate) -> Result<NaiveDate, String> {
    let earliest = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN);
    let date = parse_date(raw)
        .filter(|d| *d >= earliest)
        .ok_or_else(|| "Selecciona la fecha de nacimiento".to_string())?;

    if !meets_minimum_age(date, today) {
        return Err(UNDERAGE_MESSAGE.to_string());
    }
    Ok(date)
}

/// Profile edit form, used by administrators and by users on themselves
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileForm {
    #[serde(default, deserialize_with = "text")]
    pub username: String,
    #[serde(default, deserialize_with = "text")]
    pub email: String,
    #[serde(default, deserialize_with = "text")]
    pub carrera: String,
    #[serde(default, deserialize_with = "text")]
    pub universidad: String,
    #[serde(default, deserialize_with = "text")]
    pub semestre: String,
    #[serde(default, deserialize_with = "text")]
    pub meta_horas_voluntariado_interno: String,
    #[serde(default, deserialize_with = "text")]
    pub meta_horas_voluntariado_externo: String,
    #[serde(default, deserialize_with = "text")]
    pub meta_horas_chat_ingles: String,
    #[serde(default, deserialize_with = "text")]
    pub meta_horas_talleres: String,
}

impl ProfileForm {
    pub fn validate(&self) -> Result<UpdateUser, FieldErrors> {
        let mut errors = FieldErrors::default();

        errors.check(
            "username",
            validate_min_chars(&self.username, 1, "Usuario es requerido"),
        );
        errors.check(
            "email",
            validate_email(&self.email).map_err(|_| "Email inválido".to_string()),
        );
        errors.check(
            "carrera",
            validate_min_chars(&self.carrera, 1, "Carrera es requerida"),
        );
        errors.check(
            "universidad",
            validate_min_chars(&self.universidad, 1, "Universidad es requerida"),
        );
        errors.check(
            "semestre",
            validate_min_chars(&self.semestre, 1, "Semestre es requerido"),
        );

        let mut goal = |name: &str, raw: &str, required: &str| {
            let outcome = if raw.trim().is_empty() {
                Err(required.to_string())
            } else {
                parse_hours(raw, "Ingresa un número válido")
            };
            field(&mut errors, name, outcome)
        };
        let interno = goal(
            "meta_horas_voluntariado_interno",
            &self.meta_horas_voluntariado_interno,
            "Meta voluntariado interno es requerida",
        );
        let externo = goal(
            "meta_horas_voluntariado_externo",
            &self.meta_horas_voluntariado_externo,
            "Meta voluntariado externo es requerida",
        );
        let chat = goal(
            "meta_horas_chat_ingles",
            &self.meta_horas_chat_ingles,
            "Meta chat inglés es requerida",
        );
        let talleres = goal(
            "meta_horas_talleres",
            &self.meta_horas_talleres,
            "Meta talleres es requerida",
        );

        errors.into_result()?;
        Ok(UpdateUser {
            username: Some(self.username.trim().to_string()),
            email: Some(self.email.trim().to_string()),
            carrera: Some(self.carrera.trim().to_string()),
            universidad: Some(self.universidad.trim().to_string()),
            semestre: Some(self.semestre.trim().to_string()),
            meta_horas_voluntariado_interno: interno,
            meta_horas_voluntariado_externo: externo,
            meta_horas_chat_ingles: chat,
            meta_horas_talleres: talleres,
            ..Default::default()
        })
    }
}

/// Activity create and edit form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityForm {
    #[serde(default, deserialize_with = "text")]
    pub titulo: String,
    #[serde(default, deserialize_with = "text")]
    pub descripcion: String,
    #[serde(default, deserialize_with = "text")]
    pub tipo: String,
    #[serde(default, deserialize_with = "text")]
    pub fecha: String,
    #[serde(default, deserialize_with = "text")]
    pub duracion_horas: String,
    #[serde(default, deserialize_with = "text")]
    pub competencia_desarrollada: String,
    #[serde(default, deserialize_with = "text")]
    pub modalidad: String,
    #[serde(default, deserialize_with = "text")]
    pub organizacion: String,
    #[serde(default, deserialize_with = "text")]
    pub facilitador: String,
    #[serde(default)]
    pub en_catalogo: Option<bool>,
    #[serde(default)]
    pub becarios_asignados: Option<Vec<i64>>,
}

fn parse_titulo(raw: &str) -> Result<String, String> {
    let titulo = raw.trim();
    if titulo.is_empty() {
        return Err("El título es requerido".to_string());
    }
    validate_min_chars(titulo, 3, "Mínimo 3 caracteres")?;
    Ok(titulo.to_string())
}

fn parse_tipo(raw: &str) -> Result<ActivityType, String> {
    ActivityType::parse(raw.trim()).ok_or_else(|| "Selecciona un tipo válido".to_string())
}

fn parse_fecha(raw: &str) -> Result<NaiveDate, String> {
    if raw.trim().is_empty() {
        return Err("Fecha es requerida".to_string());
    }
    parse_date(raw).ok_or_else(|| "Fecha inválida".to_string())
}

fn parse_duracion(raw: &str) -> Result<HoursAmount, String> {
    let hours = parse_hours(raw, "Duración inválida")?;
    if hours.value() < MIN_ACTIVITY_HOURS {
        return Err("Duración mínima 0.25 horas".to_string());
    }
    Ok(hours)
}

fn parse_modalidad(raw: &str) -> Result<Modality, String> {
    Modality::parse(raw.trim()).ok_or_else(|| "Selecciona modalidad".to_string())
}

impl ActivityForm {
    /// Validate a new activity; every required field must be present
    pub fn validate_new(&self) -> Result<NewActivity, FieldErrors> {
        let mut errors = FieldErrors::default();

        let titulo = field(&mut errors, "titulo", parse_titulo(&self.titulo));
        let tipo = field(&mut errors, "tipo", parse_tipo(&self.tipo));
        let fecha = field(&mut errors, "fecha", parse_fecha(&self.fecha));
        let duracion = field(&mut errors, "duracion_horas", parse_duracion(&self.duracion_horas));
        let modalidad = field(&mut errors, "modalidad", parse_modalidad(&self.modalidad));
        let en_catalogo = field(
            &mut errors,
            "en_catalogo",
            self.en_catalogo
                .ok_or_else(|| "Indica si la actividad está en el catálogo".to_string()),
        );

        match (titulo, tipo, fecha, duracion, modalidad, en_catalogo) {
            (
                Some(titulo),
                Some(tipo),
                Some(fecha),
                Some(duracion_horas),
                Some(modalidad),
                Some(en_catalogo),
            ) => Ok(NewActivity {
                titulo,
                descripcion: optional(&self.descripcion),
                tipo,
                fecha,
                duracion_horas,
                competencia_desarrollada: optional(&self.competencia_desarrollada),
                modalidad,
                organizacion: optional(&self.organizacion),
                facilitador: optional(&self.facilitador),
                en_catalogo,
                becarios_asignados: self.becarios_asignados.clone().unwrap_or_default(),
            }),
            _ => Err(errors),
        }
    }

    /// Validate an edit; blank fields are left unchanged
    pub fn validate_patch(&self) -> Result<UpdateActivity, FieldErrors> {
        let mut errors = FieldErrors::default();

        let titulo = present(&mut errors, "titulo", &self.titulo, parse_titulo);
        let tipo = present(&mut errors, "tipo", &self.tipo, parse_tipo);
        let fecha = present(&mut errors, "fecha", &self.fecha, parse_fecha);
        let duracion_horas = present(&mut errors, "duracion_horas", &self.duracion_horas, parse_duracion);
        let modalidad = present(&mut errors, "modalidad", &self.modalidad, parse_modalidad);

        errors.into_result()?;
        Ok(UpdateActivity {
            titulo,
            descripcion: optional(&self.descripcion),
            tipo,
            fecha,
            duracion_horas,
            competencia_desarrollada: optional(&self.competencia_desarrollada),
            modalidad,
            organizacion: optional(&self.organizacion),
            facilitador: optional(&self.facilitador),
            en_catalogo: self.en_catalogo,
            becarios_asignados: self.becarios_asignados.clone(),
        })
    }
}

/// Hours logged by an intern against an activity
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogHoursForm {
    #[serde(default, deserialize_with = "text")]
    pub actividad: String,
    #[serde(default, deserialize_with = "text")]
    pub horas_reportadas: String,
    #[serde(default, deserialize_with = "text")]
    pub descripcion_manual: String,
}

impl LogHoursForm {
    pub fn validate(&self) -> Result<NewHourRecord, FieldErrors> {
        let mut errors = FieldErrors::default();

        let actividad = field(
            &mut errors,
            "actividad",
            self.actividad
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|id| *id > 0)
                .ok_or_else(|| "Selecciona una actividad".to_string()),
        );
        let horas = field(
            &mut errors,
            "horas_reportadas",
            HoursAmount::parse(&self.horas_reportadas)
                .ok_or_else(|| "Ingresa un número válido".to_string())
                .and_then(|h| match h.value() {
                    v if v <= 0.0 => Err("Las horas deben ser mayores a 0".to_string()),
                    v if v > MAX_HOURS_PER_RECORD => Err("Máximo 24 horas por registro".to_string()),
                    _ => Ok(h),
                }),
        );
        let descripcion = self.descripcion_manual.trim();
        if descripcion.chars().count() > MAX_DESCRIPTION_CHARS {
            errors.add("descripcion_manual", "Máximo 500 caracteres");
        }

        match (actividad, horas) {
            (Some(actividad), Some(horas_reportadas)) if errors.is_empty() => Ok(NewHourRecord {
                actividad,
                descripcion_manual: descripcion.to_string(),
                horas_reportadas,
            }),
            _ => Err(errors),
        }
    }
}

/// First login: new password and security question
///
/// Forwarded as is to the backend once valid.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct InitialSetupForm {
    #[serde(default, deserialize_with = "text")]
    pub nueva_password: String,
    #[serde(default, deserialize_with = "text")]
    pub confirmar_password: String,
    #[serde(default, deserialize_with = "text")]
    pub pregunta_seguridad: String,
    #[serde(default, deserialize_with = "text")]
    pub respuesta_seguridad: String,
}

impl InitialSetupForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();

        if self.nueva_password.chars().count() < PASSWORD_MIN {
            errors.add("nueva_password", "La contraseña debe tener al menos 8 caracteres");
        }
        if self.confirmar_password != self.nueva_password {
            errors.add("confirmar_password", "Las contraseñas no coinciden");
        }
        errors.check(
            "pregunta_seguridad",
            validate_min_chars(
                &self.pregunta_seguridad,
                10,
                "La pregunta debe tener al menos 10 caracteres",
            ),
        );
        errors.check(
            "respuesta_seguridad",
            validate_min_chars(
                &self.respuesta_seguridad,
                3,
                "La respuesta debe tener al menos 3 caracteres",
            ),
        );

        errors.into_result()
    }
}

/// Password recovery, step one
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityQuestionForm {
    #[serde(default, deserialize_with = "text")]
    pub email: String,
}

impl SecurityQuestionForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.check("email", validate_email(&self.email));
        errors.into_result()
    }
}

/// Password recovery, step two
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ResetPasswordForm {
    #[serde(default, deserialize_with = "text")]
    pub email: String,
    #[serde(default, alias = "respuesta", deserialize_with = "text")]
    pub respuesta_seguridad: String,
    #[serde(default, deserialize_with = "text")]
    pub nueva_password: String,
}

impl ResetPasswordForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.check("email", validate_email(&self.email));
        errors.check(
            "respuesta_seguridad",
            validate_min_chars(&self.respuesta_seguridad, 1, "La respuesta es requerida"),
        );
        if self.nueva_password.chars().count() < PASSWORD_MIN {
            errors.add("nueva_password", "La contraseña debe tener al menos 8 caracteres");
        }
        errors.into_result()
    }
}
