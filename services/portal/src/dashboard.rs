//! Dashboard view-models
//!
//! Aggregations behind the admin and intern overview pages. Both are pure
//! functions of data already fetched from the backend.

use chrono::Datelike;
use common::models::{Activity, ActivityType, ApprovalState, HourGoals, HourRecord, HoursAmount, User};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Short Spanish month names, January first
const SHORT_MONTHS: [&str; 12] = [
    "ene", "feb", "mar", "abr", "may", "jun", "jul", "ago", "sept", "oct", "nov", "dic",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub users: usize,
    pub pending_entries: usize,
    pub pending_hours: f64,
    pub distinct_types: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SexSlice {
    pub name: &'static str,
    pub value: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthHours {
    /// `YYYY-MM`
    pub key: String,
    pub month: &'static str,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub count: usize,
}

/// `GET /dashboard/admin/overview`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOverview {
    pub kpis: Kpis,
    pub sexo: Vec<SexSlice>,
    pub hours_per_month: Vec<MonthHours>,
    pub activities_by_type: Vec<TypeCount>,
}

impl AdminOverview {
    pub fn build(users: &[User], pending: &[HourRecord], activities: &[Activity]) -> Self {
        let pending_hours: HoursAmount = pending.iter().map(|r| r.horas_reportadas).sum();

        let mut sexo: Vec<SexSlice> = Vec::new();
        for user in users {
            let name = user.sexo.label();
            match sexo.iter_mut().find(|slice| slice.name == name) {
                Some(slice) => slice.value += 1,
                None => sexo.push(SexSlice { name, value: 1 }),
            }
        }

        let mut months: BTreeMap<(i32, u32), f64> = BTreeMap::new();
        for record in pending {
            if let Some(at) = record.fecha_registro {
                *months.entry((at.year(), at.month())).or_default() += record.horas_reportadas.value();
            }
        }
        let hours_per_month = months
            .into_iter()
            .map(|((year, month), hours)| MonthHours {
                key: format!("{:04}-{:02}", year, month),
                month: SHORT_MONTHS[(month as usize).saturating_sub(1) % 12],
                hours,
            })
            .collect();

        let mut activities_by_type: Vec<TypeCount> = Vec::new();
        for activity in activities {
            let kind = activity.tipo.as_str();
            match activities_by_type.iter_mut().find(|t| t.kind == kind) {
                Some(entry) => entry.count += 1,
                None => activities_by_type.push(TypeCount { kind, count: 1 }),
            }
        }

        AdminOverview {
            kpis: Kpis {
                users: users.len(),
                pending_entries: pending.len(),
                pending_hours: pending_hours.value(),
                distinct_types: activities_by_type.len(),
            },
            sexo,
            hours_per_month,
            activities_by_type,
        }
    }
}

/// Hour goal a record type counts towards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GoalCategory {
    VoluntariadoInterno,
    VoluntariadoExterno,
    ChatIngles,
    Talleres,
}

impl GoalCategory {
    pub const ALL: [GoalCategory; 4] = [
        GoalCategory::VoluntariadoInterno,
        GoalCategory::VoluntariadoExterno,
        GoalCategory::ChatIngles,
        GoalCategory::Talleres,
    ];

    pub fn of(kind: ActivityType) -> Option<Self> {
        match kind {
            ActivityType::Interna => Some(GoalCategory::VoluntariadoInterno),
            ActivityType::Externa => Some(GoalCategory::VoluntariadoExterno),
            ActivityType::Chat => Some(GoalCategory::ChatIngles),
            ActivityType::Taller => Some(GoalCategory::Talleres),
            ActivityType::Otro => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            GoalCategory::VoluntariadoInterno => "voluntariado_interno",
            GoalCategory::VoluntariadoExterno => "voluntariado_externo",
            GoalCategory::ChatIngles => "chat_ingles",
            GoalCategory::Talleres => "talleres",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GoalCategory::VoluntariadoInterno => "Voluntariado interno",
            GoalCategory::VoluntariadoExterno => "Voluntariado externo",
            GoalCategory::ChatIngles => "Chat de inglés",
            GoalCategory::Talleres => "Talleres",
        }
    }

    fn goal(&self, goals: &HourGoals) -> HoursAmount {
        match self {
            GoalCategory::VoluntariadoInterno => goals.voluntariado_interno,
            GoalCategory::VoluntariadoExterno => goals.voluntariado_externo,
            GoalCategory::ChatIngles => goals.chat_ingles,
            GoalCategory::Talleres => goals.talleres,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProgress {
    pub category: &'static str,
    pub label: &'static str,
    pub goal: f64,
    pub achieved: f64,
    pub remaining: f64,
    /// Capped at 100
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateCount {
    pub estado: &'static str,
    pub label: &'static str,
    pub count: usize,
}

/// `GET /dashboard/interns/overview`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternOverview {
    pub profile: User,
    pub assigned_activities: usize,
    pub records_by_state: Vec<StateCount>,
    pub approved_hours: f64,
    pub goals: Vec<GoalProgress>,
}

impl InternOverview {
    pub fn build(profile: User, activities: &[Activity], records: &[HourRecord]) -> Self {
        let own: Vec<&HourRecord> = records.iter().filter(|r| r.becario == profile.id).collect();
        let kinds: HashMap<i64, ActivityType> = activities.iter().map(|a| (a.id, a.tipo)).collect();

        let records_by_state = [
            ApprovalState::Pending,
            ApprovalState::Approved,
            ApprovalState::Rejected,
        ]
        .into_iter()
        .map(|state| StateCount {
            estado: state.code(),
            label: state.label(),
            count: own.iter().filter(|r| r.estado_aprobacion == state).count(),
        })
        .collect();

        let mut achieved: HashMap<GoalCategory, f64> = HashMap::new();
        let mut approved_hours = 0.0;
        for record in own.iter().filter(|r| r.estado_aprobacion == ApprovalState::Approved) {
            approved_hours += record.horas_reportadas.value();
            let kind = record
                .actividad_detalle
                .as_ref()
                .map(|a| a.tipo)
                .or_else(|| kinds.get(&record.actividad).copied());
            if let Some(category) = kind.and_then(GoalCategory::of) {
                *achieved.entry(category).or_default() += record.horas_reportadas.value();
            }
        }

        let goals = profile.goals();
        let goals = GoalCategory::ALL
            .into_iter()
            .map(|category| {
                let goal = category.goal(&goals).value();
                let done = achieved.get(&category).copied().unwrap_or_default();
                let percentage = if goal > 0.0 {
                    (done / goal * 100.0).min(100.0)
                } else {
                    0.0
                };
                GoalProgress {
                    category: category.key(),
                    label: category.label(),
                    goal,
                    achieved: done,
                    remaining: (goal - done).max(0.0),
                    percentage,
                }
            })
            .collect();

        InternOverview {
            assigned_activities: activities.iter().filter(|a| a.is_assigned_to(profile.id)).count(),
            profile,
            records_by_state,
            approved_hours,
            goals,
        }
    }
}
