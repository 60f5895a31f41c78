//! Data transfer objects mirrored from the backend API
//!
//! The portal holds no authoritative state; these types only live for the
//! duration of a request.

pub mod activity;
pub mod hour_record;
pub mod hours;
pub mod timestamp;
pub mod user;

// Re-export for convenience
pub use activity::{Activity, ActivityType, AssignedIntern, Modality, NewActivity, UpdateActivity};
pub use hour_record::{
    ApprovalState, Decision, DecisionRequest, HourRecord, NewHourRecord, TransitionError,
};
pub use hours::HoursAmount;
pub use user::{HourGoals, NewUser, Role, Sex, UpdateUser, User};
