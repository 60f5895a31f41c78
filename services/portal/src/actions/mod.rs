//! Domain server actions
//!
//! One set of actions per backend resource. Every action takes the caller's
//! session, goes through the authenticated [`BackendClient`] and returns a
//! typed result; handlers decide how a failure is shown.

pub mod accounts;
pub mod activities;
pub mod records;
pub mod users;

use common::BackendClient;
use serde::{Deserialize, de::DeserializeOwned};

use crate::error::ActionError;

pub use accounts::AccountActions;
pub use activities::ActivityActions;
pub use records::HourRecordActions;
pub use users::UserActions;

/// Type alias for Result with ActionError
pub type ActionResult<T> = Result<T, ActionError>;

/// List payloads come back as a bare array, or wrapped when paginated
#[derive(Deserialize)]
#[serde(untagged)]
enum ListPayload<T> {
    Plain(Vec<T>),
    Wrapped {
        #[serde(alias = "data")]
        results: Vec<T>,
    },
}

impl<T> From<ListPayload<T>> for Vec<T> {
    fn from(payload: ListPayload<T>) -> Vec<T> {
        match payload {
            ListPayload::Plain(items) | ListPayload::Wrapped { results: items } => items,
        }
    }
}

/// GET a collection, whichever list shape the backend uses
async fn fetch_list<T: DeserializeOwned>(
    backend: &BackendClient,
    path: &str,
    token: &str,
) -> ActionResult<Vec<T>> {
    let payload: ListPayload<T> = backend.get(path, token).await?;
    Ok(payload.into())
}

/// Path of a single resource under a collection path
fn item_path(collection: &str, id: i64) -> String {
    format!("{}{}/", collection, id)
}
