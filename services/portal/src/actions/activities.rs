//! Activity actions

use auth::Session;
use common::{
    BackendClient,
    models::{Activity, NewActivity, UpdateActivity},
};
use tracing::info;

use super::{ActionResult, fetch_list, item_path};

pub const ACTIVITIES_PATH: &str = "/api/activities/actividades/";
pub const CATALOG_PATH: &str = "/api/activities/actividades/catalogo/";

/// Actions on `/api/activities/actividades/`
#[derive(Debug, Clone)]
pub struct ActivityActions {
    backend: BackendClient,
}

impl ActivityActions {
    pub fn new(backend: BackendClient) -> Self {
        ActivityActions { backend }
    }

    /// Every activity visible to the caller
    pub async fn list_activities(&self, session: &Session) -> ActionResult<Vec<Activity>> {
        info!("Listing activities for user {}", session.user_id());
        fetch_list(&self.backend, ACTIVITIES_PATH, session.token()).await
    }

    /// Activities published in the catalog
    pub async fn list_catalog(&self, session: &Session) -> ActionResult<Vec<Activity>> {
        info!("Listing catalog for user {}", session.user_id());
        fetch_list(&self.backend, CATALOG_PATH, session.token()).await
    }

    pub async fn get_activity(&self, session: &Session, id: i64) -> ActionResult<Activity> {
        info!("Fetching activity {}", id);
        Ok(self.backend.get(&item_path(ACTIVITIES_PATH, id), session.token()).await?)
    }

    pub async fn create_activity(&self, session: &Session, activity: &NewActivity) -> ActionResult<Activity> {
        info!("Creating activity '{}'", activity.titulo);
        Ok(self
            .backend
            .post(ACTIVITIES_PATH, Some(session.token()), activity)
            .await?)
    }

    /// PATCH an activity, assigned interns included
    pub async fn update_activity(
        &self,
        session: &Session,
        id: i64,
        patch: &UpdateActivity,
    ) -> ActionResult<Activity> {
        info!("Updating activity {}", id);
        Ok(self
            .backend
            .patch(&item_path(ACTIVITIES_PATH, id), session.token(), patch)
            .await?)
    }

    pub async fn delete_activity(&self, session: &Session, id: i64) -> ActionResult<()> {
        info!("Deleting activity {}", id);
        Ok(self
            .backend
            .delete(&item_path(ACTIVITIES_PATH, id), session.token())
            .await?)
    }
}
