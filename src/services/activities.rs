use tracing::info;

use crate::{
    db::Store,
    error::AppError,
    models::activity::{
        Activity, ActivityQuery, CreateActivityRequest, GenerateActivitiesRequest, NewActivity,
    },
    services::{
        ai::{AiError, AiService},
        metrics,
    },
};

pub struct ActivityService;

impl ActivityService {
    pub async fn list(store: &dyn Store, query: &ActivityQuery) -> Result<Vec<Activity>, AppError> {
        Ok(store.list_activities(query).await?)
    }

    pub async fn create(store: &dyn Store, req: CreateActivityRequest) -> Result<Activity, AppError> {
        req.validate()?;
        let mut inserted = store.insert_activities(&[req.into_new_activity()]).await?;
        inserted
            .pop()
            .ok_or_else(|| anyhow::anyhow!("insert returned no activity").into())
    }

    /// Ask the text model for `req.count` activities and persist all of them.
    /// A single unparseable response aborts the batch before anything is stored.
    pub async fn generate(
        store: &dyn Store,
        ai: Option<&AiService>,
        req: &GenerateActivitiesRequest,
    ) -> Result<Vec<Activity>, AppError> {
        req.validate()?;
        let ai = ai.ok_or(AiError::NotConfigured)?;

        let generated = ai.generate_activities(req).await?;
        let rows: Vec<NewActivity> = generated
            .into_iter()
            .map(|item| item.into_new_activity(req))
            .collect();
        let activities = store.insert_activities(&rows).await?;

        metrics::GENERATED_ACTIVITIES_COUNTER
            .with_label_values(&[req.category.as_str()])
            .inc_by(activities.len() as f64);
        info!(
            category = %req.category,
            requested = req.count,
            generated = activities.len(),
            "Generated activities"
        );
        Ok(activities)
    }
}
