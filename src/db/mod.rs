pub mod postgres;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::models::{
    activity::{Activity, ActivityQuery, NewActivity},
    child::{Child, CreateChildRequest},
    completion::{Completion, CompletionSummary, NewCompletion},
};

pub use postgres::PgStore;

pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Run the migrations embedded in ./migrations/
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Every query the services issue. `PgStore` is the production implementation.
#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> anyhow::Result<()>;

    /// Newest first.
    async fn list_activities(&self, query: &ActivityQuery) -> anyhow::Result<Vec<Activity>>;

    async fn get_activity(&self, id: i64) -> anyhow::Result<Option<Activity>>;

    /// Inserts all rows or none.
    async fn insert_activities(&self, activities: &[NewActivity]) -> anyhow::Result<Vec<Activity>>;

    async fn create_child(&self, req: &CreateChildRequest) -> anyhow::Result<Child>;

    async fn get_child(&self, id: i64) -> anyhow::Result<Option<Child>>;

    /// Newest first, joined with the activity title.
    async fn list_completions(&self, child_id: i64) -> anyhow::Result<Vec<CompletionSummary>>;

    async fn find_completion(
        &self,
        child_id: i64,
        activity_id: i64,
        photo_sha256: &str,
    ) -> anyhow::Result<Option<Completion>>;

    /// Inserts the completion and credits `tokens_awarded` to the child atomically.
    /// Returns `None` without touching the balance when the same photo was already
    /// recorded for this child and activity.
    async fn record_completion(&self, completion: &NewCompletion) -> anyhow::Result<Option<Completion>>;
}
