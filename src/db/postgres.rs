use async_trait::async_trait;
use sqlx::PgPool;

use super::Store;
use crate::models::{
    activity::{Activity, ActivityQuery, NewActivity},
    child::{Child, CreateChildRequest},
    completion::{Completion, CompletionSummary, NewCompletion},
};

const ACTIVITY_COLS: &str = "id, title, description, category, age_min, age_max, location,
     tokens_reward, validation_criteria, created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_activities(&self, query: &ActivityQuery) -> anyhow::Result<Vec<Activity>> {
        let location_pattern = query
            .location
            .as_deref()
            .map(|loc| format!("%{}%", escape_like(loc)));

        let activities = sqlx::query_as::<_, Activity>(&format!(
            "SELECT {ACTIVITY_COLS} FROM activities
             WHERE ($1::text IS NULL OR category = $1)
               AND ($2::int IS NULL OR age_max >= $2)
               AND ($3::int IS NULL OR age_min <= $3)
               AND ($4::text IS NULL OR location ILIKE $4)
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(query.category.map(|c| c.as_str()))
        .bind(query.age_min)
        .bind(query.age_max)
        .bind(location_pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(activities)
    }

    async fn get_activity(&self, id: i64) -> anyhow::Result<Option<Activity>> {
        let activity = sqlx::query_as::<_, Activity>(&format!(
            "SELECT {ACTIVITY_COLS} FROM activities WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(activity)
    }

    async fn insert_activities(&self, activities: &[NewActivity]) -> anyhow::Result<Vec<Activity>> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = Vec::with_capacity(activities.len());

        for a in activities {
            let row = sqlx::query_as::<_, Activity>(&format!(
                "INSERT INTO activities
                 (title, description, category, age_min, age_max, location, tokens_reward, validation_criteria)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                 RETURNING {ACTIVITY_COLS}"
            ))
            .bind(&a.title)
            .bind(&a.description)
            .bind(a.category.as_str())
            .bind(a.age_min)
            .bind(a.age_max)
            .bind(&a.location)
            .bind(a.tokens_reward)
            .bind(&a.validation_criteria)
            .fetch_one(&mut *tx)
            .await?;
            inserted.push(row);
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn create_child(&self, req: &CreateChildRequest) -> anyhow::Result<Child> {
        let child = sqlx::query_as::<_, Child>(
            "INSERT INTO children (name, age, token_balance)
             VALUES ($1, $2, 0)
             RETURNING id, name, age, token_balance, created_at",
        )
        .bind(req.name.trim())
        .bind(req.age)
        .fetch_one(&self.pool)
        .await?;
        Ok(child)
    }

    async fn get_child(&self, id: i64) -> anyhow::Result<Option<Child>> {
        let child = sqlx::query_as::<_, Child>(
            "SELECT id, name, age, token_balance, created_at FROM children WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(child)
    }

    async fn list_completions(&self, child_id: i64) -> anyhow::Result<Vec<CompletionSummary>> {
        let rows = sqlx::query_as::<_, CompletionSummary>(
            "SELECT c.id, c.activity_id, a.title AS activity_title, c.completed_at,
                    c.tokens_awarded, c.validated
             FROM activity_completions c
             JOIN activities a ON a.id = c.activity_id
             WHERE c.child_id = $1
             ORDER BY c.completed_at DESC, c.id DESC",
        )
        .bind(child_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_completion(
        &self,
        child_id: i64,
        activity_id: i64,
        photo_sha256: &str,
    ) -> anyhow::Result<Option<Completion>> {
        let completion = sqlx::query_as::<_, Completion>(
            "SELECT * FROM activity_completions
             WHERE child_id = $1 AND activity_id = $2 AND photo_sha256 = $3",
        )
        .bind(child_id)
        .bind(activity_id)
        .bind(photo_sha256)
        .fetch_optional(&self.pool)
        .await?;
        Ok(completion)
    }

    async fn record_completion(&self, new: &NewCompletion) -> anyhow::Result<Option<Completion>> {
        let mut tx = self.pool.begin().await?;

        // The unique key on (child_id, activity_id, photo_sha256) makes a
        // concurrent resubmission of the same photo a no-op.
        let completion = sqlx::query_as::<_, Completion>(
            "INSERT INTO activity_completions
             (child_id, activity_id, photo_path, photo_sha256, validated, validation_reasoning, tokens_awarded)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (child_id, activity_id, photo_sha256) DO NOTHING
             RETURNING *",
        )
        .bind(new.child_id)
        .bind(new.activity_id)
        .bind(&new.photo_path)
        .bind(&new.photo_sha256)
        .bind(new.validated)
        .bind(&new.validation_reasoning)
        .bind(new.tokens_awarded)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(completion) = completion else {
            tx.rollback().await?;
            return Ok(None);
        };

        if completion.tokens_awarded > 0 {
            sqlx::query("UPDATE children SET token_balance = token_balance + $1 WHERE id = $2")
                .bind(completion.tokens_awarded)
                .bind(completion.child_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(Some(completion))
    }
}

/// Escape LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
