use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use super::Store;
use crate::models::{
    activity::{Activity, ActivityQuery, NewActivity},
    child::{Child, CreateChildRequest},
    completion::{Completion, CompletionSummary, NewCompletion},
};

#[derive(Default)]
struct Tables {
    activities: Vec<Activity>,
    children: Vec<Child>,
    completions: Vec<Completion>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// `Store` backed by vectors behind a mutex, for tests.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn completions(&self) -> Vec<Completion> {
        self.tables.lock().unwrap().completions.clone()
    }

    pub fn balance(&self, child_id: i64) -> Option<i32> {
        let tables = self.tables.lock().unwrap();
        tables
            .children
            .iter()
            .find(|c| c.id == child_id)
            .map(|c| c.token_balance)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn list_activities(&self, query: &ActivityQuery) -> anyhow::Result<Vec<Activity>> {
        let tables = self.tables.lock().unwrap();
        let mut out: Vec<Activity> = tables
            .activities
            .iter()
            .filter(|a| query.matches(a))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(out)
    }

    async fn get_activity(&self, id: i64) -> anyhow::Result<Option<Activity>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.activities.iter().find(|a| a.id == id).cloned())
    }

    async fn insert_activities(&self, activities: &[NewActivity]) -> anyhow::Result<Vec<Activity>> {
        let mut tables = self.tables.lock().unwrap();
        let mut inserted = Vec::with_capacity(activities.len());
        for a in activities {
            let id = tables.next_id();
            let activity = Activity {
                id,
                title: a.title.clone(),
                description: a.description.clone(),
                category: a.category,
                age_min: a.age_min,
                age_max: a.age_max,
                location: a.location.clone(),
                tokens_reward: a.tokens_reward,
                validation_criteria: a.validation_criteria.clone(),
                // Strictly increasing so newest-first ordering is observable.
                created_at: Utc::now() + Duration::milliseconds(id),
            };
            tables.activities.push(activity.clone());
            inserted.push(activity);
        }
        Ok(inserted)
    }

    async fn create_child(&self, req: &CreateChildRequest) -> anyhow::Result<Child> {
        let mut tables = self.tables.lock().unwrap();
        let child = Child {
            id: tables.next_id(),
            name: req.name.trim().to_string(),
            age: req.age,
            token_balance: 0,
            created_at: Utc::now(),
        };
        tables.children.push(child.clone());
        Ok(child)
    }

    async fn get_child(&self, id: i64) -> anyhow::Result<Option<Child>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.children.iter().find(|c| c.id == id).cloned())
    }

    async fn list_completions(&self, child_id: i64) -> anyhow::Result<Vec<CompletionSummary>> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<CompletionSummary> = tables
            .completions
            .iter()
            .filter(|c| c.child_id == child_id)
            .filter_map(|c| {
                let activity = tables.activities.iter().find(|a| a.id == c.activity_id)?;
                Some(CompletionSummary {
                    id: c.id,
                    activity_id: c.activity_id,
                    activity_title: activity.title.clone(),
                    completed_at: c.completed_at,
                    tokens_awarded: c.tokens_awarded,
                    validated: c.validated,
                })
            })
            .collect();
        rows.sort_by(|a, b| b.completed_at.cmp(&a.completed_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn find_completion(
        &self,
        child_id: i64,
        activity_id: i64,
        photo_sha256: &str,
    ) -> anyhow::Result<Option<Completion>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .completions
            .iter()
            .find(|c| {
                c.child_id == child_id
                    && c.activity_id == activity_id
                    && c.photo_sha256 == photo_sha256
            })
            .cloned())
    }

    async fn record_completion(&self, new: &NewCompletion) -> anyhow::Result<Option<Completion>> {
        let mut tables = self.tables.lock().unwrap();
        let duplicate = tables.completions.iter().any(|c| {
            c.child_id == new.child_id
                && c.activity_id == new.activity_id
                && c.photo_sha256 == new.photo_sha256
        });
        if duplicate {
            return Ok(None);
        }
        let id = tables.next_id();
        let completion = Completion {
            id,
            child_id: new.child_id,
            activity_id: new.activity_id,
            photo_path: new.photo_path.clone(),
            photo_sha256: new.photo_sha256.clone(),
            validated: new.validated,
            validation_reasoning: new.validation_reasoning.clone(),
            tokens_awarded: new.tokens_awarded,
            completed_at: Utc::now() + Duration::milliseconds(id),
        };
        if let Some(child) = tables.children.iter_mut().find(|c| c.id == new.child_id) {
            child.token_balance += new.tokens_awarded;
        }
        tables.completions.push(completion.clone());
        Ok(Some(completion))
    }
}
