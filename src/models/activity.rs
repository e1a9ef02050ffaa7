use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;

pub const MIN_AGE: i32 = 5;
pub const MAX_AGE: i32 = 12;
pub const MAX_GENERATE_COUNT: u32 = 20;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ActivityCategory {
    City,
    Beach,
    Bush,
    Garden,
}

impl ActivityCategory {
    pub const ALL: [ActivityCategory; 4] = [
        ActivityCategory::City,
        ActivityCategory::Beach,
        ActivityCategory::Bush,
        ActivityCategory::Garden,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityCategory::City => "city",
            ActivityCategory::Beach => "beach",
            ActivityCategory::Bush => "bush",
            ActivityCategory::Garden => "garden",
        }
    }
}

impl std::fmt::Display for ActivityCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown activity category: {0}")]
pub struct UnknownCategory(pub String);

impl std::str::FromStr for ActivityCategory {
    type Err = UnknownCategory;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "city" => Ok(ActivityCategory::City),
            "beach" => Ok(ActivityCategory::Beach),
            "bush" => Ok(ActivityCategory::Bush),
            "garden" => Ok(ActivityCategory::Garden),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

impl TryFrom<String> for ActivityCategory {
    type Error = UnknownCategory;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Activity {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[sqlx(try_from = "String")]
    pub category: ActivityCategory,
    pub age_min: i32,
    pub age_max: i32,
    pub location: String,
    pub tokens_reward: i32,
    pub validation_criteria: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Filters for `GET /activities`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityQuery {
    pub category: Option<ActivityCategory>,
    /// Keeps activities whose range reaches at least this age.
    pub age_min: Option<i32>,
    /// Keeps activities whose range starts at or below this age.
    pub age_max: Option<i32>,
    /// Case-insensitive substring of the stored location.
    pub location: Option<String>,
}

impl ActivityQuery {
    pub fn matches(&self, activity: &Activity) -> bool {
        if self.category.is_some_and(|c| c != activity.category) {
            return false;
        }
        if self.age_min.is_some_and(|min| activity.age_max < min) {
            return false;
        }
        if self.age_max.is_some_and(|max| activity.age_min > max) {
            return false;
        }
        match &self.location {
            Some(loc) => activity
                .location
                .to_lowercase()
                .contains(&loc.to_lowercase()),
            None => true,
        }
    }
}

/// A row about to be inserted into `activities`.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub title: String,
    pub description: String,
    pub category: ActivityCategory,
    pub age_min: i32,
    pub age_max: i32,
    pub location: String,
    pub tokens_reward: i32,
    pub validation_criteria: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateActivityRequest {
    pub title: String,
    pub description: String,
    pub category: ActivityCategory,
    pub age_min: i32,
    pub age_max: i32,
    #[serde(alias = "location_sydney")]
    pub location: String,
    #[serde(default = "default_tokens_reward")]
    pub tokens_reward: i32,
    #[serde(default, alias = "ai_validation_prompt")]
    pub validation_criteria: Option<String>,
}

fn default_tokens_reward() -> i32 {
    1
}

impl CreateActivityRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::bad_request("title must not be empty"));
        }
        if self.location.trim().is_empty() {
            return Err(AppError::bad_request("location must not be empty"));
        }
        validate_age_range(self.age_min, self.age_max)?;
        if self.tokens_reward < 1 {
            return Err(AppError::bad_request("tokens_reward must be at least 1"));
        }
        Ok(())
    }

    pub fn into_new_activity(self) -> NewActivity {
        NewActivity {
            title: self.title,
            description: self.description,
            category: self.category,
            age_min: self.age_min,
            age_max: self.age_max,
            location: self.location,
            tokens_reward: self.tokens_reward,
            validation_criteria: self.validation_criteria.filter(|s| !s.trim().is_empty()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateActivitiesRequest {
    pub category: ActivityCategory,
    pub age_min: i32,
    pub age_max: i32,
    #[serde(alias = "location_sydney")]
    pub location: String,
    #[serde(default = "default_generate_count")]
    pub count: u32,
}

fn default_generate_count() -> u32 {
    5
}

impl GenerateActivitiesRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_age_range(self.age_min, self.age_max)?;
        if self.location.trim().is_empty() {
            return Err(AppError::bad_request("location must not be empty"));
        }
        if !(1..=MAX_GENERATE_COUNT).contains(&self.count) {
            return Err(AppError::bad_request(format!(
                "count must be between 1 and {MAX_GENERATE_COUNT}"
            )));
        }
        Ok(())
    }
}

pub fn validate_age(field: &str, age: i32) -> Result<(), AppError> {
    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        return Err(AppError::bad_request(format!(
            "{field} must be between {MIN_AGE} and {MAX_AGE}"
        )));
    }
    Ok(())
}

pub fn validate_age_range(age_min: i32, age_max: i32) -> Result<(), AppError> {
    validate_age("age_min", age_min)?;
    validate_age("age_max", age_max)?;
    if age_min > age_max {
        return Err(AppError::bad_request("age_min must not exceed age_max"));
    }
    Ok(())
}
