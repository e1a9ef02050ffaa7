use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{error::AppError, models::activity::validate_age};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Child {
    pub id: i64,
    pub name: String,
    pub age: i32,
    pub token_balance: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateChildRequest {
    pub name: String,
    pub age: i32,
}

impl CreateChildRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::bad_request("name must not be empty"));
        }
        validate_age("age", self.age)
    }
}

#[derive(Debug, Serialize)]
pub struct TokenBalance {
    pub child_id: i64,
    pub tokens: i32,
}

impl From<&Child> for TokenBalance {
    fn from(child: &Child) -> Self {
        Self {
            child_id: child.id,
            tokens: child.token_balance,
        }
    }
}
