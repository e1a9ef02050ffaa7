//! Turns raw model output into typed results.
//!
//! Model text is untrusted: it may be wrapped in markdown code fences, carry a
//! language tag, or omit fields. Everything past this module works with
//! [`GeneratedActivity`] and [`PhotoVerdict`] only.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::{
    models::activity::{GenerateActivitiesRequest, NewActivity},
    services::ai::AiError,
};

pub const DEFAULT_REASONING: &str = "No reasoning provided";

/// Strip an optional ```` ``` ```` / ```` ```json ```` fence around the payload.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find("```") {
        Some(end) => &rest[..end],
        None => rest,
    };
    let body = body
        .strip_prefix("json")
        .or_else(|| body.strip_prefix("JSON"))
        .unwrap_or(body);
    body.trim()
}

/// One activity proposed by the text model. Category and age range are
/// deliberately absent: those always come from the request.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct GeneratedActivity {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "ai_validation_prompt")]
    pub validation_criteria: Option<String>,
    #[serde(default, alias = "location_sydney")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_integer")]
    pub tokens_reward: Option<i64>,
}

impl GeneratedActivity {
    pub fn into_new_activity(self, req: &GenerateActivitiesRequest) -> NewActivity {
        NewActivity {
            title: non_blank(self.title).unwrap_or_else(|| "Untitled".to_string()),
            description: self.description.unwrap_or_default(),
            category: req.category,
            age_min: req.age_min,
            age_max: req.age_max,
            location: non_blank(self.location).unwrap_or_else(|| req.location.clone()),
            tokens_reward: self
                .tokens_reward
                .and_then(|n| i32::try_from(n).ok())
                .filter(|n| *n >= 1)
                .unwrap_or(1),
            validation_criteria: non_blank(self.validation_criteria),
        }
    }
}

/// The vision model's judgement of one photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoVerdict {
    pub valid: bool,
    pub reasoning: String,
}

#[derive(Deserialize)]
struct RawVerdict {
    #[serde(default)]
    valid: Option<bool>,
    #[serde(default)]
    reasoning: Option<String>,
}

/// Parse the text model's answer. Any malformed item rejects the whole batch.
pub fn parse_generated_activities(text: &str) -> Result<Vec<GeneratedActivity>, AiError> {
    let payload = strip_code_fence(text);
    serde_json::from_str::<Vec<GeneratedActivity>>(payload)
        .map_err(|e| AiError::Malformed(format!("expected a JSON array of activities: {e}")))
}

/// Parse the vision model's answer. A missing `valid` counts as a rejection.
pub fn parse_verdict(text: &str) -> Result<PhotoVerdict, AiError> {
    let payload = strip_code_fence(text);
    let raw: RawVerdict = match serde_json::from_str(payload) {
        Ok(raw) => raw,
        // Models sometimes wrap the object in a sentence.
        Err(first) => match embedded_object(payload) {
            Some(obj) => serde_json::from_str(obj).map_err(|e| {
                AiError::Malformed(format!("expected a JSON verdict object: {e}"))
            })?,
            None => {
                return Err(AiError::Malformed(format!(
                    "expected a JSON verdict object: {first}"
                )))
            }
        },
    };
    Ok(PhotoVerdict {
        valid: raw.valid.unwrap_or(false),
        reasoning: non_blank(raw.reasoning).unwrap_or_else(|| DEFAULT_REASONING.to_string()),
    })
}

fn embedded_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Accepts `2`, `2.0` and `"2"`; anything else reads as absent.
fn lenient_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i32::MAX as f64)
                .map(|f| f as i64)
        }),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::activity::ActivityCategory;

    const ARRAY: &str = r#"[
        {"title": "Spiral Shell Hunter", "description": "Find a spiral-shaped shell",
         "ai_validation_prompt": "Photo must show a spiral shell", "location_sydney": "Bondi"},
        {"title": "Sea Glass", "description": "Find a piece of green sea glass", "tokens_reward": 3}
    ]"#;

    fn request() -> GenerateActivitiesRequest {
        GenerateActivitiesRequest {
            category: ActivityCategory::Beach,
            age_min: 6,
            age_max: 9,
            location: "Coogee".into(),
            count: 2,
        }
    }

    #[test]
    fn fenced_and_plain_arrays_parse_identically() {
        let plain = parse_generated_activities(ARRAY).unwrap();
        let fenced = parse_generated_activities(&format!("```json\n{ARRAY}\n```")).unwrap();
        let bare_fence = parse_generated_activities(&format!("```\n{ARRAY}\n```")).unwrap();
        assert_eq!(plain.len(), 2);
        assert_eq!(plain, fenced);
        assert_eq!(plain, bare_fence);
    }

    #[test]
    fn non_json_generation_is_malformed() {
        let err = parse_generated_activities("Sure! Here are some ideas: ...").unwrap_err();
        assert!(matches!(err, AiError::Malformed(_)));
        // An object is not an array either.
        assert!(parse_generated_activities(r#"{"title": "x"}"#).is_err());
    }

    #[test]
    fn generated_items_take_category_and_ages_from_request() {
        let items = parse_generated_activities(ARRAY).unwrap();
        let req = request();
        let rows: Vec<NewActivity> = items.into_iter().map(|i| i.into_new_activity(&req)).collect();

        assert_eq!(rows[0].category, ActivityCategory::Beach);
        assert_eq!((rows[0].age_min, rows[0].age_max), (6, 9));
        assert_eq!(rows[0].location, "Bondi");
        assert_eq!(rows[0].tokens_reward, 1);
        assert_eq!(rows[0].validation_criteria.as_deref(), Some("Photo must show a spiral shell"));

        assert_eq!(rows[1].location, "Coogee");
        assert_eq!(rows[1].tokens_reward, 3);
        assert_eq!(rows[1].validation_criteria, None);
    }

    #[test]
    fn missing_generated_fields_get_defaults() {
        let row = GeneratedActivity {
            title: Some("   ".into()),
            tokens_reward: Some(-4),
            ..Default::default()
        }
        .into_new_activity(&request());
        assert_eq!(row.title, "Untitled");
        assert_eq!(row.description, "");
        assert_eq!(row.tokens_reward, 1);
    }

    #[test]
    fn loosely_typed_rewards_do_not_reject_the_batch() {
        let items = parse_generated_activities(
            r#"[{"title": "A", "tokens_reward": 2.0},
                {"title": "B", "tokens_reward": "3"},
                {"title": "C", "tokens_reward": "lots"},
                {"title": "D", "tokens_reward": 1.5},
                {"title": "E", "tokens_reward": null}]"#,
        )
        .unwrap();
        let rewards: Vec<i32> = items
            .into_iter()
            .map(|i| i.into_new_activity(&request()).tokens_reward)
            .collect();
        assert_eq!(rewards, vec![2, 3, 1, 1, 1]);
    }

    #[test]
    fn verdict_defaults_missing_fields() {
        let verdict = parse_verdict("{}").unwrap();
        assert!(!verdict.valid);
        assert_eq!(verdict.reasoning, DEFAULT_REASONING);

        let verdict = parse_verdict(r#"{"valid": true}"#).unwrap();
        assert!(verdict.valid);
        assert_eq!(verdict.reasoning, DEFAULT_REASONING);
    }

    #[test]
    fn verdict_accepts_fences_and_surrounding_prose() {
        let fenced = parse_verdict("```json\n{\"valid\": true, \"reasoning\": \"A white spiral shell\"}\n```")
            .unwrap();
        assert_eq!(
            fenced,
            PhotoVerdict { valid: true, reasoning: "A white spiral shell".into() }
        );

        let chatty = parse_verdict(
            "Here is my answer: {\"valid\": false, \"reasoning\": \"The shell is flat\"} Hope this helps!",
        )
        .unwrap();
        assert!(!chatty.valid);
        assert_eq!(chatty.reasoning, "The shell is flat");
    }

    #[test]
    fn verdict_without_json_is_malformed() {
        assert!(matches!(parse_verdict("yes, looks good"), Err(AiError::Malformed(_))));
    }

    #[test]
    fn strip_code_fence_leaves_plain_text_alone() {
        assert_eq!(strip_code_fence("  [1, 2]\n"), "[1, 2]");
        assert_eq!(strip_code_fence("```JSON\n[1]\n```"), "[1]");
        // Unterminated fence
        assert_eq!(strip_code_fence("```json\n[1]"), "[1]");
    }
}
