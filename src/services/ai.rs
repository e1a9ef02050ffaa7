use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde_json::{json, Value};

use crate::{
    config::Config,
    models::activity::{ActivityCategory, GenerateActivitiesRequest},
    services::{
        ai_response::{self, GeneratedActivity, PhotoVerdict},
        metrics,
    },
};

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("AI service not configured (GROQ_API_KEY)")]
    NotConfigured,
    #[error("AI provider request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("AI provider returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("AI response could not be parsed: {0}")]
    Malformed(String),
}

/// An image attached to a vision prompt.
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub content_type: String,
    pub base64: String,
}

impl ImageInput {
    /// Parameters on the content type (`; name=...`) are dropped so the
    /// data URL stays well formed.
    pub fn from_bytes(bytes: &[u8], content_type: &str) -> Self {
        let content_type = content_type
            .parse::<mime::Mime>()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|_| content_type.trim().to_string());
        Self {
            content_type,
            base64: STANDARD.encode(bytes),
        }
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.content_type, self.base64)
    }
}

/// The two call shapes the app needs from a hosted language model.
/// Both return the raw assistant text.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete_text(&self, prompt: &str) -> Result<String, AiError>;

    async fn complete_vision(&self, prompt: &str, image: &ImageInput) -> Result<String, AiError>;
}

/// OpenAI-compatible `/chat/completions` client (Groq by default).
pub struct ChatCompletionsModel {
    client: Client,
    api_base: String,
    api_key: String,
    text_model: String,
    vision_model: String,
}

impl ChatCompletionsModel {
    /// `None` when no API key is configured.
    pub fn from_config(config: &Config) -> anyhow::Result<Option<Self>> {
        let Some(api_key) = config.ai_api_key.clone() else {
            return Ok(None);
        };
        let client = Client::builder()
            .timeout(Duration::from_secs(config.ai_timeout_seconds))
            .build()?;
        Ok(Some(Self {
            client,
            api_base: config.ai_api_base.trim_end_matches('/').to_string(),
            api_key,
            text_model: config.ai_text_model.clone(),
            vision_model: config.ai_vision_model.clone(),
        }))
    }

    async fn chat(&self, kind: &str, payload: Value) -> Result<String, AiError> {
        let result = self.send_chat(payload).await;
        let outcome = if result.is_ok() { "ok" } else { "error" };
        metrics::AI_CALLS_COUNTER
            .with_label_values(&[kind, outcome])
            .inc();
        result
    }

    async fn send_chat(&self, payload: Value) -> Result<String, AiError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("AI provider error {}: {}", status, body);
            return Err(AiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let data: Value = response.json().await?;
        let content = data
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| {
                tracing::error!("Response missing choices[0].message.content: {:?}", data);
                AiError::Malformed("response missing choices[0].message.content".into())
            })?;
        tracing::debug!("AI response: {}", content);
        Ok(content.to_string())
    }
}

#[async_trait]
impl LanguageModel for ChatCompletionsModel {
    async fn complete_text(&self, prompt: &str) -> Result<String, AiError> {
        self.chat(
            "text",
            json!({
                "model": self.text_model,
                "messages": [{ "role": "user", "content": prompt }],
                "temperature": 0.8,
            }),
        )
        .await
    }

    async fn complete_vision(&self, prompt: &str, image: &ImageInput) -> Result<String, AiError> {
        self.chat(
            "vision",
            json!({
                "model": self.vision_model,
                "messages": [{
                    "role": "user",
                    "content": [
                        { "type": "text", "text": prompt },
                        { "type": "image_url", "image_url": { "url": image.data_url() } },
                    ],
                }],
                "max_tokens": 256,
                "temperature": 0.2,
            }),
        )
        .await
    }
}

/// Prompting and parsing on top of a [`LanguageModel`].
#[derive(Clone)]
pub struct AiService {
    model: Arc<dyn LanguageModel>,
}

impl AiService {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub async fn generate_activities(
        &self,
        req: &GenerateActivitiesRequest,
    ) -> Result<Vec<GeneratedActivity>, AiError> {
        let text = self.model.complete_text(&generation_prompt(req)).await?;
        ai_response::parse_generated_activities(&text)
    }

    pub async fn validate_photo(
        &self,
        photo: &[u8],
        content_type: &str,
        activity_description: &str,
        validation_criteria: &str,
    ) -> Result<PhotoVerdict, AiError> {
        let image = ImageInput::from_bytes(photo, content_type);
        let prompt = validation_prompt(activity_description, validation_criteria);
        let text = self.model.complete_vision(&prompt, &image).await?;
        ai_response::parse_verdict(&text)
    }
}

pub fn category_hints(category: ActivityCategory) -> &'static str {
    match category {
        ActivityCategory::Beach => {
            "shells, sea glass, driftwood, pebbles, feathers, seaweed, interesting rocks"
        }
        ActivityCategory::Bush => {
            "leaves with specific shapes, bark textures, seed pods, flowers, feathers, nuts, gumnuts"
        }
        ActivityCategory::Garden => {
            "leaves by shape or color, flowers by color, seeds, petals, insects (e.g. butterfly), stones"
        }
        ActivityCategory::City => {
            "objects of a specific shape and color, signs, textures, patterns, street art, plants in parks"
        }
    }
}

fn generation_prompt(req: &GenerateActivitiesRequest) -> String {
    format!(
        r#"Generate {count} scavenger hunt activities for kids aged {age_min}-{age_max}.
Category: {category}
Location/area: {location}

Each activity must be a "find an object" task that the kid can photograph. Use objects like: {hints}.

Rules:
- Be specific: include shape, color, or texture (e.g. "find a leaf shaped like a heart", "find a shell that is spiral-shaped and white", "find something round and blue").
- Ages 5-7: simpler (e.g. "find a red flower", "find a smooth stone").
- Ages 8-12: can be more specific (e.g. "find a leaf with 5 pointed edges", "find a shell with stripes").
- The kid will take a photo of the object they find; AI will validate that the photo shows the correct object.

For each activity provide:
- title: Short catchy title (e.g. "Spiral Shell Hunter")
- description: Clear instruction for the kid (e.g. "Find a spiral-shaped shell on the beach")
- validation_criteria: Exact criteria for photo validation - object type, shape, and/or color the AI must see (e.g. "Photo must show a spiral or coiled shell, not flat or broken")
- location: Specific place if applicable

Return JSON array only, no markdown."#,
        count = req.count,
        age_min = req.age_min,
        age_max = req.age_max,
        category = req.category,
        location = req.location,
        hints = category_hints(req.category),
    )
}

fn validation_prompt(activity_description: &str, validation_criteria: &str) -> String {
    format!(
        r#"You are validating a photo for a kids scavenger hunt activity.
The kid was asked to find an object and take a photo of it.

Activity: {activity_description}
Validation criteria (what the photo must show): {validation_criteria}

Check:
1. Does the photo clearly show the required object (correct type, shape, color)?
2. Is it a real photo of a physical object (not a screenshot, drawing, or stock image)?
3. Is it appropriate for a kids app?

Respond with JSON only: {{"valid": true/false, "reasoning": "brief explanation"}}"#
    )
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Scripted model: pops canned replies in order and records prompts.
    #[derive(Default)]
    pub struct ScriptedModel {
        replies: Mutex<Vec<Result<String, AiError>>>,
        pub prompts: Mutex<Vec<String>>,
        pub images: Mutex<Vec<ImageInput>>,
    }

    impl ScriptedModel {
        pub fn replying<I, S>(replies: I) -> Arc<Self>
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            let mut replies: Vec<Result<String, AiError>> =
                replies.into_iter().map(|r| Ok(r.into())).collect();
            replies.reverse();
            Arc::new(Self {
                replies: Mutex::new(replies),
                ..Default::default()
            })
        }

        pub fn failing(error: AiError) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(vec![Err(error)]),
                ..Default::default()
            })
        }

        pub fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }

        fn next(&self, prompt: &str) -> Result<String, AiError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(AiError::Malformed("no scripted reply left".into())))
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn complete_text(&self, prompt: &str) -> Result<String, AiError> {
            self.next(prompt)
        }

        async fn complete_vision(&self, prompt: &str, image: &ImageInput) -> Result<String, AiError> {
            self.images.lock().unwrap().push(image.clone());
            self.next(prompt)
        }
    }
}
