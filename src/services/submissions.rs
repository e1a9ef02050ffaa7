use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::{
    config::GeoBounds,
    db::Store,
    error::AppError,
    models::completion::{NewCompletion, PhotoValidationResponse},
    services::{
        ai::{AiError, AiService},
        metrics,
        photos::{PhotoStorage, PhotoUpload, MAX_PHOTO_BYTES},
    },
};

pub const DEFAULT_CRITERIA: &str = "Photo should show completion of the activity.";

/// Tolerated clock difference between the device and the server.
const CLOCK_SKEW_SECS: i64 = 60;

/// Checks applied to an upload before anything is looked up or stored.
#[derive(Debug, Clone)]
pub struct CaptureRules {
    pub bounds: GeoBounds,
    pub max_age: Duration,
}

impl CaptureRules {
    pub fn check(&self, upload: &PhotoUpload, now: DateTime<Utc>) -> Result<(), AppError> {
        if !upload.is_image() {
            return Err(AppError::bad_request("File must be an image"));
        }
        if upload.bytes.len() > MAX_PHOTO_BYTES {
            return Err(AppError::bad_request("Image too large (max 20MB)"));
        }
        match (upload.latitude, upload.longitude) {
            (None, None) => {}
            (Some(lat), Some(lon)) => {
                if !self.bounds.contains(lat, lon) {
                    return Err(AppError::bad_request(
                        "Photo location is outside the permitted area",
                    ));
                }
            }
            _ => {
                return Err(AppError::bad_request(
                    "latitude and longitude must be provided together",
                ))
            }
        }
        if let Some(taken_at) = upload.taken_at {
            if taken_at > now + Duration::seconds(CLOCK_SKEW_SECS) {
                return Err(AppError::bad_request("Photo capture time is in the future"));
            }
            if now - taken_at > self.max_age {
                return Err(AppError::bad_request(format!(
                    "Photo is too old (max {} minutes)",
                    self.max_age.num_minutes()
                )));
            }
        }
        Ok(())
    }
}

pub struct SubmissionService;

impl SubmissionService {
    /// Validate a photo for an activity and credit the child when it passes.
    ///
    /// Nothing is written before the upload passes [`CaptureRules::check`] and both
    /// the activity and the child exist. Provider failures remove the stored photo
    /// and surface as errors; only an actual verdict produces a completion row.
    pub async fn submit(
        store: &dyn Store,
        ai: Option<&AiService>,
        photos: &PhotoStorage,
        rules: &CaptureRules,
        activity_id: i64,
        child_id: i64,
        upload: PhotoUpload,
    ) -> Result<PhotoValidationResponse, AppError> {
        if let Err(e) = rules.check(&upload, Utc::now()) {
            metrics::record_submission("rejected_upload");
            return Err(e);
        }

        let Some(activity) = store.get_activity(activity_id).await? else {
            metrics::record_submission("not_found");
            return Err(AppError::not_found("Activity not found"));
        };
        let Some(child) = store.get_child(child_id).await? else {
            metrics::record_submission("not_found");
            return Err(AppError::not_found("Child not found"));
        };

        let Some(ai) = ai else {
            metrics::record_submission("not_configured");
            return Err(AiError::NotConfigured.into());
        };

        let photo_sha256 = upload.sha256_hex();
        if store
            .find_completion(child.id, activity.id, &photo_sha256)
            .await?
            .is_some()
        {
            metrics::record_submission("duplicate");
            return Err(AppError::conflict("Photo already submitted for this activity"));
        }

        let photo_path = photos.save(activity.id, child.id, &upload).await?;

        let criteria = activity
            .validation_criteria
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(DEFAULT_CRITERIA);
        let verdict = match ai
            .validate_photo(&upload.bytes, &upload.content_type, &activity.description, criteria)
            .await
        {
            Ok(v) => v,
            Err(e) => {
                photos.remove(&photo_path).await;
                metrics::record_submission("provider_error");
                return Err(e.into());
            }
        };

        let tokens_awarded = if verdict.valid { activity.tokens_reward } else { 0 };
        let new = NewCompletion {
            child_id: child.id,
            activity_id: activity.id,
            photo_path: photo_path.to_string_lossy().into_owned(),
            photo_sha256,
            validated: verdict.valid,
            validation_reasoning: verdict.reasoning.clone(),
            tokens_awarded,
        };

        let completion = match store.record_completion(&new).await {
            Ok(Some(c)) => c,
            Ok(None) => {
                photos.remove(&photo_path).await;
                metrics::record_submission("duplicate");
                return Err(AppError::conflict("Photo already submitted for this activity"));
            }
            Err(e) => {
                photos.remove(&photo_path).await;
                return Err(e.into());
            }
        };

        if verdict.valid {
            metrics::record_submission("validated");
            metrics::TOKENS_AWARDED_COUNTER
                .with_label_values(&[activity.category.as_str()])
                .inc_by(tokens_awarded as f64);
        } else {
            metrics::record_submission("invalid");
        }
        info!(
            child_id = child.id,
            activity_id = activity.id,
            valid = verdict.valid,
            tokens_awarded,
            "Photo submission judged"
        );

        Ok(PhotoValidationResponse {
            valid: verdict.valid,
            reasoning: verdict.reasoning,
            tokens_awarded,
            completion_id: completion.id,
        })
    }
}
