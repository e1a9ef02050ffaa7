use anyhow::Context;
use prometheus::{Encoder, TextEncoder};

use crate::error::AppError;

/// GET /metrics: photo submission outcomes, tokens awarded per category,
/// generated activities and AI provider calls, in Prometheus text format.
pub async fn metrics_handler() -> Result<String, AppError> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&prometheus::gather(), &mut buffer)
        .context("encoding metrics")?;
    Ok(String::from_utf8(buffer).context("metrics output is not UTF-8")?)
}
