use std::env;

/// Rectangle of permitted capture coordinates, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl GeoBounds {
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.lat_min..=self.lat_max).contains(&lat) && (self.lon_min..=self.lon_max).contains(&lon)
    }
}

impl Default for GeoBounds {
    /// Greater Sydney.
    fn default() -> Self {
        Self {
            lat_min: -34.2,
            lat_max: -33.6,
            lon_min: 150.5,
            lon_max: 151.4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub api_prefix: String,
    pub upload_dir: String,
    pub photo_max_age_minutes: i64,
    pub bounds: GeoBounds,
    // AI provider (optional)
    pub ai_api_key: Option<String>,
    pub ai_api_base: String,
    pub ai_text_model: String,
    pub ai_vision_model: String,
    pub ai_timeout_seconds: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = GeoBounds::default();
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api/v1".into()),
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".into()),
            photo_max_age_minutes: env::var("PHOTO_MAX_AGE_MINUTES")
                .unwrap_or_else(|_| "60".into())
                .parse()?,
            bounds: GeoBounds {
                lat_min: parse_or("BOUNDS_LAT_MIN", defaults.lat_min)?,
                lat_max: parse_or("BOUNDS_LAT_MAX", defaults.lat_max)?,
                lon_min: parse_or("BOUNDS_LON_MIN", defaults.lon_min)?,
                lon_max: parse_or("BOUNDS_LON_MAX", defaults.lon_max)?,
            },
            ai_api_key: env::var("GROQ_API_KEY").ok().filter(|s| !s.is_empty()),
            ai_api_base: env::var("AI_API_BASE")
                .unwrap_or_else(|_| "https://api.groq.com/openai/v1".into()),
            ai_text_model: env::var("AI_TEXT_MODEL")
                .unwrap_or_else(|_| "llama-3.1-70b-versatile".into()),
            ai_vision_model: env::var("AI_VISION_MODEL")
                .unwrap_or_else(|_| "meta-llama/llama-4-scout-17b-16e-instruct".into()),
            ai_timeout_seconds: env::var("AI_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "60".into())
                .parse()?,
        })
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("Missing required env var: {}", key))
}

fn parse_or(key: &str, default: f64) -> anyhow::Result<f64> {
    match env::var(key) {
        Ok(v) if !v.is_empty() => v
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e)),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bounds_cover_sydney_cbd() {
        let bounds = GeoBounds::default();
        assert!(bounds.contains(-33.8688, 151.2093));
        // Melbourne
        assert!(!bounds.contains(-37.8136, 144.9631));
    }
}
