use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use treasure_hunt_api::{
    config::Config,
    db::{self, PgStore},
    routes,
    services::{
        ai::{AiService, ChatCompletionsModel},
        photos::PhotoStorage,
        submissions::CaptureRules,
    },
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    info!("Database connected and migrations applied");

    let ai = match ChatCompletionsModel::from_config(&config)? {
        Some(model) => {
            info!(
                "AI provider configured ({}, text={}, vision={})",
                config.ai_api_base, config.ai_text_model, config.ai_vision_model
            );
            Some(Arc::new(AiService::new(Arc::new(model))))
        }
        None => {
            info!("GROQ_API_KEY not set, generation and photo validation disabled");
            None
        }
    };

    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let state = AppState {
        store: Arc::new(PgStore::new(pool)),
        ai,
        photos: Arc::new(PhotoStorage::new(&config.upload_dir)),
        capture_rules: Arc::new(CaptureRules {
            bounds: config.bounds,
            max_age: chrono::Duration::minutes(config.photo_max_age_minutes),
        }),
    };

    let app = routes::router(state, &config.api_prefix);

    let addr = format!("{}:{}", config.host, config.port);
    info!("Treasure Hunt API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
