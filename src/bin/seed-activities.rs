//! Starter activity seed tool
//!
//! Inserts a hand-written set of activities so a fresh database has something
//! to list before the generator has been run.
//!
//! Usage:
//!   DATABASE_URL=... ./seed-activities seed --category beach
//!   DATABASE_URL=... ./seed-activities seed            (all categories)
//!   DATABASE_URL=... ./seed-activities count

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::env;

use treasure_hunt_api::{
    db::{self, PgStore, Store},
    models::activity::{ActivityCategory, ActivityQuery, NewActivity},
};

#[derive(Parser)]
#[command(name = "seed-activities", about = "Seed or inspect scavenger-hunt activities")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Insert the starter activities (all categories unless one is given)
    Seed {
        #[arg(long)]
        category: Option<String>,
        /// Location stored on every seeded activity
        #[arg(long, default_value = "Sydney")]
        location: String,
    },
    /// Print the number of stored activities per category
    Count,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let database_url = env::var("DATABASE_URL").context("DATABASE_URL required")?;
    let pool = db::create_pool(&database_url)
        .await
        .context("Failed to connect to database")?;
    db::run_migrations(&pool).await?;
    let store = PgStore::new(pool);

    match cli.command {
        Command::Seed { category, location } => {
            let categories = match category {
                Some(c) => vec![c.parse::<ActivityCategory>()?],
                None => ActivityCategory::ALL.to_vec(),
            };
            let rows: Vec<NewActivity> = categories
                .into_iter()
                .flat_map(|c| starter_activities(c, &location))
                .collect();
            let inserted = store.insert_activities(&rows).await?;
            println!("Inserted {} activities", inserted.len());
            for a in &inserted {
                println!("  #{} [{}] {}", a.id, a.category, a.title);
            }
        }
        Command::Count => {
            let all = store.list_activities(&ActivityQuery::default()).await?;
            for category in ActivityCategory::ALL {
                let n = all.iter().filter(|a| a.category == category).count();
                println!("{:<8} {}", category, n);
            }
            println!("{:<8} {}", "total", all.len());
        }
    }

    Ok(())
}

fn starter_activities(category: ActivityCategory, location: &str) -> Vec<NewActivity> {
    let items: &[(&str, &str, &str, i32, i32)] = match category {
        ActivityCategory::Beach => &[
            ("Spiral Shell Hunter", "Find a spiral-shaped shell on the beach",
             "Photo must show a spiral or coiled shell, not flat or broken", 5, 12),
            ("Sea Glass Spotter", "Find a smooth piece of green or blue sea glass",
             "Photo must show a frosted piece of green or blue glass", 8, 12),
        ],
        ActivityCategory::Bush => &[
            ("Gumnut Collector", "Find a gumnut", "Photo must show a woody gum tree seed capsule", 5, 9),
            ("Bark Detective", "Find bark that peels in long strips",
             "Photo must show peeling, stringy or papery bark", 8, 12),
        ],
        ActivityCategory::Garden => &[
            ("Red Flower", "Find a red flower", "Photo must show a flower with red petals", 5, 7),
            ("Five Points", "Find a leaf with five pointed edges",
             "Photo must show a single leaf with five distinct points", 8, 12),
        ],
        ActivityCategory::City => &[
            ("Round and Blue", "Find something round and blue",
             "Photo must show a circular object that is mostly blue", 5, 8),
            ("Street Art Scout", "Find a mural with at least three colors",
             "Photo must show painted street art with three or more colors", 9, 12),
        ],
    };

    items
        .iter()
        .map(|(title, description, criteria, age_min, age_max)| NewActivity {
            title: title.to_string(),
            description: description.to_string(),
            category,
            age_min: *age_min,
            age_max: *age_max,
            location: location.to_string(),
            tokens_reward: if *age_min >= 8 { 2 } else { 1 },
            validation_criteria: Some(criteria.to_string()),
        })
        .collect()
}
