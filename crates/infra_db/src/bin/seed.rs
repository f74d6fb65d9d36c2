//! Talks catalogue seeder
//!
//! Applies migrations and loads a small demo catalogue into the configured
//! database. Safe to run repeatedly: speakers are upserted and talks are
//! only created while the catalogue is empty.
//!
//! # Environment Variables
//!
//! - `TALKS_DATABASE_URL`: PostgreSQL connection string
//! - `TALKS_MAX_CONNECTIONS`: pool size (default: 10)
//! - `TALKS_MAX_LIFETIME_SECS`, `TALKS_IDLE_TIMEOUT_SECS`: connection recycling
//! - `TALKS_LOG_LEVEL`: default tracing filter (default: info)
//! - `TALKS_LOG_FORMAT`: `pretty` or `json`
//! - `RUST_LOG`: overrides `TALKS_LOG_LEVEL`

use anyhow::{bail, Context};
use tracing::info;
use uuid::Uuid;

use core_kernel::{AdapterHealth, HealthCheckable, SpeakerId};
use domain_talks::{NewTalk, Speaker, TalkRepository};
use infra_db::{create_pool, init_tracing, run_migrations, DatabaseConfig, PostgresTalkStore, TalksConfig};

/// Fixed ids keep re-runs from duplicating speakers
const SPEAKERS: &[(u128, &str)] = &[
    (0x0190_0000_0000_7000_8000_0000_0000_0001, "Ada Lovelace"),
    (0x0190_0000_0000_7000_8000_0000_0000_0002, "Grace Hopper"),
    (0x0190_0000_0000_7000_8000_0000_0000_0003, "Barbara Liskov"),
];

/// (speaker index, headline, description, tags)
const TALKS: &[(usize, &str, &str, &[&str])] = &[
    (
        0,
        "Notes on the Analytical Engine",
        "What a general purpose machine could compute beyond numbers",
        &["history", "computing"],
    ),
    (
        1,
        "Nanoseconds and You",
        "A length of wire and the speed of light in everyday engineering",
        &["history", "hardware"],
    ),
    (
        1,
        "Compilers for Everyone",
        "Why programs should read like English and how a compiler gets there",
        &["compilers", "languages"],
    ),
    (
        2,
        "Substitutability",
        "Subtypes, behaviour and the contracts abstractions make",
        &["languages", "design"],
    ),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = TalksConfig::from_env().context("invalid TALKS_ configuration")?;
    init_tracing(&config.log_level, config.log_format).context("failed to install tracing")?;

    let pool = create_pool(DatabaseConfig::from(&config)).await?;
    run_migrations(&pool).await?;

    let store = PostgresTalkStore::new(pool);
    let health = store.health_check().await;
    if health.status != AdapterHealth::Healthy {
        bail!("talk store unhealthy: {}", health.message.unwrap_or_default());
    }
    info!(latency_ms = health.latency_ms, "Talk store healthy");

    let speakers: Vec<Speaker> = SPEAKERS
        .iter()
        .map(|(id, name)| Speaker::new(SpeakerId::from_uuid(Uuid::from_u128(*id)), *name))
        .collect();
    store.upsert_speakers(&speakers).await?;
    info!(count = speakers.len(), "Speakers seeded");

    let repo = TalkRepository::new(store);
    if !repo.get_talk_summaries(1).await?.is_empty() {
        info!("Catalogue already has talks; skipping talk seed");
        return Ok(());
    }

    for (speaker, headline, description, tags) in TALKS {
        let speaker = speakers.get(*speaker).context("seed talk names an unknown speaker")?;
        let new_talk = NewTalk::new(*headline, *description, speaker.id)
            .with_tags(tags.iter().copied());
        let talk = repo.create_talk(new_talk).await?;
        info!(talk_id = %talk.id, headline = %talk.headline, "Talk seeded");
    }

    for stats in repo.get_tag_talk_stats().await? {
        info!(tag = %stats.tag, talks = stats.talk_count, "Tag stats");
    }

    Ok(())
}
