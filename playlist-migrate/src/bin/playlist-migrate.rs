use eyre::Context;
use playlist_migrate::config::MigrationConfig;
use playlist_migrate::download::YtDlp;
use playlist_migrate::ledger::Ledger;
use playlist_migrate::metadata::PageScraper;
use playlist_migrate::migrate::Migration;
use playlist_migrate::{authorize, persist_token};
use std::io::IsTerminal;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_ansi(std::io::stdout().is_terminal())
        .init();

    let config = MigrationConfig::default();

    let source = authorize("source", &config.source).await?;
    let target = authorize("target", &config.target).await?;

    let mut ledger = Ledger::load(&config.ledger_path)
        .await
        .context("load upload ledger")?;
    tracing::info!(
        path = %ledger.path().display(),
        recorded = ledger.len(),
        "loaded upload ledger"
    );

    let scraper = PageScraper::default();
    let downloader = YtDlp::new(config.retry.attempt_timeout);

    let result = Migration::new(&config, &source, &scraper, &downloader, &target)
        .run(&mut ledger)
        .await;

    // tokens may have been refreshed mid-run, keep them even if the run failed
    persist_token(&source, &config.source).await?;
    persist_token(&target, &config.target).await?;

    let report = result?;
    for video in &report.published {
        tracing::info!(
            source_id = video.source_id,
            remote_id = video.remote_id,
            "published"
        );
    }
    tracing::info!(
        published = report.published.len(),
        skipped = report.skipped.len(),
        downloaded = report.downloaded,
        subtitles = report.subtitles,
        missing_subtitles = report.missing_subtitles,
        "migration complete"
    );

    Ok(())
}
