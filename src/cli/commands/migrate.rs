//! Backfill command.

use console::style;

use vocab_store::config::Settings;
use vocab_store::models::Language;

/// Fill missing fields on stored words for each language.
pub async fn cmd_migrate(settings: &Settings, languages: &[Language]) -> anyhow::Result<()> {
    let repo = settings.word_repository().await;
    if !repo.is_available() {
        anyhow::bail!("Document store unavailable at {}", settings.database_url());
    }

    for &lang in languages {
        println!("{} Migrating {} words...", style("→").cyan(), lang);
        let report = repo.migrate(lang).await.map_err(|e| {
            eprintln!("  {} Migration failed: {}", style("✗").red(), e);
            anyhow::anyhow!("Migration of {} failed: {}", lang, e)
        })?;

        println!(
            "  {} {}: {} scanned, {} updated in {} batch(es)",
            style("✓").green(),
            report.collection,
            report.scanned,
            report.updated,
            report.batches
        );
    }

    Ok(())
}
