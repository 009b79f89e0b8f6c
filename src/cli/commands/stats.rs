//! Statistics command.

use console::style;

use vocab_store::config::Settings;
use vocab_store::models::Language;

/// Print learned/learning/unknown counts for a language.
pub async fn cmd_stats(settings: &Settings, lang: Language, json: bool) -> anyhow::Result<()> {
    let repo = settings.word_repository().await;
    let stats = repo.statistics(lang).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    if let Some(ref error) = stats.error {
        eprintln!("{} Statistics unavailable: {}", style("✗").red(), error);
        return Ok(());
    }

    let qualifier = if stats.estimated {
        format!(" (estimated from {} sampled)", stats.sample_size)
    } else {
        String::new()
    };
    println!(
        "{} {} words{}",
        style(lang.collection()).bold(),
        stats.total,
        qualifier
    );
    println!("  {:<10} {}", style("learned").green(), stats.learned);
    println!("  {:<10} {}", style("learning").yellow(), stats.learning);
    println!("  {:<10} {}", style("unknown").dim(), stats.unknown);
    println!("  {:<10} {}", style("favorites").cyan(), stats.favorites);

    Ok(())
}
