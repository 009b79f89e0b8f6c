//! Initialize command.

use console::style;

use vocab_store::config::Settings;

/// Initialize the data directory and database.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    if settings.is_memory() {
        println!(
            "{} In-memory store configured; nothing to initialize",
            style("!").yellow()
        );
        return Ok(());
    }

    settings.ensure_directories()?;
    let store = settings.open_store().await?;
    store.ping().await?;

    println!(
        "{} Initialized vocabulary store at {}",
        style("✓").green(),
        settings.database_path().display()
    );

    Ok(())
}
