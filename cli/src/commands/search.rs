use anyhow::Result;

use super::Settings;

pub async fn execute(settings: &Settings, term: &str) -> Result<()> {
    let manager = settings.manager()?;
    let results = manager.search(term).await?;

    if results.is_empty() {
        println!("No models found matching '{}'", term.trim());
        return Ok(());
    }

    println!("Repositories matching '{}':\n", term.trim());
    for (i, repo) in results.iter().enumerate() {
        println!("{:>3}. {}", i + 1, repo);
    }

    println!("\nRun `manage-models browse {}` to pick a file and download it.", term.trim());

    Ok(())
}
