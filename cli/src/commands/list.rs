use anyhow::Result;
use llamaup_core::format_size;

use super::Settings;

pub async fn execute(settings: &Settings) -> Result<()> {
    let inventory = settings.manager()?.list()?;

    if inventory.models.is_empty() {
        println!("No models registered.");
        println!("\nRun `manage-models browse` to find and download a model.");
        return Ok(());
    }

    println!(
        "{:<24} {:<44} {:<10} {:<11} {}",
        "NAME", "SOURCE", "SIZE", "ADDED", "STATUS"
    );
    println!("{}", "-".repeat(104));

    for model in &inventory.models {
        let (size, status) = match model.size_on_disk {
            Some(bytes) => (format_size(bytes), "installed"),
            None => (format!("{:.2} GB", model.record.size_gb), "not downloaded"),
        };
        println!(
            "{:<24} {:<44} {:<10} {:<11} {}",
            model.name,
            model.record.source_repo,
            size,
            model.record.added_date.format("%Y-%m-%d").to_string(),
            status
        );
    }

    println!();
    println!("Disk usage: {}", format_size(inventory.total_bytes));
    println!("Registry:   {}", inventory.registry_path.display());

    Ok(())
}
