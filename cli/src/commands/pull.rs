use anyhow::Result;
use llamaup_core::format_size;

use super::Settings;

pub async fn execute(settings: &Settings, model: &str) -> Result<()> {
    println!("Pulling model: {}", model);

    let outcome = settings.manager()?.pull(model).await?;
    let report = outcome.report;

    if report.already_present {
        println!(
            "Already present: {} ({})",
            outcome.path.display(),
            format_size(report.bytes)
        );
    } else {
        println!("\nModel downloaded successfully!");
        println!("  Name: {}", outcome.name);
        println!("  Size: {}", format_size(report.bytes));
        println!("  Time: {:.1}s", report.elapsed.as_secs_f64());
        println!("  Path: {}", outcome.path.display());
    }

    Ok(())
}
