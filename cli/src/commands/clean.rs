//! Remove partial downloads

use anyhow::Result;
use llamaup_core::format_size;

use super::Settings;

pub async fn execute(settings: &Settings) -> Result<()> {
    let manager = settings.manager()?;
    println!(
        "Scanning {} for partial downloads...",
        manager.layout().files_dir().display()
    );

    let report = manager.clean()?;

    if report.removed.is_empty() {
        println!("No partial downloads found.");
        return Ok(());
    }

    for path in &report.removed {
        println!("  Removed {}", path.display());
    }
    println!();
    println!(
        "Cleaned {} files, freed {}",
        report.removed.len(),
        format_size(report.bytes)
    );

    Ok(())
}
