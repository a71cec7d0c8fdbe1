use anyhow::Result;
use llamaup_core::{format_size, BrowseOutcome};

use super::Settings;
use crate::console::TerminalConsole;

pub async fn execute(settings: &Settings, term: Option<&str>) -> Result<()> {
    let manager = settings.manager()?;
    let mut console = TerminalConsole;

    match manager.browse(term, &mut console).await? {
        BrowseOutcome::Aborted(reason) => {
            println!("Aborted: {reason}");
        }
        BrowseOutcome::Installed {
            name,
            record,
            path,
            report,
        } => {
            if report.already_present {
                println!("\nFile already present, not downloaded again.");
            } else {
                println!(
                    "\nDownloaded {} in {:.1}s",
                    format_size(report.bytes),
                    report.elapsed.as_secs_f64()
                );
            }
            println!("  Name: {name}");
            println!("  Source: {}", record.source_repo);
            println!("  File: {}", record.filename);
            println!("  Path: {}", path.display());
        }
    }

    Ok(())
}
