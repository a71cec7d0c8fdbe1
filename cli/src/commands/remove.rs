use anyhow::Result;
use llamaup_core::{format_size, RemoveOutcome};

use super::Settings;
use crate::console::TerminalConsole;

pub async fn execute(settings: &Settings, model: &str, assume_yes: bool) -> Result<()> {
    let manager = settings.manager()?;

    match manager.remove(model, &mut TerminalConsole, assume_yes)? {
        RemoveOutcome::NotInstalled { path } => {
            println!("Model '{}' is not installed ({} does not exist).", model, path.display());
        }
        RemoveOutcome::Declined => {
            println!("Nothing removed.");
        }
        RemoveOutcome::Removed { path, bytes } => {
            println!("Removed {} ({}).", path.display(), format_size(bytes));
            println!("The registry entry is kept; run `manage-models pull {model}` to restore it.");
        }
    }

    Ok(())
}
