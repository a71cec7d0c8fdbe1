//! Show model information

use anyhow::Result;
use llamaup_core::format_size;

use super::Settings;

pub async fn execute(settings: &Settings, model: &str) -> Result<()> {
    let status = settings.manager()?.info(model)?;
    let record = &status.record;

    println!("Model: {}", status.name);
    println!("Source: {}", record.source_repo);
    println!("File: {}", record.filename);
    println!("Size: {:.2} GB", record.size_gb);
    println!("Chat template: {}", record.chat_template);
    println!("Added: {}", record.added_date.format("%Y-%m-%d"));
    match &status.path {
        Some(path) => println!("Path: {}", path.display()),
        None => println!("Path: (invalid filename)"),
    }
    match status.size_on_disk {
        Some(bytes) => println!("Status: installed ({})", format_size(bytes)),
        None => println!(
            "Status: not downloaded (run `manage-models pull {}`)",
            status.name
        ),
    }
    println!("URL: {}", status.download_url);

    Ok(())
}
