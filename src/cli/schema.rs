//! CLI entry-point for printing the record schema.

use anyhow::Result;

use crate::config::Settings;

pub fn run(settings: Settings) -> Result<()> {
    let schema = settings.record_schema()?;
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
