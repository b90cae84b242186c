//! Rendering of records and ids for the terminal.

use anyhow::Result;

use crate::models::Record;

/// Render records one per line as `<id>: <compact json>`.
///
/// Records without a string `id` field print `-` in the id column.
pub fn print_text(records: &[Record]) -> Result<()> {
    for record in records {
        println!(
            "{}: {}",
            record.id().unwrap_or("-"),
            serde_json::to_string(record)?
        );
    }
    Ok(())
}

/// Render records as a JSON array on stdout.
pub fn print_json(records: &[Record]) -> Result<()> {
    serde_json::to_writer(std::io::stdout(), records)?;
    println!();
    Ok(())
}

/// Render record ids one per line.
pub fn print_ids_text(ids: &[String]) {
    for id in ids {
        println!("{id}");
    }
}

/// Render record ids as a JSON array on stdout.
pub fn print_ids_json(ids: &[String]) -> Result<()> {
    serde_json::to_writer(std::io::stdout(), ids)?;
    println!();
    Ok(())
}
