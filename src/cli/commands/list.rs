//! `lockguardium list` — display credentials in a table.

use crate::cli::output;
use crate::cli::{open_vault, Cli};
use crate::errors::Result;
use crate::vault::RecordSort;

/// Execute the `list` command.
pub fn execute(cli: &Cli, search: Option<&str>, sort: Option<&str>) -> Result<()> {
    // Parse the sort first so a typo doesn't cost a password prompt.
    let sort = sort.map(str::parse::<RecordSort>).transpose()?;

    let store = open_vault(cli)?;

    let mut records = match sort {
        Some(sort) => store.sorted_records(sort),
        None => store.list_records().to_vec(),
    };
    if let Some(query) = search {
        records.retain(|r| r.matches(query.trim()));
    }

    output::info(&format!(
        "{} of {} credential(s)",
        records.len(),
        store.len()
    ));
    output::print_records_table(&records);

    Ok(())
}
