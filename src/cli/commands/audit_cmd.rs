//! `lockguardium audit` — display the audit log.
//!
//! Usage:
//!   lockguardium audit               # show last 50 entries
//!   lockguardium audit --last 20     # show last 20
//!   lockguardium audit --since 7d    # entries from last 7 days

use chrono::Utc;

use crate::audit::{AuditEntry, AuditLog};
use crate::cli::output;
use crate::cli::Cli;
use crate::errors::{Result, VaultError};

/// Execute the `audit` command.
pub fn execute(cli: &Cli, last: usize, since: Option<&str>) -> Result<()> {
    let audit = AuditLog::open(&cli.resolve_data_dir())
        .ok_or_else(|| VaultError::AuditError("failed to open audit database".into()))?;

    let since_dt = match since {
        Some(s) => Some(parse_duration(s)?),
        None => None,
    };

    let entries = audit.query(last, since_dt)?;

    if entries.is_empty() {
        output::info("No audit entries found.");
        return Ok(());
    }

    print_audit_table(&entries);

    Ok(())
}

/// Parse a human-friendly duration string like "7d", "24h", "30m" into
/// the point in time that far back.
fn parse_duration(input: &str) -> Result<chrono::DateTime<Utc>> {
    let input = input.trim();
    let invalid = || {
        VaultError::CommandFailed(format!(
            "invalid duration '{input}' (use a format like 7d, 24h or 30m)"
        ))
    };

    let (num_str, to_duration): (&str, fn(i64) -> Option<chrono::Duration>) =
        if let Some(s) = input.strip_suffix('d') {
            (s, chrono::Duration::try_days)
        } else if let Some(s) = input.strip_suffix('h') {
            (s, chrono::Duration::try_hours)
        } else if let Some(s) = input.strip_suffix('m') {
            (s, chrono::Duration::try_minutes)
        } else {
            return Err(invalid());
        };

    let num: i64 = num_str.parse().map_err(|_| invalid())?;
    let duration = to_duration(num).ok_or_else(invalid)?;

    Utc::now().checked_sub_signed(duration).ok_or_else(invalid)
}

/// Print audit entries in a formatted table.
pub fn print_audit_table(entries: &[AuditEntry]) {
    use comfy_table::{ContentArrangement, Table};
    use console::style;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Time", "Operation", "Record", "Details"]);

    for entry in entries {
        let time = entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string();
        let op = colorize_operation(&entry.operation);
        let record = entry
            .record_id
            .map_or_else(|| "-".to_string(), |id| format!("#{id}"));
        let details = entry.details.as_deref().unwrap_or("-");

        table.add_row(vec![time, op, record, details.to_string()]);
    }

    println!(
        "{}",
        style(format!("{} audit entries:", entries.len())).bold()
    );
    println!("{table}");
}

/// Colorize operation names for display.
fn colorize_operation(op: &str) -> String {
    use console::style;

    match op {
        "init" | "add" => style(op).green().to_string(),
        "update" | "show" => style(op).blue().to_string(),
        "delete" | "unlock-failed" => style(op).red().to_string(),
        "change-password" | "auto-lock" => style(op).yellow().to_string(),
        "export" | "import" => style(op).cyan().to_string(),
        _ => op.to_string(),
    }
}
