//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::generator::{Strength, StrengthLevel};
use crate::vault::CredentialRecord;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print a table of records (ID, Service, Email, Username, Modified).
///
/// Passwords are never shown in tables; use `show` for that.
pub fn print_records_table(records: &[CredentialRecord]) {
    if records.is_empty() {
        info("No credentials found.");
        tip("Run `lockguardium add --service <NAME>` to add one.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "Service", "Email", "Username", "Modified"]);

    for r in records {
        table.add_row(vec![
            r.id.to_string(),
            r.service.clone(),
            or_dash(&r.account_email),
            or_dash(&r.username),
            r.modified_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }

    println!("{table}");
}

/// Print every field of one record, password included.
pub fn print_record_detail(record: &CredentialRecord) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec!["ID".to_string(), record.id.to_string()]);
    table.add_row(vec!["Service".to_string(), record.service.clone()]);
    table.add_row(vec!["Email".to_string(), or_dash(&record.account_email)]);
    table.add_row(vec!["Username".to_string(), or_dash(&record.username)]);
    table.add_row(vec!["Password".to_string(), record.secret.clone()]);
    table.add_row(vec![
        "Created".to_string(),
        record.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    ]);
    table.add_row(vec![
        "Modified".to_string(),
        record.modified_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    ]);

    println!("{table}");
}

/// Print a strength rating with its tips, colored by level.
pub fn print_strength(strength: &Strength) {
    let label = match strength.level {
        StrengthLevel::None => style(strength.level.to_string()).dim(),
        StrengthLevel::Weak => style(strength.level.to_string()).red().bold(),
        StrengthLevel::Medium => style(strength.level.to_string()).yellow().bold(),
        StrengthLevel::Good => style(strength.level.to_string()).cyan().bold(),
        StrengthLevel::Strong => style(strength.level.to_string()).green().bold(),
    };
    let filled = (strength.level.progress() * 20.0).round() as usize;
    println!(
        "Strength: {label} [{}{}]",
        "#".repeat(filled),
        "-".repeat(20 - filled)
    );
    for t in &strength.tips {
        tip(t);
    }
}

fn or_dash(value: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}
