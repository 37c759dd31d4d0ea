//! `lockguardium update` — change fields of an existing credential.

use crate::cli::output;
use crate::cli::{log_audit, open_vault, Cli};
use crate::errors::{Result, VaultError};
use crate::vault::RecordUpdate;

/// Execute the `update` command.
pub fn execute(cli: &Cli, id: u64, update: RecordUpdate) -> Result<()> {
    if update.is_empty() {
        return Err(VaultError::CommandFailed(
            "nothing to update: pass at least one of --service, --email, --username, --password"
                .into(),
        ));
    }

    let mut store = open_vault(cli)?;
    let record = store.update_record(id, &update)?;

    let changed: Vec<&str> = [
        ("service", update.service.is_some()),
        ("email", update.account_email.is_some()),
        ("username", update.username.is_some()),
        ("password", update.secret.is_some()),
    ]
    .into_iter()
    .filter_map(|(name, set)| set.then_some(name))
    .collect();

    log_audit(cli, "update", Some(id), Some(&changed.join(",")));
    output::success(&format!("Updated #{} {}", record.id, record.service));

    Ok(())
}
