//! `lockguardium add` — store a new credential.

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{log_audit, open_vault, prompt_secret, Cli};
use crate::errors::Result;
use crate::generator::{generate_password, GeneratorOptions};
use crate::vault::NewRecord;

/// Execute the `add` command.
pub fn execute(
    cli: &Cli,
    service: &str,
    email: &str,
    username: &str,
    password: Option<&str>,
    generate: bool,
) -> Result<()> {
    let mut store = open_vault(cli)?;

    // Pick the secret: flag, generated, or prompted.
    let secret = match (password, generate) {
        (Some(pw), _) => Zeroizing::new(pw.to_string()),
        (None, true) => {
            let options = GeneratorOptions {
                length: cli.settings()?.generator_length,
                ..GeneratorOptions::default()
            };
            Zeroizing::new(generate_password(&options)?)
        }
        (None, false) => prompt_secret(&format!("Password for {service}"))?,
    };

    let record = store.add_record(&NewRecord::new(service, email, username, &secret))?;

    log_audit(cli, "add", Some(record.id), Some(&record.service));
    output::success(&format!(
        "Added #{} {} ({} credential(s) in vault)",
        record.id,
        record.service,
        store.len()
    ));
    if generate {
        output::tip("Run `lockguardium show <ID>` to see the generated password.");
    }

    Ok(())
}
