//! `lockguardium shell` — menu-driven session over one unlock.
//!
//! The vault stays unlocked between actions and locks itself after the
//! configured idle timeout; the next action then asks for the master
//! password again.

use dialoguer::{Confirm, Input, Select};
use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{log_audit, prompt_new_password, prompt_password, prompt_secret, Cli, PASSWORD_ENV};
use crate::config::Settings;
use crate::errors::{Result, VaultError};
use crate::generator::{calculate_strength, generate_password, GeneratorOptions};
use crate::session::{Session, SessionState};
use crate::vault::{NewRecord, RecordSort, RecordUpdate};

/// Failed unlock attempts allowed before the shell exits.
const MAX_UNLOCK_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    List,
    Search,
    Show,
    Add,
    Update,
    Delete,
    Generate,
    ChangePassword,
    Export,
    Lock,
    Quit,
}

const MENU: [(Action, &str); 11] = [
    (Action::List, "List credentials"),
    (Action::Search, "Search"),
    (Action::Show, "Show a credential"),
    (Action::Add, "Add a credential"),
    (Action::Update, "Update a credential"),
    (Action::Delete, "Delete a credential"),
    (Action::Generate, "Generate a password"),
    (Action::ChangePassword, "Change master password"),
    (Action::Export, "Export vault"),
    (Action::Lock, "Lock"),
    (Action::Quit, "Quit"),
];

/// Execute the `shell` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let settings = cli.settings()?;
    let session = Session::new(cli.paths(), &settings)?;

    if session.is_new_user() {
        output::info("No vault found, creating a new one.");
        let password = prompt_new_password(PASSWORD_ENV)?;
        session.unlock(password.as_bytes())?;
        log_audit(cli, "init", None, Some("vault created from shell"));
    } else {
        login(&session, cli)?;
    }

    let count = session.list_records()?.len();
    output::success(&format!("Unlocked ({count} credential(s))"));
    if settings.auto_lock_minutes > 0 {
        output::tip(&format!(
            "The session locks after {} minute(s) of inactivity.",
            settings.auto_lock_minutes
        ));
    }

    let labels: Vec<&str> = MENU.iter().map(|(_, label)| *label).collect();

    loop {
        if session.take_auto_locked() {
            output::warning("Vault locked after inactivity.");
            log_audit(cli, "auto-lock", None, None);
        }
        if session.state() == SessionState::LoggedOut && !relogin(&session, cli)? {
            break;
        }

        let choice = Select::new()
            .with_prompt("lockguardium")
            .items(&labels)
            .default(0)
            .interact_opt()
            .map_err(|e| VaultError::CommandFailed(format!("menu: {e}")))?;

        let Some(index) = choice else { break };
        let action = MENU[index].0;
        if action == Action::Quit {
            break;
        }

        match run_action(action, &session, cli, &settings) {
            Ok(()) => {}
            // Locked while the prompt was open; the loop asks again.
            Err(VaultError::Locked) => {}
            Err(e) => output::error(&e.to_string()),
        }
    }

    session.lock();
    output::info("Vault locked. Bye.");
    Ok(())
}

fn run_action(action: Action, session: &Session, cli: &Cli, settings: &Settings) -> Result<()> {
    match action {
        Action::List => {
            let sort = Select::new()
                .with_prompt("Sort by")
                .items(&["service", "created", "modified"])
                .default(0)
                .interact()
                .map_err(prompt_error)?;
            let sort = ["service", "created", "modified"][sort].parse::<RecordSort>()?;
            output::print_records_table(&session.sorted_records(sort)?);
        }
        Action::Search => {
            let query: String = Input::new()
                .with_prompt("Search")
                .allow_empty(true)
                .interact_text()
                .map_err(prompt_error)?;
            output::print_records_table(&session.search_records(&query)?);
        }
        Action::Show => {
            let id = ask_id()?;
            output::print_record_detail(&session.get_record(id)?);
            log_audit(cli, "show", Some(id), None);
        }
        Action::Add => {
            let service = ask_text("Service", false)?;
            let email = ask_text("Email", true)?;
            let username = ask_text("Username", true)?;
            let secret = ask_secret_or_generate(settings)?;
            let record = session.add_record(&NewRecord::new(&service, &email, &username, &secret))?;
            log_audit(cli, "add", Some(record.id), Some(&record.service));
            output::success(&format!("Added #{} {}", record.id, record.service));
        }
        Action::Update => {
            let id = ask_id()?;
            let current = session.get_record(id)?;
            output::tip("Edit a field in place; clear it to remove the value.");
            let update = RecordUpdate {
                service: changed(&current.service, edit_text("Service", &current.service, false)?),
                account_email: changed(
                    &current.account_email,
                    edit_text("Email", &current.account_email, true)?,
                ),
                username: changed(&current.username, edit_text("Username", &current.username, true)?),
                secret: if confirm("Change the password?")? {
                    Some(ask_secret_or_generate(settings)?.to_string())
                } else {
                    None
                },
            };
            if update.is_empty() {
                output::info("Nothing changed.");
                return Ok(());
            }
            let record = session.update_record(id, &update)?;
            log_audit(cli, "update", Some(id), None);
            output::success(&format!("Updated #{} {}", record.id, record.service));
        }
        Action::Delete => {
            let id = ask_id()?;
            let service = session.get_record(id)?.service.clone();
            if confirm(&format!("Delete #{id} {service}?"))? {
                session.delete_record(id)?;
                log_audit(cli, "delete", Some(id), Some(&service));
                output::success(&format!("Deleted #{id} {service}"));
            }
        }
        Action::Generate => {
            let options = GeneratorOptions {
                length: settings.generator_length,
                ..GeneratorOptions::default()
            };
            let password = Zeroizing::new(generate_password(&options)?);
            session.record_activity();
            println!("{}", password.as_str());
            output::info(&format!("Strength: {}", calculate_strength(&password).level));
        }
        Action::ChangePassword => {
            // Re-authenticate before replacing the password.
            let current = prompt_password()?;
            session.lock();
            session.unlock(current.as_bytes())?;
            let new_password = prompt_new_password(crate::cli::NEW_PASSWORD_ENV)?;
            session.change_password(new_password.as_bytes())?;
            log_audit(cli, "change-password", None, None);
            output::success("Master password changed.");
        }
        Action::Export => {
            let dir = ask_text("Destination directory", false)?;
            session.export_vault(std::path::Path::new(&dir))?;
            session.record_activity();
            log_audit(cli, "export", None, Some(&dir));
            output::success(&format!("Exported vault to {dir}"));
        }
        Action::Lock => {
            session.lock();
            output::info("Vault locked.");
        }
        Action::Quit => {}
    }
    Ok(())
}

/// Prompt for the master password until it unlocks or attempts run out.
fn login(session: &Session, cli: &Cli) -> Result<()> {
    for attempt in 1..=MAX_UNLOCK_ATTEMPTS {
        let password = prompt_password()?;
        match session.unlock(password.as_bytes()) {
            Ok(_) => return Ok(()),
            Err(VaultError::WrongPassword) => {
                log_audit(cli, "unlock-failed", None, None);
                if attempt < MAX_UNLOCK_ATTEMPTS {
                    output::error(&VaultError::WrongPassword.to_string());
                }
            }
            Err(e) => return Err(e),
        }
    }
    Err(VaultError::WrongPassword)
}

/// After a lock: ask whether to continue, then log in again.
fn relogin(session: &Session, cli: &Cli) -> Result<bool> {
    if !confirm("Unlock again?")? {
        return Ok(false);
    }
    login(session, cli)?;
    Ok(true)
}

fn ask_id() -> Result<u64> {
    Input::<u64>::new()
        .with_prompt("Record id")
        .interact_text()
        .map_err(prompt_error)
}

fn ask_text(prompt: &str, allow_empty: bool) -> Result<String> {
    Input::<String>::new()
        .with_prompt(prompt)
        .allow_empty(allow_empty)
        .interact_text()
        .map_err(prompt_error)
}

fn ask_secret_or_generate(settings: &Settings) -> Result<Zeroizing<String>> {
    if confirm("Generate a random password?")? {
        let options = GeneratorOptions {
            length: settings.generator_length,
            ..GeneratorOptions::default()
        };
        return Ok(Zeroizing::new(generate_password(&options)?));
    }
    let secret = prompt_secret("Password")?;
    output::print_strength(&calculate_strength(&secret));
    Ok(secret)
}

fn confirm(prompt: &str) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(prompt_error)
}

/// Prompt with the current value pre-filled for editing.
fn edit_text(prompt: &str, current: &str, allow_empty: bool) -> Result<String> {
    Input::<String>::new()
        .with_prompt(prompt)
        .with_initial_text(current)
        .allow_empty(allow_empty)
        .interact_text()
        .map_err(prompt_error)
}

/// `Some(edited)` only when the field actually changed.
fn changed(current: &str, edited: String) -> Option<String> {
    if edited == current {
        None
    } else {
        Some(edited)
    }
}

fn prompt_error(e: dialoguer::Error) -> VaultError {
    VaultError::CommandFailed(format!("prompt: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_ends_with_quit() {
        assert_eq!(MENU.last().map(|(a, _)| *a), Some(Action::Quit));
    }

    #[test]
    fn unchanged_field_is_not_updated() {
        assert_eq!(changed("GitLab", "GitLab".into()), None);
        assert_eq!(changed("GitLab", "GitHub".into()), Some("GitHub".into()));
    }

    #[test]
    fn cleared_field_is_an_update_to_empty() {
        assert_eq!(changed("me@mail.test", String::new()), Some(String::new()));
        assert_eq!(changed("", String::new()), None);
    }
}
