//! One module per subcommand.  Each exposes an `execute` function that
//! `main` dispatches to.

pub mod add;
#[cfg(feature = "audit-log")]
pub mod audit_cmd;
pub mod change_password;
pub mod completions;
pub mod delete;
pub mod export;
pub mod generate;
pub mod import_cmd;
pub mod init;
pub mod list;
pub mod shell;
pub mod show;
pub mod strength;
pub mod update;
pub mod version;
