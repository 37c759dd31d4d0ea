use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lockguardium::cli::commands;
use lockguardium::cli::commands::generate::ClassFlags;
use lockguardium::cli::{Cli, Commands};
use lockguardium::vault::RecordUpdate;

/// Diagnostics go to stderr, filtered by `LOCKGUARDIUM_LOG` (default `warn`).
fn init_logging() {
    let filter = EnvFilter::try_from_env("LOCKGUARDIUM_LOG")
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .with(filter)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => commands::init::execute(&cli),
        Commands::Add {
            ref service,
            ref email,
            ref username,
            ref password,
            generate,
        } => commands::add::execute(
            &cli,
            service,
            email,
            username,
            password.as_deref(),
            generate,
        ),
        Commands::Show { id } => commands::show::execute(&cli, id),
        Commands::List {
            ref search,
            ref sort,
        } => commands::list::execute(&cli, search.as_deref(), sort.as_deref()),
        Commands::Update {
            id,
            ref service,
            ref email,
            ref username,
            ref password,
        } => {
            let update = RecordUpdate {
                service: service.clone(),
                account_email: email.clone(),
                username: username.clone(),
                secret: password.clone(),
            };
            commands::update::execute(&cli, id, update)
        }
        Commands::Delete { id, force } => commands::delete::execute(&cli, id, force),
        Commands::ChangePassword => commands::change_password::execute(&cli),
        Commands::Export { ref dir } => commands::export::execute(&cli, dir),
        Commands::Import { ref dir, force } => commands::import_cmd::execute(&cli, dir, force),
        Commands::Shell => commands::shell::execute(&cli),
        Commands::Generate {
            length,
            no_uppercase,
            no_lowercase,
            no_digits,
            no_symbols,
        } => commands::generate::execute(
            &cli,
            length,
            ClassFlags {
                no_uppercase,
                no_lowercase,
                no_digits,
                no_symbols,
            },
        ),
        Commands::Strength { ref password } => commands::strength::execute(password.as_deref()),
        #[cfg(feature = "audit-log")]
        Commands::Audit { last, ref since } => {
            commands::audit_cmd::execute(&cli, last, since.as_deref())
        }
        #[cfg(not(feature = "audit-log"))]
        Commands::Audit { .. } => Err(lockguardium::errors::VaultError::AuditError(
            "built without the audit-log feature".into(),
        )),
        Commands::Completions { shell } => commands::completions::execute(shell),
        Commands::Version => commands::version::execute(),
    };

    if let Err(e) = result {
        lockguardium::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
