//! `lockguardium generate` — print a random password.

use crate::cli::output;
use crate::cli::Cli;
use crate::errors::Result;
use crate::generator::{calculate_strength, generate_password, GeneratorOptions};

/// Character-class switches from the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassFlags {
    pub no_uppercase: bool,
    pub no_lowercase: bool,
    pub no_digits: bool,
    pub no_symbols: bool,
}

/// Execute the `generate` command.
pub fn execute(cli: &Cli, length: Option<usize>, flags: ClassFlags) -> Result<()> {
    let length = match length {
        Some(length) => length,
        None => cli.settings()?.generator_length,
    };

    let options = GeneratorOptions {
        length,
        uppercase: !flags.no_uppercase,
        lowercase: !flags.no_lowercase,
        digits: !flags.no_digits,
        symbols: !flags.no_symbols,
    };
    let password = zeroize::Zeroizing::new(generate_password(&options)?);

    // The password alone goes to stdout so it can be piped.
    println!("{}", password.as_str());

    let strength = calculate_strength(&password);
    output::info(&format!("Strength: {}", strength.level));

    Ok(())
}
