//! Password generation and strength scoring.
//!
//! Both are stateless and never touch the vault.

use rand::seq::{IndexedRandom, SliceRandom};

use crate::errors::{Result, VaultError};

const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";

/// Characters counted as "special" by both the generator and the scorer.
pub const SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Longest password `generate_password` will produce.
pub const MAX_LENGTH: usize = 256;

/// Which character classes a generated password draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub length: usize,
    pub uppercase: bool,
    pub lowercase: bool,
    pub digits: bool,
    pub symbols: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            length: 16,
            uppercase: true,
            lowercase: true,
            digits: true,
            symbols: true,
        }
    }
}

impl GeneratorOptions {
    fn classes(&self) -> Vec<&'static [u8]> {
        let mut classes = Vec::with_capacity(4);
        if self.uppercase {
            classes.push(UPPERCASE);
        }
        if self.lowercase {
            classes.push(LOWERCASE);
        }
        if self.digits {
            classes.push(DIGITS);
        }
        if self.symbols {
            classes.push(SPECIAL_CHARS.as_bytes());
        }
        classes
    }
}

/// Generate a random password.
///
/// Every enabled class contributes at least one character; the rest are
/// drawn from the union of enabled classes and the result is shuffled.
pub fn generate_password(options: &GeneratorOptions) -> Result<String> {
    let classes = options.classes();
    if classes.is_empty() {
        return Err(VaultError::ValidationError(
            "enable at least one character class".into(),
        ));
    }
    if options.length < classes.len() || options.length > MAX_LENGTH {
        return Err(VaultError::ValidationError(format!(
            "length must be between {} and {MAX_LENGTH} for the selected classes",
            classes.len()
        )));
    }

    let pool: Vec<u8> = classes.iter().flat_map(|c| c.iter().copied()).collect();
    let mut rng = rand::rng();

    let mut chars: Vec<u8> = Vec::with_capacity(options.length);
    for class in &classes {
        if let Some(&c) = class.choose(&mut rng) {
            chars.push(c);
        }
    }
    while chars.len() < options.length {
        if let Some(&c) = pool.choose(&mut rng) {
            chars.push(c);
        }
    }
    chars.shuffle(&mut rng);

    // Every byte comes from an ASCII table.
    String::from_utf8(chars).map_err(|e| VaultError::CommandFailed(e.to_string()))
}

/// Coarse strength buckets shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StrengthLevel {
    /// Empty input.
    None,
    Weak,
    Medium,
    Good,
    Strong,
}

impl StrengthLevel {
    /// Fill fraction for a progress bar.
    pub fn progress(self) -> f32 {
        match self {
            Self::None => 0.0,
            Self::Weak => 0.25,
            Self::Medium => 0.5,
            Self::Good => 0.75,
            Self::Strong => 1.0,
        }
    }
}

impl std::fmt::Display for StrengthLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::None => "None",
            Self::Weak => "Weak",
            Self::Medium => "Medium",
            Self::Good => "Good",
            Self::Strong => "Strong",
        };
        f.write_str(name)
    }
}

/// Result of `calculate_strength`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strength {
    pub level: StrengthLevel,
    /// Raw score, 0..=7.
    pub score: u8,
    pub tips: Vec<&'static str>,
}

/// Score a password: one point each for reaching 8, 12 and 16 characters
/// and one for each character class present.
pub fn calculate_strength(password: &str) -> Strength {
    if password.is_empty() {
        return Strength {
            level: StrengthLevel::None,
            score: 0,
            tips: Vec::new(),
        };
    }

    let len = password.chars().count();
    let mut score = 0u8;
    let mut tips = Vec::new();

    if len >= 8 {
        score += 1;
    } else {
        tips.push("Use at least 8 characters");
    }
    if len >= 12 {
        score += 1;
    } else {
        tips.push("Use 12+ characters for better security");
    }
    if len >= 16 {
        score += 1;
    }

    let checks: [(bool, &'static str); 4] = [
        (
            password.chars().any(char::is_uppercase),
            "Add uppercase letters (A-Z)",
        ),
        (
            password.chars().any(char::is_lowercase),
            "Add lowercase letters (a-z)",
        ),
        (
            password.chars().any(|c| c.is_ascii_digit()),
            "Add numbers (0-9)",
        ),
        (
            password.chars().any(|c| SPECIAL_CHARS.contains(c)),
            "Add special characters (!@#$%)",
        ),
    ];
    for (present, tip) in checks {
        if present {
            score += 1;
        } else {
            tips.push(tip);
        }
    }

    let level = match score {
        0..=2 => StrengthLevel::Weak,
        3..=4 => StrengthLevel::Medium,
        5..=6 => StrengthLevel::Good,
        _ => StrengthLevel::Strong,
    };

    if level == StrengthLevel::Strong {
        tips.truncate(1);
        if tips.is_empty() {
            tips.push("Great password!");
        }
    }

    Strength { level, score, tips }
}
