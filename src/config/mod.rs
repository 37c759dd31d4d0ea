//! Configuration module.
//!
//! Settings live in `<data_dir>/lockguardium.toml`; every field has a
//! default, so the file is optional.

pub mod settings;

use std::path::PathBuf;

pub use settings::Settings;

/// Directory name used under the platform data directory.
pub const APP_DIR_NAME: &str = "lockguardium";

/// Default data directory: `<platform data dir>/lockguardium`.
///
/// Falls back to `./.lockguardium` on platforms without a data directory.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir().map_or_else(
        || PathBuf::from(format!(".{APP_DIR_NAME}")),
        |dir| dir.join(APP_DIR_NAME),
    )
}
