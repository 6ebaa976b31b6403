mod migrate;

pub use migrate::migrate;

use std::path::PathBuf;

/// Global options threaded through every subcommand.
pub struct Options {
    pub directives_path: PathBuf,
    pub introspection_path: Option<PathBuf>,
    pub dialect: schemaforge::Dialect,
    pub ignored_extensions: Vec<String>,
    pub enable_color: bool,
    pub json: bool,
}
