use chainsmith::core::models::error::ModelError;
use chainsmith::core::patterns::pattern::PatternError;
use chainsmith::engine::error::AssemblyError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error("Recipe error: {0}")]
    Recipe(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    Argument(String),
}
