use thiserror::Error;

/// Errors surfaced by bound parsing, factorization and configuration.
///
/// Size mismatches between populations, worths and distributions are not
/// represented here: they are programming errors and panic.
#[derive(Error, Debug)]
pub enum EdoError {
    #[error("Syntax error when reading bounds: {message} (in {input:?})")]
    Syntax { message: String, input: String },

    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl EdoError {
    pub(crate) fn syntax(message: impl Into<String>, input: &str) -> Self {
        EdoError::Syntax {
            message: message.into(),
            input: input.to_string(),
        }
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self, EdoError::Syntax { .. })
    }

    pub fn is_numerical(&self) -> bool {
        matches!(self, EdoError::Numerical(_))
    }
}

pub type Result<T> = std::result::Result<T, EdoError>;
