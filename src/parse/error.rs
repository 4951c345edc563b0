use thiserror::Error;

/// Errors produced when loading a rule document.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The input is not TOML, or does not follow the `[[tag]]` layout.
    #[error("rule load error: {0}")]
    Toml(#[from] toml::de::Error),
}
