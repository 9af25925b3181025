/// Error type for the keycalc crate
///
/// The calculator keys themselves never fail: unknown symbols and missing
/// operands are ignored. Errors only come from decoding outside data.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Stored program could not be decoded
    #[error("PersistenceError: {0}")]
    Persistence(String),
    /// Formatter configuration could not be decoded
    #[error("ConfigError: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Persistence(error.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Self::Config(error.to_string())
    }
}
