use thiserror::Error;
#[derive(Debug, Error)]
pub enum VizError {
    #[error("i/o error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Programmer error in a binning or layer setup; never a data error.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("WebAssembly error: {0}")]
    Wasm(String),
}
