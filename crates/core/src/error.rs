#[derive(Debug, thiserror::Error)]
pub enum OciError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid billing period: {0}")]
    InvalidPeriod(String),
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(#[from] oci_types::IdError),
    #[error("failed to read settings file: {0}")]
    ConfigRead(std::io::Error),
    #[error("failed to parse settings YAML: {0}")]
    ConfigParse(serde_yaml::Error),
}

pub type OciResult<T> = std::result::Result<T, OciError>;
