#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Credentials file error: {0}")]
    CredentialsFileError(String),

    #[error("could not exec {0}: {1}")]
    ExecError(String, #[source] std::io::Error),

    #[error(transparent)]
    StdIoError(#[from] std::io::Error),

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),

    #[error("API Error ({0}): {1}")]
    ApiError(reqwest::StatusCode, String),
}

impl Error {
    /// True for errors raised before any request is sent to STS
    pub fn is_config_error(&self) -> bool {
        matches!(*self, Self::ConfigError(_))
    }
}
