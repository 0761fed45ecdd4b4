use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Schema error: {0}")]
    Schema(String),
    #[error("Encoding error: {0}")]
    Encoding(String),
    #[error("Unknown type: {0}, add it to the embedded message table")]
    UnknownType(String),
    #[error("Account state error: {0}")]
    AccountState(String),
    #[error("Signature failure: {0}")]
    SignatureFailure(String),
    #[error("Invalid private key: {0}")]
    InvalidKey(String),
    #[error("Json parse error: {0}")]
    JsonParse(String),
    #[error("Http error: {0}")]
    Http(String),
    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
