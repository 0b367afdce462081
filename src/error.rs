#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed document: {0}")]
    Format(#[from] serde_json::Error),
    #[error("a folder named '{0}' already exists")]
    DuplicateName(String),
    #[error("invalid name: {0:?}")]
    InvalidName(String),
    #[error("no folder with id {0}")]
    UnknownFolder(String),
    #[error("no request with id {0}")]
    UnknownRequest(String),
    #[error("no environment at index {0}")]
    UnknownEnvironment(usize),
    #[error("no collection loaded")]
    NoCollection,
    #[error("no request selected")]
    NoSelection,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
    #[error("{0}")]
    ExternalService(String),
    #[error("collection run timed out")]
    Timeout,
}

pub type Result<T> = std::result::Result<T, Error>;
