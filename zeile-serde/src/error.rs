use std::fmt::Display;
use serde::{de, ser};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Zeile(#[from] zeile::Error),
    #[error("json conversion failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("map keys must be strings")]
    KeyType,
    #[error("expected a record at the top level, found {0}")]
    NotARecord(&'static str),
    #[error("field {field}: {value:?} is not a valid {expected}")]
    Parse { field: String, expected: &'static str, value: String },
    #[error("{0}")]
    Message(String),
}

impl ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl de::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}
