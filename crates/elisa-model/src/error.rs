use thiserror::Error;

#[derive(Debug, Error)]
pub enum ElisaError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(String),
    #[error("malformed plate export: {0}")]
    MalformedPlate(String),
    #[error("serotype {serotype:?} not found in {table} table")]
    UnknownSerotype {
        table: &'static str,
        serotype: String,
    },
    #[error("{0}")]
    Message(String),
}

pub type Result<T> = std::result::Result<T, ElisaError>;
