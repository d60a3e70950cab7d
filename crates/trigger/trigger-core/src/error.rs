use thiserror::Error;

#[derive(Error, Debug)]
pub enum TriggerError {
    #[error("Duplicate entry id: {0}")]
    DuplicateEntryId(String),

    #[error("Invalid entry {id}: {reason}")]
    InvalidEntry { id: String, reason: String },

    #[error("Similarity error: {0}")]
    Similarity(#[source] anyhow::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Repository error: {0}")]
    Repository(#[source] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, TriggerError>;
