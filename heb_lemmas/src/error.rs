use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading resources or running the lemmatizer.
#[derive(Debug, Error)]
pub enum Error {
    /// The tokenizer description is unreadable, malformed or lacks `model.vocab`.
    #[error("cannot load vocabulary from {path}: {reason}")]
    VocabLoad { path: PathBuf, reason: String },

    /// Any failure while bringing up the process-wide session.
    #[error("lemmatizer session initialization failed: {0}")]
    SessionInit(#[source] Box<Error>),

    /// The scoring engine failed or returned an output of unexpected shape.
    #[error("inference failed: {0}")]
    Inference(String),

    /// A vocabulary id outside of `0..size` was decoded.
    #[error("vocabulary id {id} is out of range for a vocabulary of size {size}")]
    Tokenization { id: u32, size: usize },

    #[error("cannot read configuration {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("model resource {path}: {reason}")]
    Resource { path: PathBuf, reason: String },

    #[error("remote lemma service: {0}")]
    Remote(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn vocab_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::VocabLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn inference(reason: impl ToString) -> Self {
        Error::Inference(reason.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
