//! Hebrew lemmatization for search-engine analysis chains.
//!
//! Every token of a stream is mapped to its dictionary form. The local
//! [`Lemmatizer`] segments tokens into WordPiece units, scores the whole stream
//! with a masked-language model and keeps the best-ranked vocabulary entry that
//! shares enough letters with the surface form. [`RemoteLemmatizer`] delegates
//! to an HTTP lemma service instead.
//!
//! Example usage:
//!
//! ```no_run
//! use heb_lemmas::analysis::{LemmaFilter, StopwordFilter, TokenStream, WhitespaceTokenizer};
//!
//! // the process-wide lemmatizer, loaded on first use
//! let lemmatizer = heb_lemmas::session().expect("Cannot load the lemmatizer");
//!
//! let input = WhitespaceTokenizer::new("הילדים הלכו לבית הספר");
//! let mut stream = StopwordFilter::new(LemmaFilter::new(input, lemmatizer));
//! while stream.advance() {
//!     println!("{:?}", stream.token());
//! }
//! ```

pub mod analysis;

mod error;
pub use crate::error::{Error, Result};

mod lemma;
pub use crate::lemma::{
    select_lemma, session, top_k, Assembler, Batch, Form, Lemmas, Lemmatize, Lemmatizer,
    RemoteLemmatizer, ScoreMatrix, Scorer, SessionCell, SessionState, DEFAULT_URL, WEAK_LETTERS,
};
#[cfg(feature = "onnx")]
pub use crate::lemma::OnnxScorer;
#[cfg(feature = "tensorflow")]
pub use crate::lemma::TensorflowScorer;

pub mod stopwords;

mod util;
pub use crate::util::{debug_enabled, resources, Backend, Config, Ops, Remote, DEBUG_VAR};

mod vocab;
pub use crate::vocab::{Vocab, WordPieceTokenizer, CONTINUATION_PREFIX, MAX_CHARS_PER_WORD};
