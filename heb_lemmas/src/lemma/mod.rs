use std::sync::Arc;

use crate::analysis::Token;
use crate::Error;

mod lemmatizer;
pub use self::lemmatizer::{Assembler, Batch, Lemmatizer};

#[cfg(feature = "onnx")]
mod onnx;
#[cfg(feature = "onnx")]
pub use self::onnx::OnnxScorer;

mod remote;
pub use self::remote::{RemoteLemmatizer, DEFAULT_URL};

mod scorer;
pub use self::scorer::{ScoreMatrix, Scorer};

mod selector;
pub use self::selector::{select_lemma, top_k, WEAK_LETTERS};

mod singleton;
pub use self::singleton::{session, SessionCell, SessionState};

#[cfg(feature = "tensorflow")]
mod tf;
#[cfg(feature = "tensorflow")]
pub use self::tf::TensorflowScorer;

/// Anything that carries a surface form.
pub trait Form {
    fn form(&self) -> &str;
}

impl Form for str {
    fn form(&self) -> &str {
        self
    }
}

impl Form for String {
    fn form(&self) -> &str {
        self.as_str()
    }
}

impl Form for Token {
    fn form(&self) -> &str {
        &self.text
    }
}

impl<'a, T> Form for &'a T
where
    T: Form + ?Sized,
{
    fn form(&self) -> &str {
        (**self).form()
    }
}

/// Result of one lemmatization call.
///
/// Both variants hold exactly one string per input token, in input order.
#[derive(Debug)]
pub enum Lemmas {
    Lemmatized(Vec<String>),
    /// The lemmatizer failed; `lemmas` are the unchanged surface forms.
    Degraded { lemmas: Vec<String>, reason: Error },
}

impl Lemmas {
    /// Falls back to the surface forms of `tokens`.
    pub fn degraded<F: Form>(tokens: &[F], reason: Error) -> Self {
        Lemmas::Degraded {
            lemmas: tokens.iter().map(|t| t.form().to_owned()).collect(),
            reason,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Lemmas::Degraded { .. })
    }

    pub fn as_slice(&self) -> &[String] {
        match self {
            Lemmas::Lemmatized(lemmas) | Lemmas::Degraded { lemmas, .. } => lemmas,
        }
    }

    pub fn into_vec(self) -> Vec<String> {
        match self {
            Lemmas::Lemmatized(lemmas) | Lemmas::Degraded { lemmas, .. } => lemmas,
        }
    }
}

/// Trait for lemmatization strategies.
pub trait Lemmatize {
    /// Lemmatizes all tokens of one stream in a single call.
    fn lemmatize<F: Form>(&self, tokens: &[F]) -> Lemmas;
}

impl<L> Lemmatize for &L
where
    L: Lemmatize + ?Sized,
{
    fn lemmatize<F: Form>(&self, tokens: &[F]) -> Lemmas {
        (**self).lemmatize(tokens)
    }
}

impl<L> Lemmatize for Arc<L>
where
    L: Lemmatize + ?Sized,
{
    fn lemmatize<F: Form>(&self, tokens: &[F]) -> Lemmas {
        (**self).lemmatize(tokens)
    }
}
