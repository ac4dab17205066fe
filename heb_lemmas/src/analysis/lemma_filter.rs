use std::mem;
use std::vec;

use log::debug;

use super::{Token, TokenStream};
use crate::lemma::{Lemmas, Lemmatize};

enum State {
    /// Nothing has been pulled from the input yet.
    Empty,
    /// Lemmas of the buffered stream waiting to be emitted.
    Emitting(vec::IntoIter<String>),
    Exhausted,
}

/// Replaces every token of a stream with its lemma.
///
/// On the first [`advance`](TokenStream::advance) the whole input is buffered and
/// lemmatized in a single call; the lemmas are then emitted one per pull. Every
/// emitted token carries the span and type of the last token pulled from the
/// input.
pub struct LemmaFilter<S, L> {
    input: S,
    lemmatizer: L,
    state: State,
    token: Token,
}

impl<S, L> LemmaFilter<S, L>
where
    S: TokenStream,
    L: Lemmatize,
{
    pub fn new(input: S, lemmatizer: L) -> Self {
        LemmaFilter {
            input,
            lemmatizer,
            state: State::Empty,
            token: Token::default(),
        }
    }

    pub fn get_ref(&self) -> &S {
        &self.input
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.input
    }

    pub fn into_inner(self) -> S {
        self.input
    }

    fn buffer(&mut self) -> Vec<String> {
        let mut forms = Vec::new();
        while self.input.advance() {
            let pulled = self.input.token();
            forms.push(pulled.text.clone());
            self.token.clone_from(pulled);
        }
        forms
    }

    fn emit(&mut self) -> bool {
        let next = match &mut self.state {
            State::Emitting(lemmas) => lemmas.next(),
            _ => None,
        };

        match next {
            Some(lemma) => {
                self.token.text = lemma;
                self.token.position_increment = 1;
                true
            }
            None => {
                self.state = State::Exhausted;
                false
            }
        }
    }
}

impl<S, L> TokenStream for LemmaFilter<S, L>
where
    S: TokenStream,
    L: Lemmatize,
{
    fn advance(&mut self) -> bool {
        match mem::replace(&mut self.state, State::Exhausted) {
            State::Empty => {
                let forms = self.buffer();
                if forms.is_empty() {
                    return false;
                }

                let lemmas = match self.lemmatizer.lemmatize(&forms) {
                    Lemmas::Lemmatized(lemmas) => lemmas,
                    Lemmas::Degraded { lemmas, reason } => {
                        debug!("Emitting surface forms: {}", reason);
                        lemmas
                    }
                };
                self.state = State::Emitting(lemmas.into_iter());
                self.emit()
            }
            state @ State::Emitting(_) => {
                self.state = state;
                self.emit()
            }
            State::Exhausted => false,
        }
    }

    fn token(&self) -> &Token {
        &self.token
    }

    fn token_mut(&mut self) -> &mut Token {
        &mut self.token
    }

    fn reset(&mut self) {
        self.input.reset();
        self.state = State::Empty;
        self.token = Token::default();
    }
}
