use log::debug;

use super::{Token, TokenStream};
use crate::stopwords::is_stopword;

/// Drops stopwords from a stream.
///
/// The position increments of dropped tokens are added to the next token that
/// is kept, so phrase positions stay intact.
pub struct StopwordFilter<S> {
    input: S,
}

impl<S> StopwordFilter<S>
where
    S: TokenStream,
{
    pub fn new(input: S) -> Self {
        StopwordFilter { input }
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.input
    }

    pub fn into_inner(self) -> S {
        self.input
    }
}

impl<S> TokenStream for StopwordFilter<S>
where
    S: TokenStream,
{
    fn advance(&mut self) -> bool {
        let mut skipped = 0;
        while self.input.advance() {
            let token = self.input.token_mut();
            if !is_stopword(&token.text) {
                token.position_increment += skipped;
                return true;
            }
            debug!("Dropping stopword {}", token.text);
            skipped += token.position_increment;
        }
        false
    }

    fn token(&self) -> &Token {
        self.input.token()
    }

    fn token_mut(&mut self) -> &mut Token {
        self.input.token_mut()
    }

    fn reset(&mut self) {
        self.input.reset()
    }
}
