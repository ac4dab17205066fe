//! Token streams as handed around by a search-engine analysis chain.
//!
//! A [`TokenStream`] is pulled one token at a time with [`TokenStream::advance`];
//! filters wrap another stream and rewrite, drop or replace its tokens.

mod lemma_filter;
pub use self::lemma_filter::LemmaFilter;

mod stop_filter;
pub use self::stop_filter::StopwordFilter;

/// Type tag given to tokens by [`WhitespaceTokenizer`].
pub const WORD_TYPE: &str = "word";

/// A term with its source span and attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    /// Byte offset of the first character in the source text.
    pub offset_from: usize,
    /// Byte offset one past the last character.
    pub offset_to: usize,
    pub position_increment: u32,
    /// Opaque type tag, carried through filters unchanged.
    pub kind: String,
}

impl Default for Token {
    fn default() -> Self {
        Token {
            text: String::new(),
            offset_from: 0,
            offset_to: 0,
            position_increment: 1,
            kind: WORD_TYPE.to_string(),
        }
    }
}

pub trait TokenStream {
    /// Moves to the next token, returning `false` once the stream is exhausted.
    fn advance(&mut self) -> bool;

    /// The current token.
    fn token(&self) -> &Token;

    fn token_mut(&mut self) -> &mut Token;

    /// Rewinds the stream so it can be consumed again.
    fn reset(&mut self);

    /// Drains the remaining tokens, calling `sink` on each of them.
    fn process(&mut self, sink: &mut dyn FnMut(&Token)) {
        while self.advance() {
            sink(self.token());
        }
    }
}

impl<S> TokenStream for Box<S>
where
    S: TokenStream + ?Sized,
{
    fn advance(&mut self) -> bool {
        (**self).advance()
    }

    fn token(&self) -> &Token {
        (**self).token()
    }

    fn token_mut(&mut self) -> &mut Token {
        (**self).token_mut()
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

impl<'a, S> TokenStream for &'a mut S
where
    S: TokenStream + ?Sized,
{
    fn advance(&mut self) -> bool {
        (**self).advance()
    }

    fn token(&self) -> &Token {
        (**self).token()
    }

    fn token_mut(&mut self) -> &mut Token {
        (**self).token_mut()
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

/// Splits a text on whitespace.
#[derive(Debug, Clone, Default)]
pub struct WhitespaceTokenizer {
    text: String,
    cursor: usize,
    token: Token,
}

impl WhitespaceTokenizer {
    pub fn new(text: impl Into<String>) -> Self {
        WhitespaceTokenizer {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Replaces the input. Takes effect after the next [`TokenStream::reset`].
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

impl TokenStream for WhitespaceTokenizer {
    fn advance(&mut self) -> bool {
        let rest = &self.text[self.cursor..];
        let start = match rest.find(|c: char| !c.is_whitespace()) {
            Some(idx) => self.cursor + idx,
            None => {
                self.cursor = self.text.len();
                return false;
            }
        };
        let end = self.text[start..]
            .find(char::is_whitespace)
            .map_or(self.text.len(), |idx| start + idx);

        self.token.text.clear();
        self.token.text.push_str(&self.text[start..end]);
        self.token.offset_from = start;
        self.token.offset_to = end;
        self.token.position_increment = 1;
        self.token.kind.clear();
        self.token.kind.push_str(WORD_TYPE);
        self.cursor = end;
        true
    }

    fn token(&self) -> &Token {
        &self.token
    }

    fn token_mut(&mut self) -> &mut Token {
        &mut self.token
    }

    fn reset(&mut self) {
        self.cursor = 0;
        self.token = Token::default();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{Token, TokenStream, WhitespaceTokenizer};

    pub(crate) fn collect<S: TokenStream>(stream: &mut S) -> Vec<Token> {
        let mut tokens = Vec::new();
        stream.process(&mut |token| tokens.push(token.clone()));
        tokens
    }

    pub(crate) fn texts<S: TokenStream>(stream: &mut S) -> Vec<String> {
        collect(stream).into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn splits_on_whitespace() {
        let mut tokenizer = WhitespaceTokenizer::new("  אם נבחר\tלדבר\n");
        let tokens = collect(&mut tokenizer);
        let spans: Vec<_> = tokens
            .iter()
            .map(|t| (t.text.as_str(), t.offset_from, t.offset_to))
            .collect();
        assert_eq!(spans, vec![("אם", 2, 6), ("נבחר", 7, 15), ("לדבר", 16, 24)]);
        assert!(!tokenizer.advance());
    }

    #[test]
    fn blank_text_has_no_tokens() {
        assert!(collect(&mut WhitespaceTokenizer::new(" \n ")).is_empty());
        assert!(collect(&mut WhitespaceTokenizer::default()).is_empty());
    }

    #[test]
    fn reset_rewinds() {
        let mut tokenizer = WhitespaceTokenizer::new("אם נבחר");
        assert_eq!(texts(&mut tokenizer), vec!["אם", "נבחר"]);
        tokenizer.reset();
        assert_eq!(texts(&mut tokenizer), vec!["אם", "נבחר"]);

        tokenizer.set_text("לדבר");
        tokenizer.reset();
        assert_eq!(texts(&mut tokenizer), vec!["לדבר"]);
    }
}
