use super::Vocab;

/// Prefix marking a piece that continues a word.
pub const CONTINUATION_PREFIX: &str = "##";

/// Words longer than this many characters are encoded as a single unknown id.
pub const MAX_CHARS_PER_WORD: usize = 100;

/// Greedy longest-match WordPiece segmentation of single words.
#[derive(Debug, Clone)]
pub struct WordPieceTokenizer {
    vocab: Vocab,
    max_chars_per_word: usize,
}

impl WordPieceTokenizer {
    pub fn new(vocab: Vocab) -> Self {
        WordPieceTokenizer {
            vocab,
            max_chars_per_word: MAX_CHARS_PER_WORD,
        }
    }

    pub fn with_max_chars_per_word(mut self, max_chars_per_word: usize) -> Self {
        self.max_chars_per_word = max_chars_per_word;
        self
    }

    pub fn vocab(&self) -> &Vocab {
        &self.vocab
    }

    /// Encodes one surface word into vocabulary ids.
    ///
    /// The empty word yields no ids. Whenever no piece matches at the current
    /// position, the unknown id is emitted and the rest of the word is dropped.
    pub fn encode(&self, word: &str) -> Vec<u32> {
        if word.is_empty() {
            return Vec::new();
        }

        if let Some(id) = self.vocab.get(word) {
            return vec![id];
        }

        // byte offsets of every char boundary, including the end of the word
        let bounds: Vec<usize> = word
            .char_indices()
            .map(|(idx, _)| idx)
            .chain(Some(word.len()))
            .collect();
        let n_chars = bounds.len() - 1;

        if n_chars > self.max_chars_per_word {
            return vec![self.vocab.unk_id()];
        }

        let mut ids = Vec::new();
        let mut candidate = String::with_capacity(word.len() + CONTINUATION_PREFIX.len());
        let mut start = 0;
        while start < n_chars {
            let mut end = n_chars;
            let mut matched = None;
            while start < end {
                candidate.clear();
                if start > 0 {
                    candidate.push_str(CONTINUATION_PREFIX);
                }
                candidate.push_str(&word[bounds[start]..bounds[end]]);
                if let Some(id) = self.vocab.get(&candidate) {
                    matched = Some(id);
                    break;
                }
                end -= 1;
            }

            match matched {
                Some(id) => {
                    ids.push(id);
                    start = end;
                }
                None => {
                    ids.push(self.vocab.unk_id());
                    break;
                }
            }
        }

        ids
    }
}
