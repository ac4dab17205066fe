use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;

use crate::{Error, Result};

mod wordpiece;
pub use self::wordpiece::{WordPieceTokenizer, CONTINUATION_PREFIX, MAX_CHARS_PER_WORD};

pub const UNK_TOKEN: &str = "[UNK]";
pub const CLS_TOKEN: &str = "[CLS]";
pub const SEP_TOKEN: &str = "[SEP]";

/// Id used for unknown pieces when the vocabulary has no `[UNK]` entry.
const FALLBACK_UNK_ID: u32 = 100;

/// Unassigned id slots tolerated beyond twice the number of pieces.
const MAX_ID_SLACK: usize = 1024;

/// The parts of a HuggingFace `tokenizer.json` we care about.
#[derive(Deserialize)]
struct TokenizerDescription {
    model: ModelSection,
}

#[derive(Deserialize)]
struct ModelSection {
    vocab: HashMap<String, u32>,
}

/// Immutable bidirectional mapping between subword strings and ids.
///
/// Ids are taken verbatim from the tokenizer description, since they index the
/// rows of the model's output layer.
#[derive(Debug, Clone)]
pub struct Vocab {
    ids: HashMap<String, u32>,
    tokens: Vec<Option<String>>,
    unk_id: u32,
    cls_id: u32,
    sep_id: u32,
}

impl Vocab {
    /// Reads the `model.vocab` section of a tokenizer description file.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::vocab_load(path, e))?;
        Self::from_reader(BufReader::new(file), path)
    }

    /// Parses a tokenizer description; `origin` only appears in error messages.
    pub fn from_reader<R: Read>(reader: R, origin: &Path) -> Result<Self> {
        let description: TokenizerDescription =
            serde_json::from_reader(reader).map_err(|e| Error::vocab_load(origin, e))?;
        Self::from_pairs(description.model.vocab).map_err(|reason| Error::vocab_load(origin, reason))
    }

    /// Builds a vocabulary from `(piece, id)` pairs. Every id must be unique.
    pub fn from_pairs<I, S>(pairs: I) -> std::result::Result<Self, String>
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let ids: HashMap<String, u32> = pairs.into_iter().map(|(s, id)| (s.into(), id)).collect();
        if ids.is_empty() {
            return Err("vocabulary is empty".to_string());
        }

        let max_id = ids.values().max().map_or(0, |&max| max as usize);
        if max_id >= 2 * ids.len() + MAX_ID_SLACK {
            return Err(format!(
                "id {} is far beyond the {} pieces of the vocabulary",
                max_id,
                ids.len()
            ));
        }

        let size = max_id + 1;
        let mut tokens = vec![None; size];
        for (piece, &id) in &ids {
            let slot = &mut tokens[id as usize];
            if let Some(other) = slot {
                return Err(format!("id {} is assigned to both {:?} and {:?}", id, other, piece));
            }
            *slot = Some(piece.clone());
        }

        let unk_id = ids.get(UNK_TOKEN).copied().unwrap_or(FALLBACK_UNK_ID);
        let lookup = |piece: &str| ids.get(piece).copied().unwrap_or(unk_id);
        let cls_id = lookup(CLS_TOKEN);
        let sep_id = lookup(SEP_TOKEN);

        Ok(Vocab {
            ids,
            tokens,
            unk_id,
            cls_id,
            sep_id,
        })
    }

    /// Id of `piece`, if it is in the vocabulary.
    pub fn get(&self, piece: &str) -> Option<u32> {
        self.ids.get(piece).copied()
    }

    /// Id of `piece`, falling back to the unknown id.
    pub fn id_of(&self, piece: &str) -> u32 {
        self.get(piece).unwrap_or(self.unk_id)
    }

    /// The piece registered under `id`.
    pub fn token_of(&self, id: u32) -> Result<&str> {
        self.tokens
            .get(id as usize)
            .and_then(Option::as_deref)
            .ok_or(Error::Tokenization {
                id,
                size: self.tokens.len(),
            })
    }

    /// Number of id slots, i.e. the largest id plus one.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn unk_id(&self) -> u32 {
        self.unk_id
    }

    pub fn cls_id(&self) -> u32 {
        self.cls_id
    }

    pub fn sep_id(&self) -> u32 {
        self.sep_id
    }
}
