use std::path::Path;
use std::time::Instant;

use log::{debug, warn};

use super::{select_lemma, top_k, Form, Lemmas, Lemmatize, Scorer};
use crate::util::resources;
use crate::{Backend, Config, Error, Result, Vocab, WordPieceTokenizer};

/// Struct to perform lemmatization with a local model.
pub struct Lemmatizer {
    tokenizer: WordPieceTokenizer,
    scorer: Box<dyn Scorer>,
    top_k: usize,
}

impl Lemmatizer {
    /// Constructs a new Lemmatizer considering the 3 best candidates per token.
    pub fn new(tokenizer: WordPieceTokenizer, scorer: Box<dyn Scorer>) -> Self {
        Lemmatizer {
            tokenizer,
            scorer,
            top_k: 3,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Copies the model files into the cache directory and loads them.
    pub fn from_config(config: &Config) -> Result<Self> {
        let cache_dir = config.cache_dir();
        debug!(
            "Initializing lemmatizer from {} (cache: {})",
            config.model_dir.display(),
            cache_dir.display()
        );

        let files = resources::prepare(
            &config.model_dir,
            &cache_dir,
            &[config.model_file.as_str(), config.tokenizer_file.as_str()],
        )?;
        let vocab = Vocab::read(&files[1])?;
        debug!("Loaded vocabulary with {} entries", vocab.len());

        let tokenizer =
            WordPieceTokenizer::new(vocab).with_max_chars_per_word(config.max_chars_per_word);
        let scorer = load_scorer(config, &files[0])?;
        debug!("{} model ready", config.backend);

        Ok(Lemmatizer::new(tokenizer, scorer).with_top_k(config.top_k))
    }

    pub fn tokenizer(&self) -> &WordPieceTokenizer {
        &self.tokenizer
    }

    /// Lemmatizes `tokens`, propagating inference failures.
    pub fn try_lemmatize<F: Form>(&self, tokens: &[F]) -> Result<Vec<String>> {
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let batch = Assembler::new(&self.tokenizer).assemble(tokens);
        let scores = self.scorer.run(&batch)?;
        let vocab = self.tokenizer.vocab();

        // row 0 belongs to the sequence-start marker
        let mut row = 1;
        let lemmas = tokens
            .iter()
            .zip(batch.piece_counts())
            .map(|(token, &n_pieces)| {
                let form = token.form();
                let lemma = match scores.row(row) {
                    Some(scores) if n_pieces > 0 => {
                        select_lemma(form, &top_k(scores, self.top_k), vocab)
                    }
                    _ => form.to_owned(),
                };
                row += n_pieces;
                lemma
            })
            .collect();

        Ok(lemmas)
    }
}

impl Lemmatize for Lemmatizer {
    fn lemmatize<F: Form>(&self, tokens: &[F]) -> Lemmas {
        let start = Instant::now();
        match self.try_lemmatize(tokens) {
            Ok(lemmas) => {
                debug!("Lemmatized {} tokens in {:?}", tokens.len(), start.elapsed());
                Lemmas::Lemmatized(lemmas)
            }
            Err(err) => {
                warn!("Lemmatization failed, keeping surface forms: {}", err);
                Lemmas::degraded(tokens, err)
            }
        }
    }
}

fn load_scorer(config: &Config, model: &Path) -> Result<Box<dyn Scorer>> {
    match config.backend {
        #[cfg(feature = "onnx")]
        Backend::Onnx => Ok(Box::new(super::OnnxScorer::load(model, &config.ops)?)),
        #[cfg(feature = "tensorflow")]
        Backend::Tensorflow => Ok(Box::new(super::TensorflowScorer::load(
            model,
            &config.ops,
            config.intra_op_threads,
            config.inter_op_threads,
        )?)),
        #[allow(unreachable_patterns)]
        backend => Err(Error::Config {
            path: model.to_owned(),
            reason: format!("built without support for the {} backend", backend),
        }),
    }
}

/// Model input for all tokens of one stream.
///
/// The ids of every token are concatenated between one sequence-start and one
/// sequence-end marker. No padding is used, so the attention mask is all ones
/// and every position belongs to segment 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    input_ids: Vec<i64>,
    attention_mask: Vec<i64>,
    token_type_ids: Vec<i64>,
    piece_counts: Vec<usize>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }

    pub fn input_ids(&self) -> &[i64] {
        &self.input_ids
    }

    pub fn attention_mask(&self) -> &[i64] {
        &self.attention_mask
    }

    pub fn token_type_ids(&self) -> &[i64] {
        &self.token_type_ids
    }

    /// Number of pieces each input token contributed.
    pub fn piece_counts(&self) -> &[usize] {
        &self.piece_counts
    }
}

/// Assembles the tokens of a stream into a single batch.
pub struct Assembler<'a> {
    tokenizer: &'a WordPieceTokenizer,
}

impl<'a> Assembler<'a> {
    pub fn new(tokenizer: &'a WordPieceTokenizer) -> Self {
        Assembler { tokenizer }
    }

    pub fn assemble<F: Form>(&self, tokens: &[F]) -> Batch {
        let vocab = self.tokenizer.vocab();
        let mut input_ids = Vec::with_capacity(tokens.len() + 2);
        let mut piece_counts = Vec::with_capacity(tokens.len());

        input_ids.push(i64::from(vocab.cls_id()));
        for token in tokens {
            let ids = self.tokenizer.encode(token.form());
            piece_counts.push(ids.len());
            input_ids.extend(ids.into_iter().map(i64::from));
        }
        input_ids.push(i64::from(vocab.sep_id()));

        let len = input_ids.len();
        Batch {
            input_ids,
            attention_mask: vec![1; len],
            token_type_ids: vec![0; len],
            piece_counts,
        }
    }
}
