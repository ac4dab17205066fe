use std::env;
use std::fmt;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::lemma::DEFAULT_URL;
use crate::{Error, Result};

/// Path of the configuration used by the process-wide session.
pub const CONFIG_VAR: &str = "KORRA_HEB_CONFIG";
/// Base directory for the model cache.
pub const DATA_VAR: &str = "KORRA_HEB_DATA";
/// Address of the remote lemma service.
pub const URL_VAR: &str = "KORRA_HEB_URL";

const CACHE_SUBDIR: &str = "heb-lemmatizer";

/// Lemmatizer configuration, read from a toml file. Every key is optional.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory holding the bundled model files.
    pub model_dir: PathBuf,
    /// Where model files are copied before use. Resolved from the environment
    /// when absent, see [`Config::cache_dir`].
    pub cache_dir: Option<PathBuf>,
    pub model_file: String,
    pub tokenizer_file: String,
    pub backend: Backend,
    pub top_k: usize,
    pub max_chars_per_word: usize,
    pub intra_op_threads: usize,
    pub inter_op_threads: usize,
    pub ops: Ops,
    pub remote: Remote,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            model_dir: PathBuf::from("model"),
            cache_dir: None,
            model_file: "model.onnx".to_string(),
            tokenizer_file: "tokenizer.json".to_string(),
            backend: Backend::Onnx,
            top_k: 3,
            max_chars_per_word: crate::vocab::MAX_CHARS_PER_WORD,
            intra_op_threads: 2,
            inter_op_threads: 1,
            ops: Ops::default(),
            remote: Remote::default(),
        }
    }
}

impl Config {
    /// Deserializes the config from `path`.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = read_to_string(path).map_err(|err| Error::Config {
            path: path.to_owned(),
            reason: err.to_string(),
        })?;
        toml::from_str(&data).map_err(|err| Error::Config {
            path: path.to_owned(),
            reason: err.to_string(),
        })
    }

    /// Reads the file named by `KORRA_HEB_CONFIG`, or returns the defaults.
    pub fn from_env() -> Result<Self> {
        match env::var_os(CONFIG_VAR) {
            Some(path) => Self::read(path),
            None => Ok(Config::default()),
        }
    }

    /// The configured cache directory, else `$KORRA_HEB_DATA/heb-lemmatizer`,
    /// else `heb-lemmatizer` in the system temp directory.
    pub fn cache_dir(&self) -> PathBuf {
        if let Some(dir) = &self.cache_dir {
            return dir.clone();
        }
        env::var_os(DATA_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(env::temp_dir)
            .join(CACHE_SUBDIR)
    }

    /// The configured service address, else `KORRA_HEB_URL`, else [`DEFAULT_URL`].
    pub fn remote_url(&self) -> String {
        resolve_url(self.remote.url.as_deref(), env::var(URL_VAR).ok().as_deref())
    }
}

fn resolve_url(configured: Option<&str>, from_env: Option<&str>) -> String {
    configured
        .or(from_env)
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .unwrap_or(DEFAULT_URL)
        .to_string()
}

/// Inference engine running the model.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Onnx,
    Tensorflow,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Backend::Onnx => f.write_str("onnx"),
            Backend::Tensorflow => f.write_str("tensorflow"),
        }
    }
}

/// Input and output names of the model graph.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Ops {
    pub input_ids: String,
    pub attention_mask: String,
    pub token_type_ids: String,
    /// Output fetched by the TensorFlow backend. ONNX models use their first output.
    pub output: String,
}

impl Default for Ops {
    fn default() -> Self {
        Ops {
            input_ids: "input_ids".to_string(),
            attention_mask: "attention_mask".to_string(),
            token_type_ids: "token_type_ids".to_string(),
            output: "logits".to_string(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Remote {
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{resolve_url, Backend, Config, Ops, Remote};
    use crate::lemma::DEFAULT_URL;

    #[test]
    pub fn test_config() {
        let target = Config {
            model_dir: PathBuf::from("testdata/model"),
            cache_dir: Some(PathBuf::from("/var/cache/heb-lemmatizer")),
            model_file: "model.onnx".to_string(),
            tokenizer_file: "tokenizer.json".to_string(),
            backend: Backend::Tensorflow,
            top_k: 5,
            max_chars_per_word: 100,
            intra_op_threads: 4,
            inter_op_threads: 1,
            ops: Ops {
                input_ids: "input_ids".to_string(),
                attention_mask: "attention_mask".to_string(),
                token_type_ids: "token_type_ids".to_string(),
                output: "pred/logits".to_string(),
            },
            remote: Remote {
                url: Some("http://localhost:8000/lemmas".to_string()),
            },
        };
        let config = Config::read("testdata/config.toml").unwrap();
        assert_eq!(target, config);
        assert_eq!(config.cache_dir(), PathBuf::from("/var/cache/heb-lemmatizer"));
        assert_eq!(config.remote_url(), "http://localhost:8000/lemmas");
    }

    #[test]
    fn empty_config_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.backend, Backend::Onnx);
        assert!(config.cache_dir().ends_with("heb-lemmatizer"));
    }

    #[test]
    fn rejects_unknown_backend() {
        assert!(toml::from_str::<Config>("backend = \"torch\"").is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Config::read("testdata/missing.toml").is_err());
    }

    #[test]
    fn url_resolution_order() {
        assert_eq!(resolve_url(Some("http://a/"), Some("http://b/")), "http://a/");
        assert_eq!(resolve_url(None, Some("http://b/")), "http://b/");
        assert_eq!(resolve_url(None, Some("  ")), DEFAULT_URL);
        assert_eq!(resolve_url(None, None), DEFAULT_URL);
    }
}
