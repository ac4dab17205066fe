use std::time::Instant;

use log::{debug, warn};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};

use super::{Form, Lemmas, Lemmatize};
use crate::{Error, Result};

/// Address of the lemma service when neither config nor environment name one.
pub const DEFAULT_URL: &str = "http://dicta:8000/lemmas";

/// Lemmatizes by delegating to an HTTP lemma service.
///
/// Each call posts the space-joined tokens and expects a JSON array with one
/// lemma per token.
pub struct RemoteLemmatizer {
    client: Client,
    url: String,
}

impl RemoteLemmatizer {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .http1_only()
            .build()
            .map_err(|err| Error::Remote(err.to_string()))?;
        Ok(RemoteLemmatizer {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Posts `tokens` to the service, failing on transport or decoding errors.
    pub fn try_lemmatize<F: Form>(&self, tokens: &[F]) -> Result<Vec<String>> {
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let body = tokens
            .iter()
            .map(Form::form)
            .collect::<Vec<_>>()
            .join(" ");

        let start = Instant::now();
        let response = self
            .client
            .post(&self.url)
            .header(ACCEPT, "*/*")
            .header(CONTENT_TYPE, "text/plain;charset=UTF-8")
            .body(body)
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.text())
            .map_err(|err| Error::Remote(err.to_string()))?;
        debug!("Lemma service answered in {:?}: {}", start.elapsed(), response);

        parse_response(&response, tokens.len())
    }
}

impl Lemmatize for RemoteLemmatizer {
    fn lemmatize<F: Form>(&self, tokens: &[F]) -> Lemmas {
        match self.try_lemmatize(tokens) {
            Ok(lemmas) => Lemmas::Lemmatized(lemmas),
            Err(err) => {
                warn!("Lemma service at {} failed: {}", self.url, err);
                Lemmas::degraded(tokens, err)
            }
        }
    }
}

fn parse_response(body: &str, expected: usize) -> Result<Vec<String>> {
    let lemmas: Vec<String> = serde_json::from_str(body)
        .map_err(|err| Error::Remote(format!("malformed response: {}", err)))?;
    if lemmas.len() != expected {
        return Err(Error::Remote(format!(
            "expected {} lemmas, service returned {}",
            expected,
            lemmas.len()
        )));
    }
    Ok(lemmas)
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{parse_response, RemoteLemmatizer};
    use crate::lemma::{Lemmas, Lemmatize};
    use crate::Error;

    /// Runs the blocking client off the async runtime driving the mock.
    async fn lemmatize(url: String, tokens: &'static [&'static str]) -> Lemmas {
        tokio::task::spawn_blocking(move || {
            RemoteLemmatizer::new(url).unwrap().lemmatize(tokens)
        })
        .await
        .unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn posts_joined_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/lemmas"))
            .and(header("accept", "*/*"))
            .and(header("content-type", "text/plain;charset=UTF-8"))
            .and(body_string("בתים ספרים"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/json")
                    .set_body_string(r#"["בית","ספר"]"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let lemmas = lemmatize(format!("{}/lemmas", server.uri()), &["בתים", "ספרים"]).await;
        assert!(!lemmas.is_degraded());
        assert_eq!(lemmas.into_vec(), vec!["בית", "ספר"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn server_error_degrades() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/lemmas"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        match lemmatize(format!("{}/lemmas", server.uri()), &["בתים", "ספרים"]).await {
            Lemmas::Degraded { lemmas, reason } => {
                assert_eq!(lemmas, vec!["בתים", "ספרים"]);
                assert!(matches!(reason, Error::Remote(_)));
            }
            other => panic!("expected degraded result, got {:?}", other),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn short_reply_degrades() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"["בית"]"#))
            .expect(1)
            .mount(&server)
            .await;

        let lemmas = lemmatize(format!("{}/lemmas", server.uri()), &["בתים", "ספרים"]).await;
        assert!(lemmas.is_degraded());
        assert_eq!(lemmas.into_vec(), vec!["בתים", "ספרים"]);
    }

    #[test]
    fn unreachable_service_degrades() {
        let url = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            format!("http://{}/lemmas", listener.local_addr().unwrap())
        };
        let lemmatizer = RemoteLemmatizer::new(url).unwrap();

        match lemmatizer.lemmatize(&["בתים"]) {
            Lemmas::Degraded { lemmas, reason } => {
                assert_eq!(lemmas, vec!["בתים"]);
                assert!(matches!(reason, Error::Remote(_)));
            }
            other => panic!("expected degraded result, got {:?}", other),
        }
    }

    #[test]
    fn empty_input_sends_nothing() {
        let lemmatizer = RemoteLemmatizer::new("http://127.0.0.1:9/lemmas").unwrap();
        let lemmas = lemmatizer.lemmatize::<&str>(&[]);
        assert!(!lemmas.is_degraded());
        assert!(lemmas.as_slice().is_empty());
    }

    #[test]
    fn rejects_bad_responses() {
        assert_eq!(parse_response(r#"["א","ב"]"#, 2).unwrap(), vec!["א", "ב"]);
        assert!(parse_response("Exception while fetching response", 1).is_err());
        assert!(parse_response(r#"["א"]"#, 2).is_err());
    }
}
