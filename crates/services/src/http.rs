use std::env;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{CONTENT_DISPOSITION, HeaderMap};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use exam_core::model::{ExamConfig, Topic, TopicId, UnitId};

use crate::backend::{ExamArtifact, ExamConfigSource, ExamSubmitter, TopicBoundsSource};
use crate::error::{BackendError, ConfigError};
use crate::submission::SubmissionPayload;

/// Where the exam API lives and how to authenticate against it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: Url,
    pub token: Option<String>,
}

impl ApiConfig {
    pub const DEFAULT_BASE_URL: &'static str = "http://localhost:8000";

    /// # Errors
    ///
    /// Returns `ConfigError` if `base_url` is not an absolute http(s)-style URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let raw = base_url.trim();
        let mut url = Url::parse(raw).map_err(|source| ConfigError::InvalidBaseUrl {
            raw: raw.to_owned(),
            source,
        })?;
        if url.cannot_be_a_base() {
            return Err(ConfigError::NotABase(raw.to_owned()));
        }
        // Relative joins replace the last segment unless the path ends with '/'.
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(Self {
            base_url: url,
            token: None,
        })
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = (!token.trim().is_empty()).then_some(token);
        self
    }

    /// Reads `EXAM_API_BASE_URL` and `EXAM_API_TOKEN`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configured base url is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url =
            env::var("EXAM_API_BASE_URL").unwrap_or_else(|_| Self::DEFAULT_BASE_URL.into());
        let config = Self::new(&base_url)?;
        Ok(match env::var("EXAM_API_TOKEN") {
            Ok(token) => config.with_token(token),
            Err(_) => config,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        Ok(self.base_url.join(path)?)
    }

    pub(crate) fn topics_url(&self, unit: UnitId) -> Result<Url, BackendError> {
        self.endpoint(&format!("subjects/{unit}/topics"))
    }

    pub(crate) fn generate_url(&self) -> Result<Url, BackendError> {
        self.endpoint("exams/generate/")
    }

    pub(crate) fn configs_url(&self, unit: UnitId) -> Result<Url, BackendError> {
        self.endpoint(&format!("exams/subject/{unit}/configs"))
    }
}

/// reqwest-backed client for the exam API.
#[derive(Clone)]
pub struct ExamApiClient {
    client: Client,
    config: ApiConfig,
}

impl ExamApiClient {
    #[must_use]
    pub fn new(config: ApiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, BackendError> {
        debug!(%url, "GET");
        let response = self.authorize(self.client.get(url)).send().await?;
        if !response.status().is_success() {
            return Err(BackendError::HttpStatus(response.status()));
        }
        Ok(response.json().await?)
    }
}

#[derive(Debug, Deserialize)]
struct TopicRecord {
    id: TopicId,
    name: String,
    #[serde(default, alias = "num_questions", alias = "max_questions")]
    question_count: u32,
}

#[async_trait]
impl TopicBoundsSource for ExamApiClient {
    async fn topic_bounds(&self, unit: UnitId) -> Result<Vec<Topic>, BackendError> {
        let records: Vec<TopicRecord> = self.get_json(self.config.topics_url(unit)?).await?;
        Ok(records
            .into_iter()
            .filter_map(|record| {
                match Topic::new(record.id, record.name, record.question_count) {
                    Ok(topic) => Some(topic),
                    Err(err) => {
                        warn!(topic_id = %record.id, error = %err, "skipping malformed topic");
                        None
                    }
                }
            })
            .collect())
    }
}

#[async_trait]
impl ExamSubmitter for ExamApiClient {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<ExamArtifact, BackendError> {
        let url = self.config.generate_url()?;
        debug!(%url, subject_id = %payload.subject_id, "POST");
        let response = self
            .authorize(self.client.post(url))
            .json(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::HttpStatus(response.status()));
        }

        let file_name = attachment_file_name(response.headers());
        let bytes = response.bytes().await?;
        Ok(ExamArtifact::new(file_name, bytes.to_vec()))
    }
}

#[async_trait]
impl ExamConfigSource for ExamApiClient {
    async fn exam_configs(&self, unit: UnitId) -> Result<Vec<ExamConfig>, BackendError> {
        self.get_json(self.config.configs_url(unit)?).await
    }
}

fn attachment_file_name(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(CONTENT_DISPOSITION)?.to_str().ok()?;
    parse_content_disposition(value)
}

/// Extract the file name from a `Content-Disposition` header value.
///
/// `filename*` (RFC 5987) wins over `filename`. Percent-escapes in the
/// extended form are decoded; path separators are stripped.
pub(crate) fn parse_content_disposition(value: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for part in value.split(';').map(str::trim) {
        let Some((key, raw)) = part.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "filename" => plain = Some(raw.trim().trim_matches('"').to_owned()),
            "filename*" => {
                let raw = raw.trim().trim_matches('"');
                // charset'language'value
                let encoded = raw.splitn(3, '\'').nth(2).unwrap_or(raw);
                extended = Some(percent_decode(encoded));
            }
            _ => {}
        }
    }

    extended
        .or(plain)
        .map(|name| {
            name.rsplit(['/', '\\'])
                .next()
                .unwrap_or_default()
                .trim()
                .to_owned()
        })
        .filter(|name| !name.is_empty())
}

fn percent_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx] == b'%' {
            let decoded = raw
                .get(idx + 1..idx + 3)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok());
            if let Some(byte) = decoded {
                out.push(byte);
                idx += 3;
                continue;
            }
        }
        out.push(bytes[idx]);
        idx += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_trailing_slash() {
        let config = ApiConfig::new("http://api.example.com/v1").unwrap();
        assert_eq!(config.base_url.as_str(), "http://api.example.com/v1/");
        assert_eq!(
            config.topics_url(UnitId::new(3)).unwrap().as_str(),
            "http://api.example.com/v1/subjects/3/topics"
        );
    }

    #[test]
    fn endpoints_follow_the_rest_contract() {
        let config = ApiConfig::new(ApiConfig::DEFAULT_BASE_URL).unwrap();
        assert_eq!(
            config.generate_url().unwrap().as_str(),
            "http://localhost:8000/exams/generate/"
        );
        assert_eq!(
            config.configs_url(UnitId::new(12)).unwrap().as_str(),
            "http://localhost:8000/exams/subject/12/configs"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            ApiConfig::new("not a url"),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            ApiConfig::new("mailto:exams@example.com"),
            Err(ConfigError::NotABase(_))
        ));
    }

    #[test]
    fn blank_token_is_dropped() {
        let config = ApiConfig::new("http://localhost:8000")
            .unwrap()
            .with_token("  ");
        assert_eq!(config.token, None);
        let config = config.with_token("secret");
        assert_eq!(config.token.as_deref(), Some("secret"));
    }

    #[test]
    fn content_disposition_plain_filename() {
        assert_eq!(
            parse_content_disposition(r#"attachment; filename="exam_2024.zip""#),
            Some("exam_2024.zip".into())
        );
        assert_eq!(
            parse_content_disposition("attachment; filename=exams.zip"),
            Some("exams.zip".into())
        );
    }

    #[test]
    fn content_disposition_prefers_extended_form() {
        assert_eq!(
            parse_content_disposition(
                "attachment; filename=\"fallback.zip\"; filename*=UTF-8''exame%20normal.zip"
            ),
            Some("exame normal.zip".into())
        );
    }

    #[test]
    fn content_disposition_without_name() {
        assert_eq!(parse_content_disposition("attachment"), None);
        assert_eq!(parse_content_disposition("attachment; filename=\"\""), None);
        assert_eq!(
            parse_content_disposition("attachment; filename=\"../../etc/exam.zip\""),
            Some("exam.zip".into())
        );
    }

    #[test]
    fn topic_record_accepts_count_aliases() {
        let records: Vec<TopicRecord> = serde_json::from_str(
            r#"[{"id": 1, "name": "BD", "question_count": 5},
                {"id": 2, "name": "SO", "num_questions": 3},
                {"id": 3, "name": "Redes"}]"#,
        )
        .unwrap();
        let counts: Vec<u32> = records.iter().map(|r| r.question_count).collect();
        assert_eq!(counts, vec![5, 3, 0]);
    }
}
