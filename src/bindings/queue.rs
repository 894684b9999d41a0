use crate::{
    bindings::Output,
    config::{QueueConfig, storage_connection::StorageCredentials},
    data::message::QueueMessage,
    error::{
        InvalidQueueNameSnafu, QueueRejectedSnafu, QueueRequestSnafu, RosterError, RosterResult,
        UnknownMessageEncodingSnafu,
    },
};
use async_trait::async_trait;
use base64::{Engine, prelude::BASE64_STANDARD};
use hmac::{Hmac, Mac};
use jiff::Timestamp;
use reqwest::{Method, StatusCode, Url, header::CONTENT_TYPE};
use secrecy::ExposeSecret;
use sha2::Sha256;
use snafu::ResultExt;
use std::{str::FromStr, sync::Arc};

type HmacSha256 = Hmac<Sha256>;

const STORAGE_API_VERSION: &str = "2021-12-02";
const XML_CONTENT_TYPE: &str = "application/xml";

/// How message text is placed inside the `<MessageText>` element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MessageEncoding {
    #[default]
    Base64,
    None,
}

impl FromStr for MessageEncoding {
    type Err = RosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "base64" => Ok(Self::Base64),
            "none" => Ok(Self::None),
            _ => UnknownMessageEncodingSnafu { encoding: s }.fail(),
        }
    }
}

impl MessageEncoding {
    pub fn envelope(self, text: &str) -> String {
        let text = match self {
            Self::Base64 => BASE64_STANDARD.encode(text),
            Self::None => escape_xml(text),
        };
        format!("<QueueMessage><MessageText>{text}</MessageText></QueueMessage>")
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Storage queue naming rules: 3-63 lowercase letters, digits and single hyphens, alphanumeric at both ends.
pub fn validate_queue_name(name: &str) -> RosterResult<()> {
    let bytes = name.as_bytes();
    let valid = (3..=63).contains(&bytes.len())
        && bytes
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
        && bytes.first().is_some_and(u8::is_ascii_alphanumeric)
        && bytes.last().is_some_and(u8::is_ascii_alphanumeric)
        && !name.contains("--");

    snafu::ensure!(valid, InvalidQueueNameSnafu { queue: name });
    Ok(())
}

/// Builds the SharedKey string-to-sign for a request with no conditional or range headers.
fn string_to_sign(
    method: &Method,
    content_length: usize,
    content_type: &str,
    ms_date: &str,
    account: &str,
    url: &Url,
) -> String {
    let content_length = if content_length == 0 {
        String::new()
    } else {
        content_length.to_string()
    };

    format!(
        "{method}\n\n\n{content_length}\n\n{content_type}\n\n\n\n\n\n\nx-ms-date:{ms_date}\nx-ms-version:{STORAGE_API_VERSION}\n/{account}{}",
        url.path()
    )
}

fn sign(key: &[u8], string_to_sign: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(string_to_sign.as_bytes());
    BASE64_STANDARD.encode(mac.finalize().into_bytes())
}

/// Sends each message to an Azure Storage queue over its REST API.
#[derive(Debug, Clone)]
pub struct StorageQueueOutput {
    client: reqwest::Client,
    config: Arc<QueueConfig>,
}

impl StorageQueueOutput {
    pub fn new(config: Arc<QueueConfig>) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Creates the queue unless it already exists.
    pub async fn ensure_queue(&self) -> RosterResult<()> {
        let status = self.send(Method::PUT, "", None, "queue creation").await?;
        if status == StatusCode::CREATED {
            info!(queue = self.config.queue_name(), "created storage queue");
        }
        Ok(())
    }

    fn url(&self, suffix: &str) -> Url {
        let connection = self.config.connection();
        let mut url = connection.queue_endpoint().clone();
        let path = format!(
            "{}/{}{}",
            url.path().trim_end_matches('/'),
            self.config.queue_name(),
            suffix
        );
        url.set_path(&path);

        if let StorageCredentials::Sas { token } = connection.credentials() {
            url.set_query(Some(token.expose_secret()));
        }

        url
    }

    async fn send(
        &self,
        method: Method,
        suffix: &str,
        body: Option<String>,
        action: &'static str,
    ) -> RosterResult<StatusCode> {
        let url = self.url(suffix);
        let content_type = if body.is_some() { XML_CONTENT_TYPE } else { "" };
        let body = body.unwrap_or_default();

        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .header("x-ms-version", STORAGE_API_VERSION);

        if !content_type.is_empty() {
            request = request.header(CONTENT_TYPE, content_type);
        }

        let credentials = self.config.connection().credentials();
        if let (StorageCredentials::SharedKey { account, .. }, Some(key)) =
            (credentials, credentials.decoded_key()?)
        {
            let ms_date = Timestamp::now()
                .strftime("%a, %d %b %Y %H:%M:%S GMT")
                .to_string();
            let to_sign = string_to_sign(&method, body.len(), content_type, &ms_date, account, &url);

            request = request.header("x-ms-date", ms_date).header(
                "Authorization",
                format!("SharedKey {account}:{}", sign(&key, &to_sign)),
            );
        }

        let response = request
            .body(body)
            .send()
            .await
            .context(QueueRequestSnafu)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return QueueRejectedSnafu {
                action,
                status: status.as_u16(),
                body,
            }
            .fail();
        }

        Ok(status)
    }
}

#[async_trait]
impl Output<QueueMessage> for StorageQueueOutput {
    async fn set(&self, value: QueueMessage) -> RosterResult<()> {
        let envelope = self.config.encoding().envelope(value.as_str());
        self.send(Method::POST, "/messages", Some(envelope), "message")
            .await?;

        debug!(queue = self.config.queue_name(), %value, "enqueued message");
        Ok(())
    }
}
