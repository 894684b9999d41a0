use crate::error::{MalformedConnectionStringSnafu, RosterResult, StorageKeySnafu};
use base64::{Engine, prelude::BASE64_STANDARD};
use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};
use snafu::{OptionExt, ResultExt};
use std::collections::HashMap;

const DEVELOPMENT_ACCOUNT: &str = "devstoreaccount1";
const DEVELOPMENT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
const DEVELOPMENT_QUEUE_ENDPOINT: &str = "http://127.0.0.1:10001/devstoreaccount1";

#[derive(Debug)]
pub enum StorageCredentials {
    SharedKey { account: String, key: SecretString },
    Sas { token: SecretString },
}

/// A parsed `AzureWebJobsStorage`-style connection string, reduced to what the queue binding uses.
#[derive(Debug)]
pub struct StorageConnection {
    queue_endpoint: Url,
    credentials: StorageCredentials,
}

impl StorageConnection {
    pub fn parse(raw: &str) -> RosterResult<Self> {
        let mut pairs = HashMap::new();
        for part in raw.split(';').map(str::trim).filter(|part| !part.is_empty()) {
            let (key, value) = part
                .split_once('=')
                .context(MalformedConnectionStringSnafu {
                    reason: "expected `Key=Value` pairs separated by `;`",
                })?;
            pairs.insert(key.trim().to_ascii_lowercase(), value.trim());
        }

        if pairs
            .get("usedevelopmentstorage")
            .is_some_and(|value| value.eq_ignore_ascii_case("true"))
        {
            return Self::development();
        }

        let account = pairs.get("accountname").copied();

        let queue_endpoint = match pairs.get("queueendpoint") {
            Some(endpoint) => (*endpoint).to_string(),
            None => {
                let account = account.context(MalformedConnectionStringSnafu {
                    reason: "needs either `AccountName` or `QueueEndpoint`",
                })?;
                let protocol = pairs
                    .get("defaultendpointsprotocol")
                    .copied()
                    .unwrap_or("https");
                let suffix = pairs
                    .get("endpointsuffix")
                    .copied()
                    .unwrap_or("core.windows.net");
                format!("{protocol}://{account}.queue.{suffix}")
            }
        };
        let queue_endpoint = parse_endpoint(&queue_endpoint)?;

        let credentials = if let Some(key) = pairs.get("accountkey") {
            let account = account.context(MalformedConnectionStringSnafu {
                reason: "`AccountKey` given without `AccountName`",
            })?;
            BASE64_STANDARD.decode(key).context(StorageKeySnafu)?;
            StorageCredentials::SharedKey {
                account: account.to_string(),
                key: SecretString::from(*key),
            }
        } else if let Some(token) = pairs.get("sharedaccesssignature") {
            StorageCredentials::Sas {
                token: SecretString::from(token.trim_start_matches('?')),
            }
        } else {
            return MalformedConnectionStringSnafu {
                reason: "needs either `AccountKey` or `SharedAccessSignature`",
            }
            .fail();
        };

        Ok(Self {
            queue_endpoint,
            credentials,
        })
    }

    /// The local storage emulator, with its well-known account and key.
    pub fn development() -> RosterResult<Self> {
        Ok(Self {
            queue_endpoint: parse_endpoint(DEVELOPMENT_QUEUE_ENDPOINT)?,
            credentials: StorageCredentials::SharedKey {
                account: DEVELOPMENT_ACCOUNT.to_string(),
                key: SecretString::from(DEVELOPMENT_KEY),
            },
        })
    }

    pub const fn queue_endpoint(&self) -> &Url {
        &self.queue_endpoint
    }

    pub const fn credentials(&self) -> &StorageCredentials {
        &self.credentials
    }
}

impl StorageCredentials {
    pub fn decoded_key(&self) -> RosterResult<Option<Vec<u8>>> {
        match self {
            Self::SharedKey { key, .. } => BASE64_STANDARD
                .decode(key.expose_secret())
                .context(StorageKeySnafu)
                .map(Some),
            Self::Sas { .. } => Ok(None),
        }
    }
}

fn parse_endpoint(endpoint: &str) -> RosterResult<Url> {
    Url::parse(endpoint.trim_end_matches('/'))
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .context(MalformedConnectionStringSnafu {
            reason: "queue endpoint is not an http(s) URL",
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RosterError;

    #[test]
    fn account_key_string() {
        let conn = StorageConnection::parse(
            "DefaultEndpointsProtocol=https;AccountName=school;AccountKey=c2VjcmV0;EndpointSuffix=core.windows.net",
        )
        .unwrap();

        assert_eq!(
            conn.queue_endpoint().as_str(),
            "https://school.queue.core.windows.net/"
        );
        match conn.credentials() {
            StorageCredentials::SharedKey { account, key } => {
                assert_eq!(account, "school");
                assert_eq!(key.expose_secret(), "c2VjcmV0");
            }
            StorageCredentials::Sas { .. } => panic!("expected a shared key"),
        }
        assert_eq!(
            conn.credentials().decoded_key().unwrap().unwrap(),
            b"secret"
        );
    }

    #[test]
    fn defaults_protocol_and_suffix() {
        let conn = StorageConnection::parse("AccountName=school;AccountKey=c2VjcmV0").unwrap();
        assert_eq!(
            conn.queue_endpoint().as_str(),
            "https://school.queue.core.windows.net/"
        );
    }

    #[test]
    fn sas_with_explicit_endpoint() {
        let conn = StorageConnection::parse(
            "QueueEndpoint=https://school.queue.core.windows.net/;SharedAccessSignature=?sv=2021-12-02&sig=abc%3D",
        )
        .unwrap();

        match conn.credentials() {
            StorageCredentials::Sas { token } => {
                assert_eq!(token.expose_secret(), "sv=2021-12-02&sig=abc%3D");
            }
            StorageCredentials::SharedKey { .. } => panic!("expected a SAS token"),
        }
        assert!(conn.credentials().decoded_key().unwrap().is_none());
    }

    #[test]
    fn development_storage() {
        let conn = StorageConnection::parse("UseDevelopmentStorage=true").unwrap();
        assert_eq!(
            conn.queue_endpoint().as_str(),
            "http://127.0.0.1:10001/devstoreaccount1"
        );
        assert!(matches!(
            conn.credentials(),
            StorageCredentials::SharedKey { account, .. } if account == DEVELOPMENT_ACCOUNT
        ));
    }

    #[test]
    fn keys_are_case_insensitive() {
        let conn = StorageConnection::parse("accountname=school;ACCOUNTKEY=c2VjcmV0").unwrap();
        assert!(matches!(
            conn.credentials(),
            StorageCredentials::SharedKey { .. }
        ));
    }

    #[test]
    fn rejects_garbage() {
        for raw in [
            "not a connection string",
            "AccountName=school",
            "AccountKey=c2VjcmV0;QueueEndpoint=https://q.example.com",
            "QueueEndpoint=ftp://q.example.com;SharedAccessSignature=sig",
        ] {
            let err = StorageConnection::parse(raw).unwrap_err();
            assert!(
                matches!(err, RosterError::MalformedConnectionString { .. }),
                "{raw}: {err:?}"
            );
        }
    }

    #[test]
    fn rejects_non_base64_key() {
        let err = StorageConnection::parse("AccountName=school;AccountKey=!!!").unwrap_err();
        assert!(matches!(err, RosterError::StorageKey { .. }));
    }
}
