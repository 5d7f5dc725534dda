use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use mn_core::{BlobStorage, Error, Result};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use sha2::Sha256;
use tracing::{debug, warn};
use url::Url;

type HmacSha256 = Hmac<Sha256>;

const API_VERSION: &str = "2021-08-06";
const DEFAULT_PROTOCOL: &str = "https";
const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

/// Parsed `Key=Value;` storage connection string.
#[derive(Clone)]
pub struct ConnectionString {
    pub account_name: String,
    account_key: Option<Vec<u8>>,
    sas_token: Option<String>,
    pub blob_endpoint: Url,
}

impl std::fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionString")
            .field("account_name", &self.account_name)
            .field("blob_endpoint", &self.blob_endpoint.as_str())
            .field("has_key", &self.account_key.is_some())
            .field("has_sas", &self.sas_token.is_some())
            .finish()
    }
}

impl FromStr for ConnectionString {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut fields = BTreeMap::new();
        for part in s.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = part.split_once('=').ok_or_else(|| {
                Error::Config(format!("malformed connection string segment near '{}'", key_of(part)))
            })?;
            fields.insert(key.trim(), value.trim());
        }

        let account_name = fields
            .get("AccountName")
            .map(|s| s.to_string())
            .ok_or_else(|| Error::Config("connection string has no AccountName".to_string()))?;

        let account_key = fields
            .get("AccountKey")
            .map(|key| {
                STANDARD
                    .decode(key)
                    .map_err(|e| Error::Config(format!("AccountKey is not valid base64: {}", e)))
            })
            .transpose()?;
        let sas_token = fields
            .get("SharedAccessSignature")
            .map(|sas| sas.trim_start_matches('?').to_string());
        if account_key.is_none() && sas_token.is_none() {
            return Err(Error::Config(
                "connection string needs an AccountKey or a SharedAccessSignature".to_string(),
            ));
        }

        let endpoint = match fields.get("BlobEndpoint") {
            Some(endpoint) => endpoint.to_string(),
            None => format!(
                "{}://{}.blob.{}",
                fields.get("DefaultEndpointsProtocol").unwrap_or(&DEFAULT_PROTOCOL),
                account_name,
                fields.get("EndpointSuffix").unwrap_or(&DEFAULT_ENDPOINT_SUFFIX),
            ),
        };
        let blob_endpoint = Url::parse(&endpoint)
            .map_err(|e| Error::InvalidUrl(format!("blob endpoint {}: {}", endpoint, e)))?;

        Ok(Self {
            account_name,
            account_key,
            sas_token,
            blob_endpoint,
        })
    }
}

/// Key name of a segment, so error messages never echo a secret value.
fn key_of(part: &str) -> &str {
    part.split('=').next().unwrap_or_default()
}

impl ConnectionString {
    pub fn blob_url(&self, container: &str, blob_name: &str) -> Result<Url> {
        let mut url = self.blob_endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidUrl(format!("{} cannot be a base URL", self.blob_endpoint)))?
            .pop_if_empty()
            .push(container)
            .push(blob_name);
        if let Some(sas) = &self.sas_token {
            url.set_query(Some(sas));
        }
        Ok(url)
    }

    /// SharedKey string-to-sign for a request without conditional headers.
    fn string_to_sign(
        &self,
        method: &str,
        url: &Url,
        content_length: usize,
        content_type: &str,
        ms_headers: &BTreeMap<&str, String>,
    ) -> String {
        let length = if content_length == 0 {
            String::new()
        } else {
            content_length.to_string()
        };
        let canonical_headers: String = ms_headers
            .iter()
            .map(|(name, value)| format!("{}:{}\n", name, value))
            .collect();
        format!(
            "{method}\n\n\n{length}\n\n{content_type}\n\n\n\n\n\n\n{canonical_headers}/{account}{path}",
            account = self.account_name,
            path = url.path(),
        )
    }

    fn sign(&self, key: &[u8], string_to_sign: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(key)
            .map_err(|e| Error::Config(format!("invalid account key: {}", e)))?;
        mac.update(string_to_sign.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

/// Azure Blob Storage through the `Put Blob` REST operation.
pub struct AzureBlobStorage {
    client: Client,
    credentials: ConnectionString,
}

impl AzureBlobStorage {
    pub fn new(connection_string: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(concat!("maritime-news/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            credentials: connection_string.parse()?,
        })
    }

    pub fn credentials(&self) -> &ConnectionString {
        &self.credentials
    }
}

#[async_trait]
impl BlobStorage for AzureBlobStorage {
    fn name(&self) -> &str {
        "azure"
    }

    async fn put_block_blob(
        &self,
        container: &str,
        blob_name: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        let url = self.credentials.blob_url(container, blob_name)?;
        let mut ms_headers = BTreeMap::new();
        ms_headers.insert("x-ms-blob-type", "BlockBlob".to_string());
        ms_headers.insert("x-ms-date", Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string());
        ms_headers.insert("x-ms-version", API_VERSION.to_string());

        let mut request = self
            .client
            .put(url.clone())
            .header(CONTENT_TYPE, content_type);
        for (name, value) in &ms_headers {
            request = request.header(*name, value);
        }
        // SAS-authorised requests carry their token in the query string instead.
        if let (Some(key), None) = (&self.credentials.account_key, &self.credentials.sas_token) {
            let to_sign = self.credentials.string_to_sign(
                "PUT",
                &url,
                content.len(),
                content_type,
                &ms_headers,
            );
            let signature = self.credentials.sign(key, &to_sign)?;
            request = request.header(
                AUTHORIZATION,
                format!("SharedKey {}:{}", self.credentials.account_name, signature),
            );
        }

        let mut public_url = url;
        public_url.set_query(None);
        debug!(url = %public_url, bytes = content.len(), "Uploading block blob");

        let response = request
            .body(content)
            .send()
            .await
            .map_err(|e| Error::Http(e.without_url()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, url = %public_url, "Blob service rejected upload: {}", body.trim());
            return Err(Error::HttpStatus {
                url: public_url.to_string(),
                status,
            });
        }
        Ok(())
    }
}
