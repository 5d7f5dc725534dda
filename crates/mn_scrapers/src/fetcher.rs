use encoding_rs::{Encoding, UTF_8};
use mn_core::{Error, Result, RetryPolicy, RunConfig};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, warn};

/// Plain GET client shared by the collector and the extractor.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    retry: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(config: &RunConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(concat!("maritime-news/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(config.accept_invalid_certs);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_client(builder.build()?, config.retry))
    }

    pub fn with_client(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// Fetch a page body, retrying timeouts, 429 and 5xx answers.
    pub async fn get_html(&self, url: &str) -> Result<String> {
        let mut attempt = 0;
        loop {
            match self.get_once(url).await {
                Err(e) if e.is_retryable() && attempt < self.retry.max_retries => {
                    let backoff = self.retry.backoff(attempt);
                    attempt += 1;
                    warn!(
                        "Fetching {} failed (attempt {}/{}): {}, backing off {:.1}s",
                        url,
                        attempt,
                        self.retry.max_retries + 1,
                        e,
                        backoff.as_secs_f64()
                    );
                    tokio::time::sleep(backoff).await;
                }
                result => return result,
            }
        }
    }

    async fn get_once(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status,
            });
        }
        let header_charset = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(charset_param);
        let bytes = response.bytes().await?;
        let html = decode_html(&bytes, header_charset.as_deref());
        debug!(%url, bytes = bytes.len(), "Fetched page");
        Ok(html)
    }
}

/// Bytes sniffed for a `<meta>` charset declaration.
const META_SNIFF_LEN: usize = 1024;

/// Decode a page by its header charset, then its `<meta>` declaration, then
/// UTF-8. A byte order mark overrides all three.
pub fn decode_html(bytes: &[u8], header_charset: Option<&str>) -> String {
    let encoding = header_charset
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .or_else(|| sniff_meta_charset(bytes))
        .unwrap_or(UTF_8);
    let (html, _, _) = encoding.decode(bytes);
    html.into_owned()
}

fn charset_param(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_string())
    })
}

fn sniff_meta_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(META_SNIFF_LEN)]).to_ascii_lowercase();
    head.match_indices("<meta").find_map(|(start, _)| {
        let tag = &head[start..];
        let tag = &tag[..tag.find('>').unwrap_or(tag.len())];
        let value = &tag[tag.find("charset=")? + "charset=".len()..];
        let label: String = value
            .trim_start_matches(|c: char| c == '"' || c == '\'' || c.is_whitespace())
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
            .collect();
        Encoding::for_label(label.as_bytes())
    })
}
