//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the configured user agent and timeout
//! - Choosing HEAD for static assets and GET for pages
//! - Cache-busting query parameters
//! - Mapping network failures to negative status codes

use crate::config::{resolve_user_agent, CrawlerConfig};
use crate::state::FetchError;
use crate::url::ParsedUrl;
use crate::MirrorError;
use rand::Rng;
use reqwest::{header, redirect::Policy, Client};
use std::future::Future;
use std::time::Duration;

/// HTTP method used for a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMethod {
    Get,
    Head,
}

impl FetchMethod {
    /// HEAD for URLs with a non-HTML extension, GET for everything else
    pub fn for_url(url: &ParsedUrl) -> Self {
        if url.extension().is_some() && !url.is_html_like() {
            Self::Head
        } else {
            Self::Get
        }
    }
}

/// A single request handed to a worker
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub method: FetchMethod,
}

/// Response data a worker hands back to the engine
#[derive(Debug, Clone, Default)]
pub struct FetchResponse {
    pub status: u16,
    pub content_type: Option<String>,
    /// Body length, or `content-length` for HEAD requests
    pub size: u64,
    /// Body bytes (empty for HEAD requests)
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html"))
    }
}

/// Performs the network part of a crawl step
///
/// Implementations must not touch crawl state; they only turn a request
/// into a response or a [`FetchError`].
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(
        &self,
        request: FetchRequest,
    ) -> impl Future<Output = Result<FetchResponse, FetchError>> + Send;
}

/// [`Fetcher`] backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    random_query_params: bool,
}

impl HttpFetcher {
    pub fn new(config: &CrawlerConfig) -> Result<Self, MirrorError> {
        Ok(Self {
            client: build_http_client(config)?,
            random_query_params: config.add_random_query_params,
        })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        let target = if self.random_query_params {
            add_random_query_param(&request.url)
        } else {
            request.url.clone()
        };

        let builder = match request.method {
            FetchMethod::Get => self.client.get(&target),
            FetchMethod::Head => self.client.head(&target),
        };

        let response = builder.send().await.map_err(|e| classify_error(&e))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if request.method == FetchMethod::Head {
            let size = response
                .headers()
                .get(header::CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
            return Ok(FetchResponse {
                status,
                content_type,
                size,
                body: Vec::new(),
            });
        }

        let body = response.bytes().await.map_err(|e| classify_error(&e))?;
        Ok(FetchResponse {
            status,
            content_type,
            size: body.len() as u64,
            body: body.to_vec(),
        })
    }
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are not followed; a 3xx is recorded like any other status.
/// Supported `accept-encoding` tokens (`gzip`, `br`, `deflate`) switch on
/// transparent decompression for that encoding.
///
/// # Example
///
/// ```no_run
/// use site_mirror::config::load_config;
/// use site_mirror::crawler::build_http_client;
/// use std::path::Path;
///
/// let config = load_config(Path::new("mirror.toml")).unwrap();
/// let client = build_http_client(&config.crawler).unwrap();
/// ```
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, MirrorError> {
    let user_agent = resolve_user_agent(config)?;
    let encoding = config.accept_encoding.to_ascii_lowercase();
    let accepts = |token: &str| encoding.split(',').any(|e| e.trim() == token);

    let client = Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(config.timeout))
        .redirect(Policy::none())
        .gzip(accepts("gzip"))
        .brotli(accepts("br"))
        .deflate(accepts("deflate"))
        .build()?;

    Ok(client)
}

/// Appends a random `_xxxxxx=yyyyyy` parameter so caches are bypassed
pub fn add_random_query_param(url: &str) -> String {
    let mut rng = rand::thread_rng();
    let key: u32 = rng.gen_range(0..0x0100_0000);
    let value: u32 = rng.gen_range(0..0x0100_0000);
    let (base, fragment) = match url.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (url, None),
    };
    let separator = if base.contains('?') { '&' } else { '?' };

    let mut out = format!("{}{}_{:06x}={:06x}", base, separator, key, value);
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    out
}

/// Maps a reqwest failure to the status code recorded for the URL
fn classify_error(error: &reqwest::Error) -> FetchError {
    if error.is_timeout() {
        return FetchError::Timeout;
    }

    let mut source = std::error::Error::source(error);
    while let Some(inner) = source {
        if let Some(io) = inner.downcast_ref::<std::io::Error>() {
            match io.kind() {
                std::io::ErrorKind::ConnectionReset | std::io::ErrorKind::BrokenPipe => {
                    return FetchError::ServerReset
                }
                std::io::ErrorKind::TimedOut => return FetchError::Timeout,
                _ => {}
            }
        }
        source = inner.source();
    }

    if error.is_connect() {
        FetchError::ConnectionFail
    } else {
        FetchError::SendError
    }
}
