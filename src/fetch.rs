use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::{
    addr::Addr,
    config::{FetchLimits, AGENT},
    http::{FeedClient, ResponseReader},
    record::{parse_records, ChannelRecord, ParseError}
};

/// Why a single feed fetch failed. Always per feed, never fatal to a
/// refresh cycle as a whole.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("invalid URL")]
    InvalidUrl,
    #[error("could not resolve host")]
    ResolutionFailed,
    #[error("connection failed")]
    ConnectionFailed,
    #[error("status code {0}")]
    BadStatus(u16),
    #[error("malformed feed: {0}")]
    MalformedFeed(#[from] ParseError)
}

/// Fetch a feed index URL and parse its listing into records.
/// Transport errors never escape as anything but a FetchError variant.
pub async fn fetch(url: &str, limits: &FetchLimits) -> Result<Vec<ChannelRecord>, FetchError> {
    let feed = match Url::parse(url) {
        Ok(v) => v,
        Err(_) => {
            error!("invalid URL ({})", url);
            return Err(FetchError::InvalidUrl);
        }
    };
    if feed.scheme() != "http" {
        error!("unsupported protocol ({})", url);
        return Err(FetchError::InvalidUrl);
    }
    let host = match feed.host_str() {
        Some(v) => v,
        None => {
            error!("invalid URL ({})", url);
            return Err(FetchError::InvalidUrl);
        }
    };
    let port = feed.port().unwrap_or(80);

    let addr = Addr::from_name(host, port).await;
    if !addr.is_valid() {
        error!("Could not resolve {}", host);
        return Err(FetchError::ResolutionFailed);
    }

    let mut path = feed.path();
    if path.is_empty() {
        path = "/";
    }

    let timeout = Duration::from_millis(limits.timeout);

    debug!("Connecting to {} ...", host);
    let client = tokio::time::timeout(timeout, FeedClient::connect(addr, host))
        .await
        .map_err(|_| FetchError::ConnectionFailed)?
        .map_err(|_| FetchError::ConnectionFailed)?;

    let mut reader = tokio::time::timeout(timeout, client.get(path, AGENT, limits.http_max_len))
        .await
        .map_err(|_| FetchError::ConnectionFailed)?
        .map_err(|_| FetchError::ConnectionFailed)?;

    let headers_buf = tokio::time::timeout(timeout, reader.read_headers())
        .await
        .map_err(|_| FetchError::ConnectionFailed)?
        .map_err(|_| FetchError::ConnectionFailed)?;

    let code = ResponseReader::status_code(&headers_buf)
        .map_err(|_| FetchError::ConnectionFailed)?;
    if code != 200 {
        debug!("{}: status code {}", host, code);
        return Err(FetchError::BadStatus(code));
    }

    let text = match tokio::time::timeout(timeout, reader.read_body()).await {
        Ok(Ok(v)) => v,
        Ok(Err(_)) | Err(_) => return Err(FetchError::ConnectionFailed)
    };

    Ok(parse_records(&text)?)
}
