use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error};
use url::Url;

use crate::{
    config::{DirectorySettings, FetchLimits},
    fetch,
    record::{ChannelField, ChannelRecord}
};

/// Outcome of the most recent fetch attempt for a feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    /// No attempt has been made yet
    Unknown,
    Ok,
    Error
}

impl FeedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Ok => "OK",
            Self::Error => "ERROR"
        }
    }
}

/// One configured remote feed
#[derive(Debug, Clone)]
pub struct ChannelFeed {
    pub url: Url,
    pub status: FeedStatus
}

/// Feed detail fields addressable from page templates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedField {
    Url,
    Status
}

impl FeedField {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "url" => Some(Self::Url),
            "status" => Some(Self::Status),
            _ => None
        }
    }

    pub fn render(&self, feed: &ChannelFeed) -> String {
        match self {
            Self::Url => feed.url.to_string(),
            Self::Status => feed.status.as_str().to_owned()
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    /// The caller asked for a field that does not exist, a template bug
    #[error("unknown field")]
    UnknownField,
    #[error("index out of range")]
    OutOfRange
}

#[derive(Default)]
struct DirectoryState {
    channels: Vec<ChannelRecord>,
    feeds: Vec<ChannelFeed>,
    /// Utc timestamp of the last completed refresh cycle, 0 when never
    last_update: i64
}

/// Merged, ranked view over the records of every registered feed.
///
/// One lock guards records, feeds and the refresh timestamp together,
/// a reader can never observe records and feed statuses belonging to
/// different refresh cycles.
pub struct ChannelDirectory {
    state: RwLock<DirectoryState>,
    /// Serializes update() callers so that the refresh interval check
    /// and the publish behave as one step. Readers never touch it.
    refresh_gate: Mutex<()>,
    refresh_interval: i64,
    limits: FetchLimits
}

fn now() -> i64 {
    chrono::offset::Utc::now().timestamp()
}

impl ChannelDirectory {
    pub fn new(settings: &DirectorySettings) -> Self {
        Self {
            state: RwLock::new(DirectoryState::default()),
            refresh_gate: Mutex::new(()),
            refresh_interval: settings.refresh_interval as i64,
            limits: settings.limits.clone()
        }
    }

    /// Refresh every registered feed, unless a refresh completed less
    /// than the configured interval ago in which case this is a cheap
    /// no-op returning false.
    ///
    /// Feeds are fetched concurrently without holding the state lock,
    /// results are merged in feed registration order and published as
    /// one write. Feeds that fail only lose their own records, update()
    /// returns true however many of them failed.
    pub async fn update(&self) -> bool {
        let _gate = self.refresh_gate.lock().await;

        let urls;
        {
            let state = self.state.read().await;
            if now() - state.last_update < self.refresh_interval {
                return false;
            }
            urls = state.feeds.iter().map(|f| f.url.clone()).collect::<Vec<Url>>();
        }

        let mut tasks = Vec::with_capacity(urls.len());
        for url in &urls {
            let url    = url.clone();
            let limits = self.limits.clone();
            tasks.push(tokio::spawn(async move {
                fetch::fetch(url.as_str(), &limits).await
            }));
        }

        let mut results = Vec::with_capacity(tasks.len());
        for (task, url) in tasks.into_iter().zip(&urls) {
            match task.await {
                Ok(Ok(records)) => {
                    debug!("Got {} channels from {}", records.len(), url);
                    results.push((url, FeedStatus::Ok, records));
                },
                Ok(Err(e)) => {
                    error!("Failed to get channels from {}: {}", url, e);
                    results.push((url, FeedStatus::Error, Vec::new()));
                },
                Err(e) => {
                    error!("Fetch task for {} died: {}", url, e);
                    results.push((url, FeedStatus::Error, Vec::new()));
                }
            }
        }

        let mut state = self.state.write().await;
        let mut channels = Vec::new();
        // Feeds registered while we were fetching stay Unknown until
        // the next cycle
        for feed in state.feeds.iter_mut() {
            if let Some((_, status, records)) = results.iter_mut().find(|(u, _, _)| *u == &feed.url) {
                feed.status = *status;
                channels.append(records);
            }
        }
        // Stable sort, feed registration order breaks ties
        channels.sort_by(|a, b| b.num_directs.cmp(&a.num_directs));
        state.channels = channels;
        state.last_update = now();
        true
    }

    pub async fn num_channels(&self) -> usize {
        self.state.read().await.channels.len()
    }

    pub async fn num_feeds(&self) -> usize {
        self.state.read().await.feeds.len()
    }

    /// Sum of direct listeners over all published records. Feeds are
    /// untrusted, negative counts are clamped to zero so they can
    /// never shrink the total.
    pub async fn total_listeners(&self) -> i32 {
        let state = self.state.read().await;
        state.channels.iter().map(|ch| ch.num_directs.max(0)).sum()
    }

    pub async fn total_relays(&self) -> i32 {
        let state = self.state.read().await;
        state.channels.iter().map(|ch| ch.num_relays.max(0)).sum()
    }

    pub async fn last_update(&self) -> i64 {
        self.state.read().await.last_update
    }

    /// Snapshot copy of the registered feeds for display purposes
    pub async fn feeds(&self) -> Vec<ChannelFeed> {
        self.state.read().await.feeds.clone()
    }

    /// Register a feed index URL. Duplicates and anything that is not
    /// a well-formed http URL are rejected.
    pub async fn add_feed(&self, url: &str) -> bool {
        let parsed = match Url::parse(url) {
            Ok(u) if u.scheme() == "http" => u,
            _ => {
                error!("Invalid feed URL {}", url);
                return false;
            }
        };

        let mut state = self.state.write().await;
        if state.feeds.iter().any(|f| f.url == parsed) {
            error!("Already have feed {}", url);
            return false;
        }

        state.feeds.push(ChannelFeed {
            url: parsed,
            status: FeedStatus::Unknown
        });
        true
    }

    /// Drop all feeds and records. Resets the refresh timestamp so the
    /// next update() runs immediately.
    pub async fn clear_feeds(&self) {
        let mut state = self.state.write().await;
        state.feeds.clear();
        state.channels.clear();
        state.last_update = 0;
    }

    /// Render one field of the channel at index as display text.
    /// An index past the published records is a normal empty result,
    /// an unrecognized field name is a caller bug.
    pub async fn lookup_channel_field(&self, index: usize, name: &str) -> Result<String, LookupError> {
        let field = ChannelField::from_name(name).ok_or(LookupError::UnknownField)?;
        let state = self.state.read().await;
        let ch    = state.channels.get(index).ok_or(LookupError::OutOfRange)?;
        Ok(field.render(ch))
    }

    /// Render one field of the feed at index. Unlike channel lookup an
    /// index past the feed list renders as an empty value, templates
    /// iterate a fixed number of feed slots.
    pub async fn lookup_feed_field(&self, index: usize, name: &str) -> Result<String, LookupError> {
        let field = FeedField::from_name(name).ok_or(LookupError::UnknownField)?;
        let state = self.state.read().await;
        match state.feeds.get(index) {
            Some(feed) => Ok(field.render(feed)),
            None => Ok(String::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ChannelDirectory, FeedStatus, LookupError};
    use crate::config::DirectorySettings;

    fn directory() -> ChannelDirectory {
        ChannelDirectory::new(&DirectorySettings::default())
    }

    #[tokio::test]
    async fn add_feed_validation() {
        let dir = directory();

        assert!(dir.add_feed("http://feeds.example.com/index.txt").await);
        assert_eq!(dir.num_feeds().await, 1);

        // exact duplicate
        assert!(!dir.add_feed("http://feeds.example.com/index.txt").await);
        assert_eq!(dir.num_feeds().await, 1);

        assert!(!dir.add_feed("ftp://feeds.example.com/index.txt").await);
        assert!(!dir.add_feed("not a url at all").await);
        assert!(!dir.add_feed("").await);
        assert_eq!(dir.num_feeds().await, 1);

        let feeds = dir.feeds().await;
        assert_eq!(feeds[0].status, FeedStatus::Unknown);
        assert_eq!(feeds[0].url.as_str(), "http://feeds.example.com/index.txt");
    }

    #[tokio::test]
    async fn clear_feeds_resets_everything() {
        let dir = directory();
        assert!(dir.add_feed("http://a.example.com/index.txt").await);
        assert!(dir.add_feed("http://b.example.com/index.txt").await);

        dir.clear_feeds().await;
        assert_eq!(dir.num_feeds().await, 0);
        assert_eq!(dir.num_channels().await, 0);
        assert_eq!(dir.last_update().await, 0);
    }

    #[tokio::test]
    async fn lookup_bounds_asymmetry() {
        let dir = directory();
        assert!(dir.add_feed("http://a.example.com/index.txt").await);
        assert!(dir.add_feed("http://b.example.com/index.txt").await);

        // out of range feed index renders empty
        assert_eq!(dir.lookup_feed_field(99, "url").await, Ok(String::new()));
        // out of range channel index is a miss
        assert_eq!(
            dir.lookup_channel_field(99, "name").await,
            Err(LookupError::OutOfRange)
        );

        // in range feed lookups
        assert_eq!(
            dir.lookup_feed_field(0, "url").await,
            Ok("http://a.example.com/index.txt".to_owned())
        );
        assert_eq!(dir.lookup_feed_field(1, "status").await, Ok("UNKNOWN".to_owned()));

        // unknown fields are failures on both sides
        assert_eq!(
            dir.lookup_feed_field(0, "bogus").await,
            Err(LookupError::UnknownField)
        );
        assert_eq!(
            dir.lookup_channel_field(0, "bogus").await,
            Err(LookupError::UnknownField)
        );
    }

    #[tokio::test]
    async fn empty_directory_queries() {
        let dir = directory();
        assert_eq!(dir.num_channels().await, 0);
        assert_eq!(dir.num_feeds().await, 0);
        assert_eq!(dir.total_listeners().await, 0);
        assert_eq!(dir.total_relays().await, 0);
        assert_eq!(dir.last_update().await, 0);
        assert!(dir.feeds().await.is_empty());
    }
}
