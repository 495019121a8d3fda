//! Feed API client for upstream post retrieval.
//!
//! Talks to the hosted feed gateway that fronts the short-form post
//! upstream. Responses arrive as an envelope: a page of posts plus an
//! `includes` section carrying the referenced authors and media, which
//! this module joins back into self-contained [`Record`]s.
//!
//! All requests pass through a shared [`RollingWindow`] limiter, and
//! failed requests are retried with exponential backoff. A 429 that
//! carries a usable reset time pauses the limiter instead of burning
//! retry attempts.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use log::{debug, warn};
use rand::Rng;
use reqwest::header::HeaderMap;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use pulseboard_core::providers::{FeedProvider, ProviderError, RetryClass};
use pulseboard_core::records::{Author, Engagement, MediaAttachment, MediaKind, Record};

use crate::rate_limit::RollingWindow;

const BASE_URL: &str = "https://api.pulseboard.dev/v2";
const PROVIDER_ID: &str = "FEED_API";

/// Environment variable holding the feed gateway bearer token.
pub const FEED_TOKEN_ENV: &str = "PULSEBOARD_FEED_TOKEN";

/// Posts requested per page. The upstream caps pages at 100; twenty is
/// plenty for a polling cadence measured in seconds.
const MAX_RESULTS: u32 = 20;

/// Request attempts per batch before the error is surfaced to the caller.
const MAX_ATTEMPTS: u32 = 3;

/// Client for the feed gateway.
///
/// Cheap to share behind an `Arc`; the embedded HTTP client and rate
/// limiter are both safe for concurrent use.
pub struct PostsClient {
    client: Client,
    token: Option<String>,
    limiter: RollingWindow,
    base_url: String,
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Deserialize)]
struct FeedEnvelope {
    #[serde(default)]
    data: Vec<WirePost>,
    #[serde(default)]
    includes: WireIncludes,
    #[serde(default)]
    errors: Vec<WireError>,
}

#[derive(Debug, Default, Deserialize)]
struct WireIncludes {
    #[serde(default)]
    users: Vec<WireUser>,
    #[serde(default)]
    media: Vec<WireMedia>,
}

#[derive(Debug, Deserialize)]
struct WirePost {
    id: String,
    text: String,
    created_at: String,
    author_id: Option<String>,
    public_metrics: Option<WirePostMetrics>,
    attachments: Option<WireAttachments>,
}

#[derive(Debug, Default, Deserialize)]
struct WirePostMetrics {
    #[serde(default)]
    like_count: i64,
    #[serde(default)]
    retweet_count: i64,
}

#[derive(Debug, Deserialize)]
struct WireAttachments {
    #[serde(default)]
    media_keys: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WireUser {
    id: String,
    name: String,
    username: String,
    profile_image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireMedia {
    media_key: String,
    #[serde(rename = "type")]
    kind: String,
    url: Option<String>,
    preview_image_url: Option<String>,
}

/// Partial-failure entry the upstream appends alongside (or instead of)
/// post data, e.g. for suspended or protected accounts.
#[derive(Debug, Deserialize)]
struct WireError {
    title: Option<String>,
    detail: Option<String>,
}

// ============================================================================
// Response mapping
// ============================================================================

fn map_media_kind(kind: &str) -> Option<MediaKind> {
    match kind {
        "photo" => Some(MediaKind::Photo),
        "video" => Some(MediaKind::Video),
        "animated_gif" => Some(MediaKind::AnimatedImage),
        _ => None,
    }
}

/// Swap the thumbnail avatar variant for the larger one. Upstream hands
/// out `_normal` (48x48) URLs, which look muddy on any modern display.
fn upsize_avatar(url: &str) -> String {
    url.replace("_normal", "_400x400")
}

/// Join a response envelope into self-contained records.
///
/// Posts keep upstream order (most recent first). A post whose author is
/// missing from `includes` gets a placeholder author rather than being
/// dropped; media that cannot be resolved or has no usable URL is
/// filtered out of the attachment list.
fn assemble_records(account_id: &str, envelope: &FeedEnvelope) -> Vec<Record> {
    let users: HashMap<&str, &WireUser> = envelope
        .includes
        .users
        .iter()
        .map(|u| (u.id.as_str(), u))
        .collect();
    let media: HashMap<&str, &WireMedia> = envelope
        .includes
        .media
        .iter()
        .map(|m| (m.media_key.as_str(), m))
        .collect();

    let mut records = Vec::with_capacity(envelope.data.len());
    for post in &envelope.data {
        let created_at = match DateTime::parse_from_rfc3339(&post.created_at) {
            Ok(ts) => ts.with_timezone(&Utc),
            Err(e) => {
                warn!(
                    "Skipping post {}: unparseable created_at '{}': {}",
                    post.id, post.created_at, e
                );
                continue;
            }
        };

        let author = post
            .author_id
            .as_deref()
            .and_then(|id| users.get(id))
            .map(|user| Author {
                name: user.name.clone(),
                handle: user.username.clone(),
                avatar_url: user.profile_image_url.as_deref().map(upsize_avatar),
            })
            .unwrap_or_else(|| Author {
                name: "Unknown Author".to_string(),
                handle: "unknown".to_string(),
                avatar_url: None,
            });

        let metrics = post
            .public_metrics
            .as_ref()
            .map(|m| Engagement {
                likes: m.like_count,
                shares: m.retweet_count,
            })
            .unwrap_or_default();

        let mut attachments = Vec::new();
        let media_keys = post
            .attachments
            .as_ref()
            .map(|a| a.media_keys.as_slice())
            .unwrap_or_default();
        for key in media_keys {
            let Some(item) = media.get(key.as_str()) else {
                debug!("Post {} references media {} absent from includes", post.id, key);
                continue;
            };
            let Some(kind) = map_media_kind(&item.kind) else {
                debug!(
                    "Post {} has media {} of unsupported type '{}'",
                    post.id, key, item.kind
                );
                continue;
            };
            // Videos often carry only a preview image; fall back so the
            // attachment still renders as something.
            let Some(url) = item.url.clone().or_else(|| item.preview_image_url.clone()) else {
                debug!("Post {} media {} has no usable URL", post.id, key);
                continue;
            };
            attachments.push(MediaAttachment {
                kind,
                url,
                preview_url: item
                    .preview_image_url
                    .clone()
                    .or_else(|| item.url.clone()),
            });
        }

        records.push(Record {
            id: post.id.clone(),
            source_id: account_id.to_string(),
            author,
            content: post.text.clone(),
            created_at,
            metrics,
            media: attachments,
        });
    }

    records
}

/// Extract a usable rate-limit reset time from 429 response headers.
///
/// Prefers `x-rate-limit-reset` (epoch seconds); falls back to
/// `retry-after` (delay seconds). A reset that is missing, unparseable,
/// or already in the past yields `None`, which routes the error to the
/// backoff path instead.
fn parse_reset_headers(headers: &HeaderMap) -> Option<DateTime<Utc>> {
    let reset_at = headers
        .get("x-rate-limit-reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok())
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        .or_else(|| {
            headers
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<i64>().ok())
                .and_then(chrono::Duration::try_seconds)
                .and_then(|delay| Utc::now().checked_add_signed(delay))
        })?;

    (reset_at > Utc::now()).then_some(reset_at)
}

fn backoff_delay(attempts: u32) -> Duration {
    let base = Duration::from_secs(2u64.pow(attempts));
    let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..1000));
    base + jitter
}

// ============================================================================
// PostsClient implementation
// ============================================================================

impl PostsClient {
    /// Create a client with the given bearer token.
    ///
    /// A `None` token builds a client whose fetches fail fast with
    /// [`ProviderError::MissingCredential`]; the scheduler surfaces that
    /// per source instead of the process refusing to start.
    pub fn new(token: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            token,
            limiter: RollingWindow::new(),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Create a client from the `PULSEBOARD_FEED_TOKEN` environment
    /// variable. A missing or blank variable is treated as no token.
    pub fn from_env() -> Self {
        let token = std::env::var(FEED_TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty());
        Self::new(token)
    }

    /// Point the client at a different gateway, e.g. a self-hosted proxy.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Remaining request budget in the current rate-limit window.
    pub fn remaining_budget(&self) -> u32 {
        self.limiter.remaining()
    }

    /// Issue a single page request. No retries at this level.
    async fn request_page(
        &self,
        token: &str,
        account_id: &str,
        since_cursor: Option<&str>,
    ) -> Result<FeedEnvelope, ProviderError> {
        let max_results = MAX_RESULTS.to_string();
        let mut params: Vec<(&str, &str)> = vec![
            ("post.fields", "created_at,public_metrics,attachments,author_id"),
            ("expansions", "author_id,attachments.media_keys"),
            ("user.fields", "name,username,profile_image_url"),
            ("media.fields", "url,preview_image_url,type"),
            ("max_results", &max_results),
        ];
        if let Some(cursor) = since_cursor {
            params.push(("since_id", cursor));
        }

        let url = format!("{}/accounts/{}/posts", self.base_url, account_id);
        debug!("Feed request for account {} (cursor: {:?})", account_id, since_cursor);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout {
                        provider: PROVIDER_ID.to_string(),
                    }
                } else {
                    ProviderError::Network(e)
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let reset_at = parse_reset_headers(response.headers());
            return Err(ProviderError::RateLimited {
                provider: PROVIDER_ID.to_string(),
                reset_at,
            });
        }
        if !status.is_success() {
            return Err(ProviderError::Upstream {
                provider: PROVIDER_ID.to_string(),
                message: format!("HTTP {}", status),
            });
        }

        let text = response.text().await.map_err(ProviderError::Network)?;
        serde_json::from_str(&text).map_err(|e| ProviderError::Upstream {
            provider: PROVIDER_ID.to_string(),
            message: format!("Failed to parse response: {}", e),
        })
    }

    /// Fetch one batch, retrying per the error's [`RetryClass`].
    ///
    /// Rate-limit budget is only consumed on success; a server-supplied
    /// reset pauses the limiter and resets the attempt counter rather
    /// than counting against `MAX_ATTEMPTS`.
    async fn fetch_with_retry(
        &self,
        account_id: &str,
        since_cursor: Option<&str>,
    ) -> Result<Vec<Record>, ProviderError> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| ProviderError::MissingCredential {
                provider: PROVIDER_ID.to_string(),
            })?;

        let mut attempts: u32 = 0;
        loop {
            self.limiter.acquire().await;

            match self.request_page(token, account_id, since_cursor).await {
                Ok(envelope) => {
                    self.limiter.record_success();
                    if !envelope.errors.is_empty() {
                        for err in &envelope.errors {
                            warn!(
                                "Feed response for account {} carried upstream error: {} {}",
                                account_id,
                                err.title.as_deref().unwrap_or("(untitled)"),
                                err.detail.as_deref().unwrap_or("")
                            );
                        }
                    }
                    return Ok(assemble_records(account_id, &envelope));
                }
                Err(err) => match err.retry_class() {
                    RetryClass::Never => return Err(err),
                    RetryClass::AfterReset => {
                        if let ProviderError::RateLimited {
                            reset_at: Some(reset_at),
                            ..
                        } = &err
                        {
                            let wait = (*reset_at - Utc::now())
                                .to_std()
                                .unwrap_or(Duration::ZERO);
                            warn!(
                                "Feed API rate limited for account {}; honoring server reset in {:?}",
                                account_id, wait
                            );
                            self.limiter.pause_until(Instant::now() + wait);
                        }
                        attempts = 0;
                    }
                    RetryClass::WithBackoff => {
                        attempts += 1;
                        if attempts >= MAX_ATTEMPTS {
                            return Err(err);
                        }
                        let delay = backoff_delay(attempts);
                        debug!(
                            "Feed request for account {} failed ({}); retrying in {:?} (attempt {}/{})",
                            account_id, err, delay, attempts, MAX_ATTEMPTS
                        );
                        tokio::time::sleep(delay).await;
                    }
                },
            }
        }
    }
}

#[async_trait]
impl FeedProvider for PostsClient {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_batch(
        &self,
        account_id: &str,
        since_cursor: Option<&str>,
    ) -> Result<Vec<Record>, ProviderError> {
        self.fetch_with_retry(account_id, since_cursor).await
    }
}
