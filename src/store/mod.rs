//! Object Store Client
//!
//! The subset of a flat, key-addressed object store that the driver consumes:
//! paginated listing, range reads, head requests and local presigning.
//! Keys are always returned in lexicographic order.

pub mod local;
pub mod memory;

pub use local::LocalStore;
pub use memory::MemoryStore;

use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Largest number of keys a single list call may return.
pub const LIST_MAX: usize = 1000;

/// Summary of a stored object as reported by listing or head requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

/// Parameters for one list call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListRequest {
    pub prefix: String,
    pub delimiter: Option<String>,
    pub max_keys: usize,
    pub continuation_token: Option<String>,
    pub start_after: Option<String>,
}

impl ListRequest {
    pub fn new(prefix: impl Into<String>, max_keys: usize) -> Self {
        ListRequest {
            prefix: prefix.into(),
            max_keys,
            ..Default::default()
        }
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    pub fn with_start_after(mut self, start_after: impl Into<String>) -> Self {
        self.start_after = Some(start_after.into());
        self
    }

    pub fn with_continuation(mut self, token: Option<String>) -> Self {
        self.continuation_token = token;
        self
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    pub contents: Vec<ObjectSummary>,
    /// Common prefixes, each ending with the delimiter.
    pub common_prefixes: Vec<String>,
    pub is_truncated: bool,
    pub next_continuation_token: Option<String>,
}

/// HTTP method a presigned URL is valid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresignMethod {
    Get,
    Head,
}

impl PresignMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresignMethod::Get => "GET",
            PresignMethod::Head => "HEAD",
        }
    }
}

/// Wall-clock deadline for a presigned request valid for `expires_in`.
///
/// Fails instead of overflowing when the deadline is not representable.
pub(crate) fn presign_deadline(expires_in: Duration) -> Result<DateTime<Utc>, StoreError> {
    let delta = chrono::Duration::from_std(expires_in)
        .map_err(|e| StoreError::Other(format!("invalid expiry: {}", e)))?;
    Utc::now().checked_add_signed(delta).ok_or_else(|| {
        StoreError::Other(format!(
            "expiry of {}s is out of range",
            expires_in.as_secs()
        ))
    })
}

/// Flat object store interface.
///
/// One attempt per call; retry policy belongs to callers.
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    /// List one page of keys.
    async fn list_objects(&self, request: &ListRequest) -> Result<ListPage, StoreError>;

    /// Read an object from `offset` to its end.
    ///
    /// An offset at or past the end of a non-empty object fails with
    /// `StoreError::InvalidRange`.
    async fn get_object(&self, key: &str, offset: u64) -> Result<Vec<u8>, StoreError>;

    /// Size and modification time of one object. The driver answers `stat`
    /// from listings; this is kept for callers that hold a physical key.
    async fn head_object(&self, key: &str) -> Result<ObjectSummary, StoreError>;

    /// Build a presigned URL locally. No network round trip.
    fn presign(
        &self,
        method: PresignMethod,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, StoreError>;
}

/// Cut one page out of a sorted object sequence, following S3 listing rules.
///
/// With a delimiter, keys that contain it after the prefix roll up into a
/// single common prefix that counts as one entry toward `max_keys`.
/// Continuation tokens are the last key or common prefix emitted.
pub(crate) fn paginate<'a, I>(objects: I, request: &ListRequest) -> ListPage
where
    I: IntoIterator<Item = &'a ObjectSummary>,
{
    let max_keys = request.max_keys.clamp(1, LIST_MAX);
    let mut page = ListPage::default();
    let mut emitted = 0usize;
    let mut last_token: Option<String> = None;

    for object in objects {
        let key = object.key.as_str();
        if !key.starts_with(&request.prefix) {
            continue;
        }
        if let Some(after) = &request.start_after {
            if key <= after.as_str() {
                continue;
            }
        }
        if let Some(token) = &request.continuation_token {
            if key <= token.as_str() {
                continue;
            }
            if is_rolled_up(token, key, request.delimiter.as_deref()) {
                continue;
            }
        }

        let rolled = request.delimiter.as_deref().and_then(|delimiter| {
            let rest = &key[request.prefix.len()..];
            rest.find(delimiter)
                .map(|idx| format!("{}{}", request.prefix, &rest[..idx + delimiter.len()]))
        });

        if let Some(common) = &rolled {
            if page.common_prefixes.last() == Some(common) {
                continue;
            }
        }

        if emitted == max_keys {
            page.is_truncated = true;
            page.next_continuation_token = last_token;
            return page;
        }

        match rolled {
            Some(common) => {
                last_token = Some(common.clone());
                page.common_prefixes.push(common);
            }
            None => {
                last_token = Some(object.key.clone());
                page.contents.push(object.clone());
            }
        }
        emitted += 1;
    }

    page
}

fn is_rolled_up(token: &str, key: &str, delimiter: Option<&str>) -> bool {
    match delimiter {
        Some(delimiter) => token.ends_with(delimiter) && key.starts_with(token),
        None => false,
    }
}
