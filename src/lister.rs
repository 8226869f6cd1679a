//! Listing
//!
//! Wraps the store's paginated listing in two modes:
//! - shallow: one directory level, bounded by the `/` delimiter
//! - deep: every key under a prefix in sorted order, delivered page by page
//!   through a [`PageCursor`]
//!
//! Physical keys are converted back to virtual paths by [`KeySpace`].

use crate::error::{DriverError, Result};
use crate::store::{ListPage, ListRequest, ObjectStoreClient, LIST_MAX};
use crate::types::{FileInfo, ObjectKey, VirtualPath};
use futures::stream::{self, Stream};
use std::sync::Arc;
use tracing::debug;

/// Delimiter used for shallow listings.
pub const DELIMITER: &str = "/";

/// Mapping between virtual paths and keys under the configured root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpace {
    root: String,
}

impl KeySpace {
    pub fn new(root_directory: &str) -> Self {
        Self {
            root: root_directory.trim_end_matches('/').to_string(),
        }
    }

    /// Physical key for a virtual path (or any path-like suffix).
    pub fn key_for(&self, path: &str) -> ObjectKey {
        let joined = format!("{}{}", self.root, path);
        ObjectKey::new(joined.trim_start_matches('/'))
    }

    /// Key of the root directory itself; empty when no root is configured.
    pub fn root_key(&self) -> ObjectKey {
        self.key_for("")
    }

    /// Virtual path for a physical key.
    ///
    /// Strips the root prefix; with an empty root a leading `/` is inserted
    /// instead so the result stays absolute.
    pub fn path_for(&self, key: &str) -> String {
        let root = self.root_key();
        if root.as_str().is_empty() {
            return format!("/{}", key);
        }
        match key.strip_prefix(root.as_str()) {
            Some(rest) => rest.to_string(),
            None => key.to_string(),
        }
    }
}

/// Result of a shallow listing: direct-child files and inferred directories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub files: Vec<String>,
    pub directories: Vec<String>,
}

impl Listing {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.directories.is_empty()
    }

    /// Files first, then directories.
    pub fn into_paths(self) -> Vec<String> {
        let mut paths = self.files;
        paths.extend(self.directories);
        paths
    }
}

#[derive(Clone)]
pub struct Lister {
    client: Arc<dyn ObjectStoreClient>,
    keys: KeySpace,
    page_size: usize,
}

impl Lister {
    pub fn new(client: Arc<dyn ObjectStoreClient>, keys: KeySpace) -> Self {
        Self::with_page_size(client, keys, LIST_MAX)
    }

    /// Page size is clamped to `1..=LIST_MAX`.
    pub fn with_page_size(client: Arc<dyn ObjectStoreClient>, keys: KeySpace, page_size: usize) -> Self {
        Self {
            client,
            keys,
            page_size: page_size.clamp(1, LIST_MAX),
        }
    }

    pub fn keys(&self) -> &KeySpace {
        &self.keys
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// List one page under `prefix`, a virtual path ending in `/`.
    ///
    /// Files come first with size and modification time, then common prefixes
    /// as directories. Returns the continuation token when more pages remain.
    pub async fn list(
        &self,
        prefix: &str,
        delimiter: Option<&str>,
        continuation: Option<String>,
    ) -> Result<(Vec<FileInfo>, Option<String>)> {
        let mut request =
            ListRequest::new(self.keys.key_for(prefix).into_string(), self.page_size)
                .with_continuation(continuation);
        if let Some(delimiter) = delimiter {
            request = request.with_delimiter(delimiter);
        }
        let page = self.fetch(prefix, &request).await?;
        let token = next_token(&page);
        Ok((self.entries(page), token))
    }

    /// Single-level listing of `path`, draining every page.
    pub async fn shallow(&self, path: &VirtualPath) -> Result<Listing> {
        let prefix = path.as_dir_prefix();
        let mut request =
            ListRequest::new(self.keys.key_for(&prefix).into_string(), self.page_size)
                .with_delimiter(DELIMITER);
        let mut listing = Listing::default();
        let mut pages = 0usize;

        loop {
            let page = self.fetch(path.as_str(), &request).await?;
            pages += 1;
            for object in &page.contents {
                listing.files.push(self.keys.path_for(&object.key));
            }
            for common in &page.common_prefixes {
                let trimmed = common.strip_suffix(DELIMITER).unwrap_or(common);
                listing.directories.push(self.keys.path_for(trimmed));
            }
            match next_token(&page) {
                Some(token) => request = request.with_continuation(Some(token)),
                None => break,
            }
        }

        debug!(
            path = %path,
            pages,
            files = listing.files.len(),
            directories = listing.directories.len(),
            "shallow listing complete"
        );
        Ok(listing)
    }

    /// Cursor over every key beneath `from`, optionally resuming after a path.
    pub fn deep(&self, from: &VirtualPath, start_after: Option<&str>) -> PageCursor {
        let prefix = from.as_dir_prefix();
        let mut request =
            ListRequest::new(self.keys.key_for(&prefix).into_string(), self.page_size);
        if let Some(after) = start_after.filter(|s| !s.is_empty()) {
            request = request.with_start_after(self.keys.key_for(after).into_string());
        }
        PageCursor {
            lister: self.clone(),
            context: from.to_string(),
            request,
            finished: false,
            pages: 0,
        }
    }

    async fn fetch(&self, context: &str, request: &ListRequest) -> Result<ListPage> {
        debug!(prefix = %request.prefix, delimiter = ?request.delimiter, "listing page");
        self.client
            .list_objects(request)
            .await
            .map_err(|e| DriverError::from_store(context, e))
    }

    fn entries(&self, page: ListPage) -> Vec<FileInfo> {
        let mut entries = Vec::with_capacity(page.contents.len() + page.common_prefixes.len());
        for object in page.contents {
            entries.push(FileInfo::file(
                self.keys.path_for(&object.key),
                object.size,
                object.last_modified,
            ));
        }
        for common in page.common_prefixes {
            let trimmed = common.strip_suffix(DELIMITER).unwrap_or(&common);
            entries.push(FileInfo::directory(self.keys.path_for(trimmed)));
        }
        entries
    }
}

fn next_token(page: &ListPage) -> Option<String> {
    if page.is_truncated {
        page.next_continuation_token.clone()
    } else {
        None
    }
}

/// Explicit cursor over a deep listing.
///
/// Each call to [`next_page`](PageCursor::next_page) issues one list request;
/// `None` means the store reported no further pages.
pub struct PageCursor {
    lister: Lister,
    context: String,
    request: ListRequest,
    finished: bool,
    pages: usize,
}

impl PageCursor {
    pub async fn next_page(&mut self) -> Result<Option<Vec<FileInfo>>> {
        if self.finished {
            return Ok(None);
        }
        let page = self.lister.fetch(&self.context, &self.request).await?;
        self.pages += 1;
        match next_token(&page) {
            Some(token) => self.request.continuation_token = Some(token),
            None => self.finished = true,
        }
        Ok(Some(self.lister.entries(page)))
    }

    /// Number of pages fetched so far.
    pub fn pages(&self) -> usize {
        self.pages
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<Vec<FileInfo>>> + Send {
        stream::try_unfold(self, |mut cursor| async move {
            let page = cursor.next_page().await?;
            Ok::<_, DriverError>(page.map(|page| (page, cursor)))
        })
    }
}
