//! Recursive walk over a deep listing.
//!
//! The store returns keys in sorted, depth-first order, so every directory is
//! inferred from the difference between consecutive keys without extra list
//! calls. Skipped subtrees are pruned by dropping later entries beneath them.

use super::diff::directory_diff;
use super::{WalkControl, WalkFn, WalkSummary};
use crate::error::{DriverError, Result};
use crate::lister::Lister;
use crate::types::{is_path_under, FileInfo, VirtualPath};
use futures::{pin_mut, TryStreamExt};
use tracing::debug;

/// Per-walk traversal state.
#[derive(Debug, Clone)]
pub struct WalkState {
    /// Last directory emitted.
    pub prev_dir: String,
    /// Subtree currently being pruned.
    pub prev_skip_dir: Option<String>,
    pub object_count: u64,
}

impl WalkState {
    pub fn new(from: &VirtualPath) -> Self {
        Self {
            prev_dir: from.to_string(),
            prev_skip_dir: None,
            object_count: 0,
        }
    }

    /// Expand one page into inferred directories followed by each entry.
    pub fn expand(&mut self, page: Vec<FileInfo>) -> Vec<FileInfo> {
        let mut infos = Vec::with_capacity(page.len());
        for entry in page {
            for dir in directory_diff(&self.prev_dir, &entry.path) {
                infos.push(FileInfo::directory(dir.clone()));
                self.prev_dir = dir;
            }
            infos.push(entry);
        }
        infos
    }

    fn is_pruned(&self, path: &str) -> bool {
        self.prev_skip_dir
            .as_deref()
            .is_some_and(|skip| is_path_under(path, skip))
    }
}

/// Outcome of delivering one batch to the visitor.
enum Delivery {
    Continue,
    Stopped,
}

pub struct WalkEngine {
    lister: Lister,
}

impl WalkEngine {
    pub fn new(lister: Lister) -> Self {
        Self { lister }
    }

    /// Walk every entry beneath `from` in pre-order, resuming after
    /// `start_after` when given.
    pub async fn walk(
        &self,
        from: &VirtualPath,
        start_after: Option<&str>,
        visitor: &mut dyn WalkFn,
    ) -> Result<WalkSummary> {
        let mut state = WalkState::new(from);
        let pages = self.lister.deep(from, start_after).into_stream();
        pin_mut!(pages);

        let mut stopped = false;
        while let Some(page) = pages.try_next().await? {
            let batch = state.expand(page);
            match Self::deliver(&mut state, batch, visitor)? {
                Delivery::Continue => {}
                Delivery::Stopped => {
                    stopped = true;
                    break;
                }
            }
        }

        debug!(
            from = %from,
            objects = state.object_count,
            stopped,
            "walk complete"
        );
        Ok(WalkSummary {
            objects_visited: state.object_count,
            stopped,
        })
    }

    fn deliver(
        state: &mut WalkState,
        batch: Vec<FileInfo>,
        visitor: &mut dyn WalkFn,
    ) -> Result<Delivery> {
        for info in batch {
            if state.is_pruned(&info.path) {
                continue;
            }
            let control = visitor.visit(&info);
            state.object_count += 1;
            match control {
                WalkControl::Continue => {}
                WalkControl::SkipSubtree => state.prev_skip_dir = Some(info.path),
                WalkControl::Stop => return Ok(Delivery::Stopped),
                WalkControl::Fail(detail) => return Err(DriverError::Walk(detail)),
            }
        }
        Ok(Delivery::Continue)
    }
}
