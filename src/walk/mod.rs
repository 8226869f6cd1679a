//! Walk
//!
//! Recursive traversal of the virtual tree. Visitors steer the walk through an
//! explicit [`WalkControl`] value instead of the error channel.

pub mod diff;
pub mod engine;

pub use diff::directory_diff;
pub use engine::{WalkEngine, WalkState};

use crate::types::FileInfo;

/// Visitor verdict for one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkControl {
    Continue,
    /// Drop every later entry beneath the visited path.
    SkipSubtree,
    /// End the walk successfully.
    Stop,
    /// End the walk; the detail becomes the walk's error.
    Fail(String),
}

/// Callback invoked for every file and inferred directory.
pub trait WalkFn: Send {
    fn visit(&mut self, info: &FileInfo) -> WalkControl;
}

impl<F> WalkFn for F
where
    F: FnMut(&FileInfo) -> WalkControl + Send,
{
    fn visit(&mut self, info: &FileInfo) -> WalkControl {
        self(info)
    }
}

/// Walk options.
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Resume after this virtual path.
    pub start_after_hint: Option<String>,
}

/// What a completed walk observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkSummary {
    pub objects_visited: u64,
    /// The visitor ended the walk early with `Stop`.
    pub stopped: bool,
}
