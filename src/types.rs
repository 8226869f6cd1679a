//! Core types for the shardfs storage driver.

use crate::error::{DriverError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Physical key in the flat backing store. Never starts with `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey(String);

impl ObjectKey {
    pub fn new(key: impl Into<String>) -> Self {
        ObjectKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Absolute, `/`-separated path exposed at the driver boundary.
///
/// Invariants (enforced at construction):
/// - Starts with `/`
/// - No `.` or `..` components
/// - No `//` sequences
/// - No null bytes
/// - No trailing `/` (except root `/`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VirtualPath(String);

impl VirtualPath {
    pub fn new(path: &str) -> Result<Self> {
        if path.is_empty() {
            return Err(DriverError::InvalidPath("path cannot be empty".to_string()));
        }
        if !path.starts_with('/') {
            return Err(DriverError::InvalidPath(format!(
                "path must start with '/': {}",
                path
            )));
        }
        if path.contains('\0') {
            return Err(DriverError::InvalidPath(
                "path cannot contain null bytes".to_string(),
            ));
        }
        if path != "/" && path.ends_with('/') {
            return Err(DriverError::InvalidPath(format!(
                "path cannot have trailing slash: {}",
                path
            )));
        }
        if path.contains("//") {
            return Err(DriverError::InvalidPath(format!(
                "path cannot contain '//': {}",
                path
            )));
        }
        if path.split('/').any(|c| c == "." || c == "..") {
            return Err(DriverError::InvalidPath(format!(
                "path cannot contain '.' or '..': {}",
                path
            )));
        }
        Ok(VirtualPath(path.to_string()))
    }

    pub fn root() -> Self {
        VirtualPath("/".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Parent path, or `None` for the root.
    pub fn parent(&self) -> Option<VirtualPath> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) => Some(VirtualPath::root()),
            Some(pos) => Some(VirtualPath(self.0[..pos].to_string())),
            None => None,
        }
    }

    /// Final component, or `None` for the root.
    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        self.0.rsplit('/').next()
    }

    pub fn join(&self, segment: &str) -> Result<VirtualPath> {
        if segment.starts_with('/') {
            return Err(DriverError::InvalidPath(
                "join segment must be relative".to_string(),
            ));
        }
        let combined = if self.is_root() {
            format!("/{}", segment)
        } else {
            format!("{}/{}", self.0, segment)
        };
        VirtualPath::new(&combined)
    }

    /// Whether this path equals `dir` or lies beneath it, comparing whole segments.
    pub fn is_under(&self, dir: &str) -> bool {
        is_path_under(&self.0, dir)
    }

    /// The path with a trailing `/`, used as a listing prefix.
    pub fn as_dir_prefix(&self) -> String {
        if self.is_root() {
            self.0.clone()
        } else {
            format!("{}/", self.0)
        }
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Segment-aware prefix check on raw path strings.
pub fn is_path_under(path: &str, dir: &str) -> bool {
    if dir == "/" {
        return path.starts_with('/');
    }
    match path.strip_prefix(dir) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Description of a file or inferred directory.
///
/// `size` and `mod_time` carry no meaning for directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    pub path: String,
    pub is_dir: bool,
    pub size: u64,
    pub mod_time: Option<DateTime<Utc>>,
}

impl FileInfo {
    pub fn directory(path: impl Into<String>) -> Self {
        FileInfo {
            path: path.into(),
            is_dir: true,
            size: 0,
            mod_time: None,
        }
    }

    pub fn file(path: impl Into<String>, size: u64, mod_time: DateTime<Utc>) -> Self {
        FileInfo {
            path: path.into(),
            is_dir: false,
            size,
            mod_time: Some(mod_time),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_paths() {
        assert!(VirtualPath::new("/docker/registry/v2").is_ok());
        assert!(VirtualPath::new("/").is_ok());
    }

    #[test]
    fn test_rejects_malformed_paths() {
        assert!(VirtualPath::new("").is_err());
        assert!(VirtualPath::new("docker").is_err());
        assert!(VirtualPath::new("/docker/").is_err());
        assert!(VirtualPath::new("/docker//registry").is_err());
        assert!(VirtualPath::new("/docker/../etc").is_err());
        assert!(VirtualPath::new("/docker/./x").is_err());
        assert!(VirtualPath::new("/a\0b").is_err());
    }

    #[test]
    fn test_parent_and_file_name() {
        let p = VirtualPath::new("/a/b/link").unwrap();
        assert_eq!(p.parent().unwrap().as_str(), "/a/b");
        assert_eq!(p.file_name(), Some("link"));
        assert_eq!(VirtualPath::new("/a").unwrap().parent().unwrap().as_str(), "/");
        assert!(VirtualPath::root().parent().is_none());
        assert_eq!(VirtualPath::root().file_name(), None);
    }

    #[test]
    fn test_join() {
        let base = VirtualPath::root();
        assert_eq!(base.join("a/b").unwrap().as_str(), "/a/b");
        let base = VirtualPath::new("/a").unwrap();
        assert_eq!(base.join("b").unwrap().as_str(), "/a/b");
        assert!(base.join("/b").is_err());
        assert!(base.join("../b").is_err());
    }

    #[test]
    fn test_is_under_compares_segments() {
        let p = VirtualPath::new("/a/b/c").unwrap();
        assert!(p.is_under("/a/b"));
        assert!(p.is_under("/a/b/c"));
        assert!(p.is_under("/"));
        assert!(!p.is_under("/a/bc"));
        assert!(!is_path_under("/a/bc", "/a/b"));
    }

    #[test]
    fn test_dir_prefix() {
        assert_eq!(VirtualPath::root().as_dir_prefix(), "/");
        assert_eq!(VirtualPath::new("/a").unwrap().as_dir_prefix(), "/a/");
    }
}
