//! Directory inference between consecutive sorted keys.

/// Every ancestor directory of `current` that `prev` does not already cover.
///
/// `prev` is the last directory emitted and `current` the path of the next
/// entry in sorted order. The result runs outermost to innermost.
///
/// ```text
/// directory_diff("/a/b", "/a/b/c/file")       => ["/a/b/c"]
/// directory_diff("/a/x1", "/a/x2/file")       => ["/a/x2"]
/// directory_diff("/a/x1/file", "/a/x2/y/file") => ["/a/x2", "/a/x2/y"]
/// directory_diff("/", "/a/b/c/file")          => ["/a", "/a/b", "/a/b/c"]
/// ```
pub fn directory_diff(prev: &str, current: &str) -> Vec<String> {
    let mut paths = Vec::new();
    if prev.is_empty() || current.is_empty() {
        return paths;
    }

    let prev_dir = format!("{}/", prev);
    let mut parent = current;
    loop {
        parent = parent_of(parent);
        if parent == "/" || parent == prev || prev_dir.starts_with(&format!("{}/", parent)) {
            break;
        }
        paths.push(parent.to_string());
    }
    paths.reverse();
    paths
}

/// Lexical parent of a `/`-separated path; `/` is its own parent.
fn parent_of(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) | None => "/",
        Some(pos) => &trimmed[..pos],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descend_one_level() {
        assert_eq!(directory_diff("/a/b", "/a/b/c/file"), vec!["/a/b/c"]);
    }

    #[test]
    fn test_sibling_directory() {
        assert_eq!(directory_diff("/a/x1", "/a/x2/file"), vec!["/a/x2"]);
    }

    #[test]
    fn test_from_root() {
        assert_eq!(
            directory_diff("/", "/a/b/c/file"),
            vec!["/a", "/a/b", "/a/b/c"]
        );
    }

    #[test]
    fn test_multi_level_jump_into_sibling() {
        assert_eq!(
            directory_diff("/path/to/folder/folder1/file", "/path/to/folder/folder2/folder1/file"),
            vec!["/path/to/folder/folder2", "/path/to/folder/folder2/folder1"]
        );
    }

    #[test]
    fn test_ascent_back_to_known_directory() {
        assert!(directory_diff("/a/b/c", "/a/file").is_empty());
        assert!(directory_diff("/a/b/c", "/a/b/file").is_empty());
    }

    #[test]
    fn test_same_directory() {
        assert!(directory_diff("/a/b", "/a/b/file").is_empty());
    }

    #[test]
    fn test_empty_inputs() {
        assert!(directory_diff("", "/a/b/file").is_empty());
        assert!(directory_diff("/a", "").is_empty());
    }

    #[test]
    fn test_parent_of() {
        assert_eq!(parent_of("/a/b/c"), "/a/b");
        assert_eq!(parent_of("/a"), "/");
        assert_eq!(parent_of("/"), "/");
    }
}
