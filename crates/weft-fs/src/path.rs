//! Path containment and discovery helpers

use std::path::{Component, Path, PathBuf};

use crate::{Error, Result};

/// Join a relative path onto `root`, refusing anything that could land outside it.
///
/// Absolute paths, drive prefixes and `..` components are rejected. Backslashes
/// are treated as separators so patches written on Windows resolve the same way.
pub fn safe_join(root: &Path, relative: &str) -> Result<PathBuf> {
    let normalized = relative.replace('\\', "/");
    let candidate = Path::new(&normalized);

    if normalized.is_empty() || candidate.is_absolute() {
        return Err(Error::PathEscape { path: relative.to_string() });
    }

    let mut joined = root.to_path_buf();
    for component in candidate.components() {
        match component {
            Component::Normal(part) => joined.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(Error::PathEscape { path: relative.to_string() });
            }
        }
    }

    if joined == root {
        return Err(Error::PathEscape { path: relative.to_string() });
    }
    Ok(joined)
}

/// Canonicalize a path without UNC prefixes, falling back to the input on failure.
pub fn canonical(path: &Path) -> PathBuf {
    dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Walk up from `start` looking for a directory containing `marker`.
///
/// Returns the canonicalized directory that holds the marker.
pub fn find_upwards(start: &Path, marker: impl AsRef<Path>) -> Option<PathBuf> {
    let start = canonical(start);
    let marker = marker.as_ref();
    start
        .ancestors()
        .find(|dir| dir.join(marker).exists())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("src/main.rs", "src/main.rs")]
    #[case("./lib.rs", "lib.rs")]
    #[case("a\\b.txt", "a/b.txt")]
    fn safe_join_accepts_relative(#[case] input: &str, #[case] expected: &str) {
        let root = Path::new("/work/tree");
        assert_eq!(safe_join(root, input).unwrap(), root.join(expected));
    }

    #[rstest]
    #[case("../outside.txt")]
    #[case("src/../../x")]
    #[case("/etc/passwd")]
    #[case("")]
    #[case(".")]
    fn safe_join_rejects_escapes(#[case] input: &str) {
        assert!(matches!(
            safe_join(Path::new("/work/tree"), input),
            Err(Error::PathEscape { .. })
        ));
    }

    #[test]
    fn find_upwards_locates_marker() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join(".weftrc.yaml"), "").unwrap();
        let nested = temp.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_upwards(&nested, ".weftrc.yaml").unwrap();
        assert_eq!(found, dunce::canonicalize(temp.path()).unwrap());
    }
}
