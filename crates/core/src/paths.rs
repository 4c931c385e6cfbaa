//! Path helpers shared by resolution and packaging

use std::fs;
use std::path::{Component, Path, PathBuf};

/// Join `path` onto `base` (unless already absolute) and drop `.`/`..`
/// components without touching the filesystem.
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        lexical_normalize(path)
    } else {
        lexical_normalize(&base.join(path))
    }
}

/// Whether two paths name the same directory once made absolute and
/// normalized. Symlinks are resolved when both paths exist. A relative `a`
/// is taken relative to `b`.
pub fn same_directory(a: &Path, b: &Path) -> bool {
    let b = absolutize(b, Path::new("/"));
    let a = absolutize(a, &b);
    match (fs::canonicalize(&a), fs::canonicalize(&b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// `/`-separated form of a relative path, as used for archive entry names.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn lexical_normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
