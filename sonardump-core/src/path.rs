// Turning remote names into local paths

use std::path::{Path, PathBuf};

/// Replace characters the destination filesystem reserves (`:` for drive and
/// alternate-stream syntax on Windows) with `_`.
pub fn sanitize_path(path: &str) -> String {
    path.replace(':', "_")
}

/// Join an untrusted, slash-separated fragment below `base`.
///
/// The fragment is sanitized and split on `/` and `\`; empty, `.` and `..`
/// segments are dropped, so the result never leaves `base`.
pub fn safe_join(base: &Path, fragment: &str) -> PathBuf {
    let mut joined = base.to_path_buf();
    for segment in sanitize_path(fragment).split(['/', '\\']) {
        match segment {
            "" | "." | ".." => continue,
            segment => joined.push(segment),
        }
    }
    joined
}
