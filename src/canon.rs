//! Path canonicalization.

/// Lexically canonicalize a path, removing redundant components.
/// Does not access the disk, but only simplifies things like
/// "foo/./bar" => "foo/bar" and "foo/../bar" => "bar".
/// Leading ".." components that cannot be backed out of are kept.
pub fn canon_path<T: Into<String>>(inpath: T) -> String {
    let path: String = inpath.into();
    if path.is_empty() {
        return path;
    }
    let rooted = path.starts_with('/');

    let mut components: Vec<&str> = Vec::new();
    // Number of leading ".." components, which cannot be popped.
    let mut parents = 0;
    for comp in path.split('/') {
        match comp {
            "" | "." => {}
            ".." => {
                if components.len() > parents {
                    components.pop();
                } else if !rooted {
                    components.push("..");
                    parents += 1;
                }
            }
            _ => components.push(comp),
        }
    }

    let mut out = String::with_capacity(path.len());
    if rooted {
        out.push('/');
    }
    out.push_str(&components.join("/"));

    // Keep a trailing separator, as in "foo/." => "foo/".
    let last = path.rsplit('/').next().unwrap_or("");
    if path.contains('/') && (last.is_empty() || last == ".") && !components.is_empty() {
        out.push('/');
    }
    out
}

/// Whether a path is anchored to a root: "/x" or "\x", and on Windows also a
/// drive like "C:x".  Elsewhere "c:notes.txt" is an ordinary relative name.
pub fn is_rooted(path: &str) -> bool {
    match path.as_bytes() {
        [b'/', ..] | [b'\\', ..] => true,
        #[cfg(windows)]
        [drive, b':', ..] => drive.is_ascii_alphabetic(),
        _ => false,
    }
}

/// Whether a canonical path climbs out of the directory it is relative to.
pub fn escapes_root(path: &str) -> bool {
    path == ".." || path.starts_with("../")
}
