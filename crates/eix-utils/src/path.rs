//! Archive-internal path resolution.
//!
//! Archive paths are always `/`-separated and relative to the archive root,
//! so `std::path` is not used here.

/// Resolve `reference` against `base_dir` and normalize the result.
///
/// An absolute reference (leading `/`) is taken relative to the archive root
/// and ignores `base_dir`.
pub fn resolve(base_dir: &str, reference: &str) -> String {
    normalize(&join(base_dir, reference))
}

/// Join two archive paths with `/`.
pub fn join(base_dir: &str, reference: &str) -> String {
    if base_dir.is_empty() || reference.starts_with('/') {
        reference.to_string()
    } else if base_dir.ends_with('/') {
        format!("{}{}", base_dir, reference)
    } else {
        format!("{}/{}", base_dir, reference)
    }
}

/// Collapse `segment/..` pairs, drop `.` and empty segments and the leading
/// `/`, then decode `%20` to a space.
///
/// A `..` with nothing left to climb out of is dropped. The result is a
/// fixed point: normalizing it again returns it unchanged.
pub fn normalize(path: &str) -> String {
    let mut stack: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            _ => stack.push(segment),
        }
    }
    decode_spaces(&stack.join("/"))
}

/// Decode percent-encoded spaces, the only escape e-book producers commonly leave in paths.
pub fn decode_spaces(path: &str) -> String {
    path.replace("%20", " ")
}
