//! Output locations and import paths
//!
//! Directories are `/`-separated and relative to the output root.

use crate::core::types::namespace;

/// Output directory of a declaration: the explicit override when one is set,
/// otherwise its namespace with `.` mapped to `/`.
pub fn output_dir(qualified_name: &str, path_override: Option<&str>) -> String {
    match path_override.map(normalize).filter(|p| !p.is_empty()) {
        Some(path) => path,
        None => namespace(qualified_name).replace('.', "/"),
    }
}

fn normalize(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect::<Vec<_>>()
        .join("/")
}

fn segments(dir: &str) -> Vec<&str> {
    dir.split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect()
}

/// Relative path from directory `from` to directory `to`.
///
/// Identical directories give `.`; a path that does not already start with
/// `.` gets a `./` prefix.
pub fn relative_path(from: &str, to: &str) -> String {
    let from = segments(from);
    let to = segments(to);

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = Vec::with_capacity(from.len() + to.len() - 2 * common);
    parts.extend(std::iter::repeat_n("..", from.len() - common));
    parts.extend(&to[common..]);

    let relative = parts.join("/");
    if relative.is_empty() {
        ".".to_string()
    } else if relative.starts_with('.') || relative.starts_with('/') {
        relative
    } else {
        format!("./{relative}")
    }
}

/// Module specifier for importing `file_stem` in directory `to` from a file
/// in directory `from`
pub fn import_path(from: &str, to: &str, file_stem: &str) -> String {
    format!("{}/{file_stem}", relative_path(from, to))
}
