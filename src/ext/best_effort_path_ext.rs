use std::env;
use std::path::{Component, Path, PathBuf};

/// Expands `~`, `$VAR` and `${VAR}` references, anchors relative paths at the
/// current directory and resolves `.` and `..` lexically.
///
/// Unknown variables are left untouched. Symbolic links are not resolved, so
/// the result names the entry the caller spelled out, not its target.
pub fn normalize_node_path(path: &Path) -> PathBuf {
    let expanded = expand_path(path);
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        match env::current_dir() {
            Ok(current_dir) => current_dir.join(expanded),
            Err(_) => expanded,
        }
    };
    normalize_path(&absolute)
}

/// Returns `true` if `name` is exactly one normal path component.
pub fn is_single_component(name: &Path) -> bool {
    let mut components = name.components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn expand_path(path: &Path) -> PathBuf {
    let Some(text) = path.to_str() else {
        return path.to_path_buf();
    };
    let with_home = match text.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with(['/', '\\']) => match home_dir() {
            Some(home) => format!("{home}{rest}"),
            None => text.to_string(),
        },
        _ => text.to_string(),
    };
    PathBuf::from(expand_vars(&with_home))
}

fn home_dir() -> Option<String> {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .ok()
        .filter(|home| !home.is_empty())
}

fn expand_vars(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('$') {
        result.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        let (name, consumed) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => (&braced[..end], end + 2),
                None => ("", 0),
            }
        } else {
            let end = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            (&after[..end], end)
        };

        let value = if name.is_empty() {
            None
        } else {
            env::var(name).ok()
        };
        match value {
            Some(value) => result.push_str(&value),
            None => {
                result.push('$');
                result.push_str(&after[..consumed]);
            }
        }
        rest = &after[consumed..];
    }

    result.push_str(rest);
    result
}

pub fn best_effort_path_display(path: &Path) -> String {
    match path.canonicalize() {
        Ok(canonical_path) => canonical_path.display().to_string(),
        Err(_) => {
            // Try to make an absolute path as fallback with normalization
            let absolute_path = if path.is_absolute() {
                path.to_path_buf()
            } else {
                match env::current_dir() {
                    Ok(current_dir) => current_dir.join(path),
                    Err(_) => path.to_path_buf(),
                }
            };

            let normalized = normalize_path(&absolute_path);
            normalized.display().to_string()
        }
    }
}

fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Never pop past the root or a drive prefix
                if matches!(components.last(), Some(Component::Normal(_))) {
                    components.pop();
                }
            }
            _ => components.push(component),
        }
    }

    components.iter().collect()
}

pub trait BestEffortPathExt {
    fn best_effort_path_display(&self) -> String;
}

impl BestEffortPathExt for Path {
    fn best_effort_path_display(&self) -> String {
        best_effort_path_display(self)
    }
}

impl BestEffortPathExt for PathBuf {
    fn best_effort_path_display(&self) -> String {
        best_effort_path_display(self)
    }
}
