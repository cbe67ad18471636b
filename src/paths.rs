//! Expansion of user-supplied file paths

use crate::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Expand `$VAR` / `${VAR}` and a leading `~`, then make the path absolute
///
/// Unset variables expand to nothing. The result is cleaned lexically:
/// `.` segments are dropped and `..` removes the segment before it.
pub fn expand_path(input: &str) -> Result<PathBuf> {
    let expanded = expand_env(input);

    let with_home = match expanded.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => {
            let home = dirs::home_dir()
                .ok_or_else(|| Error::Config("Could not find home directory".into()))?;
            home.join(rest.trim_start_matches(|c: char| c == '/' || c == '\\'))
        }
        _ => PathBuf::from(&expanded),
    };

    let absolute = if with_home.is_absolute() {
        with_home
    } else {
        std::env::current_dir()?.join(with_home)
    };
    Ok(clean(&absolute))
}

fn expand_env(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        let name: String = if chars.peek() == Some(&'{') {
            chars.next();
            chars.by_ref().take_while(|&c| c != '}').collect()
        } else {
            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_ascii_alphanumeric() || c == '_' {
                    name.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            if name.is_empty() {
                out.push('$');
                continue;
            }
            name
        };
        out.push_str(&std::env::var(&name).unwrap_or_default());
    }
    out
}

fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
