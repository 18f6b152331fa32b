//! Dotted/bracketed namespace paths.
//!
//! A path such as `doc.Text.getByIndex(0)[1].value` is a sequence of
//! components: attribute accesses separated by `.`, and subscripts written
//! as `[...]` that attach to the previous component without a dot. Dots
//! inside call parentheses, subscripts or string literals do not separate
//! components.

use crate::error::WorkspaceError;

/// The member name the inspector uses for a struct's raw value.
const RAW_VALUE: &str = "value";

/// Splits `path` into components.
///
/// The empty path (namespace root) has no components.
///
/// # Errors
///
/// Returns [`WorkspaceError::InvalidPath`] for empty components (`a..b`,
/// a leading or trailing dot) and for unbalanced brackets or quotes.
pub fn split_path(path: &str) -> Result<Vec<String>, WorkspaceError> {
    split_components(path, false)
}

fn split_components(path: &str, leading_subscript: bool) -> Result<Vec<String>, WorkspaceError> {
    let invalid = || WorkspaceError::InvalidPath(path.to_string());

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = Vec::new();
    let mut quote: Option<char> = None;
    // Set after a closing subscript, where a following dot is optional.
    let mut after_subscript = false;

    for c in path.chars() {
        if let Some(q) = quote {
            current.push(c);
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => {
                quote = Some(c);
                current.push(c);
            }
            '.' if depth.is_empty() => {
                if current.is_empty() && !after_subscript {
                    return Err(invalid());
                }
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
                after_subscript = false;
                continue;
            }
            '[' if depth.is_empty() => {
                if current.is_empty() && parts.is_empty() && !leading_subscript {
                    return Err(invalid());
                }
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
                depth.push(']');
                current.push(c);
            }
            '(' => {
                depth.push(')');
                current.push(c);
            }
            '[' => {
                depth.push(']');
                current.push(c);
            }
            ')' | ']' => {
                if depth.pop() != Some(c) {
                    return Err(invalid());
                }
                current.push(c);
                if depth.is_empty() && c == ']' && current.starts_with('[') {
                    parts.push(std::mem::take(&mut current));
                    after_subscript = true;
                    continue;
                }
            }
            _ => current.push(c),
        }
        after_subscript = false;
    }

    if quote.is_some() || !depth.is_empty() {
        return Err(invalid());
    }
    if current.is_empty() {
        if path.ends_with('.') {
            return Err(invalid());
        }
    } else {
        parts.push(current);
    }
    Ok(parts)
}

/// Joins components back into a path, attaching subscripts without a dot.
pub fn join_path<S: AsRef<str>>(parts: &[S]) -> String {
    let mut path = String::new();
    for part in parts {
        let part = part.as_ref();
        if !path.is_empty() && !part.starts_with('[') {
            path.push('.');
        }
        path.push_str(part);
    }
    path
}

/// Validates `path` as a navigation target.
///
/// # Errors
///
/// See [`split_path`].
pub fn validate(path: &str) -> Result<(), WorkspaceError> {
    split_path(path).map(|_| ())
}

/// Removes the trailing component. Returns `None` at the root.
///
/// # Errors
///
/// See [`split_path`].
pub fn parent_path(path: &str) -> Result<Option<String>, WorkspaceError> {
    let mut parts = split_path(path)?;
    if parts.pop().is_none() {
        return Ok(None);
    }
    Ok(Some(join_path(&parts)))
}

/// Appends `part` as a new trailing component.
///
/// # Errors
///
/// Returns [`WorkspaceError::InvalidComponent`] unless `part` is exactly one
/// well-formed component, and propagates an invalid `path`.
pub fn append_component(path: &str, part: &str) -> Result<String, WorkspaceError> {
    let component = split_components(part, true)
        .ok()
        .filter(|parts| parts.len() == 1)
        .and_then(|mut parts| parts.pop())
        .ok_or_else(|| WorkspaceError::InvalidComponent(part.to_string()))?;

    let mut parts = split_path(path)?;
    parts.push(component);
    Ok(join_path(&parts))
}

/// Returns the trailing component, if any.
pub fn last_component(path: &str) -> Option<String> {
    split_path(path).ok().and_then(|mut parts| parts.pop())
}

/// Returns true when `path` accesses a struct's raw `value` member, for which
/// the inspector produces no dump.
pub fn is_raw_value_access(path: &str) -> bool {
    split_path(path)
        .map(|parts| parts.len() > 1 && parts.last().is_some_and(|p| p == RAW_VALUE))
        .unwrap_or(false)
}

/// Joins an owner path and a member name into the dotted name used for live
/// documentation queries.
pub fn qualified_name(owner: &str, member: &str) -> String {
    if owner.is_empty() {
        member.to_string()
    } else {
        format!("{owner}.{member}")
    }
}
