//! Branch and remote name validation.
//!
//! Valid branch names:
//! - Must be non-empty
//! - Must not contain whitespace, `~`, `^`, `:`, `?`, `*`, `[`, `\`
//! - Must not contain `..`
//! - Must not start or end with `.` or `/`
//! - Components between slashes must be non-empty and not start with `.`
//!
//! Slashes are allowed so that fetched branches can be named
//! `<remote>/<branch>`. Remote names are single components.

use crate::error::{RefError, Result};

/// Characters that are forbidden anywhere in a ref name.
const FORBIDDEN_CHARS: &[char] = &[' ', '\t', '\n', '\r', '~', '^', ':', '?', '*', '[', '\\'];

fn invalid_branch(name: &str, reason: impl Into<String>) -> RefError {
    RefError::InvalidBranchName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Validate a branch name, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use sprig_refs::names::validate_branch_name;
///
/// assert!(validate_branch_name("main").is_ok());
/// assert!(validate_branch_name("origin/main").is_ok());
/// assert!(validate_branch_name("").is_err());
/// assert!(validate_branch_name("bad..name").is_err());
/// ```
pub fn validate_branch_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(invalid_branch(name, "branch name must not be empty"));
    }

    if let Some(ch) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(invalid_branch(name, format!("contains forbidden character: {ch:?}")));
    }

    if name.contains("..") {
        return Err(invalid_branch(name, "must not contain '..'"));
    }

    if name.starts_with('.') || name.ends_with('.') {
        return Err(invalid_branch(name, "must not start or end with '.'"));
    }

    if name.starts_with('/') || name.ends_with('/') {
        return Err(invalid_branch(name, "must not start or end with '/'"));
    }

    for component in name.split('/') {
        if component.is_empty() {
            return Err(invalid_branch(name, "path components must not be empty"));
        }
        if component.starts_with('.') {
            return Err(invalid_branch(
                name,
                format!("component must not start with '.': {component:?}"),
            ));
        }
    }

    Ok(())
}

/// Validate a remote name. Must be a single component (no slashes).
pub fn validate_remote_name(name: &str) -> Result<()> {
    let invalid = |reason: String| RefError::InvalidRemoteName {
        name: name.to_string(),
        reason,
    };
    if name.is_empty() {
        return Err(invalid("remote name must not be empty".into()));
    }
    if name.contains('/') {
        return Err(invalid("remote name must not contain '/'".into()));
    }
    if let Some(ch) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(invalid(format!("contains forbidden character: {ch:?}")));
    }
    if name.starts_with('.') {
        return Err(invalid("remote name must not start with '.'".into()));
    }
    Ok(())
}

/// Local branch that records the tip fetched from `remote`'s `branch`.
pub fn tracking_branch_name(remote: &str, branch: &str) -> String {
    format!("{remote}/{branch}")
}
