// SPDX-License-Identifier: MIT

//! Identifier rules: construct ids, file-name sanitization and parameter
//! key translation.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{CdkError, Result};

static CONSTRUCT_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").unwrap());

static GITHUB_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_\-]*$").unwrap());

/// Check a construct id against the allowed character set.
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(CdkError::invalid_id(id, "id must not be empty"));
    }
    if !CONSTRUCT_ID.is_match(id) {
        let bad: String = id
            .chars()
            .filter(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
            .collect();
        return Err(CdkError::invalid_id(
            id,
            format!("contains characters outside [A-Za-z0-9_.-]: {:?}", bad),
        ));
    }
    Ok(())
}

/// Job and step ids as the runner accepts them: start with a letter or `_`,
/// then letters, digits, `-` or `_`.
pub fn is_github_identifier(id: &str) -> bool {
    GITHUB_IDENTIFIER.is_match(id)
}

/// File-name form of an id: lower-cased, `.` replaced by `-`.
pub fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| match c {
            '.' => '-',
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' => c.to_ascii_lowercase(),
            _ => '-',
        })
        .collect()
}

/// Translate a field name (`nodeVersion`, `node_version`) to the hyphenated
/// key the runner expects (`node-version`).
pub fn to_kebab_case(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' || c == ' ' {
            if !out.is_empty() && !out.ends_with('-') {
                out.push('-');
            }
            continue;
        }
        if c.is_ascii_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_ascii_uppercase() => next.is_some_and(|n| n.is_ascii_lowercase()),
                _ => false,
            };
            if boundary && !out.is_empty() && !out.ends_with('-') {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }

    while out.ends_with('-') {
        out.pop();
    }
    out
}
