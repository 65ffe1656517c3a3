//! Deploy request validation: slugs, resource names, replicas and strategy

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{ClusterError, ClusterResult};

/// Longest slug kept from a requested name
pub const MAX_SLUG_CHARS: usize = 40;

/// Slug used when nothing of the requested name survives sanitisation
pub const EMPTY_SLUG: &str = "anon";

/// Length of the random deployment-name suffix
pub const SUFFIX_LEN: usize = 4;

/// Longest accepted resource name
pub const MAX_RESOURCE_NAME: usize = 253;

const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Lowercase the name, replace anything outside `[a-z0-9-]` with a hyphen,
/// collapse hyphen runs, trim edge hyphens and cap at [`MAX_SLUG_CHARS`]
pub fn sanitize_name(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    for c in raw.to_lowercase().chars() {
        let c = if c.is_ascii_lowercase() || c.is_ascii_digit() { c } else { '-' };
        if c == '-' && (slug.is_empty() || slug.ends_with('-')) {
            continue;
        }
        slug.push(c);
    }

    // slug is ASCII, byte truncation is safe
    slug.truncate(MAX_SLUG_CHARS);
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        slug.to_string()
    }
}

/// Random `[a-z0-9]` suffix of [`SUFFIX_LEN`] characters
pub fn random_suffix<R: Rng>(rng: &mut R) -> String {
    (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect()
}

/// `creature-<slug>-<suffix>`
pub fn deployment_name(slug: &str) -> String {
    format!("creature-{}-{}", slug, random_suffix(&mut rand::thread_rng()))
}

/// Reject names that are not DNS-1123 style before they reach a URL path
pub fn validate_resource_name(name: &str) -> ClusterResult<()> {
    if name.is_empty() {
        return Err(ClusterError::InvalidRequest("Missing name".to_string()));
    }
    if name.len() > MAX_RESOURCE_NAME {
        return Err(ClusterError::InvalidRequest(format!(
            "Name longer than {} characters",
            MAX_RESOURCE_NAME
        )));
    }

    let allowed = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.';
    let alnum = |c: Option<char>| c.is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    if !name.chars().all(allowed) || !alnum(name.chars().next()) || !alnum(name.chars().last()) {
        return Err(ClusterError::InvalidRequest(format!("Invalid name: {}", name)));
    }
    Ok(())
}

/// Replica count from a loosely typed request field, clamped to `1..=max`
///
/// Numbers and numeric strings are floored; zero, `null` and anything
/// unparsable become 1.
pub fn coerce_replicas(value: &Value, max: u32) -> u32 {
    let requested = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(true) => Some(1.0),
        _ => None,
    };

    let requested = requested
        .filter(|n| !n.is_nan() && *n != 0.0)
        .unwrap_or(1.0);
    requested.floor().clamp(1.0, f64::from(max.max(1))) as u32
}

/// Deployment update strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Replace pods one at a time
    #[default]
    RollingUpdate,
    /// Kill all pods before starting new ones
    Recreate,
}

impl Strategy {
    /// `Recreate` when asked for exactly that, otherwise the default
    pub fn coerce(value: &Value) -> Self {
        match value.as_str() {
            Some("Recreate") => Strategy::Recreate,
            _ => Strategy::RollingUpdate,
        }
    }

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::RollingUpdate => "RollingUpdate",
            Strategy::Recreate => "Recreate",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
