//! Role → colour mapping shared by every frame of a sprite

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::shape::Shape;

/// Hues assigned round-robin when no palette could be obtained
pub const FALLBACK_HUES: &[&str] = &[
    "#2a2a2a", "#5a8a5a", "#8aba6a", "#ffffff", "#3a3a3a", "#dddddd",
];

/// Primary colour reported when none was chosen
pub const DEFAULT_PRIMARY_COLOUR: &str = "#00d4ff";

/// Mapping from role name to a colour value (usually `#rrggbb`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Palette(BTreeMap<String, String>);

impl Palette {
    /// Create an empty palette
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic palette covering `roles` with [`FALLBACK_HUES`]
    pub fn fallback(roles: &[String]) -> Self {
        let mut palette = Self::new();
        palette.fill_missing(roles);
        palette
    }

    /// Keep only `roles`, then give any role still without a colour a fallback hue
    ///
    /// Hues are picked by the role's position in `roles`, so the result does
    /// not depend on what the discarded entries were.
    #[must_use]
    pub fn restricted_to(mut self, roles: &[String]) -> Self {
        self.0.retain(|role, _| roles.iter().any(|r| r == role));
        self.fill_missing(roles);
        self
    }

    fn fill_missing(&mut self, roles: &[String]) {
        for (i, role) in roles.iter().enumerate() {
            self.0
                .entry(role.clone())
                .or_insert_with(|| FALLBACK_HUES[i % FALLBACK_HUES.len()].to_string());
        }
    }

    /// Set the colour of a role
    pub fn insert(&mut self, role: impl Into<String>, colour: impl Into<String>) {
        self.0.insert(role.into(), colour.into());
    }

    /// Colour assigned to a role
    pub fn get(&self, role: &str) -> Option<&str> {
        self.0.get(role).map(String::as_str)
    }

    /// Number of roles with a colour
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no role has a colour
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate `(role, colour)` pairs in role order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Colour a shape paints with: its role's entry, else its `color` as a
    /// palette key, else `color` taken literally
    pub fn resolve<'a>(&'a self, shape: &'a Shape) -> Option<&'a str> {
        if let Some(colour) = self.get(&shape.role) {
            return Some(colour);
        }
        let literal = shape.color.as_deref().filter(|c| !c.is_empty())?;
        Some(self.get(literal).unwrap_or(literal))
    }
}

impl FromIterator<(String, String)> for Palette {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
