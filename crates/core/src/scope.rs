//! Scope hierarchy and cleanup planning
//!
//! A scope may encode a hierarchy as `:`-separated segments
//! (`"flow:node"`). Cleanup decides, from a caller-supplied set of live
//! segment names, which physical keys belong to dead parts of that hierarchy.
//!
//! ## Cleanup rule
//!
//! For every physical key under the store prefix:
//!
//! 1. Strip the prefix and split the remainder on `:`.
//! 2. Fewer than two parts: the key is exempt.
//! 3. Otherwise every part except the last is the scope path; the last part
//!    is the leaf key and is never checked.
//! 4. The key is removed iff some scope path segment is outside
//!    `active ∪ {"global"}`.

use crate::codec::SEPARATOR;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Scope that is always active and never cleaned
pub const GLOBAL_SCOPE: &str = "global";

/// Set of scope segment names considered alive
///
/// Always contains [`GLOBAL_SCOPE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ActiveSet {
    segments: HashSet<String>,
}

impl ActiveSet {
    /// Build an active set from segment names, adding `"global"`.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut segments: HashSet<String> = segments.into_iter().map(Into::into).collect();
        segments.insert(GLOBAL_SCOPE.to_string());
        Self { segments }
    }

    /// Active set with nothing alive except `"global"`.
    pub fn empty() -> Self {
        Self::new(std::iter::empty::<String>())
    }

    /// Whether `segment` is alive
    pub fn contains(&self, segment: &str) -> bool {
        self.segments.contains(segment)
    }

    /// Whether every segment of `path` is alive
    pub fn covers<'a, I>(&self, path: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        path.into_iter().all(|segment| self.contains(segment))
    }

    /// Number of live segments, `"global"` included
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false: `"global"` is always present
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl Default for ActiveSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Vec<String>> for ActiveSet {
    fn from(segments: Vec<String>) -> Self {
        Self::new(segments)
    }
}

impl From<ActiveSet> for Vec<String> {
    fn from(set: ActiveSet) -> Self {
        let mut segments: Vec<String> = set.segments.into_iter().collect();
        segments.sort();
        segments
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for ActiveSet {
    fn from(segments: [S; N]) -> Self {
        Self::new(segments)
    }
}

impl<S: Into<String>> FromIterator<S> for ActiveSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Split a scope into its hierarchy segments.
pub fn segments(scope: &str) -> impl Iterator<Item = &str> {
    scope.split(SEPARATOR)
}

/// Whether a physical key must be removed by cleanup.
///
/// Keys outside `prefix` are never removed.
pub fn is_stale(prefix: &str, physical: &str, active: &ActiveSet) -> bool {
    let Some(rest) = physical.strip_prefix(prefix) else {
        return false;
    };
    let parts: Vec<&str> = rest.split(SEPARATOR).collect();
    if parts.len() <= 1 {
        return false;
    }
    let path = &parts[..parts.len() - 1];
    !active.covers(path.iter().copied())
}

/// Select the physical keys cleanup should remove.
pub fn plan_cleanup<'a>(prefix: &str, keys: &'a [String], active: &ActiveSet) -> Vec<&'a str> {
    keys.iter()
        .map(String::as_str)
        .filter(|key| is_stale(prefix, key, active))
        .collect()
}
