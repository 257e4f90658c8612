//! Personal hidden-menu overlay.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Menu node ids the current viewer chose to hide.
///
/// A display preference only; it never grants or denies anything.
/// Serialized as a plain JSON array of ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalHideSet(BTreeSet<String>);

impl LocalHideSet {
    /// An empty set: everything permitted is shown.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the node id is hidden.
    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    /// Returns a new set with `id` flipped: hidden if it was shown, shown if
    /// it was hidden.
    pub fn toggled(&self, id: &str) -> Self {
        let mut next = self.clone();
        if !next.0.remove(id) {
            next.0.insert(id.to_string());
        }
        next
    }

    /// Number of hidden ids.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing is hidden.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Hidden ids in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for LocalHideSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_flips_membership() {
        let empty = LocalHideSet::new();
        let hidden = empty.toggled("role");
        assert!(hidden.contains("role"));
        assert_eq!(hidden.len(), 1);

        let shown = hidden.toggled("role");
        assert!(shown.is_empty());
        assert!(empty.is_empty());
    }

    #[test]
    fn test_json_is_plain_array() {
        let set: LocalHideSet = ["param", "demo"].into_iter().collect();
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["demo","param"]"#);

        let back: LocalHideSet = serde_json::from_str(r#"["x","x","y"]"#).unwrap();
        assert_eq!(back.len(), 2);
    }
}
