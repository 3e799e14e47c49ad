//! # Trust State
//!
//! @title Per-Run Variable Trust Store
//! @author Ramprasad
//!
//! Tracks which local variables are currently considered trusted, keyed by a
//! composite `(file, function, variable)` key. The store is owned by a single
//! flow driver and lives for one analysis run; it must not be shared across
//! parallel workers because correctness depends on strictly sequential,
//! file-ordered eviction.

use log::debug;
use std::collections::HashMap;

/// Composite key identifying one variable in one function of one file.
///
/// A structured key avoids the collision risk of concatenated string keys.
/// Function and variable components are case-folded; files are compared
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TrustKey {
    file: String,
    function: String,
    variable: String,
}

impl TrustKey {
    fn new(file: &str, function: &str, variable: &str) -> Self {
        Self {
            file: file.to_string(),
            function: function.to_lowercase(),
            variable: variable.to_lowercase(),
        }
    }
}

/// Mutable store of per-variable trust verdicts.
#[derive(Debug, Default)]
pub struct TrustState {
    entries: HashMap<TrustKey, bool>,
}

impl TrustState {
    /// Creates an empty trust state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the trust verdict of a variable, overwriting any previous one.
    pub fn set(&mut self, file: &str, function: &str, variable: &str, trusted: bool) {
        self.entries
            .insert(TrustKey::new(file, function, variable), trusted);
    }

    /// Whether a variable is currently trusted.
    pub fn is_trusted(&self, file: &str, function: &str, variable: &str) -> bool {
        self.entries
            .get(&TrustKey::new(file, function, variable))
            .copied()
            .unwrap_or(false)
    }

    /// Removes any trust recorded for a variable.
    pub fn revoke(&mut self, file: &str, function: &str, variable: &str) {
        self.entries.remove(&TrustKey::new(file, function, variable));
    }

    /// Discards every entry belonging to `file`.
    ///
    /// Called by the driver when the traversal crosses a file boundary, so
    /// trust cannot leak between unrelated files that happen to define
    /// same-named functions and variables.
    pub fn evict_file(&mut self, file: &str) {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.file != file);
        let evicted = before - self.entries.len();
        if evicted > 0 {
            debug!("evicted {} trust entries for {}", evicted, file);
        }
    }

    /// Number of tracked entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_lookup() {
        let mut state = TrustState::new();
        state.set("a.php", "find", "query", true);

        assert!(state.is_trusted("a.php", "find", "query"));
        assert!(!state.is_trusted("a.php", "find", "other"));
        assert!(!state.is_trusted("b.php", "find", "query"));
    }

    #[test]
    fn test_lookup_folds_function_and_variable() {
        let mut state = TrustState::new();
        state.set("a.php", "FindAll", "QueryPart", true);

        assert!(state.is_trusted("a.php", "findall", "querypart"));
        assert!(state.is_trusted("a.php", "FINDALL", "QUERYPART"));
    }

    #[test]
    fn test_overwrite_and_revoke() {
        let mut state = TrustState::new();
        state.set("a.php", "find", "x", true);
        state.set("a.php", "find", "x", false);
        assert!(!state.is_trusted("a.php", "find", "x"));

        state.set("a.php", "find", "x", true);
        state.revoke("a.php", "find", "x");
        assert!(!state.is_trusted("a.php", "find", "x"));
        assert!(state.is_empty());
    }

    #[test]
    fn test_file_eviction_is_scoped() {
        let mut state = TrustState::new();
        state.set("a.php", "find", "x", true);
        state.set("a.php", "save", "y", true);
        state.set("b.php", "find", "x", true);

        state.evict_file("a.php");

        assert_eq!(state.len(), 1);
        assert!(!state.is_trusted("a.php", "find", "x"));
        assert!(state.is_trusted("b.php", "find", "x"));
    }
}
