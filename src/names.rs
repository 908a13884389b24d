//! Name table for lexical analysis.
//!
//! Every identifier in a circuit description is interned once and referred to
//! by a small [`NameId`] afterwards. The same ID space also hands out
//! anonymous error codes, which never map back to a string.

use std::collections::HashMap;
use std::fmt;

use crate::error::{LogsimError, Result};

/// Interned identifier. IDs are assigned sequentially from 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameId(pub usize);

impl fmt::Display for NameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Bidirectional map between identifier strings and [`NameId`]s.
#[derive(Debug, Clone, Default)]
pub struct Names {
    // `None` marks an ID minted by `unique_error_codes`.
    names: Vec<Option<String>>,
    index: HashMap<String, NameId>,
}

impl Names {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the ID for `name`, assigning the next free ID on first use.
    ///
    /// The name must be non-empty, ASCII alphanumeric and not purely
    /// numeric, so it can never be confused with a number literal.
    pub fn lookup(&mut self, name: &str) -> Result<NameId> {
        if name.is_empty() {
            return Err(LogsimError::invalid_name(name, "name is empty"));
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(LogsimError::invalid_name(name, "name is not alphanumeric"));
        }
        if name.chars().all(|c| c.is_ascii_digit()) {
            return Err(LogsimError::invalid_name(name, "name is a number"));
        }
        Ok(self.intern(name))
    }

    /// Look up several names at once, in order.
    pub fn lookup_all(&mut self, names: &[&str]) -> Result<Vec<NameId>> {
        names.iter().map(|name| self.lookup(name)).collect()
    }

    /// Return the ID for `name` without ever assigning one.
    pub fn query(&self, name: &str) -> Option<NameId> {
        self.index.get(name).copied()
    }

    /// Reverse lookup. Error codes and out-of-range IDs give `None`.
    pub fn get_string(&self, id: NameId) -> Option<&str> {
        self.names.get(id.0).and_then(|slot| slot.as_deref())
    }

    /// Mint `count` fresh IDs that are not attached to any string.
    pub fn unique_error_codes(&mut self, count: usize) -> Vec<NameId> {
        let start = self.names.len();
        self.names.extend(std::iter::repeat(None).take(count));
        (start..start + count).map(NameId).collect()
    }

    /// Number of IDs handed out so far, error codes included.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Intern without validation. Only for names built into the simulator.
    pub(crate) fn intern(&mut self, name: &str) -> NameId {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = NameId(self.names.len());
        self.names.push(Some(name.to_string()));
        self.index.insert(name.to_string(), id);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn used_names() -> Names {
        let mut names = Names::new();
        names.lookup_all(&["Lea", "Robbie", "Dan"]).unwrap();
        names
    }

    #[test]
    fn test_lookup_is_idempotent() {
        let mut names = Names::new();
        let a = names.lookup("SW1").unwrap();
        let b = names.lookup("SW1").unwrap();
        assert_eq!(a, b);
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn test_ids_in_first_lookup_order() {
        let names = used_names();
        assert_eq!(names.query("Lea"), Some(NameId(0)));
        assert_eq!(names.query("Robbie"), Some(NameId(1)));
        assert_eq!(names.query("Dan"), Some(NameId(2)));
    }

    #[test]
    fn test_query_never_declares() {
        let names = Names::new();
        assert_eq!(names.query("Lea"), None);
        assert!(names.is_empty());
    }

    #[test]
    fn test_get_string_round_trip() {
        let mut names = used_names();
        let id = names.lookup("Andrew").unwrap();
        assert_eq!(names.get_string(id), Some("Andrew"));
        assert_eq!(names.get_string(NameId(99)), None);
        assert_eq!(Names::new().get_string(NameId(0)), None);
    }

    #[test]
    fn test_lookup_rejects_invalid_names() {
        let mut names = Names::new();
        assert!(matches!(names.lookup("12"), Err(LogsimError::InvalidName { .. })));
        assert!(names.lookup("").is_err());
        assert!(names.lookup("A.B").is_err());
        assert!(names.lookup("A1").is_ok());
    }

    #[test]
    fn test_unique_error_codes_share_id_space() {
        let mut names = used_names();
        let codes = names.unique_error_codes(5);
        assert_eq!(codes.len(), 5);
        assert_eq!(codes[0], NameId(3));
        assert!(codes.iter().all(|&code| names.get_string(code).is_none()));
        assert_eq!(names.lookup("Next").unwrap(), NameId(8));
    }
}
