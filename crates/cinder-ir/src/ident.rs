//! Interned identifiers

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// An interned name; equality and hashing are by content
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier(Arc<str>);

impl Identifier {
    /// Creates an identifier without sharing its storage
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    /// The empty identifier
    pub fn empty() -> Self {
        Self::new("")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for Identifier {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({:?})", self.as_str())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for Identifier {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Identifier {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// Hands out identifiers that share storage with earlier ones of equal content
#[derive(Debug, Default)]
pub struct Interner {
    strings: HashSet<Arc<str>>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, name: &str) -> Identifier {
        if let Some(existing) = self.strings.get(name) {
            return Identifier(existing.clone());
        }

        let stored: Arc<str> = Arc::from(name);
        self.strings.insert(stored.clone());
        Identifier(stored)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

/// Names the lowering and the passes refer to
pub mod standard {
    pub const CTOR: &str = ".ctor";
    pub const INVOKE: &str = "Invoke";
    pub const VALUE: &str = "value";
    pub const MAIN: &str = "Main";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interned_identifiers_share_storage() {
        let mut interner = Interner::new();
        let a = interner.intern("Encoding");
        let b = interner.intern("Encoding");

        assert_eq!(a, b);
        assert!(Arc::ptr_eq(&a.0, &b.0));
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn test_equality_is_by_content() {
        let mut interner = Interner::new();
        assert_eq!(interner.intern("Text"), Identifier::new("Text"));
        assert_eq!(Identifier::new("Text"), "Text");
        assert!(Identifier::empty().is_empty());
    }

    #[test]
    fn test_default_is_the_empty_identifier() {
        assert_eq!(Identifier::default(), Identifier::empty());
        assert!(Identifier::default().is_empty());
    }
}
