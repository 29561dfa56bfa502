//! The owned interner backing [`super::Symbol`].

use super::Symbol;
use rustc_hash::FxHashMap;

/// Owns the canonical copy of every interned string for one compilation
/// session. Symbols handed out by one table are meaningless against another.
#[derive(Debug, Default)]
pub struct StringTable {
    strings: Vec<String>,
    lookup: FxHashMap<String, Symbol>,
}

impl StringTable {
    pub fn new() -> Self {
        Self {
            strings: Vec::new(),
            lookup: FxHashMap::default(),
        }
    }

    /// Intern `s`, returning the existing symbol if it was seen before.
    pub fn intern(&mut self, s: &str) -> Symbol {
        if let Some(&sym) = self.lookup.get(s) {
            return sym;
        }
        let sym = Symbol::from_raw(self.strings.len() as u32);
        self.strings.push(s.to_string());
        self.lookup.insert(s.to_string(), sym);
        sym
    }

    /// Look up a string's symbol without interning it if absent.
    pub fn get(&self, s: &str) -> Option<Symbol> {
        self.lookup.get(s).copied()
    }

    /// Resolve a symbol back to its string.
    ///
    /// # Panics
    /// Panics if `symbol` was not produced by this table — an internal
    /// invariant violation, not a user-facing error.
    pub fn resolve(&self, symbol: Symbol) -> &str {
        &self.strings[symbol.raw() as usize]
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_the_same_string_twice_returns_the_same_symbol() {
        let mut table = StringTable::new();
        let a = table.intern("foo");
        let b = table.intern("foo");
        assert_eq!(a, b);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn distinct_strings_get_distinct_symbols() {
        let mut table = StringTable::new();
        let a = table.intern("foo");
        let b = table.intern("bar");
        assert_ne!(a, b);
    }

    #[test]
    fn resolve_round_trips_the_original_string() {
        let mut table = StringTable::new();
        let sym = table.intern("identifier_name");
        assert_eq!(table.resolve(sym), "identifier_name");
    }
}
