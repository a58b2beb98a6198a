//! Scope tables.
//!
//! Scopes live in a [`ScopeArena`] and are referred to by [`ScopeId`]. Each
//! scope maps a simple name to the symbols entered under it, in entry order
//! (several for overloaded methods). A delegated scope has no entries of its
//! own: reads and writes both go to its backing scope.

use crate::symbols::SymbolId;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

impl ScopeId {
    pub const NONE: ScopeId = ScopeId(u32::MAX);

    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }
}

impl Default for ScopeId {
    fn default() -> Self {
        ScopeId::NONE
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeKind {
    /// Members of a package or class.
    Members,
    /// Method bodies, class-local `this`/`super`.
    Local,
    /// Single-type and single-static imports, plus the unit's own classes.
    NamedImport,
    /// On-demand imports.
    StarImport,
    Delegated,
}

#[derive(Clone, Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    pub owner: SymbolId,
    pub parent: ScopeId,
    pub delegate: ScopeId,
    entries: FxHashMap<String, SmallVec<[SymbolId; 2]>>,
    /// Names in first-entry order.
    order: Vec<String>,
}

impl Scope {
    fn new(kind: ScopeKind, owner: SymbolId, parent: ScopeId) -> Self {
        Scope {
            kind,
            owner,
            parent,
            delegate: ScopeId::NONE,
            entries: FxHashMap::default(),
            order: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(SmallVec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl ScopeArena {
    pub fn new() -> Self {
        ScopeArena::default()
    }

    pub fn alloc(&mut self, kind: ScopeKind, owner: SymbolId, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope::new(kind, owner, parent));
        id
    }

    /// A scope that forwards every read and write to `backing`.
    pub fn delegated(&mut self, backing: ScopeId, owner: SymbolId) -> ScopeId {
        let parent = self.get(backing).map_or(ScopeId::NONE, |s| s.parent);
        let id = self.alloc(ScopeKind::Delegated, owner, parent);
        self.scopes[id.0 as usize].delegate = backing;
        id
    }

    pub fn get(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id.0 as usize)
    }

    /// Follow delegation to the scope that actually stores entries.
    pub fn resolve(&self, mut id: ScopeId) -> ScopeId {
        while let Some(scope) = self.get(id) {
            if scope.delegate.is_none() {
                break;
            }
            id = scope.delegate;
        }
        id
    }

    fn table_mut(&mut self, id: ScopeId) -> Option<&mut Scope> {
        let id = self.resolve(id);
        self.scopes.get_mut(id.0 as usize)
    }

    /// Enter `sym` under `name`. Multiple symbols per name are kept.
    pub fn enter(&mut self, scope: ScopeId, name: &str, sym: SymbolId) {
        let Some(table) = self.table_mut(scope) else {
            return;
        };
        match table.entries.get_mut(name) {
            Some(list) => list.push(sym),
            None => {
                table.order.push(name.to_string());
                table.entries.insert(name.to_string(), SmallVec::from_elem(sym, 1));
            }
        }
    }

    /// Enter `sym` unless it is already entered under `name`.
    pub fn enter_if_absent(&mut self, scope: ScopeId, name: &str, sym: SymbolId) -> bool {
        if self.includes(scope, name, sym) {
            return false;
        }
        self.enter(scope, name, sym);
        true
    }

    /// Symbols entered under `name` in this scope only.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> &[SymbolId] {
        self.get(self.resolve(scope))
            .and_then(|s| s.entries.get(name))
            .map(|list| list.as_slice())
            .unwrap_or(&[])
    }

    /// Symbols under `name` in the nearest scope of the parent chain that has any.
    pub fn lookup_chain(&self, mut scope: ScopeId, name: &str) -> &[SymbolId] {
        while let Some(s) = self.get(scope) {
            let found = self.lookup(scope, name);
            if !found.is_empty() {
                return found;
            }
            scope = s.parent;
        }
        &[]
    }

    pub fn includes(&self, scope: ScopeId, name: &str, sym: SymbolId) -> bool {
        self.lookup(scope, name).contains(&sym)
    }

    /// All `(name, symbol)` entries in entry order.
    pub fn symbols(&self, scope: ScopeId) -> Vec<(&str, SymbolId)> {
        let Some(table) = self.get(self.resolve(scope)) else {
            return Vec::new();
        };
        table
            .order
            .iter()
            .filter_map(|name| table.entries.get(name).map(|list| (name, list)))
            .flat_map(|(name, list)| list.iter().map(move |&sym| (name.as_str(), sym)))
            .collect()
    }

    pub fn remove(&mut self, scope: ScopeId, name: &str, sym: SymbolId) -> bool {
        let Some(table) = self.table_mut(scope) else {
            return false;
        };
        let Some(list) = table.entries.get_mut(name) else {
            return false;
        };
        let before = list.len();
        list.retain(|s| *s != sym);
        let removed = list.len() != before;
        if list.is_empty() {
            table.entries.remove(name);
            table.order.retain(|n| n != name);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overloads_kept_in_order() {
        let mut scopes = ScopeArena::new();
        let s = scopes.alloc(ScopeKind::Members, SymbolId(0), ScopeId::NONE);
        scopes.enter(s, "m", SymbolId(1));
        scopes.enter(s, "m", SymbolId(2));
        scopes.enter(s, "f", SymbolId(3));
        assert_eq!(scopes.lookup(s, "m"), &[SymbolId(1), SymbolId(2)]);
        let names: Vec<_> = scopes.symbols(s).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["m", "m", "f"]);
    }

    #[test]
    fn test_delegated_scope_forwards_writes() {
        let mut scopes = ScopeArena::new();
        let backing = scopes.alloc(ScopeKind::Local, SymbolId(0), ScopeId::NONE);
        let delegated = scopes.delegated(backing, SymbolId(5));
        scopes.enter(delegated, "x", SymbolId(7));
        assert_eq!(scopes.lookup(backing, "x"), &[SymbolId(7)]);
        assert_eq!(scopes.lookup(delegated, "x"), &[SymbolId(7)]);
    }

    #[test]
    fn test_lookup_chain_and_remove() {
        let mut scopes = ScopeArena::new();
        let outer = scopes.alloc(ScopeKind::Local, SymbolId(0), ScopeId::NONE);
        let inner = scopes.alloc(ScopeKind::Local, SymbolId(0), outer);
        scopes.enter(outer, "x", SymbolId(1));
        assert_eq!(scopes.lookup_chain(inner, "x"), &[SymbolId(1)]);
        assert!(scopes.lookup(inner, "x").is_empty());

        assert!(!scopes.enter_if_absent(outer, "x", SymbolId(1)));
        assert!(scopes.remove(outer, "x", SymbolId(1)));
        assert!(scopes.lookup_chain(inner, "x").is_empty());
        assert!(scopes.symbols(outer).is_empty());
    }
}
