//! The symbol table: symbol and scope arenas plus the package and class
//! registries.

use crate::completer::Completer;
use crate::scopes::{ScopeArena, ScopeId, ScopeKind};
use crate::symbols::{ClassInfo, Symbol, SymbolArena, SymbolId, SymbolKind, Type, symbol_flags};
use javelin_common::Span;
use rustc_hash::FxHashMap;
use tracing::trace;

#[derive(Debug)]
pub struct SymbolTable {
    pub symbols: SymbolArena,
    pub scopes: ScopeArena,
    pub root_package: SymbolId,
    pub unnamed_package: SymbolId,
    /// Named packages by full name.
    packages: FxHashMap<String, SymbolId>,
    /// Every class symbol by flat name.
    classes: FxHashMap<String, SymbolId>,
    /// Classes entered from source, by flat name.
    compiled: FxHashMap<String, SymbolId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut symbols = SymbolArena::new();
        let mut scopes = ScopeArena::new();

        let root_package = symbols.alloc(Symbol::new(
            SymbolKind::Package,
            "",
            SymbolId::NONE,
            symbol_flags::EXISTS,
        ));
        symbols[root_package].members = scopes.alloc(ScopeKind::Members, root_package, ScopeId::NONE);
        symbols[root_package].ty = Type::Package {
            symbol: root_package,
        };

        let unnamed_package =
            symbols.alloc(Symbol::new(SymbolKind::Package, "", root_package, 0));
        symbols[unnamed_package].members =
            scopes.alloc(ScopeKind::Members, unnamed_package, ScopeId::NONE);
        symbols[unnamed_package].ty = Type::Package {
            symbol: unnamed_package,
        };
        symbols[unnamed_package].completer = Some(Completer::Package);

        SymbolTable {
            symbols,
            scopes,
            root_package,
            unnamed_package,
            packages: FxHashMap::default(),
            classes: FxHashMap::default(),
            compiled: FxHashMap::default(),
        }
    }

    // =========================================================================
    // Packages
    // =========================================================================

    /// The package symbol for `fullname`, creating it and its parents as needed.
    ///
    /// The empty name denotes the unnamed package.
    pub fn enter_package(&mut self, fullname: &str) -> SymbolId {
        if fullname.is_empty() {
            return self.unnamed_package;
        }
        if let Some(&pkg) = self.packages.get(fullname) {
            return pkg;
        }
        let (owner, simple) = match fullname.rsplit_once('.') {
            Some((qualifier, simple)) => (self.enter_package(qualifier), simple),
            None => (self.root_package, fullname),
        };
        let pkg = self
            .symbols
            .alloc(Symbol::new(SymbolKind::Package, simple, owner, 0));
        let members = self.scopes.alloc(ScopeKind::Members, pkg, ScopeId::NONE);
        let symbol = &mut self.symbols[pkg];
        symbol.members = members;
        symbol.ty = Type::Package { symbol: pkg };
        symbol.completer = Some(Completer::Package);
        let owner_members = self.symbols[owner].members;
        self.scopes.enter(owner_members, simple, pkg);
        self.packages.insert(fullname.to_string(), pkg);
        trace!(package = fullname, "entered package");
        pkg
    }

    pub fn lookup_package(&self, fullname: &str) -> Option<SymbolId> {
        if fullname.is_empty() {
            return Some(self.unnamed_package);
        }
        self.packages.get(fullname).copied()
    }

    /// Mark `pkg` and every enclosing package as existing.
    pub fn mark_package_exists(&mut self, pkg: SymbolId) {
        let chain: Vec<SymbolId> = self.symbols.owners(pkg).collect();
        for id in chain {
            let symbol = &mut self.symbols[id];
            if symbol.is_package() {
                symbol.flags |= symbol_flags::EXISTS;
            }
        }
    }

    pub fn packages(&self) -> impl Iterator<Item = (&str, SymbolId)> {
        self.packages.iter().map(|(name, id)| (name.as_str(), *id))
    }

    // =========================================================================
    // Classes
    // =========================================================================

    /// The class symbol named `name` owned by the package or class `owner`.
    ///
    /// Returns the existing symbol when the flat name is already known;
    /// otherwise creates a class-path stub with a `ClassFile` completer.
    pub fn enter_class(&mut self, name: &str, owner: SymbolId) -> SymbolId {
        let (flatname, fullname) = self.member_class_names(name, owner);
        if let Some(&existing) = self.classes.get(&flatname) {
            return existing;
        }
        self.define_class(name, owner, flatname, fullname, symbol_flags::NONE)
    }

    /// Create a class with an explicitly chosen flat name (local classes).
    pub fn define_local_class(&mut self, name: &str, owner: SymbolId, flatname: String) -> SymbolId {
        self.define_class(
            name,
            owner,
            flatname,
            name.to_string(),
            symbol_flags::LOCAL,
        )
    }

    fn define_class(
        &mut self,
        name: &str,
        owner: SymbolId,
        flatname: String,
        fullname: String,
        flags: u32,
    ) -> SymbolId {
        let id = self
            .symbols
            .alloc(Symbol::new(SymbolKind::Class, name, owner, flags));
        let members = self.scopes.alloc(ScopeKind::Members, id, ScopeId::NONE);
        let symbol = &mut self.symbols[id];
        symbol.members = members;
        symbol.ty = Type::class(id);
        symbol.completer = Some(Completer::ClassFile);
        symbol.class = Some(Box::new(ClassInfo {
            fullname,
            flatname: flatname.clone(),
            ..ClassInfo::default()
        }));
        trace!(class = %flatname, "entered class");
        self.classes.insert(flatname, id);
        id
    }

    fn member_class_names(&self, name: &str, owner: SymbolId) -> (String, String) {
        let owner_sym = &self.symbols[owner];
        if owner_sym.is_class() {
            let info = owner_sym.class_info();
            let flat = info.map_or(owner_sym.name.as_str(), |c| c.flatname.as_str());
            let full = info.map_or(owner_sym.name.as_str(), |c| c.fullname.as_str());
            (format!("{flat}${name}"), format!("{full}.{name}"))
        } else {
            let qualified = match self.fullname(owner) {
                prefix if prefix.is_empty() => name.to_string(),
                prefix => format!("{prefix}.{name}"),
            };
            (qualified.clone(), qualified)
        }
    }

    /// Placeholder returned for a declaration that could not be entered.
    pub fn error_symbol(&mut self, name: &str, owner: SymbolId) -> SymbolId {
        let id = self
            .symbols
            .alloc(Symbol::new(SymbolKind::Error, name, owner, 0));
        self.symbols[id].ty = Type::Error;
        id
    }

    /// Allocate a field/method/variable owned by `owner`, not entered anywhere.
    pub fn new_member(
        &mut self,
        kind: SymbolKind,
        name: &str,
        owner: SymbolId,
        flags: u32,
        ty: Type,
        span: Span,
    ) -> SymbolId {
        let id = self.symbols.alloc(Symbol::new(kind, name, owner, flags));
        let symbol = &mut self.symbols[id];
        symbol.ty = ty;
        symbol.span = span;
        id
    }

    /// Allocate a member and enter it into the owner's member scope.
    pub fn enter_member(
        &mut self,
        kind: SymbolKind,
        name: &str,
        owner: SymbolId,
        flags: u32,
        ty: Type,
    ) -> SymbolId {
        let id = self.new_member(kind, name, owner, flags, ty, Span::DUMMY);
        let members = self.symbols[owner].members;
        self.scopes.enter(members, name, id);
        id
    }

    pub fn class_by_flatname(&self, flatname: &str) -> Option<SymbolId> {
        self.classes.get(flatname).copied()
    }

    pub fn compiled(&self, flatname: &str) -> Option<SymbolId> {
        self.compiled.get(flatname).copied()
    }

    pub fn mark_compiled(&mut self, sym: SymbolId) {
        let flatname = self.symbols[sym].flatname().to_string();
        self.compiled.insert(flatname, sym);
    }

    /// Source classes by flat name, sorted.
    pub fn compiled_classes(&self) -> Vec<(&str, SymbolId)> {
        let mut classes: Vec<_> = self
            .compiled
            .iter()
            .map(|(name, id)| (name.as_str(), *id))
            .collect();
        classes.sort_unstable();
        classes
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id)
    }

    /// Qualified name: `p.q` for packages, `p.A.B` for classes, else the
    /// simple name.
    pub fn fullname(&self, id: SymbolId) -> String {
        let Some(symbol) = self.symbols.get(id) else {
            return String::new();
        };
        match symbol.kind {
            SymbolKind::Package => {
                let mut parts: Vec<&str> = self
                    .symbols
                    .owners(id)
                    .map(|p| self.symbols[p].name.as_str())
                    .filter(|n| !n.is_empty())
                    .collect();
                parts.reverse();
                parts.join(".")
            }
            SymbolKind::Class => symbol
                .class_info()
                .map_or_else(|| symbol.name.clone(), |c| c.fullname.clone()),
            _ => symbol.name.clone(),
        }
    }

    pub fn flatname(&self, id: SymbolId) -> String {
        self.symbols
            .get(id)
            .map(|s| s.flatname().to_string())
            .unwrap_or_default()
    }

    /// The package a symbol belongs to.
    pub fn package_of(&self, id: SymbolId) -> SymbolId {
        self.symbols
            .owners(id)
            .find(|&o| self.symbols[o].is_package())
            .unwrap_or(self.root_package)
    }

    /// The outermost class enclosing `id` (itself if top-level).
    pub fn outermost_class(&self, id: SymbolId) -> Option<SymbolId> {
        self.symbols
            .owners(id)
            .filter(|&o| self.symbols[o].is_class())
            .last()
    }

    /// Nearest enclosing class of `id`, excluding `id` itself.
    pub fn enclosing_class(&self, id: SymbolId) -> Option<SymbolId> {
        self.symbols
            .owners(id)
            .skip(1)
            .find(|&o| self.symbols[o].is_class())
    }

    pub fn class_info(&self, id: SymbolId) -> Option<&ClassInfo> {
        self.symbols.get(id).and_then(Symbol::class_info)
    }

    pub fn class_info_mut(&mut self, id: SymbolId) -> Option<&mut ClassInfo> {
        self.symbols.get_mut(id).and_then(Symbol::class_info_mut)
    }

    pub fn has_flag(&self, id: SymbolId, flag: u32) -> bool {
        self.symbols.get(id).is_some_and(|s| s.has_flag(flag))
    }

    /// Class-kind members named `name` in the member scope of `owner`.
    pub fn member_classes_named(&self, owner: SymbolId, name: &str) -> Option<SymbolId> {
        let members = self.symbols.get(owner)?.members;
        self.scopes
            .lookup(members, name)
            .iter()
            .copied()
            .find(|&s| self.symbols[s].is_class())
    }

    /// Human-readable rendering of a type.
    pub fn type_to_string(&self, ty: &Type) -> String {
        match ty {
            Type::None => "none".to_string(),
            Type::Error => "<error>".to_string(),
            Type::Primitive { name } => name.name().to_string(),
            Type::Class { symbol } | Type::Package { symbol } => self.fullname(*symbol),
            Type::Array { element } => format!("{}[]", self.type_to_string(element)),
            Type::Method { params, ret } => {
                let params: Vec<String> = params.iter().map(|p| self.type_to_string(p)).collect();
                format!("({}){}", params.join(","), self.type_to_string(ret))
            }
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_package_creates_parents() {
        let mut symtab = SymbolTable::new();
        let pkg = symtab.enter_package("a.b.c");
        assert_eq!(symtab.fullname(pkg), "a.b.c");
        let parent = symtab.lookup_package("a.b").expect("parent entered");
        assert_eq!(symtab.symbols[pkg].owner, parent);
        assert_eq!(symtab.enter_package("a.b.c"), pkg);
        assert_eq!(symtab.lookup_package(""), Some(symtab.unnamed_package));
    }

    #[test]
    fn test_mark_exists_propagates_up() {
        let mut symtab = SymbolTable::new();
        let pkg = symtab.enter_package("a.b");
        symtab.mark_package_exists(pkg);
        let a = symtab.lookup_package("a").expect("a");
        assert!(symtab.has_flag(a, symbol_flags::EXISTS));
        assert!(symtab.has_flag(pkg, symbol_flags::EXISTS));
    }

    #[test]
    fn test_class_names() {
        let mut symtab = SymbolTable::new();
        let pkg = symtab.enter_package("p");
        let outer = symtab.enter_class("Outer", pkg);
        let inner = symtab.enter_class("Inner", outer);
        assert_eq!(symtab.flatname(inner), "p.Outer$Inner");
        assert_eq!(symtab.fullname(inner), "p.Outer.Inner");
        assert_eq!(symtab.enter_class("Inner", outer), inner);
        assert_eq!(symtab.outermost_class(inner), Some(outer));
        assert_eq!(symtab.package_of(inner), pkg);

        let top = symtab.enter_class("Top", symtab.unnamed_package);
        assert_eq!(symtab.flatname(top), "Top");
    }
}
