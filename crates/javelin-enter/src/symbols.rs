//! Symbols, their flags and the types they carry.

use crate::completer::Completer;
use crate::scopes::ScopeId;
use crate::state::UnitId;
use javelin_ast::PrimitiveKind;
use javelin_common::Span;
use serde::Serialize;
use std::ops::{Index, IndexMut};

/// Unique identifier for a symbol in the [`SymbolArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub const NONE: SymbolId = SymbolId(u32::MAX);

    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }

    pub fn is_some(&self) -> bool {
        !self.is_none()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Package,
    Class,
    Field,
    Method,
    /// Local variable, parameter, or the `this`/`super` pseudo-variables.
    Variable,
    /// Placeholder standing in for a declaration that could not be entered.
    Error,
}

/// Symbol flag bits.
///
/// The low byte mirrors `javelin_ast::modifier_flags` so checked modifiers
/// can be copied straight onto a symbol.
pub mod symbol_flags {
    use javelin_ast::modifier_flags as m;

    pub const NONE: u32 = 0;
    pub const PUBLIC: u32 = m::PUBLIC;
    pub const PRIVATE: u32 = m::PRIVATE;
    pub const PROTECTED: u32 = m::PROTECTED;
    pub const STATIC: u32 = m::STATIC;
    pub const FINAL: u32 = m::FINAL;
    pub const ABSTRACT: u32 = m::ABSTRACT;
    pub const SCRIPT_PRIVATE: u32 = m::SCRIPT_PRIVATE;
    pub const DEPRECATED: u32 = m::DEPRECATED;

    pub const INTERFACE: u32 = 1 << 8;
    pub const ENUM: u32 = 1 << 9;
    pub const MIXIN: u32 = 1 << 10;
    pub const ANNOTATION: u32 = 1 << 11;
    /// Compiler-generated (default constructors, enum helpers, `this`).
    pub const SYNTHETIC: u32 = 1 << 12;
    /// Package has at least one known member.
    pub const EXISTS: u32 = 1 << 13;
    /// Class hierarchy is entered but the class has not been attributed yet.
    pub const UNATTRIBUTED: u32 = 1 << 14;
    /// Class hierarchy has been checked and is free of cycles.
    pub const ACYCLIC: u32 = 1 << 15;
    /// Class is on the current cycle-check path.
    pub const LOCKED: u32 = 1 << 16;
    pub const FROM_SOURCE: u32 = 1 << 17;
    /// Class declared inside a method or initializer.
    pub const LOCAL: u32 = 1 << 18;

    pub const ACCESS: u32 = PUBLIC | PRIVATE | PROTECTED;
    pub const MODIFIERS: u32 = m::ALL;

    /// Names of the set bits, for dumps.
    pub fn names(flags: u32) -> Vec<&'static str> {
        const NAMED: &[(u32, &str)] = &[
            (PUBLIC, "public"),
            (PRIVATE, "private"),
            (PROTECTED, "protected"),
            (STATIC, "static"),
            (FINAL, "final"),
            (ABSTRACT, "abstract"),
            (SCRIPT_PRIVATE, "scriptprivate"),
            (DEPRECATED, "deprecated"),
            (INTERFACE, "interface"),
            (ENUM, "enum"),
            (MIXIN, "mixin"),
            (ANNOTATION, "annotation"),
            (SYNTHETIC, "synthetic"),
            (EXISTS, "exists"),
            (UNATTRIBUTED, "unattributed"),
            (ACYCLIC, "acyclic"),
            (LOCKED, "locked"),
            (FROM_SOURCE, "from_source"),
            (LOCAL, "local"),
        ];
        NAMED
            .iter()
            .filter(|(bit, _)| flags & bit != 0)
            .map(|(_, name)| *name)
            .collect()
    }
}

/// The type attached to a symbol.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Type {
    /// No type: absent superclass, constructor return, not yet computed.
    #[default]
    None,
    Error,
    Primitive { name: PrimitiveKind },
    Class { symbol: SymbolId },
    Array { element: Box<Type> },
    Method { params: Vec<Type>, ret: Box<Type> },
    Package { symbol: SymbolId },
}

impl Type {
    pub fn class(symbol: SymbolId) -> Type {
        Type::Class { symbol }
    }

    pub fn class_symbol(&self) -> Option<SymbolId> {
        match self {
            Type::Class { symbol } => Some(*symbol),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Type::Error)
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Type::None)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassState {
    #[default]
    Stub,
    HierarchyResolving,
    MembersQueued,
    MembersFinished,
}

/// Class-specific symbol data.
#[derive(Clone, Debug, Default)]
pub struct ClassInfo {
    /// `p.Outer.Inner`
    pub fullname: String,
    /// `p.Outer$Inner`, `p.Outer$1Local`
    pub flatname: String,
    /// Source unit the class was entered from.
    pub unit: Option<UnitId>,
    pub supertype: Type,
    /// Interfaces, mixins included.
    pub interfaces: Vec<Type>,
    pub mixins: Vec<Type>,
    pub state: ClassState,
    /// Local scope holding `this` and `super`.
    pub local_scope: ScopeId,
    /// Where the first supertype was written, for cycle diagnostics.
    pub supertype_span: Span,
}

impl ClassInfo {
    /// Direct supertypes in lookup order: superclass first, then interfaces.
    pub fn direct_supertypes(&self) -> impl Iterator<Item = SymbolId> + '_ {
        std::iter::once(&self.supertype)
            .chain(self.interfaces.iter())
            .filter_map(Type::class_symbol)
    }
}

#[derive(Clone, Debug)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: String,
    /// Enclosing symbol; `NONE` only for the root package.
    pub owner: SymbolId,
    pub flags: u32,
    pub ty: Type,
    /// Member scope of a package or class.
    pub members: ScopeId,
    /// Pending population; `None` once complete.
    pub completer: Option<Completer>,
    pub class: Option<Box<ClassInfo>>,
    pub span: Span,
}

impl Symbol {
    pub fn new(kind: SymbolKind, name: &str, owner: SymbolId, flags: u32) -> Self {
        Symbol {
            kind,
            name: name.to_string(),
            owner,
            flags,
            ty: Type::None,
            members: ScopeId::NONE,
            completer: None,
            class: None,
            span: Span::DUMMY,
        }
    }

    #[inline]
    pub fn has_flag(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }

    pub fn is_class(&self) -> bool {
        self.kind == SymbolKind::Class
    }

    pub fn is_package(&self) -> bool {
        self.kind == SymbolKind::Package
    }

    pub fn is_interface(&self) -> bool {
        self.has_flag(symbol_flags::INTERFACE)
    }

    pub fn is_static(&self) -> bool {
        self.has_flag(symbol_flags::STATIC)
    }

    pub fn is_complete(&self) -> bool {
        self.completer.is_none()
    }

    pub fn class_info(&self) -> Option<&ClassInfo> {
        self.class.as_deref()
    }

    pub fn class_info_mut(&mut self) -> Option<&mut ClassInfo> {
        self.class.as_deref_mut()
    }

    pub fn flatname(&self) -> &str {
        self.class_info().map_or(&self.name, |c| &c.flatname)
    }
}

/// Arena of all symbols, indexed by [`SymbolId`].
#[derive(Debug, Default)]
pub struct SymbolArena {
    symbols: Vec<Symbol>,
}

impl SymbolArena {
    pub fn new() -> Self {
        SymbolArena::default()
    }

    /// Allocate a symbol.
    ///
    /// The owner must already be allocated (only the first symbol, the root
    /// package, may have no owner), so owner ids strictly decrease along any
    /// owner chain.
    pub fn alloc(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        debug_assert!(
            if symbol.owner.is_none() {
                self.symbols.is_empty()
            } else {
                symbol.owner.0 < id.0
            },
            "symbol '{}' allocated before its owner",
            symbol.name
        );
        self.symbols.push(symbol);
        id
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: SymbolId) -> Option<&mut Symbol> {
        self.symbols.get_mut(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (SymbolId(i as u32), s))
    }

    /// Owner chain starting at `id` itself and ending at the root package.
    pub fn owners(&self, id: SymbolId) -> impl Iterator<Item = SymbolId> + '_ {
        std::iter::successors(Some(id).filter(|id| id.is_some()), |id| {
            self.get(*id).map(|s| s.owner).filter(|o| o.is_some())
        })
    }
}

impl Index<SymbolId> for SymbolArena {
    type Output = Symbol;

    fn index(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }
}

impl IndexMut<SymbolId> for SymbolArena {
    fn index_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0 as usize]
    }
}
