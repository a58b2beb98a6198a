//! Declaration checks: modifiers, uniqueness, and cyclic inheritance.

use crate::env::Env;
use crate::error::FatalError;
use crate::scopes::ScopeId;
use crate::state::{Enter, UnitId};
use crate::symbols::{ClassState, SymbolId, SymbolKind, Type, symbol_flags};
use javelin_ast::modifier_flags;
use javelin_common::limits::MAX_SUPERTYPE_WALK;
use javelin_common::{Span, diagnostic_codes};
use tracing::debug;

/// Where a declaration appears; decides which modifiers are legal and
/// which are implied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeclContext {
    TopLevelClass,
    MemberClass { owner_interface: bool },
    LocalClass,
    Field { owner_interface: bool },
    Method { owner_interface: bool, is_constructor: bool },
    LocalVar,
}

impl DeclContext {
    /// `(allowed, implied)` modifier masks.
    fn masks(self) -> (u32, u32) {
        use symbol_flags::*;
        match self {
            DeclContext::TopLevelClass => (PUBLIC | ABSTRACT | FINAL | SCRIPT_PRIVATE | DEPRECATED, 0),
            DeclContext::MemberClass { owner_interface: true } => {
                (PUBLIC | STATIC | ABSTRACT | FINAL | DEPRECATED, PUBLIC | STATIC)
            }
            DeclContext::MemberClass { owner_interface: false } => (
                ACCESS | STATIC | ABSTRACT | FINAL | SCRIPT_PRIVATE | DEPRECATED,
                0,
            ),
            DeclContext::LocalClass => (ABSTRACT | FINAL | DEPRECATED, 0),
            DeclContext::Field { owner_interface: true } => {
                (PUBLIC | STATIC | FINAL | DEPRECATED, PUBLIC | STATIC | FINAL)
            }
            DeclContext::Field { owner_interface: false } => {
                (ACCESS | STATIC | FINAL | SCRIPT_PRIVATE | DEPRECATED, 0)
            }
            DeclContext::Method { is_constructor: true, .. } => (ACCESS | DEPRECATED, 0),
            DeclContext::Method { owner_interface: true, .. } => {
                (PUBLIC | ABSTRACT | STATIC | DEPRECATED, PUBLIC)
            }
            DeclContext::Method { .. } => (
                ACCESS | STATIC | FINAL | ABSTRACT | SCRIPT_PRIVATE | DEPRECATED,
                0,
            ),
            DeclContext::LocalVar => (FINAL | DEPRECATED, 0),
        }
    }

    fn is_method(self) -> bool {
        matches!(self, DeclContext::Method { .. })
    }
}

impl Enter {
    /// Drop and report modifiers that are illegal in `context`, then add the
    /// implied ones.
    pub(crate) fn check_flags(
        &mut self,
        env: &Env,
        span: Span,
        flags: u32,
        context: DeclContext,
    ) -> u32 {
        use symbol_flags::*;
        let (allowed, implied) = context.masks();

        let illegal = flags & MODIFIERS & !allowed;
        for bit in (0..8).map(|i| 1u32 << i).filter(|bit| illegal & bit != 0) {
            self.report(
                env,
                span,
                diagnostic_codes::MODIFIER_NOT_ALLOWED,
                &[modifier_flags::name(bit)],
            );
        }

        let mut explicit = flags & allowed;
        let mut exclusive = vec![
            (PUBLIC, PRIVATE),
            (PUBLIC, PROTECTED),
            (PRIVATE, PROTECTED),
            (ABSTRACT, FINAL),
        ];
        if context.is_method() {
            exclusive.push((ABSTRACT, PRIVATE));
            exclusive.push((ABSTRACT, STATIC));
        }
        for (first, second) in exclusive {
            if explicit & first != 0 && explicit & second != 0 {
                self.report(
                    env,
                    span,
                    diagnostic_codes::ILLEGAL_MODIFIER_COMBINATION,
                    &[modifier_flags::name(first), modifier_flags::name(second)],
                );
                explicit &= !second;
            }
        }

        let mut checked = explicit | implied;
        if matches!(
            context,
            DeclContext::Method {
                owner_interface: true,
                is_constructor: false
            }
        ) && checked & STATIC == 0
        {
            checked |= ABSTRACT;
        }
        checked
    }

    /// Whether `sym` may be entered into `scope` without clashing with a
    /// variable or class of the same name. Methods may overload.
    pub(crate) fn check_unique(&mut self, env: &Env, span: Span, sym: SymbolId, scope: ScopeId) -> bool {
        let symbol = &self.symtab.symbols[sym];
        if symbol.kind == SymbolKind::Method {
            return true;
        }
        let name = symbol.name.clone();
        let kind = symbol.kind;
        let clash = self
            .symtab
            .scopes
            .lookup(scope, &name)
            .iter()
            .copied()
            .find(|&other| other != sym && same_namespace(self.symtab.symbols[other].kind, kind));
        match clash {
            Some(other) => {
                self.duplicate_error(env, span, &name, self.symtab.symbols[other].owner);
                false
            }
            None => true,
        }
    }

    /// A local variable must not shadow another local of the same method
    /// visible from an enclosing environment.
    pub(crate) fn check_transparent_var(&mut self, env: &Env, span: Span, sym: SymbolId) -> bool {
        let symbol = &self.symtab.symbols[sym];
        if symbol.kind != SymbolKind::Variable {
            return true;
        }
        let (name, owner) = (symbol.name.clone(), symbol.owner);
        let clash = env
            .outers()
            .skip(1)
            .take_while(|e| {
                self.symtab
                    .scopes
                    .get(e.info.scope)
                    .is_some_and(|s| s.owner == owner)
            })
            .flat_map(|e| self.symtab.scopes.lookup(e.info.scope, &name).iter().copied())
            .any(|other| other != sym && self.symtab.symbols[other].kind == SymbolKind::Variable);
        if clash {
            self.duplicate_error(env, span, &name, owner);
        }
        !clash
    }

    /// A class name must be unique in its scope. A class named like one of
    /// its enclosing classes is reported but still entered.
    pub(crate) fn check_unique_class_name(
        &mut self,
        env: &Env,
        span: Span,
        name: &str,
        scope: ScopeId,
    ) -> bool {
        let existing = self
            .symtab
            .scopes
            .lookup(scope, name)
            .iter()
            .copied()
            .find(|&s| self.symtab.symbols[s].is_class());
        if let Some(other) = existing {
            let owner = self.symtab.symbols[other].owner;
            self.duplicate_error(env, span, name, owner);
            return false;
        }

        let scope_owner = self
            .symtab
            .scopes
            .get(scope)
            .map_or(SymbolId::NONE, |s| s.owner);
        let enclosing = self
            .symtab
            .symbols
            .owners(scope_owner)
            .find(|&o| self.symtab.symbols[o].is_class() && self.symtab.symbols[o].name == name);
        if let Some(class) = enclosing {
            let owner = self.symtab.symbols[class].owner;
            self.duplicate_error(env, span, name, owner);
        }
        true
    }

    fn duplicate_error(&mut self, env: &Env, span: Span, name: &str, owner: SymbolId) {
        let owner_sym = &self.symtab.symbols[owner];
        if owner_sym.kind == SymbolKind::Method {
            let method = owner_sym.name.clone();
            self.report(env, span, diagnostic_codes::ALREADY_DEFINED_IN_METHOD, &[name, &method]);
        } else {
            let owner_name = self.symtab.fullname(owner);
            self.report(env, span, diagnostic_codes::ALREADY_DEFINED, &[name, &owner_name]);
        }
    }

    // =========================================================================
    // Cyclic inheritance
    // =========================================================================

    /// Check the supertype/owner graph reachable from `c` for cycles.
    ///
    /// A cycle is reported once, at `span`; every class on it loses its
    /// superclass and the interfaces that close the cycle. Returns whether
    /// `c` was found acyclic.
    ///
    /// `c` must already have its supertypes recorded. Classes are marked
    /// ACYCLIC only when everything reachable from them has its supertypes
    /// recorded too; a class still resolving its hierarchy further up the
    /// completion stack may yet close a cycle.
    pub(crate) fn check_non_cyclic(
        &mut self,
        unit: UnitId,
        span: Span,
        c: SymbolId,
    ) -> Result<bool, FatalError> {
        let walk = self.check_non_cyclic_internal(unit, span, c, c)?;
        Ok(walk.acyclic)
    }

    fn check_non_cyclic_internal(
        &mut self,
        unit: UnitId,
        span: Span,
        root: SymbolId,
        c: SymbolId,
    ) -> Result<CycleWalk, FatalError> {
        if !self.symtab.symbols[c].is_class() || self.symtab.has_flag(c, symbol_flags::ACYCLIC) {
            return Ok(CycleWalk::SETTLED);
        }
        if self.symtab.has_flag(c, symbol_flags::LOCKED) {
            let start = self.cycle_path.iter().position(|&p| p == c).unwrap_or(0);
            let cycle = self.cycle_path[start..].to_vec();
            self.note_cyclic(unit, span, &cycle);
            return Ok(CycleWalk::CYCLIC);
        }
        if self.cycle_path.len() >= MAX_SUPERTYPE_WALK {
            return Ok(CycleWalk::UNSETTLED);
        }

        if !self.symtab.symbols[c].is_complete() && !self.complete_or_report(c, Some(unit), span)? {
            return Ok(CycleWalk::UNSETTLED);
        }
        // Completing `c` may have checked (and severed) it already.
        if self.symtab.has_flag(c, symbol_flags::ACYCLIC | symbol_flags::LOCKED) {
            return self.check_non_cyclic_internal(unit, span, root, c);
        }

        self.symtab.symbols[c].flags |= symbol_flags::LOCKED;
        self.cycle_path.push(c);

        let mut edges: Vec<SymbolId> = self
            .symtab
            .class_info(c)
            .map(|info| info.direct_supertypes().collect())
            .unwrap_or_default();
        let owner = self.symtab.symbols[c].owner;
        if self.symtab.symbols[owner].is_class() {
            edges.push(owner);
        }

        let mut walk = CycleWalk {
            acyclic: true,
            complete: c == root
                || self
                    .symtab
                    .class_info(c)
                    .is_some_and(|info| info.state != ClassState::HierarchyResolving),
        };
        for edge in edges {
            let below = self.check_non_cyclic_internal(unit, span, root, edge)?;
            if !below.acyclic {
                walk.acyclic = false;
                break;
            }
            walk.complete &= below.complete;
        }

        self.cycle_path.pop();
        self.symtab.symbols[c].flags &= !symbol_flags::LOCKED;
        if walk.acyclic && walk.complete {
            self.symtab.symbols[c].flags |= symbol_flags::ACYCLIC;
        }
        Ok(walk)
    }

    fn note_cyclic(&mut self, unit: UnitId, span: Span, cycle: &[SymbolId]) {
        let Some(&first) = cycle.first() else {
            return;
        };
        let name = self.symtab.fullname(first);
        debug!(class = %name, len = cycle.len(), "cyclic inheritance");
        self.report_in(unit, span, diagnostic_codes::CYCLIC_INHERITANCE, &[&name]);

        for &c in cycle {
            let local_scope = match self.symtab.class_info_mut(c) {
                Some(info) => {
                    info.supertype = Type::None;
                    let on_cycle = |t: &Type| t.class_symbol().is_some_and(|s| cycle.contains(&s));
                    info.interfaces.retain(|t| !on_cycle(t));
                    info.mixins.retain(|t| !on_cycle(t));
                    info.local_scope
                }
                None => continue,
            };
            let supers: Vec<SymbolId> = self.symtab.scopes.lookup(local_scope, "super").to_vec();
            for sup in supers {
                self.symtab.scopes.remove(local_scope, "super", sup);
            }
            self.symtab.symbols[c].flags |= symbol_flags::ACYCLIC;
        }
    }
}

/// Outcome of walking the supertype graph below one class.
#[derive(Clone, Copy, Debug)]
struct CycleWalk {
    acyclic: bool,
    /// Every class reached has its supertypes recorded.
    complete: bool,
}

impl CycleWalk {
    const SETTLED: CycleWalk = CycleWalk {
        acyclic: true,
        complete: true,
    };
    const UNSETTLED: CycleWalk = CycleWalk {
        acyclic: true,
        complete: false,
    };
    const CYCLIC: CycleWalk = CycleWalk {
        acyclic: false,
        complete: true,
    };
}

fn same_namespace(a: SymbolKind, b: SymbolKind) -> bool {
    let var_like = |k| matches!(k, SymbolKind::Field | SymbolKind::Variable);
    (var_like(a) && var_like(b)) || (a == SymbolKind::Class && b == SymbolKind::Class)
}
