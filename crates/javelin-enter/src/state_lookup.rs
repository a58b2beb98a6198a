//! Name lookup over the environment chain, member scopes and import scopes.
//!
//! Lookups complete the classes they search. A class that fails to complete
//! is reported and skipped, so only fatal errors are returned.

use crate::env::{Env, EnvTree};
use crate::error::FatalError;
use crate::scopes::ScopeId;
use crate::state::{Enter, UnitId};
use crate::symbols::{Symbol, SymbolId, SymbolKind, symbol_flags};
use javelin_common::limits::MAX_SUPERTYPE_WALK;
use javelin_common::{Span, diagnostic_codes};
use rustc_hash::FxHashSet;
use std::collections::VecDeque;
use tracing::trace;

impl Enter {
    /// Resolve a simple type name in `env`.
    ///
    /// Searches, innermost first: local classes and member types (inherited
    /// ones included) of each enclosing class, the unit's named imports and
    /// own classes, the unit's package, then on-demand imports. Import
    /// environments skip the import scopes.
    pub fn find_type(&mut self, env: &Env, name: &str) -> Result<Option<SymbolId>, FatalError> {
        let chain: Vec<_> = env
            .outers()
            .filter(|e| e.enclosing_class.is_some())
            .map(|e| (e.info.scope, e.enclosing_class))
            .collect();
        let mut searched = SymbolId::NONE;
        for (scope, class) in chain {
            let local = self
                .symtab
                .scopes
                .lookup(scope, name)
                .iter()
                .copied()
                .find(|&s| self.symtab.symbols[s].is_class());
            if local.is_some() {
                return Ok(local);
            }
            if class != searched {
                searched = class;
                if let Some(found) = self.find_member_type(env.unit, class, name, Span::DUMMY)? {
                    return Ok(Some(found));
                }
            }
        }

        let unit = self.unit_state(env.unit);
        let (named, star, package) = (unit.named_import_scope, unit.star_import_scope, unit.package);
        let in_import = env.tree.is_import();

        if !in_import {
            if let Some(found) = self.class_in_scope(named, name) {
                return Ok(Some(found));
            }
        }
        if let Some(found) = self.find_package_member(package, name)? {
            return Ok(Some(found));
        }
        if !in_import {
            return Ok(self.class_in_scope(star, name));
        }
        Ok(None)
    }

    /// Class `name` declared in or imported into package `pkg`, listing the
    /// package's class-path members first if needed.
    pub fn find_package_member(&mut self, pkg: SymbolId, name: &str) -> Result<Option<SymbolId>, FatalError> {
        self.complete_or_report(pkg, None, Span::DUMMY)?;
        let members = self.symtab.symbols[pkg].members;
        Ok(self.class_in_scope(members, name))
    }

    /// Member type `name` of `class` or of any of its supertypes.
    pub fn find_member_type(
        &mut self,
        unit: UnitId,
        class: SymbolId,
        name: &str,
        span: Span,
    ) -> Result<Option<SymbolId>, FatalError> {
        self.find_inherited(unit, class, span, |enter, c| {
            enter.symtab.member_classes_named(c, name)
        })
    }

    /// Field `name` of `class` or of any of its supertypes.
    pub fn find_field(
        &mut self,
        unit: UnitId,
        class: SymbolId,
        name: &str,
        span: Span,
    ) -> Result<Option<SymbolId>, FatalError> {
        self.find_inherited(unit, class, span, |enter, c| {
            enter.finish_if_pending(c);
            let members = enter.symtab.symbols[c].members;
            enter
                .symtab
                .scopes
                .lookup(members, name)
                .iter()
                .copied()
                .find(|&s| enter.symtab.symbols[s].kind == SymbolKind::Field)
        })
    }

    /// Breadth-first walk over `class` and its supertypes, completing each,
    /// until `probe` finds something.
    fn find_inherited(
        &mut self,
        unit: UnitId,
        class: SymbolId,
        span: Span,
        mut probe: impl FnMut(&mut Enter, SymbolId) -> Option<SymbolId>,
    ) -> Result<Option<SymbolId>, FatalError> {
        let mut queue = VecDeque::from([class]);
        let mut seen = FxHashSet::default();
        while let Some(c) = queue.pop_front() {
            if !self.symtab.get(c).is_some_and(Symbol::is_class) || !seen.insert(c) {
                continue;
            }
            if seen.len() > MAX_SUPERTYPE_WALK {
                break;
            }
            if !self.complete_or_report(c, Some(unit), span)? {
                continue;
            }
            if let Some(found) = probe(self, c) {
                return Ok(Some(found));
            }
            if let Some(info) = self.symtab.class_info(c) {
                queue.extend(info.direct_supertypes());
            }
        }
        Ok(None)
    }

    /// Resolve a simple variable name in `env`: locals and parameters, then
    /// fields of each enclosing class, then statically imported fields.
    ///
    /// An instance field reached from a static context, or from the
    /// arguments of an explicit constructor call, is reported but still
    /// returned.
    pub fn find_var(&mut self, env: &Env, name: &str, span: Span) -> Result<Option<SymbolId>, FatalError> {
        let envs: Vec<&Env> = env.outers().filter(|e| e.enclosing_class.is_some()).collect();
        // A class environment is static relative to its outer environment;
        // anything nested inside it is static relative to the class.
        let chain: Vec<_> = envs
            .iter()
            .enumerate()
            .map(|(i, e)| {
                let is_static = if is_class_env(e) {
                    e.is_static()
                } else {
                    let class_level = envs[i..]
                        .iter()
                        .find(|o| is_class_env(o) && o.enclosing_class == e.enclosing_class)
                        .map_or(0, |o| o.info.static_level);
                    e.info.static_level > class_level
                };
                (e.info.scope, e.enclosing_class, is_static, e.info.is_self_call)
            })
            .collect();

        let mut static_only = false;
        let mut in_self_call = false;
        let mut searched = SymbolId::NONE;
        for (scope, class, is_static, is_self_call) in chain {
            if is_static {
                static_only = true;
            }
            in_self_call = is_self_call || (in_self_call && class == searched);
            let local = self
                .symtab
                .scopes
                .lookup(scope, name)
                .iter()
                .copied()
                .find(|&s| {
                    matches!(
                        self.symtab.symbols[s].kind,
                        SymbolKind::Variable | SymbolKind::Field
                    )
                });

            let found = match local {
                Some(sym) => Some(sym),
                None if class != searched => {
                    searched = class;
                    self.find_field(env.unit, class, name, span)?
                }
                None => None,
            };

            if let Some(sym) = found {
                let symbol = &self.symtab.symbols[sym];
                let owner = symbol.owner;
                let instance =
                    !symbol.is_static() && self.symtab.get(owner).is_some_and(Symbol::is_class);
                if instance && static_only {
                    self.report(env, span, diagnostic_codes::NON_STATIC_REFERENCE, &[name]);
                } else if instance && in_self_call && owner == class {
                    self.report(env, span, diagnostic_codes::REFERENCE_BEFORE_SUPER_CALL, &[name]);
                }
                return Ok(Some(sym));
            }

            if self.symtab.has_flag(class, symbol_flags::STATIC) {
                static_only = true;
            }
        }

        let unit = self.unit_state(env.unit);
        for scope in [unit.named_import_scope, unit.star_import_scope] {
            let imported = self
                .symtab
                .scopes
                .lookup(scope, name)
                .iter()
                .copied()
                .find(|&s| self.symtab.symbols[s].kind == SymbolKind::Field);
            if imported.is_some() {
                trace!(name, "variable found through static import");
                return Ok(imported);
            }
        }
        Ok(None)
    }

    /// Whether `sym` may be imported into a unit of package `package`.
    ///
    /// Protected members are treated like package-private ones.
    pub fn is_accessible_from(&self, sym: SymbolId, package: SymbolId) -> bool {
        let flags = self.symtab.symbols[sym].flags;
        if flags & symbol_flags::PUBLIC != 0 {
            return true;
        }
        if flags & symbol_flags::PRIVATE != 0 {
            return false;
        }
        let same_package = self.symtab.package_of(sym) == package;
        if flags & symbol_flags::PROTECTED != 0 {
            return same_package;
        }
        same_package && flags & symbol_flags::SCRIPT_PRIVATE == 0
    }

    fn class_in_scope(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.symtab
            .scopes
            .lookup(scope, name)
            .iter()
            .copied()
            .find(|&s| self.symtab.symbols[s].is_class())
    }
}

fn is_class_env(env: &Env) -> bool {
    matches!(env.tree, EnvTree::Class(_)) && !env.info.base_clause
}
