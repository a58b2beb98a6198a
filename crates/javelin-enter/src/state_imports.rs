//! Import processing.
//!
//! Imports of a unit are entered lazily, the first time one of its top-level
//! classes is completed (or at the end of the driver pass for units without
//! classes). Class imports are entered right away; statically imported
//! fields and methods go through the annotation queue so they are entered
//! after the members of source classes exist.

use crate::env::Env;
use crate::error::{EnterError, FatalError};
use crate::scopes::ScopeId;
use crate::state::{Enter, UnitId};
use crate::symbols::{SymbolId, SymbolKind, Type, symbol_flags};
use javelin_ast::{ImportDecl, QualifiedName, TypeExpr};
use javelin_common::limits::MAX_SUPERTYPE_WALK;
use javelin_common::{Span, diagnostic_codes};
use rustc_hash::FxHashSet;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, trace};

impl Enter {
    /// Enter the imports of `unit`, once.
    ///
    /// The root package is imported on demand into every unit; failing to
    /// find it aborts compilation.
    #[tracing::instrument(level = "debug", skip(self))]
    pub(crate) fn enter_unit_imports(&mut self, unit: UnitId) -> Result<(), FatalError> {
        let Some(state) = self.units.get_mut(unit.0 as usize) else {
            return Ok(());
        };
        if state.imports_done {
            return Ok(());
        }
        state.imports_done = true;
        let source = Arc::clone(&state.unit);
        let unit_env = Rc::clone(&state.env);

        if let Some(package) = source.package.as_ref().filter(|p| p.is_well_formed()) {
            self.check_package_clashes(&unit_env, package);
        }

        let root = self.options.root_package.clone();
        if !self.package_exists(&root) {
            self.report(&unit_env, Span::DUMMY, diagnostic_codes::NO_ROOT_PACKAGE, &[&root]);
            return Err(FatalError::new(format!("unable to find package '{root}'")));
        }
        let root_package = self.symtab.enter_package(&root);
        self.import_all(&unit_env, root_package, Span::DUMMY)?;

        for (index, import) in source.imports.iter().enumerate() {
            let env = self.import_env(unit, index);
            self.visit_import(&env, import)?;
        }
        debug!(file = %source.file_name, imports = source.imports.len(), "imports entered");
        Ok(())
    }

    /// Every prefix of the package clause that names a class is an error.
    fn check_package_clashes(&mut self, env: &Env, package: &QualifiedName) {
        for prefix in package.prefixes() {
            if self.load_class(&prefix).is_some() {
                self.report(env, package.span, diagnostic_codes::PACKAGE_CLASHES_WITH_CLASS, &[&prefix]);
            }
        }
    }

    fn visit_import(&mut self, env: &Rc<Env>, import: &ImportDecl) -> Result<(), FatalError> {
        let name = &import.name;
        if !name.is_well_formed() {
            debug!(import = %name, "skipping malformed import");
            return Ok(());
        }
        trace!(import = %name, is_static = import.is_static, is_wildcard = import.is_wildcard, "import");

        match (import.is_static, import.is_wildcard) {
            (false, true) => match self.attrib_import(env, name, true)? {
                Type::Package { symbol } | Type::Class { symbol } => {
                    self.import_all(env, symbol, import.span)
                }
                _ => Ok(()),
            },
            (false, false) => {
                if let Type::Class { symbol } = self.attrib_import(env, name, false)? {
                    self.import_named(env, symbol, import.span);
                }
                Ok(())
            }
            (true, wildcard) => {
                let owner_name = if wildcard {
                    Some(name.clone())
                } else {
                    name.qualifier()
                };
                let Some(owner_name) = owner_name else {
                    return Ok(());
                };
                let Type::Class { symbol: owner } = self.attrib_import(env, &owner_name, false)? else {
                    return Ok(());
                };
                if wildcard {
                    self.import_static_all(env, owner, import.span)
                } else {
                    self.import_static_named(env, owner, name.simple(), import.span)
                }
            }
        }
    }

    /// Attribute an imported name as a type, or as a package or type for
    /// on-demand imports. A completion failure is reported and yields the
    /// error type.
    ///
    /// Source classes named along the way are not completed here; the
    /// import kinds that need members complete the target themselves.
    fn attrib_import(
        &mut self,
        env: &Rc<Env>,
        name: &QualifiedName,
        package_allowed: bool,
    ) -> Result<Type, FatalError> {
        let attr = Rc::clone(&self.attr);
        let result = self.with_completion_disabled(|enter| {
            if package_allowed {
                attr.attrib_package_or_type(enter, name, env)
            } else {
                let tree = TypeExpr::Named { name: name.clone() };
                attr.attrib_type(enter, &tree, env)
            }
        });
        match result {
            Ok(ty) => Ok(ty),
            Err(EnterError::Completion(failure)) => {
                self.report(
                    env,
                    name.span,
                    diagnostic_codes::CANNOT_ACCESS,
                    &[&failure.name, &failure.reason],
                );
                Ok(Type::Error)
            }
            Err(EnterError::Fatal(fatal)) => Err(fatal),
        }
    }

    /// Single-type import of class `c`.
    pub(crate) fn import_named(&mut self, env: &Env, c: SymbolId, span: Span) {
        let scope = self.unit_state(env.unit).named_import_scope;
        let name = self.symtab.symbols[c].name.clone();
        let existing = self
            .symtab
            .scopes
            .lookup(scope, &name)
            .iter()
            .copied()
            .find(|&s| self.symtab.symbols[s].is_class());

        match existing {
            Some(other) if other == c => {}
            Some(other) => {
                let fullname = self.symtab.fullname(c);
                let declared_here = self
                    .symtab
                    .class_info(other)
                    .is_some_and(|info| info.unit == Some(env.unit))
                    && self.symtab.has_flag(other, symbol_flags::FROM_SOURCE);
                let code = if declared_here {
                    diagnostic_codes::ALREADY_DEFINED_THIS_UNIT
                } else {
                    diagnostic_codes::ALREADY_DEFINED_SINGLE_IMPORT
                };
                self.report(env, span, code, &[&fullname]);
            }
            None => {
                self.symtab.scopes.enter(scope, &name, c);
            }
        }
    }

    /// On-demand import of the accessible classes of package or class `owner`.
    pub(crate) fn import_all(&mut self, env: &Env, owner: SymbolId, span: Span) -> Result<(), FatalError> {
        let unit = self.unit_state(env.unit);
        let (scope, package) = (unit.star_import_scope, unit.package);

        if self.symtab.symbols[owner].is_package() {
            let fullname = self.symtab.fullname(owner);
            if !self.package_exists(&fullname) {
                self.report(env, span, diagnostic_codes::PACKAGE_DOES_NOT_EXIST, &[&fullname]);
                return Ok(());
            }
        }
        if !self.complete_or_report(owner, Some(env.unit), span)? {
            return Ok(());
        }

        let members = self.symtab.symbols[owner].members;
        let classes: Vec<(String, SymbolId)> = self
            .symtab
            .scopes
            .symbols(members)
            .into_iter()
            .filter(|&(_, sym)| self.symtab.symbols[sym].is_class())
            .map(|(name, sym)| (name.to_string(), sym))
            .collect();
        for (name, sym) in classes {
            if self.is_accessible_from(sym, package) {
                self.symtab.scopes.enter_if_absent(scope, &name, sym);
            }
        }
        Ok(())
    }

    /// `import static T.name;`
    ///
    /// Static member classes named `name` anywhere in the hierarchy of `owner`
    /// are imported now, fields and methods once the annotation queue runs.
    pub(crate) fn import_static_named(
        &mut self,
        env: &Env,
        owner: SymbolId,
        name: &str,
        span: Span,
    ) -> Result<(), FatalError> {
        let unit = env.unit;
        let scope = self.unit_state(unit).named_import_scope;
        let found_types = self.import_static_from(unit, owner, span, Some(name), true, scope)?;

        let name = name.to_string();
        self.annotate.later(move |enter| {
            let found_members = enter.import_static_from(unit, owner, span, Some(&name), false, scope)?;
            if !found_types && !found_members {
                let owner_name = enter.symtab.fullname(owner);
                enter.report_in(
                    unit,
                    span,
                    diagnostic_codes::CANNOT_FIND_STATIC_MEMBER,
                    &[&name, &owner_name],
                );
            }
            Ok(())
        });
        Ok(())
    }

    /// `import static T.*;`
    pub(crate) fn import_static_all(&mut self, env: &Env, owner: SymbolId, span: Span) -> Result<(), FatalError> {
        let unit = env.unit;
        let scope = self.unit_state(unit).star_import_scope;
        self.import_static_from(unit, owner, span, None, true, scope)?;
        self.annotate.later(move |enter| {
            enter.import_static_from(unit, owner, span, None, false, scope)?;
            Ok(())
        });
        Ok(())
    }

    /// Walk `origin`, its superclasses, interfaces and mixins breadth first,
    /// each class once, entering every accessible static member named `name`
    /// (any name when `None`) into `scope`. `types` selects member classes,
    /// otherwise fields and methods. Returns whether an accessible member
    /// matched.
    fn import_static_from(
        &mut self,
        unit: UnitId,
        origin: SymbolId,
        span: Span,
        name: Option<&str>,
        types: bool,
        scope: ScopeId,
    ) -> Result<bool, FatalError> {
        let package = self.unit_state(unit).package;
        let mut queue = VecDeque::from([origin]);
        let mut processed = FxHashSet::default();
        let mut matched = false;

        while let Some(c) = queue.pop_front() {
            if !self.symtab.get(c).is_some_and(|s| s.is_class()) || !processed.insert(c) {
                continue;
            }
            if processed.len() > MAX_SUPERTYPE_WALK {
                break;
            }
            if !self.complete_or_report(c, Some(unit), span)? {
                continue;
            }
            if !types {
                self.finish_if_pending(c);
            }

            let members = self.symtab.symbols[c].members;
            let candidates: Vec<(String, SymbolId)> = self
                .symtab
                .scopes
                .symbols(members)
                .into_iter()
                .filter(|&(member_name, _)| name.is_none_or(|n| n == member_name))
                .map(|(member_name, sym)| (member_name.to_string(), sym))
                .collect();
            for (member_name, sym) in candidates {
                let symbol = &self.symtab.symbols[sym];
                let wanted = match symbol.kind {
                    SymbolKind::Class => types && self.is_static_member_class(sym),
                    SymbolKind::Field | SymbolKind::Method => !types && symbol.is_static(),
                    _ => false,
                };
                if wanted && self.is_accessible_from(sym, package) {
                    matched = true;
                    self.symtab.scopes.enter_if_absent(scope, &member_name, sym);
                }
            }

            if let Some(info) = self.symtab.class_info(c) {
                queue.extend(info.direct_supertypes());
            }
        }
        Ok(matched)
    }

    fn is_static_member_class(&self, c: SymbolId) -> bool {
        let owner = self.symtab.symbols[c].owner;
        self.symtab.has_flag(c, symbol_flags::STATIC)
            || self.symtab.has_flag(owner, symbol_flags::INTERFACE)
    }
}
