//! Phase 1: class entry, and the driver that runs both phases over a set of
//! source units.

use crate::class_finder::kind_flags;
use crate::completer::Completer;
use crate::env::{Env, EnvTree};
use crate::error::FatalError;
use crate::scopes::{ScopeId, ScopeKind};
use crate::state::{Enter, UnitId, UnitState};
use crate::state_checks::DeclContext;
use crate::symbols::{ClassState, SymbolId, Type, symbol_flags};
use javelin_ast::{ClassDecl, SourceUnit};
use javelin_common::diagnostic_codes;
use javelin_common::limits::MAX_LOCAL_CLASS_INDEX;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, trace};

impl Enter {
    /// Enter `units` and complete the classes they declare.
    ///
    /// With a `target`, only that class is completed here when an outer
    /// driver pass is running; the other classes are handed to the outer
    /// pass's queue. The uncompleted queue of the outer pass is restored on
    /// every exit path.
    #[tracing::instrument(level = "debug", skip_all, fields(units = units.len(), target = ?target))]
    pub fn complete_sources(
        &mut self,
        units: &[Arc<SourceUnit>],
        target: Option<SymbolId>,
    ) -> Result<(), FatalError> {
        self.annotate.block();
        let swapped = self.completion_enabled;
        let mut outer = if swapped {
            self.uncompleted.replace(VecDeque::new())
        } else {
            None
        };

        let result = self.run_driver_pass(units, target, outer.as_mut());

        if swapped {
            self.uncompleted = outer;
        }
        self.annotate.unblock();
        result?;
        self.flush_annotations()
    }

    fn run_driver_pass(
        &mut self,
        units: &[Arc<SourceUnit>],
        target: Option<SymbolId>,
        mut outer: Option<&mut VecDeque<SymbolId>>,
    ) -> Result<(), FatalError> {
        let ids: Vec<UnitId> = units.iter().map(|u| self.class_enter_unit(u)).collect();
        if !self.completion_enabled {
            return Ok(());
        }

        while let Some(class) = self.uncompleted.as_mut().and_then(VecDeque::pop_front) {
            match (target, outer.as_deref_mut()) {
                (Some(target), Some(queue)) if target != class => {
                    trace!(class = class.0, "deferring to outer pass");
                    queue.push_back(class);
                }
                _ => {
                    let unit = self.symtab.class_info(class).and_then(|c| c.unit);
                    let span = self.symtab.symbols[class].span;
                    self.complete_or_report(class, unit, span)?;
                }
            }
        }

        // Units without classes never had their imports forced.
        for id in ids {
            if !self.unit_state(id).imports_done {
                self.enter_unit_imports(id)?;
            }
        }
        Ok(())
    }

    /// Enter the package and classes of one unit. A unit already entered
    /// under the same file name is skipped.
    pub(crate) fn class_enter_unit(&mut self, unit: &Arc<SourceUnit>) -> UnitId {
        if let Some(id) = self.unit_by_file(&unit.file_name) {
            debug!(file = %unit.file_name, "unit already entered");
            return id;
        }

        let package = match &unit.package {
            Some(name) if name.is_well_formed() => self.symtab.enter_package(&name.to_string()),
            Some(name) => {
                debug!(package = %name, "malformed package name, using unnamed package");
                self.symtab.unnamed_package
            }
            None => self.symtab.unnamed_package,
        };
        self.symtab.mark_package_exists(package);

        let named_import_scope = self
            .symtab
            .scopes
            .alloc(ScopeKind::NamedImport, package, ScopeId::NONE);
        let star_import_scope = self
            .symtab
            .scopes
            .alloc(ScopeKind::StarImport, package, ScopeId::NONE);
        let id = UnitId(self.units.len() as u32);
        let env = Rc::new(Env::unit(id, named_import_scope));
        self.units.push(UnitState {
            unit: Arc::clone(unit),
            package,
            named_import_scope,
            star_import_scope,
            env: Rc::clone(&env),
            imports_done: false,
        });
        self.unit_ids.insert(unit.file_name.clone(), id);
        debug!(file = %unit.file_name, package = %self.symtab.fullname(package), "entering unit");

        for decl in &unit.types {
            self.class_enter(decl, &env);
        }
        id
    }

    /// Enter a class declared in a method body or initializer.
    pub fn class_enter_local(&mut self, decl: &Arc<ClassDecl>, env: &Rc<Env>) -> Type {
        self.class_enter(decl, env)
    }

    /// Enter one class declaration and, recursively, its member classes.
    ///
    /// Returns the class type, or the error type when the class could not
    /// be entered.
    pub(crate) fn class_enter(&mut self, decl: &Arc<ClassDecl>, env: &Rc<Env>) -> Type {
        let name = decl.name.as_str();
        let (c, context) = match &env.tree {
            EnvTree::Unit => {
                let package = self.unit_state(env.unit).package;
                let c = self.symtab.enter_class(name, package);
                let members = self.symtab.symbols[package].members;
                self.symtab.scopes.enter_if_absent(members, name, c);
                self.check_public_file_name(env, decl);
                (c, DeclContext::TopLevelClass)
            }
            EnvTree::Class(_) => {
                let owner = env.enclosing_class;
                let members = self.symtab.symbols[owner].members;
                if !self.check_unique_class_name(env, decl.span, name, members) {
                    return Type::Error;
                }
                let c = self.symtab.enter_class(name, owner);
                self.symtab.scopes.enter_if_absent(members, name, c);
                let owner_interface = self.symtab.has_flag(owner, symbol_flags::INTERFACE);
                (c, DeclContext::MemberClass { owner_interface })
            }
            EnvTree::Method(_) | EnvTree::Var(_) => {
                let scope = env.info.scope;
                if !self.check_unique_class_name(env, decl.span, name, scope) {
                    return Type::Error;
                }
                let owner = self
                    .symtab
                    .scopes
                    .get(scope)
                    .map_or(env.enclosing_class, |s| s.owner);
                let flatname = self.local_class_flatname(env.enclosing_class, name);
                let c = self.symtab.define_local_class(name, owner, flatname);
                self.symtab.scopes.enter(scope, name, c);
                (c, DeclContext::LocalClass)
            }
            EnvTree::Import(_) => return Type::Error,
        };

        let flatname = self.symtab.flatname(c);
        if self.symtab.compiled(&flatname).is_some() {
            let fullname = self.symtab.fullname(c);
            self.report(env, decl.span, diagnostic_codes::DUPLICATE_CLASS, &[&fullname]);
            let owner = self.symtab.symbols[c].owner;
            let error = self.symtab.error_symbol(name, owner);
            self.decl_symbols.insert(Arc::as_ptr(decl), error);
            return Type::Error;
        }
        self.symtab.mark_compiled(c);

        if context == DeclContext::TopLevelClass {
            self.symtab.scopes.enter_if_absent(env.info.scope, name, c);
        }

        let flags = self.check_flags(env, decl.span, decl.modifiers, context)
            | kind_flags(decl.kind)
            | symbol_flags::FROM_SOURCE;
        let members = self.symtab.scopes.alloc(ScopeKind::Members, c, ScopeId::NONE);
        let supertype_span = decl.supertypes.first().map_or(decl.span, |t| t.span());
        {
            let symbol = &mut self.symtab.symbols[c];
            symbol.flags = flags | (symbol.flags & symbol_flags::LOCAL);
            symbol.members = members;
            symbol.completer = Some(Completer::Hierarchy);
            symbol.span = decl.span;
            if let Some(info) = symbol.class_info_mut() {
                info.unit = Some(env.unit);
                info.state = ClassState::Stub;
                info.supertype = Type::None;
                info.interfaces.clear();
                info.mixins.clear();
                info.supertype_span = supertype_span;
            }
        }

        let class_env = Rc::new(self.class_env(decl, env, c));
        self.type_envs.insert(c, Rc::clone(&class_env));
        self.decl_symbols.insert(Arc::as_ptr(decl), c);
        if context != DeclContext::LocalClass {
            if let Some(queue) = self.uncompleted.as_mut() {
                queue.push_back(c);
            }
        }
        debug!(class = %flatname, "entered class");

        for nested in decl.member_classes() {
            self.class_enter(nested, &class_env);
        }
        Type::class(c)
    }

    fn check_public_file_name(&mut self, env: &Env, decl: &ClassDecl) {
        if decl.modifiers & symbol_flags::PUBLIC == 0 {
            return;
        }
        let unit = &self.unit_state(env.unit).unit;
        if unit.file_stem() == decl.name {
            return;
        }
        let expected = format!("{}{}", decl.name, self.options.source_extension);
        self.report(
            env,
            decl.span,
            diagnostic_codes::PUBLIC_CLASS_FILE_NAME,
            &[&decl.name, &expected],
        );
    }

    /// `Outer$<n>Name` with the smallest `n` not yet taken.
    fn local_class_flatname(&self, enclosing_class: SymbolId, name: &str) -> String {
        let base = self.symtab.flatname(enclosing_class);
        (1..=MAX_LOCAL_CLASS_INDEX)
            .map(|i| format!("{base}${i}{name}"))
            .find(|candidate| {
                self.symtab.compiled(candidate).is_none()
                    && self.symtab.class_by_flatname(candidate).is_none()
            })
            .unwrap_or_else(|| format!("{base}${name}"))
    }
}
