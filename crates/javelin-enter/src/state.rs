//! Entry state.
//!
//! `Enter` owns the symbol table and all bookkeeping shared by the class
//! enterer, the member enterer and the import engine. The phases themselves
//! live in the `state_*` modules as further `impl Enter` blocks.

use crate::annotate::Annotate;
use crate::attribution::{Attr, Attribution};
use crate::class_finder::ClassFinder;
use crate::completer::Completer;
use crate::env::{Env, EnvInfo, EnvTree};
use crate::error::{EnterError, EnterResult, FatalError};
use crate::options::EnterOptions;
use crate::scopes::{ScopeId, ScopeKind};
use crate::symbols::{SymbolId, SymbolKind, symbol_flags};
use crate::symtab::SymbolTable;
use javelin_ast::{ClassDecl, MethodDecl, SourceUnit, VarDecl};
use javelin_common::{Diagnostic, DiagnosticBag, Span, diagnostic_codes};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, trace};

/// Index of a source unit in [`Enter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub u32);

/// Per-unit entry state.
#[derive(Debug)]
pub struct UnitState {
    pub unit: Arc<SourceUnit>,
    pub package: SymbolId,
    /// Single-type imports, single-static imports and the unit's own classes.
    pub named_import_scope: ScopeId,
    pub star_import_scope: ScopeId,
    pub env: Rc<Env>,
    pub imports_done: bool,
}

pub struct Enter {
    pub(crate) options: EnterOptions,
    pub(crate) symtab: SymbolTable,
    pub(crate) units: Vec<UnitState>,
    pub(crate) unit_ids: FxHashMap<String, UnitId>,
    /// Class environment of every source class.
    pub(crate) type_envs: FxHashMap<SymbolId, Rc<Env>>,
    /// Class symbol entered for a declaration, keyed by tree identity.
    pub(crate) decl_symbols: FxHashMap<*const ClassDecl, SymbolId>,
    /// Classes entered by the current driver pass and not yet completed.
    pub(crate) uncompleted: Option<VecDeque<SymbolId>>,
    /// Classes whose hierarchy is done and whose members are pending.
    pub(crate) halfcompleted: VecDeque<Rc<Env>>,
    /// Classes on the current cycle-check path.
    pub(crate) cycle_path: Vec<SymbolId>,
    /// Top-level class environments, in completion order, for attribution.
    pub(crate) todo: Vec<Rc<Env>>,
    /// True unless a class completion is already running.
    pub(crate) is_first: bool,
    pub(crate) completion_enabled: bool,
    pub(crate) annotate: Annotate,
    pub(crate) diagnostics: DiagnosticBag,
    pub(crate) attr: Rc<dyn Attribution>,
    pub(crate) finder: Rc<dyn ClassFinder>,
}

impl Enter {
    pub fn new(finder: Rc<dyn ClassFinder>) -> Self {
        Enter::with_options(EnterOptions::default(), finder)
    }

    pub fn with_options(options: EnterOptions, finder: Rc<dyn ClassFinder>) -> Self {
        Enter {
            options,
            symtab: SymbolTable::new(),
            units: Vec::new(),
            unit_ids: FxHashMap::default(),
            type_envs: FxHashMap::default(),
            decl_symbols: FxHashMap::default(),
            uncompleted: None,
            halfcompleted: VecDeque::new(),
            cycle_path: Vec::new(),
            todo: Vec::new(),
            is_first: true,
            completion_enabled: true,
            annotate: Annotate::new(),
            diagnostics: DiagnosticBag::new(),
            attr: Rc::new(Attr),
            finder,
        }
    }

    /// Replace the attribution collaborator.
    pub fn with_attribution(mut self, attr: Rc<dyn Attribution>) -> Self {
        self.attr = attr;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn options(&self) -> &EnterOptions {
        &self.options
    }

    pub fn symtab(&self) -> &SymbolTable {
        &self.symtab
    }

    pub fn symtab_mut(&mut self) -> &mut SymbolTable {
        &mut self.symtab
    }

    pub fn diagnostics(&self) -> &DiagnosticBag {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.take()
    }

    /// Top-level class environments queued for attribution.
    pub fn todo(&self) -> &[Rc<Env>] {
        &self.todo
    }

    pub fn type_env(&self, class: SymbolId) -> Option<Rc<Env>> {
        self.type_envs.get(&class).cloned()
    }

    /// The class symbol entered for `decl`, if any.
    pub fn symbol_for(&self, decl: &Arc<ClassDecl>) -> Option<SymbolId> {
        self.decl_symbols.get(&Arc::as_ptr(decl)).copied()
    }

    pub fn unit(&self, id: UnitId) -> Option<&UnitState> {
        self.units.get(id.0 as usize)
    }

    pub fn unit_by_file(&self, file_name: &str) -> Option<UnitId> {
        self.unit_ids.get(file_name).copied()
    }

    pub fn units(&self) -> impl Iterator<Item = (UnitId, &UnitState)> {
        self.units
            .iter()
            .enumerate()
            .map(|(i, u)| (UnitId(i as u32), u))
    }

    pub fn annotate(&mut self) -> &mut Annotate {
        &mut self.annotate
    }

    pub(crate) fn unit_state(&self, id: UnitId) -> &UnitState {
        &self.units[id.0 as usize]
    }

    pub(crate) fn file_name(&self, id: UnitId) -> &str {
        self.units
            .get(id.0 as usize)
            .map_or("", |u| u.unit.file_name.as_str())
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Report a registered diagnostic at `span` in the unit of `env`.
    pub fn report(&mut self, env: &Env, span: Span, code: u32, args: &[&str]) {
        self.report_in(env.unit, span, code, args);
    }

    pub(crate) fn report_in(&mut self, unit: UnitId, span: Span, code: u32, args: &[&str]) {
        let file = self
            .units
            .get(unit.0 as usize)
            .map_or("", |u| u.unit.file_name.as_str());
        self.diagnostics.report(file, span, code, args);
    }

    // =========================================================================
    // Completion
    // =========================================================================

    /// Enter every unit, complete every class entered, and flush deferred
    /// annotations. Only fatal errors are returned; everything else is a
    /// diagnostic.
    pub fn enter_all(&mut self, units: &[Arc<SourceUnit>]) -> Result<(), FatalError> {
        self.complete_sources(units, None)
    }

    /// Run the completer of `sym`, if it still has one.
    ///
    /// The completer is detached before it runs, so completing a symbol
    /// whose completion is already in progress returns immediately.
    pub fn complete(&mut self, sym: SymbolId) -> EnterResult<()> {
        let Some(completer) = self
            .symtab
            .symbols
            .get_mut(sym)
            .and_then(|s| s.completer.take())
        else {
            return Ok(());
        };
        trace!(symbol = sym.0, completer = completer.name(), "complete");
        match completer {
            Completer::Hierarchy => self.complete_class(sym),
            Completer::Field { tree, env } => {
                let attr = Rc::clone(&self.attr);
                let ty = attr.finish_field(self, sym, &tree, &env)?;
                self.symtab.symbols[sym].ty = ty;
                Ok(())
            }
            Completer::Method { tree, env } => {
                let attr = Rc::clone(&self.attr);
                let ty = attr.finish_method(self, sym, &tree, &env)?;
                self.symtab.symbols[sym].ty = ty;
                Ok(())
            }
            Completer::ClassFile => {
                let finder = Rc::clone(&self.finder);
                finder.complete_class(self, sym)
            }
            Completer::Package => {
                self.complete_package(sym);
                Ok(())
            }
        }
    }

    /// Complete `sym`, reporting a completion failure at `span` of `unit`.
    ///
    /// Returns `Ok(false)` when completion failed; callers treat the symbol
    /// as an error type from then on.
    pub(crate) fn complete_or_report(
        &mut self,
        sym: SymbolId,
        unit: Option<UnitId>,
        span: Span,
    ) -> Result<bool, FatalError> {
        match self.complete(sym) {
            Ok(()) => Ok(true),
            Err(EnterError::Completion(failure)) => {
                debug!(%failure, "completion failed");
                let file = unit.map_or("", |u| self.file_name(u)).to_string();
                self.diagnostics.report(
                    &file,
                    span,
                    diagnostic_codes::CANNOT_ACCESS,
                    &[&failure.name, &failure.reason],
                );
                Ok(false)
            }
            Err(EnterError::Fatal(fatal)) => Err(fatal),
        }
    }

    /// Complete a class, then every field and method declared in it.
    pub fn complete_members(&mut self, class: SymbolId) -> Result<(), FatalError> {
        let unit = self.symtab.class_info(class).and_then(|c| c.unit);
        let span = self.symtab.get(class).map_or(Span::DUMMY, |s| s.span);
        if !self.complete_or_report(class, unit, span)? {
            return Ok(());
        }
        self.finish_if_pending(class);
        let members = self.symtab.symbols[class].members;
        let pending: Vec<SymbolId> = self
            .symtab
            .scopes
            .symbols(members)
            .into_iter()
            .map(|(_, sym)| sym)
            .filter(|&sym| {
                matches!(
                    self.symtab.symbols[sym].kind,
                    SymbolKind::Field | SymbolKind::Method
                ) && self.symtab.symbols[sym].owner == class
            })
            .collect();
        for sym in pending {
            let span = self.symtab.symbols[sym].span;
            self.complete_or_report(sym, unit, span)?;
        }
        self.flush_annotations()
    }

    /// List the class-path members of a package.
    fn complete_package(&mut self, pkg: SymbolId) {
        let fullname = self.symtab.fullname(pkg);
        let finder = Rc::clone(&self.finder);
        let names = finder.package_classes(&fullname);
        for name in &names {
            let flatname = if fullname.is_empty() {
                name.clone()
            } else {
                format!("{fullname}.{name}")
            };
            self.load_class(&flatname);
        }
        if !names.is_empty() || finder.package_exists(&fullname) {
            self.symtab.mark_package_exists(pkg);
        }
    }

    /// The class symbol for `flatname`, creating a class-path stub if the
    /// class finder knows the class.
    pub fn load_class(&mut self, flatname: &str) -> Option<SymbolId> {
        if let Some(sym) = self.symtab.class_by_flatname(flatname) {
            return Some(sym);
        }
        let flags = self.finder.find_class(flatname)?;
        let (owner, simple) = match flatname.rsplit_once('$') {
            Some((outer, simple)) => (self.load_class(outer)?, simple),
            None => match flatname.rsplit_once('.') {
                Some((package, simple)) => (self.symtab.enter_package(package), simple),
                None => (self.symtab.unnamed_package, flatname),
            },
        };
        let sym = self.symtab.enter_class(simple, owner);
        self.symtab.symbols[sym].flags |= flags;
        let members = self.symtab.symbols[owner].members;
        self.symtab.scopes.enter_if_absent(members, simple, sym);
        trace!(class = flatname, "loaded class");
        Some(sym)
    }

    pub fn package_exists(&self, fullname: &str) -> bool {
        self.symtab
            .lookup_package(fullname)
            .is_some_and(|p| self.symtab.has_flag(p, symbol_flags::EXISTS))
            || self.finder.package_exists(fullname)
    }

    /// Run `f` with class completion disabled; hierarchy completers invoked
    /// meanwhile re-arm themselves.
    pub fn with_completion_disabled<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = std::mem::replace(&mut self.completion_enabled, false);
        let result = f(self);
        self.completion_enabled = saved;
        result
    }

    /// Run deferred actions in enqueue order unless the queue is blocked.
    pub fn flush_annotations(&mut self) -> Result<(), FatalError> {
        if self.annotate.is_blocked() {
            return Ok(());
        }
        while let Some(action) = self.annotate.pop() {
            match action(self) {
                Ok(()) => {}
                Err(EnterError::Completion(failure)) => {
                    self.diagnostics.report(
                        "",
                        Span::DUMMY,
                        diagnostic_codes::CANNOT_ACCESS,
                        &[&failure.name, &failure.reason],
                    );
                }
                Err(EnterError::Fatal(fatal)) => return Err(fatal),
            }
        }
        Ok(())
    }

    // =========================================================================
    // Environments
    // =========================================================================

    /// Environment for the body of class `c` declared in `env`.
    pub(crate) fn class_env(&mut self, decl: &Arc<ClassDecl>, env: &Rc<Env>, c: SymbolId) -> Env {
        let scope = self.symtab.scopes.alloc(ScopeKind::Local, c, ScopeId::NONE);
        if let Some(info) = self.symtab.class_info_mut(c) {
            info.local_scope = scope;
        }
        let mut local = env.dup(EnvTree::Class(Arc::clone(decl)));
        local.enclosing_class = c;
        local.enclosing_method = None;
        local.info.scope = scope;
        local.info.is_self_call = false;
        local.info.base_clause = false;
        let in_interface = env.enclosing_method.is_none()
            && env.enclosing_class.is_some()
            && self.symtab.has_flag(env.enclosing_class, symbol_flags::INTERFACE);
        if self.symtab.has_flag(c, symbol_flags::STATIC) || in_interface {
            local.info.static_level += 1;
        }
        if !decl.suppress_warnings.is_empty() {
            let lint = env.lint_or(self.options.lint);
            local.info.lint = Some(lint.suppress(&decl.suppress_warnings));
        }
        local
    }

    /// Environment for resolving the supertypes of the class whose body
    /// environment is `class_env`: outside the class's own members.
    pub(crate) fn base_env(&mut self, class_env: &Env) -> Rc<Env> {
        let c = class_env.enclosing_class;
        let (enclosing_class, enclosing_method) = class_env
            .outer
            .as_ref()
            .map_or((SymbolId::NONE, None), |o| (o.enclosing_class, o.enclosing_method));
        let scope = self.symtab.scopes.alloc(ScopeKind::Local, c, ScopeId::NONE);
        Rc::new(Env {
            outer: class_env.outer.clone(),
            tree: class_env.tree.clone(),
            unit: class_env.unit,
            enclosing_class,
            enclosing_method,
            info: EnvInfo {
                scope,
                static_level: class_env.info.static_level,
                lint: class_env.info.lint,
                is_self_call: false,
                base_clause: true,
            },
        })
    }

    /// Environment for the body of method `method` of the class env `env`.
    pub fn method_env(&mut self, tree: &Arc<MethodDecl>, env: &Rc<Env>, method: SymbolId) -> Rc<Env> {
        let scope = self.symtab.scopes.alloc(ScopeKind::Local, method, ScopeId::NONE);
        let mut local = env.dup(EnvTree::Method(Arc::clone(tree)));
        local.enclosing_method = Some(method);
        local.info.scope = scope;
        if self.symtab.has_flag(method, symbol_flags::STATIC) {
            local.info.static_level += 1;
        }
        Rc::new(local)
    }

    /// Environment for the initializer of `var`, declared in `env`.
    pub fn init_env(&mut self, tree: &Arc<VarDecl>, env: &Rc<Env>, var: SymbolId) -> Rc<Env> {
        let mut local = env.dup(EnvTree::Var(Arc::clone(tree)));
        local.info.scope = self.symtab.scopes.delegated(env.info.scope, var);
        Rc::new(local)
    }

    pub(crate) fn import_env(&self, unit: UnitId, index: usize) -> Rc<Env> {
        Rc::new(self.unit_state(unit).env.dup(EnvTree::Import(index)))
    }
}
