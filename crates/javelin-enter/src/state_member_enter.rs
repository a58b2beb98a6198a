//! Phase 2: hierarchy completion and member entry.
//!
//! Completing a source class resolves its supertypes, checks the hierarchy
//! for cycles and queues the class on `halfcompleted`. Fields and methods are
//! entered only by the outermost completion, after every class it pulled in
//! has a resolved hierarchy.

use crate::completer::Completer;
use crate::env::{Env, EnvTree};
use crate::error::{CompletionFailure, EnterError, EnterResult, FatalError};
use crate::options::Lint;
use crate::state::Enter;
use crate::state_checks::DeclContext;
use crate::symbols::{ClassState, SymbolId, SymbolKind, Type, symbol_flags};
use javelin_ast::{ClassDecl, ClassKind, Member, MethodDecl, TypeExpr, VarDecl};
use javelin_common::{Span, diagnostic_codes};
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, trace};

/// Supertypes of one declaration, split by role.
#[derive(Default)]
struct Supertypes {
    superclass: Option<Type>,
    interfaces: Vec<Type>,
    mixins: Vec<Type>,
}

impl Enter {
    /// Hierarchy completer for source classes.
    #[tracing::instrument(level = "debug", skip(self))]
    pub(crate) fn complete_class(&mut self, c: SymbolId) -> EnterResult<()> {
        if !self.completion_enabled {
            trace!(class = c.0, "completion disabled, re-arming");
            self.symtab.symbols[c].completer = Some(Completer::Hierarchy);
            return Ok(());
        }
        let Some(env) = self.type_envs.get(&c).cloned() else {
            let name = self.symtab.flatname(c);
            return Err(CompletionFailure::new(c, name, "no class environment").into());
        };

        self.symtab.symbols[c].flags |= symbol_flags::UNATTRIBUTED;
        if let Some(info) = self.symtab.class_info_mut(c) {
            info.state = ClassState::HierarchyResolving;
        }

        let was_first = std::mem::replace(&mut self.is_first, false);
        let result = self.resolve_hierarchy(c, &env);
        self.is_first = was_first;
        result?;

        if was_first {
            while let Some(next) = self.halfcompleted.pop_front() {
                self.finish_class(&next);
            }
            self.flush_annotations()?;
        }
        Ok(())
    }

    fn resolve_hierarchy(&mut self, c: SymbolId, env: &Rc<Env>) -> EnterResult<()> {
        let Some(decl) = env.class_tree().cloned() else {
            return Ok(());
        };
        let unit = env.unit;
        let owner = self.symtab.symbols[c].owner;

        if self.symtab.symbols[owner].is_package() {
            self.enter_unit_imports(unit)?;
            self.todo.push(Rc::clone(env));
        } else if self.symtab.symbols[owner].is_class() {
            self.complete_or_report(owner, Some(unit), decl.span)?;
        }

        let base = self.base_env(env);
        let supertypes = self.attrib_supertypes(&decl, &base)?;
        let superclass = self.default_superclass(c, &decl, supertypes.superclass);
        let mut interfaces = supertypes.interfaces;
        if decl.kind == ClassKind::Enum {
            let implicit = [
                self.options.comparable_interface.clone(),
                self.options.serializable_interface.clone(),
            ];
            for name in implicit {
                if let Some(iface) = self.load_class(&name).map(Type::class) {
                    if !interfaces.contains(&iface) {
                        interfaces.push(iface);
                    }
                }
            }
        }

        let supertype_span = match self.symtab.class_info_mut(c) {
            Some(info) => {
                info.supertype = superclass;
                info.interfaces = interfaces;
                info.mixins = supertypes.mixins;
                info.supertype_span
            }
            None => decl.span,
        };

        self.check_non_cyclic(unit, supertype_span, c)?;

        if !decl.kind.is_interface_like() {
            self.enter_this_and_super(c, decl.span);
        }

        if self.symtab.symbols[owner].is_package() {
            let fullname = self.symtab.fullname(c);
            if self.package_exists(&fullname) {
                self.report(env, decl.span, diagnostic_codes::CLASS_CLASHES_WITH_PACKAGE, &[&fullname]);
            }
        }

        if let Some(info) = self.symtab.class_info_mut(c) {
            info.state = ClassState::MembersQueued;
        }
        self.halfcompleted.push_back(Rc::clone(env));
        debug!(class = %self.symtab.flatname(c), "hierarchy resolved");
        Ok(())
    }

    fn attrib_supertypes(&mut self, decl: &ClassDecl, base: &Rc<Env>) -> Result<Supertypes, FatalError> {
        let interface_decl = decl.kind.is_interface_like();
        let lint = base.lint_or(self.options.lint);
        let mut result = Supertypes::default();

        for expr in &decl.supertypes {
            let ty = self.attrib_supertype(expr, base)?;
            let Type::Class { symbol } = ty else {
                if !ty.is_error() {
                    self.report(base, expr.span(), diagnostic_codes::TYPE_EXPECTED, &[&expr.to_string()]);
                }
                continue;
            };
            let name = self.symtab.fullname(symbol);

            if self.symtab.has_flag(symbol, symbol_flags::DEPRECATED)
                && lint.contains(Lint::DEPRECATION)
            {
                self.report(base, expr.span(), diagnostic_codes::DEPRECATED_TYPE, &[&name]);
            }

            if self.symtab.has_flag(symbol, symbol_flags::MIXIN) {
                if result.mixins.contains(&ty) {
                    self.report(base, expr.span(), diagnostic_codes::DUPLICATE_MIXIN, &[&name]);
                } else {
                    result.mixins.push(ty.clone());
                    result.interfaces.push(ty);
                }
            } else if self.symtab.has_flag(symbol, symbol_flags::INTERFACE) {
                if result.interfaces.contains(&ty) {
                    self.report(base, expr.span(), diagnostic_codes::REPEATED_INTERFACE, &[&name]);
                } else {
                    result.interfaces.push(ty);
                }
            } else if interface_decl || result.superclass.is_some() {
                self.report(base, expr.span(), diagnostic_codes::INTERFACE_EXPECTED, &[&name]);
            } else {
                result.superclass = Some(ty);
            }
        }
        Ok(result)
    }

    /// Attribute one supertype; a completion failure is reported and yields
    /// the error type.
    fn attrib_supertype(&mut self, expr: &TypeExpr, base: &Rc<Env>) -> Result<Type, FatalError> {
        let attr = Rc::clone(&self.attr);
        match attr.attrib_type(self, expr, base) {
            Ok(ty) => Ok(ty),
            Err(EnterError::Completion(failure)) => {
                self.report(
                    base,
                    expr.span(),
                    diagnostic_codes::CANNOT_ACCESS,
                    &[&failure.name, &failure.reason],
                );
                Ok(Type::Error)
            }
            Err(EnterError::Fatal(fatal)) => Err(fatal),
        }
    }

    fn default_superclass(&mut self, c: SymbolId, decl: &ClassDecl, written: Option<Type>) -> Type {
        if let Some(ty) = written {
            return ty;
        }
        if decl.kind.is_interface_like() {
            return Type::None;
        }
        let object = self.options.object_class.clone();
        if self.symtab.fullname(c) == object {
            return Type::None;
        }
        let default = if decl.kind == ClassKind::Enum {
            let enum_class = self.options.enum_class.clone();
            self.load_class(&enum_class)
                .or_else(|| self.load_class(&object))
        } else {
            self.load_class(&object)
        };
        default.map_or(Type::None, Type::class)
    }

    /// `this`, and `super` when there is a superclass, in the class local scope.
    fn enter_this_and_super(&mut self, c: SymbolId, span: Span) {
        let Some(info) = self.symtab.class_info(c) else {
            return;
        };
        let local = info.local_scope;
        let superclass = info.supertype.class_symbol();
        let flags = symbol_flags::FINAL | symbol_flags::SYNTHETIC;

        let this = self
            .symtab
            .new_member(SymbolKind::Variable, "this", c, flags, Type::class(c), span);
        self.symtab.scopes.enter(local, "this", this);
        if let Some(sup) = superclass {
            let sup = self
                .symtab
                .new_member(SymbolKind::Variable, "super", c, flags, Type::class(sup), span);
            self.symtab.scopes.enter(local, "super", sup);
        }
    }

    // =========================================================================
    // Member entry
    // =========================================================================

    /// Enter the fields and methods of the class whose body environment is
    /// `env`, plus the synthetic members its kind calls for.
    pub(crate) fn finish_class(&mut self, env: &Rc<Env>) {
        let c = env.enclosing_class;
        let Some(decl) = env.class_tree().cloned() else {
            return;
        };
        trace!(class = %self.symtab.flatname(c), members = decl.members.len(), "entering members");

        for member in &decl.members {
            match member {
                Member::Field(var) => {
                    self.member_enter_var(var, env);
                }
                Member::Method(method) => {
                    self.member_enter_method(method, env);
                }
                Member::Class(_) => {}
            }
        }

        if matches!(decl.kind, ClassKind::Class | ClassKind::Enum) && !decl.has_constructor() {
            self.enter_default_constructor(c, &decl);
        }
        if decl.kind == ClassKind::Enum {
            self.enter_enum_members(c);
        }

        if let Some(info) = self.symtab.class_info_mut(c) {
            info.state = ClassState::MembersFinished;
        }
    }

    /// Finish `class` now if its members are still pending.
    pub(crate) fn finish_if_pending(&mut self, class: SymbolId) {
        let pending = self
            .halfcompleted
            .iter()
            .position(|env| env.enclosing_class == class);
        if let Some(env) = pending.and_then(|pos| self.halfcompleted.remove(pos)) {
            self.finish_class(&env);
        }
    }

    fn enter_default_constructor(&mut self, c: SymbolId, decl: &ClassDecl) {
        let access = if decl.kind == ClassKind::Enum {
            symbol_flags::PRIVATE
        } else {
            self.symtab.symbols[c].flags & symbol_flags::ACCESS
        };
        let ty = Type::Method {
            params: Vec::new(),
            ret: Box::new(Type::None),
        };
        let ctor = self.symtab.new_member(
            SymbolKind::Method,
            "<init>",
            c,
            access | symbol_flags::SYNTHETIC,
            ty,
            decl.span,
        );
        let members = self.symtab.symbols[c].members;
        self.symtab.scopes.enter(members, "<init>", ctor);
    }

    /// `static E[] values()` and `static E valueOf(String)`.
    fn enter_enum_members(&mut self, c: SymbolId) {
        let string_class = self.options.string_class.clone();
        let string = self.load_class(&string_class).map_or(Type::Error, Type::class);
        let flags = symbol_flags::PUBLIC | symbol_flags::STATIC | symbol_flags::SYNTHETIC;
        let values = Type::Method {
            params: Vec::new(),
            ret: Box::new(Type::Array {
                element: Box::new(Type::class(c)),
            }),
        };
        let value_of = Type::Method {
            params: vec![string],
            ret: Box::new(Type::class(c)),
        };
        self.symtab.enter_member(SymbolKind::Method, "values", c, flags, values);
        self.symtab.enter_member(SymbolKind::Method, "valueOf", c, flags, value_of);
    }

    /// Enter a field (in a class body environment) or a local variable or
    /// parameter (in a method environment).
    ///
    /// The symbol is always created so attribution can complete it, but it
    /// is entered into its scope only if it clashes with nothing visible.
    pub fn member_enter_var(&mut self, tree: &Arc<VarDecl>, env: &Rc<Env>) -> SymbolId {
        let in_class = matches!(env.tree, EnvTree::Class(_));
        let (kind, owner, scope) = if in_class {
            let class = env.enclosing_class;
            (SymbolKind::Field, class, self.symtab.symbols[class].members)
        } else {
            let scope = env.info.scope;
            let owner = self
                .symtab
                .scopes
                .get(scope)
                .map_or(env.enclosing_class, |s| s.owner);
            (SymbolKind::Variable, owner, scope)
        };
        let owner_interface = in_class && self.symtab.has_flag(owner, symbol_flags::INTERFACE);
        let context = if in_class {
            DeclContext::Field { owner_interface }
        } else {
            DeclContext::LocalVar
        };
        let flags = self.check_flags(env, tree.span, tree.modifiers, context);

        let var_env = if in_class && flags & symbol_flags::STATIC != 0 {
            let mut local = env.dup(EnvTree::Var(Arc::clone(tree)));
            local.info.static_level += 1;
            local.info.lint = env.info.lint;
            Rc::new(local)
        } else {
            Rc::clone(env)
        };

        let sym = self
            .symtab
            .new_member(kind, &tree.name, owner, flags, Type::None, tree.span);
        self.symtab.symbols[sym].completer = Some(Completer::Field {
            tree: Arc::clone(tree),
            env: var_env,
        });

        if self.check_unique(env, tree.span, sym, scope)
            && self.check_transparent_var(env, tree.span, sym)
        {
            self.symtab.scopes.enter(scope, &tree.name, sym);
        } else {
            debug!(name = %tree.name, "variable not entered");
        }
        sym
    }

    /// Enter a method of the class whose body environment is `env`.
    ///
    /// Trees without a name or outside a class are dropped.
    pub fn member_enter_method(&mut self, tree: &Arc<MethodDecl>, env: &Rc<Env>) -> Option<SymbolId> {
        let c = env.enclosing_class;
        let Some(name) = tree.name.as_deref() else {
            trace!("dropping method without a name");
            return None;
        };
        if !self.symtab.get(c).is_some_and(|s| s.is_class()) {
            trace!(method = name, "dropping method outside a class");
            return None;
        }
        let name = if tree.is_constructor { "<init>" } else { name };
        let owner_interface = self.symtab.has_flag(c, symbol_flags::INTERFACE);
        let context = DeclContext::Method {
            owner_interface,
            is_constructor: tree.is_constructor,
        };
        let flags = self.check_flags(env, tree.span, tree.modifiers, context);

        let sym = self
            .symtab
            .new_member(SymbolKind::Method, name, c, flags, Type::None, tree.span);
        self.symtab.symbols[sym].completer = Some(Completer::Method {
            tree: Arc::clone(tree),
            env: Rc::clone(env),
        });
        let members = self.symtab.symbols[c].members;
        self.symtab.scopes.enter(members, name, sym);
        Some(sym)
    }
}
