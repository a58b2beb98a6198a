//! Attribution collaborator.
//!
//! Entry needs a resolver for type expressions in supertype lists and
//! imports, and something to run when a field or method completer fires.
//! [`Attr`] is the built-in implementation: it resolves names against the
//! tables entry builds and walks the small expression language of the AST,
//! completing every symbol it touches.

use crate::env::Env;
use crate::error::EnterResult;
use crate::state::Enter;
use crate::symbols::{SymbolId, Type};
use javelin_ast::{Expr, MethodDecl, QualifiedName, Stmt, TypeExpr, VarDecl};
use javelin_common::{Span, diagnostic_codes};
use std::rc::Rc;
use std::sync::Arc;
use tracing::trace;

pub trait Attribution {
    /// Resolve a type expression. Unresolvable names are reported and
    /// yield [`Type::Error`].
    fn attrib_type(&self, enter: &mut Enter, tree: &TypeExpr, env: &Rc<Env>) -> EnterResult<Type>;

    /// Resolve a qualified name to a package or a type.
    fn attrib_package_or_type(
        &self,
        enter: &mut Enter,
        name: &QualifiedName,
        env: &Rc<Env>,
    ) -> EnterResult<Type>;

    /// Attribute a field or variable declaration; returns its type.
    fn finish_field(
        &self,
        enter: &mut Enter,
        field: SymbolId,
        tree: &Arc<VarDecl>,
        env: &Rc<Env>,
    ) -> EnterResult<Type>;

    /// Attribute a method declaration; returns its method type.
    fn finish_method(
        &self,
        enter: &mut Enter,
        method: SymbolId,
        tree: &Arc<MethodDecl>,
        env: &Rc<Env>,
    ) -> EnterResult<Type>;
}

/// Default attribution over the entry tables.
#[derive(Clone, Copy, Debug, Default)]
pub struct Attr;

impl Attr {
    /// Resolve `name` segment by segment. The first segment is a type if one
    /// is visible, else a package; later segments are member types of a
    /// type, or classes or subpackages of a package. A missing member type
    /// is reported.
    fn resolve_qualified(
        &self,
        enter: &mut Enter,
        name: &QualifiedName,
        env: &Rc<Env>,
    ) -> EnterResult<Type> {
        let Some(first) = name.segments.first() else {
            return Ok(Type::Error);
        };
        let mut current = match enter.find_type(env, first)? {
            Some(class) => Type::class(class),
            None => Type::Package {
                symbol: enter.symtab_mut().enter_package(first),
            },
        };

        for (i, segment) in name.segments.iter().enumerate().skip(1) {
            current = match current {
                Type::Class { symbol } => {
                    match enter.find_member_type(env.unit, symbol, segment, name.span)? {
                        Some(member) => Type::class(member),
                        None => {
                            let prefix = name.segments[..=i].join(".");
                            enter.report(env, name.span, diagnostic_codes::CANNOT_FIND_SYMBOL, &[&prefix]);
                            return Ok(Type::Error);
                        }
                    }
                }
                Type::Package { symbol } => match enter.find_package_member(symbol, segment)? {
                    Some(class) => Type::class(class),
                    None => {
                        let prefix = name.segments[..=i].join(".");
                        Type::Package {
                            symbol: enter.symtab_mut().enter_package(&prefix),
                        }
                    }
                },
                other => return Ok(other),
            };
        }
        Ok(current)
    }

    /// Attribute an expression for the names it references.
    fn attrib_expr(&self, enter: &mut Enter, expr: &Expr, env: &Rc<Env>) -> EnterResult<()> {
        match expr {
            Expr::Literal { .. } => Ok(()),
            Expr::New { ty, span } => {
                if let Type::Class { symbol } = self.attrib_type(enter, ty, env)? {
                    enter.complete_or_report(symbol, Some(env.unit), *span)?;
                }
                Ok(())
            }
            Expr::Name { name } => self.attrib_name(enter, name, env),
            Expr::SelfCall { args, .. } => {
                let mut call_env = env.dup(env.tree.clone());
                call_env.info.is_self_call = true;
                call_env.info.lint = env.info.lint;
                let call_env = Rc::new(call_env);
                for arg in args {
                    self.attrib_expr(enter, arg, &call_env)?;
                }
                Ok(())
            }
        }
    }

    /// `x`, `x.f`, `T.CONST`, `p.T.CONST`.
    fn attrib_name(&self, enter: &mut Enter, name: &QualifiedName, env: &Rc<Env>) -> EnterResult<()> {
        let Some(first) = name.segments.first() else {
            return Ok(());
        };
        let span = name.span;

        let mut current = match enter.find_var(env, first, span)? {
            Some(var) => self.var_type(enter, var, env, span)?,
            None => match enter.find_type(env, first)? {
                Some(class) => Type::class(class),
                None if name.segments.len() == 1 => {
                    enter.report(env, span, diagnostic_codes::CANNOT_FIND_SYMBOL, &[first]);
                    return Ok(());
                }
                None => Type::Package {
                    symbol: enter.symtab_mut().enter_package(first),
                },
            },
        };

        for (i, segment) in name.segments.iter().enumerate().skip(1) {
            current = match current {
                Type::Class { symbol } => {
                    if let Some(field) = enter.find_field(env.unit, symbol, segment, span)? {
                        self.var_type(enter, field, env, span)?
                    } else if let Some(member) = enter.find_member_type(env.unit, symbol, segment, span)? {
                        Type::class(member)
                    } else {
                        let prefix = name.segments[..=i].join(".");
                        enter.report(env, span, diagnostic_codes::CANNOT_FIND_SYMBOL, &[&prefix]);
                        return Ok(());
                    }
                }
                Type::Package { symbol } => match enter.find_package_member(symbol, segment)? {
                    Some(class) => Type::class(class),
                    None => {
                        let prefix = name.segments[..=i].join(".");
                        Type::Package {
                            symbol: enter.symtab_mut().enter_package(&prefix),
                        }
                    }
                },
                // Primitive, array and error values have nothing to look up.
                _ => return Ok(()),
            };
        }

        if let Type::Package { .. } = current {
            enter.report(env, span, diagnostic_codes::CANNOT_FIND_SYMBOL, &[&name.to_string()]);
        }
        Ok(())
    }

    /// Complete a variable and return its type. A variable whose completion
    /// is already running has no type yet and yields the error type.
    fn var_type(&self, enter: &mut Enter, var: SymbolId, env: &Env, span: Span) -> EnterResult<Type> {
        if !enter.complete_or_report(var, Some(env.unit), span)? {
            return Ok(Type::Error);
        }
        let ty = enter.symtab().symbols[var].ty.clone();
        Ok(if ty.is_none() { Type::Error } else { ty })
    }
}

impl Attribution for Attr {
    fn attrib_type(&self, enter: &mut Enter, tree: &TypeExpr, env: &Rc<Env>) -> EnterResult<Type> {
        match tree {
            TypeExpr::Primitive { name, .. } => Ok(Type::Primitive { name: *name }),
            TypeExpr::Array { element, .. } => {
                let element = self.attrib_type(enter, element, env)?;
                Ok(if element.is_error() {
                    Type::Error
                } else {
                    Type::Array {
                        element: Box::new(element),
                    }
                })
            }
            TypeExpr::Named { name } => match self.resolve_qualified(enter, name, env)? {
                Type::Package { symbol } => {
                    let fullname = enter.symtab().fullname(symbol);
                    let qualifier = name.qualifier().map(|q| q.to_string());
                    match qualifier {
                        Some(q) if !enter.package_exists(&q) => {
                            enter.report(env, name.span, diagnostic_codes::PACKAGE_DOES_NOT_EXIST, &[&q]);
                        }
                        _ => {
                            enter.report(env, name.span, diagnostic_codes::CANNOT_FIND_SYMBOL, &[&fullname]);
                        }
                    }
                    Ok(Type::Error)
                }
                other => Ok(other),
            },
        }
    }

    fn attrib_package_or_type(
        &self,
        enter: &mut Enter,
        name: &QualifiedName,
        env: &Rc<Env>,
    ) -> EnterResult<Type> {
        self.resolve_qualified(enter, name, env)
    }

    fn finish_field(
        &self,
        enter: &mut Enter,
        field: SymbolId,
        tree: &Arc<VarDecl>,
        env: &Rc<Env>,
    ) -> EnterResult<Type> {
        trace!(field = %tree.name, "attributing variable");
        let ty = self.attrib_type(enter, &tree.ty, env)?;
        // Visible to the initializer, which may refer back to this variable.
        enter.symtab_mut().symbols[field].ty = ty.clone();
        if let Some(init) = &tree.init {
            let init_env = enter.init_env(tree, env, field);
            self.attrib_expr(enter, init, &init_env)?;
        }
        Ok(ty)
    }

    fn finish_method(
        &self,
        enter: &mut Enter,
        method: SymbolId,
        tree: &Arc<MethodDecl>,
        env: &Rc<Env>,
    ) -> EnterResult<Type> {
        trace!(method = ?tree.name, "attributing method");
        let method_env = enter.method_env(tree, env, method);

        let mut params = Vec::with_capacity(tree.params.len());
        for param in &tree.params {
            let var = enter.member_enter_var(param, &method_env);
            params.push(self.var_type(enter, var, &method_env, param.span)?);
        }
        let ret = match &tree.return_type {
            Some(ty) => self.attrib_type(enter, ty, env)?,
            None => Type::None,
        };
        let ty = Type::Method {
            params,
            ret: Box::new(ret),
        };
        enter.symtab_mut().symbols[method].ty = ty.clone();

        for stmt in &tree.body {
            match stmt {
                Stmt::LocalVar(var) => {
                    let sym = enter.member_enter_var(var, &method_env);
                    self.var_type(enter, sym, &method_env, var.span)?;
                }
                Stmt::LocalClass(decl) => {
                    if let Type::Class { symbol } = enter.class_enter_local(decl, &method_env) {
                        enter.complete_or_report(symbol, Some(env.unit), decl.span)?;
                    }
                }
                Stmt::Expr(expr) => self.attrib_expr(enter, expr, &method_env)?,
            }
        }
        Ok(ty)
    }
}
