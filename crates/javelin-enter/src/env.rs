//! Environment chain.
//!
//! One [`Env`] is built per lexical context (unit, class body, base clause,
//! method, variable initializer, import) and linked to its enclosing context
//! through `outer`. Environments are immutable once shared; a nested context
//! starts from [`Env::dup`] and adjusts its own [`EnvInfo`].

use crate::options::Lint;
use crate::scopes::ScopeId;
use crate::state::UnitId;
use crate::symbols::SymbolId;
use javelin_ast::{ClassDecl, MethodDecl, VarDecl};
use javelin_common::limits::MAX_ENV_WALK;
use std::rc::Rc;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub enum EnvTree {
    Unit,
    Class(Arc<ClassDecl>),
    Method(Arc<MethodDecl>),
    Var(Arc<VarDecl>),
    /// Index into the unit's import list.
    Import(usize),
}

impl EnvTree {
    pub fn is_import(&self) -> bool {
        matches!(self, EnvTree::Import(_))
    }
}

#[derive(Clone, Debug)]
pub struct EnvInfo {
    pub scope: ScopeId,
    pub static_level: u32,
    /// Lint set established here; `None` inherits from the nearest outer env.
    pub lint: Option<Lint>,
    /// Inside the arguments of `this(...)`/`super(...)`.
    pub is_self_call: bool,
    /// Resolving the supertype list of the class in `tree`.
    pub base_clause: bool,
}

#[derive(Debug)]
pub struct Env {
    pub outer: Option<Rc<Env>>,
    pub tree: EnvTree,
    pub unit: UnitId,
    pub enclosing_class: SymbolId,
    pub enclosing_method: Option<SymbolId>,
    pub info: EnvInfo,
}

impl Env {
    /// Root environment of a unit.
    pub fn unit(unit: UnitId, scope: ScopeId) -> Env {
        Env {
            outer: None,
            tree: EnvTree::Unit,
            unit,
            enclosing_class: SymbolId::NONE,
            enclosing_method: None,
            info: EnvInfo {
                scope,
                static_level: 0,
                lint: None,
                is_self_call: false,
                base_clause: false,
            },
        }
    }

    /// A nested environment for `tree` inheriting everything but the lint
    /// override.
    pub fn dup(self: &Rc<Self>, tree: EnvTree) -> Env {
        Env {
            outer: Some(Rc::clone(self)),
            tree,
            unit: self.unit,
            enclosing_class: self.enclosing_class,
            enclosing_method: self.enclosing_method,
            info: EnvInfo {
                lint: None,
                ..self.info.clone()
            },
        }
    }

    /// This environment followed by every enclosing one.
    pub fn outers(&self) -> impl Iterator<Item = &Env> {
        std::iter::successors(Some(self), |env| env.outer.as_deref()).take(MAX_ENV_WALK)
    }

    /// Effective lint set: the nearest override, else `default`.
    pub fn lint_or(&self, default: Lint) -> Lint {
        self.outers()
            .find_map(|env| env.info.lint)
            .unwrap_or(default)
    }

    /// Whether this context is static relative to its enclosing one.
    pub fn is_static(&self) -> bool {
        self.outer
            .as_ref()
            .is_some_and(|outer| self.info.static_level > outer.info.static_level)
    }

    pub fn class_tree(&self) -> Option<&Arc<ClassDecl>> {
        match &self.tree {
            EnvTree::Class(decl) => Some(decl),
            _ => None,
        }
    }
}
