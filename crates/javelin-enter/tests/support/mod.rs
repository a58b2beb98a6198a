//! Shared fixtures for the entry integration tests.
#![allow(dead_code)]

use javelin_ast::SourceUnit;
use javelin_enter::{ClassPath, Enter, SymbolId};
use std::rc::Rc;
use std::sync::Arc;

/// Enter `units` against the bootstrap class path.
pub fn enter_units(units: Vec<SourceUnit>) -> Enter {
    enter_with(ClassPath::with_bootstrap(), units)
}

pub fn enter_with(class_path: ClassPath, units: Vec<SourceUnit>) -> Enter {
    let units: Vec<Arc<SourceUnit>> = units.into_iter().map(Arc::new).collect();
    enter_arcs(class_path, &units)
}

pub fn enter_arcs(class_path: ClassPath, units: &[Arc<SourceUnit>]) -> Enter {
    let mut enter = Enter::new(Rc::new(class_path));
    enter.enter_all(units).expect("entry should not abort");
    enter
}

pub fn codes(enter: &Enter) -> Vec<u32> {
    enter.diagnostics().iter().map(|d| d.code).collect()
}

pub fn class(enter: &Enter, flatname: &str) -> SymbolId {
    enter
        .symtab()
        .class_by_flatname(flatname)
        .unwrap_or_else(|| panic!("class {flatname} should exist"))
}

/// Rendered superclass of `flatname`, `None` when it has none.
pub fn supertype_of(enter: &Enter, flatname: &str) -> Option<String> {
    let info = enter
        .symtab()
        .class_info(class(enter, flatname))
        .expect("class info");
    (!info.supertype.is_none()).then(|| enter.symtab().type_to_string(&info.supertype))
}

pub fn interfaces_of(enter: &Enter, flatname: &str) -> Vec<String> {
    let info = enter
        .symtab()
        .class_info(class(enter, flatname))
        .expect("class info");
    info.interfaces
        .iter()
        .map(|t| enter.symtab().type_to_string(t))
        .collect()
}

/// Symbols named `name` in the members scope of `owner`.
pub fn members_named(enter: &Enter, owner: SymbolId, name: &str) -> Vec<SymbolId> {
    let members = enter.symtab().symbols[owner].members;
    enter.symtab().scopes.lookup(members, name).to_vec()
}
