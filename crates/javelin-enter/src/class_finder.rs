//! Class-path collaborator.
//!
//! Pre-compiled classes are described by [`ClassStub`]s; classes whose source
//! lives on a source path are backed by a parsed [`SourceUnit`] and entered
//! through a nested driver pass the first time they are completed.

use crate::error::{CompletionFailure, EnterError, EnterResult};
use crate::state::Enter;
use crate::symbols::{ClassState, SymbolId, SymbolKind, Type, symbol_flags};
use javelin_ast::{ClassKind, PrimitiveKind, SourceUnit, modifier_flags};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Source of classes that are not part of the current compilation.
pub trait ClassFinder {
    /// Flags of the class with flat name `flatname`, if it exists.
    fn find_class(&self, flatname: &str) -> Option<u32>;

    fn package_exists(&self, fullname: &str) -> bool;

    /// Simple names of the top-level classes in package `fullname`.
    fn package_classes(&self, fullname: &str) -> Vec<String>;

    /// Fill in the class `sym`, previously created for a flat name this
    /// finder reported.
    fn complete_class(&self, enter: &mut Enter, sym: SymbolId) -> EnterResult<()>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    #[default]
    Field,
    Method,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberStub {
    pub name: String,
    #[serde(default)]
    pub kind: MemberKind,
    #[serde(default)]
    pub modifiers: Vec<String>,
    /// Field type or method return type: `int`, `java.lang.String`, `int[]`.
    #[serde(default = "void_type")]
    pub ty: String,
    #[serde(default)]
    pub params: Vec<String>,
}

fn void_type() -> String {
    "void".to_string()
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassStub {
    /// Flat name: `java.util.Map$Entry`.
    pub name: String,
    #[serde(default)]
    pub kind: ClassKind,
    #[serde(default)]
    pub modifiers: Vec<String>,
    #[serde(default)]
    pub superclass: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub members: Vec<MemberStub>,
}

impl ClassStub {
    pub fn new(name: &str, kind: ClassKind) -> Self {
        ClassStub {
            name: name.to_string(),
            kind,
            modifiers: vec!["public".to_string()],
            ..ClassStub::default()
        }
    }

    pub fn extends(mut self, superclass: &str) -> Self {
        self.superclass = Some(superclass.to_string());
        self
    }

    pub fn implements(mut self, interface: &str) -> Self {
        self.interfaces.push(interface.to_string());
        self
    }

    pub fn modifiers(mut self, modifiers: &[&str]) -> Self {
        self.modifiers = modifiers.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn field(mut self, name: &str, ty: &str, modifiers: &[&str]) -> Self {
        self.members.push(MemberStub {
            name: name.to_string(),
            kind: MemberKind::Field,
            modifiers: modifiers.iter().map(|m| m.to_string()).collect(),
            ty: ty.to_string(),
            params: Vec::new(),
        });
        self
    }

    pub fn method(mut self, name: &str, ret: &str, params: &[&str], modifiers: &[&str]) -> Self {
        self.members.push(MemberStub {
            name: name.to_string(),
            kind: MemberKind::Method,
            modifiers: modifiers.iter().map(|m| m.to_string()).collect(),
            ty: ret.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
        });
        self
    }

    fn flags(&self) -> u32 {
        modifier_bits(&self.modifiers) | kind_flags(self.kind)
    }

    fn package(&self) -> &str {
        package_part(&self.name)
    }
}

/// On-disk class-path description.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ClassPathFile {
    #[serde(default)]
    pub packages: Vec<String>,
    #[serde(default)]
    pub classes: Vec<ClassStub>,
}

/// In-memory [`ClassFinder`].
#[derive(Clone, Debug, Default)]
pub struct ClassPath {
    classes: FxHashMap<String, ClassStub>,
    packages: FxHashSet<String>,
    /// Top-level source classes by flat name.
    sources: FxHashMap<String, Arc<SourceUnit>>,
}

impl ClassPath {
    pub fn new() -> Self {
        ClassPath::default()
    }

    /// A class path holding a minimal `java.lang` and `java.io.Serializable`.
    pub fn with_bootstrap() -> Self {
        let mut cp = ClassPath::new();
        cp.add_class(ClassStub::new("java.lang.Object", ClassKind::Class).method(
            "toString",
            "java.lang.String",
            &[],
            &["public"],
        ));
        cp.add_class(
            ClassStub::new("java.lang.String", ClassKind::Class)
                .modifiers(&["public", "final"])
                .extends("java.lang.Object")
                .implements("java.lang.Comparable")
                .implements("java.io.Serializable"),
        );
        cp.add_class(ClassStub::new("java.lang.Comparable", ClassKind::Interface));
        cp.add_class(ClassStub::new("java.io.Serializable", ClassKind::Interface));
        cp.add_class(
            ClassStub::new("java.lang.Enum", ClassKind::Class)
                .modifiers(&["public", "abstract"])
                .extends("java.lang.Object")
                .implements("java.lang.Comparable")
                .implements("java.io.Serializable"),
        );
        cp.add_class(
            ClassStub::new("java.lang.Math", ClassKind::Class)
                .modifiers(&["public", "final"])
                .extends("java.lang.Object")
                .field("PI", "double", &["public", "static", "final"])
                .field("E", "double", &["public", "static", "final"])
                .field("cache", "int[]", &["private", "static"])
                .method("max", "int", &["int", "int"], &["public", "static"])
                .method("max", "long", &["long", "long"], &["public", "static"])
                .method("abs", "int", &["int"], &["public", "static"])
                .method("helper", "void", &[], &["private", "static"]),
        );
        cp.add_class(
            ClassStub::new("java.lang.Deprecated", ClassKind::Annotation)
                .implements("java.lang.annotation.Annotation"),
        );
        cp.add_class(ClassStub::new("java.lang.annotation.Annotation", ClassKind::Interface));
        cp
    }

    pub fn add_class(&mut self, stub: ClassStub) {
        self.add_package(stub.package());
        self.classes.insert(stub.name.clone(), stub);
    }

    /// Register a package (and its parents) as existing.
    pub fn add_package(&mut self, fullname: &str) {
        let mut name = fullname;
        while !name.is_empty() && self.packages.insert(name.to_string()) {
            name = name.rsplit_once('.').map_or("", |(q, _)| q);
        }
    }

    /// Make the top-level classes of `unit` available on demand.
    pub fn add_source(&mut self, unit: Arc<SourceUnit>) {
        let package = unit
            .package
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        self.add_package(&package);
        for decl in &unit.types {
            let flatname = if package.is_empty() {
                decl.name.clone()
            } else {
                format!("{package}.{}", decl.name)
            };
            self.sources.insert(flatname, Arc::clone(&unit));
        }
    }

    pub fn extend(&mut self, file: ClassPathFile) {
        for package in &file.packages {
            self.add_package(package);
        }
        for stub in file.classes {
            self.add_class(stub);
        }
    }

    fn source_flags(&self, flatname: &str) -> Option<u32> {
        let unit = self.sources.get(flatname)?;
        let simple = simple_part(flatname);
        let decl = unit.types.iter().find(|d| d.name == simple)?;
        Some((decl.modifiers & modifier_flags::ALL) | kind_flags(decl.kind))
    }

    fn fill_from_stub(&self, enter: &mut Enter, sym: SymbolId, stub: &ClassStub) -> EnterResult<()> {
        let missing = |name: &str| {
            EnterError::from(CompletionFailure::new(
                sym,
                stub.name.clone(),
                format!("class file for '{name}' not found"),
            ))
        };

        let supertype = match &stub.superclass {
            Some(name) => Type::class(enter.load_class(name).ok_or_else(|| missing(name))?),
            None => Type::None,
        };
        let mut interfaces = Vec::with_capacity(stub.interfaces.len());
        for name in &stub.interfaces {
            interfaces.push(Type::class(enter.load_class(name).ok_or_else(|| missing(name))?));
        }

        for member in &stub.members {
            let flags = modifier_bits(&member.modifiers);
            let ret = parse_stub_type(enter, &member.ty);
            let (kind, ty) = match member.kind {
                MemberKind::Field => (SymbolKind::Field, ret),
                MemberKind::Method => {
                    let params = member
                        .params
                        .iter()
                        .map(|p| parse_stub_type(enter, p))
                        .collect();
                    (
                        SymbolKind::Method,
                        Type::Method {
                            params,
                            ret: Box::new(ret),
                        },
                    )
                }
            };
            enter
                .symtab_mut()
                .enter_member(kind, &member.name, sym, flags, ty);
        }

        let prefix = format!("{}$", stub.name);
        let mut nested: Vec<&str> = self
            .classes
            .keys()
            .filter_map(|k| k.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('$'))
            .collect();
        nested.sort_unstable();
        for simple in nested {
            let flat = format!("{prefix}{simple}");
            enter.load_class(&flat);
        }

        let symtab = enter.symtab_mut();
        symtab.symbols[sym].flags |= stub.flags();
        if let Some(info) = symtab.class_info_mut(sym) {
            info.supertype = supertype;
            info.interfaces = interfaces;
            info.state = ClassState::MembersFinished;
        }
        Ok(())
    }
}

impl ClassFinder for ClassPath {
    fn find_class(&self, flatname: &str) -> Option<u32> {
        match self.classes.get(flatname) {
            Some(stub) => Some(stub.flags()),
            None => self.source_flags(flatname),
        }
    }

    fn package_exists(&self, fullname: &str) -> bool {
        self.packages.contains(fullname)
    }

    fn package_classes(&self, fullname: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .classes
            .keys()
            .chain(self.sources.keys())
            .filter(|flat| !flat.contains('$') && package_part(flat) == fullname)
            .map(|flat| simple_part(flat).to_string())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    fn complete_class(&self, enter: &mut Enter, sym: SymbolId) -> EnterResult<()> {
        let flatname = enter.symtab().flatname(sym);
        if let Some(stub) = self.classes.get(&flatname) {
            debug!(class = %flatname, "completing from class stub");
            return self.fill_from_stub(enter, sym, stub);
        }
        if let Some(unit) = self.sources.get(&flatname) {
            debug!(class = %flatname, file = %unit.file_name, "completing from source path");
            enter.complete_sources(std::slice::from_ref(unit), Some(sym))?;
            if enter.symtab().has_flag(sym, symbol_flags::FROM_SOURCE) {
                return Ok(());
            }
        }
        Err(CompletionFailure::new(sym, flatname, "class file not found").into())
    }
}

fn package_part(flatname: &str) -> &str {
    let outer = flatname.split_once('$').map_or(flatname, |(outer, _)| outer);
    outer.rsplit_once('.').map_or("", |(q, _)| q)
}

fn simple_part(flatname: &str) -> &str {
    flatname.rsplit_once('.').map_or(flatname, |(_, simple)| simple)
}

fn modifier_bits(modifiers: &[String]) -> u32 {
    modifiers
        .iter()
        .filter_map(|m| modifier_flags::from_name(m))
        .fold(0, |acc, bit| acc | bit)
}

pub(crate) fn kind_flags(kind: ClassKind) -> u32 {
    match kind {
        ClassKind::Class => 0,
        ClassKind::Interface => symbol_flags::INTERFACE | symbol_flags::ABSTRACT,
        ClassKind::Enum => symbol_flags::ENUM | symbol_flags::FINAL,
        ClassKind::Mixin => symbol_flags::MIXIN | symbol_flags::ABSTRACT,
        ClassKind::Annotation => {
            symbol_flags::INTERFACE | symbol_flags::ANNOTATION | symbol_flags::ABSTRACT
        }
    }
}

/// `int`, `p.C`, `p.C[]`; unknown classes become the error type.
fn parse_stub_type(enter: &mut Enter, text: &str) -> Type {
    if let Some(element) = text.strip_suffix("[]") {
        return Type::Array {
            element: Box::new(parse_stub_type(enter, element)),
        };
    }
    if let Some(kind) = PrimitiveKind::from_name(text) {
        return Type::Primitive { name: kind };
    }
    enter.load_class(text).map_or(Type::Error, Type::class)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_packages_and_classes() {
        let cp = ClassPath::with_bootstrap();
        assert!(cp.package_exists("java.lang"));
        assert!(cp.package_exists("java"));
        assert!(cp.find_class("java.lang.Object").is_some());
        assert!(cp.package_classes("java.lang").contains(&"Math".to_string()));
        let flags = cp.find_class("java.lang.Comparable").unwrap_or_default();
        assert_ne!(flags & symbol_flags::INTERFACE, 0);
    }

    #[test]
    fn test_package_part_ignores_nested_suffix() {
        assert_eq!(package_part("java.util.Map$Entry"), "java.util");
        assert_eq!(package_part("Top"), "");
    }

    #[test]
    fn test_simple_part_of_flat_names() {
        assert_eq!(simple_part("java.lang.Object"), "Object");
        assert_eq!(simple_part("Top"), "Top");
    }

    #[test]
    fn test_source_classes_listed_with_flags() {
        let mut cp = ClassPath::new();
        let unit = SourceUnit::new("q/Helper.java")
            .package("q")
            .class(javelin_ast::ClassDecl::interface("Helper").modifiers(modifier_flags::PUBLIC));
        cp.add_source(Arc::new(unit));
        assert_eq!(cp.package_classes("q"), vec!["Helper".to_string()]);
        let flags = cp.find_class("q.Helper").unwrap_or_default();
        assert_ne!(flags & symbol_flags::INTERFACE, 0);
        assert_ne!(flags & symbol_flags::PUBLIC, 0);
    }
}
