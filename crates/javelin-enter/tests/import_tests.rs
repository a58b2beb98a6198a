//! Single-type, on-demand and static imports.

mod support;

use javelin_ast::{ClassDecl, ClassKind, Expr, SourceUnit, VarDecl};
use javelin_common::diagnostic_codes;
use javelin_enter::{ClassPath, ClassStub, Enter, SymbolId, SymbolKind, UnitId};
use std::rc::Rc;
use std::sync::Arc;
use support::{class, codes, enter_units, enter_with, supertype_of};

fn library() -> ClassPath {
    let mut class_path = ClassPath::with_bootstrap();
    class_path.add_class(ClassStub::new("q.Util", ClassKind::Class));
    class_path.add_class(ClassStub::new("q.Hidden", ClassKind::Class).modifiers(&[]));
    class_path.add_class(ClassStub::new("q.C", ClassKind::Class));
    class_path.add_class(ClassStub::new("r.C", ClassKind::Class));
    class_path.add_class(ClassStub::new("q.Outer", ClassKind::Class));
    class_path.add_class(
        ClassStub::new("q.Outer$Nested", ClassKind::Class).modifiers(&["public", "static"]),
    );
    class_path
}

/// Symbols named `name` in the named (`star == false`) or on-demand import
/// scope of the first unit.
fn imported(enter: &Enter, name: &str, star: bool) -> Vec<SymbolId> {
    let unit = enter.unit(UnitId(0)).expect("unit entered");
    let scope = if star {
        unit.star_import_scope
    } else {
        unit.named_import_scope
    };
    enter.symtab().scopes.lookup(scope, name).to_vec()
}

#[test]
fn test_root_package_imported_on_demand() {
    let enter = enter_units(vec![
        SourceUnit::new("p/A.java").package("p").class(ClassDecl::class("A")),
    ]);
    assert_eq!(imported(&enter, "String", true), vec![class(&enter, "java.lang.String")]);
    assert_eq!(imported(&enter, "Math", true), vec![class(&enter, "java.lang.Math")]);
}

#[test]
fn test_wildcard_import_skips_inaccessible_classes() {
    let enter = enter_with(
        library(),
        vec![
            SourceUnit::new("p/A.java")
                .package("p")
                .import("q.*")
                .class(ClassDecl::class("A")),
        ],
    );
    assert!(codes(&enter).is_empty(), "{:?}", enter.diagnostics());
    assert_eq!(imported(&enter, "Util", true).len(), 1);
    assert!(imported(&enter, "Hidden", true).is_empty());
}

#[test]
fn test_named_import_shadows_wildcard_import() {
    let enter = enter_with(
        library(),
        vec![
            SourceUnit::new("p/A.java")
                .package("p")
                .import("q.*")
                .import("r.C")
                .class(ClassDecl::class("A").extends("C")),
        ],
    );
    assert!(codes(&enter).is_empty(), "{:?}", enter.diagnostics());
    assert_eq!(supertype_of(&enter, "p.A").as_deref(), Some("r.C"));
}

#[test]
fn test_conflicting_single_type_imports() {
    let enter = enter_with(
        library(),
        vec![
            SourceUnit::new("p/A.java")
                .package("p")
                .import("q.C")
                .import("r.C")
                .class(ClassDecl::class("A")),
        ],
    );
    assert_eq!(
        enter.diagnostics().count_code(diagnostic_codes::ALREADY_DEFINED_SINGLE_IMPORT),
        1
    );
    assert_eq!(imported(&enter, "C", false), vec![class(&enter, "q.C")]);
}

#[test]
fn test_repeated_single_type_import_is_harmless() {
    let enter = enter_with(
        library(),
        vec![
            SourceUnit::new("p/A.java")
                .package("p")
                .import("q.C")
                .import("q.C")
                .class(ClassDecl::class("A")),
        ],
    );
    assert!(codes(&enter).is_empty(), "{:?}", enter.diagnostics());
}

#[test]
fn test_import_clashing_with_unit_class() {
    let enter = enter_with(
        library(),
        vec![
            SourceUnit::new("p/C.java")
                .package("p")
                .import("q.C")
                .class(ClassDecl::class("C")),
        ],
    );
    assert_eq!(
        enter.diagnostics().count_code(diagnostic_codes::ALREADY_DEFINED_THIS_UNIT),
        1
    );
    assert_eq!(imported(&enter, "C", false), vec![class(&enter, "p.C")]);
}

#[test]
fn test_wildcard_import_of_missing_package() {
    let enter = enter_units(vec![
        SourceUnit::new("p/A.java")
            .package("p")
            .import("nope.*")
            .class(ClassDecl::class("A")),
    ]);
    assert_eq!(
        enter.diagnostics().count_code(diagnostic_codes::PACKAGE_DOES_NOT_EXIST),
        1
    );
}

#[test]
fn test_single_type_import_of_missing_class() {
    let enter = enter_with(
        library(),
        vec![
            SourceUnit::new("p/A.java")
                .package("p")
                .import("q.Missing")
                .import("nope.Thing")
                .class(ClassDecl::class("A")),
        ],
    );
    assert_eq!(enter.diagnostics().count_code(diagnostic_codes::CANNOT_FIND_SYMBOL), 1);
    assert_eq!(
        enter.diagnostics().count_code(diagnostic_codes::PACKAGE_DOES_NOT_EXIST),
        1
    );
}

#[test]
fn test_imports_of_unit_without_classes_are_processed() {
    let enter = enter_units(vec![SourceUnit::new("p/package-info.java").package("p").import("nope.*")]);
    assert_eq!(
        enter.diagnostics().count_code(diagnostic_codes::PACKAGE_DOES_NOT_EXIST),
        1
    );
}

#[test]
fn test_static_import_of_field_and_overloads() {
    let enter = enter_units(vec![
        SourceUnit::new("p/A.java")
            .package("p")
            .import_static("java.lang.Math.PI")
            .import_static("java.lang.Math.max")
            .class(ClassDecl::class("A")),
    ]);
    assert!(codes(&enter).is_empty(), "{:?}", enter.diagnostics());
    let pi = imported(&enter, "PI", false);
    assert_eq!(pi.len(), 1);
    assert_eq!(enter.symtab().symbols[pi[0]].kind, SymbolKind::Field);
    assert_eq!(imported(&enter, "max", false).len(), 2);
}

#[test]
fn test_static_import_of_unknown_member() {
    let enter = enter_units(vec![
        SourceUnit::new("p/A.java")
            .package("p")
            .import_static("java.lang.Math.nothing")
            .class(ClassDecl::class("A")),
    ]);
    let missing: Vec<_> = enter
        .diagnostics()
        .with_code(diagnostic_codes::CANNOT_FIND_STATIC_MEMBER)
        .collect();
    assert_eq!(missing.len(), 1);
    assert!(missing[0].message.contains("java.lang.Math"), "{}", missing[0].message);
}

#[test]
fn test_static_import_of_private_member_is_not_found() {
    let enter = enter_units(vec![
        SourceUnit::new("p/A.java")
            .package("p")
            .import_static("java.lang.Math.helper")
            .class(ClassDecl::class("A")),
    ]);
    assert_eq!(
        enter.diagnostics().count_code(diagnostic_codes::CANNOT_FIND_STATIC_MEMBER),
        1
    );
    assert_eq!(codes(&enter).len(), 1, "{:?}", enter.diagnostics());
    assert!(imported(&enter, "helper", false).is_empty());
}

#[test]
fn test_static_import_of_private_field_is_not_found() {
    let enter = enter_units(vec![
        SourceUnit::new("p/A.java")
            .package("p")
            .import_static("java.lang.Math.cache")
            .class(ClassDecl::class("A")),
    ]);
    let missing: Vec<_> = enter
        .diagnostics()
        .with_code(diagnostic_codes::CANNOT_FIND_STATIC_MEMBER)
        .collect();
    assert_eq!(missing.len(), 1);
    assert!(missing[0].message.contains("'cache'"), "{}", missing[0].message);
}

#[test]
fn test_static_wildcard_import_respects_access() {
    let enter = enter_units(vec![
        SourceUnit::new("p/A.java")
            .package("p")
            .import_static("java.lang.Math.*")
            .class(ClassDecl::class("A")),
    ]);
    assert!(codes(&enter).is_empty(), "{:?}", enter.diagnostics());
    assert_eq!(imported(&enter, "PI", true).len(), 1);
    assert_eq!(imported(&enter, "E", true).len(), 1);
    assert_eq!(imported(&enter, "max", true).len(), 2);
    assert!(imported(&enter, "cache", true).is_empty());
    assert!(imported(&enter, "helper", true).is_empty());
}

#[test]
fn test_static_import_of_member_class() {
    let enter = enter_with(
        library(),
        vec![
            SourceUnit::new("p/A.java")
                .package("p")
                .import_static("q.Outer.Nested")
                .class(ClassDecl::class("A").extends("Nested")),
        ],
    );
    assert!(codes(&enter).is_empty(), "{:?}", enter.diagnostics());
    assert_eq!(supertype_of(&enter, "p.A").as_deref(), Some("q.Outer.Nested"));
}

#[test]
fn test_static_wildcard_import_through_diamond_enters_once() {
    let base = ClassDecl::interface("Base")
        .field(VarDecl::new("X", "int").init(Expr::literal()));
    let enter = enter_units(vec![
        SourceUnit::new("p/User.java")
            .package("p")
            .import_static("p.Both.*")
            .class(ClassDecl::class("User")),
        SourceUnit::new("p/Both.java")
            .package("p")
            .class(base)
            .class(ClassDecl::interface("Left").extends("Base"))
            .class(ClassDecl::interface("Right").extends("Base"))
            .class(ClassDecl::class("Both").extends("Left").extends("Right")),
    ]);
    assert!(codes(&enter).is_empty(), "{:?}", enter.diagnostics());
    let x = imported(&enter, "X", true);
    assert_eq!(x.len(), 1);
    assert_eq!(enter.symtab().symbols[x[0]].owner, class(&enter, "p.Base"));
}

#[test]
fn test_missing_root_package_is_fatal() {
    let unit = Arc::new(SourceUnit::new("p/A.java").package("p").class(ClassDecl::class("A")));
    let mut enter = Enter::new(Rc::new(ClassPath::new()));
    let result = enter.enter_all(&[unit]);
    assert!(result.is_err());
    assert_eq!(enter.diagnostics().count_code(diagnostic_codes::NO_ROOT_PACKAGE), 1);
}

#[test]
fn test_package_prefix_clashing_with_class_path_class() {
    let mut class_path = ClassPath::with_bootstrap();
    class_path.add_class(ClassStub::new("lib.Tool", ClassKind::Class));
    let enter = enter_with(
        class_path,
        vec![
            SourceUnit::new("lib/Tool/A.java")
                .package("lib.Tool")
                .class(ClassDecl::class("A")),
        ],
    );
    assert_eq!(
        enter.diagnostics().count_code(diagnostic_codes::PACKAGE_CLASHES_WITH_CLASS),
        1
    );
}
