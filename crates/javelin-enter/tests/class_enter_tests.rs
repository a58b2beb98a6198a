//! Class entry: packages, class symbols, flat names and declaration checks.

mod support;

use javelin_ast::{ClassDecl, MethodDecl, SourceUnit, modifier_flags};
use javelin_common::diagnostic_codes;
use javelin_enter::{ClassPath, SymbolKind, symbol_flags};
use std::sync::Arc;
use support::{class, codes, enter_arcs, enter_units, members_named};

#[test]
fn test_every_symbol_reaches_the_root_package() {
    let enter = enter_units(vec![
        SourceUnit::new("a/b/Outer.java")
            .package("a.b")
            .class(ClassDecl::class("Outer").nested(ClassDecl::class("Inner"))),
    ]);
    let symtab = enter.symtab();
    for (id, _) in symtab.symbols.iter() {
        let last = symtab.symbols.owners(id).last();
        assert_eq!(last, Some(symtab.root_package), "symbol {id:?} is detached");
    }
}

#[test]
fn test_member_class_names() {
    let enter = enter_units(vec![
        SourceUnit::new("p/Outer.java")
            .package("p")
            .class(ClassDecl::class("Outer").nested(ClassDecl::class("Inner"))),
    ]);
    let inner = class(&enter, "p.Outer$Inner");
    assert_eq!(enter.symtab().fullname(inner), "p.Outer.Inner");
    assert_eq!(enter.symtab().symbols[inner].owner, class(&enter, "p.Outer"));
    assert!(codes(&enter).is_empty(), "{:?}", enter.diagnostics());
}

#[test]
fn test_entering_a_unit_twice_is_a_no_op() {
    let unit = SourceUnit::new("p/A.java")
        .package("p")
        .class(ClassDecl::class("A"))
        .into_arc();
    let mut enter = enter_arcs(ClassPath::with_bootstrap(), std::slice::from_ref(&unit));
    let symbols = enter.symtab().symbols.len();

    enter
        .enter_all(std::slice::from_ref(&unit))
        .expect("second entry should not abort");

    assert_eq!(enter.symtab().symbols.len(), symbols);
    assert_eq!(enter.units().count(), 1);
    assert!(codes(&enter).is_empty(), "{:?}", enter.diagnostics());
}

#[test]
fn test_duplicate_class_gets_error_symbol() {
    let first = SourceUnit::new("p/A.java")
        .package("p")
        .class(ClassDecl::class("C"))
        .into_arc();
    let second = SourceUnit::new("p/B.java")
        .package("p")
        .class(ClassDecl::class("C"))
        .into_arc();
    let enter = enter_arcs(
        ClassPath::with_bootstrap(),
        &[Arc::clone(&first), Arc::clone(&second)],
    );

    assert_eq!(enter.diagnostics().count_code(diagnostic_codes::DUPLICATE_CLASS), 1);
    let original = enter.symbol_for(&first.types[0]).expect("first C entered");
    let duplicate = enter.symbol_for(&second.types[0]).expect("second C recorded");
    assert_ne!(original, duplicate);
    assert_eq!(enter.symtab().symbols[duplicate].kind, SymbolKind::Error);
    assert_eq!(class(&enter, "p.C"), original);
}

#[test]
fn test_duplicate_member_class_reported_once() {
    let enter = enter_units(vec![
        SourceUnit::new("p/Outer.java").package("p").class(
            ClassDecl::class("Outer")
                .nested(ClassDecl::class("X"))
                .nested(ClassDecl::class("X")),
        ),
    ]);
    assert_eq!(enter.diagnostics().count_code(diagnostic_codes::ALREADY_DEFINED), 1);
    let outer = class(&enter, "p.Outer");
    assert_eq!(members_named(&enter, outer, "X").len(), 1);
}

#[test]
fn test_member_class_named_like_enclosing_class_is_still_entered() {
    let enter = enter_units(vec![
        SourceUnit::new("p/A.java")
            .package("p")
            .class(ClassDecl::class("A").nested(ClassDecl::class("A"))),
    ]);
    assert_eq!(enter.diagnostics().count_code(diagnostic_codes::ALREADY_DEFINED), 1);
    assert!(enter.symtab().class_by_flatname("p.A$A").is_some());
}

#[test]
fn test_public_class_in_wrong_file() {
    let enter = enter_units(vec![
        SourceUnit::new("p/Other.java")
            .package("p")
            .class(ClassDecl::class("A").modifiers(modifier_flags::PUBLIC)),
    ]);
    let diags: Vec<_> = enter
        .diagnostics()
        .with_code(diagnostic_codes::PUBLIC_CLASS_FILE_NAME)
        .collect();
    assert_eq!(diags.len(), 1);
    assert!(diags[0].message.contains("A.java"), "{}", diags[0].message);
}

#[test]
fn test_public_class_in_matching_file() {
    let enter = enter_units(vec![
        SourceUnit::new("p/A.java")
            .package("p")
            .class(ClassDecl::class("A").modifiers(modifier_flags::PUBLIC)),
    ]);
    assert!(codes(&enter).is_empty(), "{:?}", enter.diagnostics());
}

#[test]
fn test_malformed_package_uses_unnamed_package() {
    let enter = enter_units(vec![
        SourceUnit::new("A.java").package("1bad.x").class(ClassDecl::class("A")),
    ]);
    let a = class(&enter, "A");
    assert_eq!(enter.symtab().symbols[a].owner, enter.symtab().unnamed_package);
}

#[test]
fn test_package_clause_marks_parents_existing() {
    let enter = enter_units(vec![
        SourceUnit::new("a/b/c/A.java").package("a.b.c").class(ClassDecl::class("A")),
    ]);
    let packages = enter.dump().packages;
    for name in ["a", "a.b", "a.b.c", "java.lang"] {
        assert!(packages.iter().any(|p| p == name), "missing {name}: {packages:?}");
    }
}

#[test]
fn test_illegal_top_level_modifier() {
    let enter = enter_units(vec![
        SourceUnit::new("p/A.java")
            .package("p")
            .class(ClassDecl::class("A").modifiers(modifier_flags::PRIVATE)),
    ]);
    assert_eq!(enter.diagnostics().count_code(diagnostic_codes::MODIFIER_NOT_ALLOWED), 1);
    let a = class(&enter, "p.A");
    assert!(!enter.symtab().has_flag(a, symbol_flags::PRIVATE));
}

#[test]
fn test_member_class_of_interface_is_public_static() {
    let enter = enter_units(vec![
        SourceUnit::new("p/I.java")
            .package("p")
            .class(ClassDecl::interface("I").nested(ClassDecl::class("Nested"))),
    ]);
    let nested = class(&enter, "p.I$Nested");
    assert!(enter.symtab().has_flag(nested, symbol_flags::PUBLIC));
    assert!(enter.symtab().has_flag(nested, symbol_flags::STATIC));
}

#[test]
fn test_local_classes_get_numbered_flat_names() {
    let mut enter = enter_units(vec![
        SourceUnit::new("p/Outer.java").package("p").class(
            ClassDecl::class("Outer")
                .method(MethodDecl::new("first", "void").local_class(ClassDecl::class("Local")))
                .method(MethodDecl::new("second", "void").local_class(ClassDecl::class("Local"))),
        ),
    ]);
    let outer = class(&enter, "p.Outer");
    enter.complete_members(outer).expect("member completion");

    let first = class(&enter, "p.Outer$1Local");
    let second = class(&enter, "p.Outer$2Local");
    assert_ne!(first, second);
    assert_eq!(enter.symtab().outermost_class(first), Some(outer));
    assert!(enter.symtab().has_flag(first, symbol_flags::LOCAL));
    assert_eq!(enter.symtab().fullname(first), "Local");
    // Local classes are completed on the spot, default constructor included.
    assert_eq!(members_named(&enter, second, "<init>").len(), 1);
    assert!(codes(&enter).is_empty(), "{:?}", enter.diagnostics());
}

#[test]
fn test_unit_classes_visible_in_named_import_scope() {
    let enter = enter_units(vec![
        SourceUnit::new("p/A.java")
            .package("p")
            .class(ClassDecl::class("A"))
            .class(ClassDecl::class("B")),
    ]);
    let (_, unit) = enter.units().next().expect("one unit");
    let scope = unit.named_import_scope;
    assert_eq!(enter.symtab().scopes.lookup(scope, "A"), &[class(&enter, "p.A")]);
    assert_eq!(enter.symtab().scopes.lookup(scope, "B"), &[class(&enter, "p.B")]);
}
