//! Member entry and on-demand member completion.

mod support;

use javelin_ast::{
    ClassDecl, Expr, MethodDecl, SelfCallTarget, SourceUnit, Stmt, VarDecl, modifier_flags,
};
use javelin_common::diagnostic_codes;
use javelin_enter::{Enter, SymbolKind, symbol_flags};
use support::{class, codes, enter_units, members_named};

fn complete_all(enter: &mut Enter, flatnames: &[&str]) {
    for flatname in flatnames {
        let c = class(enter, flatname);
        enter.complete_members(c).expect("member completion");
    }
}

#[test]
fn test_fields_methods_and_default_constructor() {
    let enter = enter_units(vec![
        SourceUnit::new("p/A.java").package("p").class(
            ClassDecl::class("A")
                .field(VarDecl::new("x", "int"))
                .method(MethodDecl::new("m", "void")),
        ),
    ]);
    let dump = enter.dump();
    let a = dump.class("p.A").expect("dumped");
    assert_eq!(a.member("x").map(|m| m.kind), Some(SymbolKind::Field));
    assert_eq!(a.member("m").map(|m| m.kind), Some(SymbolKind::Method));
    let ctor = a.member("<init>").expect("default constructor");
    assert!(ctor.flags.contains(&"synthetic"));
    assert_eq!(ctor.ty.as_deref(), Some("()none"));
    // Not attributed until completed.
    assert_eq!(a.member("x").and_then(|m| m.ty.clone()), None);
}

#[test]
fn test_default_constructor_follows_class_access() {
    let enter = enter_units(vec![
        SourceUnit::new("p/A.java")
            .package("p")
            .class(ClassDecl::class("A").modifiers(modifier_flags::PUBLIC)),
    ]);
    let a = class(&enter, "p.A");
    let ctor = members_named(&enter, a, "<init>");
    assert_eq!(ctor.len(), 1);
    assert!(enter.symtab().has_flag(ctor[0], symbol_flags::PUBLIC));
}

#[test]
fn test_no_default_constructor_when_declared_or_interface() {
    let enter = enter_units(vec![
        SourceUnit::new("p/A.java")
            .package("p")
            .class(
                ClassDecl::class("A")
                    .method(MethodDecl::constructor("A").param(VarDecl::new("x", "int"))),
            )
            .class(ClassDecl::interface("I")),
    ]);
    let a = class(&enter, "p.A");
    let ctors = members_named(&enter, a, "<init>");
    assert_eq!(ctors.len(), 1);
    assert!(!enter.symtab().has_flag(ctors[0], symbol_flags::SYNTHETIC));
    assert!(members_named(&enter, class(&enter, "p.I"), "<init>").is_empty());
}

#[test]
fn test_duplicate_field_not_entered() {
    let enter = enter_units(vec![
        SourceUnit::new("p/A.java").package("p").class(
            ClassDecl::class("A")
                .field(VarDecl::new("x", "int"))
                .field(VarDecl::new("x", "long")),
        ),
    ]);
    let dups: Vec<_> = enter
        .diagnostics()
        .with_code(diagnostic_codes::ALREADY_DEFINED)
        .collect();
    assert_eq!(dups.len(), 1);
    assert!(dups[0].message.contains("p.A"), "{}", dups[0].message);
    assert_eq!(members_named(&enter, class(&enter, "p.A"), "x").len(), 1);
}

#[test]
fn test_overloaded_methods_are_all_entered() {
    let enter = enter_units(vec![
        SourceUnit::new("p/A.java").package("p").class(
            ClassDecl::class("A")
                .method(MethodDecl::new("m", "void"))
                .method(MethodDecl::new("m", "void").param(VarDecl::new("a", "int"))),
        ),
    ]);
    assert!(codes(&enter).is_empty(), "{:?}", enter.diagnostics());
    assert_eq!(members_named(&enter, class(&enter, "p.A"), "m").len(), 2);
}

#[test]
fn test_malformed_method_is_dropped() {
    let enter = enter_units(vec![
        SourceUnit::new("p/A.java")
            .package("p")
            .class(ClassDecl::class("A").method(MethodDecl::malformed())),
    ]);
    assert!(codes(&enter).is_empty(), "{:?}", enter.diagnostics());
    let a = class(&enter, "p.A");
    let members = enter.symtab().symbols[a].members;
    let methods: Vec<_> = enter
        .symtab()
        .scopes
        .symbols(members)
        .into_iter()
        .filter(|&(_, sym)| enter.symtab().symbols[sym].kind == SymbolKind::Method)
        .map(|(name, _)| name.to_string())
        .collect();
    assert_eq!(methods, vec!["<init>".to_string()]);
}

#[test]
fn test_interface_members_get_implied_modifiers() {
    let enter = enter_units(vec![
        SourceUnit::new("p/I.java").package("p").class(
            ClassDecl::interface("I")
                .field(VarDecl::new("X", "int").init(Expr::literal()))
                .method(MethodDecl::new("m", "void")),
        ),
    ]);
    let dump = enter.dump();
    let i = dump.class("p.I").expect("dumped");
    let x = i.member("X").expect("field");
    for flag in ["public", "static", "final"] {
        assert!(x.flags.contains(&flag), "missing {flag}: {:?}", x.flags);
    }
    let m = i.member("m").expect("method");
    assert!(m.flags.contains(&"public") && m.flags.contains(&"abstract"));
}

#[test]
fn test_illegal_modifier_combination_on_field() {
    let enter = enter_units(vec![
        SourceUnit::new("p/A.java").package("p").class(
            ClassDecl::class("A").field(
                VarDecl::new("x", "int").modifiers(modifier_flags::PUBLIC | modifier_flags::PRIVATE),
            ),
        ),
    ]);
    assert_eq!(
        enter.diagnostics().count_code(diagnostic_codes::ILLEGAL_MODIFIER_COMBINATION),
        1
    );
    let x = members_named(&enter, class(&enter, "p.A"), "x");
    assert!(enter.symtab().has_flag(x[0], symbol_flags::PUBLIC));
    assert!(!enter.symtab().has_flag(x[0], symbol_flags::PRIVATE));
}

#[test]
fn test_method_type_after_completion() {
    let mut enter = enter_units(vec![
        SourceUnit::new("p/A.java").package("p").class(
            ClassDecl::class("A").method(
                MethodDecl::new("m", "int")
                    .param(VarDecl::new("a", "int"))
                    .param(VarDecl::new("s", "String")),
            ),
        ),
    ]);
    complete_all(&mut enter, &["p.A"]);
    assert!(codes(&enter).is_empty(), "{:?}", enter.diagnostics());
    let dump = enter.dump();
    let m = dump.class("p.A").and_then(|a| a.member("m")).expect("method");
    assert_eq!(m.ty.as_deref(), Some("(int,java.lang.String)int"));
}

#[test]
fn test_mutual_static_field_references_terminate() {
    let mut enter = enter_units(vec![
        SourceUnit::new("p/A.java")
            .package("p")
            .class(ClassDecl::class("A").field(
                VarDecl::new("x", "int")
                    .modifiers(modifier_flags::STATIC)
                    .init(Expr::name("B.y")),
            ))
            .class(ClassDecl::class("B").field(
                VarDecl::new("y", "int")
                    .modifiers(modifier_flags::STATIC)
                    .init(Expr::name("A.x")),
            )),
    ]);
    complete_all(&mut enter, &["p.A", "p.B"]);
    assert!(codes(&enter).is_empty(), "{:?}", enter.diagnostics());
    let dump = enter.dump();
    for (owner, field) in [("p.A", "x"), ("p.B", "y")] {
        let member = dump.class(owner).and_then(|c| c.member(field)).expect("field");
        assert_eq!(member.ty.as_deref(), Some("int"));
    }
}

#[test]
fn test_mutual_instance_field_references_terminate() {
    let mut enter = enter_units(vec![
        SourceUnit::new("p/A.java").package("p").class(
            ClassDecl::class("A")
                .field(VarDecl::new("x", "int").init(Expr::name("y")))
                .field(VarDecl::new("y", "int").init(Expr::name("x"))),
        ),
    ]);
    complete_all(&mut enter, &["p.A"]);
    assert!(codes(&enter).is_empty(), "{:?}", enter.diagnostics());
}

#[test]
fn test_instance_field_from_static_initializer() {
    let mut enter = enter_units(vec![
        SourceUnit::new("p/A.java").package("p").class(
            ClassDecl::class("A")
                .field(VarDecl::new("x", "int"))
                .field(
                    VarDecl::new("y", "int")
                        .modifiers(modifier_flags::STATIC)
                        .init(Expr::name("x")),
                ),
        ),
    ]);
    complete_all(&mut enter, &["p.A"]);
    assert_eq!(
        enter.diagnostics().count_code(diagnostic_codes::NON_STATIC_REFERENCE),
        1
    );
}

#[test]
fn test_instance_field_from_static_method() {
    let mut enter = enter_units(vec![
        SourceUnit::new("p/A.java").package("p").class(
            ClassDecl::class("A")
                .field(VarDecl::new("x", "int"))
                .method(
                    MethodDecl::new("m", "void")
                        .modifiers(modifier_flags::STATIC)
                        .stmt(Stmt::Expr(Expr::name("x"))),
                )
                .method(MethodDecl::new("n", "void").stmt(Stmt::Expr(Expr::name("x")))),
        ),
    ]);
    complete_all(&mut enter, &["p.A"]);
    assert_eq!(
        enter.diagnostics().count_code(diagnostic_codes::NON_STATIC_REFERENCE),
        1
    );
}

#[test]
fn test_instance_field_in_explicit_constructor_call() {
    let mut enter = enter_units(vec![
        SourceUnit::new("p/A.java").package("p").class(
            ClassDecl::class("A")
                .field(VarDecl::new("x", "int"))
                .field(VarDecl::new("K", "int").modifiers(modifier_flags::STATIC))
                .method(MethodDecl::constructor("A").stmt(Stmt::Expr(Expr::self_call(
                    SelfCallTarget::This,
                    vec![Expr::name("x"), Expr::name("K")],
                )))),
        ),
    ]);
    complete_all(&mut enter, &["p.A"]);
    assert_eq!(
        enter.diagnostics().count_code(diagnostic_codes::REFERENCE_BEFORE_SUPER_CALL),
        1
    );
}

#[test]
fn test_local_variable_clashing_with_parameter() {
    let mut enter = enter_units(vec![
        SourceUnit::new("p/A.java").package("p").class(
            ClassDecl::class("A").method(
                MethodDecl::new("m", "void")
                    .param(VarDecl::new("a", "int"))
                    .local_var(VarDecl::new("a", "long")),
            ),
        ),
    ]);
    complete_all(&mut enter, &["p.A"]);
    let dups: Vec<_> = enter
        .diagnostics()
        .with_code(diagnostic_codes::ALREADY_DEFINED_IN_METHOD)
        .collect();
    assert_eq!(dups.len(), 1);
    assert!(dups[0].message.contains("'m'"), "{}", dups[0].message);
}

#[test]
fn test_unknown_names_in_members() {
    let mut enter = enter_units(vec![
        SourceUnit::new("p/A.java").package("p").class(
            ClassDecl::class("A")
                .field(VarDecl::new("f", "Nope"))
                .field(VarDecl::new("g", "int").init(Expr::name("missing")))
                .method(MethodDecl::new("m", "void").stmt(Stmt::Expr(Expr::new_object("Gone")))),
        ),
    ]);
    complete_all(&mut enter, &["p.A"]);
    assert_eq!(enter.diagnostics().count_code(diagnostic_codes::CANNOT_FIND_SYMBOL), 3);
    let dump = enter.dump();
    let f = dump.class("p.A").and_then(|a| a.member("f")).expect("field");
    assert_eq!(f.ty.as_deref(), Some("<error>"));
}

#[test]
fn test_statically_imported_field_resolves_in_initializer() {
    let mut enter = enter_units(vec![
        SourceUnit::new("p/A.java")
            .package("p")
            .import_static("java.lang.Math.PI")
            .class(ClassDecl::class("A").field(VarDecl::new("d", "double").init(Expr::name("PI")))),
    ]);
    complete_all(&mut enter, &["p.A"]);
    assert!(codes(&enter).is_empty(), "{:?}", enter.diagnostics());
}

#[test]
fn test_completing_members_twice_is_stable() {
    let mut enter = enter_units(vec![
        SourceUnit::new("p/A.java").package("p").class(
            ClassDecl::class("A").field(VarDecl::new("x", "int").init(Expr::name("missing"))),
        ),
    ]);
    complete_all(&mut enter, &["p.A", "p.A"]);
    assert_eq!(enter.diagnostics().count_code(diagnostic_codes::CANNOT_FIND_SYMBOL), 1);
}
