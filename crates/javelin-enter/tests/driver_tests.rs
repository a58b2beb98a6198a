//! Driver passes, source-path completion, the annotation queue and the
//! attribution seam.

mod support;

use javelin_ast::{ClassDecl, MethodDecl, QualifiedName, SourceUnit, TypeExpr, VarDecl, modifier_flags};
use javelin_common::diagnostic_codes;
use javelin_enter::{
    Attr, Attribution, ClassPath, ClassState, CompletionFailure, Enter, EnterResult, Env,
    FatalError, SymbolId, Type, UnitId, symbol_flags,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use support::{class, codes, enter_units, enter_with, supertype_of};

fn source_path() -> ClassPath {
    let mut class_path = ClassPath::with_bootstrap();
    class_path.add_source(
        SourceUnit::new("q/Helper.java")
            .package("q")
            .class(ClassDecl::class("Helper").modifiers(modifier_flags::PUBLIC))
            .into_arc(),
    );
    class_path.add_source(
        SourceUnit::new("q/Pair.java")
            .package("q")
            .class(ClassDecl::class("Pair").modifiers(modifier_flags::PUBLIC))
            .class(ClassDecl::class("Extra"))
            .into_arc(),
    );
    class_path
}

#[test]
fn test_source_path_class_entered_on_demand() {
    let enter = enter_with(
        source_path(),
        vec![
            SourceUnit::new("p/A.java")
                .package("p")
                .class(ClassDecl::class("A").extends("q.Helper")),
        ],
    );
    assert!(codes(&enter).is_empty(), "{:?}", enter.diagnostics());
    assert_eq!(supertype_of(&enter, "p.A").as_deref(), Some("q.Helper"));

    let helper = class(&enter, "q.Helper");
    assert!(enter.symtab().has_flag(helper, symbol_flags::FROM_SOURCE));
    let state = enter.symtab().class_info(helper).map(|i| i.state);
    assert_eq!(state, Some(ClassState::MembersFinished));
    assert!(enter.unit_by_file("q/Helper.java").is_some());
    // Units that were never needed stay unparsed.
    assert!(enter.unit_by_file("q/Pair.java").is_none());
}

#[test]
fn test_other_classes_of_a_source_path_unit_complete_in_the_outer_pass() {
    let enter = enter_with(
        source_path(),
        vec![
            SourceUnit::new("p/A.java")
                .package("p")
                .class(ClassDecl::class("A").extends("q.Pair")),
        ],
    );
    assert!(codes(&enter).is_empty(), "{:?}", enter.diagnostics());
    let extra = class(&enter, "q.Extra");
    let state = enter.symtab().class_info(extra).map(|i| i.state);
    assert_eq!(state, Some(ClassState::MembersFinished));
    assert!(enter.symtab().symbols[extra].is_complete());
}

#[test]
fn test_source_path_class_completed_outside_a_driver() {
    let mut enter = Enter::new(Rc::new(source_path()));
    let pair = enter.load_class("q.Pair").expect("known to the class path");
    enter.complete(pair).expect("completion");

    assert!(enter.symtab().has_flag(pair, symbol_flags::FROM_SOURCE));
    let extra = class(&enter, "q.Extra");
    assert!(enter.symtab().symbols[extra].is_complete());
}

#[test]
fn test_todo_lists_top_level_classes_in_completion_order() {
    let enter = enter_units(vec![
        SourceUnit::new("p/A.java")
            .package("p")
            .class(ClassDecl::class("A").extends("B").nested(ClassDecl::class("Inner")))
            .class(ClassDecl::class("B")),
    ]);
    let todo: Vec<SymbolId> = enter.todo().iter().map(|env| env.enclosing_class).collect();
    assert_eq!(todo, vec![class(&enter, "p.A"), class(&enter, "p.B")]);
}

#[test]
fn test_import_resolution_does_not_complete_source_classes() {
    let enter = enter_units(vec![
        SourceUnit::new("p/A.java")
            .package("p")
            .import("q.Outer.Inner")
            .class(ClassDecl::class("A")),
        SourceUnit::new("q/Outer.java").package("q").class(
            ClassDecl::class("Outer")
                .modifiers(modifier_flags::PUBLIC)
                .nested(ClassDecl::class("Inner").modifiers(modifier_flags::PUBLIC | modifier_flags::STATIC)),
        ),
    ]);
    assert!(codes(&enter).is_empty(), "{:?}", enter.diagnostics());
    // `Outer` is completed by the driver after `A`, not while `A`'s imports
    // are resolved.
    let todo: Vec<SymbolId> = enter.todo().iter().map(|env| env.enclosing_class).collect();
    assert_eq!(todo, vec![class(&enter, "p.A"), class(&enter, "q.Outer")]);

    let outer = class(&enter, "q.Outer");
    let state = enter.symtab().class_info(outer).map(|i| i.state);
    assert_eq!(state, Some(ClassState::MembersFinished));
    let unit = enter.unit(UnitId(0)).expect("unit entered");
    assert_eq!(
        enter.symtab().scopes.lookup(unit.named_import_scope, "Inner"),
        &[class(&enter, "q.Outer$Inner")]
    );
}

#[test]
fn test_wildcard_import_of_source_class_completes_it() {
    let enter = enter_units(vec![
        SourceUnit::new("p/A.java")
            .package("p")
            .import("q.Outer.*")
            .class(ClassDecl::class("A").extends("Inner")),
        SourceUnit::new("q/Outer.java").package("q").class(
            ClassDecl::class("Outer")
                .modifiers(modifier_flags::PUBLIC)
                .nested(ClassDecl::class("Inner").modifiers(modifier_flags::PUBLIC | modifier_flags::STATIC)),
        ),
    ]);
    assert!(codes(&enter).is_empty(), "{:?}", enter.diagnostics());
    assert_eq!(supertype_of(&enter, "p.A").as_deref(), Some("q.Outer.Inner"));
}

#[test]
fn test_type_env_only_for_source_classes() {
    let enter = enter_units(vec![
        SourceUnit::new("p/A.java").package("p").class(ClassDecl::class("A")),
    ]);
    let a = class(&enter, "p.A");
    let env = enter.type_env(a).expect("source class has an environment");
    assert_eq!(env.enclosing_class, a);
    assert!(enter.type_env(class(&enter, "java.lang.Object")).is_none());
}

#[test]
fn test_complete_is_idempotent() {
    let mut enter = enter_units(vec![
        SourceUnit::new("p/A.java").package("p").class(ClassDecl::class("A")),
    ]);
    let a = class(&enter, "p.A");
    let before = enter.dump();
    enter.complete(a).expect("no-op");
    enter.complete(a).expect("no-op");
    assert_eq!(enter.dump(), before);
}

#[test]
fn test_dump_serializes() {
    let enter = enter_units(vec![
        SourceUnit::new("p/A.java")
            .package("p")
            .class(ClassDecl::class("A").extends("A")),
    ]);
    let json = serde_json::to_value(enter.dump()).expect("serializable");
    assert_eq!(json["classes"][0]["flatname"], "p.A");
    assert_eq!(json["classes"][0]["supertype"], serde_json::Value::Null);
    assert_eq!(json["diagnostics"][0]["code"], diagnostic_codes::CYCLIC_INHERITANCE);
    assert!(json["packages"].as_array().is_some_and(|p| p.iter().any(|n| n == "p")));
}

#[test]
fn test_annotation_queue_order_and_blocking() {
    let mut enter = Enter::new(Rc::new(ClassPath::with_bootstrap()));
    let seen = Rc::new(RefCell::new(Vec::new()));
    for i in 0..3 {
        let seen = Rc::clone(&seen);
        enter.annotate().later(move |_| {
            seen.borrow_mut().push(i);
            Ok(())
        });
    }

    enter.annotate().block();
    enter.flush_annotations().expect("flush");
    assert!(seen.borrow().is_empty());

    enter.annotate().unblock();
    enter.flush_annotations().expect("flush");
    assert_eq!(*seen.borrow(), vec![0, 1, 2]);
    assert!(enter.annotate().is_empty());
}

#[test]
fn test_annotation_failures() {
    let mut enter = Enter::new(Rc::new(ClassPath::with_bootstrap()));
    enter.annotate().later(|_| {
        Err(CompletionFailure::new(SymbolId::NONE, "p.Gone", "class file not found").into())
    });
    enter.flush_annotations().expect("completion failures are reported");
    assert_eq!(enter.diagnostics().count_code(diagnostic_codes::CANNOT_ACCESS), 1);

    enter.annotate().later(|_| Err(FatalError::new("out of memory").into()));
    assert!(enter.flush_annotations().is_err());
}

/// Counts the field and method completers that reach attribution.
#[derive(Default)]
struct Counting {
    fields: Cell<usize>,
    methods: Cell<usize>,
}

impl Attribution for Counting {
    fn attrib_type(&self, enter: &mut Enter, tree: &TypeExpr, env: &Rc<Env>) -> EnterResult<Type> {
        Attr.attrib_type(enter, tree, env)
    }

    fn attrib_package_or_type(
        &self,
        enter: &mut Enter,
        name: &QualifiedName,
        env: &Rc<Env>,
    ) -> EnterResult<Type> {
        Attr.attrib_package_or_type(enter, name, env)
    }

    fn finish_field(
        &self,
        enter: &mut Enter,
        field: SymbolId,
        tree: &Arc<VarDecl>,
        env: &Rc<Env>,
    ) -> EnterResult<Type> {
        self.fields.set(self.fields.get() + 1);
        Attr.finish_field(enter, field, tree, env)
    }

    fn finish_method(
        &self,
        enter: &mut Enter,
        method: SymbolId,
        tree: &Arc<MethodDecl>,
        env: &Rc<Env>,
    ) -> EnterResult<Type> {
        self.methods.set(self.methods.get() + 1);
        Attr.finish_method(enter, method, tree, env)
    }
}

#[test]
fn test_custom_attribution_runs_each_completer_once() {
    let counting = Rc::new(Counting::default());
    let mut enter = Enter::new(Rc::new(ClassPath::with_bootstrap()))
        .with_attribution(Rc::clone(&counting) as Rc<dyn Attribution>);
    let unit = SourceUnit::new("p/A.java")
        .package("p")
        .class(
            ClassDecl::class("A")
                .field(VarDecl::new("x", "int"))
                .field(VarDecl::new("y", "int"))
                .method(MethodDecl::new("m", "void").param(VarDecl::new("a", "int"))),
        )
        .into_arc();
    enter.enter_all(&[unit]).expect("entry");
    assert_eq!((counting.fields.get(), counting.methods.get()), (0, 0));

    let a = class(&enter, "p.A");
    enter.complete_members(a).expect("members");
    enter.complete_members(a).expect("members");
    // Two fields plus one parameter.
    assert_eq!(counting.fields.get(), 3);
    assert_eq!(counting.methods.get(), 1);
}
