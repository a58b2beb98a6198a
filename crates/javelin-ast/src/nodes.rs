//! Tree node definitions and builder helpers.

use javelin_common::Span;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Whether `text` is a legal simple identifier.
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

// =============================================================================
// Names
// =============================================================================

/// A dotted name such as `java.util.List`.
///
/// Serialized as its dotted text; spans are not round-tripped.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct QualifiedName {
    pub segments: Vec<String>,
    pub span: Span,
}

impl QualifiedName {
    pub fn parse(text: &str) -> Self {
        QualifiedName {
            segments: text.split('.').map(str::to_string).collect(),
            span: Span::DUMMY,
        }
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Last segment, or `""` for an empty name.
    pub fn simple(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    /// Everything but the last segment, if there is more than one segment.
    pub fn qualifier(&self) -> Option<QualifiedName> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(QualifiedName {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
            span: self.span,
        })
    }

    /// Prefixes of this name, shortest first (`a`, `a.b`, `a.b.c`).
    pub fn prefixes(&self) -> impl Iterator<Item = String> + '_ {
        (1..=self.segments.len()).map(|n| self.segments[..n].join("."))
    }

    /// A name is well formed when it has at least one segment and every
    /// segment is an identifier.
    pub fn is_well_formed(&self) -> bool {
        !self.segments.is_empty() && self.segments.iter().all(|s| is_identifier(s))
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl From<String> for QualifiedName {
    fn from(text: String) -> Self {
        QualifiedName::parse(&text)
    }
}

impl From<QualifiedName> for String {
    fn from(name: QualifiedName) -> Self {
        name.to_string()
    }
}

// =============================================================================
// Types and expressions
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Void,
}

impl PrimitiveKind {
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::Void => "void",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "boolean" => PrimitiveKind::Boolean,
            "byte" => PrimitiveKind::Byte,
            "char" => PrimitiveKind::Char,
            "short" => PrimitiveKind::Short,
            "int" => PrimitiveKind::Int,
            "long" => PrimitiveKind::Long,
            "float" => PrimitiveKind::Float,
            "double" => PrimitiveKind::Double,
            "void" => PrimitiveKind::Void,
            _ => return None,
        })
    }
}

/// A type as written in source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeExpr {
    Primitive {
        name: PrimitiveKind,
        #[serde(default)]
        span: Span,
    },
    Named {
        name: QualifiedName,
    },
    Array {
        element: Box<TypeExpr>,
        #[serde(default)]
        span: Span,
    },
}

impl TypeExpr {
    /// `int`, `boolean`, ... or a (possibly qualified) class name.
    pub fn named(text: &str) -> Self {
        match PrimitiveKind::from_name(text) {
            Some(kind) => TypeExpr::Primitive {
                name: kind,
                span: Span::DUMMY,
            },
            None => TypeExpr::Named {
                name: QualifiedName::parse(text),
            },
        }
    }

    pub fn array(element: TypeExpr) -> Self {
        TypeExpr::Array {
            element: Box::new(element),
            span: Span::DUMMY,
        }
    }

    pub fn at(self, span: Span) -> Self {
        match self {
            TypeExpr::Primitive { name, .. } => TypeExpr::Primitive { name, span },
            TypeExpr::Named { name } => TypeExpr::Named {
                name: name.at(span),
            },
            TypeExpr::Array { element, .. } => TypeExpr::Array { element, span },
        }
    }

    pub fn span(&self) -> Span {
        match self {
            TypeExpr::Primitive { span, .. } | TypeExpr::Array { span, .. } => *span,
            TypeExpr::Named { name } => name.span,
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Primitive { name, .. } => write!(f, "{}", name.name()),
            TypeExpr::Named { name } => write!(f, "{name}"),
            TypeExpr::Array { element, .. } => write!(f, "{element}[]"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfCallTarget {
    This,
    Super,
}

/// The slice of expression syntax the entry phase cares about: anything
/// that can name a type or a member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expr {
    Literal {
        #[serde(default)]
        span: Span,
    },
    /// A simple or qualified name (`x`, `Y.CONST`, `this`).
    Name { name: QualifiedName },
    /// `new T()`
    New {
        ty: TypeExpr,
        #[serde(default)]
        span: Span,
    },
    /// Explicit constructor invocation `this(...)` / `super(...)`.
    SelfCall {
        target: SelfCallTarget,
        #[serde(default)]
        args: Vec<Expr>,
        #[serde(default)]
        span: Span,
    },
}

impl Expr {
    pub fn literal() -> Self {
        Expr::Literal { span: Span::DUMMY }
    }

    pub fn name(text: &str) -> Self {
        Expr::Name {
            name: QualifiedName::parse(text),
        }
    }

    pub fn new_object(ty: &str) -> Self {
        Expr::New {
            ty: TypeExpr::named(ty),
            span: Span::DUMMY,
        }
    }

    pub fn self_call(target: SelfCallTarget, args: Vec<Expr>) -> Self {
        Expr::SelfCall {
            target,
            args,
            span: Span::DUMMY,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Expr::Literal { span } | Expr::New { span, .. } | Expr::SelfCall { span, .. } => *span,
            Expr::Name { name } => name.span,
        }
    }
}

// =============================================================================
// Declarations
// =============================================================================

/// A field, parameter, or local variable declaration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarDecl {
    pub name: String,
    #[serde(default)]
    pub modifiers: u32,
    pub ty: TypeExpr,
    #[serde(default)]
    pub init: Option<Expr>,
    #[serde(default)]
    pub span: Span,
}

impl VarDecl {
    pub fn new(name: &str, ty: &str) -> Self {
        VarDecl {
            name: name.to_string(),
            modifiers: 0,
            ty: TypeExpr::named(ty),
            init: None,
            span: Span::DUMMY,
        }
    }

    pub fn modifiers(mut self, flags: u32) -> Self {
        self.modifiers = flags;
        self
    }

    pub fn init(mut self, expr: Expr) -> Self {
        self.init = Some(expr);
        self
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stmt", rename_all = "snake_case")]
pub enum Stmt {
    LocalVar(Arc<VarDecl>),
    LocalClass(Arc<ClassDecl>),
    Expr(Expr),
}

/// A method or constructor declaration.
///
/// `name` is `None` for trees produced by parser error recovery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDecl {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub modifiers: u32,
    #[serde(default)]
    pub params: Vec<Arc<VarDecl>>,
    /// `None` for constructors.
    #[serde(default)]
    pub return_type: Option<TypeExpr>,
    #[serde(default)]
    pub is_constructor: bool,
    #[serde(default)]
    pub body: Vec<Stmt>,
    #[serde(default)]
    pub span: Span,
}

impl MethodDecl {
    pub fn new(name: &str, return_type: &str) -> Self {
        MethodDecl {
            name: Some(name.to_string()),
            modifiers: 0,
            params: Vec::new(),
            return_type: Some(TypeExpr::named(return_type)),
            is_constructor: false,
            body: Vec::new(),
            span: Span::DUMMY,
        }
    }

    pub fn constructor(class_name: &str) -> Self {
        MethodDecl {
            name: Some(class_name.to_string()),
            modifiers: 0,
            params: Vec::new(),
            return_type: None,
            is_constructor: true,
            body: Vec::new(),
            span: Span::DUMMY,
        }
    }

    /// A method whose name was lost to parser error recovery.
    pub fn malformed() -> Self {
        MethodDecl {
            name: None,
            modifiers: 0,
            params: Vec::new(),
            return_type: None,
            is_constructor: false,
            body: Vec::new(),
            span: Span::DUMMY,
        }
    }

    pub fn modifiers(mut self, flags: u32) -> Self {
        self.modifiers = flags;
        self
    }

    pub fn param(mut self, param: VarDecl) -> Self {
        self.params.push(Arc::new(param));
        self
    }

    pub fn stmt(mut self, stmt: Stmt) -> Self {
        self.body.push(stmt);
        self
    }

    pub fn local_var(self, var: VarDecl) -> Self {
        self.stmt(Stmt::LocalVar(Arc::new(var)))
    }

    pub fn local_class(self, class: ClassDecl) -> Self {
        self.stmt(Stmt::LocalClass(Arc::new(class)))
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
    Enum,
    /// Interface-like supertype that contributes behaviour without being the
    /// primary superclass.
    Mixin,
    Annotation,
}

impl ClassKind {
    pub fn is_interface_like(self) -> bool {
        matches!(self, ClassKind::Interface | ClassKind::Annotation)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "member", rename_all = "snake_case")]
pub enum Member {
    Field(Arc<VarDecl>),
    Method(Arc<MethodDecl>),
    Class(Arc<ClassDecl>),
}

/// A class, interface, enum, mixin, or annotation declaration.
///
/// `supertypes` lists every declared supertype in source order; the entry
/// phase sorts them into superclass, interfaces and mixins by what they
/// resolve to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    #[serde(default)]
    pub kind: ClassKind,
    #[serde(default)]
    pub modifiers: u32,
    #[serde(default)]
    pub supertypes: Vec<TypeExpr>,
    #[serde(default)]
    pub members: Vec<Member>,
    /// Lint categories suppressed for this declaration (`@SuppressWarnings`).
    #[serde(default)]
    pub suppress_warnings: Vec<String>,
    #[serde(default)]
    pub span: Span,
}

impl ClassDecl {
    pub fn new(name: &str, kind: ClassKind) -> Self {
        ClassDecl {
            name: name.to_string(),
            kind,
            modifiers: 0,
            supertypes: Vec::new(),
            members: Vec::new(),
            suppress_warnings: Vec::new(),
            span: Span::DUMMY,
        }
    }

    pub fn class(name: &str) -> Self {
        Self::new(name, ClassKind::Class)
    }

    pub fn interface(name: &str) -> Self {
        Self::new(name, ClassKind::Interface)
    }

    pub fn enumeration(name: &str) -> Self {
        Self::new(name, ClassKind::Enum)
    }

    pub fn mixin(name: &str) -> Self {
        Self::new(name, ClassKind::Mixin)
    }

    pub fn modifiers(mut self, flags: u32) -> Self {
        self.modifiers = flags;
        self
    }

    /// Add a declared supertype (`extends`/`implements`/`with`).
    pub fn extends(mut self, name: &str) -> Self {
        self.supertypes.push(TypeExpr::named(name));
        self
    }

    pub fn extends_at(mut self, name: &str, span: Span) -> Self {
        self.supertypes.push(TypeExpr::named(name).at(span));
        self
    }

    pub fn field(mut self, field: VarDecl) -> Self {
        self.members.push(Member::Field(Arc::new(field)));
        self
    }

    pub fn method(mut self, method: MethodDecl) -> Self {
        self.members.push(Member::Method(Arc::new(method)));
        self
    }

    pub fn nested(mut self, class: ClassDecl) -> Self {
        self.members.push(Member::Class(Arc::new(class)));
        self
    }

    pub fn suppress(mut self, lint: &str) -> Self {
        self.suppress_warnings.push(lint.to_string());
        self
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn has_constructor(&self) -> bool {
        self.members
            .iter()
            .any(|m| matches!(m, Member::Method(method) if method.is_constructor))
    }

    pub fn member_classes(&self) -> impl Iterator<Item = &Arc<ClassDecl>> {
        self.members.iter().filter_map(|m| match m {
            Member::Class(class) => Some(class),
            _ => None,
        })
    }
}

/// `import a.b.C;`, `import a.b.*;`, `import static a.b.C.x;`, `import static a.b.C.*;`
///
/// For on-demand imports `name` holds the qualifier without the trailing `*`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDecl {
    pub name: QualifiedName,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_wildcard: bool,
    #[serde(default)]
    pub span: Span,
}

impl ImportDecl {
    /// Parse the text after `import`/`import static`, e.g. `a.b.*`.
    pub fn parse(text: &str, is_static: bool) -> Self {
        let (name, is_wildcard) = match text.strip_suffix(".*") {
            Some(qualifier) => (qualifier, true),
            None => (text, false),
        };
        ImportDecl {
            name: QualifiedName::parse(name),
            is_static,
            is_wildcard,
            span: Span::DUMMY,
        }
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self.name.span = span;
        self
    }
}

/// One parsed source file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUnit {
    pub file_name: String,
    #[serde(default)]
    pub package: Option<QualifiedName>,
    #[serde(default)]
    pub imports: Vec<ImportDecl>,
    #[serde(default)]
    pub types: Vec<Arc<ClassDecl>>,
    #[serde(default)]
    pub span: Span,
}

impl SourceUnit {
    pub fn new(file_name: &str) -> Self {
        SourceUnit {
            file_name: file_name.to_string(),
            package: None,
            imports: Vec::new(),
            types: Vec::new(),
            span: Span::DUMMY,
        }
    }

    pub fn package(mut self, name: &str) -> Self {
        self.package = Some(QualifiedName::parse(name));
        self
    }

    pub fn import(mut self, name: &str) -> Self {
        self.imports.push(ImportDecl::parse(name, false));
        self
    }

    pub fn import_static(mut self, name: &str) -> Self {
        self.imports.push(ImportDecl::parse(name, true));
        self
    }

    pub fn import_decl(mut self, import: ImportDecl) -> Self {
        self.imports.push(import);
        self
    }

    pub fn class(mut self, decl: ClassDecl) -> Self {
        self.types.push(Arc::new(decl));
        self
    }

    /// File name without directories or extension (`src/p/A.java` -> `A`).
    pub fn file_stem(&self) -> &str {
        let base = self
            .file_name
            .rsplit_once(['/', '\\'])
            .map_or(self.file_name.as_str(), |(_, base)| base);
        base.split_once('.').map_or(base, |(stem, _)| stem)
    }

    pub fn into_arc(self) -> Arc<SourceUnit> {
        Arc::new(self)
    }
}
