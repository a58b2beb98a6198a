//! Serializable snapshot of the symbol table after entry.

use crate::state::Enter;
use crate::symbols::{ClassState, SymbolId, SymbolKind, Type, symbol_flags};
use crate::symtab::SymbolTable;
use javelin_common::Diagnostic;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MemberDump {
    pub name: String,
    pub kind: SymbolKind,
    pub flags: Vec<&'static str>,
    /// Rendered type; `null` when the member has not been attributed.
    pub ty: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClassDump {
    pub flatname: String,
    pub fullname: String,
    pub flags: Vec<&'static str>,
    pub state: ClassState,
    pub supertype: Option<String>,
    pub interfaces: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mixins: Vec<String>,
    pub members: Vec<MemberDump>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SymbolTableDump {
    /// Existing named packages, sorted.
    pub packages: Vec<String>,
    /// Classes entered from source, by flat name.
    pub classes: Vec<ClassDump>,
    pub diagnostics: Vec<Diagnostic>,
}

impl SymbolTableDump {
    pub fn class(&self, flatname: &str) -> Option<&ClassDump> {
        self.classes.iter().find(|c| c.flatname == flatname)
    }
}

impl ClassDump {
    pub fn member(&self, name: &str) -> Option<&MemberDump> {
        self.members.iter().find(|m| m.name == name)
    }
}

impl Enter {
    /// Snapshot of every source class and the diagnostics reported so far.
    pub fn dump(&self) -> SymbolTableDump {
        let symtab = self.symtab();
        let mut packages: Vec<String> = symtab
            .packages()
            .filter(|&(_, pkg)| symtab.has_flag(pkg, symbol_flags::EXISTS))
            .map(|(name, _)| name.to_string())
            .collect();
        packages.sort_unstable();

        let classes = symtab
            .compiled_classes()
            .into_iter()
            .map(|(_, c)| dump_class(symtab, c))
            .collect();

        SymbolTableDump {
            packages,
            classes,
            diagnostics: self.diagnostics().diagnostics().to_vec(),
        }
    }
}

fn dump_class(symtab: &SymbolTable, c: SymbolId) -> ClassDump {
    let symbol = &symtab.symbols[c];
    let render = |ty: &Type| symtab.type_to_string(ty);
    let (supertype, interfaces, mixins, state) = match symbol.class_info() {
        Some(info) => (
            (!info.supertype.is_none()).then(|| render(&info.supertype)),
            info.interfaces.iter().map(render).collect(),
            info.mixins.iter().map(render).collect(),
            info.state,
        ),
        None => (None, Vec::new(), Vec::new(), ClassState::Stub),
    };

    let members = symtab
        .scopes
        .symbols(symbol.members)
        .into_iter()
        .map(|(_, sym)| &symtab.symbols[sym])
        .filter(|m| matches!(m.kind, SymbolKind::Field | SymbolKind::Method))
        .map(|m| MemberDump {
            name: m.name.clone(),
            kind: m.kind,
            flags: symbol_flags::names(m.flags),
            ty: (!m.ty.is_none()).then(|| render(&m.ty)),
        })
        .collect();

    ClassDump {
        flatname: symbol.flatname().to_string(),
        fullname: symtab.fullname(c),
        flags: symbol_flags::names(symbol.flags),
        state,
        supertype,
        interfaces,
        mixins,
        members,
    }
}
