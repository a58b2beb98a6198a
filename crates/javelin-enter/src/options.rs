//! Entry configuration.

use bitflags::bitflags;

bitflags! {
    /// Lint categories that can be enabled globally and suppressed per
    /// declaration.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Lint: u32 {
        const DEPRECATION = 1 << 0;
        const CAST = 1 << 1;
        const SERIAL = 1 << 2;
        const STATIC = 1 << 3;
    }
}

impl Lint {
    /// Category named in `@SuppressWarnings`, e.g. `"deprecation"`.
    pub fn from_lint_name(name: &str) -> Option<Lint> {
        Some(match name {
            "deprecation" => Lint::DEPRECATION,
            "cast" => Lint::CAST,
            "serial" => Lint::SERIAL,
            "static" => Lint::STATIC,
            "all" => Lint::all(),
            _ => return None,
        })
    }

    /// This set minus every category named in `names`. Unknown names are ignored.
    pub fn suppress<S: AsRef<str>>(self, names: &[S]) -> Lint {
        names
            .iter()
            .filter_map(|n| Lint::from_lint_name(n.as_ref()))
            .fold(self, |lint, off| lint - off)
    }
}

impl Default for Lint {
    fn default() -> Self {
        Lint::DEPRECATION
    }
}

/// Configuration for an entry run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnterOptions {
    /// Package imported on demand into every unit.
    pub root_package: String,
    /// Root of the class hierarchy; the only class with no superclass.
    pub object_class: String,
    /// Default superclass of enums, when the class path provides it.
    pub enum_class: String,
    pub comparable_interface: String,
    pub serializable_interface: String,
    /// Parameter type of the synthetic `valueOf` on enums.
    pub string_class: String,
    /// Lint categories enabled unless suppressed.
    pub lint: Lint,
    /// Source file extension used for the public-class file name check.
    pub source_extension: String,
}

impl Default for EnterOptions {
    fn default() -> Self {
        EnterOptions {
            root_package: "java.lang".to_string(),
            object_class: "java.lang.Object".to_string(),
            enum_class: "java.lang.Enum".to_string(),
            comparable_interface: "java.lang.Comparable".to_string(),
            serializable_interface: "java.io.Serializable".to_string(),
            string_class: "java.lang.String".to_string(),
            lint: Lint::default(),
            source_extension: ".java".to_string(),
        }
    }
}
