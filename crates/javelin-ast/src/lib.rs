//! Parsed source forest consumed by the entry phase.
//!
//! The parser is an external collaborator; this crate fixes the shape of the
//! trees it hands over: source units with a package clause, imports and
//! top-level class declarations, each node carrying a `Span` for
//! diagnostics. Declarations are shared through `Arc` so environments and
//! completers can hold on to the tree they were created for.
//!
//! Trees can be built programmatically with the builder methods on each node,
//! or deserialized from JSON.

pub mod nodes;
pub use nodes::*;

/// Declaration modifier bits as written in source.
///
/// The low bits line up with the symbol flags of the entry phase so that
/// checked modifiers can be copied onto symbols unchanged.
pub mod modifier_flags {
    pub const NONE: u32 = 0;
    pub const PUBLIC: u32 = 1 << 0;
    pub const PRIVATE: u32 = 1 << 1;
    pub const PROTECTED: u32 = 1 << 2;
    pub const STATIC: u32 = 1 << 3;
    pub const FINAL: u32 = 1 << 4;
    pub const ABSTRACT: u32 = 1 << 5;
    /// Visible only inside the declaring script/unit's package, never exported.
    pub const SCRIPT_PRIVATE: u32 = 1 << 6;
    /// `@Deprecated`
    pub const DEPRECATED: u32 = 1 << 7;

    pub const ACCESS: u32 = PUBLIC | PRIVATE | PROTECTED;
    pub const ALL: u32 =
        PUBLIC | PRIVATE | PROTECTED | STATIC | FINAL | ABSTRACT | SCRIPT_PRIVATE | DEPRECATED;

    /// Source spelling of a single modifier bit.
    pub fn name(flag: u32) -> &'static str {
        match flag {
            PUBLIC => "public",
            PRIVATE => "private",
            PROTECTED => "protected",
            STATIC => "static",
            FINAL => "final",
            ABSTRACT => "abstract",
            SCRIPT_PRIVATE => "scriptprivate",
            DEPRECATED => "@Deprecated",
            _ => "<unknown>",
        }
    }

    /// Inverse of [`name`] for the keyword modifiers.
    pub fn from_name(name: &str) -> Option<u32> {
        Some(match name {
            "public" => PUBLIC,
            "private" => PRIVATE,
            "protected" => PROTECTED,
            "static" => STATIC,
            "final" => FINAL,
            "abstract" => ABSTRACT,
            "scriptprivate" => SCRIPT_PRIVATE,
            "deprecated" | "@Deprecated" => DEPRECATED,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_flags() {
        assert_eq!(modifier_flags::NONE, 0);
        assert_eq!(modifier_flags::PUBLIC, 1);
        assert_eq!(modifier_flags::STATIC, 8);
        assert_eq!(modifier_flags::name(modifier_flags::ABSTRACT), "abstract");
        assert_eq!(modifier_flags::ALL.count_ones(), 8);
        assert_eq!(modifier_flags::from_name("static"), Some(modifier_flags::STATIC));
        assert_eq!(modifier_flags::from_name("volatile"), None);
    }

    #[test]
    fn test_identifier_rules() {
        assert!(is_identifier("Foo"));
        assert!(is_identifier("_x1"));
        assert!(is_identifier("$inner"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier("a-b"));
    }
}
