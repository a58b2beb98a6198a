//! Centralized limits and thresholds for the entry phase.
//!
//! Entry is recursion-driven: resolving a supertype may complete another
//! class, which resolves its own supertypes, and so on. Cycles are detected
//! and severed, so these limits only guard walks over data that may still
//! be malformed while error recovery is in progress.

/// Maximum number of environments visited when walking an environment chain
/// outwards during name lookup.
///
/// Lexical nesting is bounded by the source, so hitting this means a chain
/// was built incorrectly; lookup stops instead of spinning.
pub const MAX_ENV_WALK: usize = 10_000;

/// Maximum number of classes visited while walking a supertype graph
/// (member type lookup, static import collection).
///
/// The walks keep a visited set, so this only bounds pathological class
/// paths with very deep hierarchies.
pub const MAX_SUPERTYPE_WALK: usize = 100_000;

/// Maximum number of attempts when synthesizing a unique flat name for a
/// local class (`Outer$1Local`, `Outer$2Local`, ...).
pub const MAX_LOCAL_CLASS_INDEX: u32 = 1_000_000;
