//! Source file classification by extension.

use ohm_common::strip_extension;

/// The kind of source a module was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Plain JavaScript (`.js`, `.mjs`, `.cjs`).
    Script,
    /// TypeScript (`.ts`).
    TypedScript,
    /// Declarative UI script (`.ets`).
    DeclarativeScript,
    /// Structured configuration (`.json`).
    Json,
}

/// Why a file in the list is left out of the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A virtual module produced by an upstream transform.
    Virtual,
    /// A type declaration file.
    Declaration,
    /// An extension the compiler does not accept.
    Unsupported,
}

/// Classifies `path` and returns its kind and the extension of its staged
/// copy, including the leading dot.
///
/// Typed sources are staged as `.ts` when the compiler consumes them
/// directly and as `.js` otherwise.
pub fn classify(path: &str, emit_typescript: bool) -> Result<(SourceKind, &'static str), SkipReason> {
    if path.starts_with('\0') {
        return Err(SkipReason::Virtual);
    }
    let stem = strip_extension(path);
    if stem.len() == path.len() {
        return Err(SkipReason::Unsupported);
    }
    let typed_ext = if emit_typescript { ".ts" } else { ".js" };
    match &path[stem.len()..] {
        ".ets" | ".ts" if stem.ends_with(".d") => Err(SkipReason::Declaration),
        ".ets" => Ok((SourceKind::DeclarativeScript, typed_ext)),
        ".ts" => Ok((SourceKind::TypedScript, typed_ext)),
        ".js" | ".mjs" | ".cjs" => Ok((SourceKind::Script, ".js")),
        ".json" => Ok((SourceKind::Json, ".json")),
        _ => Err(SkipReason::Unsupported),
    }
}
