//! DepViz Infer — heuristic call-edge inference from function snippets

pub mod calls;
pub mod imports;
pub mod resolver;


pub use calls::{call_sites, strip_strings_and_comments};
pub use imports::{ImportLang, ImportSpec, import_targets, normalize_posix, resolve_import_label, scan_imports};
pub use resolver::{apply_inferred_edges, infer_call_edges};
