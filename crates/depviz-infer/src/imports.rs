//! Import statement scanning and specifier resolution

use depviz_core::NodeId;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static PY_IMPORT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?m)^(?:from\s+([\w\.]+)\s+import|import\s+([\w\.]+))").ok());

static JS_IMPORT: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^\s*(?:import\s+(?:[^'"\n]+)\s+from\s+['"]([^'"\n]+)['"]|import\s+['"]([^'"\n]+)['"]|const\s+[^=\n]+=\s*require\(\s*['"]([^'"\n]+)['"]\s*\)|require\(\s*['"]([^'"\n]+)['"]\s*\))"#,
    )
    .ok()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportLang {
    /// `from a.b import c`, `import a.b`
    Python,
    /// ES `import ... from '...'` and CommonJS `require('...')`
    Script,
}

/// A raw import specifier as written in source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    pub raw: String,
    pub lang: ImportLang,
}

/// Every import specifier in a module's source, both syntaxes.
pub fn scan_imports(source: &str) -> Vec<ImportSpec> {
    let mut specs = Vec::new();
    if let Some(re) = PY_IMPORT.as_ref() {
        for caps in re.captures_iter(source) {
            if let Some(m) = caps.get(1).or_else(|| caps.get(2)) {
                specs.push(ImportSpec {
                    raw: m.as_str().to_string(),
                    lang: ImportLang::Python,
                });
            }
        }
    }
    if let Some(re) = JS_IMPORT.as_ref() {
        for caps in re.captures_iter(source) {
            let found = (1..=4).find_map(|i| caps.get(i));
            if let Some(m) = found {
                specs.push(ImportSpec {
                    raw: m.as_str().to_string(),
                    lang: ImportLang::Script,
                });
            }
        }
    }
    specs
}

/// Collapse `.` and `..` segments and unify separators.
pub fn normalize_posix(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let mut out: Vec<&str> = Vec::new();
    for part in unified.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            p => out.push(p),
        }
    }
    out.join("/")
}

const SCRIPT_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".js", ".jsx"];

fn has_script_extension(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    SCRIPT_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Best-guess file label an import specifier refers to, relative to the
/// importing module's label. Bare package specifiers in scripts resolve to
/// nothing.
pub fn resolve_import_label(from_label: &str, spec: &str, lang: ImportLang) -> Option<String> {
    let from = from_label.replace('\\', "/");
    let base_dir = from.rfind('/').map(|i| &from[..i]).unwrap_or("");
    let relative = |p: &str| {
        if base_dir.is_empty() {
            normalize_posix(p)
        } else {
            normalize_posix(&format!("{}/{}", base_dir, p))
        }
    };

    match lang {
        ImportLang::Script => {
            if spec.starts_with('.') {
                let core = relative(spec);
                if has_script_extension(&core) {
                    Some(core)
                } else {
                    Some(format!("{}.ts", core))
                }
            } else if let Some(stripped) = spec.strip_prefix('/') {
                let core = normalize_posix(stripped.trim_start_matches('/'));
                if has_script_extension(&core) {
                    Some(core)
                } else {
                    Some(format!("{}.ts", core))
                }
            } else {
                None
            }
        }
        ImportLang::Python => {
            if spec.starts_with('.') {
                let dots = spec.chars().take_while(|&c| c == '.').count();
                let rest = &spec[dots..];
                let pops = dots.saturating_sub(1);
                let mut parts: Vec<&str> = if base_dir.is_empty() {
                    Vec::new()
                } else {
                    base_dir.split('/').collect()
                };
                parts.truncate(parts.len().saturating_sub(pops));
                let mut joined = parts.join("/");
                if !rest.is_empty() {
                    joined.push('/');
                    joined.push_str(&rest.replace('.', "/"));
                }
                Some(format!("{}.py", normalize_posix(&joined)))
            } else {
                Some(format!("{}.py", normalize_posix(&spec.replace('.', "/"))))
            }
        }
    }
}

/// Module ids a module's source imports: the hash of each raw specifier
/// and of its resolved label. Callers filter to modules that exist.
pub fn import_targets(module_label: &str, source: &str) -> BTreeSet<NodeId> {
    let mut targets = BTreeSet::new();
    for spec in scan_imports(source) {
        targets.insert(NodeId::module(&spec.raw));
        if let Some(label) = resolve_import_label(module_label, &spec.raw, spec.lang) {
            targets.insert(NodeId::module(&label));
        }
    }
    targets
}
