//! Layered configuration loading on top of the value model.
//!
//! A configuration document is ordinary lenient JSON plus two directives:
//!
//! - `import`: a path (or array of paths) naming other documents to load and
//!   deep-merge *underneath* the current one. Paths resolve relative to the
//!   importing file, imports resolve their own imports first, and when the
//!   loader has a variant name, a sibling `name_<variant>.ext` file is merged
//!   over each import that has one.
//! - `template`: inside any object, names a sibling key in the parent object
//!   whose value serves as a base; the referencing object is deep-merged over
//!   a copy of the base and the directive is stripped. Templates expand
//!   depth-first, so a base's own `template` resolves before it is used.
//!
//! Resolution is best-effort: a missing import, an import cycle, or an
//! unknown template key is reported, but everything that did resolve still
//! merges, and the partial result travels inside [`ConfigFailure`].
//!
//! Dotted `key=value` override strings (typically from a command line) are
//! applied with [`apply_settings`].

use crate::error::{ConfigFailure, Error, Result};
use crate::intern::StringTable;
use crate::read::{ReadOptions, Reader};
use crate::value::Value;
use crate::write::{Indent, Specials, WriteOptions};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

const TEMPLATE_KEY: &str = "template";
const IMPORT_KEY: &str = "import";
const JSON_EXTENSIONS: [&str; 3] = ["json", "jsn", "json5"];

// Guards against template reference cycles, which would otherwise recurse
// forever.
const MAX_TEMPLATE_DEPTH: usize = 64;

/// What a [`Loader::load_with_info`] call actually read.
#[derive(Debug, Clone, Default)]
pub struct LoadInfo {
    /// The main document, as given.
    pub main: PathBuf,
    /// Every import file that loaded successfully, including variant files.
    pub imports: BTreeSet<PathBuf>,
}

/// A configuration loader, optionally carrying a variant name and an
/// interning pool shared across all files of one load.
///
/// # Examples
///
/// ```rust,no_run
/// use valon::config::Loader;
///
/// let settings = Loader::new()
///     .variant("test")
///     .load(std::path::Path::new("settings.json"))?;
/// # Ok::<(), valon::ConfigFailure>(())
/// ```
#[derive(Debug, Default)]
pub struct Loader<'st> {
    variant: Option<String>,
    table: Option<&'st mut StringTable>,
    /// Files currently being resolved, outermost first. A file that is
    /// already on this stack importing again is a cycle.
    active: Vec<PathBuf>,
}

impl<'st> Loader<'st> {
    #[must_use]
    pub fn new() -> Self {
        Loader::default()
    }

    /// Sets the variant suffix: for each import `dir/name.ext`, a
    /// `dir/name_<variant>.ext` file is merged on top when it exists.
    #[must_use]
    pub fn variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }

    /// Shares an interning pool across every file read by this loader.
    #[must_use]
    pub fn table(mut self, table: &'st mut StringTable) -> Self {
        self.table = Some(table);
        self
    }

    /// Loads `path`, resolves its imports and templates, and returns the
    /// merged tree.
    pub fn load(&mut self, path: &Path) -> std::result::Result<Value, ConfigFailure> {
        self.load_with_info(path).map(|(value, _)| value)
    }

    /// Like [`Loader::load`], also reporting which files were read.
    pub fn load_with_info(
        &mut self,
        path: &Path,
    ) -> std::result::Result<(Value, LoadInfo), ConfigFailure> {
        let mut errors = Vec::new();
        let mut info = LoadInfo {
            main: path.to_path_buf(),
            imports: BTreeSet::new(),
        };

        self.active.clear();
        self.active.push(canonical(path));

        let (mut config, loaded) = self.read_config_file(path, &mut errors);

        if loaded {
            let base = path.parent().unwrap_or_else(|| Path::new(""));
            self.add_imports(base, &mut config, &mut errors, &mut info);
        }

        // Templates expand even over a partial tree.
        apply_templates(&mut config, &mut errors);

        if errors.is_empty() {
            Ok((config, info))
        } else {
            let context = format!("  in {}", path.display());
            if errors.last() != Some(&context) {
                errors.push(context);
            }
            Err(ConfigFailure {
                value: config,
                errors,
            })
        }
    }

    /// Reads and parses one file. On failure the partial tree is still
    /// returned, with `false`, and the diagnostics appended to `errors`.
    fn read_config_file(&mut self, path: &Path, errors: &mut Vec<String>) -> (Value, bool) {
        if !has_json_extension(path) {
            errors.push(format!("unsupported file format: {}", path.display()));
            return (Value::Null, false);
        }

        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                errors.push(format!("couldn't read {}: {}", path.display(), e));
                return (Value::Null, false);
            }
        };

        let mut reader = Reader::with_options(ReadOptions::default());
        if let Some(table) = self.table.as_deref_mut() {
            reader = reader.table(table);
        }

        match reader.read(&text) {
            Ok(value) => (value, true),
            Err(failure) => {
                for error in &failure.errors {
                    errors.push(error.to_string());
                }
                errors.push(format!("  in {}", path.display()));
                (failure.value, false)
            }
        }
    }

    /// Resolves `import` directives throughout `value`. Children first, so
    /// an import anywhere in the tree resolves against the same base
    /// directory; then this node's own directive.
    fn add_imports(
        &mut self,
        base: &Path,
        value: &mut Value,
        errors: &mut Vec<String>,
        info: &mut LoadInfo,
    ) -> bool {
        let mut success = true;

        if value.is_array() {
            for i in 0..value.num_elts() {
                if let Ok(child) = value.elt_mut(i) {
                    if !self.add_imports(base, child, errors, info) {
                        success = false;
                    }
                }
            }
            return success;
        }

        let Some(map) = value.as_object_mut() else {
            return success;
        };

        for i in 0..map.len() {
            if !self.add_imports(base, map.value_mut(i), errors, info) {
                success = false;
            }
        }

        let import_paths = match value.get(IMPORT_KEY) {
            None => return success,
            Some(paths) if paths.is_array() => paths.elts().to_vec(),
            Some(path) => vec![path.clone()],
        };

        let mut merged_imports = Value::Null;
        let mut any_loaded = false;

        for import_path in &import_paths {
            match self.load_import(import_path, base, errors, info) {
                Some(loaded) => {
                    merged_imports.merge(&loaded);
                    any_loaded = true;
                }
                // Keep going: the result is best-effort.
                None => success = false,
            }
        }

        if any_loaded {
            value.remove_member(IMPORT_KEY);
            // The document's own members override what it imports.
            value.swap(&mut merged_imports);
            value.merge(&merged_imports);
        }

        success
    }

    fn load_import(
        &mut self,
        import_path: &Value,
        base: &Path,
        errors: &mut Vec<String>,
        info: &mut LoadInfo,
    ) -> Option<Value> {
        let Some(relative) = import_path.str_value() else {
            errors.push(format!(
                "expected an import path, got {}",
                crate::write::to_string_with_options(import_path, &WriteOptions::single_line())
            ));
            return None;
        };

        let path = base.join(relative);
        let mut value = Value::Null;
        let mut found = false;
        let mut success = true;

        if path.is_file() {
            found = true;
            success = self.load_import_file(&path, &mut value, errors, info);
        }

        if let Some(variant_path) = self.variant.as_ref().and_then(|v| variant_path(&path, v)) {
            if variant_path.is_file() {
                found = true;
                let mut variant_value = Value::Null;
                success = self.load_import_file(&variant_path, &mut variant_value, errors, info);
                if success {
                    if value.is_null() {
                        value.swap(&mut variant_value);
                    } else {
                        value.merge(&variant_value);
                    }
                }
            }
        }

        if !found {
            errors.push(format!("couldn't find {}", path.display()));
            return None;
        }

        success.then_some(value)
    }

    fn load_import_file(
        &mut self,
        path: &Path,
        value: &mut Value,
        errors: &mut Vec<String>,
        info: &mut LoadInfo,
    ) -> bool {
        let resolved = canonical(path);
        if self.active.contains(&resolved) {
            errors.push(format!("import cycle at {}", path.display()));
            return false;
        }
        self.active.push(resolved);

        let (loaded, mut success) = self.read_config_file(path, errors);
        *value = loaded;

        if success {
            info.imports.insert(path.to_path_buf());
            let base = path.parent().unwrap_or_else(|| Path::new(""));
            success = self.add_imports(base, value, errors, info);
        }

        self.active.pop();
        if !success {
            errors.push(format!("  in {}", path.display()));
        }
        success
    }
}

/// Identity for the cycle check; symlinks and relative spellings of the same
/// file collapse to one path.
fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

fn has_json_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| JSON_EXTENSIONS.iter().any(|j| e.eq_ignore_ascii_case(j)))
}

/// `dir/name.ext` -> `dir/name_<variant>.ext`.
fn variant_path(path: &Path, variant: &str) -> Option<PathBuf> {
    let stem = path.file_stem()?.to_str()?;
    let mut name = format!("{}_{}", stem, variant);
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        name.push('.');
        name.push_str(ext);
    }
    Some(path.with_file_name(name))
}

// --- Templates -------------------------------------------------------------

fn apply_templates(value: &mut Value, errors: &mut Vec<String>) {
    // Expand at this level before recursing: expansion can hand children new
    // template directives referring to objects the base brought in.
    if let Some(map) = value.as_object_mut() {
        for i in 0..map.len() {
            if map.value(i).has_member(TEMPLATE_KEY) {
                expand_template_at(map, i, 0, errors);
            }
        }
    }

    if let Some(map) = value.as_object_mut() {
        for i in 0..map.len() {
            apply_templates(map.value_mut(i), errors);
        }
    } else if value.is_array() {
        for i in 0..value.num_elts() {
            if let Ok(child) = value.elt_mut(i) {
                apply_templates(child, errors);
            }
        }
    }
}

/// Expands the `template` directive of `map`'s `i`'th member, resolving the
/// base's own directive first. Expansion replaces member values only, so
/// positions in `map` stay stable.
fn expand_template_at(
    map: &mut crate::map::ValueMap,
    index: usize,
    depth: usize,
    errors: &mut Vec<String>,
) -> bool {
    let Some(key) = map.value(index).member(TEMPLATE_KEY).str_value() else {
        errors.push(format!(
            "template directive in '{}' is not a string",
            map.name(index)
        ));
        return false;
    };
    let key = key.to_string();

    let Some(base_index) = map.index_of(&key) else {
        errors.push(format!("unknown template key: {}", key));
        return false;
    };

    if depth >= MAX_TEMPLATE_DEPTH {
        errors.push(format!("template recursion too deep at: {}", key));
        return false;
    }

    if map.value(base_index).has_member(TEMPLATE_KEY)
        && !expand_template_at(map, base_index, depth + 1, errors)
    {
        return false;
    }

    let mut expanded = map.value(base_index).clone();
    let target = map.value_mut(index);
    target.remove_member(TEMPLATE_KEY);
    expanded.merge(target);
    target.swap(&mut expanded);
    true
}

// --- Command-line overrides -------------------------------------------------

/// Applies `name.path=value` override strings to `config`.
///
/// The part before the first `=` (or `:`) is a dotted member path, created as
/// needed; the part after is parsed as lenient JSON, with a bare word
/// auto-quoted so `mode=fast` means the string `"fast"`. A setting with no
/// `=` sets the named member to `true`.
pub fn apply_settings<S: AsRef<str>>(settings: &[S], config: &mut Value) -> Result<()> {
    for setting in settings {
        let setting = setting.as_ref();
        let (name, value_text) = match setting.split_once(|c| c == '=' || c == ':') {
            Some((name, rest)) => (name, Some(rest.trim_start_matches(' '))),
            None => (setting, None),
        };

        let mut slot = &mut *config;
        for member in name.split('.') {
            slot = slot.update_member(member)?;
        }

        let Some(value_text) = value_text else {
            *slot = Value::Bool(true);
            continue;
        };
        if value_text.is_empty() {
            *slot = Value::Null;
            continue;
        }

        let quoted;
        let text = if needs_quoting(value_text) {
            quoted = format!("\"{}\"", value_text);
            &quoted
        } else {
            value_text
        };

        *slot = Reader::new().read(text).map_err(|failure| Error::InvalidPath {
            path: setting.to_string(),
            msg: failure.to_string(),
        })?;
    }

    Ok(())
}

fn needs_quoting(text: &str) -> bool {
    let Some(first) = text.bytes().next() else {
        return false;
    };
    !(matches!(first, b'[' | b'{' | b'-' | b'"')
        || first.is_ascii_digit()
        || text.eq_ignore_ascii_case("null")
        || text.eq_ignore_ascii_case("true")
        || text.eq_ignore_ascii_case("false"))
}

// --- Saving ----------------------------------------------------------------

/// The profile configuration files are written with: wide indent for hand
/// editing, C-style float specials.
#[must_use]
pub fn save_options() -> WriteOptions {
    WriteOptions {
        indent: Indent::Width(4),
        specials: Specials::CLike,
        ..WriteOptions::default()
    }
}

/// Writes `config` to `path` with the configuration profile.
pub fn save_config(path: &Path, config: &Value) -> Result<()> {
    if !has_json_extension(path) {
        return Err(Error::Io {
            path: path.display().to_string(),
            msg: "unsupported config extension".to_string(),
        });
    }
    crate::write::save_file(path, config, &save_options())
}
