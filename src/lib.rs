//! # valon
//!
//! A dynamic, JSON-shaped value model with a lenient (JSON5-tolerant) reader,
//! a configurable pretty-printer, and a layered configuration loader.
//!
//! The center of the crate is [`Value`]: a tagged variant over null, bool,
//! four integer widths, double, string, array, and object, built as the
//! in-memory substrate for configuration files and generic structured data.
//!
//! ## Key Features
//!
//! - **Forgiving access**: read accessors never fail — a missing member or
//!   mis-typed field degrades to a caller-supplied default or a null
//!   sentinel, so tree-walking code needs no error plumbing
//! - **Lenient parsing**: comments, trailing commas, bare keys and scalars,
//!   and `Infinity`/`NaN` are accepted by default; strict-JSON profiles are
//!   one option struct away for both reading and writing
//! - **Error recovery**: a malformed member costs only itself — the parser
//!   resynchronizes and returns the partial tree with every diagnostic
//! - **Adaptive formatting**: short arrays print on one line, long ones wrap,
//!   decided by a render-once measurement pass
//! - **Config layering**: `import` and `template` directives plus dotted
//!   `key=value` overrides, resolved best-effort with aggregated errors
//! - **No unsafe code**: written entirely in safe Rust
//!
//! ## Quick Start
//!
//! ```rust
//! use valon::{Value, valon};
//!
//! let mut v = valon::from_str(r#"
//!     {
//!         // settings for the renderer
//!         width: 1280,
//!         title: "demo",
//!         flags: [1, 2, 3,],
//!     }
//! "#).unwrap();
//!
//! assert_eq!(v["width"].as_i32(0), 1280);
//! assert_eq!(v["missing"].as_i32(640), 640);      // degrades, never fails
//!
//! *v.update_member("height").unwrap() = Value::from(720);
//!
//! let defaults = valon!({ "width": 640, "vsync": true });
//! let mut merged = defaults.clone();
//! merged.merge(&v);
//! assert_eq!(merged["vsync"].as_bool(false), true);
//! assert_eq!(merged["width"].as_i32(0), 1280);
//! ```
//!
//! ## Serializing
//!
//! ```rust
//! use valon::{valon, WriteOptions};
//!
//! let v = valon!({ "name": "widget", "sizes": [1, 2, 3] });
//!
//! assert_eq!(valon::to_string(&v),
//!     "{\n  name: \"widget\",\n  sizes: [1, 2, 3]\n}");
//!
//! // Strict JSON for interop: quoted keys, specials as null.
//! let strict = valon::to_string_with_options(&v, &WriteOptions::strict());
//! assert!(strict.starts_with("{\n  \"name\""));
//! ```
//!
//! ## Configuration files
//!
//! Configuration documents may pull in other files and inherit from sibling
//! objects; see the [`config`] module.
//!
//! ```rust,no_run
//! use valon::config::Loader;
//!
//! let settings = Loader::new()
//!     .variant("test")
//!     .load(std::path::Path::new("data/settings.json"))?;
//! # Ok::<(), valon::ConfigFailure>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod config;
mod error;
mod intern;
mod macros;
mod map;
mod path;
mod read;
mod value;
mod write;

pub use error::{ConfigFailure, Error, ParseError, ParseFailure, Result};
pub use intern::StringTable;
pub use map::ValueMap;
pub use path::{member_path, update_member_path};
pub use read::{ReadOptions, Reader};
pub use value::{Kind, Value};
pub use write::{save_file, to_string, to_string_with_options, Indent, Specials, WriteOptions};

use std::path::Path;

/// Parses a document with the default lenient options.
///
/// On failure the partial tree and all diagnostics are in the returned
/// [`ParseFailure`].
pub fn from_str(text: &str) -> std::result::Result<Value, ParseFailure> {
    Reader::new().read(text)
}

/// Parses a document with the given options.
pub fn from_str_with_options(
    text: &str,
    options: ReadOptions,
) -> std::result::Result<Value, ParseFailure> {
    Reader::with_options(options).read(text)
}

/// Reads and parses a file with the default lenient options.
pub fn load_file(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, &e))?;
    Ok(from_str(&text)?)
}
