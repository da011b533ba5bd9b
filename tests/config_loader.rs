//! Configuration loading against real files: imports, variants, templates.

use std::fs;
use std::path::Path;
use valon::config::{save_config, Loader};
use valon::{StringTable, Value};

fn write_file(dir: &Path, name: &str, text: &str) {
    fs::write(dir.join(name), text).unwrap();
}

#[test]
fn import_merges_underneath_the_document() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "base.json",
        r#"{ shared: "base", base_only: 1 }"#,
    );
    write_file(
        dir.path(),
        "main.json",
        r#"{ import: "base.json", shared: "main", main_only: 2 }"#,
    );

    let v = Loader::new().load(&dir.path().join("main.json")).unwrap();

    assert_eq!(v["shared"].as_str(""), "main"); // document wins
    assert_eq!(v["base_only"].as_i32(0), 1);
    assert_eq!(v["main_only"].as_i32(0), 2);
    assert!(!v.has_member("import"));
}

#[test]
fn import_arrays_merge_in_order() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.json", r#"{ x: "a", a: 1 }"#);
    write_file(dir.path(), "b.json", r#"{ x: "b", b: 2 }"#);
    write_file(
        dir.path(),
        "main.json",
        r#"{ import: ["a.json", "b.json"] }"#,
    );

    let v = Loader::new().load(&dir.path().join("main.json")).unwrap();

    assert_eq!(v["x"].as_str(""), "b"); // later import overrides earlier
    assert_eq!(v["a"].as_i32(0), 1);
    assert_eq!(v["b"].as_i32(0), 2);
}

#[test]
fn imports_resolve_recursively_and_relatively() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    write_file(dir.path(), "main.json", r#"{ import: "sub/mid.json" }"#);
    write_file(
        &dir.path().join("sub"),
        "mid.json",
        r#"{ import: "deep.json", mid: 1 }"#,
    );
    write_file(&dir.path().join("sub"), "deep.json", r#"{ deep: 2 }"#);

    let (v, info) = Loader::new()
        .load_with_info(&dir.path().join("main.json"))
        .unwrap();

    assert_eq!(v["mid"].as_i32(0), 1);
    assert_eq!(v["deep"].as_i32(0), 2);
    assert_eq!(info.imports.len(), 2);
    assert!(info.imports.contains(&dir.path().join("sub/deep.json")));
}

#[test]
fn missing_import_is_best_effort() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.json", r#"{ a: 1 }"#);
    write_file(
        dir.path(),
        "main.json",
        r#"{ import: ["a.json", "missing.json"], local: 2 }"#,
    );

    let failure = Loader::new()
        .load(&dir.path().join("main.json"))
        .unwrap_err();

    // The import that resolved still merged.
    assert_eq!(failure.value["a"].as_i32(0), 1);
    assert_eq!(failure.value["local"].as_i32(0), 2);
    assert!(failure.errors.iter().any(|e| e.contains("missing.json")));
}

#[test]
fn import_cycles_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.json", r#"{ import: "b.json", a: 1 }"#);
    write_file(dir.path(), "b.json", r#"{ import: "a.json", b: 2 }"#);

    let failure = Loader::new().load(&dir.path().join("a.json")).unwrap_err();

    assert!(failure.errors.iter().any(|e| e.contains("import cycle")));
    assert_eq!(failure.value["a"].as_i32(0), 1);
}

#[test]
fn self_import_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "main.json", r#"{ import: "main.json", x: 1 }"#);

    let failure = Loader::new()
        .load(&dir.path().join("main.json"))
        .unwrap_err();

    assert!(failure.errors.iter().any(|e| e.contains("import cycle")));
    assert_eq!(failure.value["x"].as_i32(0), 1);
}

#[test]
fn variant_files_merge_over_imports() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "base.json", r#"{ level: "base", common: 1 }"#);
    write_file(dir.path(), "base_test.json", r#"{ level: "test" }"#);
    write_file(dir.path(), "main.json", r#"{ import: "base.json" }"#);

    let plain = Loader::new().load(&dir.path().join("main.json")).unwrap();
    assert_eq!(plain["level"].as_str(""), "base");

    let variant = Loader::new()
        .variant("test")
        .load(&dir.path().join("main.json"))
        .unwrap();
    assert_eq!(variant["level"].as_str(""), "test");
    assert_eq!(variant["common"].as_i32(0), 1);
}

#[test]
fn templates_resolve_after_imports() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "library.json",
        r#"{ base: { x: 1, y: 2 } }"#,
    );
    write_file(
        dir.path(),
        "main.json",
        r#"{ import: "library.json", child: { template: "base", y: 3 } }"#,
    );

    let v = Loader::new().load(&dir.path().join("main.json")).unwrap();

    assert_eq!(v["child"]["x"].as_i32(0), 1);
    assert_eq!(v["child"]["y"].as_i32(0), 3);
    assert!(!v["child"].has_member("template"));
}

#[test]
fn parse_errors_surface_with_the_file_name() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "main.json", r#"{ a: , b: 2 }"#);

    let failure = Loader::new()
        .load(&dir.path().join("main.json"))
        .unwrap_err();

    assert_eq!(failure.value["b"].as_i32(0), 2);
    assert!(failure.errors.iter().any(|e| e.contains("main.json")));
}

#[test]
fn unsupported_extension_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "main.yaml", "a: 1");

    let failure = Loader::new()
        .load(&dir.path().join("main.yaml"))
        .unwrap_err();
    assert!(failure
        .errors
        .iter()
        .any(|e| e.contains("unsupported file format")));
}

#[test]
fn shared_table_interns_across_files() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "base.json", r#"{ nested: { host: "a" } }"#);
    write_file(
        dir.path(),
        "main.json",
        r#"{ import: "base.json", other: { host: "b" } }"#,
    );

    let mut table = StringTable::new();
    let v = Loader::new()
        .table(&mut table)
        .load(&dir.path().join("main.json"))
        .unwrap();

    assert_eq!(v["nested"]["host"].as_str(""), "a");
    assert!(table.len() >= 3); // nested, other, host...
}

#[test]
fn save_config_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.json");

    let v = valon::valon!({
        "window": { "width": 1280, "height": 720 },
        "name": "demo"
    });

    save_config(&path, &v).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("    width: 1280")); // 4-space config indent

    let back = Loader::new().load(&path).unwrap();
    assert_eq!(back, v);
}

#[test]
fn save_config_rejects_unknown_extensions() {
    let dir = tempfile::tempdir().unwrap();
    assert!(save_config(&dir.path().join("out.toml"), &Value::Null).is_err());
}
