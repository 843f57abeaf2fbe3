//! `include` handling against real files in a temporary directory.

use std::fs;
use std::path::Path;

use libhconfig::{Loader, MapVars, ParseError, Schema, SectionSpec, Value, WarningKind};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn labels(sections: &libhconfig::Sections, name: &str) -> Vec<String> {
    sections
        .all(name)
        .iter()
        .filter_map(|object| object.get("name").and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

#[test]
fn test_nested_relative_includes() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "main.hcnf",
        "site one {}\ninclude conf.d/sites.hcnf\nsite four {}\n",
    );
    write(
        dir.path(),
        "conf.d/sites.hcnf",
        "site two {}\ninclude more/last.hcnf\n",
    );
    write(dir.path(), "conf.d/more/last.hcnf", "site three {}\n");

    let mut loader = Loader::new();
    let sections = loader
        .sections_from_file(dir.path().join("main.hcnf"), None)
        .unwrap();
    assert_eq!(labels(&sections, "site"), vec!["one", "two", "three", "four"]);
    assert!(loader.warnings().is_empty());
}

#[test]
fn test_parent_directory_include() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "common.hcnf", "general { port 80 }\n");
    write(dir.path(), "app/main.hcnf", "include ../common.hcnf\n");

    let schema = Schema::new().section("general", SectionSpec::once());
    let sections = libhconfig::parse_sections_file(dir.path().join("app/main.hcnf"), Some(&schema))
        .unwrap();
    let general = sections.one("general").unwrap();
    assert_eq!(general.get("port"), Some(&Value::from(80)));
}

#[test]
fn test_absolute_include() {
    let dir = TempDir::new().unwrap();
    let other = TempDir::new().unwrap();
    write(other.path(), "shared.hcnf", "site shared {}\n");
    let shared = other.path().join("shared.hcnf");
    write(
        dir.path(),
        "main.hcnf",
        &format!("include \"{}\"\n", shared.display()),
    );

    let sections = libhconfig::parse_sections_file(dir.path().join("main.hcnf"), None).unwrap();
    assert_eq!(labels(&sections, "site"), vec!["shared"]);
}

#[test]
fn test_schema_spans_includes() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "main.hcnf", "general {}\ninclude extra.hcnf\n");
    write(dir.path(), "extra.hcnf", "\ngeneral {}\n");

    let schema = Schema::new().section("general", SectionSpec::once());
    let err = libhconfig::parse_sections_file(dir.path().join("main.hcnf"), Some(&schema))
        .unwrap_err();
    let location = err.location().unwrap();
    assert_eq!(location.line, 2);
    assert!(err.to_string().contains("extra.hcnf:2"));
    assert!(err
        .to_string()
        .ends_with("Expected section general to exist only once"));
}

#[test]
fn test_include_self_through_dot_segments() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "sub/main.hcnf", "site a {}\ninclude ../sub/./main.hcnf\n");

    let err = libhconfig::parse_sections_file(dir.path().join("sub/main.hcnf"), None).unwrap_err();
    assert!(matches!(err, ParseError::IncludeSelf(_)));
    assert_eq!(err.location().unwrap().line, 2);
}

#[test]
fn test_error_in_included_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "main.hcnf", "include bad.hcnf\nsite ok {}\n");
    write(dir.path(), "bad.hcnf", "site broken {\n  key\n");

    let err = libhconfig::parse_sections_file(dir.path().join("main.hcnf"), None).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("bad.hcnf:"), "{}", message);
    assert!(message.ends_with("Unexpected token EOF"), "{}", message);
}

#[test]
fn test_missing_include_is_skipped() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "main.hcnf", "site a {}\n\ninclude nowhere.hcnf\nsite b {}\n");

    let mut loader = Loader::new();
    let sections = loader
        .sections_from_file(dir.path().join("main.hcnf"), None)
        .unwrap();
    assert_eq!(labels(&sections, "site"), vec!["a", "b"]);

    let warnings = loader.warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].location.line, 3);
    match &warnings[0].kind {
        WarningKind::IncludeFailed { path, .. } => {
            assert_eq!(path, &dir.path().join("nowhere.hcnf"))
        }
        other => panic!("unexpected warning: {:?}", other),
    }
}

#[test]
fn test_warnings_in_document_order() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "main.hcnf",
        "a { v \"$(FIRST)\" }\ninclude inner.hcnf\nc { v \"$(THIRD)\" }\n",
    );
    write(dir.path(), "inner.hcnf", "b { v \"$(SECOND)\" }\n");

    let mut loader = Loader::new().with_vars(MapVars::new());
    loader
        .sections_from_file(dir.path().join("main.hcnf"), None)
        .unwrap();

    let names: Vec<WarningKind> = loader.take_warnings().into_iter().map(|w| w.kind).collect();
    assert_eq!(
        names,
        vec![
            WarningKind::UnsetVariable("FIRST".into()),
            WarningKind::UnsetVariable("SECOND".into()),
            WarningKind::UnsetVariable("THIRD".into()),
        ]
    );
}

#[test]
fn test_variables_expand_in_included_files() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "main.hcnf", "include inner.hcnf\n");
    write(dir.path(), "inner.hcnf", "site \"$(SITE)\" { root '$(SITE)' }\n");

    let mut loader = Loader::new().with_vars(MapVars::new().set("SITE", "example.com"));
    let sections = loader
        .sections_from_file(dir.path().join("main.hcnf"), None)
        .unwrap();
    let site = &sections.all("site")[0];
    assert_eq!(site.get("name"), Some(&Value::from("example.com")));
    assert_eq!(site.get("root"), Some(&Value::from("$(SITE)")));
    assert!(loader.warnings().is_empty());
}
