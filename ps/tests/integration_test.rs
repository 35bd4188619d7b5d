//! Integration tests for PromptStore
//!
//! These tests verify end-to-end behavior over a real registry directory.

use std::path::Path;

use serde_json::{Value, json};
use tempfile::TempDir;

use promptstore::{Config, Error, LocalRegistry, PromptSystem, Registry};

fn write_file(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).expect("Failed to write test file");
}

fn system(dir: &Path) -> PromptSystem<LocalRegistry> {
    PromptSystem::new(LocalRegistry::new(dir))
}

// =============================================================================
// Schema Inference
// =============================================================================

#[test]
fn test_schema_for_root_context_path() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    write_file(temp_dir.path(), "greeting.tmpl", "Hello [[.user.name]]");

    let (_, schema) = system(temp_dir.path()).resolve("greeting.tmpl").unwrap();
    assert_eq!(Value::Object(schema), json!({"user": {"name": ""}}));
}

#[test]
fn test_schema_across_inclusion_closure() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    write_file(
        temp_dir.path(),
        "main.tmpl",
        "[[template \"header.tmpl\" .]]\nHello [[.user.name]]!\n[[template \"footer.tmpl\" .]]",
    );
    write_file(temp_dir.path(), "header.tmpl", "Header: [[.site.title]]");
    write_file(temp_dir.path(), "footer.tmpl", "Footer: [[.site.copyright]]");

    let (set, schema) = system(temp_dir.path()).resolve("main.tmpl").unwrap();
    assert_eq!(set.order(), ["main.tmpl", "header.tmpl", "footer.tmpl"]);
    assert_eq!(
        Value::Object(schema),
        json!({
            "user": {"name": ""},
            "site": {"title": "", "copyright": ""}
        })
    );
}

#[test]
fn test_mutual_inclusion_terminates() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    write_file(temp_dir.path(), "a.tmpl", "[[.from_a]][[template \"b.tmpl\" .]]");
    write_file(temp_dir.path(), "b.tmpl", "[[.from_b]][[template \"a.tmpl\" .]]");

    let (set, schema) = system(temp_dir.path()).resolve("a.tmpl").unwrap();
    assert_eq!(set.len(), 2);
    assert_eq!(Value::Object(schema), json!({"from_a": "", "from_b": ""}));
}

#[test]
fn test_missing_dependency_aborts_resolution() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    write_file(temp_dir.path(), "main.tmpl", "[[template \"gone.tmpl\" .]]");

    let err = system(temp_dir.path()).resolve("main.tmpl").unwrap_err();
    assert!(matches!(err, Error::DependencyNotFound { ref name, .. } if name == "gone.tmpl"));
}

// =============================================================================
// Config Generation + Validation
// =============================================================================

#[test]
fn test_generate_config_covers_closure_and_round_trips() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    write_file(
        temp_dir.path(),
        "main.tmpl",
        "[[template \"header.tmpl\" .]]Hello [[.user]]",
    );
    write_file(temp_dir.path(), "header.tmpl", "[[.title]]");

    let system = system(temp_dir.path());
    let generated = system.generate_config("main.tmpl", "main_config.json").unwrap();
    assert_eq!(
        Value::Object(generated.data.clone()),
        json!({"title": "", "user": ""})
    );

    // The saved file parses back to the same data.
    let loaded = system.registry().load_config("main_config.json").unwrap();
    assert_eq!(loaded.data, generated.data);
}

#[test]
fn test_validation_is_shallow() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    write_file(temp_dir.path(), "main.tmpl", "Hello [[.user.name]]");

    let system = system(temp_dir.path());
    let (_, schema) = system.resolve("main.tmpl").unwrap();

    let empty = Config::from_json_str("{}", "c.json").unwrap();
    assert_eq!(empty.missing_fields(&schema), vec!["user"]);

    // Shape is not checked: a number where an object is required passes.
    let scalar = Config::from_json_str("{\"user\": 5}", "c.json").unwrap();
    assert!(scalar.missing_fields(&schema).is_empty());
}

// =============================================================================
// Building Prompts
// =============================================================================

#[test]
fn test_end_to_end_hello_ada() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    write_file(temp_dir.path(), "greeting.tmpl", "Hello [[.user.name]]");
    write_file(
        temp_dir.path(),
        "config.json",
        "{\"user\": {\"name\": \"Ada\"}}",
    );

    let prompt = system(temp_dir.path())
        .build_from_paths("greeting.tmpl", "config.json")
        .unwrap();
    assert_eq!(prompt, "Hello Ada");
}

#[test]
fn test_inclusion_scenario_shares_single_load() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    write_file(
        temp_dir.path(),
        "a.tmpl",
        "[[template \"b.tmpl\" .]][[template \"b.tmpl\" .]]",
    );
    write_file(temp_dir.path(), "b.tmpl", "[[.title]]");

    let system = system(temp_dir.path());
    let (set, schema) = system.resolve("a.tmpl").unwrap();
    assert_eq!(set.order(), ["a.tmpl", "b.tmpl"]);
    assert_eq!(Value::Object(schema), json!({"title": ""}));

    write_file(temp_dir.path(), "config.json", "{\"title\": \"T\"}");
    let prompt = system.build_from_paths("a.tmpl", "config.json").unwrap();
    assert_eq!(prompt, "TT");
}

#[test]
fn test_build_full_template_features() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    write_file(
        temp_dir.path(),
        "report.tmpl",
        "\
[[.title]]
[[if .premium]]premium[[else]]standard[[end]]
[[range .items]]- [[.name]]
[[end]][[with .contact]]contact: [[.email]][[end]]",
    );
    write_file(
        temp_dir.path(),
        "config.json",
        r#"{
            "title": "Report",
            "premium": true,
            "items": [{"name": "one"}, {"name": "two"}],
            "name": "",
            "contact": {"email": "a@b.c"}
        }"#,
    );

    let prompt = system(temp_dir.path())
        .build_from_paths("report.tmpl", "config.json")
        .unwrap();
    assert_eq!(
        prompt,
        "Report\npremium\n- one\n- two\ncontact: a@b.c"
    );
}

#[test]
fn test_build_then_fill_then_build() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    write_file(temp_dir.path(), "main.tmpl", "Hi [[.name]], see [[.link]]");
    write_file(temp_dir.path(), "config.json", "{\"name\": \"Bo\"}");

    let system = system(temp_dir.path());
    let err = system.build_from_paths("main.tmpl", "config.json").unwrap_err();
    assert!(err.is_recoverable());

    // Synthesize the missing fields, keeping the existing value, and retry.
    system.generate_config("main.tmpl", "config.json").unwrap();
    let prompt = system.build_from_paths("main.tmpl", "config.json").unwrap();
    assert_eq!(prompt, "Hi Bo, see ");
}
