//! End-to-end tests for the multi-ui binary
//!
//! Each test runs the compiled binary in a temp project directory, pointing
//! `MULTI_UI_REGISTRY_URL` at a local mock registry.

use assert_cmd::Command;
use predicates::prelude::*;

fn multi_ui() -> Command {
    Command::cargo_bin("multi-ui").unwrap()
}

fn write_config(dir: &std::path::Path, language: &str, component_path: &str) {
    let json = serde_json::json!({
        "language": language,
        "componentPath": component_path,
    });
    std::fs::write(dir.join("multi-ui.config.json"), json.to_string()).unwrap();
}

#[test]
fn no_arguments_prints_usage() {
    multi_ui()
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("setup"))
        .stdout(predicate::str::contains("add"));
}

#[test]
fn unknown_subcommand_prints_usage() {
    multi_ui()
        .arg("frobnicate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn add_writes_typescript_component_verbatim() {
    let mut server = mockito::Server::new();
    let body = "export default function Button_1() {\n  return null;\n}\n";
    let mock = server
        .mock("GET", "/button/_components/Button_1.tsx")
        .with_status(200)
        .with_body(body)
        .create();

    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "typescript", "ui");

    multi_ui()
        .current_dir(dir.path())
        .env("MULTI_UI_REGISTRY_URL", server.url())
        .args(["add", "Button_1"])
        .assert()
        .success();

    let written = std::fs::read_to_string(dir.path().join("ui/Button_1.tsx")).unwrap();
    assert_eq!(written, body);
    mock.assert();
}

#[test]
fn add_converts_for_javascript_projects() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/card/_components/Card_2.tsx")
        .with_status(200)
        .with_body(
            "export default function Card_2({ title }: { title: string }) {\n  return <h2>{title}</h2>;\n}\n",
        )
        .create();

    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "javascript", "ui");

    multi_ui()
        .current_dir(dir.path())
        .env("MULTI_UI_REGISTRY_URL", server.url())
        .args(["add", "Card_2"])
        .assert()
        .success();

    let written = std::fs::read_to_string(dir.path().join("ui/Card_2.jsx")).unwrap();
    assert!(!written.contains(": string"));
    assert!(written.contains("React.createElement(\"h2\", null, title)"));
    assert!(!dir.path().join("ui/Card_2.tsx").exists());
}

#[test]
fn add_without_config_falls_back_to_defaults() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/button/_components/Button_1.tsx")
        .with_status(200)
        .with_body("export default function Button_1() {}\n")
        .create();

    let dir = tempfile::tempdir().unwrap();

    let output = multi_ui()
        .current_dir(dir.path())
        .env("MULTI_UI_REGISTRY_URL", server.url())
        .args(["add", "Button_1"])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(dir
        .path()
        .join("src/app/multi-ui/components/Button_1.tsx")
        .exists());
    // the defaults warning names the config file it looked for
    let printed = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(printed.contains("multi-ui.config.json"));
}

#[test]
fn add_converts_object_literal_casts() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/fade/_components/Fade_1.tsx")
        .with_status(200)
        .with_body(
            "const variants = { hidden: { opacity: 0 } } as const;\nexport default function Fade_1() {\n  return <div>{variants.hidden.opacity}</div>;\n}\n",
        )
        .create();

    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "javascript", "ui");

    multi_ui()
        .current_dir(dir.path())
        .env("MULTI_UI_REGISTRY_URL", server.url())
        .args(["add", "Fade_1"])
        .assert()
        .success();

    let written = std::fs::read_to_string(dir.path().join("ui/Fade_1.jsx")).unwrap();
    assert!(!written.contains("as const"));
    assert!(written.contains("const variants = { hidden: { opacity: 0 } };"));
}

#[test]
fn add_missing_component_fails_with_not_found() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/ghost/_components/Ghost_9.tsx")
        .with_status(404)
        .create();

    let dir = tempfile::tempdir().unwrap();

    multi_ui()
        .current_dir(dir.path())
        .env("MULTI_UI_REGISTRY_URL", server.url())
        .args(["add", "Ghost_9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"))
        .stderr(predicate::str::contains("Ghost_9"));
}

#[test]
fn add_with_malformed_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("multi-ui.config.json"), "{broken").unwrap();

    let server = mockito::Server::new();

    multi_ui()
        .current_dir(dir.path())
        .env("MULTI_UI_REGISTRY_URL", server.url())
        .args(["add", "Button_1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed configuration"));
}

#[test]
fn add_overwrites_an_existing_copy() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/button/_components/Button_1.tsx")
        .with_status(200)
        .with_body("new version")
        .create();

    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), "typescript", "ui");
    std::fs::create_dir_all(dir.path().join("ui")).unwrap();
    std::fs::write(dir.path().join("ui/Button_1.tsx"), "old version").unwrap();

    multi_ui()
        .current_dir(dir.path())
        .env("MULTI_UI_REGISTRY_URL", server.url())
        .args(["add", "Button_1"])
        .assert()
        .success();

    assert_eq!(
        std::fs::read_to_string(dir.path().join("ui/Button_1.tsx")).unwrap(),
        "new version"
    );
}

#[test]
fn add_server_error_is_a_generic_fetch_failure() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/button/_components/Button_1.tsx")
        .with_status(500)
        .create();

    let dir = tempfile::tempdir().unwrap();

    multi_ui()
        .current_dir(dir.path())
        .env("MULTI_UI_REGISTRY_URL", server.url())
        .args(["add", "Button_1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to fetch"));
}
