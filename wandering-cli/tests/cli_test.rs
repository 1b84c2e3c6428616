//! Command line tests for wandering-ssr

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn project() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("index.html"),
        "<html><head></head><body><!--ssr-outlet--></body></html>",
    )
    .unwrap();
    fs::write(
        temp_dir.path().join("client-manifest.json"),
        r#"{"publicPath": "/static", "initial": ["app.js"], "async": []}"#,
    )
    .unwrap();
    fs::write(
        temp_dir.path().join("server-bundle.json"),
        r#"{"entry": "main.js", "files": {"main.js": "<div id=app>{{state.msg}}</div>"}}"#,
    )
    .unwrap();
    fs::write(
        temp_dir.path().join("ssr.toml"),
        "template = \"index.html\"\nclient_manifest = \"client-manifest.json\"\n",
    )
    .unwrap();
    fs::write(temp_dir.path().join("state.json"), r#"{"msg": "hello"}"#).unwrap();
    temp_dir
}

fn cli() -> Command {
    Command::cargo_bin("wandering-ssr").unwrap()
}

#[test]
fn test_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("render"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn test_render_content_to_stdout() {
    let temp_dir = project();
    cli()
        .current_dir(temp_dir.path())
        .args(["render", "--config", "ssr.toml", "--content", "<p>hi</p>"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"<body><p>hi</p><script src="/static/app.js" defer></script></body>"#,
        ));
}

#[test]
fn test_render_bundle_to_file() {
    let temp_dir = project();
    cli()
        .current_dir(temp_dir.path())
        .args([
            "render",
            "-c",
            "ssr.toml",
            "--bundle",
            "server-bundle.json",
            "--state",
            "state.json",
            "-o",
            "out/index.html",
        ])
        .assert()
        .success();

    let html = fs::read_to_string(temp_dir.path().join("out/index.html")).unwrap();
    assert!(html.contains(r#"<div id=app>hello</div><script>window.__INITIAL_STATE__={"msg":"hello"}</script>"#));
}

#[test]
fn test_check_success() {
    let temp_dir = project();
    cli()
        .current_dir(temp_dir.path())
        .args(["--no-color", "check", "--config", "ssr.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("template parsed"))
        .stdout(predicate::str::contains("1 initial asset(s)"));
}

#[test]
fn test_check_reports_missing_placeholder() {
    let temp_dir = project();
    fs::write(temp_dir.path().join("index.html"), "<html></html>").unwrap();

    cli()
        .current_dir(temp_dir.path())
        .args(["--no-color", "check", "--config", "ssr.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Content placeholder not found"));
}

#[test]
fn test_unsupported_config_format() {
    let temp_dir = project();
    fs::write(temp_dir.path().join("ssr.yaml"), "template: index.html").unwrap();

    cli()
        .current_dir(temp_dir.path())
        .args(["--no-color", "check", "--config", "ssr.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported format: yaml"));
}
