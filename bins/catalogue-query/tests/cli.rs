//! Command-line behaviour of catalogue-query

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

fn catalogue() -> TempDir {
    let dir = TempDir::new().unwrap();
    let files = [
        ("acme-services", r#"{"name": "Acme Services", "type": "SaaS", "servicesInScope": {"Ticketing": ["Medium"]}}"#),
        ("acme-cloud", r#"{"name": "Acme Cloud", "type": "CSP", "underlyingCSP": ["Acme Cloud"], "servicesInScope": {"Compute": ["Medium", "HVA"]}}"#),
        ("contoso", r#"{"name": "Contoso", "type": "CSP", "servicesInScope": {"Blob Storage": ["Medium"], "Queue": ["HVA"]}, "references": {"providerReference": ["https://contoso.example/a", "https://contoso.example/b"]}}"#),
        ("fabrikam", r#"{"name": "Fabrikam", "type": "SaaS", "underlyingCSP": ["Contoso"], "servicesInScope": {"Mail Relay": ["Medium"]}}"#),
    ];
    let stems: Vec<_> = files.iter().map(|(stem, _)| *stem).collect();
    fs::write(dir.path().join("providers.json"), serde_json::to_string(&stems).unwrap()).unwrap();
    for (stem, body) in files {
        fs::write(dir.path().join(format!("{stem}.json")), body).unwrap();
    }
    dir
}

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("catalogue-query").unwrap();
    cmd.env_remove("CATALOGUE_SEARCH_CONFIG").env_remove("CATALOGUE_DATA");
    cmd
}

fn json_stdout(output: &[u8]) -> Value {
    serde_json::from_slice(output).unwrap()
}

fn titles(results: &Value) -> Vec<&str> {
    results
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["title"].as_str().unwrap())
        .collect()
}

#[test]
fn test_search_ranks_name_matches() {
    let data = catalogue();
    let output = cmd()
        .args(["search", "acme", "--json", "--data"])
        .arg(data.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let response = json_stdout(&output);
    assert_eq!(response["q"], "acme");
    // Acme Cloud also matches through its underlying platform
    assert_eq!(titles(&response["providerResults"]), vec!["Acme Cloud", "Acme Services"]);
    assert_eq!(response["providerResults"][0]["subtitle"], "Provider");
}

#[test]
fn test_search_promotes_provider_through_service() {
    let data = catalogue();
    let output = cmd()
        .args(["search", "stor", "--json", "--data"])
        .arg(data.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let response = json_stdout(&output);
    assert_eq!(titles(&response["serviceResults"]), vec!["Blob Storage"]);

    let contoso = &response["providerResults"][0];
    assert_eq!(contoso["kind"], "provider");
    assert_eq!(contoso["title"], "Contoso");
    assert_eq!(contoso["reason"], "services");
    assert_eq!(contoso["matchedServiceCount"], 1);
    assert_eq!(contoso["subtitle"], "Provider • 1 matching service");
    assert_eq!(contoso["provider"]["servicesInScope"]["Queue"][0], "HVA");
}

#[test]
fn test_short_query_is_empty() {
    let data = catalogue();
    let output = cmd()
        .args(["search", " a ", "--json", "--data"])
        .arg(data.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let response = json_stdout(&output);
    assert_eq!(response["q"], "a");
    assert!(response["providerResults"].as_array().unwrap().is_empty());
    assert!(response["serviceResults"].as_array().unwrap().is_empty());
}

#[test]
fn test_search_text_output() {
    let data = catalogue();
    cmd()
        .args(["search", "fabrikam", "--data"])
        .arg(data.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Fabrikam"))
        .stdout(predicate::str::contains("Providers (1)"));
}

#[test]
fn test_config_overrides_promotion_score() {
    let data = catalogue();
    let config = data.path().join("search.toml");
    fs::write(&config, "[ranking]\npromotion_score = 0.25\n").unwrap();

    let output = cmd()
        .args(["search", "stor", "--json", "--config"])
        .arg(&config)
        .arg("--data")
        .arg(data.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let response = json_stdout(&output);
    assert_eq!(response["providerResults"][0]["score"], 0.25);
}

#[test]
fn test_interactive_prints_latest_answer() {
    let data = catalogue();
    let output = cmd()
        .args(["interactive", "--json", "--data"])
        .arg(data.path())
        .write_stdin("zz-nothing\nx\n\nfabrikam\n")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let stdout = String::from_utf8(output).unwrap();
    let last = stdout.lines().filter(|l| !l.trim().is_empty()).last().unwrap();
    let response: Value = serde_json::from_str(last).unwrap();
    assert_eq!(response["q"], "fabrikam");
    assert_eq!(response["providerResults"][0]["title"], "Fabrikam");
}

#[test]
fn test_summary_counts() {
    let data = catalogue();
    let output = cmd()
        .args(["summary", "--json", "--data"])
        .arg(data.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let summary = json_stdout(&output);
    assert_eq!(summary["total"]["providers"], 4);
    assert_eq!(summary["total"]["services"], 5);
    assert_eq!(summary["total"]["hva_services"], 2);
    assert_eq!(summary["by_type"]["CSP"]["reference_links"], 2);
}

#[test]
fn test_missing_catalogue_fails() {
    cmd()
        .args(["search", "acme", "--data", "/nonexistent/catalogue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open catalogue"));
}

#[test]
fn test_help() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("interactive"))
        .stdout(predicate::str::contains("summary"));
}
