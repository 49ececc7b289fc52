use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SCRUBBED_ENV: [&str; 12] = [
    "PLUME_PROVIDER",
    "PLUME_API_KEY",
    "PLUME_CONFIG",
    "PLUME_DATA_DIR",
    "PLUME_LOG",
    "PLUME_OPENAI_BASE_URL",
    "PLUME_ANTHROPIC_BASE_URL",
    "PLUME_GROQ_BASE_URL",
    "OPENAI_API_KEY",
    "ANTHROPIC_API_KEY",
    "GROQ_API_KEY",
    "RUST_LOG",
];

/// A `plume` command isolated from the developer's environment: config and
/// data both live in `home`.
fn plume_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("plume"));
    for var in SCRUBBED_ENV {
        cmd.env_remove(var);
    }
    cmd.env("PLUME_CONFIG", home.join("config.toml"))
        .env("PLUME_DATA_DIR", home.join("data"));
    cmd
}

fn plume_suggest_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("plume-suggest"));
    for var in SCRUBBED_ENV {
        cmd.env_remove(var);
    }
    cmd.env("PLUME_CONFIG", home.join("config.toml"))
        .env("PLUME_DATA_DIR", home.join("data"));
    cmd
}

fn parse_stdout_json(output: &[u8]) -> Value {
    let text = String::from_utf8(output.to_vec()).expect("stdout should be utf-8");
    serde_json::from_str(text.trim()).expect("stdout should contain valid JSON")
}

fn write_config(home: &Path, contents: &str) {
    fs::write(home.join("config.toml"), contents).expect("config should be writable");
}

#[test]
fn dry_run_succeeds_without_api_key() {
    let home = TempDir::new().expect("tempdir");
    let assert = plume_cmd(home.path())
        .args([
            "suggest",
            "--provider",
            "groq",
            "--tone",
            "80",
            "--author",
            "Ada",
            "--handle",
            "ada",
            "--dry-run",
            "Tabs or spaces?",
        ])
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    assert_eq!(body["dry_run"], json!(true));
    assert_eq!(body["provider"], json!("groq"));
    assert_eq!(body["models"].as_array().map(Vec::len), Some(4));
    let prompt = body["prompt"].as_str().expect("prompt should be a string");
    assert!(prompt.contains("Author: Ada (@ada)"));
    assert!(prompt.contains("authoritative, confident, and expert"));
}

#[test]
fn stdin_is_used_when_no_text_argument() {
    let home = TempDir::new().expect("tempdir");
    let assert = plume_cmd(home.path())
        .args(["suggest", "--dry-run"])
        .write_stdin("tweet from stdin\n")
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    assert!(
        body["prompt"]
            .as_str()
            .expect("prompt")
            .contains("Content: \"tweet from stdin\"")
    );
    assert_eq!(body["provider"], json!("openai"));
}

#[test]
fn empty_tweet_text_is_rejected() {
    let home = TempDir::new().expect("tempdir");
    plume_cmd(home.path())
        .args(["suggest", "--dry-run"])
        .write_stdin("   ")
        .assert()
        .failure()
        .stderr(contains("No tweet text provided"));
}

#[test]
fn missing_api_key_names_the_provider_variable() {
    let home = TempDir::new().expect("tempdir");
    plume_cmd(home.path())
        .args(["suggest", "--provider", "anthropic", "hello"])
        .assert()
        .failure()
        .stderr(contains("No API key configured").and(contains("ANTHROPIC_API_KEY")));
}

#[test]
fn invalid_provider_from_env_returns_error() {
    let home = TempDir::new().expect("tempdir");
    plume_cmd(home.path())
        .env("PLUME_PROVIDER", "bad")
        .args(["suggest", "--dry-run", "hello"])
        .assert()
        .failure()
        .stderr(contains(
            "Invalid provider 'bad'. Supported values: openai, anthropic, groq.",
        ));
}

#[test]
fn out_of_range_tone_flag_is_rejected() {
    let home = TempDir::new().expect("tempdir");
    plume_cmd(home.path())
        .args(["suggest", "--tone", "150", "--dry-run", "hello"])
        .assert()
        .failure();
}

#[test]
fn profile_supplies_preferences() {
    let home = TempDir::new().expect("tempdir");
    write_config(
        home.path(),
        "[profiles.work]\nprovider = \"anthropic\"\nstyle = \"witty\"\nexpertise = [\"Kubernetes\"]\ninclude_emojis = true\n",
    );

    let assert = plume_cmd(home.path())
        .args(["suggest", "--profile", "work", "--dry-run", "hello"])
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    assert_eq!(body["provider"], json!("anthropic"));
    assert_eq!(body["models"], json!(["claude-3-5-sonnet-20241022"]));
    let prompt = body["prompt"].as_str().expect("prompt");
    assert!(prompt.contains("clever and witty"));
    assert!(prompt.contains("The user has expertise in: Kubernetes."));
    assert!(prompt.contains("- Include 1-2 relevant emojis naturally"));
}

#[test]
fn unknown_profile_is_an_error() {
    let home = TempDir::new().expect("tempdir");
    write_config(home.path(), "[profiles.work]\nprovider = \"openai\"\n");

    plume_cmd(home.path())
        .args(["suggest", "--profile", "home", "--dry-run", "hello"])
        .assert()
        .failure()
        .stderr(contains("Profile 'home' not found"));
}

#[test]
fn config_check_validates_profile() {
    let home = TempDir::new().expect("tempdir");
    write_config(
        home.path(),
        "[profiles.ok]\nprovider = \"groq\"\napi_key = \"gsk_abcdefghijklmnopqrstuvwxyz\"\n\n[profiles.bad]\nprovider = \"groq\"\napi_key = \"sk-abcdefghijklmnopqrstuvwxyz\"\n",
    );

    plume_cmd(home.path())
        .args(["config", "check", "--profile", "ok"])
        .assert()
        .success()
        .stdout(contains("config OK"));

    plume_cmd(home.path())
        .args(["config", "check", "--profile", "bad"])
        .assert()
        .failure()
        .stderr(contains("does not look like a groq key"));
}

#[test]
fn stats_start_at_zero() {
    let home = TempDir::new().expect("tempdir");
    let assert = plume_cmd(home.path())
        .args(["stats", "--json"])
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    assert_eq!(body["repliesGenerated"], json!(0));
    assert_eq!(body["tweetsAnalyzed"], json!(0));
}

#[tokio::test(flavor = "multi_thread")]
async fn suggest_calls_provider_and_counts_usage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "Sure! [\"one\", \"two\", \"three\"]"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().expect("tempdir");
    let assert = plume_cmd(home.path())
        .env("PLUME_OPENAI_BASE_URL", server.uri())
        .env("OPENAI_API_KEY", "sk-abcdefghijklmnopqrstuvwxyz")
        .args(["suggest", "--json", "hello world"])
        .assert()
        .success();
    assert_eq!(
        parse_stdout_json(&assert.get_output().stdout),
        json!(["one", "two", "three"])
    );

    let stats = plume_cmd(home.path())
        .args(["stats", "--json"])
        .assert()
        .success();
    assert_eq!(
        parse_stdout_json(&stats.get_output().stdout)["repliesGenerated"],
        json!(1)
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn provider_failure_is_reported_and_not_counted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let home = TempDir::new().expect("tempdir");
    plume_suggest_cmd(home.path())
        .env("PLUME_OPENAI_BASE_URL", server.uri())
        .args(["--api-key", "sk-abcdefghijklmnopqrstuvwxyz", "hello"])
        .assert()
        .failure()
        .stderr(contains("429").and(contains("rate limited")));

    assert!(!home.path().join("data").join("state.json").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn serve_replies_over_stdout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "[\"a\", \"b\", \"c\"]"}}]
        })))
        .mount(&server)
        .await;

    let request = json!({"tabId": 5, "message": {
        "type": "GENERATE_SUGGESTIONS",
        "tweet": {"text": "hi", "author": "B", "handle": "b"},
        "config": {"provider": "openai", "apiKey": "sk-abcdefghijklmnopqrstuvwxyz"}
    }});

    let home = TempDir::new().expect("tempdir");
    let assert = plume_cmd(home.path())
        .env("PLUME_OPENAI_BASE_URL", server.uri())
        .arg("serve")
        .write_stdin(format!("{request}\n"))
        .assert()
        .success();

    assert_eq!(
        parse_stdout_json(&assert.get_output().stdout),
        json!({"tabId": 5, "message": {"type": "SUGGESTIONS_READY", "suggestions": ["a", "b", "c"]}})
    );
}
