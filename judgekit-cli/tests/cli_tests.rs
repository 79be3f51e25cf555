use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::path::{Path, PathBuf};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_json(dir: &Path, name: &str, value: serde_json::Value) -> PathBuf {
    let file = dir.join(name);
    std::fs::write(&file, value.to_string()).unwrap();
    file
}

fn completion(text: &str) -> serde_json::Value {
    json!({
        "choices": [{"index": 0, "message": {"role": "assistant", "content": text}, "finish_reason": "stop"}]
    })
}

#[test]
fn unknown_task_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let data = write_json(dir.path(), "summaries.json", json!([{"text": "x", "label": "y"}]));

    let mut cmd = Command::cargo_bin("judgekit")?;
    cmd.arg("--data-path").arg(&data);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Unknown task: 'summaries'"));
    Ok(())
}

#[test]
fn bleu_rouge_requires_translation_task() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let data = write_json(dir.path(), "review.json", json!([{"text": "x", "label": "positive"}]));

    let mut cmd = Command::cargo_bin("judgekit")?;
    cmd.arg("--data-path").arg(&data).arg("--enable-bleu-rouge");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("only available for the translation task"));
    Ok(())
}

#[test]
fn missing_data_path_shows_usage() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("judgekit")?;
    cmd.env_remove("JUDGEKIT_DATA_PATH");
    cmd.assert().failure().stderr(predicate::str::contains("--data-path"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn translation_run_writes_report() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Label: good\nConfidence: 0.9")))
        .expect(2)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir()?;
    let data = write_json(
        dir.path(),
        "translation.json",
        json!([
            {"source": "Le chat dort.", "candidate": "The cat sleeps.", "reference": "The cat sleeps.", "label": "good"},
            {"source": "Merci", "candidate": "Thanks", "label": "good"}
        ]),
    );
    let save_dir = dir.path().join("results");

    let mut cmd = Command::cargo_bin("judgekit")?;
    cmd.arg("--data-path")
        .arg(&data)
        .arg("--save-dir")
        .arg(&save_dir)
        .arg("--enable-bleu-rouge")
        .arg("--base-url")
        .arg(format!("{}/v1", server.uri()))
        .arg("-m")
        .arg("judge-model");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Evaluation complete. Results saved to"))
        .stdout(predicate::str::contains("Accuracy: 1.0000"));

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(save_dir.join("translation_results.json"))?)?;
    assert_eq!(report["metadata"]["judge_model"], "judge-model");
    assert_eq!(report["individual_results"][0]["extra_scores"]["bleu"], 1.0);
    assert_eq!(report["overall_results"]["avg_bleu"], 1.0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn backend_failure_names_instance_and_writes_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir()?;
    let data = write_json(
        dir.path(),
        "review.json",
        json!([{"id": "first", "text": "Great", "label": "positive"}]),
    );
    let save_dir = dir.path().join("results");

    let mut cmd = Command::cargo_bin("judgekit")?;
    cmd.arg("--data-path")
        .arg(&data)
        .arg("--save-dir")
        .arg(&save_dir)
        .arg("--base-url")
        .arg(server.uri());
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("instance 'first'"))
        .stderr(predicate::str::contains("model not found"));

    assert!(!save_dir.join("review_results.json").exists());
    Ok(())
}
