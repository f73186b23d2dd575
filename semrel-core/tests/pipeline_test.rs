mod common;

use std::fs;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use common::{commit, config, plugins, FakeRepo, FixedAnalyzer, FixedLastRelease, RecordingVerifier};
use semrel_core::release::{BumpType, NextRelease, ReleaseType};
use semrel_core::release_reporter::{ReleaseReporter, SilentReporter};
use semrel_core::{Error, PreOutcome, ReleasePipeline};
use semver::Version;
use tempfile::TempDir;

const MANIFEST: &str = r#"{
  "name": "pkg",
  "version": "0.0.0-development",
  "repository": "acme/pkg"
}
"#;

fn project() -> TempDir {
    let dir = TempDir::new().expect("Should create temp directory");
    fs::write(dir.path().join("package.json"), MANIFEST).expect("Should write package.json");
    dir
}

fn history() -> Vec<semrel_core::Commit> {
    vec![
        commit("c1", "chore: initial"),
        commit("c2", "fix: handle empty input"),
        commit("c3", "feat: add option"),
    ]
}

fn manifest_version(dir: &Path) -> String {
    let raw = fs::read_to_string(dir.join("package.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    json["version"].as_str().unwrap().to_string()
}

#[derive(Default)]
struct RecordingReporter {
    events: Arc<Mutex<Vec<String>>>,
}

impl ReleaseReporter for RecordingReporter {
    fn report_next_release(&self, tag: &str, release: &NextRelease) {
        self.events
            .lock()
            .unwrap()
            .push(format!("next {} {}", tag, release.version));
    }

    fn report_version_written(&self, path: &Path, version: &str) {
        let file = path.file_name().unwrap().to_string_lossy();
        self.events
            .lock()
            .unwrap()
            .push(format!("wrote {} {}", file, version));
    }
}

#[tokio::test]
async fn test_first_release_is_initial_regardless_of_analyzer() {
    let dir = project();
    let repo = Arc::new(FakeRepo::new(history()));
    let analyzer = FixedAnalyzer::new(Some(BumpType::Minor));
    let pipeline = ReleasePipeline::new(
        Arc::new(config(false)),
        plugins(
            FixedLastRelease::new(None, None),
            analyzer.clone(),
            RecordingVerifier::passing(),
            RecordingVerifier::passing(),
        ),
        repo,
        SilentReporter,
    );

    let outcome = pipeline.run_pre(dir.path()).await.unwrap();

    match outcome {
        PreOutcome::Written { release, files } => {
            assert_eq!(release.release_type, ReleaseType::Initial);
            assert_eq!(release.version, Version::new(1, 0, 0));
            assert_eq!(files, vec![dir.path().join("package.json")]);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(manifest_version(dir.path()), "1.0.0");
    assert_eq!(*analyzer.seen.lock().unwrap(), vec!["c1", "c2", "c3"]);
}

#[tokio::test]
async fn test_patch_after_previous_release() {
    let dir = project();
    let analyzer = FixedAnalyzer::new(Some(BumpType::Patch));
    let verify_release = RecordingVerifier::passing();
    let events = Arc::new(Mutex::new(Vec::new()));
    let pipeline = ReleasePipeline::new(
        Arc::new(config(false)),
        plugins(
            FixedLastRelease::new(Some("1.4.2"), Some("c1")),
            analyzer.clone(),
            RecordingVerifier::passing(),
            verify_release.clone(),
        ),
        Arc::new(FakeRepo::new(history())),
        RecordingReporter {
            events: Arc::clone(&events),
        },
    );

    let outcome = pipeline.run_pre(dir.path()).await.unwrap();

    let PreOutcome::Written { release, .. } = outcome else {
        panic!("expected the version to be written");
    };
    assert_eq!(release.release_type, ReleaseType::Patch);
    assert_eq!(release.version, Version::new(1, 4, 3));
    assert_eq!(manifest_version(dir.path()), "1.4.3");

    // Only commits after the last release are analyzed.
    assert_eq!(*analyzer.seen.lock().unwrap(), vec!["c2", "c3"]);
    assert_eq!(verify_release.calls(), vec![Some("1.4.3".to_string())]);
    assert_eq!(
        *events.lock().unwrap(),
        vec!["next latest 1.4.3", "wrote package.json 1.4.3"]
    );
}

#[tokio::test]
async fn test_no_relevant_changes_leaves_manifest_untouched() {
    let dir = project();
    let verify_release = RecordingVerifier::passing();
    let pipeline = ReleasePipeline::new(
        Arc::new(config(false)),
        plugins(
            FixedLastRelease::new(Some("1.4.2"), Some("c1")),
            FixedAnalyzer::new(None),
            RecordingVerifier::passing(),
            verify_release.clone(),
        ),
        Arc::new(FakeRepo::new(history())),
        SilentReporter,
    );

    let err = pipeline.run_pre(dir.path()).await.unwrap_err();

    assert!(err.is_no_relevant_changes());
    assert_eq!(err.code(), "ENOCHANGE");
    assert_eq!(
        fs::read_to_string(dir.path().join("package.json")).unwrap(),
        MANIFEST
    );
    assert!(verify_release.calls().is_empty());
}

#[tokio::test]
async fn test_prepare_is_deterministic() {
    let pipeline = ReleasePipeline::new(
        Arc::new(config(true)),
        plugins(
            FixedLastRelease::new(Some("2.3.4"), Some("c2")),
            FixedAnalyzer::new(Some(BumpType::Minor)),
            RecordingVerifier::passing(),
            RecordingVerifier::passing(),
        ),
        Arc::new(FakeRepo::new(history())),
        SilentReporter,
    );

    let first = pipeline.prepare().await.unwrap();
    let second = pipeline.prepare().await.unwrap();

    assert_eq!(first.next_release, second.next_release);
    assert_eq!(first.next_release.version, Version::new(2, 4, 0));
    assert_eq!(first.commits, second.commits);
}

#[tokio::test]
async fn test_rerun_without_new_commits_releases_nothing() {
    let dir = project();
    let pipeline = ReleasePipeline::new(
        Arc::new(config(false)),
        plugins(
            FixedLastRelease::new(Some("1.4.3"), Some("c3")),
            FixedAnalyzer::new(Some(BumpType::Patch)),
            RecordingVerifier::passing(),
            RecordingVerifier::passing(),
        ),
        Arc::new(FakeRepo::new(history())),
        SilentReporter,
    );

    let err = pipeline.run_pre(dir.path()).await.unwrap_err();

    assert!(err.is_no_relevant_changes());
    assert_eq!(manifest_version(dir.path()), "0.0.0-development");
}

#[tokio::test]
async fn test_failed_preflight_aborts_before_history_is_read() {
    let dir = project();
    let repo = Arc::new(FakeRepo::new(history()));
    let last_release = FixedLastRelease::new(Some("1.0.0"), Some("c1"));
    let pipeline = ReleasePipeline::new(
        Arc::new(config(false)),
        plugins(
            last_release.clone(),
            FixedAnalyzer::new(Some(BumpType::Patch)),
            RecordingVerifier::failing("not on CI"),
            RecordingVerifier::passing(),
        ),
        repo.clone(),
        SilentReporter,
    );

    let err = pipeline.run_pre(dir.path()).await.unwrap_err();

    assert!(matches!(err, Error::Verification { ref message, .. } if message == "not on CI"));
    assert_eq!(repo.reads(), 0);
    assert_eq!(last_release.calls.load(Ordering::SeqCst), 0);
    assert_eq!(manifest_version(dir.path()), "0.0.0-development");
}

#[tokio::test]
async fn test_failed_preflight_is_a_warning_in_debug_mode() {
    let dir = project();
    let verify_conditions = RecordingVerifier::failing("not on CI");
    let pipeline = ReleasePipeline::new(
        Arc::new(config(true)),
        plugins(
            FixedLastRelease::new(Some("1.0.0"), Some("c1")),
            FixedAnalyzer::new(Some(BumpType::Major)),
            verify_conditions.clone(),
            RecordingVerifier::passing(),
        ),
        Arc::new(FakeRepo::new(history())),
        SilentReporter,
    );

    let outcome = pipeline.run_pre(dir.path()).await.unwrap();

    match outcome {
        PreOutcome::DryRun(release) => assert_eq!(release.version, Version::new(2, 0, 0)),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(verify_conditions.calls(), vec![None]);
    assert_eq!(manifest_version(dir.path()), "0.0.0-development");
}

#[tokio::test]
async fn test_failed_release_verification_is_fatal_in_debug_mode() {
    let dir = project();
    let pipeline = ReleasePipeline::new(
        Arc::new(config(true)),
        plugins(
            FixedLastRelease::new(Some("1.0.0"), Some("c1")),
            FixedAnalyzer::new(Some(BumpType::Minor)),
            RecordingVerifier::passing(),
            RecordingVerifier::failing("version already exists"),
        ),
        Arc::new(FakeRepo::new(history())),
        SilentReporter,
    );

    let err = pipeline.run_pre(dir.path()).await.unwrap_err();

    assert_eq!(err.code(), "EVERIFY");
    assert_eq!(manifest_version(dir.path()), "0.0.0-development");
}

#[tokio::test]
async fn test_last_release_outside_history_is_rejected() {
    let pipeline = ReleasePipeline::new(
        Arc::new(config(false)),
        plugins(
            FixedLastRelease::new(Some("1.0.0"), Some("deadbeef")),
            FixedAnalyzer::new(Some(BumpType::Patch)),
            RecordingVerifier::passing(),
            RecordingVerifier::passing(),
        ),
        Arc::new(FakeRepo::new(history())),
        SilentReporter,
    );

    let err = pipeline.prepare().await.unwrap_err();

    match err {
        Error::NotInHistory { hash, branch } => {
            assert_eq!(hash, "deadbeef");
            assert_eq!(branch, "master");
        }
        other => panic!("unexpected error: {other}"),
    }
}
