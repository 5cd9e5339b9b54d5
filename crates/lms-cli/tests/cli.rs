use lms_cli::{build_cli, exit_code, read_edit, submit_edit, AppConfig, ConfigError};
use lms_core::SubmissionStatus;
use lms_model::{CourseId, NodeKey};
use lms_remote::{RemoteError, RemoteResourceClient};
use lms_test_utils::{new_course, Op, RecordingClient};
use pretty_assertions::assert_eq;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn temp_file(contents: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn config_file_sections_are_read() {
    let file = temp_file(
        r#"
[client]
base_url = "https://admin.example.com/api"
api_token = "abc"

[submission]
call_timeout_secs = 15
"#,
        ".toml",
    );

    let config = AppConfig::from_file(file.path()).unwrap();

    assert_eq!(config.client.base_url, "https://admin.example.com/api");
    assert_eq!(config.client.api_token.as_deref(), Some("abc"));
    // Unset keys keep their defaults.
    assert_eq!(config.client.request_timeout_secs, 30);
    assert_eq!(config.submission.call_timeout_secs, 15);
}

#[test]
fn explicit_missing_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    assert!(matches!(
        AppConfig::load(Some(&missing)),
        Err(ConfigError::Read { .. })
    ));
}

#[test]
fn malformed_config_reports_the_file() {
    let file = temp_file("[client\nbase_url = 3", ".toml");
    let err = AppConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains(&file.path().display().to_string()));
}

#[test]
fn edit_file_is_parsed_with_backend_names() {
    let file = temp_file(
        r#"{"id": 0, "title": "Intro", "chapters": [
            {"title": "One", "order": 1, "lectures": [{"id": 12, "title": "L", "media_url": "u", "media_type": "audio"}]}
        ]}"#,
        ".json",
    );

    let edit = read_edit(file.path()).unwrap();

    assert!(edit.key.is_new());
    assert_eq!(edit.chapters.len(), 1);
    assert!(!edit.chapters[0].lectures[0].key.is_new());
}

#[test]
fn invalid_edit_file_is_an_error() {
    let file = temp_file("{\"chapters\": 3}", ".json");
    let err = read_edit(file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("invalid course edit"));
}

#[test]
fn global_flags_work_after_the_subcommand() {
    let matches = build_cli()
        .try_get_matches_from(["lms", "submit", "edit.json", "--config", "alt.toml", "--log-json"])
        .unwrap();

    assert!(matches.get_flag("log-json"));
    assert_eq!(
        matches.get_one::<PathBuf>("config"),
        Some(&PathBuf::from("alt.toml"))
    );
    let (name, args) = matches.subcommand().unwrap();
    assert_eq!(name, "submit");
    assert_eq!(args.get_one::<PathBuf>("edit"), Some(&PathBuf::from("edit.json")));
}

#[test]
fn plan_requires_an_edit_file() {
    assert!(build_cli().try_get_matches_from(["lms", "plan"]).is_err());
}

#[test]
fn exit_codes_separate_partial_from_total_failure() {
    assert_eq!(exit_code(SubmissionStatus::Complete), 0);
    assert_eq!(exit_code(SubmissionStatus::PartialTree), 2);
    assert_eq!(exit_code(SubmissionStatus::CourseFailed), 1);
    assert_eq!(exit_code(SubmissionStatus::Cancelled), 1);
}

#[tokio::test]
async fn submit_edit_reports_partial_tree() {
    let client = Arc::new(RecordingClient::new().fail_nth(
        Op::CreateChapter,
        1,
        RemoteError::status(500, "db down"),
    ));
    let mut edit = new_course(&[1, 1]);

    let result = submit_edit(
        Arc::clone(&client) as Arc<dyn RemoteResourceClient>,
        &AppConfig::default(),
        &edit,
        CancellationToken::new(),
    )
    .await;

    assert_eq!(result.status(), SubmissionStatus::PartialTree);
    assert_eq!(exit_code(result.status()), 2);
    assert_eq!(result.adopt_ids(&mut edit), 3);
    assert_eq!(edit.key, NodeKey::Existing(CourseId(100)));
}
