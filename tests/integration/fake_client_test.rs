//! Runner tests against shell scripts standing in for `psql`.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use pgscript::config::ConnectionParams;
use pgscript::result::Outcome;
use pgscript::runner::{ClassificationMode, SqlRunner};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use super::spawn_lock;

/// Writes an executable fake client and returns its path.
fn fake_client(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("fake-psql");
    std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

fn runner_for(client: &Path) -> SqlRunner {
    SqlRunner::new().client(client.to_string_lossy())
}

const PRINT_ARGS: &str = r#"for a in "$@"; do printf '%s\n' "$a"; done
"#;

#[test]
fn test_argument_list() {
    let _guard = spawn_lock();
    let dir = tempfile::tempdir().unwrap();
    let client = fake_client(&dir, PRINT_ARGS);

    let params = ConnectionParams::new("select 1;")
        .with_host("db.example.com")
        .with_port("6432")
        .with_user("deploy")
        .with_dbname("app")
        .with_options(["-v", "ON_ERROR_STOP=1"]);
    let result = runner_for(&client).run(&params);

    assert_eq!(result.outcome, Outcome::Changed);
    let args: Vec<&str> = result.msg.lines().collect();
    assert_eq!(args.len(), 12);
    assert_eq!(
        &args[..8],
        ["-h", "db.example.com", "-p", "6432", "-U", "deploy", "-d", "app"]
    );
    assert_eq!(args[8], "-f");
    assert_eq!(&args[10..], ["-v", "ON_ERROR_STOP=1"]);

    // The script file is gone once the run returns
    assert!(!Path::new(args[9]).exists());
}

#[test]
fn test_client_reads_script_file() {
    let _guard = spawn_lock();
    let dir = tempfile::tempdir().unwrap();
    let client = fake_client(
        &dir,
        r#"while [ $# -gt 0 ]; do
  if [ "$1" = "-f" ]; then cat "$2"; fi
  shift
done
"#,
    );

    let result = runner_for(&client).run(&ConnectionParams::new("select 1;\nselect 2;\n"));
    assert_eq!(result.msg, "select 1;\nselect 2;");
}

#[test]
fn test_select_one_scenario() {
    let _guard = spawn_lock();
    let dir = tempfile::tempdir().unwrap();
    let client = fake_client(&dir, "printf '1\\n(1 row)\\n'\n");

    let result = runner_for(&client).run(&ConnectionParams::new("select 1;"));
    assert_eq!(result.outcome, Outcome::Changed);
    assert_eq!(result.rc, 0);
    assert_eq!(result.msg, "1\n(1 row)");
    assert_eq!(result.host, "localhost");
    assert_eq!(result.port, "5432");
    assert_eq!(result.dbname, "postgres");
    assert_eq!(result.user, "postgres");
}

#[test]
fn test_missing_relation_scenario() {
    let _guard = spawn_lock();
    let dir = tempfile::tempdir().unwrap();
    let record = dir.path().join("script-path");
    let client = fake_client(
        &dir,
        &format!(
            r#"while [ $# -gt 0 ]; do
  if [ "$1" = "-f" ]; then printf '%s' "$2" > '{}'; fi
  shift
done
echo 'ERROR: relation "nonexistent" does not exist' >&2
exit 1
"#,
            record.display()
        ),
    );

    let result = runner_for(&client).run(&ConnectionParams::new("select * from nonexistent;"));
    assert_eq!(result.outcome, Outcome::Failed);
    assert_eq!(result.rc, 1);
    assert_eq!(result.msg, "ERROR: relation \"nonexistent\" does not exist");

    // The script file is gone after a failed run too
    let script_path = std::fs::read_to_string(&record).unwrap();
    assert!(script_path.ends_with(".sql"));
    assert!(!Path::new(&script_path).exists());
}

#[test]
fn test_nonzero_exit_without_error_marker() {
    let _guard = spawn_lock();
    let dir = tempfile::tempdir().unwrap();
    let client = fake_client(
        &dir,
        "echo 'psql: could not connect to server' >&2\necho partial\nexit 2\n",
    );
    let params = ConnectionParams::new("select 1;");

    let legacy = runner_for(&client).run(&params);
    assert_eq!(legacy.outcome, Outcome::Changed);
    assert_eq!(legacy.rc, 2);
    assert_eq!(legacy.msg, "partial");

    let strict = runner_for(&client)
        .mode(ClassificationMode::Strict)
        .run(&params);
    assert_eq!(strict.outcome, Outcome::Failed);
    assert_eq!(strict.msg, "psql: could not connect to server");
}

#[test]
fn test_password_passed_through_environment() {
    let _guard = spawn_lock();
    let dir = tempfile::tempdir().unwrap();
    let client = fake_client(
        &dir,
        r#"printf 'PGPASSWORD=%s\n' "$PGPASSWORD"
for a in "$@"; do printf '%s\n' "$a"; done
"#,
    );
    let before = std::env::var("PGPASSWORD").ok();

    let params = ConnectionParams::new("select 1;").with_password("youguess");
    let result = runner_for(&client).run(&params);

    let mut lines = result.msg.lines();
    assert_eq!(lines.next(), Some("PGPASSWORD=youguess"));
    assert!(lines.all(|arg| !arg.contains("youguess")));
    assert_eq!(std::env::var("PGPASSWORD").ok(), before);
}

#[test]
fn test_missing_client_binary() {
    let _guard = spawn_lock();
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("no-such-psql");

    let result = runner_for(&missing).run(&ConnectionParams::new("select 1;"));
    assert_eq!(result.outcome, Outcome::Failed);
    assert_eq!(result.rc, 2);
    assert!(result.msg.contains("no-such-psql"));
}
