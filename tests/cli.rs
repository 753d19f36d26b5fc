//! Command line tests
//!
//! Runs the `pagescript` binary against a temporary preference directory.

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

struct CliContext {
    dir: TempDir,
}

impl CliContext {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    fn prefs_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("prefs")
    }

    fn blob_path(&self) -> std::path::PathBuf {
        self.prefs_dir().join("savedScripts.json")
    }

    fn write_blob(&self, bytes: &[u8]) {
        std::fs::create_dir_all(self.prefs_dir()).expect("Failed to create prefs dir");
        std::fs::write(self.blob_path(), bytes).expect("Failed to write blob");
    }

    fn run(&self, args: &[&str]) -> Output {
        run_in(self.dir.path(), &self.prefs_dir(), args)
    }

    /// Run and require success, returning stdout.
    fn ok(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "pagescript {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).expect("stdout is not utf-8")
    }
}

fn run_in(cwd: &Path, prefs: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pagescript"))
        .args(args)
        .current_dir(cwd)
        .env("PAGESCRIPT_STORAGE__BACKEND", "file")
        .env("PAGESCRIPT_STORAGE__DIRECTORY", prefs)
        .env_remove("PAGESCRIPT_STORAGE__KEY")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run pagescript")
}

#[test]
fn test_set_get_list_remove() {
    let cli = CliContext::new();

    assert_eq!(cli.ok(&["get", "https://example.com"]), "\n");

    cli.ok(&["set", "https://example.com", "document.title = 'x';"]);
    cli.ok(&["set", "https://other.example", "--canned", "1"]);

    assert_eq!(
        cli.ok(&["get", "https://example.com"]),
        "document.title = 'x';\n"
    );
    assert_eq!(
        cli.ok(&["get", "https://other.example"]),
        "alert('Nice to see you!')\n"
    );
    assert_eq!(
        cli.ok(&["list"]),
        "https://example.com\t21 bytes\nhttps://other.example\t25 bytes\n"
    );

    cli.ok(&["remove", "https://example.com"]);
    assert_eq!(cli.ok(&["get", "https://example.com"]), "\n");
    assert_eq!(cli.ok(&["list"]), "https://other.example\t25 bytes\n");
}

#[test]
fn test_corrupt_blob_does_not_block_get_or_set() {
    let cli = CliContext::new();
    cli.write_blob(b"\xde\xad");

    let output = cli.run(&["get", "https://example.com"]);
    assert!(output.status.success());
    assert_eq!(output.stdout, b"\n");
    assert!(String::from_utf8_lossy(&output.stderr).contains("warning"));

    assert_eq!(cli.ok(&["list"]), "");

    cli.ok(&["set", "https://example.com", "x()"]);
    assert_eq!(cli.ok(&["get", "https://example.com"]), "x()\n");
}

#[test]
fn test_remove_on_corrupt_blob_replaces_it() {
    let cli = CliContext::new();
    cli.write_blob(b"{not json");

    cli.ok(&["remove", "https://example.com"]);

    assert_eq!(std::fs::read(cli.blob_path()).unwrap(), b"{}");
}

#[test]
fn test_unknown_canned_index_fails() {
    let cli = CliContext::new();

    let output = cli.run(&["set", "https://example.com", "--canned", "9"]);

    assert!(!output.status.success());
    assert!(!cli.blob_path().exists());
}

#[test]
fn test_catalog_lists_canned_scripts() {
    let cli = CliContext::new();
    assert_eq!(
        cli.ok(&["catalog"]),
        "0\talert('Hello world!')\n1\talert('Nice to see you!')\n"
    );
}

#[test]
fn test_bridge_over_stdio() {
    use std::io::Write;
    use std::process::Stdio;

    let cli = CliContext::new();
    let mut child = Command::new(env!("CARGO_BIN_EXE_pagescript"))
        .arg("bridge")
        .current_dir(cli.dir.path())
        .env("PAGESCRIPT_STORAGE__DIRECTORY", cli.prefs_dir())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to spawn bridge");

    {
        let mut stdin = child.stdin.take().expect("no stdin");
        stdin
            .write_all(
                concat!(
                    r#"{"type":"begin","item":{"title":"Example","URL":"https://example.com"}}"#,
                    "\n",
                    r#"{"type":"select","index":0}"#,
                    "\n",
                )
                .as_bytes(),
            )
            .unwrap();
    }

    let output = child.wait_with_output().expect("bridge did not exit");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.lines().count(), 2);
    assert!(stdout.contains(r#""customJavaScript":"alert('Hello world!')""#));

    assert_eq!(
        cli.ok(&["get", "https://example.com"]),
        "alert('Hello world!')\n"
    );
}
