//! Runs the `pubgen` binary against the fixtures.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures").join(name)
}

fn pubgen(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pubgen"))
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to run pubgen")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn build_writes_pages_and_prints_summary() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("_publications");
    let input = fixture("publications.json");

    let output = pubgen(
        tmp.path(),
        &[
            "build",
            "--input",
            input.to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let text = stdout(&output);
    assert!(text.contains("#1 (Paper Title Number 1) \u{2192} 2009-10-01-paper-title-number-1.md"));
    assert!(text.contains("Wrote 3 pages, skipped 0 records, 0 collisions"));
    assert!(out.join("2015-10-01-paper-title-number-3.md").is_file());
}

#[test]
fn check_does_not_create_output() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("_publications");
    let input = fixture("publications.tsv");

    let output = pubgen(
        tmp.path(),
        &[
            "check",
            "--input",
            input.to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
        ],
    );
    assert!(output.status.success());
    assert!(stdout(&output).contains("Would write 3 pages"));
    assert!(!out.exists());
}

#[test]
fn unsupported_input_fails() {
    let tmp = TempDir::new().unwrap();
    let output = pubgen(tmp.path(), &["build", "--input", "pubs.xml"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("pubs.xml"));
}

#[test]
fn gen_config_output_is_a_valid_config() {
    let tmp = TempDir::new().unwrap();
    let output = pubgen(tmp.path(), &["gen-config"]);
    assert!(output.status.success());
    std::fs::write(tmp.path().join("pubgen.toml"), &output.stdout).unwrap();

    // The generated file is picked up from the working directory.
    let json = fixture("publications.json");
    let out = tmp.path().join("out");
    let output = pubgen(
        tmp.path(),
        &[
            "check",
            "--input",
            json.to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
}

#[test]
fn unknown_config_key_is_rejected() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("pubgen.toml"), "colection = \"typo\"\n").unwrap();
    let output = pubgen(tmp.path(), &["check"]);
    assert!(!output.status.success());
}

#[test]
fn no_strict_flag_overrides_config_file() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("pubgen.toml"), "strict = true\n").unwrap();
    std::fs::write(
        tmp.path().join("pubs.csv"),
        "date,urlslug,title,venue\n2020-01-01,ok,Fine,Conf\n2020-02-01,bad,No venue,\n",
    )
    .unwrap();
    let args = ["check", "--input", "pubs.csv", "--output", "out"];

    let strict = pubgen(tmp.path(), &args);
    assert!(!strict.status.success());

    let mut relaxed_args = args.to_vec();
    relaxed_args.push("--no-strict");
    let relaxed = pubgen(tmp.path(), &relaxed_args);
    assert!(relaxed.status.success(), "{}", String::from_utf8_lossy(&relaxed.stderr));
    assert!(stdout(&relaxed).contains("Would write 1 page, skipped 1 record, 0 collisions"));

    // The last of the two flags wins.
    relaxed_args.push("--strict");
    assert!(!pubgen(tmp.path(), &relaxed_args).status.success());
}
