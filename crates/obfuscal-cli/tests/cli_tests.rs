//! Integration tests for the `obfuscal` CLI binary.
//!
//! These tests use `assert_cmd` and `predicates` to exercise the obfuscate,
//! summary and check subcommands through the actual binary, including stdin
//! piping, file I/O, flag overrides and error handling.

// `Command::cargo_bin` was deprecated in assert_cmd 2.1.2 in favor of
// `cargo::cargo_bin_cmd!`. Allow it until we migrate.
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn obfuscal() -> Command {
    let mut cmd = Command::cargo_bin("obfuscal").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Private details that appear in the fixtures and must never be published.
const SECRETS: &[&str] = &[
    "Doctor",
    "Annual check-up",
    "Health Clinic",
    "Interview",
    "Acme",
    "School recital",
    "work-1@example.com",
];

// ─────────────────────────────────────────────────────────────────────────────
// Obfuscate subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn obfuscate_files_to_stdout() {
    let output = obfuscal()
        .args(["obfuscate", "-c", &fixture("config.toml")])
        .args(["-i", &fixture("work.ics"), "-i", &fixture("personal.ics")])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).unwrap();

    assert!(text.starts_with("BEGIN:VCALENDAR"));
    assert!(text.contains("PRODID:-//Obfuscal//Obfuscal Engine"));
    // Doctor at 09:30 Berlin marks the morning section, 08:00-12:00 CET.
    assert!(text.contains("FREEBUSY;FBTYPE=FREE:20240304T070000Z/20240304T110000Z"));
    // The personal calendar's 16:00 CET meeting marks the afternoon section.
    assert!(text.contains("FREEBUSY;FBTYPE=FREE:20240304T120000Z/20240304T170000Z"));
    // The hidden interview on Tuesday afternoon leaves no trace.
    assert!(!text.contains("20240305T120000Z/20240305T170000Z"));
    assert_eq!(text.matches("BEGIN:VFREEBUSY").count(), 2);

    for secret in SECRETS {
        assert!(!text.contains(secret), "leaked {secret}");
    }
}

#[test]
fn shown_events_are_copied_per_occurrence() {
    obfuscal()
        .args(["obfuscate", "-c", &fixture("config.toml"), "-i", &fixture("work.ics")])
        .assert()
        .success()
        .stdout(predicate::str::contains("SUMMARY:Team standup"))
        .stdout(predicate::str::contains("DTSTART:20240305T080000Z"))
        .stdout(predicate::str::contains("DTSTART:20240306T080000Z"))
        .stdout(predicate::str::contains("RRULE").not())
        .stdout(predicate::str::contains("daily standup").not());
}

#[test]
fn obfuscate_stdin_to_stdout() {
    let input = std::fs::read_to_string(fixture("personal.ics")).unwrap();
    obfuscal()
        .args(["obfuscate", "-c", &fixture("config.toml")])
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains("20240304T120000Z/20240304T170000Z"))
        .stdout(predicate::str::contains("School recital").not());
}

#[test]
fn obfuscate_file_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("shared.ics");

    obfuscal()
        .args(["obfuscate", "-c", &fixture("config.toml"), "-i", &fixture("work.ics")])
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let content = std::fs::read_to_string(&out).expect("output file must exist");
    assert!(content.contains("BEGIN:VFREEBUSY"));
    assert!(!content.contains("Doctor"));
}

#[test]
fn flags_override_config() {
    obfuscal()
        .args(["obfuscate", "-c", &fixture("config.toml"), "-i", &fixture("work.ics")])
        .args(["--timezone", "UTC", "--section", "08:00-10:00", "--fbtype", "busy"])
        .assert()
        .success()
        // Doctor is 08:30-09:15 UTC.
        .stdout(predicate::str::contains("FREEBUSY;FBTYPE=BUSY:20240304T080000Z/20240304T100000Z"))
        .stdout(predicate::str::contains("FBTYPE=FREE").not());
}

#[test]
fn runs_without_a_config_file() {
    obfuscal()
        .args(["obfuscate", "-i", &fixture("personal.ics")])
        .args(["--start", "2024-03-04", "--end", "2024-03-05", "--section", "13:00-18:00"])
        .assert()
        .success()
        .stdout(predicate::str::contains("20240304T130000Z/20240304T180000Z"));
}

#[test]
fn shrinking_the_timeframe_drops_blocks() {
    // `end` is the first day without sections.
    obfuscal()
        .args(["obfuscate", "-c", &fixture("config.toml"), "-i", &fixture("personal.ics")])
        .args(["--start", "2024-03-05"])
        .assert()
        .success()
        .stdout(predicate::str::contains("BEGIN:VFREEBUSY").not());
}

#[test]
fn verbose_logs_go_to_stderr() {
    obfuscal()
        .args(["-v", "obfuscate", "-c", &fixture("config.toml"), "-i", &fixture("work.ics")])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("BEGIN:VCALENDAR"))
        .stderr(predicate::str::contains("obfuscated"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Error handling
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn missing_input_file_fails() {
    obfuscal()
        .args(["obfuscate", "-c", &fixture("config.toml"), "-i", "/nonexistent/cal.ics"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read file"));
}

#[test]
fn missing_config_file_fails() {
    obfuscal()
        .args(["obfuscate", "-c", "/nonexistent/obfuscal.toml"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config"));
}

#[test]
fn missing_timeframe_is_reported() {
    obfuscal()
        .args(["obfuscate", "--section", "08:00-12:00"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("timeframe start is required"));
}

#[test]
fn reversed_section_is_rejected_by_the_parser() {
    obfuscal()
        .args(["check", "-c", &fixture("config.toml"), "--section", "12:00-08:00"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--section"));
}

#[test]
fn overlapping_sections_are_rejected() {
    obfuscal()
        .args(["check", "-c", &fixture("config.toml")])
        .args(["--section", "08:00-12:00", "--section", "11:00-13:00"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("overlap"));
}

#[test]
fn unknown_timezone_is_rejected() {
    obfuscal()
        .args(["check", "-c", &fixture("config.toml"), "--timezone", "Mars/Olympus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Mars/Olympus"));
}

#[test]
fn malformed_calendar_fails_without_output() {
    obfuscal()
        .args(["obfuscate", "-c", &fixture("config.toml")])
        .write_stdin("BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nDTSTART:not-a-date\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n")
        .assert()
        .failure()
        .stdout(predicate::str::is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Summary and check subcommands
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn summary_of_generated_calendar() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("shared.ics");

    obfuscal()
        .args(["obfuscate", "-c", &fixture("config.toml")])
        .args(["-i", &fixture("work.ics"), "-i", &fixture("personal.ics")])
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    let output = obfuscal()
        .arg("summary")
        .arg("-i")
        .arg(&out)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value = serde_json::from_slice(&output).expect("summary must be JSON");
    let events = json["events"].as_array().unwrap();
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e["summary"] == "Team standup"));
    assert!(events.iter().all(|e| e["isMultiDay"] == false));
    assert_eq!(json["busy"].as_array().unwrap().len(), 2);
}

#[test]
fn summary_from_stdin() {
    let input = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nBEGIN:VEVENT\r\nUID:1\r\n\
                 DTSTART;VALUE=DATE:20240304\r\nDTEND;VALUE=DATE:20240306\r\n\
                 SUMMARY:Offsite\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
    obfuscal()
        .arg("summary")
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"isMultiDay\": true"))
        .stdout(predicate::str::contains("\"start\": \"2024-03-04\""))
        .stdout(predicate::str::contains("busy").not());
}

#[test]
fn check_prints_section_grid() {
    obfuscal()
        .args(["check", "-c", &fixture("config.toml")])
        .assert()
        .success()
        .stdout(predicate::str::contains("timezone:  Europe/Berlin"))
        .stdout(predicate::str::contains("sections:  08:00-12:00, 13:00-18:00"))
        .stdout(predicate::str::contains("fbtype:    FREE"))
        .stdout(predicate::str::contains("slots:     6"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and version
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn help_lists_subcommands() {
    obfuscal()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("obfuscate"))
        .stdout(predicate::str::contains("summary"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn version_flag_works() {
    obfuscal()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("obfuscal"));
}
