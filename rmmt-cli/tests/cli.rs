//! End-to-end tests driving the compiled `rmmt-cli` binary against the
//! literal scenarios in spec §8.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

fn fixture(name: &str, contents: &[u8]) -> PathBuf {
    let dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR"));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_rmmt-cli"))
}

/// S1: an input not larger than one chunk is a fatal configuration error.
#[test]
fn s1_small_input_is_rejected_with_nonzero_exit() {
    let path = fixture("s1.bp", b"(()())");

    let output = bin().arg(&path).output().unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("256"), "stderr should mention the chunk size: {stderr}");
}

/// S2, timing mode: the stdout line has the `<workers>,<path>,<n>,<seconds>`
/// shape and reports the correct byte count.
#[test]
fn s2_timing_mode_reports_workers_path_n_and_seconds() {
    let mut bytes = vec![b'('; 260];
    bytes.extend(std::iter::repeat_n(b')', 260));
    let path = fixture("s2.bp", &bytes);

    let output = bin().arg(&path).arg("--workers").arg("4").output().unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout.trim();
    let fields: Vec<&str> = line.split(',').collect();
    assert_eq!(fields.len(), 4, "line was {line:?}");
    assert_eq!(fields[0], "4");
    assert_eq!(fields[2], "520");
    fields[3].parse::<f64>().expect("seconds field should parse as a float");
}

/// S2, memory mode: the stdout line has all seven comma-separated fields and
/// the byte counters move in a sane direction.
#[test]
fn s2_memory_mode_reports_seven_fields() {
    let mut bytes = vec![b'('; 260];
    bytes.extend(std::iter::repeat_n(b')', 260));
    let path = fixture("s2_mem.bp", &bytes);

    let output = bin().arg(&path).arg("--mode").arg("memory").output().unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout.trim();
    let fields: Vec<&str> = line.split(',').collect();
    assert_eq!(fields.len(), 7, "line was {line:?}");
    assert_eq!(fields[1], "520");

    let mem_total_start: u64 = fields[2].parse().unwrap();
    let mem_total_end: u64 = fields[3].parse().unwrap();
    let mem_peak: u64 = fields[4].parse().unwrap();
    assert!(mem_total_end >= mem_total_start, "allocations only accumulate");
    assert!(mem_peak > 0, "building an index over 520 bits allocates something");
}

/// A missing file is a fatal I/O error, not a panic.
#[test]
fn missing_file_is_an_io_error() {
    let path = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("does-not-exist.bp");

    let output = bin().arg(&path).output().unwrap();

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.to_lowercase().contains("failed to read"), "stderr: {stderr}");
}
