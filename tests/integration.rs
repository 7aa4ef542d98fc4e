use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const GDPR_TEXT: &str = "\
REGULATION (EU) 2016/679 OF THE EUROPEAN PARLIAMENT AND OF THE COUNCIL

Whereas:

- (1) The protection of natural persons in relation to the processing of personal data is a fundamental right.
- (2) The principles of the protection of natural persons should respect their fundamental rights and freedoms.

CHAPTER I
General provisions

Article 1
Subject-matter and objectives
1. This Regulation lays down rules relating to the protection of natural persons.
2. This Regulation protects fundamental rights and freedoms of natural persons.

CHAPTER III
Rights of the data subject

Article 17
Right to erasure
1. The data subject shall have the right to obtain from the controller the erasure of personal data.
";

const HIPAA_TEXT: &str = "\
45 CFR Parts 160, 162, and 164

PART 160—GENERAL ADMINISTRATIVE REQUIREMENTS

Subpart A—General Provisions

§ 160.101 Statutory basis and purpose.
The requirements of this subchapter implement sections 1171-1180 of the Social Security Act.

§ 160.102 Applicability.
(a) Except as otherwise provided, the standards apply to health plans.

PART 164—SECURITY AND PRIVACY

Subpart C—Security Standards for the Protection of Electronic Protected Health Information

§ 164.302 Applicability.
A covered entity must comply with the applicable standards.
";

fn regchunk_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("regchunk");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let files_dir = root.join("files");
    fs::create_dir_all(files_dir.join("us")).unwrap();
    fs::write(files_dir.join("gdpr.txt"), GDPR_TEXT).unwrap();
    fs::write(files_dir.join("us/hipaa.md"), HIPAA_TEXT).unwrap();
    fs::write(files_dir.join("readme.csv"), "not,a,regulation").unwrap();

    let config_content = r#"[parser]
default_dialect = "gdpr"

[chunking]
target_size = 800
max_size = 1200
min_size = 200
overlap_budget = 100

[ingest]
include_globs = ["**/*.txt", "**/*.md"]
exclude_globs = []
"#;

    let config_path = config_dir.join("regchunk.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_regchunk(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = regchunk_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run regchunk binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn file_arg(config_path: &Path, rel: &str) -> String {
    config_path
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("files")
        .join(rel)
        .to_string_lossy()
        .to_string()
}

#[test]
fn test_detect_dialects() {
    let (_tmp, config_path) = setup_test_env();

    let gdpr = file_arg(&config_path, "gdpr.txt");
    let (stdout, stderr, success) = run_regchunk(&config_path, &["detect", &gdpr]);
    assert!(success, "detect failed: stdout={}, stderr={}", stdout, stderr);
    assert_eq!(stdout.trim(), "gdpr");

    let hipaa = file_arg(&config_path, "us/hipaa.md");
    let (stdout, _, success) = run_regchunk(&config_path, &["detect", &hipaa]);
    assert!(success);
    assert_eq!(stdout.trim(), "hipaa");
}

#[test]
fn test_sections_outline() {
    let (_tmp, config_path) = setup_test_env();
    let hipaa = file_arg(&config_path, "us/hipaa.md");

    let (stdout, stderr, success) = run_regchunk(&config_path, &["sections", &hipaa]);
    assert!(success, "sections failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("dialect: hipaa"));
    assert!(stdout.contains("sections: 7"));
    assert!(stdout.contains("SECTION 160.101 Statutory basis and purpose."));
    assert!(stdout.contains("SUBPART C Security Standards"));
}

#[test]
fn test_sections_json_with_forced_dialect() {
    let (_tmp, config_path) = setup_test_env();
    let gdpr = file_arg(&config_path, "gdpr.txt");

    let (stdout, stderr, success) =
        run_regchunk(&config_path, &["sections", &gdpr, "--dialect", "gdpr", "--json"]);
    assert!(success, "sections failed: stdout={}, stderr={}", stdout, stderr);

    let sections: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    let keys: Vec<&str> = sections.iter().map(|s| s["key"].as_str().unwrap()).collect();
    assert_eq!(
        keys,
        vec![
            "recital:1",
            "recital:2",
            "chapter:I",
            "article:I/1",
            "chapter:III",
            "article:III/17"
        ]
    );
    assert_eq!(sections[5]["title"], "Right to erasure");
    assert_eq!(sections[5]["parent_id"], "III");
}

#[test]
fn test_chunk_jsonl_to_file() {
    let (tmp, config_path) = setup_test_env();
    let hipaa = file_arg(&config_path, "us/hipaa.md");
    let out = tmp.path().join("out/hipaa.jsonl");

    let (stdout, stderr, success) = run_regchunk(
        &config_path,
        &["chunk", &hipaa, "--format", "jsonl", "--output", out.to_str().unwrap()],
    );
    assert!(success, "chunk failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stderr.contains("Wrote 7 chunks from 7 sections (hipaa)"));

    let content = fs::read_to_string(&out).unwrap();
    let records: Vec<serde_json::Value> = content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(records.len(), 7);

    let section = records
        .iter()
        .find(|r| r["chunk_id"] == "section:160.A/160.101#0")
        .expect("section 160.101 chunk");
    assert_eq!(section["metadata"]["document_type"], "hipaa");
    assert_eq!(section["metadata"]["regulation"], "45 CFR Parts 160, 162, and 164");
    assert_eq!(section["metadata"]["chunk_type"], "full_section");
    assert!(!section["lead_context"].as_str().unwrap().is_empty());
    assert!(!section["trail_context"].as_str().unwrap().is_empty());
}

#[test]
fn test_chunk_text_to_stdout() {
    let (_tmp, config_path) = setup_test_env();
    let gdpr = file_arg(&config_path, "gdpr.txt");

    let (stdout, stderr, success) = run_regchunk(&config_path, &["chunk", &gdpr]);
    assert!(success, "chunk failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("=== article:III/17#0"));
    assert!(stdout.contains("[ARTICLE 17: Right to erasure]"));
}

#[test]
fn test_ingest_directory() {
    let (tmp, config_path) = setup_test_env();
    let dir = tmp.path().join("files");
    let out = tmp.path().join("chunks.jsonl");

    let (stdout, stderr, success) = run_regchunk(
        &config_path,
        &["ingest", dir.to_str().unwrap(), "--output", out.to_str().unwrap()],
    );
    assert!(success, "ingest failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stderr.contains("documents: 2"));

    let content = fs::read_to_string(&out).unwrap();
    let sources: Vec<String> = content
        .lines()
        .map(|l| {
            let v: serde_json::Value = serde_json::from_str(l).unwrap();
            v["source"].as_str().unwrap().to_string()
        })
        .collect();
    assert!(!sources.is_empty());
    // Path order: gdpr.txt before us/hipaa.md, never interleaved.
    let first_hipaa = sources.iter().position(|s| s.ends_with("hipaa.md")).unwrap();
    assert!(sources[..first_hipaa].iter().all(|s| s == "gdpr.txt"));
    assert!(sources[first_hipaa..].iter().all(|s| s.ends_with("hipaa.md")));
}

#[test]
fn test_stats_command() {
    let (_tmp, config_path) = setup_test_env();
    let gdpr = file_arg(&config_path, "gdpr.txt");

    let (stdout, stderr, success) = run_regchunk(&config_path, &["stats", &gdpr]);
    assert!(success, "stats failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Dialect:     gdpr (EU 2016/679)"));
    assert!(stdout.contains("Sections:    6"));
    assert!(stdout.contains("oversized: 0"));
}

#[test]
fn test_missing_config_uses_defaults() {
    let (tmp, _config_path) = setup_test_env();
    let missing = tmp.path().join("nope.toml");
    let gdpr = tmp.path().join("files/gdpr.txt");

    let (stdout, stderr, success) = run_regchunk(&missing, &["detect", gdpr.to_str().unwrap()]);
    assert!(success, "detect failed: stdout={}, stderr={}", stdout, stderr);
    assert_eq!(stdout.trim(), "gdpr");
}

#[test]
fn test_invalid_config_rejected() {
    let (tmp, _config_path) = setup_test_env();
    let bad = tmp.path().join("bad.toml");
    fs::write(&bad, "[chunking]\ntarget_size = 900\nmax_size = 100\n").unwrap();
    let gdpr = tmp.path().join("files/gdpr.txt");

    let (_, stderr, success) = run_regchunk(&bad, &["chunk", gdpr.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("max_size"));
}

#[test]
fn test_empty_document_fails() {
    let (tmp, config_path) = setup_test_env();
    let empty = tmp.path().join("files/empty.txt");
    fs::write(&empty, "  \n\n").unwrap();

    let (_, stderr, success) = run_regchunk(&config_path, &["chunk", empty.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("empty"));
}

#[test]
fn test_unsupported_extension_fails() {
    let (tmp, config_path) = setup_test_env();
    let csv = tmp.path().join("files/readme.csv");

    let (_, stderr, success) = run_regchunk(&config_path, &["chunk", csv.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("Unsupported file type"));
}
