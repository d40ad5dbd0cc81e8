//! Capsule validation against the bundled JSON Schema.
//!
//! Files named `_*.json` (templates, scratch), `*.jsonc`, and `*.proof.json`
//! companions are skipped. Every other `*.json` file in the directory is checked
//! against [`CAPSULE_SCHEMA`] (draft 2020-12, with `date-time` format checks)
//! and must carry the configured `version`. Messages read `$<path>: <problem>`.

use std::path::{Path, PathBuf};

use jsonschema::Validator;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ValidateError, ValidateResult};
use crate::paths;

/// JSON Schema every exported capsule record satisfies.
pub const CAPSULE_SCHEMA: &str = include_str!("../../schema/capsule.schema.json");

/// Outcome for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    pub file: String,
    pub status: FileStatus,
    pub messages: Vec<String>,
}

/// Machine-readable summary of a validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub dir: String,
    pub validated: Vec<FileReport>,
    pub ignored: Vec<String>,
    pub invalid_total: usize,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.invalid_total == 0
    }

    /// Write the report as pretty JSON, creating parent directories.
    pub fn write_json(&self, path: &Path) -> ValidateResult<()> {
        let report_err = |e| ValidateError::Report {
            path: path.display().to_string(),
            source: e,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(report_err)?;
        }
        let text = serde_json::to_string_pretty(self)
            .map_err(std::io::Error::other)
            .map_err(report_err)?;
        std::fs::write(path, text).map_err(report_err)
    }
}

/// Files found in a capsule directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    pub to_validate: Vec<PathBuf>,
    pub ignored: Vec<PathBuf>,
}

/// Sort the directory's JSON files into records and ignored files.
///
/// A missing directory yields an empty discovery.
pub fn discover(dir: &Path) -> ValidateResult<Discovery> {
    if !dir.exists() {
        return Ok(Discovery::default());
    }
    let scan_err = |e| ValidateError::Scan {
        path: dir.display().to_string(),
        source: e,
    };

    let mut found = Discovery::default();
    for entry in std::fs::read_dir(dir).map_err(scan_err)? {
        let path = entry.map_err(scan_err)?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.ends_with(".jsonc") {
            found.ignored.push(path);
        } else if name.ends_with(".json") {
            if name.starts_with('_') || paths::is_companion(name) {
                found.ignored.push(path);
            } else {
                found.to_validate.push(path);
            }
        }
    }
    found.to_validate.sort();
    found.ignored.sort();
    Ok(found)
}

/// Compiled capsule schema plus the version records must declare.
pub struct CapsuleValidator {
    schema: Validator,
    expected_version: String,
}

impl CapsuleValidator {
    /// Compile [`CAPSULE_SCHEMA`] for records of `expected_version`.
    pub fn new(expected_version: impl Into<String>) -> ValidateResult<Self> {
        let schema: Value =
            serde_json::from_str(CAPSULE_SCHEMA).map_err(|e| ValidateError::Schema {
                message: e.to_string(),
            })?;
        let schema = jsonschema::options()
            .with_draft(jsonschema::Draft::Draft202012)
            .should_validate_formats(true)
            .build(&schema)
            .map_err(|e| ValidateError::Schema {
                message: e.to_string(),
            })?;
        Ok(Self {
            schema,
            expected_version: expected_version.into(),
        })
    }

    pub fn expected_version(&self) -> &str {
        &self.expected_version
    }

    /// Check a parsed record, returning one message per problem, ordered by location.
    pub fn validate_value(&self, record: &Value) -> Vec<String> {
        let mut found: Vec<(Vec<String>, String)> = self
            .schema
            .iter_errors(record)
            .map(|err| {
                let segments = pointer_segments(&err.instance_path().to_string());
                (segments, err.to_string())
            })
            .collect();

        if let Some(v) = record.get("version").and_then(Value::as_str) {
            if v != self.expected_version {
                found.push((
                    vec!["version".to_string()],
                    format!("expected \"{}\", found \"{v}\"", self.expected_version),
                ));
            }
        }

        found.sort_by(|a, b| a.0.cmp(&b.0));
        found
            .into_iter()
            .map(|(segments, message)| format!("{}: {message}", location(&segments)))
            .collect()
    }

    /// Read and check one file.
    pub fn validate_file(&self, path: &Path) -> FileReport {
        let messages = match std::fs::read_to_string(path) {
            Err(e) => vec![format!("read error: {e}")],
            Ok(text) => match serde_json::from_str::<Value>(&text) {
                Err(e) => vec![format!("JSON parse error: {e}")],
                Ok(value) => self.validate_value(&value),
            },
        };
        FileReport {
            file: path.display().to_string(),
            status: if messages.is_empty() {
                FileStatus::Ok
            } else {
                FileStatus::Error
            },
            messages,
        }
    }
}

/// Split a JSON pointer (`/a/0/b`) into unescaped segments.
fn pointer_segments(pointer: &str) -> Vec<String> {
    pointer
        .split('/')
        .skip(1)
        .map(|seg| seg.replace("~1", "/").replace("~0", "~"))
        .collect()
}

/// `$` followed by `.key` for names and `[i]` for indices.
fn location(segments: &[String]) -> String {
    let mut loc = String::from("$");
    for seg in segments {
        if !seg.is_empty() && seg.bytes().all(|b| b.is_ascii_digit()) {
            loc.push('[');
            loc.push_str(seg);
            loc.push(']');
        } else {
            loc.push('.');
            loc.push_str(seg);
        }
    }
    loc
}

/// Validate every record in `dir`.
pub fn validate_dir(dir: &Path, expected_version: &str) -> ValidateResult<ValidationReport> {
    let validator = CapsuleValidator::new(expected_version)?;
    let found = discover(dir)?;
    let validated: Vec<FileReport> = found
        .to_validate
        .iter()
        .map(|p| validator.validate_file(p))
        .collect();

    for report in validated.iter().filter(|r| r.status == FileStatus::Error) {
        tracing::warn!(file = %report.file, problems = report.messages.len(), "invalid capsule");
    }
    let invalid_total = validated
        .iter()
        .filter(|r| r.status == FileStatus::Error)
        .count();

    Ok(ValidationReport {
        dir: dir.display().to_string(),
        validated,
        ignored: found
            .ignored
            .iter()
            .map(|p| p.display().to_string())
            .collect(),
        invalid_total,
    })
}
