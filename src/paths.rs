//! Capsule file naming.
//!
//! Every export writes three files sharing one stem under `<output>/Capsules/`:
//!
//! - `<prefix>_<instrument>_<yyyyMMdd_HHmm>.json` (the capsule record)
//! - `<stem>.proof.json` (the proof object)
//! - `<stem>.lean` (the proof sketch)
//!
//! The stem has minute resolution. Two exports for the same instrument within
//! one minute resolve to the same paths and the later write wins.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::{ExportError, ExportResult};

/// Extension of the capsule record.
pub const RECORD_SUFFIX: &str = ".json";
/// Extension of the proof object companion.
pub const PROOF_SUFFIX: &str = ".proof.json";
/// Extension of the proof sketch companion.
pub const SKETCH_SUFFIX: &str = ".lean";

/// `strftime` pattern for the stem timestamp (`yyyyMMdd_HHmm`).
pub const STEM_TIME_FORMAT: &str = "%Y%m%d_%H%M";

/// The three artifacts of one capsule export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapsuleFileSet {
    /// Directory holding all three files.
    pub dir: PathBuf,
    /// Shared file-name stem, without extension.
    pub stem: String,
    /// `<stem>.json`
    pub record: PathBuf,
    /// `<stem>.proof.json`
    pub proof: PathBuf,
    /// `<stem>.lean`
    pub sketch: PathBuf,
}

impl CapsuleFileSet {
    /// Resolve the file set for an export captured at `now`.
    ///
    /// `capsules_dir` is the subdirectory under `output_dir` (normally `Capsules`)
    /// and `prefix` the stem prefix (normally `IMM_v36`).
    pub fn resolve(
        output_dir: &Path,
        capsules_dir: &str,
        prefix: &str,
        instrument: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let dir = output_dir.join(capsules_dir);
        let stem = stem(prefix, instrument, now);
        Self {
            record: dir.join(format!("{stem}{RECORD_SUFFIX}")),
            proof: dir.join(format!("{stem}{PROOF_SUFFIX}")),
            sketch: dir.join(format!("{stem}{SKETCH_SUFFIX}")),
            dir,
            stem,
        }
    }

    /// Create the capsule directory if absent. Safe to call repeatedly.
    pub fn ensure_dir(&self) -> ExportResult<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| ExportError::CreateDir {
            path: self.dir.display().to_string(),
            source: e,
        })
    }

    /// All three paths, in write order.
    pub fn files(&self) -> [&Path; 3] {
        [self.record.as_path(), self.proof.as_path(), self.sketch.as_path()]
    }

    /// Whether every artifact exists. A partial set means an export failed midway.
    pub fn is_complete(&self) -> bool {
        self.files().iter().all(|p| p.is_file())
    }
}

/// `<prefix>_<instrument>_<yyyyMMdd_HHmm>`.
pub fn stem(prefix: &str, instrument: &str, now: DateTime<Utc>) -> String {
    format!("{prefix}_{instrument}_{}", now.format(STEM_TIME_FORMAT))
}

/// Whether a file name is a proof-object companion rather than a record.
pub fn is_companion(name: &str) -> bool {
    name.ends_with(PROOF_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 7, 14, 5, 59).unwrap()
    }

    #[test]
    fn stem_has_minute_resolution() {
        assert_eq!(stem("IMM_v36", "ES", at()), "IMM_v36_ES_20250307_1405");
    }

    #[test]
    fn file_set_shares_stem() {
        let set = CapsuleFileSet::resolve(Path::new("/data"), "Capsules", "IMM_v36", "NQ", at());
        assert_eq!(set.dir, PathBuf::from("/data/Capsules"));
        assert_eq!(
            set.record,
            PathBuf::from("/data/Capsules/IMM_v36_NQ_20250307_1405.json")
        );
        assert_eq!(
            set.proof,
            PathBuf::from("/data/Capsules/IMM_v36_NQ_20250307_1405.proof.json")
        );
        assert_eq!(
            set.sketch,
            PathBuf::from("/data/Capsules/IMM_v36_NQ_20250307_1405.lean")
        );
    }

    #[test]
    fn ensure_dir_is_idempotent() {
        let dir = tempfile::TempDir::new().unwrap();
        let set = CapsuleFileSet::resolve(dir.path(), "Capsules", "IMM_v36", "ES", at());
        set.ensure_dir().unwrap();
        set.ensure_dir().unwrap();
        assert!(set.dir.is_dir());
        assert!(!set.is_complete());
    }

    #[test]
    fn companions_are_recognized() {
        assert!(is_companion("IMM_v36_ES_20250307_1405.proof.json"));
        assert!(!is_companion("IMM_v36_ES_20250307_1405.json"));
    }
}
