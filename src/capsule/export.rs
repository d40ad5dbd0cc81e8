//! Capsule export: assemble a record and write the three-file capsule set.
//!
//! One call to [`CapsuleExporter::export`] evaluates the drift window once,
//! runs the proof collaborator, assembles the [`CapsuleRecord`], and writes
//! `<stem>.json`, `<stem>.proof.json` and `<stem>.lean` in that order. Storage
//! and collaborator failures propagate to the caller as-is; files written
//! before a failure stay on disk.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CapsuleResult, ExportError, ExportResult};
use crate::paths::CapsuleFileSet;
use crate::proof::collapse::CollapseEngine;
use crate::proof::{ProofObject, ProofRunner, ProofSketcher};

use super::config::CapsuleConfig;
use super::{CapsuleRecord, Signals};

/// Deferred producer of the drift window, evaluated at most once per export.
pub type DriftWindow<'a> = Box<dyn FnOnce() -> Vec<f64> + 'a>;

/// Inputs of a single export call.
pub struct ExportRequest<'a> {
    pub instrument: String,
    pub glyph: String,
    pub dyn_conv: f64,
    pub fractal_vol_score: f64,
    pub sentience_drift: f64,
    /// `None` is treated as an empty trail.
    pub motif_trail: Option<Vec<String>>,
    pub motif_affinity: BTreeMap<String, f64>,
    /// `None` is treated as an empty window.
    pub drift_window: Option<DriftWindow<'a>>,
}

impl std::fmt::Debug for ExportRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportRequest")
            .field("instrument", &self.instrument)
            .field("glyph", &self.glyph)
            .field("motif_trail", &self.motif_trail)
            .field("drift_window", &self.drift_window.is_some())
            .finish_non_exhaustive()
    }
}

impl<'a> ExportRequest<'a> {
    /// A request with no drift window, no motifs, and zeroed scores.
    pub fn new(instrument: impl Into<String>) -> Self {
        Self {
            instrument: instrument.into(),
            glyph: String::new(),
            dyn_conv: 0.0,
            fractal_vol_score: 0.0,
            sentience_drift: 0.0,
            motif_trail: None,
            motif_affinity: BTreeMap::new(),
            drift_window: None,
        }
    }

    pub fn with_glyph(mut self, glyph: impl Into<String>) -> Self {
        self.glyph = glyph.into();
        self
    }

    pub fn with_scores(mut self, dyn_conv: f64, fractal_vol_score: f64, sentience_drift: f64) -> Self {
        self.dyn_conv = dyn_conv;
        self.fractal_vol_score = fractal_vol_score;
        self.sentience_drift = sentience_drift;
        self
    }

    pub fn with_motifs<I, S>(mut self, motifs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.motif_trail = Some(motifs.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_affinity(mut self, affinity: BTreeMap<String, f64>) -> Self {
        self.motif_affinity = affinity;
        self
    }

    /// Supply the drift window lazily.
    pub fn with_drift_window(mut self, producer: impl FnOnce() -> Vec<f64> + 'a) -> Self {
        self.drift_window = Some(Box::new(producer));
        self
    }
}

/// JSON description of a run, as accepted by the CLI.
///
/// `null` entries in `drift_window` stand for missing samples (NaN).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportInput {
    pub glyph: String,
    #[serde(with = "crate::json_float")]
    pub dyn_conv: f64,
    #[serde(with = "crate::json_float")]
    pub fractal_vol_score: f64,
    #[serde(with = "crate::json_float")]
    pub sentience_drift: f64,
    pub motif_trail: Option<Vec<String>>,
    #[serde(with = "crate::json_float::map")]
    pub motif_affinity: BTreeMap<String, f64>,
    pub drift_window: Option<Vec<Option<f64>>>,
}

impl ExportInput {
    /// Turn the parsed input into a request for `instrument`.
    pub fn into_request(self, instrument: impl Into<String>) -> ExportRequest<'static> {
        let drift_window: Option<DriftWindow<'static>> = self.drift_window.map(|samples| {
            Box::new(move || {
                samples
                    .into_iter()
                    .map(|s| s.unwrap_or(f64::NAN))
                    .collect::<Vec<f64>>()
            }) as DriftWindow<'static>
        });
        ExportRequest {
            instrument: instrument.into(),
            glyph: self.glyph,
            dyn_conv: self.dyn_conv,
            fractal_vol_score: self.fractal_vol_score,
            sentience_drift: self.sentience_drift,
            motif_trail: self.motif_trail,
            motif_affinity: self.motif_affinity,
            drift_window,
        }
    }
}

/// Writes capsule sets using a proof runner and sketcher.
#[derive(Debug, Clone)]
pub struct CapsuleExporter<R, S> {
    config: CapsuleConfig,
    runner: R,
    sketcher: S,
}

impl CapsuleExporter<CollapseEngine, CollapseEngine> {
    /// Exporter backed by the reference collapse engine.
    pub fn with_collapse_engine(config: CapsuleConfig) -> Self {
        Self::new(config, CollapseEngine, CollapseEngine)
    }
}

impl<R: ProofRunner, S: ProofSketcher> CapsuleExporter<R, S> {
    pub fn new(config: CapsuleConfig, runner: R, sketcher: S) -> Self {
        Self {
            config,
            runner,
            sketcher,
        }
    }

    pub fn config(&self) -> &CapsuleConfig {
        &self.config
    }

    /// Export with the current wall-clock time, captured once at entry.
    pub fn export_now(
        &self,
        request: ExportRequest<'_>,
        output_dir: &Path,
    ) -> CapsuleResult<CapsuleFileSet> {
        self.export(request, output_dir, Utc::now())
    }

    /// Export a capsule captured at `now` under `output_dir`.
    pub fn export(
        &self,
        request: ExportRequest<'_>,
        output_dir: &Path,
        now: DateTime<Utc>,
    ) -> CapsuleResult<CapsuleFileSet> {
        let ExportRequest {
            instrument,
            glyph,
            dyn_conv,
            fractal_vol_score,
            sentience_drift,
            motif_trail,
            motif_affinity,
            drift_window,
        } = request;

        let drift = drift_window.map(|produce| produce()).unwrap_or_default();
        let motifs = motif_trail.unwrap_or_default();

        let proof = self.runner.run(&drift, &motifs)?;

        let signals = Signals {
            glyph,
            dyn_conv,
            fractal_vol_score,
            sentience_drift,
            motif_trail: motifs.clone(),
            motif_affinity,
            drift_window_len: drift.len(),
        };
        let record = CapsuleRecord::assemble(&self.config, signals, &drift, &motifs, now);

        let files = CapsuleFileSet::resolve(
            output_dir,
            &self.config.capsules_dir,
            &self.config.file_prefix,
            &instrument,
            now,
        );
        files.ensure_dir()?;

        write_json(&files.record, &record, "capsule record")?;
        write_json(&files.proof, &proof, "proof object")?;
        let sketch = self.sketcher.sketch(&proof)?;
        write_text(&files.sketch, &sketch)?;

        tracing::info!(
            instrument = %instrument,
            stem = %files.stem,
            dir = %files.dir.display(),
            "capsule exported"
        );
        Ok(files)
    }

    /// Run the collaborator and assemble the record without touching the filesystem.
    pub fn preview(
        &self,
        drift: &[f64],
        motifs: &[String],
        signals: Signals,
        now: DateTime<Utc>,
    ) -> CapsuleResult<(CapsuleRecord, ProofObject)> {
        let proof = self.runner.run(drift, motifs)?;
        let record = CapsuleRecord::assemble(&self.config, signals, drift, motifs, now);
        Ok((record, proof))
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T, what: &str) -> ExportResult<()> {
    let text = serde_json::to_string_pretty(value).map_err(|e| ExportError::Serialize {
        what: what.to_string(),
        message: e.to_string(),
    })?;
    write_text(path, &text)
}

fn write_text(path: &Path, text: &str) -> ExportResult<()> {
    std::fs::write(path, text).map_err(|e| ExportError::Write {
        path: path.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use chrono::TimeZone;

    use super::*;
    use crate::error::{CapsuleError, ProofError, ProofResult};

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 7, 14, 5, 0).unwrap()
    }

    fn canned_runner(_: &[f64], motifs: &[String]) -> ProofResult<ProofObject> {
        Ok(serde_json::json!({ "claim": "OPEN", "motifs": motifs.len() }).into())
    }

    fn canned_sketcher(proof: &ProofObject) -> ProofResult<String> {
        Ok(format!("-- {}\n", proof.as_value()["claim"]))
    }

    #[test]
    fn drift_window_is_evaluated_once() {
        let dir = tempfile::TempDir::new().unwrap();
        let exporter =
            CapsuleExporter::new(CapsuleConfig::default(), canned_runner, canned_sketcher);
        let calls = Cell::new(0);
        let request = ExportRequest::new("ES").with_drift_window(|| {
            calls.set(calls.get() + 1);
            vec![1.0, 2.0]
        });
        exporter.export(request, dir.path(), at()).unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn writes_three_files_under_capsules() {
        let dir = tempfile::TempDir::new().unwrap();
        let exporter =
            CapsuleExporter::new(CapsuleConfig::default(), canned_runner, canned_sketcher);
        let files = exporter
            .export(ExportRequest::new("ES").with_motifs(["a", "b"]), dir.path(), at())
            .unwrap();

        assert!(files.is_complete());
        assert_eq!(files.dir, dir.path().join("Capsules"));
        assert_eq!(files.stem, "IMM_v36_ES_20250307_1405");

        let proof: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&files.proof).unwrap()).unwrap();
        assert_eq!(proof["motifs"], 2);
        assert_eq!(std::fs::read_to_string(&files.sketch).unwrap(), "-- \"OPEN\"\n");
    }

    #[test]
    fn runner_failure_writes_nothing() {
        let dir = tempfile::TempDir::new().unwrap();
        let failing = |_: &[f64], _: &[String]| -> ProofResult<ProofObject> {
            Err(ProofError::Run {
                message: "no solver".into(),
            })
        };
        let exporter = CapsuleExporter::new(CapsuleConfig::default(), failing, canned_sketcher);
        let err = exporter
            .export(ExportRequest::new("ES"), dir.path(), at())
            .unwrap_err();
        assert!(matches!(err, CapsuleError::Proof(ProofError::Run { .. })));
        assert!(!dir.path().join("Capsules").exists());
    }

    #[test]
    fn sketch_failure_leaves_partial_set() {
        let dir = tempfile::TempDir::new().unwrap();
        let failing = |_: &ProofObject| -> ProofResult<String> {
            Err(ProofError::Sketch {
                message: "no lean".into(),
            })
        };
        let exporter = CapsuleExporter::new(CapsuleConfig::default(), canned_runner, failing);
        let err = exporter
            .export(ExportRequest::new("ES"), dir.path(), at())
            .unwrap_err();
        assert!(matches!(err, CapsuleError::Proof(ProofError::Sketch { .. })));

        let files = CapsuleFileSet::resolve(dir.path(), "Capsules", "IMM_v36", "ES", at());
        assert!(files.record.exists());
        assert!(files.proof.exists());
        assert!(!files.sketch.exists());
        assert!(!files.is_complete());
    }

    #[test]
    fn unwritable_output_propagates_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        // A regular file where the output directory should be.
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, "").unwrap();
        let exporter =
            CapsuleExporter::new(CapsuleConfig::default(), canned_runner, canned_sketcher);
        let err = exporter
            .export(ExportRequest::new("ES"), &blocker, at())
            .unwrap_err();
        assert!(matches!(err, CapsuleError::Export(ExportError::CreateDir { .. })));
    }

    #[test]
    fn input_nulls_become_nan_samples() {
        let input: ExportInput = serde_json::from_str(
            r#"{ "glyph": "⥁", "drift_window": [1.0, null, 5.0], "motif_trail": ["a"] }"#,
        )
        .unwrap();
        let request = input.into_request("NQ");
        assert_eq!(request.instrument, "NQ");
        let drift = (request.drift_window.unwrap())();
        assert_eq!(drift.len(), 3);
        assert!(drift[1].is_nan());
    }

    #[test]
    fn extreme_window_exports_complete_set() {
        let dir = tempfile::TempDir::new().unwrap();
        let exporter = CapsuleExporter::with_collapse_engine(CapsuleConfig::default());
        let files = exporter
            .export(
                ExportRequest::new("ES").with_drift_window(|| vec![-f64::MAX, f64::MAX]),
                dir.path(),
                at(),
            )
            .unwrap();
        assert!(files.is_complete());

        let written: CapsuleRecord =
            serde_json::from_str(&std::fs::read_to_string(&files.record).unwrap()).unwrap();
        assert_eq!(written.state_metrics.entropy_delta, f64::INFINITY);
        let report = crate::capsule::validate::validate_dir(&files.dir, "3.6").unwrap();
        assert!(report.is_valid(), "{:?}", report.validated);
    }

    #[test]
    fn nan_scores_survive_the_record() {
        let dir = tempfile::TempDir::new().unwrap();
        let exporter =
            CapsuleExporter::new(CapsuleConfig::default(), canned_runner, canned_sketcher);
        let affinity = BTreeMap::from([("⥁".to_string(), f64::NEG_INFINITY)]);
        let files = exporter
            .export(
                ExportRequest::new("ES")
                    .with_scores(f64::NAN, 0.4, f64::INFINITY)
                    .with_affinity(affinity),
                dir.path(),
                at(),
            )
            .unwrap();

        let text = std::fs::read_to_string(&files.record).unwrap();
        assert!(text.contains("\"dyn_conv\": \"NaN\""));
        let written: CapsuleRecord = serde_json::from_str(&text).unwrap();
        assert!(written.signals.dyn_conv.is_nan());
        assert_eq!(written.signals.fractal_vol_score, 0.4);
        assert_eq!(written.signals.sentience_drift, f64::INFINITY);
        assert_eq!(written.signals.motif_affinity["⥁"], f64::NEG_INFINITY);
    }

    #[test]
    fn preview_matches_export_content() {
        let dir = tempfile::TempDir::new().unwrap();
        let exporter = CapsuleExporter::with_collapse_engine(CapsuleConfig::default());
        let motifs = vec!["⥁".to_string(), "⚛".to_string()];
        let drift = vec![1.0, 3.0];

        let (record, proof) = exporter
            .preview(&drift, &motifs, Signals::default(), at())
            .unwrap();
        let files = exporter
            .export(
                ExportRequest::new("ES")
                    .with_motifs(motifs.clone())
                    .with_drift_window(move || drift),
                dir.path(),
                at(),
            )
            .unwrap();

        let written: CapsuleRecord =
            serde_json::from_str(&std::fs::read_to_string(&files.record).unwrap()).unwrap();
        assert_eq!(written.provenance, record.provenance);
        assert_eq!(written.state_metrics, record.state_metrics);
        let written_proof: ProofObject =
            serde_json::from_str(&std::fs::read_to_string(&files.proof).unwrap()).unwrap();
        assert_eq!(written_proof, proof);
    }
}
