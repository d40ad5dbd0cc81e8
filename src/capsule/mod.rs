//! Capsule records: versioned snapshots of a run's signals and provenance.
//!
//! A [`CapsuleRecord`] is assembled fresh for each export from static
//! [`CapsuleConfig`] metadata, the run's pass-through [`Signals`], the drift
//! window's entropy delta, and the provenance hashes of the motif CNF and the
//! drift window. Field order is declaration order, so serialized records are
//! byte-stable for the same logical input.

pub mod config;
pub mod export;
pub mod validate;

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::cnf::CnfFormula;
use crate::entropy;
use crate::provenance::ProvenanceHashes;

use self::config::{
    Bindings, CapsuleConfig, Cognition, EthicsBoundary, ProofHooks, SatProvenance, StateMetrics,
    TrinityLinkage,
};

/// The top-level capsule document written to `<stem>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapsuleRecord {
    pub capsule_id: String,
    pub version: String,
    pub mnemonic: String,
    pub bindings: Bindings,
    pub state_metrics: StateMetricsRecord,
    pub cognition_v35: Cognition,
    pub proof_hooks: ProofHooks,
    pub trinity_linkage: TrinityLinkage,
    pub rituals: RitualsRecord,
    pub ethics_boundary: EthicsBoundary,
    pub signals: Signals,
    /// RFC 3339 UTC capture time; the same instant names the files.
    pub timestamp: String,
    pub provenance: ProvenanceBlock,
}

/// Configured state metrics plus the computed entropy delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateMetricsRecord {
    #[serde(flatten)]
    pub params: StateMetrics,
    /// Entropy delta of the drift window.
    #[serde(with = "crate::json_float")]
    pub entropy_delta: f64,
}

/// Dated ritual file names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RitualsRecord {
    pub logging: String,
    pub mutation_archives: String,
    pub capsule_exports: String,
}

/// Run inputs carried through into the record untransformed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Signals {
    pub glyph: String,
    #[serde(with = "crate::json_float")]
    pub dyn_conv: f64,
    #[serde(with = "crate::json_float")]
    pub fractal_vol_score: f64,
    #[serde(with = "crate::json_float")]
    pub sentience_drift: f64,
    pub motif_trail: Vec<String>,
    /// Sorted by label.
    #[serde(with = "crate::json_float::map")]
    pub motif_affinity: BTreeMap<String, f64>,
    pub drift_window_len: usize,
}

/// `provenance` block: how satisfiability was judged and what was hashed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceBlock {
    pub sat_provenance: SatProvenance,
    pub hashes: ProvenanceHashes,
    pub cnf: CnfShape,
}

/// Header counts of the hashed CNF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CnfShape {
    pub variables: usize,
    pub clauses: usize,
}

impl From<&CnfFormula> for CnfShape {
    fn from(formula: &CnfFormula) -> Self {
        Self {
            variables: formula.variable_count(),
            clauses: formula.clause_count(),
        }
    }
}

impl CapsuleRecord {
    /// Assemble a record from its inputs. Pure: no I/O, no clock.
    ///
    /// `signals.drift_window_len` is overwritten with `drift.len()`.
    pub fn assemble(
        config: &CapsuleConfig,
        mut signals: Signals,
        drift: &[f64],
        motifs: &[String],
        now: DateTime<Utc>,
    ) -> Self {
        let formula = CnfFormula::from_motifs(motifs);
        let hashes = ProvenanceHashes::compute(&formula, drift);
        let entropy_delta = entropy::delta(drift);
        tracing::debug!(
            variables = formula.variable_count(),
            clauses = formula.clause_count(),
            cnf_sha256 = %hashes.cnf_sha256,
            entropy_sha256 = %hashes.entropy_sha256,
            entropy_delta,
            "assembled capsule provenance"
        );

        signals.drift_window_len = drift.len();
        let day = now.format("%Y-%m-%d");
        let rituals = &config.rituals;

        Self {
            capsule_id: config.capsule_id.clone(),
            version: config.version.clone(),
            mnemonic: config.mnemonic.clone(),
            bindings: config.bindings.clone(),
            state_metrics: StateMetricsRecord {
                params: config.state_metrics.clone(),
                entropy_delta,
            },
            cognition_v35: config.cognition.clone(),
            proof_hooks: config.proof_hooks.clone(),
            trinity_linkage: config.trinity_linkage.clone(),
            rituals: RitualsRecord {
                logging: format!("{}_{day}.csv", rituals.logging_prefix),
                mutation_archives: rituals.mutation_archives.clone(),
                capsule_exports: format!("{}_{day}.json", rituals.capsule_exports_prefix),
            },
            ethics_boundary: config.ethics_boundary.clone(),
            signals,
            timestamp: now.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            provenance: ProvenanceBlock {
                sat_provenance: config.sat_provenance.clone(),
                hashes,
                cnf: CnfShape::from(&formula),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::provenance::{is_sha256_hex, sha256_hex};

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 7, 14, 5, 0).unwrap()
    }

    fn motifs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn record_carries_hashes_and_delta() {
        let cfg = CapsuleConfig::default();
        let record = CapsuleRecord::assemble(
            &cfg,
            Signals::default(),
            &[1.0, 2.0, 3.0],
            &motifs(&["a", "b", "c"]),
            at(),
        );
        assert_eq!(
            record.provenance.hashes.cnf_sha256,
            sha256_hex("p cnf 3 3\n1 -2 0\n2 -3 0\n3 -1 0\n")
        );
        assert_eq!(record.provenance.hashes.entropy_sha256, sha256_hex("1,2,3"));
        assert!((record.state_metrics.entropy_delta - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(record.signals.drift_window_len, 3);
        assert_eq!(record.provenance.cnf, CnfShape { variables: 3, clauses: 3 });
    }

    #[test]
    fn empty_inputs_degrade_gracefully() {
        let record =
            CapsuleRecord::assemble(&CapsuleConfig::default(), Signals::default(), &[], &[], at());
        assert_eq!(record.state_metrics.entropy_delta, 0.0);
        assert_eq!(record.provenance.hashes.cnf_sha256, sha256_hex("p cnf 1 1\n1 0\n"));
        assert!(is_sha256_hex(&record.provenance.hashes.entropy_sha256));
    }

    #[test]
    fn timestamp_and_rituals_use_capture_time() {
        let record =
            CapsuleRecord::assemble(&CapsuleConfig::default(), Signals::default(), &[], &[], at());
        assert_eq!(record.timestamp, "2025-03-07T14:05:00Z");
        assert_eq!(record.rituals.logging, "ProofBridge_2025-03-07.csv");
        assert_eq!(record.rituals.capsule_exports, "Capsule_2025-03-07.json");
        assert_eq!(record.rituals.mutation_archives, "MutationChainLog.json");
    }

    #[test]
    fn timestamp_keeps_sub_second_digits_only_when_present() {
        let with_millis = at() + chrono::Duration::milliseconds(250);
        let record = CapsuleRecord::assemble(
            &CapsuleConfig::default(),
            Signals::default(),
            &[],
            &[],
            with_millis,
        );
        assert_eq!(record.timestamp, "2025-03-07T14:05:00.250Z");
        assert!(DateTime::parse_from_rfc3339(&record.timestamp).is_ok());
    }

    #[test]
    fn serialized_key_order_is_stable() {
        let record =
            CapsuleRecord::assemble(&CapsuleConfig::default(), Signals::default(), &[], &[], at());
        let json = serde_json::to_string_pretty(&record).unwrap();
        let keys = [
            "\"capsule_id\"",
            "\"version\"",
            "\"mnemonic\"",
            "\"bindings\"",
            "\"state_metrics\"",
            "\"cognition_v35\"",
            "\"proof_hooks\"",
            "\"trinity_linkage\"",
            "\"rituals\"",
            "\"ethics_boundary\"",
            "\"signals\"",
            "\"timestamp\"",
            "\"provenance\"",
        ];
        let positions: Vec<usize> = keys.iter().map(|k| json.find(k).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(json.contains("\"AXIOM_007\": true"));
        assert!(json.contains("\"entropy_delta\": 0.0"));
    }

    #[test]
    fn flattened_state_metrics_round_trip() {
        let record = CapsuleRecord::assemble(
            &CapsuleConfig::default(),
            Signals::default(),
            &[2.0, 4.0],
            &[],
            at(),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["state_metrics"]["ema"]["fast"], 20);
        assert_eq!(json["state_metrics"]["entropy_delta"], 0.5);
        let back: CapsuleRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
