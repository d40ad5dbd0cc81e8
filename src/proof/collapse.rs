//! Reference collapse collaborator: unit-contradiction check plus a Lean sketch.
//!
//! This is not a SAT solver. Each motif becomes a unit literal (`NOT:x` is the
//! negation of `x`), and the trail is contradictory exactly when some literal
//! appears alongside its negation. The claim is `Contradiction` in that case,
//! `P≠NP` when both NP-wall glyphs occur, and `OPEN` otherwise.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::entropy;
use crate::error::{ProofError, ProofResult};

use super::{ProofObject, ProofRunner, ProofSketcher};

/// Prefix marking a negated motif.
pub const NEGATION_PREFIX: &str = "NOT:";

/// Negation sign used for literals and glyph symbols.
pub const NEG: char = '¬';

/// The two glyphs whose joint presence signals the NP wall.
pub const NP_WALL_GLYPHS: [&str; 2] = ["⥁", "⚛"];

/// Label recorded as the proof engine in every proof object.
pub const ENGINE_MODE: &str = "unit-contradiction";

/// Outcome of a collapse run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollapseClaim {
    #[serde(rename = "P≠NP")]
    Separation,
    #[serde(rename = "OPEN")]
    Open,
    #[serde(rename = "Contradiction")]
    Contradiction,
}

impl std::fmt::Display for CollapseClaim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Separation => write!(f, "P≠NP"),
            Self::Open => write!(f, "OPEN"),
            Self::Contradiction => write!(f, "Contradiction"),
        }
    }
}

/// A motif echoed back as a glyph with a heuristic entropy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Glyph {
    pub symbol: String,
    #[serde(with = "crate::json_float")]
    pub entropy: f64,
    pub narrative_tags: Vec<String>,
}

/// Proof structure produced by [`CollapseEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollapseProof {
    pub engine: String,
    pub sat: bool,
    pub claim: CollapseClaim,
    /// Unit clauses, one literal each.
    pub clauses: Vec<Vec<String>>,
    pub glyphs: Vec<Glyph>,
    #[serde(with = "crate::json_float")]
    pub entropy_delta: f64,
    pub window_len: usize,
}

/// Deterministic reference implementation of [`ProofRunner`] and [`ProofSketcher`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CollapseEngine;

impl CollapseEngine {
    /// Run the collapse check and return the typed proof.
    pub fn collapse(&self, drift: &[f64], motifs: &[String]) -> CollapseProof {
        let clauses = motif_clauses(motifs);
        let sat = !has_unit_contradiction(&clauses);

        let flat = motifs.join(" ");
        let np_wall = NP_WALL_GLYPHS.iter().all(|g| flat.contains(g));
        let claim = if !sat {
            CollapseClaim::Contradiction
        } else if np_wall {
            CollapseClaim::Separation
        } else {
            CollapseClaim::Open
        };

        let glyphs = motifs
            .iter()
            .filter(|m| !m.is_empty())
            .map(|m| motif_glyph(m))
            .collect();

        CollapseProof {
            engine: ENGINE_MODE.to_string(),
            sat,
            claim,
            clauses,
            glyphs,
            entropy_delta: entropy::delta(drift),
            window_len: drift.len(),
        }
    }
}

impl ProofRunner for CollapseEngine {
    fn run(&self, drift: &[f64], motifs: &[String]) -> ProofResult<ProofObject> {
        let proof = self.collapse(drift, motifs);
        tracing::debug!(claim = %proof.claim, sat = proof.sat, "collapse run complete");
        serde_json::to_value(&proof)
            .map(ProofObject)
            .map_err(|e| ProofError::Run {
                message: e.to_string(),
            })
    }
}

impl ProofSketcher for CollapseEngine {
    fn sketch(&self, proof: &ProofObject) -> ProofResult<String> {
        CollapseProof::from_object(proof).map(|p| lean_sketch(&p))
    }
}

impl CollapseProof {
    /// Read a proof object produced by [`CollapseEngine`] back into its typed form.
    ///
    /// Non-finite drift deltas are carried as strings, so every proof the engine
    /// emits reads back.
    pub fn from_object(proof: &ProofObject) -> ProofResult<Self> {
        Self::deserialize(proof.as_value()).map_err(|e| ProofError::Sketch {
            message: format!("not a collapse proof: {e}"),
        })
    }
}

/// Motifs as unit clauses; blank motifs are dropped and `NOT:x` becomes `¬x`.
pub fn motif_clauses(motifs: &[String]) -> Vec<Vec<String>> {
    motifs
        .iter()
        .map(|m| m.trim())
        .filter(|m| !m.is_empty())
        .map(|m| match m.strip_prefix(NEGATION_PREFIX) {
            Some(rest) => vec![format!("{NEG}{rest}")],
            None => vec![m.to_string()],
        })
        .collect()
}

/// Whether a literal and its negation both appear as unit clauses.
pub fn has_unit_contradiction(clauses: &[Vec<String>]) -> bool {
    let lits: BTreeSet<&str> = clauses
        .iter()
        .filter_map(|c| c.first())
        .map(String::as_str)
        .collect();
    lits.iter().any(|lit| match lit.strip_prefix(NEG) {
        Some(positive) => lits.contains(positive),
        None => lits.contains(format!("{NEG}{lit}").as_str()),
    })
}

fn motif_glyph(motif: &str) -> Glyph {
    let symbol = motif.replace(NEGATION_PREFIX, &NEG.to_string());
    let np_wall = NP_WALL_GLYPHS.contains(&symbol.as_str());
    let entropy = if np_wall {
        0.12
    } else if symbol.starts_with(NEG) {
        0.05
    } else {
        0.08
    };
    let mut narrative_tags = vec!["proof-out".to_string()];
    if np_wall {
        narrative_tags.push("np-wall-signal".to_string());
    }
    Glyph {
        symbol,
        entropy,
        narrative_tags,
    }
}

fn lean_string(s: &str) -> String {
    let escaped = s.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// A Lean `Float` term; Lean has no literals for NaN or the infinities.
fn lean_float(v: f64) -> String {
    if v.is_nan() {
        "(0.0 / 0.0)".to_string()
    } else if v == f64::INFINITY {
        "(1.0 / 0.0)".to_string()
    } else if v == f64::NEG_INFINITY {
        "(-1.0 / 0.0)".to_string()
    } else {
        format!("{v:?}")
    }
}

/// Render a Lean 4 sketch recording the claim, glyphs, and drift delta.
pub fn lean_sketch(proof: &CollapseProof) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "-- Entropy collapse proof sketch ({})", proof.engine);
    let _ = writeln!(out, "-- claim: {}", proof.claim);
    let _ = writeln!(out, "-- sat: {}", proof.sat);
    let _ = writeln!(out, "-- window: {} samples", proof.window_len);
    out.push('\n');
    out.push_str("namespace ImmCapsule\n\n");

    let glyphs: Vec<String> = proof.glyphs.iter().map(|g| lean_string(&g.symbol)).collect();
    out.push_str("/-- Motif glyphs observed in the collapse run. -/\n");
    let _ = writeln!(out, "def glyphs : List String := [{}]\n", glyphs.join(", "));
    let _ = writeln!(
        out,
        "def entropyDelta : Float := {}\n",
        lean_float(proof.entropy_delta)
    );
    let _ = writeln!(out, "def claim : String := {}\n", lean_string(&proof.claim.to_string()));
    let _ = writeln!(
        out,
        "theorem claim_recorded : claim = {} := rfl\n",
        lean_string(&proof.claim.to_string())
    );

    if !proof.sat {
        out.push_str("/-- A unit literal and its negation cannot both hold. -/\n");
        out.push_str("theorem unit_contradiction (p : Prop) : ¬ (p ∧ ¬ p) :=\n");
        out.push_str("  fun h => h.2 h.1\n\n");
    }

    out.push_str("end ImmCapsule\n");
    out
}
