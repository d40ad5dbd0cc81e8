//! Proof collaborators: the capabilities the exporter consumes but does not define.
//!
//! A [`ProofRunner`] turns a drift window and motif trail into an opaque
//! [`ProofObject`]; a [`ProofSketcher`] renders that object as a text document.
//! The exporter passes proof objects through unmodified and never inspects
//! them. [`collapse`] provides a deterministic reference implementation of both.

pub mod collapse;

use serde::{Deserialize, Serialize};

use crate::error::ProofResult;

/// Opaque proof structure produced by a [`ProofRunner`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProofObject(pub serde_json::Value);

impl ProofObject {
    /// Wrap any JSON value.
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Borrow the underlying JSON value.
    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

impl From<serde_json::Value> for ProofObject {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// Runs the collapse proof over a drift window and motif trail.
pub trait ProofRunner {
    fn run(&self, drift: &[f64], motifs: &[String]) -> ProofResult<ProofObject>;
}

/// Renders a proof object as a sketch document.
pub trait ProofSketcher {
    fn sketch(&self, proof: &ProofObject) -> ProofResult<String>;
}

impl<F> ProofRunner for F
where
    F: Fn(&[f64], &[String]) -> ProofResult<ProofObject>,
{
    fn run(&self, drift: &[f64], motifs: &[String]) -> ProofResult<ProofObject> {
        self(drift, motifs)
    }
}

impl<F> ProofSketcher for F
where
    F: Fn(&ProofObject) -> ProofResult<String>,
{
    fn sketch(&self, proof: &ProofObject) -> ProofResult<String> {
        self(proof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProofError;

    #[test]
    fn closures_act_as_collaborators() {
        let runner = |drift: &[f64], motifs: &[String]| -> ProofResult<ProofObject> {
            Ok(serde_json::json!({ "n": drift.len(), "m": motifs.len() }).into())
        };
        let proof = runner.run(&[1.0, 2.0], &["a".to_string()]).unwrap();
        assert_eq!(proof.as_value()["n"], 2);
        assert_eq!(proof.as_value()["m"], 1);

        let sketcher = |_: &ProofObject| -> ProofResult<String> {
            Err(ProofError::Sketch {
                message: "no".into(),
            })
        };
        assert!(sketcher.sketch(&proof).is_err());
    }

    #[test]
    fn proof_object_serializes_transparently() {
        let proof = ProofObject::new(serde_json::json!({ "claim": "OPEN" }));
        let text = serde_json::to_string(&proof).unwrap();
        assert_eq!(text, r#"{"claim":"OPEN"}"#);
    }
}
