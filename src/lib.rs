// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # imm-capsule
//!
//! Assembles signed, content-addressed capsule records: a snapshot of a run's
//! drift signals, a CNF derived from its motif trail, and SHA-256 provenance
//! hashes linking the two.
//!
//! ## Architecture
//!
//! - **Entropy delta** (`entropy`): normalized spread of the drift window
//! - **Motif CNF** (`cnf`): deterministic DIMACS formula from the trail length,
//!   plus Tseitin expander benchmarks (`cnf::tseitin`)
//! - **Provenance** (`provenance`): SHA-256 over the CNF text and the canonical series text
//! - **Proof collaborators** (`proof`): capability traits for the collapse run and
//!   its sketch, with a reference implementation (`proof::collapse`)
//! - **Capsules** (`capsule`): record assembly, static config, export, and
//!   validation against the bundled JSON Schema
//!
//! ## Library usage
//!
//! ```no_run
//! use imm_capsule::capsule::config::CapsuleConfig;
//! use imm_capsule::capsule::export::{CapsuleExporter, ExportRequest};
//!
//! let exporter = CapsuleExporter::with_collapse_engine(CapsuleConfig::default());
//! let request = ExportRequest::new("ES")
//!     .with_motifs(["⥁", "⚛"])
//!     .with_drift_window(|| vec![1.0, 2.0, 3.0]);
//! let files = exporter.export_now(request, std::path::Path::new("out")).unwrap();
//! println!("{}", files.record.display());
//! ```

pub mod capsule;
pub mod cnf;
pub mod entropy;
pub mod error;
pub mod json_float;
pub mod paths;
pub mod proof;
pub mod provenance;
