//! Rich diagnostic error types for the capsule pipeline.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains. Storage failures keep the
//! underlying `std::io::Error` as their source; nothing here retries or cleans up.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the capsule pipeline.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain through to the caller.
#[derive(Debug, Error, Diagnostic)]
pub enum CapsuleError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Proof(#[from] ProofError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Validate(#[from] ValidateError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Tseitin(#[from] TseitinError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Cnf(#[from] CnfError),
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ExportError {
    #[error("failed to create capsule directory: {path}")]
    #[diagnostic(
        code(imm::export::create_dir),
        help("Check that the output directory is writable and the path is valid.")
    )]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write capsule artifact: {path}")]
    #[diagnostic(
        code(imm::export::write),
        help(
            "A capsule file could not be written. Files written before this one are \
             left in place; check for all three artifacts before trusting the capsule."
        )
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {what}: {message}")]
    #[diagnostic(
        code(imm::export::serialize),
        help("The record or proof object could not be rendered as JSON.")
    )]
    Serialize { what: String, message: String },
}

// ---------------------------------------------------------------------------
// Proof collaborator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ProofError {
    #[error("proof run failed: {message}")]
    #[diagnostic(
        code(imm::proof::run),
        help("The collapse proof collaborator rejected the drift window or motif trail.")
    )]
    Run { message: String },

    #[error("proof sketch generation failed: {message}")]
    #[diagnostic(
        code(imm::proof::sketch),
        help("The sketch generator could not render the proof object.")
    )]
    Sketch { message: String },
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read capsule config: {path}")]
    #[diagnostic(
        code(imm::config::read),
        help("Ensure the config file exists and is valid TOML.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse capsule config: {path}: {message}")]
    #[diagnostic(
        code(imm::config::parse),
        help("Check the TOML syntax. Omitted keys fall back to the v3.6 defaults.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write capsule config: {path}")]
    #[diagnostic(
        code(imm::config::write),
        help("Ensure you have write permissions to the target directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ValidateError {
    #[error("failed to scan capsule directory: {path}")]
    #[diagnostic(
        code(imm::validate::scan),
        help("Check that the directory exists and is readable.")
    )]
    Scan {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("capsule schema failed to compile: {message}")]
    #[diagnostic(
        code(imm::validate::schema),
        help("The bundled capsule schema must be valid JSON Schema draft 2020-12.")
    )]
    Schema { message: String },

    #[error("failed to write validation report: {path}")]
    #[diagnostic(
        code(imm::validate::report),
        help("Ensure the report path is writable.")
    )]
    Report {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// CNF errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum CnfError {
    #[error("a CNF formula needs at least one variable")]
    #[diagnostic(
        code(imm::cnf::no_variables),
        help("Declare a variable count of at least 1 in the `p cnf` header.")
    )]
    NoVariables,

    #[error("a CNF formula needs at least one clause")]
    #[diagnostic(code(imm::cnf::no_clauses))]
    NoClauses,

    #[error("missing `p cnf <variables> <clauses>` header")]
    #[diagnostic(
        code(imm::cnf::missing_header),
        help("DIMACS text may start with `c` comment lines, then the problem line.")
    )]
    MissingHeader,

    #[error("malformed DIMACS line {line}: {text}")]
    #[diagnostic(code(imm::cnf::malformed))]
    Malformed { line: usize, text: String },

    #[error("literal {literal} on line {line} exceeds the declared {variables} variables")]
    #[diagnostic(code(imm::cnf::literal_range))]
    LiteralOutOfRange {
        line: usize,
        literal: i64,
        variables: usize,
    },

    #[error("clause on line {line} is not terminated by 0")]
    #[diagnostic(
        code(imm::cnf::unterminated),
        help("Every clause line must end with the literal 0.")
    )]
    Unterminated { line: usize },

    #[error("header declares {declared} clauses but {found} were found")]
    #[diagnostic(code(imm::cnf::clause_count))]
    ClauseCount { declared: usize, found: usize },
}

// ---------------------------------------------------------------------------
// Tseitin benchmark errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum TseitinError {
    #[error("expander requires a positive even vertex count, got {vertices}")]
    #[diagnostic(
        code(imm::tseitin::vertex_count),
        help("The cycle-plus-matching construction pairs v with v + n/2; pick an even n > 0.")
    )]
    VertexCount { vertices: usize },

    #[error("charge set has {count} vertices; a Tseitin instance is only unsatisfiable with odd charge")]
    #[diagnostic(
        code(imm::tseitin::even_charge),
        help("Add or remove one charged vertex so the total charge is odd.")
    )]
    EvenCharge { count: usize },

    #[error("charged vertex {vertex} is out of bounds for a graph of {vertices} vertices")]
    #[diagnostic(
        code(imm::tseitin::vertex_bounds),
        help("Charged vertices are 0-indexed and must be below the vertex count.")
    )]
    VertexOutOfBounds { vertex: usize, vertices: usize },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Cnf(#[from] CnfError),

    #[error("failed to write DIMACS file: {path}")]
    #[diagnostic(
        code(imm::tseitin::write),
        help("Check that the parent directory is writable.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience alias for top-level results.
pub type CapsuleResult<T> = std::result::Result<T, CapsuleError>;

/// Convenience alias for export results.
pub type ExportResult<T> = std::result::Result<T, ExportError>;

/// Convenience alias for proof collaborator results.
pub type ProofResult<T> = std::result::Result<T, ProofError>;

/// Convenience alias for config results.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Convenience alias for validation results.
pub type ValidateResult<T> = std::result::Result<T, ValidateError>;

/// Convenience alias for CNF construction and parsing results.
pub type CnfResult<T> = std::result::Result<T, CnfError>;

/// Convenience alias for Tseitin benchmark results.
pub type TseitinResult<T> = std::result::Result<T, TseitinError>;
