//! CNF formulas in DIMACS text form.
//!
//! [`CnfFormula::from_motifs`] derives the motif-chain formula used for capsule
//! provenance: for a trail of `n > 1` motifs, clause `i` is `i ∨ ¬succ(i)` with
//! a cyclic successor. Only the trail length matters, never the labels, so two
//! trails of equal length hash identically.
//!
//! [`CnfFormula::parse`] reads DIMACS text back, checking the header counts and
//! clause terminators while keeping the text byte-for-byte, so a parsed file
//! hashes the same as the file on disk.

pub mod tseitin;

use std::fmt::Write as _;

use crate::error::{CnfError, CnfResult};

/// Text of the formula produced for an empty or single-motif trail.
pub const TRIVIAL_DIMACS: &str = "p cnf 1 1\n1 0\n";

/// An immutable CNF formula with its DIMACS rendering.
///
/// Only constructed through this module, so the declared counts always match
/// the text and the variable count is at least 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CnfFormula {
    variable_count: usize,
    clause_count: usize,
    text: String,
}

impl CnfFormula {
    /// The one-variable, one-clause formula `(1)`.
    pub fn trivial() -> Self {
        Self {
            variable_count: 1,
            clause_count: 1,
            text: TRIVIAL_DIMACS.to_string(),
        }
    }

    /// Build the cyclic motif-chain formula for a motif trail.
    pub fn from_motifs<S: AsRef<str>>(motifs: &[S]) -> Self {
        Self::chain(motifs.len())
    }

    /// Build the cyclic chain formula over `n` variables.
    ///
    /// `n <= 1` yields [`CnfFormula::trivial`].
    pub fn chain(n: usize) -> Self {
        if n <= 1 {
            return Self::trivial();
        }

        let mut text = format!("p cnf {n} {n}\n");
        for i in 1..=n {
            let succ = (i % n) + 1;
            // Writing into a String cannot fail.
            let _ = writeln!(text, "{i} -{succ} 0");
        }

        Self {
            variable_count: n,
            clause_count: n,
            text,
        }
    }

    /// Render explicit clauses as DIMACS, with an optional leading `c` comment line.
    ///
    /// Fails when there are no variables or no clauses, or a literal names a
    /// variable beyond `variable_count`.
    pub fn from_clauses(
        variable_count: usize,
        clauses: &[Vec<i64>],
        comment: Option<&str>,
    ) -> CnfResult<Self> {
        if variable_count == 0 {
            return Err(CnfError::NoVariables);
        }
        if clauses.is_empty() {
            return Err(CnfError::NoClauses);
        }
        let mut text = String::new();
        if let Some(comment) = comment {
            let _ = writeln!(text, "c {comment}");
        }
        let _ = writeln!(text, "p cnf {variable_count} {}", clauses.len());
        let first_line = 2 + usize::from(comment.is_some());
        for (idx, clause) in clauses.iter().enumerate() {
            for &lit in clause {
                check_literal(lit, variable_count, first_line + idx)?;
                let _ = write!(text, "{lit} ");
            }
            text.push_str("0\n");
        }

        Ok(Self {
            variable_count,
            clause_count: clauses.len(),
            text,
        })
    }

    /// Parse DIMACS text.
    ///
    /// Accepts `c` comment and blank lines anywhere, then one `p cnf V C`
    /// header followed by exactly `C` clause lines, each ending in `0`.
    pub fn parse(text: &str) -> CnfResult<Self> {
        let mut header: Option<(usize, usize)> = None;
        let mut found = 0usize;

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('c') {
                continue;
            }
            let malformed = || CnfError::Malformed {
                line: line_no,
                text: raw.to_string(),
            };

            let Some((variables, _)) = header else {
                header = Some(parse_header(line).ok_or_else(malformed)?);
                continue;
            };
            if line.starts_with('p') {
                return Err(malformed());
            }

            let lits = line
                .split_whitespace()
                .map(str::parse::<i64>)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| malformed())?;
            let Some((&last, body)) = lits.split_last() else {
                continue;
            };
            if last != 0 {
                return Err(CnfError::Unterminated { line: line_no });
            }
            for &lit in body {
                if lit == 0 {
                    return Err(malformed());
                }
                check_literal(lit, variables, line_no)?;
            }
            found += 1;
        }

        let (variable_count, clause_count) = header.ok_or(CnfError::MissingHeader)?;
        if variable_count == 0 {
            return Err(CnfError::NoVariables);
        }
        if clause_count == 0 {
            return Err(CnfError::NoClauses);
        }
        if found != clause_count {
            return Err(CnfError::ClauseCount {
                declared: clause_count,
                found,
            });
        }

        Ok(Self {
            variable_count,
            clause_count,
            text: text.to_string(),
        })
    }

    /// The clauses as literal lists, without their terminating `0`.
    pub fn clauses(&self) -> Vec<Vec<i64>> {
        self.text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('c') && !l.starts_with('p'))
            .map(|l| {
                l.split_whitespace()
                    .filter_map(|t| t.parse::<i64>().ok())
                    .filter(|&lit| lit != 0)
                    .collect()
            })
            .collect()
    }

    /// Number of variables declared in the header.
    pub fn variable_count(&self) -> usize {
        self.variable_count
    }

    /// Number of clauses declared in the header.
    pub fn clause_count(&self) -> usize {
        self.clause_count
    }

    /// The DIMACS text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

fn parse_header(line: &str) -> Option<(usize, usize)> {
    let mut parts = line.split_whitespace();
    if parts.next()? != "p" || parts.next()? != "cnf" {
        return None;
    }
    let variables = parts.next()?.parse().ok()?;
    let clauses = parts.next()?.parse().ok()?;
    parts.next().is_none().then_some((variables, clauses))
}

fn check_literal(literal: i64, variables: usize, line: usize) -> CnfResult<()> {
    if literal == 0 || literal.unsigned_abs() > variables as u64 {
        return Err(CnfError::LiteralOutOfRange {
            line,
            literal,
            variables,
        });
    }
    Ok(())
}

impl std::fmt::Display for CnfFormula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}
