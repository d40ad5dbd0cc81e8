//! Tseitin parity formulas on a small explicit expander.
//!
//! The graph is a cycle on `n` vertices plus the matching `v ↔ v + n/2`, which
//! makes it 3-regular for even `n >= 4`. Charging an odd number of vertices
//! yields an unsatisfiable instance, so these serve as deterministic UNSAT
//! benchmarks. Alongside the formula we emit an odd-charge certificate hash
//! that ties a DIMACS file to the parity argument without a resolution proof.

use std::collections::BTreeSet;
use std::path::Path;

use crate::cnf::CnfFormula;
use crate::error::{TseitinError, TseitinResult};
use crate::provenance::sha256_hex;

/// Header line hashed into every odd-charge certificate.
pub const CERTIFICATE_HEADER: &str = "TSEITIN-ODD-CHARGE-PROOF\n";

/// An undirected simple graph given by its sorted edge list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegularGraph {
    pub num_vertices: usize,
    /// Edges as `(low, high)` pairs, sorted ascending.
    pub edges: Vec<(usize, usize)>,
}

impl RegularGraph {
    /// Neighbours of `v` in ascending order, or `None` if `v` is out of range.
    pub fn neighbors(&self, v: usize) -> Option<Vec<usize>> {
        if v >= self.num_vertices {
            return None;
        }
        let mut out: Vec<usize> = self
            .edges
            .iter()
            .filter_map(|&(a, b)| {
                if a == v {
                    Some(b)
                } else if b == v {
                    Some(a)
                } else {
                    None
                }
            })
            .collect();
        out.sort_unstable();
        Some(out)
    }
}

/// Build the cycle-plus-antipodal-matching graph on `n` vertices.
pub fn expander_graph(n: usize) -> TseitinResult<RegularGraph> {
    if n == 0 || n % 2 != 0 {
        return Err(TseitinError::VertexCount { vertices: n });
    }

    let mut edges = BTreeSet::new();
    for v in 0..n {
        for u in [(v + 1) % n, (v + n / 2) % n] {
            edges.insert((v.min(u), v.max(u)));
        }
    }

    Ok(RegularGraph {
        num_vertices: n,
        edges: edges.into_iter().collect(),
    })
}

/// Parity clauses for `graph` with the given charged vertices (default `{0}`).
///
/// Edge `k` of the sorted edge list becomes variable `k + 1`. For each vertex,
/// every assignment of its incident edges with the wrong parity is excluded by
/// one clause.
pub fn tseitin_clauses(
    graph: &RegularGraph,
    charged: Option<&[usize]>,
) -> TseitinResult<Vec<Vec<i64>>> {
    let charge: BTreeSet<usize> = match charged {
        Some(vs) => vs.iter().copied().collect(),
        None => BTreeSet::from([0]),
    };
    if let Some(&vertex) = charge.iter().find(|&&v| v >= graph.num_vertices) {
        return Err(TseitinError::VertexOutOfBounds {
            vertex,
            vertices: graph.num_vertices,
        });
    }
    if charge.len() % 2 == 0 {
        return Err(TseitinError::EvenCharge { count: charge.len() });
    }

    let mut incidence: Vec<Vec<i64>> = vec![Vec::new(); graph.num_vertices];
    for (idx, &(u, v)) in graph.edges.iter().enumerate() {
        let var = idx as i64 + 1;
        incidence[u].push(var);
        incidence[v].push(var);
    }

    let mut clauses = Vec::new();
    for (vertex, vars) in incidence.iter().enumerate() {
        let parity = u32::from(charge.contains(&vertex));
        for mask in 0u64..(1u64 << vars.len()) {
            if mask.count_ones() % 2 == parity {
                continue;
            }
            let clause: Vec<i64> = vars
                .iter()
                .enumerate()
                .map(|(i, &var)| if (mask >> i) & 1 == 1 { -var } else { var })
                .collect();
            clauses.push(clause);
        }
    }
    Ok(clauses)
}

/// A rendered Tseitin benchmark.
#[derive(Debug, Clone)]
pub struct TseitinInstance {
    pub graph: RegularGraph,
    pub formula: CnfFormula,
}

impl TseitinInstance {
    /// Build the `n`-vertex instance with an optional charge set.
    pub fn new(n: usize, charged: Option<&[usize]>) -> TseitinResult<Self> {
        let graph = expander_graph(n)?;
        let clauses = tseitin_clauses(&graph, charged)?;
        let comment = format!("3-regular Tseitin expander on {} vertices", graph.num_vertices);
        let formula = CnfFormula::from_clauses(graph.edges.len(), &clauses, Some(&comment))?;
        tracing::debug!(
            vertices = n,
            variables = formula.variable_count(),
            clauses = formula.clause_count(),
            "built Tseitin instance"
        );
        Ok(Self { graph, formula })
    }

    /// Odd-charge certificate hash for this instance's DIMACS text.
    pub fn certificate_sha256(&self) -> String {
        certificate_sha256(self.formula.text())
    }

    /// Write the DIMACS text to `path`, creating parent directories.
    pub fn write_dimacs(&self, path: &Path) -> TseitinResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| TseitinError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, self.formula.text()).map_err(|e| TseitinError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }
}

/// `sha256(HEADER + sha256(dimacs) + "\n")`, both digests lowercase hex.
pub fn certificate_sha256(dimacs: &str) -> String {
    let witness = format!("{CERTIFICATE_HEADER}{}\n", sha256_hex(dimacs));
    sha256_hex(&witness)
}
