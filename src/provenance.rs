//! Provenance hashes: content digests linking a capsule to its inputs.
//!
//! Both hashes are SHA-256 over UTF-8 text, rendered as lowercase hex. The CNF
//! hash covers the DIMACS text verbatim; the series hash covers the drift
//! window rendered with [`format_g9`] and joined by commas. Nothing here reads
//! the clock or process state, so equal text always yields equal digests.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::cnf::CnfFormula;

/// Significant digits used for the canonical series rendering.
pub const SERIES_PRECISION: i32 = 9;

/// The pair of digests recorded under `provenance.hashes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceHashes {
    /// SHA-256 of the motif CNF's DIMACS text.
    pub cnf_sha256: String,
    /// SHA-256 of the canonical drift-window text.
    pub entropy_sha256: String,
}

impl ProvenanceHashes {
    /// Hash a formula and a drift series.
    pub fn compute(formula: &CnfFormula, series: &[f64]) -> Self {
        Self {
            cnf_sha256: sha256_hex(formula.text()),
            entropy_sha256: sha256_hex(&series_text(series)),
        }
    }
}

/// SHA-256 of `text` as 64 lowercase hex characters.
pub fn sha256_hex(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Whether `s` looks like a SHA-256 digest produced by [`sha256_hex`].
pub fn is_sha256_hex(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Canonical text of a series: each sample via [`format_g9`], comma-joined.
pub fn series_text(series: &[f64]) -> String {
    series
        .iter()
        .map(|&v| format_g9(v))
        .collect::<Vec<_>>()
        .join(",")
}

/// Render `v` in general format with 9 significant digits, independent of locale.
///
/// Fixed notation is used when the decimal exponent lies in `(-5, 9)`,
/// scientific (`1.5E+10`, `1E-05`) otherwise. Trailing fractional zeros are
/// dropped.
pub fn format_g9(v: f64) -> String {
    if v.is_nan() {
        return "NaN".into();
    }
    if v.is_infinite() {
        return if v > 0.0 { "Infinity" } else { "-Infinity" }.into();
    }

    let sign = if v.is_sign_negative() { "-" } else { "" };
    if v == 0.0 {
        return format!("{sign}0");
    }

    // "d.dddddddde<exp>": exactly SERIES_PRECISION digits, correctly rounded.
    let sci = format!("{:.*e}", (SERIES_PRECISION - 1) as usize, v.abs());
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return format!("{sign}{sci}");
    };
    let exp: i32 = exp.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let digits = digits.trim_end_matches('0');

    if exp > -5 && exp < SERIES_PRECISION {
        if exp < 0 {
            let zeros = "0".repeat((-exp - 1) as usize);
            return format!("{sign}0.{zeros}{digits}");
        }
        let int_len = exp as usize + 1;
        if digits.len() <= int_len {
            let pad = "0".repeat(int_len - digits.len());
            return format!("{sign}{digits}{pad}");
        }
        let (int_part, frac) = digits.split_at(int_len);
        return format!("{sign}{int_part}.{frac}");
    }

    let (lead, rest) = digits.split_at(1);
    let exp_sign = if exp < 0 { '-' } else { '+' };
    let abs_exp = exp.abs();
    if rest.is_empty() {
        format!("{sign}{lead}E{exp_sign}{abs_exp:02}")
    } else {
        format!("{sign}{lead}.{rest}E{exp_sign}{abs_exp:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vectors() {
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn hashing_is_deterministic_and_content_sensitive() {
        let cnf = CnfFormula::from_motifs(&["a", "b", "c"]);
        let first = sha256_hex(cnf.text());
        assert_eq!(first, sha256_hex(cnf.text()));
        assert!(is_sha256_hex(&first));

        let tweaked = cnf.text().replacen("-2", "-3", 1);
        assert_ne!(first, sha256_hex(&tweaked));
    }

    #[test]
    fn is_sha256_hex_rejects_bad_digests() {
        assert!(!is_sha256_hex("abc"));
        assert!(!is_sha256_hex(&"A".repeat(64)));
        assert!(!is_sha256_hex(&"g".repeat(64)));
        assert!(is_sha256_hex(&"0f".repeat(32)));
    }

    #[test]
    fn g9_fixed_notation() {
        assert_eq!(format_g9(1.0), "1");
        assert_eq!(format_g9(2.5), "2.5");
        assert_eq!(format_g9(100.0), "100");
        assert_eq!(format_g9(-3.25), "-3.25");
        assert_eq!(format_g9(0.0001), "0.0001");
        assert_eq!(format_g9(123_456_789.0), "123456789");
        assert_eq!(format_g9(0.0), "0");
    }

    #[test]
    fn g9_rounds_single_precision_samples() {
        assert_eq!(format_g9(f64::from(0.1f32)), "0.100000001");
        assert_eq!(format_g9(1.0 / 3.0), "0.333333333");
        assert_eq!(format_g9(2.0 / 3.0), "0.666666667");
    }

    #[test]
    fn g9_scientific_notation() {
        assert_eq!(format_g9(1e-5), "1E-05");
        assert_eq!(format_g9(1.5e10), "1.5E+10");
        assert_eq!(format_g9(1_234_567_890.0), "1.23456789E+09");
        assert_eq!(format_g9(-2.5e-7), "-2.5E-07");
        assert_eq!(format_g9(1e100), "1E+100");
    }

    #[test]
    fn g9_non_finite() {
        assert_eq!(format_g9(f64::NAN), "NaN");
        assert_eq!(format_g9(f64::INFINITY), "Infinity");
        assert_eq!(format_g9(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn series_text_joins_with_commas() {
        assert_eq!(series_text(&[]), "");
        assert_eq!(series_text(&[1.0, 0.5, -2.0]), "1,0.5,-2");
    }

    #[test]
    fn compute_fills_both_hashes() {
        let cnf = CnfFormula::trivial();
        let hashes = ProvenanceHashes::compute(&cnf, &[]);
        assert_eq!(hashes.cnf_sha256, sha256_hex("p cnf 1 1\n1 0\n"));
        assert_eq!(hashes.entropy_sha256, sha256_hex(""));
        assert!(is_sha256_hex(&hashes.cnf_sha256));
        assert!(is_sha256_hex(&hashes.entropy_sha256));
    }
}
