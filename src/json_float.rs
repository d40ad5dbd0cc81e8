//! JSON representation for floats that may be non-finite.
//!
//! JSON has no NaN or infinity, and `serde_json` writes them as `null`, which
//! then fails to read back as `f64`. Fields using this module write finite
//! values as plain numbers and non-finite values as the strings `"NaN"`,
//! `"Infinity"` and `"-Infinity"` (the same spelling as [`format_g9`]).
//! Reading accepts numbers, those strings, and `null` (as NaN).
//!
//! Use with `#[serde(with = "crate::json_float")]` on `f64` fields, or
//! `#[serde(with = "crate::json_float::map")]` on `BTreeMap<String, f64>`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::provenance::format_g9;

/// An `f64` that survives a JSON round trip whatever its value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JsonFloat(pub f64);

impl Serialize for JsonFloat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.is_finite() {
            serializer.serialize_f64(self.0)
        } else {
            serializer.serialize_str(&format_g9(self.0))
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Repr {
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for JsonFloat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<Repr>::deserialize(deserializer)? {
            None => Ok(Self(f64::NAN)),
            Some(Repr::Number(v)) => Ok(Self(v)),
            Some(Repr::Text(s)) => parse_text(&s)
                .map(Self)
                .ok_or_else(|| serde::de::Error::custom(format!("not a number: {s:?}"))),
        }
    }
}

fn parse_text(s: &str) -> Option<f64> {
    match s {
        "NaN" => Some(f64::NAN),
        "Infinity" | "+Infinity" => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        other => other.parse().ok(),
    }
}

pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    JsonFloat(*value).serialize(serializer)
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    JsonFloat::deserialize(deserializer).map(|f| f.0)
}

/// The same representation for the values of a string-keyed map.
pub mod map {
    use std::collections::BTreeMap;

    use super::*;

    pub fn serialize<S: Serializer>(
        value: &BTreeMap<String, f64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_map(value.iter().map(|(k, v)| (k, JsonFloat(*v))))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, f64>, D::Error> {
        let raw = BTreeMap::<String, JsonFloat>::deserialize(deserializer)?;
        Ok(raw.into_iter().map(|(k, v)| (k, v.0)).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    struct Sample {
        #[serde(with = "crate::json_float")]
        value: f64,
        #[serde(with = "crate::json_float::map", default)]
        weights: BTreeMap<String, f64>,
    }

    #[test]
    fn finite_values_stay_numbers() {
        let json = serde_json::to_string(&Sample {
            value: 0.5,
            weights: BTreeMap::from([("a".to_string(), 2.0)]),
        })
        .unwrap();
        assert_eq!(json, r#"{"value":0.5,"weights":{"a":2.0}}"#);
    }

    #[test]
    fn non_finite_values_round_trip() {
        let weights = BTreeMap::from([
            ("hi".to_string(), f64::INFINITY),
            ("lo".to_string(), f64::NEG_INFINITY),
        ]);
        let json = serde_json::to_string(&Sample {
            value: f64::NAN,
            weights,
        })
        .unwrap();
        assert_eq!(
            json,
            r#"{"value":"NaN","weights":{"hi":"Infinity","lo":"-Infinity"}}"#
        );

        let back: Sample = serde_json::from_str(&json).unwrap();
        assert!(back.value.is_nan());
        assert_eq!(back.weights["hi"], f64::INFINITY);
        assert_eq!(back.weights["lo"], f64::NEG_INFINITY);
    }

    #[test]
    fn null_reads_as_nan() {
        let back: Sample = serde_json::from_str(r#"{"value":null}"#).unwrap();
        assert!(back.value.is_nan());
    }

    #[test]
    fn unknown_text_is_rejected() {
        assert!(serde_json::from_str::<Sample>(r#"{"value":"lots"}"#).is_err());
    }

    #[test]
    fn toml_config_values_round_trip() {
        let back: Sample = toml::from_str("value = 1.25\n").unwrap();
        assert_eq!(back.value, 1.25);
        let text = toml::to_string(&Sample {
            value: f64::INFINITY,
            weights: BTreeMap::new(),
        })
        .unwrap();
        let again: Sample = toml::from_str(&text).unwrap();
        assert_eq!(again.value, f64::INFINITY);
    }
}
