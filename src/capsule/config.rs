//! Static capsule metadata, persisted as TOML.
//!
//! None of these values are computed: they are copied into every record as-is.
//! [`CapsuleConfig::default`] carries the v3.6 constants; a TOML file only needs
//! to name the keys it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Top-level capsule configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapsuleConfig {
    pub capsule_id: String,
    /// Schema version written to `version` and required by validation.
    pub version: String,
    pub mnemonic: String,
    /// File-name stem prefix.
    pub file_prefix: String,
    /// Subdirectory of the output directory that receives capsules.
    pub capsules_dir: String,
    pub bindings: Bindings,
    pub state_metrics: StateMetrics,
    pub cognition: Cognition,
    pub proof_hooks: ProofHooks,
    pub trinity_linkage: TrinityLinkage,
    pub rituals: Rituals,
    pub ethics_boundary: EthicsBoundary,
    pub sat_provenance: SatProvenance,
}

impl Default for CapsuleConfig {
    fn default() -> Self {
        Self {
            capsule_id: "IMM⇌COGNITION⇌WHITE_TOWER.v3.6".into(),
            version: "3.6".into(),
            mnemonic: "Glyphs learn; proof remembers.".into(),
            file_prefix: "IMM_v36".into(),
            capsules_dir: "Capsules".into(),
            bindings: Bindings::default(),
            state_metrics: StateMetrics::default(),
            cognition: Cognition::default(),
            proof_hooks: ProofHooks::default(),
            trinity_linkage: TrinityLinkage::default(),
            rituals: Rituals::default(),
            ethics_boundary: EthicsBoundary::default(),
            sat_provenance: SatProvenance::default(),
        }
    }
}

impl CapsuleConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml(&content).map_err(|message| ConfigError::Parse {
            path: path.display().to_string(),
            message,
        })
    }

    /// Load from `path` if given, otherwise use the defaults.
    pub fn load_or_default(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    /// Parse TOML text.
    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Render as pretty TOML.
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| e.to_string())
    }

    /// Save to a TOML file, creating parent directories.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = self.to_toml().map_err(|message| ConfigError::Parse {
            path: path.display().to_string(),
            message,
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bindings {
    pub strategy_source: String,
    pub proof_bridge: String,
    pub autonomy_engine: AutonomyEngine,
}

impl Default for Bindings {
    fn default() -> Self {
        Self {
            strategy_source: "EchoThread_Oracle_v8".into(),
            proof_bridge: "ProofBridge Ledger (CSV)".into(),
            autonomy_engine: AutonomyEngine::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutonomyEngine {
    pub lookback_trades: u32,
    #[serde(with = "crate::json_float")]
    pub base_conviction: f64,
    #[serde(with = "crate::json_float")]
    pub adjustment: f64,
}

impl Default for AutonomyEngine {
    fn default() -> Self {
        Self {
            lookback_trades: 10,
            base_conviction: 0.70,
            adjustment: 0.05,
        }
    }
}

/// Risk, regime, EMA and echo parameters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StateMetrics {
    pub risk: Risk,
    pub regime: Regime,
    pub ema: Ema,
    pub echo: Echo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Risk {
    #[serde(with = "crate::json_float")]
    pub risk_pct: f64,
    #[serde(with = "crate::json_float")]
    pub reward_risk: f64,
}

impl Default for Risk {
    fn default() -> Self {
        Self {
            risk_pct: 1.5,
            reward_risk: 2.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Regime {
    #[serde(with = "crate::json_float")]
    pub atr_to_price_min: f64,
    #[serde(with = "crate::json_float")]
    pub fractal_vol_min: f64,
}

impl Default for Regime {
    fn default() -> Self {
        Self {
            atr_to_price_min: 0.015,
            fractal_vol_min: 0.70,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ema {
    pub fast: u32,
    pub slow: u32,
}

impl Default for Ema {
    fn default() -> Self {
        Self { fast: 20, slow: 50 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Echo {
    pub cooldown_min: u32,
    #[serde(with = "crate::json_float")]
    pub size_reduction: f64,
}

impl Default for Echo {
    fn default() -> Self {
        Self {
            cooldown_min: 45,
            size_reduction: 0.50,
        }
    }
}

/// Field-name lists for emotional memory and the motif engine, plus mode names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cognition {
    pub emotional_memory: Vec<String>,
    pub motif_engine: Vec<String>,
    pub core_modes: Vec<String>,
}

impl Default for Cognition {
    fn default() -> Self {
        Self {
            emotional_memory: strings(&[
                "drawdownPeak",
                "resilienceCounter",
                "microCycleCount",
                "PhoenixThreshold",
                "entropyInversion",
            ]),
            motif_engine: strings(&[
                "motifTrail",
                "motifAffinity",
                "recurrentLoops",
                "affinityDecayRate",
                "loopBreakWeight",
            ]),
            core_modes: strings(&[
                "EntropyAnalysis",
                "CollapseRecognition",
                "ResilienceCounter",
                "PersonaRotation",
                "PhoenixRebirth",
                "StrategicTransition",
                "SentienceDriftEstimation",
            ]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProofHooks {
    pub entropy_series_window: usize,
    pub pnp_engine: String,
    pub emit: Vec<String>,
    pub criterion: String,
}

impl Default for ProofHooks {
    fn default() -> Self {
        Self {
            entropy_series_window: 21,
            pnp_engine: "EntropyCollapseEngine.Run(ΔΦ,motifs)".into(),
            emit: strings(&["proof_capsule.json", "lean4_pnp.lean", "paper_draft.tex"]),
            criterion: "npWall && !sat && noRecovery → Claim=P≠NP".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrinityLinkage {
    pub operator_id: String,
    pub routes: Routes,
    pub contexts: Vec<String>,
}

impl Default for TrinityLinkage {
    fn default() -> Self {
        Self {
            operator_id: "OP⇌TRINITY⇌NODE⇌v1".into(),
            routes: Routes::default(),
            contexts: strings(&[
                "symbolic replay",
                "ΔΦ-based reasoning",
                "anti-paradox reinforcement",
                "story-path validation",
                "harmonic coherence scanning",
            ]),
        }
    }
}

/// Routing labels per cognitive concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Routes {
    pub entropy_analysis: String,
    pub logic_translation: String,
    pub proof_guidance: String,
    pub ethical_modulation: String,
}

impl Default for Routes {
    fn default() -> Self {
        Self {
            entropy_analysis: "ForkCascadeMemory".into(),
            logic_translation: "GlyphMutationTranslator".into(),
            proof_guidance: "SAT⇌PDE Scaffold".into(),
            ethical_modulation: "Truth Bloom via WishingCore".into(),
        }
    }
}

/// Name templates for the ritual side-channel files. Dated names are derived per export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rituals {
    /// Prefix of the daily proof-bridge CSV (`<prefix>_<yyyy-MM-dd>.csv`).
    pub logging_prefix: String,
    pub mutation_archives: String,
    /// Prefix of the daily capsule export (`<prefix>_<yyyy-MM-dd>.json`).
    pub capsule_exports_prefix: String,
}

impl Default for Rituals {
    fn default() -> Self {
        Self {
            logging_prefix: "ProofBridge".into(),
            mutation_archives: "MutationChainLog.json".into(),
            capsule_exports_prefix: "Capsule".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EthicsBoundary {
    #[serde(rename = "AXIOM_007")]
    pub axiom_007: bool,
    #[serde(rename = "MirrorOnlyProtocol")]
    pub mirror_only_protocol: bool,
    #[serde(rename = "DriftWallContainment")]
    pub drift_wall_containment: bool,
}

impl Default for EthicsBoundary {
    fn default() -> Self {
        Self {
            axiom_007: true,
            mirror_only_protocol: true,
            drift_wall_containment: true,
        }
    }
}

/// How the proof's satisfiability was established.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SatProvenance {
    pub mode: String,
    pub binary: String,
}

impl Default for SatProvenance {
    fn default() -> Self {
        Self {
            mode: "unit-contradiction|external".into(),
            binary: "minisat|null".into(),
        }
    }
}
