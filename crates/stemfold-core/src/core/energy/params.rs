use crate::core::models::sequence::Base;
use phf::{Map, phf_map};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Nearest-neighbour motif `(seq[i], seq[j], seq[i+1], seq[j-1])`.
pub type StackMotif = [Base; 4];

// Coarse, sign-correct stacking free energies in kcal/mol. GC stacks are the
// strongest, AU weaker, GU wobble the weakest. Keys are outer pair + inner pair.
static DEFAULT_STACK_ENERGIES: Map<&'static str, f64> = phf_map! {
    "GCCG" => -2.4, "CGGC" => -2.4,
    "GCGC" => -2.3, "CGCG" => -2.3,
    "AUUA" => -1.1, "UAAU" => -1.1,
    "UAUA" => -1.0,
    "GUUG" => -0.9, "UGGU" => -0.9,
};

#[derive(Debug, Error)]
pub enum ParamLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid motif '{motif}': {reason}")]
    InvalidMotif { motif: String, reason: &'static str },
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TetraloopBonus {
    /// Four IUPAC symbols; `N` matches any base, `R` a purine, `Y` a pyrimidine.
    pub pattern: String,
    pub bonus: f64,
}

impl TetraloopBonus {
    pub fn matches(&self, core: &[Base]) -> bool {
        core.len() == 4
            && self
                .pattern
                .chars()
                .zip(core)
                .all(|(symbol, &base)| iupac_matches(symbol, base))
    }
}

fn iupac_matches(symbol: char, base: Base) -> bool {
    match symbol {
        'N' => true,
        'R' => base.is_purine(),
        'Y' => base.is_pyrimidine(),
        other => other == base.to_char(),
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct HairpinParams {
    pub a: f64,
    pub b: f64,
    pub min_loop: usize,
    pub tiny_loop_penalty: f64,
    pub tetraloops: Vec<TetraloopBonus>,
}

impl Default for HairpinParams {
    fn default() -> Self {
        Self {
            a: 3.4,
            b: 1.3,
            min_loop: 3,
            tiny_loop_penalty: 50.0,
            tetraloops: vec![
                TetraloopBonus {
                    pattern: "GNRA".to_string(),
                    bonus: -0.8,
                },
                TetraloopBonus {
                    pattern: "UNCG".to_string(),
                    bonus: -1.3,
                },
                TetraloopBonus {
                    pattern: "CUUG".to_string(),
                    bonus: -1.0,
                },
            ],
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct InternalLoopParams {
    pub c: f64,
    pub d: f64,
    pub asymmetry: f64,
    pub single_bulge_bonus: f64,
}

impl Default for InternalLoopParams {
    fn default() -> Self {
        Self {
            c: 0.8,
            d: 1.1,
            asymmetry: 0.3,
            single_bulge_bonus: -0.4,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct MultibranchParams {
    pub a: f64,
    pub per_branch: f64,
    pub per_unpaired: f64,
}

impl Default for MultibranchParams {
    fn default() -> Self {
        Self {
            a: 3.2,
            per_branch: 0.4,
            per_unpaired: 0.2,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct CoaxialParams {
    pub enabled: bool,
    pub bonus: f64,
}

impl Default for CoaxialParams {
    fn default() -> Self {
        Self {
            enabled: false,
            bonus: -0.5,
        }
    }
}

/// Every constant the energy model uses, by name.
///
/// The values are empirical placeholders, not calibrated Turner parameters.
/// The stacking table is not part of the TOML document; it comes from the
/// built-in defaults or from a CSV file passed to [`EnergyParams::load`].
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct EnergyParams {
    #[serde(skip)]
    pub stacks: HashMap<StackMotif, f64>,
    pub default_stack: f64,
    pub isolated_pair: f64,
    pub unpaired_penalty: f64,
    pub hairpin: HairpinParams,
    pub internal: InternalLoopParams,
    pub multibranch: MultibranchParams,
    pub coaxial: CoaxialParams,
}

impl Default for EnergyParams {
    fn default() -> Self {
        Self {
            stacks: default_stack_table(),
            default_stack: -1.1,
            isolated_pair: -0.5,
            unpaired_penalty: 0.2,
            hairpin: HairpinParams::default(),
            internal: InternalLoopParams::default(),
            multibranch: MultibranchParams::default(),
            coaxial: CoaxialParams::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct StackRecord {
    outer: String,
    inner: String,
    energy: f64,
}

impl EnergyParams {
    /// Loads scalar parameters from a TOML file and the stacking table from a
    /// CSV file with `outer,inner,energy` columns.
    pub fn load(params_path: &Path, stack_table_path: &Path) -> Result<Self, ParamLoadError> {
        let mut params = Self::load_scalars(params_path)?;
        params.stacks = Self::load_stack_csv(stack_table_path)?;
        Ok(params)
    }

    /// Parses a TOML document, keeping the built-in stacking table.
    pub fn from_toml_str(content: &str) -> Result<Self, ParamLoadError> {
        Self::parse_scalars(content, "<inline>")
    }

    pub fn stack_energy(&self, motif: &StackMotif) -> f64 {
        self.stacks
            .get(motif)
            .copied()
            .unwrap_or(self.default_stack)
    }

    fn load_scalars(path: &Path) -> Result<Self, ParamLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ParamLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::parse_scalars(&content, &path.to_string_lossy())
    }

    fn parse_scalars(content: &str, origin: &str) -> Result<Self, ParamLoadError> {
        let mut params: Self = toml::from_str(content).map_err(|e| ParamLoadError::Toml {
            path: origin.to_string(),
            source: e,
        })?;
        for tetraloop in &params.hairpin.tetraloops {
            validate_tetraloop_pattern(&tetraloop.pattern)?;
        }
        params.stacks = default_stack_table();
        Ok(params)
    }

    fn load_stack_csv(path: &Path) -> Result<HashMap<StackMotif, f64>, ParamLoadError> {
        let mut reader = csv::Reader::from_path(path).map_err(|e| ParamLoadError::Csv {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;

        let mut stacks = HashMap::new();
        for result in reader.deserialize::<StackRecord>() {
            let record = result.map_err(|e| ParamLoadError::Csv {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;
            let key = format!("{}{}", record.outer.trim(), record.inner.trim());
            stacks.insert(parse_stack_motif(&key)?, record.energy);
        }
        Ok(stacks)
    }
}

pub fn parse_stack_motif(text: &str) -> Result<StackMotif, ParamLoadError> {
    let invalid = |reason| ParamLoadError::InvalidMotif {
        motif: text.to_string(),
        reason,
    };
    let bases = text
        .chars()
        .map(Base::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid("stack motifs use only A, C, G, U"))?;
    bases
        .try_into()
        .map_err(|_| invalid("stack motifs are exactly four bases"))
}

fn validate_tetraloop_pattern(pattern: &str) -> Result<(), ParamLoadError> {
    let invalid = |reason| ParamLoadError::InvalidMotif {
        motif: pattern.to_string(),
        reason,
    };
    if pattern.chars().count() != 4 {
        return Err(invalid("tetraloop patterns are exactly four symbols"));
    }
    if !pattern.chars().all(|c| "ACGUNRY".contains(c)) {
        return Err(invalid("tetraloop patterns use only A, C, G, U, N, R, Y"));
    }
    Ok(())
}

fn default_stack_table() -> HashMap<StackMotif, f64> {
    DEFAULT_STACK_ENERGIES
        .entries()
        .filter_map(|(key, &energy)| parse_stack_motif(key).ok().map(|motif| (motif, energy)))
        .collect()
}
