//! Ranking configuration: defaults, YAML-subset overrides, and file loading.
//!
//! The override format is small: top-level `key: value` scalars
//! and one level of `section:` maps. Values are coerced to booleans, floats or
//! integers before being checked against [`PackConfig`]. Unknown keys are
//! rejected.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use tracing::{debug, info};

use crate::errors::{PackError, PackResult};

/// Location consulted by [`load_config`] when no path is given.
pub const DEFAULT_CONFIG_PATH: &str = "tools/context/config.yaml";

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageRankConfig {
    /// Damping factor of the walk.
    pub lambda: f64,
    /// Share of the composite score taken from PPR rather than base score.
    pub theta: f64,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            lambda: 0.85,
            theta: 0.6,
        }
    }
}

/// Signal weights. A supplied `weights` map replaces the defaults wholesale,
/// so any weight it leaves out counts as zero.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignalWeights {
    #[serde(default)]
    pub intent: f64,
    #[serde(default)]
    pub diff: f64,
    #[serde(default)]
    pub recency: f64,
    #[serde(default)]
    pub hub: f64,
    #[serde(default)]
    pub role: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            intent: 0.40,
            diff: 0.25,
            recency: 0.20,
            hub: 0.10,
            role: 0.05,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiversityConfig {
    pub mu_file: f64,
    pub mu_role: f64,
}

impl Default for DiversityConfig {
    fn default() -> Self {
        Self {
            mu_file: 0.15,
            mu_role: 0.10,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum candidate count kept after expansion.
    pub ncand: usize,
    /// Maximum PPR iterations.
    pub iters: usize,
    /// L1 convergence tolerance for PPR.
    pub tol: f64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            ncand: 2000,
            iters: 50,
            tol: 1e-6,
        }
    }
}

// ---------------------------------------------------------------------------
// PackConfig
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackConfig {
    pub pagerank: PageRankConfig,
    pub weights: SignalWeights,
    pub recency_halflife_days: i64,
    pub diversity: DiversityConfig,
    pub limits: LimitsConfig,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            pagerank: PageRankConfig::default(),
            weights: SignalWeights::default(),
            recency_halflife_days: 45,
            diversity: DiversityConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

impl PackConfig {
    /// Parse a YAML-subset override document on top of the defaults.
    pub fn from_yaml_str(text: &str) -> PackResult<Self> {
        let overrides = parse_overrides(text)?;
        Self::from_overrides(overrides)
    }

    /// Apply an already-parsed override map (e.g. from JSON).
    pub fn from_overrides(overrides: Map<String, Value>) -> PackResult<Self> {
        serde_json::from_value(Value::Object(overrides)).map_err(|err| {
            let message = err.to_string();
            match unknown_field(&message) {
                Some(key) => PackError::UnknownKey(key),
                None => PackError::Invalid(message),
            }
        })
    }
}

fn unknown_field(message: &str) -> Option<String> {
    let rest = message.strip_prefix("unknown field `")?;
    rest.split('`').next().map(str::to_string)
}

/// Load config from `path`, or [`DEFAULT_CONFIG_PATH`]. A missing file means
/// defaults.
pub fn load_config(path: Option<&Path>) -> PackResult<PackConfig> {
    let target = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    if !target.exists() {
        debug!("No config at {}, using defaults", target.display());
        return Ok(PackConfig::default());
    }
    let text = std::fs::read_to_string(&target)?;
    let config = PackConfig::from_yaml_str(&text)?;
    info!("Loaded context pack config from {}", target.display());
    Ok(config)
}

// ---------------------------------------------------------------------------
// YAML subset
// ---------------------------------------------------------------------------

/// Parse the override document into a two-level JSON map.
pub fn parse_overrides(text: &str) -> PackResult<Map<String, Value>> {
    let mut root = Map::new();
    // Open section: (name, indent of its children once known).
    let mut section: Option<(String, Option<usize>)> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.split('#').next().unwrap_or("").trim_end();
        if line.trim().is_empty() {
            continue;
        }
        let indent = line.len() - line.trim_start_matches(' ').len();
        let (key, value) = match line.trim().split_once(':') {
            Some((key, value)) => (key.trim(), value.trim()),
            None => return Err(PackError::config(line_no, "expected `key: value`")),
        };
        if key.is_empty() {
            return Err(PackError::config(line_no, "empty key"));
        }

        if indent == 0 {
            section = None;
            if value.is_empty() {
                root.insert(key.to_string(), Value::Object(Map::new()));
                section = Some((key.to_string(), None));
            } else {
                root.insert(key.to_string(), coerce_scalar(value));
            }
            continue;
        }

        let Some((name, child_indent)) = section.as_mut() else {
            return Err(PackError::config(line_no, "indented key outside a section"));
        };
        match child_indent {
            None => *child_indent = Some(indent),
            Some(expected) if *expected != indent => {
                return Err(PackError::config(line_no, "inconsistent indentation"));
            }
            Some(_) => {}
        }
        if value.is_empty() {
            return Err(PackError::config(
                line_no,
                format!("`{key}` opens a nested map; only one level is supported"),
            ));
        }
        if let Some(Value::Object(children)) = root.get_mut(name.as_str()) {
            children.insert(key.to_string(), coerce_scalar(value));
        }
    }
    Ok(root)
}

/// `true`/`false` become booleans; values with `.`, `e` or `E` try float,
/// others try integer; anything unparseable stays a string.
pub fn coerce_scalar(value: &str) -> Value {
    let lowered = value.to_lowercase();
    if lowered == "true" || lowered == "false" {
        return Value::Bool(lowered == "true");
    }
    let numeric = if value.contains(['.', 'e', 'E']) {
        value
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .and_then(Number::from_f64)
    } else {
        value.parse::<i64>().ok().map(Number::from)
    };
    match numeric {
        Some(number) => Value::Number(number),
        None => Value::String(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = PackConfig::default();
        assert_eq!(config.pagerank.lambda, 0.85);
        assert_eq!(config.pagerank.theta, 0.6);
        assert_eq!(config.weights.intent, 0.40);
        assert_eq!(config.weights.role, 0.05);
        assert_eq!(config.recency_halflife_days, 45);
        assert_eq!(config.diversity.mu_file, 0.15);
        assert_eq!(config.limits.ncand, 2000);
        assert_eq!(config.limits.iters, 50);
        assert_eq!(config.limits.tol, 1e-6);
    }

    #[test]
    fn test_overrides_keep_unnamed_defaults() {
        let config = PackConfig::from_yaml_str(
            "pagerank:\n  lambda: 0.70\n  theta: 0.5\nweights:\n  intent: 0.5\nlimits:\n  ncand: 10\n",
        )
        .unwrap();
        assert_eq!(config.pagerank.lambda, 0.70);
        assert_eq!(config.pagerank.theta, 0.5);
        assert_eq!(config.limits.ncand, 10);
        assert_eq!(config.limits.iters, 50);
        assert_eq!(config.diversity, DiversityConfig::default());
        assert_eq!(config.recency_halflife_days, 45);
    }

    #[test]
    fn test_weights_map_replaces_defaults() {
        let config = PackConfig::from_yaml_str("weights:\n  intent: 0.5\n").unwrap();
        assert_eq!(config.weights.intent, 0.5);
        assert_eq!(config.weights.diff, 0.0);
        assert_eq!(config.weights.hub, 0.0);
    }

    #[test]
    fn test_comments_and_blank_lines_are_skipped() {
        let config = PackConfig::from_yaml_str(
            "# tuned for review packets\n\nrecency_halflife_days: 30  # a month\ndiversity:\n    mu_file: 0.3\n",
        )
        .unwrap();
        assert_eq!(config.recency_halflife_days, 30);
        assert_eq!(config.diversity.mu_file, 0.3);
        assert_eq!(config.diversity.mu_role, 0.10);
    }

    #[test]
    fn test_integer_for_float_field_is_accepted() {
        let config = PackConfig::from_yaml_str("pagerank:\n  lambda: 1\n").unwrap();
        assert_eq!(config.pagerank.lambda, 1.0);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = PackConfig::from_yaml_str("pagerank:\n  gamma: 0.3\n").unwrap_err();
        assert!(matches!(err, PackError::UnknownKey(ref key) if key == "gamma"), "{err}");
        let err = PackConfig::from_yaml_str("extras: 1\n").unwrap_err();
        assert!(matches!(err, PackError::UnknownKey(ref key) if key == "extras"), "{err}");
    }

    #[test]
    fn test_mistyped_value_is_rejected() {
        let err = PackConfig::from_yaml_str("limits:\n  iters: lots\n").unwrap_err();
        assert!(matches!(err, PackError::Invalid(_)), "{err}");
        assert!(!err.to_string().contains("line 0"), "{err}");
    }

    #[test]
    fn test_second_nesting_level_is_rejected() {
        let err = PackConfig::from_yaml_str("limits:\n  nested:\n    iters: 3\n").unwrap_err();
        assert!(matches!(err, PackError::Config { line: 2, .. }), "{err}");
    }

    #[test]
    fn test_coerce_scalar() {
        assert_eq!(coerce_scalar("TRUE"), json!(true));
        assert_eq!(coerce_scalar("false"), json!(false));
        assert_eq!(coerce_scalar("42"), json!(42));
        assert_eq!(coerce_scalar("1e-6"), json!(1e-6));
        assert_eq!(coerce_scalar("0.25"), json!(0.25));
        assert_eq!(coerce_scalar("docs/a.md"), json!("docs/a.md"));
    }

    #[test]
    fn test_load_config_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(Some(&dir.path().join("absent.yaml"))).unwrap();
        assert_eq!(config, PackConfig::default());
    }

    #[test]
    fn test_load_config_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "limits:\n  iters: 5\n  tol: 0.001\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.limits.iters, 5);
        assert_eq!(config.limits.tol, 0.001);
    }
}
