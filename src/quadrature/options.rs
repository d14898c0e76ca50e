use serde::{
    Deserialize,
    Serialize
};

use crate::math::interval::Interval;
use crate::math::sequence::convergence::{
    ConvergencePolicy,
    default_tolerance
};
use crate::quadrature::quadratureerror::{
    ConfigurationError,
    QuadratureError,
    QuadratureResult
};

pub const DEFAULT_ADAPTIVE_MAXTERMS: usize = 10;
pub const DEFAULT_ADAPTIVE_MAX_ITERATIONS: usize = 10_000;
pub const DEFAULT_NEIGHBORHOOD_WIDTH: f64 = 0.05;
pub const DEFAULT_INFINITE_BREAKPOINT: f64 = 1.0;
pub const DEFAULT_ROUNDOFF_CUTOFF: f64 = 1e-14;

// ─────────────────────────────────────────────────────────────────────────────
// SliceCounts
// ─────────────────────────────────────────────────────────────────────────────

/// 初始切片數，或明確給定的（嚴格遞增）切片數序列。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SliceCounts {
    Initial(usize),
    Explicit(Vec<usize>)
}

impl SliceCounts {
    pub fn validate(&self) -> QuadratureResult<()> {
        match self {
            SliceCounts::Initial(0) => {
                Err(ConfigurationError::InvalidSliceCount("initial slice count must be positive".to_owned()).into())
            },
            SliceCounts::Initial(_) => Ok(()),
            SliceCounts::Explicit(ns) => {
                if ns.is_empty() {
                    return Err(ConfigurationError::InvalidSliceCount("explicit sequence is empty".to_owned()).into());
                }
                if ns[0] == 0 {
                    return Err(ConfigurationError::InvalidSliceCount("slice counts must be positive".to_owned()).into());
                }
                if ns.windows(2).any(|w| w[1] <= w[0]) {
                    return Err(ConfigurationError::InvalidSliceCount(format!("{:?} is not strictly increasing", ns)).into());
                }
                Ok(())
            }
        }
    }
}

impl Default for SliceCounts {
    fn default() -> Self {
        SliceCounts::Initial(1)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// OptionOverrides
// ─────────────────────────────────────────────────────────────────────────────

/// 呼叫端給的部分設定；未給的欄位沿用預設值。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct OptionOverrides {
    pub interval: Option<Interval>,
    pub tolerance: Option<f64>,
    pub minterms: Option<usize>,
    pub maxterms: Option<usize>,
    pub n: Option<SliceCounts>,
    #[serde(alias = "accelerate?")]
    pub accelerate: Option<bool>,
    pub adaptive_neighborhood_width: Option<f64>,
    pub adaptive_maxterms: Option<usize>,
    pub adaptive_max_iterations: Option<usize>,
    pub infinite_breakpoint: Option<f64>,
    pub roundoff_cutoff: Option<f64>,
    pub seed: Option<u64>,
    pub memoize: Option<bool>
}

impl OptionOverrides {
    pub fn new() -> OptionOverrides {
        OptionOverrides::default()
    }

    /// `outer` 的欄位優先，其餘沿用 `self`。
    pub fn overridden_by(&self, outer: &OptionOverrides) -> OptionOverrides {
        OptionOverrides {
            interval: outer.interval.or(self.interval),
            tolerance: outer.tolerance.or(self.tolerance),
            minterms: outer.minterms.or(self.minterms),
            maxterms: outer.maxterms.or(self.maxterms),
            n: outer.n.clone().or_else(|| self.n.clone()),
            accelerate: outer.accelerate.or(self.accelerate),
            adaptive_neighborhood_width: outer.adaptive_neighborhood_width.or(self.adaptive_neighborhood_width),
            adaptive_maxterms: outer.adaptive_maxterms.or(self.adaptive_maxterms),
            adaptive_max_iterations: outer.adaptive_max_iterations.or(self.adaptive_max_iterations),
            infinite_breakpoint: outer.infinite_breakpoint.or(self.infinite_breakpoint),
            roundoff_cutoff: outer.roundoff_cutoff.or(self.roundoff_cutoff),
            seed: outer.seed.or(self.seed),
            memoize: outer.memoize.or(self.memoize)
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// IntegrationOptions
// ─────────────────────────────────────────────────────────────────────────────

/// 完整的積分設定。每次頂層呼叫合併一次，遞迴子呼叫時原封傳遞，
/// 只有 `interval` 會隨區間切分而改寫。
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrationOptions {
    interval: Interval,
    tolerance: f64,
    minterms: usize,
    maxterms: Option<usize>,
    n: SliceCounts,
    accelerate: bool,
    adaptive_neighborhood_width: f64,
    adaptive_maxterms: usize,
    adaptive_max_iterations: usize,
    infinite_breakpoint: f64,
    roundoff_cutoff: f64,
    seed: Option<u64>,
    memoize: bool
}

impl Default for IntegrationOptions {
    fn default() -> Self {
        IntegrationOptions {
            interval: Interval::OPEN,
            tolerance: default_tolerance(),
            minterms: 2,
            maxterms: None,
            n: SliceCounts::default(),
            accelerate: false,
            adaptive_neighborhood_width: DEFAULT_NEIGHBORHOOD_WIDTH,
            adaptive_maxterms: DEFAULT_ADAPTIVE_MAXTERMS,
            adaptive_max_iterations: DEFAULT_ADAPTIVE_MAX_ITERATIONS,
            infinite_breakpoint: DEFAULT_INFINITE_BREAKPOINT,
            roundoff_cutoff: DEFAULT_ROUNDOFF_CUTOFF,
            seed: None,
            memoize: true
        }
    }
}

impl IntegrationOptions {
    pub fn new() -> IntegrationOptions {
        IntegrationOptions::default()
    }

    pub fn merge(&self, overrides: &OptionOverrides) -> IntegrationOptions {
        IntegrationOptions {
            interval: overrides.interval.unwrap_or(self.interval),
            tolerance: overrides.tolerance.unwrap_or(self.tolerance),
            minterms: overrides.minterms.unwrap_or(self.minterms),
            maxterms: overrides.maxterms.or(self.maxterms),
            n: overrides.n.clone().unwrap_or_else(|| self.n.clone()),
            accelerate: overrides.accelerate.unwrap_or(self.accelerate),
            adaptive_neighborhood_width: overrides.adaptive_neighborhood_width.unwrap_or(self.adaptive_neighborhood_width),
            adaptive_maxterms: overrides.adaptive_maxterms.unwrap_or(self.adaptive_maxterms),
            adaptive_max_iterations: overrides.adaptive_max_iterations.unwrap_or(self.adaptive_max_iterations),
            infinite_breakpoint: overrides.infinite_breakpoint.unwrap_or(self.infinite_breakpoint),
            roundoff_cutoff: overrides.roundoff_cutoff.unwrap_or(self.roundoff_cutoff),
            seed: overrides.seed.or(self.seed),
            memoize: overrides.memoize.unwrap_or(self.memoize)
        }
    }

    pub fn validate(&self) -> QuadratureResult<()> {
        if !(self.tolerance > 0.0) || !self.tolerance.is_finite() {
            return Err(QuadratureError::invalid_option("tolerance", format!("must be positive and finite, got {}", self.tolerance)));
        }
        if self.minterms == 0 {
            return Err(QuadratureError::invalid_option("minterms", "must be at least 1"));
        }
        if self.maxterms == Some(0) {
            return Err(QuadratureError::invalid_option("maxterms", "must be at least 1"));
        }
        self.n.validate()?;
        if !(0.0..1.0).contains(&self.adaptive_neighborhood_width) {
            return Err(QuadratureError::invalid_option(
                "adaptive-neighborhood-width",
                format!("must lie in [0, 1), got {}", self.adaptive_neighborhood_width),
            ));
        }
        if self.adaptive_maxterms == 0 {
            return Err(QuadratureError::invalid_option("adaptive-maxterms", "must be at least 1"));
        }
        if self.adaptive_max_iterations == 0 {
            return Err(QuadratureError::invalid_option("adaptive-max-iterations", "must be at least 1"));
        }
        if !(self.infinite_breakpoint > 0.0) || !self.infinite_breakpoint.is_finite() {
            return Err(QuadratureError::invalid_option(
                "infinite-breakpoint",
                format!("must be positive and finite, got {}", self.infinite_breakpoint),
            ));
        }
        if !(self.roundoff_cutoff >= 0.0) || !self.roundoff_cutoff.is_finite() {
            return Err(QuadratureError::invalid_option(
                "roundoff-cutoff",
                format!("must be non-negative and finite, got {}", self.roundoff_cutoff),
            ));
        }
        Ok(())
    }

    pub fn convergence_policy(&self) -> ConvergencePolicy {
        ConvergencePolicy::new()
            .with_tolerance(self.tolerance)
            .with_minterms(self.minterms)
            .with_maxterms(self.maxterms)
    }

    pub fn with_interval(&self, interval: Interval) -> IntegrationOptions {
        IntegrationOptions { interval, ..self.clone() }
    }

    pub fn with_maxterms(&self, maxterms: Option<usize>) -> IntegrationOptions {
        IntegrationOptions { maxterms, ..self.clone() }
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn minterms(&self) -> usize {
        self.minterms
    }

    pub fn maxterms(&self) -> Option<usize> {
        self.maxterms
    }

    pub fn n(&self) -> &SliceCounts {
        &self.n
    }

    pub fn accelerate(&self) -> bool {
        self.accelerate
    }

    pub fn adaptive_neighborhood_width(&self) -> f64 {
        self.adaptive_neighborhood_width
    }

    pub fn adaptive_maxterms(&self) -> usize {
        self.adaptive_maxterms
    }

    pub fn adaptive_max_iterations(&self) -> usize {
        self.adaptive_max_iterations
    }

    pub fn infinite_breakpoint(&self) -> f64 {
        self.infinite_breakpoint
    }

    pub fn roundoff_cutoff(&self) -> f64 {
        self.roundoff_cutoff
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn memoize(&self) -> bool {
        self.memoize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let options = IntegrationOptions::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.interval(), Interval::OPEN);
        assert_eq!(options.minterms(), 2);
        assert_eq!(options.tolerance(), f64::EPSILON.sqrt());
        assert_eq!(options.infinite_breakpoint(), 1.0);
    }

    #[test]
    fn overrides_replace_only_given_fields() {
        let overrides = OptionOverrides {
            tolerance: Some(1e-12),
            interval: Some(Interval::CLOSED),
            ..OptionOverrides::new()
        };
        let merged = IntegrationOptions::default().merge(&overrides);
        assert_eq!(merged.tolerance(), 1e-12);
        assert_eq!(merged.interval(), Interval::CLOSED);
        assert_eq!(merged.minterms(), 2);
        assert_eq!(merged.adaptive_maxterms(), DEFAULT_ADAPTIVE_MAXTERMS);
    }

    #[test]
    fn outer_overrides_win() {
        let inner = OptionOverrides { tolerance: Some(1e-6), minterms: Some(3), ..OptionOverrides::new() };
        let outer = OptionOverrides { tolerance: Some(1e-9), ..OptionOverrides::new() };
        let combined = inner.overridden_by(&outer);
        assert_eq!(combined.tolerance, Some(1e-9));
        assert_eq!(combined.minterms, Some(3));
    }

    #[test]
    fn overrides_parse_from_kebab_case_json() {
        let json = r#"{
            "interval": "closed-open",
            "tolerance": 1e-10,
            "n": [2, 4, 8],
            "accelerate?": true,
            "adaptive-neighborhood-width": 0.0,
            "infinite-breakpoint": 2.5
        }"#;
        let overrides: OptionOverrides = serde_json::from_str(json).unwrap();
        assert_eq!(overrides.interval, Some(Interval::CLOSED_OPEN));
        assert_eq!(overrides.n, Some(SliceCounts::Explicit(vec![2, 4, 8])));
        assert_eq!(overrides.accelerate, Some(true));
        assert_eq!(overrides.infinite_breakpoint, Some(2.5));
    }

    #[test]
    fn unknown_option_keys_are_rejected() {
        assert!(serde_json::from_str::<OptionOverrides>(r#"{"tolerence": 1e-3}"#).is_err());
    }

    #[test]
    fn invalid_values_are_configuration_errors() {
        let bad = [
            OptionOverrides { tolerance: Some(0.0), ..OptionOverrides::new() },
            OptionOverrides { minterms: Some(0), ..OptionOverrides::new() },
            OptionOverrides { n: Some(SliceCounts::Initial(0)), ..OptionOverrides::new() },
            OptionOverrides { n: Some(SliceCounts::Explicit(vec![4, 2])), ..OptionOverrides::new() },
            OptionOverrides { adaptive_neighborhood_width: Some(1.0), ..OptionOverrides::new() },
            OptionOverrides { infinite_breakpoint: Some(-1.0), ..OptionOverrides::new() },
            OptionOverrides { roundoff_cutoff: Some(f64::NAN), ..OptionOverrides::new() },
        ];
        for overrides in bad.iter() {
            let err = IntegrationOptions::default().merge(overrides).validate().unwrap_err();
            assert!(err.is_configuration(), "{:?}", overrides);
        }
    }
}
