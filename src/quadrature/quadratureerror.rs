use thiserror::Error;

pub type QuadratureResult<T> = Result<T, QuadratureError>;

// ─────────────────────────────────────────────────────────────────────────────
// ConfigurationError：在任何 integrand 求值之前即拒絕
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("unknown integration method '{0}'")]
    UnknownMethod(String),

    #[error("unknown substitution '{0}'")]
    UnknownSubstitution(String),

    #[error("method alias '{0}' does not resolve to an integrator (cycle or nesting too deep)")]
    MethodAliasCycle(String),

    #[error("inverse power law exponent must lie in [0, 1), got {0}")]
    InvalidExponent(f64),

    #[error("invalid slice count: {0}")]
    InvalidSliceCount(String),

    #[error("invalid option '{option}': {reason}")]
    InvalidOption {
        option: &'static str,
        reason: String
    },

    #[error("infinitize requires both endpoints to share a sign, got [{a}, {b}]")]
    OppositeSignEndpoints { a: f64, b: f64 },

    #[error("richardson factor t must be greater than 1, got {0}")]
    InvalidRichardsonFactor(f64)
}

// ─────────────────────────────────────────────────────────────────────────────
// QuadratureError
// ─────────────────────────────────────────────────────────────────────────────

/// 不收斂不屬於錯誤（回傳 `converged = false` 的 `Verdict`）；
/// 這裡只放設定錯誤與數值退化。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuadratureError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("coincident abscissas {left} and {right} in extrapolation tableau")]
    DegenerateAbscissas { left: f64, right: f64 },

    #[error("estimate over [{left}, {right}] is not finite")]
    NonFiniteEstimate { left: f64, right: f64 },

    #[error("no estimate available: the sequence produced no terms")]
    EmptySequence
}

impl QuadratureError {
    pub fn invalid_option(option: &'static str, reason: impl Into<String>) -> QuadratureError {
        QuadratureError::Configuration(ConfigurationError::InvalidOption {
            option,
            reason: reason.into()
        })
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, QuadratureError::Configuration(_))
    }
}
