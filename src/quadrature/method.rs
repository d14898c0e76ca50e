use std::fmt;
use std::sync::Arc;

use serde::{
    Deserialize,
    Serialize
};

use crate::manager::manager::{
    IManager,
    Manager
};
use crate::manager::managererror::ManagerError;
use crate::manager::namedobject::NamedObject;
use crate::math::interval::Interval;
use crate::quadrature::adaptive::Adaptive;
use crate::quadrature::integrator::Integrator;
use crate::quadrature::options::OptionOverrides;
use crate::quadrature::quadratureerror::{
    ConfigurationError,
    QuadratureResult
};
use crate::quadrature::rule::accelerated;
use crate::quadrature::substitute::{
    ExponentialUpper,
    Infinitize,
    InversePowerLaw,
    InverseSqrt,
    Side,
    Substituted
};

/// 別名展開的最大深度；超過即視為循環。
pub const MAX_METHOD_DEPTH: usize = 32;

pub const BUILTIN_METHODS: [&str; 9] = [
    "midpoint", "trapezoid", "simpson", "boole", "romberg", "milne", "adaptive", "open", "closed"
];

pub fn is_builtin_method(name: &str) -> bool {
    BUILTIN_METHODS.contains(&name)
}

// ─────────────────────────────────────────────────────────────────────────────
// SubstitutionSpec
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubstitutionSpec {
    Infinitize,
    ExponentialUpper,
    InverseSqrt(Side),
    InversePowerLaw { gamma: f64, side: Side }
}

impl SubstitutionSpec {
    /// 由名稱（與 inverse power law 的 `gamma`）建立；名稱未知或 `gamma` 缺漏皆為設定錯誤。
    pub fn from_name(name: &str, gamma: Option<f64>) -> QuadratureResult<SubstitutionSpec> {
        let power_law = |side: Side| -> QuadratureResult<SubstitutionSpec> {
            let gamma = gamma.ok_or_else(|| ConfigurationError::InvalidOption {
                option: "gamma",
                reason: format!("substitution '{}' requires an exponent", name)
            })?;
            InversePowerLaw::new(gamma, side)?;
            Ok(SubstitutionSpec::InversePowerLaw { gamma, side })
        };
        match name {
            "infinitize" => Ok(SubstitutionSpec::Infinitize),
            "exponential-upper" => Ok(SubstitutionSpec::ExponentialUpper),
            "inverse-sqrt-lower" => Ok(SubstitutionSpec::InverseSqrt(Side::Lower)),
            "inverse-sqrt-upper" => Ok(SubstitutionSpec::InverseSqrt(Side::Upper)),
            "inverse-power-law-lower" => power_law(Side::Lower),
            "inverse-power-law-upper" => power_law(Side::Upper),
            other => Err(ConfigurationError::UnknownSubstitution(other.to_owned()).into())
        }
    }

    pub fn wrap(&self, inner: Arc<dyn Integrator>) -> QuadratureResult<Arc<dyn Integrator>> {
        let wrapped: Arc<dyn Integrator> = match *self {
            SubstitutionSpec::Infinitize => Arc::new(Substituted::new(Infinitize, inner)),
            SubstitutionSpec::ExponentialUpper => Arc::new(Substituted::new(ExponentialUpper, inner)),
            SubstitutionSpec::InverseSqrt(side) => Arc::new(Substituted::new(InverseSqrt::new(side), inner)),
            SubstitutionSpec::InversePowerLaw { gamma, side } => {
                Arc::new(Substituted::new(InversePowerLaw::new(gamma, side)?, inner))
            }
        };
        Ok(wrapped)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SubstitutionJsonProp {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    gamma: Option<f64>
}

// ─────────────────────────────────────────────────────────────────────────────
// MethodSpec
// ─────────────────────────────────────────────────────────────────────────────

/// 積分方法的描述：名稱、直接給定的積分器，或附帶選項／代換的巢狀描述。
#[derive(Clone)]
pub enum MethodSpec {
    Named(String),
    Direct(Arc<dyn Integrator>),
    WithOptions(Box<MethodSpec>, OptionOverrides),
    WithSubstitution(Box<MethodSpec>, SubstitutionSpec)
}

impl MethodSpec {
    pub fn named(name: impl Into<String>) -> MethodSpec {
        MethodSpec::Named(name.into())
    }

    pub fn direct(integrator: Arc<dyn Integrator>) -> MethodSpec {
        MethodSpec::Direct(integrator)
    }

    pub fn with_options(self, overrides: OptionOverrides) -> MethodSpec {
        MethodSpec::WithOptions(Box::new(self), overrides)
    }

    pub fn with_substitution(self, substitution: SubstitutionSpec) -> MethodSpec {
        MethodSpec::WithSubstitution(Box::new(self), substitution)
    }

    /// 以代換名稱包裝；名稱未知時立即回傳 `UnknownSubstitution`。
    pub fn substituted(self, name: &str, gamma: Option<f64>) -> QuadratureResult<MethodSpec> {
        Ok(self.with_substitution(SubstitutionSpec::from_name(name, gamma)?))
    }
}

impl Default for MethodSpec {
    fn default() -> Self {
        MethodSpec::named("adaptive")
    }
}

impl fmt::Debug for MethodSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodSpec::Named(name) => f.debug_tuple("Named").field(name).finish(),
            MethodSpec::Direct(_) => f.write_str("Direct(..)"),
            MethodSpec::WithOptions(inner, overrides) => {
                f.debug_tuple("WithOptions").field(inner).field(overrides).finish()
            },
            MethodSpec::WithSubstitution(inner, substitution) => {
                f.debug_tuple("WithSubstitution").field(inner).field(substitution).finish()
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MethodDefinition：設定檔中的具名方法
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct MethodDefinitionJsonProp {
    name: String,
    method: String,
    #[serde(default)]
    options: OptionOverrides,
    #[serde(default)]
    substitution: Option<SubstitutionJsonProp>
}

#[derive(Debug, Clone)]
pub struct MethodDefinition {
    name: String,
    spec: MethodSpec
}

impl MethodDefinition {
    pub fn new(name: impl Into<String>, spec: MethodSpec) -> MethodDefinition {
        MethodDefinition { name: name.into(), spec }
    }

    pub fn spec(&self) -> &MethodSpec {
        &self.spec
    }

    pub fn from_json(json_value: serde_json::Value) -> Result<MethodDefinition, ManagerError> {
        let prop: MethodDefinitionJsonProp = ManagerError::from_json_or_json_parse_error(json_value)?;
        let mut spec = MethodSpec::Named(prop.method);
        if let Some(substitution) = prop.substitution {
            spec = spec.substituted(&substitution.kind, substitution.gamma)?;
        }
        if prop.options != OptionOverrides::default() {
            spec = spec.with_options(prop.options);
        }
        Ok(MethodDefinition::new(prop.name, spec))
    }
}

impl NamedObject for MethodDefinition {
    fn name(&self) -> &str {
        &self.name
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MethodRegistry
// ─────────────────────────────────────────────────────────────────────────────

/// 內建方法加上使用者登錄的具名方法；內建名稱保留，不可覆寫。
pub struct MethodRegistry {
    definitions: Manager<MethodDefinition>
}

impl Default for MethodRegistry {
    fn default() -> Self {
        MethodRegistry::new()
    }
}

impl MethodRegistry {
    pub fn new() -> MethodRegistry {
        MethodRegistry {
            definitions: Manager::with_reserved_names(MethodDefinition::from_json, is_builtin_method)
        }
    }

    pub fn definitions(&self) -> &Manager<MethodDefinition> {
        &self.definitions
    }

    pub fn register(&self, name: impl Into<String>, spec: MethodSpec) -> Result<(), ManagerError> {
        self.definitions.insert(MethodDefinition::new(name, spec))
    }

    /// 遞迴展開 `spec`，回傳積分器與累積的選項（外層優先）。
    pub fn resolve(&self, spec: &MethodSpec) -> QuadratureResult<(Arc<dyn Integrator>, OptionOverrides)> {
        self.resolve_at_depth(spec, 0)
    }

    fn resolve_at_depth(
        &self,
        spec: &MethodSpec,
        depth: usize,
    ) -> QuadratureResult<(Arc<dyn Integrator>, OptionOverrides)> {
        if depth > MAX_METHOD_DEPTH {
            let name = match spec {
                MethodSpec::Named(name) => name.clone(),
                other => format!("{:?}", other)
            };
            return Err(ConfigurationError::MethodAliasCycle(name).into());
        }
        match spec {
            MethodSpec::Direct(integrator) => Ok((integrator.clone(), OptionOverrides::new())),
            MethodSpec::WithOptions(inner, overrides) => {
                let (integrator, inner_overrides) = self.resolve_at_depth(inner, depth + 1)?;
                Ok((integrator, inner_overrides.overridden_by(overrides)))
            },
            MethodSpec::WithSubstitution(inner, substitution) => {
                let (integrator, overrides) = self.resolve_at_depth(inner, depth + 1)?;
                Ok((substitution.wrap(integrator)?, overrides))
            },
            MethodSpec::Named(name) => {
                if let Some(resolved) = builtin(name) {
                    return Ok(resolved);
                }
                match self.definitions.get(name) {
                    Ok(definition) => self.resolve_at_depth(definition.spec(), depth + 1),
                    Err(_) => Err(ConfigurationError::UnknownMethod(name.clone()).into())
                }
            }
        }
    }
}

fn adaptive() -> Arc<dyn Integrator> {
    Arc::new(Adaptive::new(Arc::new(accelerated::milne()), Arc::new(accelerated::romberg())))
}

fn builtin(name: &str) -> Option<(Arc<dyn Integrator>, OptionOverrides)> {
    let interval = |interval: Interval| OptionOverrides {
        interval: Some(interval),
        ..OptionOverrides::new()
    };
    let integrator: Arc<dyn Integrator> = match name {
        "midpoint" => Arc::new(accelerated::midpoint()),
        "trapezoid" => Arc::new(accelerated::trapezoid()),
        "simpson" => Arc::new(accelerated::simpson()),
        "boole" => Arc::new(accelerated::boole()),
        "romberg" => Arc::new(accelerated::romberg()),
        "milne" => Arc::new(accelerated::milne()),
        "adaptive" => adaptive(),
        "open" => return Some((adaptive(), interval(Interval::OPEN))),
        "closed" => return Some((adaptive(), interval(Interval::CLOSED))),
        _ => return None
    };
    Some((integrator, OptionOverrides::new()))
}
