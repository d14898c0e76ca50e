use std::sync::Arc;

use crate::math::sequence::convergence::Verdict;
use crate::quadrature::integrator::{
    Integrand,
    Integrator
};
use crate::quadrature::options::IntegrationOptions;
use crate::quadrature::quadratureerror::{
    ConfigurationError,
    QuadratureResult
};

// ─────────────────────────────────────────────────────────────────────────────
// Substitution
// ─────────────────────────────────────────────────────────────────────────────
//
// ∫_a^b f(x) dx = scale · ∫_lo^hi g(t) dt
//
// 代換把無窮端點或端點奇異性移到 t 空間中有限、可以不取樣的端點上；
// 若 x 端點與 t 端點的左右順序相反（flips_interval），區間型態要一併對調。

pub trait Substitution: Send + Sync {
    fn name(&self) -> &'static str;

    /// t 空間的積分範圍 (lo, hi)，假設 `a <= b`。
    fn bounds(&self, a: f64, b: f64) -> QuadratureResult<(f64, f64)>;

    fn flips_interval(&self) -> bool;

    fn scale(&self) -> f64 {
        1.0
    }

    /// 代換後的被積函數 g(t)。
    fn transformed(&self, f: Integrand<'_>, a: f64, b: f64, t: f64) -> f64;
}

/// 以代換包裝另一個積分器。
pub struct Substituted<S> {
    substitution: S,
    inner: Arc<dyn Integrator>
}

impl<S> Substituted<S>
where
    S: Substitution
{
    pub fn new(substitution: S, inner: Arc<dyn Integrator>) -> Substituted<S> {
        Substituted { substitution, inner }
    }

    pub fn substitution(&self) -> &S {
        &self.substitution
    }

    pub fn inner(&self) -> &Arc<dyn Integrator> {
        &self.inner
    }
}

impl<S> Integrator for Substituted<S>
where
    S: Substitution
{
    fn integrate(
        &self,
        f: Integrand<'_>,
        a: f64,
        b: f64,
        options: &IntegrationOptions,
    ) -> QuadratureResult<Verdict> {
        if b < a {
            let flipped = options.with_interval(options.interval().flip());
            return Ok(self.integrate(f, b, a, &flipped)?.map_result(|r| -r));
        }
        let (lo, hi) = self.substitution.bounds(a, b)?;
        let interval = if self.substitution.flips_interval() {
            options.interval().flip()
        } else {
            options.interval()
        };
        let g = |t: f64| self.substitution.transformed(f, a, b, t);
        let scale = self.substitution.scale();
        let verdict = self.inner.integrate(&g, lo, hi, &options.with_interval(interval))?;
        Ok(verdict.map_result(|r| scale * r))
    }
}

fn reciprocal(x: f64) -> f64 {
    if x.is_infinite() { 0.0 } else { 1.0 / x }
}

// ── 1/t ─────────────────────────────────────────────────────────────────────

/// `x = 1/t`：`∫_a^b f(x) dx = ∫_{1/b}^{1/a} f(1/t)/t² dt`，`1/±∞ = 0`。
/// 兩端點須同號且不為 0。
#[derive(Debug, Clone, Copy, Default)]
pub struct Infinitize;

impl Substitution for Infinitize {
    fn name(&self) -> &'static str {
        "infinitize"
    }

    fn bounds(&self, a: f64, b: f64) -> QuadratureResult<(f64, f64)> {
        if !(a * b > 0.0) {
            return Err(ConfigurationError::OppositeSignEndpoints { a, b }.into());
        }
        Ok((reciprocal(b), reciprocal(a)))
    }

    fn flips_interval(&self) -> bool {
        true
    }

    fn transformed(&self, f: Integrand<'_>, _a: f64, _b: f64, t: f64) -> f64 {
        f(1.0 / t) / (t * t)
    }
}

// ── e^{-x} ──────────────────────────────────────────────────────────────────

/// `x = -ln t`：`∫_a^b f(x) dx = ∫_{e^{-b}}^{e^{-a}} f(-ln t)/t dt`，適用 `b = +∞`。
#[derive(Debug, Clone, Copy, Default)]
pub struct ExponentialUpper;

impl Substitution for ExponentialUpper {
    fn name(&self) -> &'static str {
        "exponential-upper"
    }

    fn bounds(&self, a: f64, b: f64) -> QuadratureResult<(f64, f64)> {
        Ok(((-b).exp(), (-a).exp()))
    }

    fn flips_interval(&self) -> bool {
        true
    }

    fn transformed(&self, f: Integrand<'_>, _a: f64, _b: f64, t: f64) -> f64 {
        f(-t.ln()) / t
    }
}

// ── 端點奇異性 ──────────────────────────────────────────────────────────────

/// 奇異點所在的端點。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Lower,
    Upper
}

/// `t = (x - a)^(1-γ)`（或 `(b - x)^(1-γ)`），處理 `(x - a)^{-γ}` 型的端點奇異性。
#[derive(Debug, Clone, Copy)]
pub struct InversePowerLaw {
    gamma: f64,
    side: Side
}

impl InversePowerLaw {
    pub fn new(gamma: f64, side: Side) -> QuadratureResult<InversePowerLaw> {
        if !(0.0..1.0).contains(&gamma) {
            return Err(ConfigurationError::InvalidExponent(gamma).into());
        }
        Ok(InversePowerLaw { gamma, side })
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn side(&self) -> Side {
        self.side
    }
}

impl Substitution for InversePowerLaw {
    fn name(&self) -> &'static str {
        match self.side {
            Side::Lower => "inverse-power-law-lower",
            Side::Upper => "inverse-power-law-upper"
        }
    }

    fn bounds(&self, a: f64, b: f64) -> QuadratureResult<(f64, f64)> {
        Ok((0.0, (b - a).powf(1.0 - self.gamma)))
    }

    fn flips_interval(&self) -> bool {
        self.side == Side::Upper
    }

    fn scale(&self) -> f64 {
        1.0 / (1.0 - self.gamma)
    }

    fn transformed(&self, f: Integrand<'_>, a: f64, b: f64, t: f64) -> f64 {
        let exponent = 1.0 / (1.0 - self.gamma);
        let jacobian = t.powf(self.gamma * exponent);
        let offset = t.powf(exponent);
        match self.side {
            Side::Lower => jacobian * f(a + offset),
            Side::Upper => jacobian * f(b - offset)
        }
    }
}

/// `t² = x - a`（或 `b - x`），即 γ = 1/2 的 inverse power law。
#[derive(Debug, Clone, Copy)]
pub struct InverseSqrt {
    side: Side
}

impl InverseSqrt {
    pub fn new(side: Side) -> InverseSqrt {
        InverseSqrt { side }
    }

    pub fn side(&self) -> Side {
        self.side
    }
}

impl Substitution for InverseSqrt {
    fn name(&self) -> &'static str {
        match self.side {
            Side::Lower => "inverse-sqrt-lower",
            Side::Upper => "inverse-sqrt-upper"
        }
    }

    fn bounds(&self, a: f64, b: f64) -> QuadratureResult<(f64, f64)> {
        Ok((0.0, (b - a).sqrt()))
    }

    fn flips_interval(&self) -> bool {
        self.side == Side::Upper
    }

    fn transformed(&self, f: Integrand<'_>, a: f64, b: f64, t: f64) -> f64 {
        match self.side {
            Side::Lower => 2.0 * t * f(a + t * t),
            Side::Upper => 2.0 * t * f(b - t * t)
        }
    }
}
