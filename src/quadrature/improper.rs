use std::sync::Arc;

use tracing::debug;

use crate::math::compensatedsum::CompensatedSum;
use crate::math::interval::Interval;
use crate::math::sequence::convergence::Verdict;
use crate::quadrature::integrator::{
    Integrand,
    Integrator
};
use crate::quadrature::options::IntegrationOptions;
use crate::quadrature::quadratureerror::{
    QuadratureError,
    QuadratureResult
};
use crate::quadrature::substitute::{
    Infinitize,
    Substituted
};

// ─────────────────────────────────────────────────────────────────────────────
// EndpointCase
// ─────────────────────────────────────────────────────────────────────────────

/// 積分範圍 (a, b) 的端點分類；每組端點恰好落在一類。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointCase {
    /// a、b 為同一個無窮大
    SameInfinity,
    /// b = -∞ 或 a = +∞
    Descending,
    /// (-∞, +∞)
    FullLine,
    /// a = -∞，b 有限
    LeftInfinite,
    /// a 有限，b = +∞
    RightInfinite,
    Finite
}

impl EndpointCase {
    pub fn classify(a: f64, b: f64) -> EndpointCase {
        if a.is_infinite() && a == b {
            EndpointCase::SameInfinity
        } else if b == f64::NEG_INFINITY || a == f64::INFINITY {
            EndpointCase::Descending
        } else if a == f64::NEG_INFINITY && b == f64::INFINITY {
            EndpointCase::FullLine
        } else if a == f64::NEG_INFINITY {
            EndpointCase::LeftInfinite
        } else if b == f64::INFINITY {
            EndpointCase::RightInfinite
        } else {
            EndpointCase::Finite
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Improper
// ─────────────────────────────────────────────────────────────────────────────

/// 把無窮端點拆成「有限段 + 以 `Infinitize` 代換的尾段」，交給內層積分器。
/// 斷點 `B = infinite-breakpoint`。
pub struct Improper {
    inner: Arc<dyn Integrator>,
    tail: Substituted<Infinitize>
}

impl Improper {
    pub fn new(inner: Arc<dyn Integrator>) -> Improper {
        Improper {
            tail: Substituted::new(Infinitize, inner.clone()),
            inner
        }
    }

    pub fn inner(&self) -> &Arc<dyn Integrator> {
        &self.inner
    }

    fn piece(
        &self,
        integrator: &dyn Integrator,
        f: Integrand<'_>,
        a: f64,
        b: f64,
        options: &IntegrationOptions,
        interval: Interval,
    ) -> QuadratureResult<Verdict> {
        integrator.integrate(f, a, b, &options.with_interval(interval))
    }

    fn descending(&self, f: Integrand<'_>, a: f64, b: f64, options: &IntegrationOptions) -> QuadratureResult<Verdict> {
        let flipped = options.with_interval(options.interval().flip());
        Ok(self.integrate(f, b, a, &flipped)?.map_result(|r| -r))
    }

    // 無窮端點一律 open：代換後它落在 t = 0，那裡的 f(1/t)/t² 無法求值。

    fn full_line(&self, f: Integrand<'_>, options: &IntegrationOptions) -> QuadratureResult<Verdict> {
        let breakpoint = options.infinite_breakpoint();
        let interval = options.interval();
        combine([
            self.piece(&self.tail, f, f64::NEG_INFINITY, -breakpoint, options, interval.open_left().close_right())?,
            self.piece(self.inner.as_ref(), f, -breakpoint, breakpoint, options, Interval::OPEN)?,
            self.piece(&self.tail, f, breakpoint, f64::INFINITY, options, interval.close_left().open_right())?
        ])
    }

    fn left_infinite(&self, f: Integrand<'_>, b: f64, options: &IntegrationOptions) -> QuadratureResult<Verdict> {
        let breakpoint = options.infinite_breakpoint();
        let interval = options.interval();
        if b <= -breakpoint {
            return self.piece(&self.tail, f, f64::NEG_INFINITY, b, options, interval.open_left());
        }
        combine([
            self.piece(&self.tail, f, f64::NEG_INFINITY, -breakpoint, options, interval.open_left().close_right())?,
            self.piece(self.inner.as_ref(), f, -breakpoint, b, options, interval.open_left())?
        ])
    }

    fn right_infinite(&self, f: Integrand<'_>, a: f64, options: &IntegrationOptions) -> QuadratureResult<Verdict> {
        let breakpoint = options.infinite_breakpoint();
        let interval = options.interval();
        if a >= breakpoint {
            return self.piece(&self.tail, f, a, f64::INFINITY, options, interval.open_right());
        }
        combine([
            self.piece(self.inner.as_ref(), f, a, breakpoint, options, interval.open_right())?,
            self.piece(&self.tail, f, breakpoint, f64::INFINITY, options, interval.close_left().open_right())?
        ])
    }
}

/// 各段皆收斂才算收斂；`terms_checked` 相加，結果以 Kahan 累加。
fn combine<const N: usize>(verdicts: [Verdict; N]) -> QuadratureResult<Verdict> {
    let mut total = CompensatedSum::new();
    let mut converged = true;
    let mut terms_checked = 0;
    for verdict in verdicts.iter() {
        total.add(verdict.result().ok_or(QuadratureError::EmptySequence)?);
        converged &= verdict.is_converged();
        terms_checked += verdict.terms_checked();
    }
    Ok(Verdict::new(converged, terms_checked, Some(total.value())))
}

impl Integrator for Improper {
    fn integrate(
        &self,
        f: Integrand<'_>,
        a: f64,
        b: f64,
        options: &IntegrationOptions,
    ) -> QuadratureResult<Verdict> {
        let case = EndpointCase::classify(a, b);
        debug!(a, b, case = ?case, "improper integral dispatch");
        match case {
            EndpointCase::SameInfinity => Ok(Verdict::converged(0, 0.0)),
            EndpointCase::Descending => self.descending(f, a, b, options),
            EndpointCase::FullLine => self.full_line(f, options),
            EndpointCase::LeftInfinite => self.left_infinite(f, b, options),
            EndpointCase::RightInfinite => self.right_infinite(f, a, options),
            EndpointCase::Finite => self.inner.integrate(f, a, b, options)
        }
    }
}
