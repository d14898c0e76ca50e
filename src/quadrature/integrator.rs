use std::sync::Arc;

use crate::math::extrapolation::neville::modified_neville_tableau;
use crate::math::extrapolation::richardson::{
    richardson_column,
    richardson_sequence
};
use crate::math::sequence::convergence::{
    Verdict,
    try_seq_limit
};
use crate::quadrature::options::{
    IntegrationOptions,
    SliceCounts
};
use crate::quadrature::quadratureerror::{
    QuadratureError,
    QuadratureResult
};

/// 被積函數；假設為純函數。
pub type Integrand<'a> = &'a dyn Fn(f64) -> f64;

// ─────────────────────────────────────────────────────────────────────────────
// Integrator
// ─────────────────────────────────────────────────────────────────────────────

/// 所有積分器（固定規則、adaptive、變數代換、improper）共用的介面。
///
/// `Send + Sync` 使 `Arc<dyn Integrator>` 可以放進 registry 並在 wrapper 之間共享；
/// 積分器本身不持有可變狀態，每次呼叫的序列、堆疊與快取都是區域變數。
pub trait Integrator: Send + Sync {
    fn integrate(
        &self,
        f: Integrand<'_>,
        a: f64,
        b: f64,
        options: &IntegrationOptions,
    ) -> QuadratureResult<Verdict>;

    fn integrate_value(
        &self,
        f: Integrand<'_>,
        a: f64,
        b: f64,
        options: &IntegrationOptions,
    ) -> QuadratureResult<f64> {
        self.integrate(f, a, b, options)?
            .result()
            .ok_or(QuadratureError::EmptySequence)
    }
}

impl<T> Integrator for Arc<T>
where
    T: Integrator + ?Sized
{
    fn integrate(
        &self,
        f: Integrand<'_>,
        a: f64,
        b: f64,
        options: &IntegrationOptions,
    ) -> QuadratureResult<Verdict> {
        (**self).integrate(f, a, b, options)
    }
}

/// 區間寬度相對於端點量級小到 roundoff 等級時，不必再細分。
pub fn narrow_slice(a: f64, b: f64, cutoff: f64) -> bool {
    let magnitude = a.abs() + b.abs();
    magnitude <= cutoff || (b - a).abs() <= cutoff * magnitude
}

/// NaN 或 ±∞ 的估計值不往外傳，改以 `NonFiniteEstimate` 回報。
pub fn ensure_finite(verdict: Verdict, a: f64, b: f64) -> QuadratureResult<Verdict> {
    match verdict.result() {
        Some(result) if !result.is_finite() => Err(QuadratureError::NonFiniteEstimate { left: a, right: b }),
        _ => Ok(verdict)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EstimateRule：固定規則的估計序列
// ─────────────────────────────────────────────────────────────────────────────

pub trait EstimateRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// 單一切片的面積，供 narrow slice 直接回傳。
    fn single_slice_area(&self, f: Integrand<'_>, a: f64, b: f64) -> f64;

    /// 由粗到細的估計值序列（可為無窮）。
    fn estimates<'a>(
        &self,
        f: Integrand<'a>,
        a: f64,
        b: f64,
        n: &SliceCounts,
    ) -> Box<dyn Iterator<Item = f64> + 'a>;

    /// `SliceCounts::Initial` 時相鄰兩項的切片數倍率。
    fn refinement_factor(&self) -> f64;

    /// 誤差展開 `c1·h^p + c2·h^(p+q) + ...` 的 (p, q)。
    fn error_exponents(&self) -> (f64, f64);
}

// ─────────────────────────────────────────────────────────────────────────────
// SequenceIntegrator
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extrapolation {
    /// 由 `accelerate?` 決定是否外插
    FromOptions,
    /// 一律取 tableau 每列最高階（Romberg、Milne）
    Sequence,
    /// 固定讀取第 k 欄（Simpson = 1，Boole = 2）
    Column(usize)
}

/// 估計序列 →（外插）→ `seq_limit` 的積分器。
pub struct SequenceIntegrator<R> {
    rule: R,
    extrapolation: Extrapolation
}

impl<R> SequenceIntegrator<R>
where
    R: EstimateRule
{
    pub fn new(rule: R, extrapolation: Extrapolation) -> SequenceIntegrator<R> {
        SequenceIntegrator { rule, extrapolation }
    }

    pub fn rule(&self) -> &R {
        &self.rule
    }

    pub fn extrapolation(&self) -> Extrapolation {
        self.extrapolation
    }

    fn column(&self, options: &IntegrationOptions) -> Option<ExtrapolatedColumn> {
        match self.extrapolation {
            Extrapolation::FromOptions if options.accelerate() => Some(ExtrapolatedColumn::Highest),
            Extrapolation::FromOptions => None,
            Extrapolation::Sequence => Some(ExtrapolatedColumn::Highest),
            Extrapolation::Column(k) => Some(ExtrapolatedColumn::Fixed(k))
        }
    }

    /// 選定的估計序列（含外插），供收斂判定逐項拉取。
    pub fn estimate_stream<'a>(
        &self,
        f: Integrand<'a>,
        a: f64,
        b: f64,
        options: &IntegrationOptions,
    ) -> QuadratureResult<Box<dyn Iterator<Item = QuadratureResult<f64>> + 'a>> {
        let raw = self.rule.estimates(f, a, b, options.n());
        let column = match self.column(options) {
            None => return Ok(Box::new(raw.map(Ok::<f64, QuadratureError>))),
            Some(column) => column
        };
        let (p, q) = self.rule.error_exponents();
        match options.n() {
            SliceCounts::Initial(_) => {
                let t = self.rule.refinement_factor();
                match column {
                    ExtrapolatedColumn::Highest => Ok(Box::new(richardson_sequence(raw, t, p, q)?)),
                    ExtrapolatedColumn::Fixed(k) => Ok(Box::new(richardson_column(raw, k, t, p, q)?))
                }
            },
            SliceCounts::Explicit(ns) => {
                // 切片數不成等比時改用 Neville：以 h^q 為橫軸外插到 0
                let abscissas: Vec<f64> = ns.iter().map(|&n| (1.0 / n as f64).powf(q)).collect();
                let tableau = modified_neville_tableau(abscissas.into_iter().zip(raw), 0.0);
                match column {
                    ExtrapolatedColumn::Highest => Ok(Box::new(tableau.first_terms())),
                    ExtrapolatedColumn::Fixed(k) => Ok(Box::new(tableau.column(k)))
                }
            }
        }
    }
}

enum ExtrapolatedColumn {
    Highest,
    Fixed(usize)
}

impl<R> Integrator for SequenceIntegrator<R>
where
    R: EstimateRule
{
    fn integrate(
        &self,
        f: Integrand<'_>,
        a: f64,
        b: f64,
        options: &IntegrationOptions,
    ) -> QuadratureResult<Verdict> {
        let verdict = if narrow_slice(a, b, options.roundoff_cutoff()) {
            Verdict::converged(1, self.rule.single_slice_area(f, a, b))
        } else {
            let stream = self.estimate_stream(f, a, b, options)?;
            try_seq_limit(stream, &options.convergence_policy())?
        };
        ensure_finite(verdict, a, b)
    }
}
