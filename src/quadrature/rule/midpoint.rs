use crate::math::compensatedsum::kahan_sum;
use crate::quadrature::integrator::{
    EstimateRule,
    Integrand
};
use crate::quadrature::options::SliceCounts;

// ─────────────────────────────────────────────────────────────────────────────
// Midpoint rule（open：不在端點求值）
// ─────────────────────────────────────────────────────────────────────────────
//
// M(n) = h·Σ f(a + (i + 1/2)·h)，h = (b - a)/n
//
// 切片數每次乘 3 時舊的中點全部保留，只需計算每個舊切片中的兩個新中點：
//
//   M(3n) = M(n)/3 + (h/3)·Σ [f(a + i·h + h/6) + f(a + i·h + 5h/6)]

pub const MIDPOINT_FACTOR: usize = 3;

pub fn midpoint_sum(f: Integrand<'_>, a: f64, b: f64, n: usize) -> f64 {
    let h = (b - a) / n as f64;
    h * kahan_sum((0..n).map(|i| f(a + (i as f64 + 0.5) * h)))
}

/// 以 `MIDPOINT_FACTOR` 倍率遞增細分，重複利用上一項的所有求值。
pub struct MidpointSequence<'a> {
    f: Integrand<'a>,
    a: f64,
    b: f64,
    n: Option<usize>,
    previous: Option<f64>
}

impl<'a> MidpointSequence<'a> {
    pub fn new(f: Integrand<'a>, a: f64, b: f64, n: usize) -> MidpointSequence<'a> {
        MidpointSequence { f, a, b, n: Some(n), previous: None }
    }
}

impl<'a> Iterator for MidpointSequence<'a> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        let n = self.n?;
        let estimate = match self.previous {
            None => midpoint_sum(self.f, self.a, self.b, n),
            Some(previous) => {
                // n 為目前的切片數；上一項用的是 n / 3
                let coarse = n / MIDPOINT_FACTOR;
                let h = (self.b - self.a) / coarse as f64;
                let (a, f) = (self.a, self.f);
                let fresh = kahan_sum((0..coarse).flat_map(|i| {
                    let left = a + i as f64 * h;
                    [f(left + h / 6.0), f(left + 5.0 * h / 6.0)]
                }));
                previous / 3.0 + h / 3.0 * fresh
            }
        };
        self.previous = Some(estimate);
        // 倍增溢位時序列結束，由 seq_limit 回報未收斂
        self.n = n.checked_mul(MIDPOINT_FACTOR);
        Some(estimate)
    }
}

pub struct MidpointRule;

impl MidpointRule {
    pub fn new() -> MidpointRule {
        MidpointRule
    }
}

impl EstimateRule for MidpointRule {
    fn name(&self) -> &'static str {
        "midpoint"
    }

    fn single_slice_area(&self, f: Integrand<'_>, a: f64, b: f64) -> f64 {
        (b - a) * f(0.5 * (a + b))
    }

    fn estimates<'a>(
        &self,
        f: Integrand<'a>,
        a: f64,
        b: f64,
        n: &SliceCounts,
    ) -> Box<dyn Iterator<Item = f64> + 'a> {
        match n {
            SliceCounts::Initial(n) => Box::new(MidpointSequence::new(f, a, b, *n)),
            SliceCounts::Explicit(ns) => {
                let ns = ns.clone();
                Box::new(ns.into_iter().map(move |n| midpoint_sum(f, a, b, n)))
            }
        }
    }

    fn refinement_factor(&self) -> f64 {
        MIDPOINT_FACTOR as f64
    }

    fn error_exponents(&self) -> (f64, f64) {
        (2.0, 2.0)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn exact_for_linear_functions() {
        let f = |x: f64| 3.0 * x + 1.0;
        assert_relative_eq!(midpoint_sum(&f, 0.0, 2.0, 1), 8.0);
        assert_relative_eq!(MidpointRule::new().single_slice_area(&f, 0.0, 2.0), 8.0);
    }

    #[test]
    fn incremental_matches_direct_sums() {
        let f = |x: f64| x.sin() * x.exp();
        let incremental: Vec<f64> = MidpointSequence::new(&f, 0.0, 2.0, 2).take(4).collect();
        for (k, value) in incremental.iter().enumerate() {
            let n = 2 * 3usize.pow(k as u32);
            assert_relative_eq!(*value, midpoint_sum(&f, 0.0, 2.0, n), max_relative = 1e-13);
        }
    }

    #[test]
    fn never_evaluates_endpoints() {
        let f = |x: f64| {
            assert!(x > 0.0 && x < 1.0, "evaluated at {}", x);
            1.0 / x.sqrt()
        };
        let estimates: Vec<f64> = MidpointSequence::new(&f, 0.0, 1.0, 1).take(5).collect();
        assert_eq!(estimates.len(), 5);
    }

    #[test]
    fn explicit_counts_are_finite() {
        let f = |x: f64| x * x;
        let rule = MidpointRule::new();
        let estimates: Vec<f64> = rule.estimates(&f, 0.0, 1.0, &SliceCounts::Explicit(vec![1, 2, 5])).collect();
        assert_eq!(estimates.len(), 3);
        assert_relative_eq!(estimates[0], 0.25);
    }

    #[test]
    fn differences_shrink_for_smooth_integrands() {
        let f = |x: f64| x * x;
        let estimates: Vec<f64> = MidpointSequence::new(&f, 0.0, 1.0, 1).take(6).collect();
        let diffs: Vec<f64> = estimates.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
        assert!(diffs.windows(2).all(|d| d[1] < d[0]));
    }
}
