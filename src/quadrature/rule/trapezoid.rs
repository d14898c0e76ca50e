use crate::math::compensatedsum::kahan_sum;
use crate::quadrature::integrator::{
    EstimateRule,
    Integrand
};
use crate::quadrature::options::SliceCounts;

// ─────────────────────────────────────────────────────────────────────────────
// Trapezoid rule（closed：兩端點皆求值）
// ─────────────────────────────────────────────────────────────────────────────
//
// T(n)  = h·[(f(a) + f(b))/2 + Σ_{i=1}^{n-1} f(a + i·h)]
// T(2n) = T(n)/2 + (h/2)·Σ_{i=0}^{n-1} f(a + (i + 1/2)·h)

pub const TRAPEZOID_FACTOR: usize = 2;

pub fn trapezoid_sum(f: Integrand<'_>, a: f64, b: f64, n: usize) -> f64 {
    let h = (b - a) / n as f64;
    let inner = kahan_sum((1..n).map(|i| f(a + i as f64 * h)));
    h * (0.5 * (f(a) + f(b)) + inner)
}

pub struct TrapezoidSequence<'a> {
    f: Integrand<'a>,
    a: f64,
    b: f64,
    n: Option<usize>,
    previous: Option<f64>
}

impl<'a> TrapezoidSequence<'a> {
    pub fn new(f: Integrand<'a>, a: f64, b: f64, n: usize) -> TrapezoidSequence<'a> {
        TrapezoidSequence { f, a, b, n: Some(n), previous: None }
    }
}

impl<'a> Iterator for TrapezoidSequence<'a> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        let n = self.n?;
        let estimate = match self.previous {
            None => trapezoid_sum(self.f, self.a, self.b, n),
            Some(previous) => {
                let coarse = n / TRAPEZOID_FACTOR;
                let h = (self.b - self.a) / coarse as f64;
                let (a, f) = (self.a, self.f);
                let midpoints = kahan_sum((0..coarse).map(|i| f(a + (i as f64 + 0.5) * h)));
                0.5 * (previous + h * midpoints)
            }
        };
        self.previous = Some(estimate);
        self.n = n.checked_mul(TRAPEZOID_FACTOR);
        Some(estimate)
    }
}

pub struct TrapezoidRule;

impl TrapezoidRule {
    pub fn new() -> TrapezoidRule {
        TrapezoidRule
    }
}

impl EstimateRule for TrapezoidRule {
    fn name(&self) -> &'static str {
        "trapezoid"
    }

    fn single_slice_area(&self, f: Integrand<'_>, a: f64, b: f64) -> f64 {
        0.5 * (b - a) * (f(a) + f(b))
    }

    fn estimates<'a>(
        &self,
        f: Integrand<'a>,
        a: f64,
        b: f64,
        n: &SliceCounts,
    ) -> Box<dyn Iterator<Item = f64> + 'a> {
        match n {
            SliceCounts::Initial(n) => Box::new(TrapezoidSequence::new(f, a, b, *n)),
            SliceCounts::Explicit(ns) => {
                let ns = ns.clone();
                Box::new(ns.into_iter().map(move |n| trapezoid_sum(f, a, b, n)))
            }
        }
    }

    fn refinement_factor(&self) -> f64 {
        TRAPEZOID_FACTOR as f64
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
        let f = |x: f64| 2.0 - x;
        assert_relative_eq!(trapezoid_sum(&f, 0.0, 2.0, 1), 2.0);
        assert_relative_eq!(TrapezoidRule::new().single_slice_area(&f, 0.0, 2.0), 2.0);
    }

    #[test]
    fn incremental_matches_direct_sums() {
        let f = |x: f64| (3.0 * x).cos() + x;
        let incremental: Vec<f64> = TrapezoidSequence::new(&f, -1.0, 2.0, 3).take(5).collect();
        for (k, value) in incremental.iter().enumerate() {
            let n = 3 << k;
            assert_relative_eq!(*value, trapezoid_sum(&f, -1.0, 2.0, n), max_relative = 1e-13);
        }
    }

    #[test]
    fn error_quarters_with_each_doubling() {
        let f = |x: f64| x * x;
        let exact = 1.0 / 3.0;
        let errors: Vec<f64> = TrapezoidSequence::new(&f, 0.0, 1.0, 1)
            .take(5)
            .map(|t| t - exact)
            .collect();
        for w in errors.windows(2) {
            assert_relative_eq!(w[0] / w[1], 4.0, max_relative = 1e-9);
        }
    }
}
