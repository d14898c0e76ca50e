use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

// ─────────────────────────────────────────────────────────────────────────────
// Verdict
// ─────────────────────────────────────────────────────────────────────────────

/// 收斂判定結果。
///
/// `converged = false` 且 `result` 有值：目前最佳估計，尚未（或永不）穩定；
/// 輸入序列為空時 `terms_checked = 0`、`result = None`。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    converged: bool,
    terms_checked: usize,
    result: Option<f64>
}

impl Verdict {
    pub fn new(converged: bool, terms_checked: usize, result: Option<f64>) -> Verdict {
        Verdict { converged, terms_checked, result }
    }

    pub fn converged(terms_checked: usize, result: f64) -> Verdict {
        Verdict::new(true, terms_checked, Some(result))
    }

    pub fn not_converged(terms_checked: usize, result: f64) -> Verdict {
        Verdict::new(false, terms_checked, Some(result))
    }

    pub fn empty() -> Verdict {
        Verdict::new(false, 0, None)
    }

    pub fn is_converged(&self) -> bool {
        self.converged
    }

    pub fn terms_checked(&self) -> usize {
        self.terms_checked
    }

    pub fn result(&self) -> Option<f64> {
        self.result
    }

    pub fn map_result(self, f: impl FnOnce(f64) -> f64) -> Verdict {
        Verdict {
            result: self.result.map(f),
            ..self
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ConvergencePolicy
// ─────────────────────────────────────────────────────────────────────────────

/// `(previous, current, tolerance) -> bool`
pub type ConvergenceFn = Arc<dyn Fn(f64, f64, f64) -> bool + Send + Sync>;

/// `(previous, current) -> bool`，為 true 時提前以不收斂結束。
pub type FailFn = Arc<dyn Fn(f64, f64) -> bool + Send + Sync>;

pub fn default_tolerance() -> f64 {
    f64::EPSILON.sqrt()
}

/// 相對／絕對混合判準：遠離 0 時近似相對誤差，接近 0 時近似絕對誤差。
pub fn close_enough(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= 0.5 * tolerance * (2.0 + a.abs() + b.abs())
}

#[derive(Clone)]
pub struct ConvergencePolicy {
    tolerance: f64,
    minterms: usize,
    maxterms: Option<usize>,
    convergence_fn: ConvergenceFn,
    fail_fn: Option<FailFn>
}

impl ConvergencePolicy {
    pub fn new() -> ConvergencePolicy {
        ConvergencePolicy {
            tolerance: default_tolerance(),
            minterms: 2,
            maxterms: None,
            convergence_fn: Arc::new(close_enough),
            fail_fn: None
        }
    }

    pub fn with_tolerance(self, tolerance: f64) -> ConvergencePolicy {
        ConvergencePolicy { tolerance, ..self }
    }

    pub fn with_minterms(self, minterms: usize) -> ConvergencePolicy {
        ConvergencePolicy { minterms, ..self }
    }

    pub fn with_maxterms(self, maxterms: Option<usize>) -> ConvergencePolicy {
        ConvergencePolicy { maxterms, ..self }
    }

    pub fn with_convergence_fn(self, convergence_fn: ConvergenceFn) -> ConvergencePolicy {
        ConvergencePolicy { convergence_fn, ..self }
    }

    pub fn with_fail_fn(self, fail_fn: FailFn) -> ConvergencePolicy {
        ConvergencePolicy { fail_fn: Some(fail_fn), ..self }
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
}

impl Default for ConvergencePolicy {
    fn default() -> Self {
        ConvergencePolicy::new()
    }
}

impl fmt::Debug for ConvergencePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvergencePolicy")
            .field("tolerance", &self.tolerance)
            .field("minterms", &self.minterms)
            .field("maxterms", &self.maxterms)
            .field("fail_fn", &self.fail_fn.is_some())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// seq_limit
// ─────────────────────────────────────────────────────────────────────────────
//
// 以滑動的 (previous, current) 配對逐項檢查：
//   - 檢查數未達 minterms 前絕不回傳
//   - 之後 convergence_fn 成立 → converged
//   - fail_fn 成立、出現 NaN/±∞、達到 maxterms、或序列耗盡 → not converged
// 只拉取判定所需的項數，剩下的序列直接丟棄。

pub fn try_seq_limit<I, E>(xs: I, policy: &ConvergencePolicy) -> Result<Verdict, E>
where
    I: IntoIterator<Item = Result<f64, E>>
{
    let mut iter = xs.into_iter();
    let mut previous = match iter.next() {
        None => return Ok(Verdict::empty()),
        Some(x) => x?
    };
    let mut terms_checked = 1;

    let verdict = loop {
        if terms_checked >= policy.minterms && policy.maxterms.is_some_and(|max| terms_checked >= max) {
            break Verdict::not_converged(terms_checked, previous);
        }
        let current = match iter.next() {
            None => break Verdict::not_converged(terms_checked, previous),
            Some(x) => x?
        };
        terms_checked += 1;

        if terms_checked >= policy.minterms {
            if (policy.convergence_fn)(previous, current, policy.tolerance) {
                break Verdict::converged(terms_checked, current);
            }
            let failed = policy.fail_fn.as_ref().is_some_and(|fail| fail(previous, current));
            let exhausted = policy.maxterms.is_some_and(|max| terms_checked >= max);
            // 非有限值之後不可能再收斂
            if failed || exhausted || !current.is_finite() {
                break Verdict::not_converged(terms_checked, current);
            }
        }
        previous = current;
    };

    trace!(
        converged = verdict.converged,
        terms_checked = verdict.terms_checked,
        result = ?verdict.result,
        "sequence limit"
    );
    Ok(verdict)
}

pub fn seq_limit<I>(xs: I, policy: &ConvergencePolicy) -> Verdict
where
    I: IntoIterator<Item = f64>
{
    match try_seq_limit(xs.into_iter().map(Ok::<f64, Infallible>), policy) {
        Ok(verdict) => verdict,
        Err(never) => match never {}
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn empty_input_has_no_result() {
        let verdict = seq_limit(Vec::new(), &ConvergencePolicy::new());
        assert_eq!(verdict, Verdict::empty());
        assert_eq!(verdict.terms_checked(), 0);
        assert_eq!(verdict.result(), None);
    }

    #[test]
    fn single_term_is_not_converged() {
        let verdict = seq_limit(vec![3.0], &ConvergencePolicy::new());
        assert_eq!(verdict, Verdict::not_converged(1, 3.0));
    }

    #[test]
    fn geometric_series_partial_sums_converge() {
        let partial_sums = (0..).scan(0.0, |acc, k| {
            *acc += 0.5f64.powi(k);
            Some(*acc)
        });
        let verdict = seq_limit(partial_sums, &ConvergencePolicy::new().with_tolerance(1e-10));
        assert!(verdict.is_converged());
        assert!((verdict.result().unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn respects_minterms_even_when_constant() {
        let policy = ConvergencePolicy::new().with_minterms(5);
        let verdict = seq_limit(std::iter::repeat(1.0), &policy);
        assert_eq!(verdict, Verdict::converged(5, 1.0));
    }

    #[test]
    fn maxterms_stops_a_divergent_sequence() {
        let policy = ConvergencePolicy::new().with_maxterms(Some(7));
        let verdict = seq_limit((0..).map(|i| i as f64), &policy);
        assert_eq!(verdict, Verdict::not_converged(7, 6.0));
    }

    #[test]
    fn maxterms_of_one_pulls_a_single_term() {
        let policy = ConvergencePolicy::new().with_minterms(1).with_maxterms(Some(1));
        let verdict = seq_limit(std::iter::repeat(1.0), &policy);
        assert_eq!(verdict, Verdict::not_converged(1, 1.0));
    }

    #[test]
    fn non_finite_terms_stop_an_unbounded_sequence() {
        let verdict = seq_limit(std::iter::repeat(f64::INFINITY), &ConvergencePolicy::new());
        assert!(!verdict.is_converged());
        assert_eq!(verdict.terms_checked(), 2);

        let policy = ConvergencePolicy::new().with_minterms(4);
        let verdict = seq_limit(std::iter::once(1.0).chain(std::iter::repeat(f64::NAN)), &policy);
        assert!(!verdict.is_converged());
        assert_eq!(verdict.terms_checked(), 4);
        assert!(verdict.result().unwrap().is_nan());
    }

    #[test]
    fn exhausted_input_reports_last_value() {
        let verdict = seq_limit(vec![1.0, 2.0, 4.0], &ConvergencePolicy::new());
        assert_eq!(verdict, Verdict::not_converged(3, 4.0));
    }

    #[test]
    fn fail_fn_ends_early_after_minterms() {
        let policy = ConvergencePolicy::new()
            .with_minterms(3)
            .with_fail_fn(Arc::new(|prev: f64, curr: f64| curr.abs() > 10.0 * prev.abs()));
        let verdict = seq_limit(vec![1.0, 100.0, 1000.0, 1e5, 1e6], &policy);
        assert_eq!(verdict, Verdict::not_converged(4, 1e5));
    }

    #[test]
    fn custom_convergence_fn_is_used() {
        let policy = ConvergencePolicy::new()
            .with_convergence_fn(Arc::new(|prev: f64, curr: f64, _tol: f64| (prev - curr).abs() < 0.6));
        let verdict = seq_limit(vec![10.0, 8.0, 7.0, 6.5, 6.25], &policy);
        assert_eq!(verdict, Verdict::converged(4, 6.5));
    }

    #[test]
    fn pulls_no_more_terms_than_needed() {
        let pulled = Cell::new(0);
        let xs = std::iter::repeat_with(|| {
            pulled.set(pulled.get() + 1);
            1.0
        });
        let verdict = seq_limit(xs, &ConvergencePolicy::new());
        assert_eq!(verdict.terms_checked(), 2);
        assert_eq!(pulled.get(), 2);
    }

    #[test]
    fn errors_propagate() {
        let xs = vec![Ok(1.0), Err("boom"), Ok(1.0)];
        assert_eq!(try_seq_limit(xs, &ConvergencePolicy::new()), Err("boom"));
    }

    #[test]
    fn close_enough_is_relative_away_from_zero() {
        assert!(close_enough(1e6, 1e6 + 1e-3, 1e-8));
        assert!(!close_enough(1e-6, 2e-6, 1e-8));
        assert!(close_enough(0.0, 1e-9, 1e-8));
    }
}
