use std::sync::Arc;

use rand::{
    Rng,
    SeedableRng
};
use rand_chacha::ChaCha8Rng;
use tracing::{
    debug,
    warn
};

use crate::math::compensatedsum::CompensatedSum;
use crate::math::interval::Interval;
use crate::math::sequence::convergence::Verdict;
use crate::quadrature::integrator::{
    Integrand,
    Integrator,
    ensure_finite
};
use crate::quadrature::memoize::MemoizedIntegrand;
use crate::quadrature::options::IntegrationOptions;
use crate::quadrature::quadratureerror::{
    QuadratureError,
    QuadratureResult
};

// ─────────────────────────────────────────────────────────────────────────────
// AdaptiveTask
// ─────────────────────────────────────────────────────────────────────────────

/// 待處理的子區間。端點型態記錄哪一側是切分產生的內部點（closed）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveTask {
    left: f64,
    right: f64,
    interval: Interval
}

impl AdaptiveTask {
    pub fn new(left: f64, right: f64, interval: Interval) -> AdaptiveTask {
        AdaptiveTask { left, right, interval }
    }

    pub fn left(&self) -> f64 {
        self.left
    }

    pub fn right(&self) -> f64 {
        self.right
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    /// 在 `mid` 切開；回傳 (左半, 右半)。內部切點兩側皆視為 closed。
    pub fn split(&self, mid: f64) -> (AdaptiveTask, AdaptiveTask) {
        (
            AdaptiveTask::new(self.left, mid, self.interval.close_right()),
            AdaptiveTask::new(mid, self.right, self.interval.close_left())
        )
    }
}

/// 切點：`width = 0` 時為正中點，否則在中點附近 `±width·(r - l)/2` 內均勻抖動，
/// 避免被積函數的特徵恰好落在二分點上。
pub fn split_point<R>(left: f64, right: f64, width: f64, rng: &mut R) -> f64
where
    R: Rng + ?Sized
{
    let mid = 0.5 * (left + right);
    if width == 0.0 {
        return mid;
    }
    let half = 0.5 * width * (right - left);
    let u: f64 = rng.r#gen();
    mid + (2.0 * u - 1.0) * half
}

// ─────────────────────────────────────────────────────────────────────────────
// Adaptive
// ─────────────────────────────────────────────────────────────────────────────

/// 以顯式堆疊做遞迴二分的 adaptive 積分器。
///
/// 每個子區間交給 `closed`（區間兩端皆 closed 時）或 `open` 積分器，
/// 並把 `maxterms` 限制在 `adaptive-maxterms` 以內；收斂的子區間以
/// Kahan 累加，不收斂的在 `split_point` 切開後把兩半推回堆疊。
pub struct Adaptive {
    open: Arc<dyn Integrator>,
    closed: Arc<dyn Integrator>
}

impl Adaptive {
    pub fn new(open: Arc<dyn Integrator>, closed: Arc<dyn Integrator>) -> Adaptive {
        Adaptive { open, closed }
    }

    pub fn single(integrator: Arc<dyn Integrator>) -> Adaptive {
        Adaptive {
            open: integrator.clone(),
            closed: integrator
        }
    }

    pub fn open(&self) -> &Arc<dyn Integrator> {
        &self.open
    }

    pub fn closed(&self) -> &Arc<dyn Integrator> {
        &self.closed
    }

    fn integrator_for(&self, interval: Interval) -> &dyn Integrator {
        if interval.is_closed() {
            self.closed.as_ref()
        } else {
            self.open.as_ref()
        }
    }

    fn evaluate(
        &self,
        f: Integrand<'_>,
        task: &AdaptiveTask,
        options: &IntegrationOptions,
    ) -> QuadratureResult<Verdict> {
        let verdict = self.integrator_for(task.interval)
            .integrate(f, task.left, task.right, &options.with_interval(task.interval))?;
        ensure_finite(verdict, task.left, task.right)
    }

    fn run(&self, f: Integrand<'_>, a: f64, b: f64, options: &IntegrationOptions) -> QuadratureResult<Verdict> {
        let piece_maxterms = match options.maxterms() {
            Some(maxterms) => maxterms.min(options.adaptive_maxterms()),
            None => options.adaptive_maxterms()
        };
        let piece_options = options.with_maxterms(Some(piece_maxterms));
        let mut rng = match options.seed() {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy()
        };

        let mut stack = vec![AdaptiveTask::new(a, b, options.interval())];
        let mut total = CompensatedSum::new();
        let mut iterations = 0usize;

        while let Some(task) = stack.pop() {
            if iterations >= options.adaptive_max_iterations() {
                stack.push(task);
                warn!(
                    iterations,
                    pending = stack.len(),
                    a,
                    b,
                    "adaptive iteration ceiling reached; accepting best estimates of pending pieces"
                );
                for pending in stack.iter() {
                    let verdict = self.evaluate(f, pending, &piece_options)?;
                    total.add(verdict.result().ok_or(QuadratureError::EmptySequence)?);
                }
                return Ok(Verdict::not_converged(iterations + stack.len(), total.value()));
            }
            iterations += 1;

            let verdict = self.evaluate(f, &task, &piece_options)?;
            if verdict.is_converged() {
                total.add(verdict.result().ok_or(QuadratureError::EmptySequence)?);
                continue;
            }

            let mid = split_point(task.left, task.right, options.adaptive_neighborhood_width(), &mut rng);
            debug!(
                left = task.left,
                right = task.right,
                mid,
                interval = task.interval.name(),
                terms = verdict.terms_checked(),
                "adaptive split"
            );
            let (lower, upper) = task.split(mid);
            stack.push(upper);
            stack.push(lower);
        }

        Ok(Verdict::converged(iterations, total.value()))
    }
}

impl Integrator for Adaptive {
    fn integrate(
        &self,
        f: Integrand<'_>,
        a: f64,
        b: f64,
        options: &IntegrationOptions,
    ) -> QuadratureResult<Verdict> {
        if options.memoize() {
            let memo = MemoizedIntegrand::new(f);
            let cached = |x: f64| memo.call(x);
            self.run(&cached, a, b, options)
        } else {
            self.run(f, a, b, options)
        }
    }
}
