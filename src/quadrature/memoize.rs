use std::cell::RefCell;
use std::collections::HashMap;

use crate::quadrature::integrator::Integrand;

// ── memoize.rs ──────────────────────────────────────────────────────────────
//
// adaptive 切分後，相鄰子區間共用端點；closed rule 會在同一點重複求值。
// 以 `f64::to_bits()` 為 key 快取 f(x)。
//
// 快取只活在單次 adaptive 呼叫內（由呼叫端建立後丟棄），不會跨呼叫外洩；
// 單執行緒使用，所以用 RefCell 而不需要鎖。

pub struct MemoizedIntegrand<'a> {
    f: Integrand<'a>,
    cache: RefCell<HashMap<u64, f64>>
}

impl<'a> MemoizedIntegrand<'a> {
    pub fn new(f: Integrand<'a>) -> MemoizedIntegrand<'a> {
        MemoizedIntegrand {
            f,
            cache: RefCell::new(HashMap::new())
        }
    }

    pub fn call(&self, x: f64) -> f64 {
        let key = x.to_bits();
        if let Some(&fx) = self.cache.borrow().get(&key) {
            return fx;
        }
        // 先放開 borrow 再求值：f 本身可能是另一層 memoized integrand
        let fx = (self.f)(x);
        self.cache.borrow_mut().insert(key, fx);
        fx
    }

    #[cfg(test)]
    fn cached_points(&self) -> usize {
        self.cache.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn repeated_points_are_evaluated_once() {
        let calls = Cell::new(0);
        let f = |x: f64| {
            calls.set(calls.get() + 1);
            x * x
        };
        let memo = MemoizedIntegrand::new(&f);
        assert_eq!(memo.call(2.0), 4.0);
        assert_eq!(memo.call(2.0), 4.0);
        assert_eq!(memo.call(3.0), 9.0);
        assert_eq!(calls.get(), 2);
        assert_eq!(memo.cached_points(), 2);
    }

    #[test]
    fn signed_zeros_are_distinct_keys() {
        let f = |x: f64| 1.0 / x;
        let memo = MemoizedIntegrand::new(&f);
        assert_eq!(memo.call(0.0), f64::INFINITY);
        assert_eq!(memo.call(-0.0), f64::NEG_INFINITY);
    }
}
