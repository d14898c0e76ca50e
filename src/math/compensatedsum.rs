use std::iter::Sum;

// ─────────────────────────────────────────────────────────────────────────────
// CompensatedSum - Kahan summation
// ─────────────────────────────────────────────────────────────────────────────
//
// 每次 add(x)：
//   y = x - c
//   t = s + y
//   c = (t - s) - y
//   s = t
//
// c 保存上一次加法被捨去的低位元，下一次加回去；
// 誤差維持在 machine epsilon 量級，與項數無關。

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CompensatedSum {
    sum: f64,
    error: f64
}

impl CompensatedSum {
    pub fn new() -> CompensatedSum {
        CompensatedSum { sum: 0.0, error: 0.0 }
    }

    pub fn add(&mut self, x: f64) {
        let y = x - self.error;
        let t = self.sum + y;
        self.error = (t - self.sum) - y;
        self.sum = t;
    }

    pub fn value(&self) -> f64 {
        self.sum
    }

    pub fn running_error(&self) -> f64 {
        self.error
    }
}

impl Extend<f64> for CompensatedSum {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for x in iter {
            self.add(x);
        }
    }
}

impl FromIterator<f64> for CompensatedSum {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut acc = CompensatedSum::new();
        acc.extend(iter);
        acc
    }
}

impl Sum<f64> for CompensatedSum {
    fn sum<I: Iterator<Item = f64>>(iter: I) -> Self {
        iter.collect()
    }
}

/// 一次性加總。
pub fn kahan_sum<I>(xs: I) -> f64
where
    I: IntoIterator<Item = f64>
{
    xs.into_iter().collect::<CompensatedSum>().value()
}

// ─────────────────────────────────────────────────────────────────────────────
// ScanningSum - 逐步輸出每個中間總和
// ─────────────────────────────────────────────────────────────────────────────

pub struct ScanningSum<I> {
    inner: I,
    acc: CompensatedSum
}

impl<I> Iterator for ScanningSum<I>
where
    I: Iterator<Item = f64>
{
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        let x = self.inner.next()?;
        self.acc.add(x);
        Some(self.acc.value())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

pub fn scanning_sum<I>(xs: I) -> ScanningSum<I::IntoIter>
where
    I: IntoIterator<Item = f64>
{
    ScanningSum {
        inner: xs.into_iter(),
        acc: CompensatedSum::new()
    }
}
