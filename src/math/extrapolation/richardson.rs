use crate::math::extrapolation::tableau::{
    Column,
    FirstTerms,
    Tableau,
    TableauRule
};
use crate::quadrature::quadratureerror::{
    ConfigurationError,
    QuadratureResult
};

// ─────────────────────────────────────────────────────────────────────────────
// RichardsonRule
// ─────────────────────────────────────────────────────────────────────────────
//
// 輸入 A(h), A(h/t), A(h/t²), ...，誤差展開為
//
//   A(h) = A + c1·h^p + c2·h^(p+q) + c3·h^(p+2q) + ...
//
// 第 k 欄消去指數 e = p + (k-1)·q 的誤差項：
//
//   R = (t^e·A_fine - A_coarse) / (t^e - 1)
//
// 例：trapezoid 的 p = q = 2，t = 2；第 1 欄即 Simpson，第 2 欄即 Boole。

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RichardsonCell {
    order: usize,
    value: f64
}

#[derive(Debug, Clone, Copy)]
pub struct RichardsonRule {
    t: f64,
    p: f64,
    q: f64
}

impl RichardsonRule {
    pub fn new(t: f64, p: f64, q: f64) -> QuadratureResult<RichardsonRule> {
        if !(t > 1.0) || !t.is_finite() {
            return Err(ConfigurationError::InvalidRichardsonFactor(t).into());
        }
        Ok(RichardsonRule { t, p, q })
    }

    pub fn t(&self) -> f64 {
        self.t
    }

    fn exponent(&self, order: usize) -> f64 {
        self.p + order as f64 * self.q
    }
}

impl TableauRule for RichardsonRule {
    type Point = f64;
    type Cell = RichardsonCell;

    fn present(&self, value: f64) -> RichardsonCell {
        RichardsonCell { order: 0, value }
    }

    fn merge(&self, left: &RichardsonCell, right: &RichardsonCell) -> QuadratureResult<RichardsonCell> {
        let t_pow = self.t.powf(self.exponent(left.order));
        Ok(RichardsonCell {
            order: left.order + 1,
            value: (t_pow * right.value - left.value) / (t_pow - 1.0)
        })
    }

    fn estimates(&self, row: &[RichardsonCell]) -> Vec<f64> {
        row.iter().map(|cell| cell.value).collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// 入口函式
// ─────────────────────────────────────────────────────────────────────────────

pub fn richardson_tableau<I>(xs: I, t: f64, p: f64, q: f64) -> QuadratureResult<Tableau<I::IntoIter, RichardsonRule>>
where
    I: IntoIterator<Item = f64>
{
    Ok(Tableau::new(xs.into_iter(), RichardsonRule::new(t, p, q)?))
}

/// 加速後的序列：每列最高階的估計值。
pub fn richardson_sequence<I>(xs: I, t: f64, p: f64, q: f64) -> QuadratureResult<FirstTerms<I::IntoIter, RichardsonRule>>
where
    I: IntoIterator<Item = f64>
{
    Ok(richardson_tableau(xs, t, p, q)?.first_terms())
}

/// tableau 第 `column` 欄（固定階數的外插）。
pub fn richardson_column<I>(
    xs: I,
    column: usize,
    t: f64,
    p: f64,
    q: f64,
) -> QuadratureResult<Column<I::IntoIter, RichardsonRule>>
where
    I: IntoIterator<Item = f64>
{
    Ok(richardson_tableau(xs, t, p, q)?.column(column))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::quadrature::quadratureerror::QuadratureError;

    fn trapezoid(f: impl Fn(f64) -> f64, a: f64, b: f64, n: usize) -> f64 {
        let h = (b - a) / n as f64;
        let inner: f64 = (1..n).map(|i| f(a + i as f64 * h)).sum();
        h * (0.5 * (f(a) + f(b)) + inner)
    }

    fn simpson(f: impl Fn(f64) -> f64, a: f64, b: f64, n: usize) -> f64 {
        let h = (b - a) / n as f64;
        let odd: f64 = (1..n).step_by(2).map(|i| f(a + i as f64 * h)).sum();
        let even: f64 = (2..n).step_by(2).map(|i| f(a + i as f64 * h)).sum();
        h / 3.0 * (f(a) + f(b) + 4.0 * odd + 2.0 * even)
    }

    #[test]
    fn first_column_of_trapezoid_is_simpson() {
        let f = |x: f64| x.exp();
        let trapezoids: Vec<f64> = (0..5).map(|k| trapezoid(f, 0.0, 1.0, 1 << k)).collect();
        let column: Vec<f64> = richardson_column(trapezoids, 1, 2.0, 2.0, 2.0)
            .unwrap()
            .collect::<QuadratureResult<_>>()
            .unwrap();
        assert_eq!(column.len(), 4);
        for (k, value) in column.iter().enumerate() {
            assert_relative_eq!(*value, simpson(f, 0.0, 1.0, 2 << k), max_relative = 1e-13);
        }
    }

    #[test]
    fn accelerated_trapezoid_converges_fast() {
        let f = |x: f64| 1.0 / (1.0 + x * x);
        let exact = std::f64::consts::FRAC_PI_4;
        let trapezoids = (0..).map(|k| trapezoid(f, 0.0, 1.0, 1 << k));
        let estimate = richardson_sequence(trapezoids, 2.0, 2.0, 2.0)
            .unwrap()
            .nth(4)
            .unwrap()
            .unwrap();
        assert_relative_eq!(estimate, exact, max_relative = 1e-7);
    }

    #[test]
    fn linear_error_is_removed_exactly() {
        // A(h) = 1 + h，h = 1, 1/2, 1/4
        let xs = vec![2.0, 1.5, 1.25];
        let terms: Vec<f64> = richardson_sequence(xs, 2.0, 1.0, 1.0)
            .unwrap()
            .collect::<QuadratureResult<_>>()
            .unwrap();
        assert_eq!(terms, vec![2.0, 1.0, 1.0]);
    }

    #[test]
    fn factor_must_exceed_one() {
        let err = richardson_sequence(vec![1.0], 1.0, 2.0, 2.0).err();
        assert_eq!(
            err,
            Some(QuadratureError::Configuration(ConfigurationError::InvalidRichardsonFactor(1.0)))
        );
    }
}
