use crate::math::extrapolation::tableau::{
    FirstTerms,
    Tableau,
    TableauRule
};
use crate::quadrature::quadratureerror::{
    QuadratureError,
    QuadratureResult
};

// ─────────────────────────────────────────────────────────────────────────────
// NevilleRule - 直接形式
// ─────────────────────────────────────────────────────────────────────────────
//
// cell = (x_l, x_r, p)，p 為經過 x_l..x_r 各點的多項式在目標 x 的值：
//
//   p = ((x - x_r)·p_l - (x - x_l)·p_r) / (x_l - x_r)

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NevilleCell {
    x_l: f64,
    x_r: f64,
    p: f64
}

#[derive(Debug, Clone, Copy)]
pub struct NevilleRule {
    x: f64
}

impl NevilleRule {
    pub fn new(x: f64) -> NevilleRule {
        NevilleRule { x }
    }
}

impl TableauRule for NevilleRule {
    type Point = (f64, f64);
    type Cell = NevilleCell;

    fn present(&self, (x, fx): (f64, f64)) -> NevilleCell {
        NevilleCell { x_l: x, x_r: x, p: fx }
    }

    fn merge(&self, left: &NevilleCell, right: &NevilleCell) -> QuadratureResult<NevilleCell> {
        let den = left.x_l - right.x_r;
        if den == 0.0 {
            return Err(QuadratureError::DegenerateAbscissas { left: left.x_l, right: right.x_r });
        }
        let p = ((self.x - right.x_r) * left.p - (self.x - left.x_l) * right.p) / den;
        Ok(NevilleCell { x_l: left.x_l, x_r: right.x_r, p })
    }

    fn estimates(&self, row: &[NevilleCell]) -> Vec<f64> {
        row.iter().map(|cell| cell.p).collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ModifiedNevilleRule - C/D 增量形式
// ─────────────────────────────────────────────────────────────────────────────
//
// cell = (x_l, x_r, C, D)：
//   C = P(x_l..x_r) - P(x_l..x_(r-1))
//   D = P(x_l..x_r) - P(x_(l+1)..x_r)
//
//   w = C_right - D_left
//   C = (x_l - x)·w / (x_l - x_r)
//   D = (x_r - x)·w / (x_l - x_r)
//
// 同一列中相鄰 cell 只差最左端點，因此每列的估計值為 D 的累加和。
// 與直接形式代數上相同，每步以一次加法取代一次乘法，長序列較穩定。

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModifiedNevilleCell {
    x_l: f64,
    x_r: f64,
    c: f64,
    d: f64
}

#[derive(Debug, Clone, Copy)]
pub struct ModifiedNevilleRule {
    x: f64
}

impl ModifiedNevilleRule {
    pub fn new(x: f64) -> ModifiedNevilleRule {
        ModifiedNevilleRule { x }
    }
}

impl TableauRule for ModifiedNevilleRule {
    type Point = (f64, f64);
    type Cell = ModifiedNevilleCell;

    fn present(&self, (x, fx): (f64, f64)) -> ModifiedNevilleCell {
        ModifiedNevilleCell { x_l: x, x_r: x, c: fx, d: fx }
    }

    fn merge(
        &self,
        left: &ModifiedNevilleCell,
        right: &ModifiedNevilleCell,
    ) -> QuadratureResult<ModifiedNevilleCell> {
        let den = left.x_l - right.x_r;
        if den == 0.0 {
            return Err(QuadratureError::DegenerateAbscissas { left: left.x_l, right: right.x_r });
        }
        let coef = (right.c - left.d) / den;
        Ok(ModifiedNevilleCell {
            x_l: left.x_l,
            x_r: right.x_r,
            c: (left.x_l - self.x) * coef,
            d: (right.x_r - self.x) * coef
        })
    }

    fn estimates(&self, row: &[ModifiedNevilleCell]) -> Vec<f64> {
        row.iter()
            .scan(0.0, |acc, cell| {
                *acc += cell.d;
                Some(*acc)
            })
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// 入口函式
// ─────────────────────────────────────────────────────────────────────────────

pub fn neville_tableau<I>(points: I, x: f64) -> Tableau<I::IntoIter, NevilleRule>
where
    I: IntoIterator<Item = (f64, f64)>
{
    Tableau::new(points.into_iter(), NevilleRule::new(x))
}

pub fn modified_neville_tableau<I>(points: I, x: f64) -> Tableau<I::IntoIter, ModifiedNevilleRule>
where
    I: IntoIterator<Item = (f64, f64)>
{
    Tableau::new(points.into_iter(), ModifiedNevilleRule::new(x))
}

/// 依序使用前 1, 2, 3, ... 個點的插值多項式在 `x` 的值。
pub fn neville<I>(points: I, x: f64) -> FirstTerms<I::IntoIter, NevilleRule>
where
    I: IntoIterator<Item = (f64, f64)>
{
    neville_tableau(points, x).first_terms()
}

pub fn modified_neville<I>(points: I, x: f64) -> FirstTerms<I::IntoIter, ModifiedNevilleRule>
where
    I: IntoIterator<Item = (f64, f64)>
{
    modified_neville_tableau(points, x).first_terms()
}
