use crate::quadrature::quadratureerror::QuadratureResult;

// ─────────────────────────────────────────────────────────────────────────────
// TableauRule
// ─────────────────────────────────────────────────────────────────────────────
//
// 三角形 tableau 的遞增建構：
//
//   row 0:  c00
//   row 1:  c10  c11
//   row 2:  c20  c21  c22
//   ...
//
//   c_i0 = present(point_i)
//   c_ik = merge(c_(i-1)(k-1), c_i(k-1))
//
// column k = k 階外插；row i = 已消耗 i+1 個點。
// 只保留最後一列，輸入序列為無窮時也不會完整展開。

pub trait TableauRule {
    type Point;
    type Cell: Clone;

    fn present(&self, point: Self::Point) -> Self::Cell;

    /// `left` 為上一列的 k-1 階 cell，`right` 為本列的 k-1 階 cell。
    fn merge(&self, left: &Self::Cell, right: &Self::Cell) -> QuadratureResult<Self::Cell>;

    /// 將一列 cell 還原為各階估計值（index = 階數）。
    fn estimates(&self, row: &[Self::Cell]) -> Vec<f64>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Tableau
// ─────────────────────────────────────────────────────────────────────────────

/// 逐列產生 tableau 的 iterator；每次 `next()` 只向輸入拉一個點。
pub struct Tableau<I, R>
where
    R: TableauRule
{
    points: I,
    rule: R,
    row: Vec<R::Cell>,
    failed: bool
}

impl<I, R> Tableau<I, R>
where
    I: Iterator<Item = R::Point>,
    R: TableauRule
{
    pub fn new(points: I, rule: R) -> Tableau<I, R> {
        Tableau {
            points,
            rule,
            row: Vec::new(),
            failed: false
        }
    }

    pub fn rule(&self) -> &R {
        &self.rule
    }

    /// 每列最高階的估計值，即加速後的序列。
    pub fn first_terms(self) -> FirstTerms<I, R> {
        FirstTerms { tableau: self }
    }

    /// 第 `k` 欄：從第 k 列起，每列的 k 階估計值。
    pub fn column(self, k: usize) -> Column<I, R> {
        Column { tableau: self, k }
    }

    fn advance(&mut self, point: R::Point) -> QuadratureResult<()> {
        let mut next_row = Vec::with_capacity(self.row.len() + 1);
        next_row.push(self.rule.present(point));
        for k in 0..self.row.len() {
            let cell = self.rule.merge(&self.row[k], &next_row[k])?;
            next_row.push(cell);
        }
        self.row = next_row;
        Ok(())
    }
}

impl<I, R> Iterator for Tableau<I, R>
where
    I: Iterator<Item = R::Point>,
    R: TableauRule
{
    type Item = QuadratureResult<Vec<f64>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let point = self.points.next()?;
        match self.advance(point) {
            Ok(()) => Some(Ok(self.rule.estimates(&self.row))),
            Err(error) => {
                self.failed = true;
                Some(Err(error))
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Projections
// ─────────────────────────────────────────────────────────────────────────────

pub struct FirstTerms<I, R>
where
    R: TableauRule
{
    tableau: Tableau<I, R>
}

impl<I, R> Iterator for FirstTerms<I, R>
where
    I: Iterator<Item = R::Point>,
    R: TableauRule
{
    type Item = QuadratureResult<f64>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.tableau.next()?;
        Some(row.map(|estimates| estimates.last().copied().unwrap_or(f64::NAN)))
    }
}

pub struct Column<I, R>
where
    R: TableauRule
{
    tableau: Tableau<I, R>,
    k: usize
}

impl<I, R> Iterator for Column<I, R>
where
    I: Iterator<Item = R::Point>,
    R: TableauRule
{
    type Item = QuadratureResult<f64>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.tableau.next()? {
                Ok(estimates) => {
                    if let Some(value) = estimates.get(self.k) {
                        return Some(Ok(*value));
                    }
                }
                Err(error) => return Some(Err(error))
            }
        }
    }
}
