use std::fmt;

use serde::{
    Deserialize,
    Serialize
};

// ─────────────────────────────────────────────────────────────────────────────
// EndpointKind
// ─────────────────────────────────────────────────────────────────────────────

/// 單一端點是否允許求值。
///
/// `Open` 表示積分器不得在該端點呼叫 f（例如 1/√x 在 0 處），
/// `Closed` 則允許。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointKind {
    Open,
    Closed
}

// ─────────────────────────────────────────────────────────────────────────────
// Interval
// ─────────────────────────────────────────────────────────────────────────────

/// 積分區間的開閉型態：(左端點, 右端點)。
///
/// 四種組合皆合法；所有轉換皆為純函式，回傳新的 `Interval`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Interval {
    left: EndpointKind,
    right: EndpointKind
}

impl Interval {
    pub const OPEN: Interval = Interval::new(EndpointKind::Open, EndpointKind::Open);
    pub const CLOSED: Interval = Interval::new(EndpointKind::Closed, EndpointKind::Closed);
    pub const CLOSED_OPEN: Interval = Interval::new(EndpointKind::Closed, EndpointKind::Open);
    pub const OPEN_CLOSED: Interval = Interval::new(EndpointKind::Open, EndpointKind::Closed);

    pub const fn new(left: EndpointKind, right: EndpointKind) -> Interval {
        Interval { left, right }
    }

    pub fn left(&self) -> EndpointKind {
        self.left
    }

    pub fn right(&self) -> EndpointKind {
        self.right
    }

    pub fn close_left(self) -> Interval {
        Interval::new(EndpointKind::Closed, self.right)
    }

    pub fn close_right(self) -> Interval {
        Interval::new(self.left, EndpointKind::Closed)
    }

    pub fn open_left(self) -> Interval {
        Interval::new(EndpointKind::Open, self.right)
    }

    pub fn open_right(self) -> Interval {
        Interval::new(self.left, EndpointKind::Open)
    }

    /// 左右互換；積分上下限對調（例如變數代換 x = 1/t）時使用。
    pub fn flip(self) -> Interval {
        Interval::new(self.right, self.left)
    }

    /// 兩端皆為閉端點。
    pub fn is_closed(&self) -> bool {
        *self == Interval::CLOSED
    }

    /// 並非兩端皆閉（adaptive 以此選擇 open integrator）。
    pub fn is_open(&self) -> bool {
        !self.is_closed()
    }

    pub fn is_fully_open(&self) -> bool {
        *self == Interval::OPEN
    }

    pub fn name(&self) -> &'static str {
        match (self.left, self.right) {
            (EndpointKind::Open, EndpointKind::Open) => "open",
            (EndpointKind::Closed, EndpointKind::Closed) => "closed",
            (EndpointKind::Closed, EndpointKind::Open) => "closed-open",
            (EndpointKind::Open, EndpointKind::Closed) => "open-closed"
        }
    }
}

impl Default for Interval {
    fn default() -> Self {
        Interval::OPEN
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl TryFrom<String> for Interval {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "open" => Ok(Interval::OPEN),
            "closed" => Ok(Interval::CLOSED),
            "closed-open" => Ok(Interval::CLOSED_OPEN),
            "open-closed" => Ok(Interval::OPEN_CLOSED),
            other => Err(format!("unknown interval '{}'", other))
        }
    }
}

impl From<Interval> for String {
    fn from(value: Interval) -> Self {
        value.name().to_owned()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn any_interval() -> impl Strategy<Value = Interval> {
        prop_oneof![
            Just(Interval::OPEN),
            Just(Interval::CLOSED),
            Just(Interval::CLOSED_OPEN),
            Just(Interval::OPEN_CLOSED),
        ]
    }

    #[test]
    fn default_is_open() {
        assert_eq!(Interval::default(), Interval::OPEN);
        assert!(Interval::default().is_fully_open());
    }

    #[test]
    fn closing_both_sides_gives_closed() {
        let i = Interval::OPEN.close_left().close_right();
        assert_eq!(i, Interval::CLOSED);
        assert!(i.is_closed());
        assert!(!i.is_open());
    }

    #[test]
    fn half_open_intervals_are_not_closed() {
        assert!(Interval::CLOSED_OPEN.is_open());
        assert!(Interval::OPEN_CLOSED.is_open());
        assert!(!Interval::CLOSED_OPEN.is_fully_open());
    }

    #[test]
    fn flip_swaps_half_open_kinds() {
        assert_eq!(Interval::CLOSED_OPEN.flip(), Interval::OPEN_CLOSED);
        assert_eq!(Interval::OPEN.flip(), Interval::OPEN);
    }

    #[test]
    fn serde_uses_kebab_names() {
        let json = serde_json::to_string(&Interval::CLOSED_OPEN).unwrap();
        assert_eq!(json, "\"closed-open\"");
        let parsed: Interval = serde_json::from_str("\"open-closed\"").unwrap();
        assert_eq!(parsed, Interval::OPEN_CLOSED);
        assert!(serde_json::from_str::<Interval>("\"half\"").is_err());
    }

    proptest! {
        #[test]
        fn close_left_is_idempotent(i in any_interval()) {
            prop_assert_eq!(i.close_left().close_left(), i.close_left());
        }

        #[test]
        fn flip_is_an_involution(i in any_interval()) {
            prop_assert_eq!(i.flip().flip(), i);
        }

        #[test]
        fn close_then_open_restores_open_left(i in any_interval()) {
            prop_assert_eq!(i.close_left().open_left().left(), EndpointKind::Open);
            prop_assert_eq!(i.close_left().open_left().right(), i.right());
        }

        #[test]
        fn one_sided_transforms_commute(i in any_interval()) {
            prop_assert_eq!(i.close_left().open_right(), i.open_right().close_left());
            prop_assert_eq!(i.close_right().open_left(), i.open_left().close_right());
        }

        #[test]
        fn flip_conjugates_left_and_right(i in any_interval()) {
            prop_assert_eq!(i.flip().close_left(), i.close_right().flip());
        }
    }
}
