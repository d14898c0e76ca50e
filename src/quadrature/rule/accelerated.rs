use crate::quadrature::integrator::{
    Extrapolation,
    SequenceIntegrator
};
use crate::quadrature::rule::midpoint::MidpointRule;
use crate::quadrature::rule::trapezoid::TrapezoidRule;

// ─────────────────────────────────────────────────────────────────────────────
// 由 midpoint / trapezoid 經 Richardson 外插得到的規則
// ─────────────────────────────────────────────────────────────────────────────
//
//   trapezoid tableau：column 1 = Simpson、column 2 = Boole、最高階 = Romberg
//   midpoint tableau ：最高階 = Milne（open Romberg）

pub fn midpoint() -> SequenceIntegrator<MidpointRule> {
    SequenceIntegrator::new(MidpointRule::new(), Extrapolation::FromOptions)
}

pub fn trapezoid() -> SequenceIntegrator<TrapezoidRule> {
    SequenceIntegrator::new(TrapezoidRule::new(), Extrapolation::FromOptions)
}

pub fn simpson() -> SequenceIntegrator<TrapezoidRule> {
    SequenceIntegrator::new(TrapezoidRule::new(), Extrapolation::Column(1))
}

pub fn boole() -> SequenceIntegrator<TrapezoidRule> {
    SequenceIntegrator::new(TrapezoidRule::new(), Extrapolation::Column(2))
}

pub fn romberg() -> SequenceIntegrator<TrapezoidRule> {
    SequenceIntegrator::new(TrapezoidRule::new(), Extrapolation::Sequence)
}

pub fn milne() -> SequenceIntegrator<MidpointRule> {
    SequenceIntegrator::new(MidpointRule::new(), Extrapolation::Sequence)
}
