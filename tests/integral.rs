use std::f64::consts::PI;
use std::sync::Arc;

use approx::assert_relative_eq;

use quadrature::math::compensatedsum::CompensatedSum;
use quadrature::math::extrapolation::richardson::richardson_column;
use quadrature::math::interval::Interval;
use quadrature::quadrature::integral::{
    integral,
    integral_value
};
use quadrature::quadrature::method::{
    MethodRegistry,
    MethodSpec
};
use quadrature::quadrature::options::OptionOverrides;
use quadrature::quadrature::quadratureerror::QuadratureError;
use quadrature::quadrature::rule::accelerated;
use quadrature::quadrature::rule::trapezoid::trapezoid_sum;

const INF: f64 = f64::INFINITY;

fn tolerance(tolerance: f64) -> OptionOverrides {
    OptionOverrides {
        tolerance: Some(tolerance),
        seed: Some(2024),
        ..OptionOverrides::new()
    }
}

#[test]
fn parabola_converges_with_every_builtin() {
    let registry = MethodRegistry::new();
    let f = |x: f64| x * x;
    for name in ["midpoint", "trapezoid", "simpson", "boole", "romberg", "milne", "adaptive", "open", "closed"] {
        let verdict = integral(&f, 0.0, 1.0, &MethodSpec::named(name), &tolerance(1e-9), &registry).unwrap();
        assert!(verdict.is_converged(), "{}", name);
        assert_relative_eq!(verdict.result().unwrap(), 1.0 / 3.0, max_relative = 1e-7);
    }
}

#[test]
fn kahan_sum_of_alternating_magnitudes() {
    let xs = [1e8, 1.0, -1e8, 1.0].repeat(1000);
    assert_eq!(xs.iter().copied().collect::<CompensatedSum>().value(), 2000.0);

    let tenths = std::iter::repeat(0.1).take(1_000_000);
    let naive: f64 = tenths.clone().fold(0.0, |acc, x| acc + x);
    let compensated: CompensatedSum = tenths.collect();
    assert!((compensated.value() - 1e5).abs() < (naive - 1e5).abs());
}

#[test]
fn first_richardson_column_over_trapezoid_is_simpson() {
    let f = |x: f64| x.sin();
    let trapezoids: Vec<f64> = (0..4).map(|k| trapezoid_sum(&f, 0.0, 1.0, 1 << k)).collect();
    let column: Vec<f64> = richardson_column(trapezoids, 1, 2.0, 2.0, 2.0)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    for (k, value) in column.iter().enumerate() {
        let n = 2usize << k;
        let h = 1.0 / n as f64;
        let simpson = h / 3.0
            * (0..=n)
                .map(|i| {
                    let weight = if i == 0 || i == n { 1.0 } else if i % 2 == 1 { 4.0 } else { 2.0 };
                    weight * f(i as f64 * h)
                })
                .sum::<f64>();
        assert_relative_eq!(*value, simpson, max_relative = 1e-12);
    }
}

#[test]
fn inverse_square_tail_to_infinity() {
    let f = |x: f64| 1.0 / (x * x);
    let verdict = integral(&f, 1.0, INF, &MethodSpec::default(), &tolerance(1e-9), &MethodRegistry::new()).unwrap();
    assert!(verdict.is_converged());
    assert_relative_eq!(verdict.result().unwrap(), 1.0, max_relative = 1e-9);
}

#[test]
fn gaussian_over_the_real_line() {
    let f = |x: f64| (-x * x).exp();
    let verdict = integral(&f, -INF, INF, &MethodSpec::default(), &tolerance(1e-10), &MethodRegistry::new()).unwrap();
    assert!(verdict.is_converged());
    assert_relative_eq!(verdict.result().unwrap(), PI.sqrt(), max_relative = 1e-6);
}

#[test]
fn closed_method_never_samples_infinity() {
    let registry = MethodRegistry::new();
    let closed = MethodSpec::named("closed");

    let gaussian = |x: f64| (-x * x).exp();
    let verdict = integral(&gaussian, -INF, INF, &closed, &tolerance(1e-10), &registry).unwrap();
    assert!(verdict.is_converged());
    assert_relative_eq!(verdict.result().unwrap(), PI.sqrt(), max_relative = 1e-6);

    let inverse_square = |x: f64| 1.0 / (x * x);
    let verdict = integral(&inverse_square, 1.0, INF, &closed, &tolerance(1e-9), &registry).unwrap();
    assert!(verdict.is_converged());
    assert_relative_eq!(verdict.result().unwrap(), 1.0, max_relative = 1e-9);
}

#[test]
fn infinite_integrand_values_are_errors() {
    let registry = MethodRegistry::new();
    let f = |x: f64| 1.0 / x.sqrt();
    for name in ["romberg", "closed"] {
        let err = integral(&f, 0.0, 1.0, &MethodSpec::named(name), &OptionOverrides::new(), &registry).unwrap_err();
        assert!(matches!(err, QuadratureError::NonFiniteEstimate { .. }), "{}: {:?}", name, err);
    }
}

#[test]
fn narrow_spike_is_split_adaptively() {
    let f = |x: f64| 1.0 / (1e-4 + (x - 0.5) * (x - 0.5));
    let overrides = OptionOverrides {
        adaptive_maxterms: Some(4),
        ..tolerance(1e-10)
    };
    let verdict = integral(&f, 0.0, 1.0, &MethodSpec::named("adaptive"), &overrides, &MethodRegistry::new()).unwrap();
    assert!(verdict.is_converged());
    assert!(verdict.terms_checked() > 1);
    assert_relative_eq!(verdict.result().unwrap(), 200.0 * 50f64.atan(), max_relative = 1e-6);
}

#[test]
fn roundoff_width_interval_is_a_single_slice() {
    let f = |x: f64| x;
    let verdict = integral(&f, 5.0, 5.0 + 1e-16, &MethodSpec::default(), &OptionOverrides::new(), &MethodRegistry::new()).unwrap();
    assert!(verdict.is_converged());
    assert_eq!(verdict.terms_checked(), 1);
}

#[test]
fn reversed_and_degenerate_infinite_bounds() {
    let registry = MethodRegistry::new();
    let f = |x: f64| (-x).exp();
    let forward = integral_value(&f, 0.0, INF, &MethodSpec::default(), &tolerance(1e-10), &registry).unwrap();
    let backward = integral_value(&f, INF, 0.0, &MethodSpec::default(), &tolerance(1e-10), &registry).unwrap();
    assert_relative_eq!(forward, 1.0, max_relative = 1e-8);
    assert_relative_eq!(backward, -forward, max_relative = 1e-12);
    let nothing = integral(&f, INF, INF, &MethodSpec::default(), &OptionOverrides::new(), &registry).unwrap();
    assert!(nothing.is_converged());
    assert_eq!(nothing.result(), Some(0.0));
}

#[test]
fn endpoint_singularity_through_a_substitution() {
    let registry = MethodRegistry::new();
    let f = |x: f64| x.cos() / x.sqrt();
    let method = MethodSpec::named("adaptive").substituted("inverse-sqrt-lower", None).unwrap();
    let value = integral_value(&f, 0.0, 1.0, &method, &tolerance(1e-11), &registry).unwrap();
    // ∫₀¹ cos(x)/√x dx = 2·∫₀¹ cos(t²) dt
    let reference = integral_value(
        &|t: f64| 2.0 * (t * t).cos(),
        0.0,
        1.0,
        &MethodSpec::named("romberg"),
        &tolerance(1e-13),
        &registry,
    )
    .unwrap();
    assert_relative_eq!(value, reference, max_relative = 1e-9);
}

#[test]
fn direct_integrators_bypass_the_registry() {
    let f = |x: f64| x.exp();
    let method = MethodSpec::direct(Arc::new(accelerated::boole()));
    let overrides = OptionOverrides {
        interval: Some(Interval::CLOSED),
        ..tolerance(1e-12)
    };
    let value = integral_value(&f, 0.0, 1.0, &method, &overrides, &MethodRegistry::new()).unwrap();
    assert_relative_eq!(value, std::f64::consts::E - 1.0, max_relative = 1e-11);
}
