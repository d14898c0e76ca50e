use std::f64::consts::PI;

use tracing_subscriber::EnvFilter;

use quadrature::configuration::Configuration;
use quadrature::manager::manager::IManager;
use quadrature::manager::managererror::ManagerError;
use quadrature::quadrature::method::MethodSpec;
use quadrature::quadrature::options::OptionOverrides;

// 用法：quadrature [config.json]
// 記錄層級由 RUST_LOG 控制，例如 RUST_LOG=quadrature=debug

fn main() -> Result<(), ManagerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Configuration::new();
    if let Some(config_path) = std::env::args().nth(1) {
        config.from_reader(config_path)?;
    }

    let overrides = OptionOverrides::new();
    let cases: [(&str, &dyn Fn(f64) -> f64, f64, f64, f64); 4] = [
        ("x^2 on [0, 1]", &|x: f64| x * x, 0.0, 1.0, 1.0 / 3.0),
        ("1/x^2 on [1, inf)", &|x: f64| 1.0 / (x * x), 1.0, f64::INFINITY, 1.0),
        ("exp(-x^2) on the real line", &|x: f64| (-x * x).exp(), f64::NEG_INFINITY, f64::INFINITY, PI.sqrt()),
        ("narrow spike at 1/2", &|x: f64| 1.0 / (1e-4 + (x - 0.5) * (x - 0.5)), 0.0, 1.0, 200.0 * 50f64.atan())
    ];

    let mut methods = vec![MethodSpec::default()];
    methods.extend(config.method_registry().definitions().names().into_iter().map(MethodSpec::named));

    for method in methods.iter() {
        println!("method: {:?}", method);
        for (label, f, a, b, exact) in cases.iter() {
            let verdict = config.integral(*f, *a, *b, method, &overrides)?;
            let value = verdict.result().unwrap_or(f64::NAN);
            println!(
                "  {:<28} value = {:<22} error = {:<10.3e} converged = {} terms = {}",
                label,
                value,
                (value - exact).abs(),
                verdict.is_converged(),
                verdict.terms_checked()
            );
        }
    }
    Ok(())
}
