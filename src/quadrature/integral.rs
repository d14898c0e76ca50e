use tracing::trace;

use crate::math::sequence::convergence::Verdict;
use crate::quadrature::improper::Improper;
use crate::quadrature::integrator::{
    Integrand,
    Integrator
};
use crate::quadrature::method::{
    MethodRegistry,
    MethodSpec
};
use crate::quadrature::options::{
    IntegrationOptions,
    OptionOverrides
};
use crate::quadrature::quadratureerror::{
    QuadratureError,
    QuadratureResult
};

/// 計算 `∫_a^b f(x) dx`。
///
/// 先展開 `method` 並把選項合併、驗證一次（設定錯誤在任何求值前回報），
/// 再以 `Improper` 處理無窮端點。呼叫端的 `overrides` 優先於方法自帶的選項。
pub fn integral(
    f: Integrand<'_>,
    a: f64,
    b: f64,
    method: &MethodSpec,
    overrides: &OptionOverrides,
    registry: &MethodRegistry,
) -> QuadratureResult<Verdict> {
    let (integrator, method_overrides) = registry.resolve(method)?;
    let options = IntegrationOptions::default().merge(&method_overrides.overridden_by(overrides));
    options.validate()?;
    trace!(a, b, method = ?method, "integral");
    Improper::new(integrator).integrate(f, a, b, &options)
}

/// 只回傳數值；不收斂時仍回傳最佳估計。
pub fn integral_value(
    f: Integrand<'_>,
    a: f64,
    b: f64,
    method: &MethodSpec,
    overrides: &OptionOverrides,
    registry: &MethodRegistry,
) -> QuadratureResult<f64> {
    integral(f, a, b, method, overrides, registry)?
        .result()
        .ok_or(QuadratureError::EmptySequence)
}
