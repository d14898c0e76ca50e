use std::cell::{
    Ref,
    RefCell
};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use crate::manager::manager::IManager;
use crate::manager::managererror::ManagerError;
use crate::math::sequence::convergence::Verdict;
use crate::quadrature::integral::integral;
use crate::quadrature::integrator::Integrand;
use crate::quadrature::method::{
    MethodRegistry,
    MethodSpec
};
use crate::quadrature::options::OptionOverrides;
use crate::quadrature::quadratureerror::QuadratureResult;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigurationJsonProp {
    #[serde(default)]
    defaults: OptionOverrides,
    #[serde(default)]
    methods: Vec<serde_json::Value>
}

/// 全域預設選項與具名方法；由 JSON 設定檔載入。
pub struct Configuration {
    defaults_cell: RefCell<OptionOverrides>,
    method_registry: MethodRegistry
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration::new()
    }
}

impl Configuration {
    pub fn new() -> Configuration {
        Configuration {
            defaults_cell: RefCell::new(OptionOverrides::new()),
            method_registry: MethodRegistry::new()
        }
    }

    pub fn defaults(&self) -> Ref<'_, OptionOverrides> {
        self.defaults_cell.borrow()
    }

    pub fn method_registry(&self) -> &MethodRegistry {
        &self.method_registry
    }

    pub fn from_reader<P>(&self, file_path: P) -> Result<(), ManagerError>
    where
        P: AsRef<Path>
    {
        let file = File::open(file_path)?;
        let reader = BufReader::new(file);
        let json_prop: ConfigurationJsonProp = serde_json::from_reader(reader)?;
        self.method_registry.definitions().insert_obj_from_json_vec(&json_prop.methods)?;
        let mut defaults = self.defaults_cell.borrow_mut();
        *defaults = defaults.overridden_by(&json_prop.defaults);
        Ok(())
    }

    /// 選項優先順序：呼叫端 `overrides` > 方法自帶選項 > 設定檔 `defaults`。
    pub fn integral(
        &self,
        f: Integrand<'_>,
        a: f64,
        b: f64,
        method: &MethodSpec,
        overrides: &OptionOverrides,
    ) -> QuadratureResult<Verdict> {
        let (integrator, method_overrides) = self.method_registry.resolve(method)?;
        let combined = self.defaults().overridden_by(&method_overrides).overridden_by(overrides);
        integral(f, a, b, &MethodSpec::direct(integrator), &combined, &self.method_registry)
    }
}
