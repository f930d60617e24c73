use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use sim_core::config::{load_diet_config, load_fauna_config};
use sim_core::SimConfig;

#[pyfunction]
fn version() -> &'static str {
    "0.1.0"
}

/// A constructed simulation engine, opaque to Python beyond `run_headless`.
#[pyclass]
struct PyEngine {
    engine: sim_core::Engine,
}

#[pymethods]
impl PyEngine {
    fn run_headless(&mut self, tick_count: u64) -> PyResult<String> {
        let history = sim_core::run_headless(&mut self.engine, tick_count);
        serde_json::to_string(&history).map_err(|e| PyValueError::new_err(e.to_string()))
    }

    #[getter]
    fn tick(&self) -> u64 {
        self.engine.tick
    }
}

/// Parse the three JSON configuration documents and construct an engine.
#[pyfunction]
fn create(sim_config: &str, fauna_config: &str, diet_config: &str, seed: u64) -> PyResult<PyEngine> {
    let sim_config =
        SimConfig::from_json_str(sim_config).map_err(|e| PyValueError::new_err(e.to_string()))?;
    let fauna_config =
        load_fauna_config(fauna_config).map_err(|e| PyValueError::new_err(e.to_string()))?;
    let diet_config =
        load_diet_config(diet_config).map_err(|e| PyValueError::new_err(e.to_string()))?;
    let engine = sim_core::create(sim_config, fauna_config, diet_config, seed)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    Ok(PyEngine { engine })
}

#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(version, m)?)?;
    m.add_function(wrap_pyfunction!(create, m)?)?;
    m.add_class::<PyEngine>()?;
    Ok(())
}
