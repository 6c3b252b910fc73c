//! Python bindings for the `_context_pack` extension module.

use pyo3::prelude::*;
use pyo3::wrap_pyfunction;

use crate::config::PackConfig;
use crate::models::GraphDocument;
use crate::pack::pack_graph;

/// Hand a serializable value to Python as plain dicts and lists.
fn to_python<T: serde::Serialize>(py: Python<'_>, value: &T) -> PyResult<PyObject> {
    let json_str = serde_json::to_string(value)
        .map_err(|e| pyo3::exceptions::PyRuntimeError::new_err(e.to_string()))?;
    let json_module = py.import("json")?;
    json_module
        .call_method1("loads", (json_str,))
        .map(|o| o.into())
}

/// Build a context pack from graph JSON text.
///
/// Returns `{intent, budget, sections, metrics}` as a Python dict.
#[pyfunction(name = "pack_graph")]
#[pyo3(signature = (graph_json, intent, budget, diff_paths=vec![], config_yaml=None))]
fn py_pack_graph(
    py: Python<'_>,
    graph_json: &str,
    intent: &str,
    budget: i64,
    diff_paths: Vec<String>,
    config_yaml: Option<&str>,
) -> PyResult<PyObject> {
    let graph = GraphDocument::from_json_str(graph_json)?;
    let config = match config_yaml {
        Some(text) => PackConfig::from_yaml_str(text)?,
        None => PackConfig::default(),
    };
    let pack = py.allow_threads(|| pack_graph(&graph, intent, budget, &diff_paths, &config));
    to_python(py, &pack)
}

/// The default ranking configuration as a dict.
#[pyfunction]
fn default_config(py: Python<'_>) -> PyResult<PyObject> {
    to_python(py, &PackConfig::default())
}

#[pymodule]
fn _context_pack(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add("SECTION_FILTERS", crate::models::SECTION_FILTERS.to_vec())?;
    m.add_function(wrap_pyfunction!(py_pack_graph, m)?)?;
    m.add_function(wrap_pyfunction!(default_config, m)?)?;
    Ok(())
}
