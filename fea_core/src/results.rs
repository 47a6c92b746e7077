//! # Results Ingestion
//!
//! A finished run leaves two JSON files in its working directory:
//!
//! ```text
//! <job>-results.json   step -> "nodal" | "element" -> field -> "<key>" -> value
//! <job>-info.json      step -> { metadata }
//! ```
//!
//! Ingestion re-keys every entity key from text to the integer keys used by
//! the model, and merges each step's info mapping into that step's bucket.
//! Failures are returned as a [`ResultsError`] that tells "nothing was
//! produced" apart from "something was produced but cannot be read".
//!
//! ## Example
//!
//! ```rust
//! use fea_core::results::{ingest_str, FieldValue};
//!
//! let payload = r#"{"load": {"nodal": {"u": {"0": [0.0, 0.0, -0.002]}}}}"#;
//! let info = r#"{"load": {"converged": true}}"#;
//! let results = ingest_str(payload, Some(info)).unwrap();
//!
//! let u = results.nodal("load", "u").unwrap();
//! assert_eq!(u[&0], FieldValue::Components(vec![0.0, 0.0, -0.002]));
//! assert_eq!(results.steps["load"].info["converged"], serde_json::json!(true));
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ResultsError;

/// Suffix of the results file next to the job document
pub const RESULTS_SUFFIX: &str = "-results.json";
/// Suffix of the step info file next to the job document
pub const INFO_SUFFIX: &str = "-info.json";

const NODAL: &str = "nodal";
const ELEMENT: &str = "element";

/// One entity's value for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Scalar(f64),
    Components(Vec<f64>),
    /// Named components (`{"x": .., "magnitude": ..}`)
    Labeled(BTreeMap<String, f64>),
    Other(Value),
}

impl FieldValue {
    /// Scalar value, or the `magnitude` entry of labeled components
    pub fn magnitude(&self) -> Option<f64> {
        match self {
            FieldValue::Scalar(v) => Some(*v),
            FieldValue::Components(values) => Some(values.iter().map(|v| v * v).sum::<f64>().sqrt()),
            FieldValue::Labeled(map) => map.get("magnitude").copied(),
            FieldValue::Other(_) => None,
        }
    }
}

/// Field name -> entity key -> value
pub type FieldResults = BTreeMap<String, BTreeMap<usize, FieldValue>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepResults {
    pub nodal: FieldResults,
    pub element: FieldResults,
    /// Step metadata from the info file
    pub info: BTreeMap<String, Value>,
    /// Domains other than nodal/element, kept verbatim
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Results {
    pub steps: BTreeMap<String, StepResults>,
}

impl Results {
    pub fn step(&self, step: &str) -> Option<&StepResults> {
        self.steps.get(step)
    }

    pub fn nodal(&self, step: &str, field: &str) -> Option<&BTreeMap<usize, FieldValue>> {
        self.steps.get(step)?.nodal.get(field)
    }

    pub fn element(&self, step: &str, field: &str) -> Option<&BTreeMap<usize, FieldValue>> {
        self.steps.get(step)?.element.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Results and info file paths for a job in `working_dir`
pub fn result_files(working_dir: &Path, job: &str) -> (PathBuf, PathBuf) {
    (
        working_dir.join(format!("{}{}", job, RESULTS_SUFFIX)),
        working_dir.join(format!("{}{}", job, INFO_SUFFIX)),
    )
}

/// Read and ingest the results of `job` from its working directory.
///
/// A missing results file is [`ResultsError::NotProduced`]. A missing info
/// file only leaves the step info empty.
pub fn read_results(working_dir: &Path, job: &str) -> Result<Results, ResultsError> {
    let (results_path, info_path) = result_files(working_dir, job);

    let payload = match fs::read_to_string(&results_path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ResultsError::NotProduced {
                path: results_path.display().to_string(),
            })
        }
        Err(e) => {
            return Err(ResultsError::Unreadable {
                path: results_path.display().to_string(),
                reason: e.to_string(),
            })
        }
    };

    let info = match fs::read_to_string(&info_path) {
        Ok(text) => Some(text),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!(path = %info_path.display(), "no info file, step info left empty");
            None
        }
        Err(e) => {
            return Err(ResultsError::Unreadable {
                path: info_path.display().to_string(),
                reason: e.to_string(),
            })
        }
    };

    let payload: Value = serde_json::from_str(&payload).map_err(|e| ResultsError::Unreadable {
        path: results_path.display().to_string(),
        reason: e.to_string(),
    })?;
    let info = match info {
        Some(text) => {
            let value: Value = serde_json::from_str(&text).map_err(|e| ResultsError::Unreadable {
                path: info_path.display().to_string(),
                reason: e.to_string(),
            })?;
            info_entries(value).map_err(|e| at_path(e, &info_path))?
        }
        None => InfoEntries::new(),
    };
    let results = merge(payload, info).map_err(|e| at_path(e, &results_path))?;

    tracing::info!(job, steps = results.steps.len(), "results read");
    Ok(results)
}

/// Ingest a results payload and optional info payload given as JSON text.
pub fn ingest_str(payload: &str, info: Option<&str>) -> Result<Results, ResultsError> {
    let unreadable = |e: serde_json::Error| ResultsError::Unreadable {
        path: String::new(),
        reason: e.to_string(),
    };
    let payload: Value = serde_json::from_str(payload).map_err(unreadable)?;
    let info: Value = match info {
        Some(text) => serde_json::from_str(text).map_err(unreadable)?,
        None => Value::Object(Default::default()),
    };
    ingest(payload, info)
}

/// Ingest already-parsed payloads.
pub fn ingest(payload: Value, info: Value) -> Result<Results, ResultsError> {
    merge(payload, info_entries(info)?)
}

type InfoEntries = BTreeMap<String, BTreeMap<String, Value>>;

fn info_entries(info: Value) -> Result<InfoEntries, ResultsError> {
    serde_json::from_value(info).map_err(|e| ResultsError::Unreadable {
        path: String::new(),
        reason: format!("info payload: {}", e),
    })
}

/// Fill in the file an ingestion error came from.
fn at_path(err: ResultsError, path: &Path) -> ResultsError {
    match err {
        ResultsError::Unreadable { path: p, reason } if p.is_empty() => ResultsError::Unreadable {
            path: path.display().to_string(),
            reason,
        },
        other => other,
    }
}

fn merge(payload: Value, info: InfoEntries) -> Result<Results, ResultsError> {
    let steps: BTreeMap<String, BTreeMap<String, Value>> =
        serde_json::from_value(payload).map_err(|e| ResultsError::Unreadable {
            path: String::new(),
            reason: format!("results payload: {}", e),
        })?;

    let mut results = Results::default();
    for (step, domains) in steps {
        let mut bucket = StepResults::default();
        for (domain, fields) in domains {
            match domain.as_str() {
                NODAL => bucket.nodal = rekey(&step, fields)?,
                ELEMENT => bucket.element = rekey(&step, fields)?,
                _ => {
                    bucket.extra.insert(domain, fields);
                }
            }
        }
        results.steps.insert(step, bucket);
    }

    for (step, entries) in info {
        results.steps.entry(step).or_default().info.extend(entries);
    }

    Ok(results)
}

fn rekey(step: &str, fields: Value) -> Result<FieldResults, ResultsError> {
    let fields: BTreeMap<String, BTreeMap<String, FieldValue>> =
        serde_json::from_value(fields).map_err(|e| ResultsError::Unreadable {
            path: String::new(),
            reason: format!("step '{}': {}", step, e),
        })?;

    let mut out = FieldResults::new();
    for (field, values) in fields {
        let mut keyed = BTreeMap::new();
        for (key, value) in values {
            let parsed = key.trim().parse::<usize>().map_err(|_| ResultsError::InvalidEntityKey {
                step: step.to_string(),
                field: field.clone(),
                key: key.clone(),
            })?;
            keyed.insert(parsed, value);
        }
        out.insert(field, keyed);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::temp_dir;

    fn temp_job_dir(name: &str) -> PathBuf {
        let dir = temp_dir().join(format!("fea_results_test_{}_{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_rekeys_entities_to_integers() {
        let payload = r#"{
            "step-1": {
                "nodal": {"rf": {"0": 1.5, "10": 2.5}},
                "element": {"s": {"3": {"mises": 120.0}}}
            }
        }"#;
        let results = ingest_str(payload, None).unwrap();
        let rf = results.nodal("step-1", "rf").unwrap();
        assert_eq!(rf.keys().copied().collect::<Vec<_>>(), vec![0, 10]);
        assert_eq!(rf[&10].magnitude(), Some(2.5));
        let s = results.element("step-1", "s").unwrap();
        assert!(matches!(s[&3], FieldValue::Labeled(_)));
    }

    #[test]
    fn test_info_merged_into_step() {
        let results = ingest_str(
            r#"{"a": {"nodal": {}}}"#,
            Some(r#"{"a": {"frames": 3}, "b": {"note": "no fields"}}"#),
        )
        .unwrap();
        assert_eq!(results.steps["a"].info["frames"], serde_json::json!(3));
        assert!(results.steps["b"].nodal.is_empty());
    }

    #[test]
    fn test_non_integer_key_rejected() {
        let err = ingest_str(r#"{"a": {"nodal": {"u": {"n-1": 0.0}}}}"#, None).unwrap_err();
        assert_eq!(
            err,
            ResultsError::InvalidEntityKey {
                step: "a".into(),
                field: "u".into(),
                key: "n-1".into()
            }
        );
    }

    #[test]
    fn test_malformed_payload_is_unreadable() {
        assert!(matches!(ingest_str("{not json", None), Err(ResultsError::Unreadable { .. })));
        assert!(matches!(ingest_str("[1, 2]", None), Err(ResultsError::Unreadable { .. })));
    }

    #[test]
    fn test_missing_results_file_is_not_produced() {
        let dir = temp_job_dir("missing");
        let err = read_results(&dir, "job").unwrap_err();
        assert_eq!(err.error_code(), "RESULTS_NOT_PRODUCED");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_read_from_working_dir() {
        let dir = temp_job_dir("read");
        let (results_path, info_path) = result_files(&dir, "job");
        fs::write(&results_path, r#"{"s": {"nodal": {"u": {"1": [0.0, 1.0, 0.0]}}}}"#).unwrap();
        fs::write(&info_path, r#"{"s": {"time": 0.5}}"#).unwrap();

        let results = read_results(&dir, "job").unwrap();
        assert_eq!(results.nodal("s", "u").unwrap()[&1].magnitude(), Some(1.0));
        assert_eq!(results.steps["s"].info["time"], serde_json::json!(0.5));

        fs::write(&results_path, "garbage").unwrap();
        match read_results(&dir, "job") {
            Err(ResultsError::Unreadable { path, .. }) => assert!(path.ends_with("job-results.json")),
            other => panic!("unexpected {:?}", other),
        }
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_broken_info_file_named_in_error() {
        let dir = temp_job_dir("info");
        let (results_path, info_path) = result_files(&dir, "job");
        fs::write(&results_path, r#"{"s": {"nodal": {}}}"#).unwrap();

        fs::write(&info_path, "{truncated").unwrap();
        match read_results(&dir, "job") {
            Err(ResultsError::Unreadable { path, .. }) => assert!(path.ends_with("job-info.json")),
            other => panic!("unexpected {:?}", other),
        }

        fs::write(&info_path, r#"{"s": 3}"#).unwrap();
        match read_results(&dir, "job") {
            Err(ResultsError::Unreadable { path, .. }) => assert!(path.ends_with("job-info.json")),
            other => panic!("unexpected {:?}", other),
        }
        let _ = fs::remove_dir_all(&dir);
    }
}
