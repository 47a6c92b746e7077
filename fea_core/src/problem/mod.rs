//! # Problems
//!
//! A `Problem` is the root container that gets saved to `.fea` files: one
//! model plus everything needed to analyse it.
//!
//! ```text
//! Problem
//! ├── model: Model (parts, instances, sets, constraints, contacts)
//! ├── bcs / displacements: BoundaryCondition registries
//! ├── loads, field_outputs, history_outputs
//! ├── steps: Step (refers to the above by name)
//! └── results: Option<Results> (filled after a completed run)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use fea_core::model::{Model, Node};
//! use fea_core::problem::{BoundaryCondition, Problem, Step, Support};
//!
//! let mut model = Model::new("tower");
//! let mut part = model.new_part("mast");
//! part.add_node(Node::new([0.0, 0.0, 0.0]));
//! model.add_part(part);
//! model.add_nodes_group("mast-1", "base", [0]).unwrap();
//!
//! let mut problem = Problem::new("tower-static", model);
//! problem.add_bc(BoundaryCondition::new("fix-base", "base", Support::Fixed));
//! problem.add_step(Step::static_step("gravity"));
//! assert_eq!(problem.bcs().len(), 1);
//! ```

pub mod bcs;
pub mod loads;
pub mod outputs;
pub mod step;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::FeaResult;
use crate::file_io;
use crate::job::{BackendSerializer, JobHandle, JobPaths, LaunchStatus, SolverLauncher};
use crate::model::Model;
use crate::registry::{AddOutcome, Registry};
use crate::results::{read_results, FieldValue, Results};

pub use bcs::{Axes, BoundaryCondition, Components, Dof, Support};
pub use loads::{Load, STANDARD_GRAVITY};
pub use outputs::{ElementField, FieldOutput, HistoryOutput, NodeField};
pub use step::{Step, StepControls, StepKind};

/// Current schema version for .fea files
pub const SCHEMA_VERSION: &str = "0.1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    /// Also the job name of generated documents
    pub name: String,
    pub description: String,
    /// Schema version (for migration compatibility)
    pub version: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub model: Model,

    /// Where this problem was last loaded from or saved to
    #[serde(skip)]
    pub path: Option<PathBuf>,

    bcs: Registry<BoundaryCondition>,
    displacements: Registry<BoundaryCondition>,
    loads: Registry<Load>,
    field_outputs: Registry<FieldOutput>,
    history_outputs: Registry<HistoryOutput>,
    steps: Registry<Step>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    results: Option<Results>,
}

impl Problem {
    pub fn new(name: impl Into<String>, model: Model) -> Self {
        let now = Utc::now();
        Problem {
            name: name.into(),
            description: String::new(),
            version: SCHEMA_VERSION.to_string(),
            created: now,
            modified: now,
            model,
            path: None,
            bcs: Registry::new(),
            displacements: Registry::new(),
            loads: Registry::new(),
            field_outputs: Registry::new(),
            history_outputs: Registry::new(),
            steps: Registry::new(),
            results: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.modified = Utc::now();
    }

    fn touched(&mut self, outcome: AddOutcome) -> AddOutcome {
        if outcome.is_added() {
            self.touch();
        }
        outcome
    }

    // ------------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------------

    /// Register a boundary condition applied in every step.
    ///
    /// The target set is resolved when a document is generated.
    pub fn add_bc(&mut self, bc: BoundaryCondition) -> AddOutcome {
        let outcome = self.bcs.insert(bc);
        self.touched(outcome)
    }

    /// Register a prescribed displacement that steps can refer to.
    pub fn add_displacement(&mut self, displacement: BoundaryCondition) -> AddOutcome {
        let outcome = self.displacements.insert(displacement);
        self.touched(outcome)
    }

    pub fn add_load(&mut self, load: Load) -> AddOutcome {
        let outcome = self.loads.insert(load);
        self.touched(outcome)
    }

    pub fn add_field_output(&mut self, output: FieldOutput) -> AddOutcome {
        let outcome = self.field_outputs.insert(output);
        self.touched(outcome)
    }

    pub fn add_history_output(&mut self, output: HistoryOutput) -> AddOutcome {
        let outcome = self.history_outputs.insert(output);
        self.touched(outcome)
    }

    /// Append a step; steps run in registration order.
    pub fn add_step(&mut self, step: Step) -> AddOutcome {
        let outcome = self.steps.insert(step);
        self.touched(outcome)
    }

    pub fn bcs(&self) -> &Registry<BoundaryCondition> {
        &self.bcs
    }

    pub fn displacements(&self) -> &Registry<BoundaryCondition> {
        &self.displacements
    }

    pub fn loads(&self) -> &Registry<Load> {
        &self.loads
    }

    pub fn field_outputs(&self) -> &Registry<FieldOutput> {
        &self.field_outputs
    }

    pub fn history_outputs(&self) -> &Registry<HistoryOutput> {
        &self.history_outputs
    }

    pub fn steps(&self) -> &Registry<Step> {
        &self.steps
    }

    pub fn step(&self, name: &str) -> Option<&Step> {
        self.steps.get(name)
    }

    // ------------------------------------------------------------------------
    // Results
    // ------------------------------------------------------------------------

    pub fn attach_results(&mut self, results: Results) {
        tracing::info!(problem = %self.name, steps = results.steps.len(), "results attached");
        self.results = Some(results);
        self.touch();
    }

    pub fn results(&self) -> Option<&Results> {
        self.results.as_ref()
    }

    /// Nodal values of one field in one step
    pub fn nodal_results(&self, step: &str, field: &str) -> Option<&BTreeMap<usize, FieldValue>> {
        self.results.as_ref()?.nodal(step, field)
    }

    pub fn element_results(&self, step: &str, field: &str) -> Option<&BTreeMap<usize, FieldValue>> {
        self.results.as_ref()?.element(step, field)
    }

    // ------------------------------------------------------------------------
    // Running
    // ------------------------------------------------------------------------

    /// Write the job document under `<base>/<name>/`.
    pub fn write_input_file(&self, backend: &dyn BackendSerializer, base: &Path) -> FeaResult<JobPaths> {
        file_io::write_input_file(self, backend, base)
    }

    /// Write the document, run it with `launcher`, and read back results.
    ///
    /// Results are ingested only when the launcher reports completion; a
    /// failed run leaves any previous results untouched.
    pub fn analyse(
        &mut self,
        backend: &dyn BackendSerializer,
        launcher: &dyn SolverLauncher,
        base: &Path,
    ) -> FeaResult<LaunchStatus> {
        let paths = self.write_input_file(backend, base)?;
        let handle = JobHandle {
            document: paths.document.clone(),
            job_name: self.name.clone(),
            working_dir: paths.working_dir.clone(),
        };

        let status = launcher.launch(&handle);
        match &status {
            LaunchStatus::Completed => {
                let results = read_results(&paths.working_dir, &self.name)?;
                self.attach_results(results);
            }
            LaunchStatus::Failed { reason } => {
                tracing::warn!(job = %self.name, backend = backend.name(), %reason, "solver run failed");
            }
        }
        Ok(status)
    }

    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("Problem '{}' (schema {})", self.name, self.version),
            self.model.summary(),
            format!(
                "  {} bcs, {} displacements, {} loads, {} field outputs, {} history outputs",
                self.bcs.len(),
                self.displacements.len(),
                self.loads.len(),
                self.field_outputs.len(),
                self.history_outputs.len()
            ),
        ];
        for step in &self.steps {
            lines.push(format!(
                "  Step '{}' ({}): loads [{}], displacements [{}]",
                step.name,
                step.kind,
                step.loads.join(", "),
                step.displacements.join(", ")
            ));
        }
        if let Some(results) = &self.results {
            lines.push(format!("  Results for {} steps", results.steps.len()));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::backend_by_name;
    use crate::model::Node;
    use std::cell::Cell;
    use std::env::temp_dir;
    use std::fs;

    fn problem() -> Problem {
        let mut model = Model::new("m");
        let mut part = model.new_part("p");
        part.add_node(Node::new([0.0, 0.0, 0.0]));
        part.add_node(Node::new([1.0, 0.0, 0.0]));
        model.add_part(part);
        model.add_nodes_group("p-1", "base", [0]).unwrap();
        model.add_nodes_group("p-1", "tip", [1]).unwrap();
        Problem::new("job", model)
    }

    /// Launcher that writes canned result files and records the call.
    struct CannedLauncher {
        complete: bool,
        calls: Cell<usize>,
    }

    impl SolverLauncher for CannedLauncher {
        fn launch(&self, job: &JobHandle) -> LaunchStatus {
            self.calls.set(self.calls.get() + 1);
            if !self.complete {
                return LaunchStatus::Failed {
                    reason: "licence unavailable".into(),
                };
            }
            let results = job.working_dir.join(format!("{}-results.json", job.job_name));
            fs::write(results, r#"{"load": {"nodal": {"u": {"1": [0.0, 0.0, -0.01]}}}}"#).unwrap();
            LaunchStatus::Completed
        }
    }

    #[test]
    fn test_duplicate_names_ignored() {
        let mut p = problem();
        assert!(p.add_bc(BoundaryCondition::new("fix", "base", Support::Fixed)).is_added());
        assert!(!p.add_bc(BoundaryCondition::new("fix", "tip", Support::Pinned)).is_added());
        assert_eq!(p.bcs().get("fix").unwrap().target, "base");
    }

    #[test]
    fn test_steps_keep_order() {
        let mut p = problem();
        p.add_step(Step::static_step("b"));
        p.add_step(Step::modal("a", 5));
        let names: Vec<&str> = p.steps().names().collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(p.step("a").unwrap().kind, StepKind::Modal { modes: 5 });
    }

    #[test]
    fn test_analyse_ingests_on_completion() {
        let base = temp_dir().join(format!("fea_problem_analyse_{}", std::process::id()));
        let mut p = problem();
        p.add_bc(BoundaryCondition::new("fix", "base", Support::Fixed));
        p.add_load(Load::point("push", "tip", Components::free().with(Dof::Z, -1.0)));
        p.add_step(Step::static_step("load").with_load("push"));

        let launcher = CannedLauncher {
            complete: true,
            calls: Cell::new(0),
        };
        let status = p.analyse(backend_by_name("abaqus").unwrap(), &launcher, &base).unwrap();
        assert_eq!(status, LaunchStatus::Completed);
        assert_eq!(launcher.calls.get(), 1);
        assert!(base.join("job").join("job.inp").exists());
        assert!(p.nodal_results("load", "u").unwrap().contains_key(&1));

        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn test_failed_run_keeps_previous_results() {
        let base = temp_dir().join(format!("fea_problem_failed_{}", std::process::id()));
        let mut p = problem();
        p.attach_results(Results::default());

        let launcher = CannedLauncher {
            complete: false,
            calls: Cell::new(0),
        };
        let status = p.analyse(backend_by_name("abaqus").unwrap(), &launcher, &base).unwrap();
        assert!(matches!(status, LaunchStatus::Failed { .. }));
        assert_eq!(p.results(), Some(&Results::default()));

        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn test_summary_lists_steps() {
        let mut p = problem();
        p.add_step(Step::static_step("load").with_load("push"));
        let summary = p.summary();
        assert!(summary.contains("Problem 'job'"));
        assert!(summary.contains("Step 'load' (static): loads [push]"));
    }
}
