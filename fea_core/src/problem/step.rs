//! Analysis steps.
//!
//! A step refers to loads, prescribed displacements and output requests by
//! name; the names are resolved against the problem's registries when the
//! job document is generated.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::registry::Named;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepKind {
    Static,
    /// Eigenfrequency extraction
    Modal { modes: usize },
}

impl StepKind {
    pub fn code(&self) -> &'static str {
        match self {
            StepKind::Static => "static",
            StepKind::Modal { .. } => "modal",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Numeric controls of a step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepControls {
    /// Multiplier on every load of the step
    pub factor: f64,
    pub nlgeom: bool,
    pub tolerance: f64,
    pub iterations: usize,
    pub increments: usize,
    pub max_increments: usize,
    pub initial_increment: f64,
    pub min_increment: f64,
    pub max_increment: f64,
}

impl Default for StepControls {
    fn default() -> Self {
        StepControls {
            factor: 1.0,
            nlgeom: false,
            tolerance: 0.01,
            iterations: 100,
            increments: 1,
            max_increments: 100,
            initial_increment: 1.0,
            min_increment: 1e-5,
            max_increment: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    pub kind: StepKind,
    pub loads: Vec<String>,
    pub displacements: Vec<String>,
    pub field_outputs: Vec<String>,
    pub history_outputs: Vec<String>,
    pub controls: StepControls,
}

impl Step {
    pub fn new(name: impl Into<String>, kind: StepKind) -> Self {
        Step {
            name: name.into(),
            kind,
            loads: Vec::new(),
            displacements: Vec::new(),
            field_outputs: Vec::new(),
            history_outputs: Vec::new(),
            controls: StepControls::default(),
        }
    }

    pub fn static_step(name: impl Into<String>) -> Self {
        Step::new(name, StepKind::Static)
    }

    pub fn modal(name: impl Into<String>, modes: usize) -> Self {
        Step::new(name, StepKind::Modal { modes })
    }

    pub fn with_load(mut self, load: impl Into<String>) -> Self {
        self.loads.push(load.into());
        self
    }

    pub fn with_displacement(mut self, displacement: impl Into<String>) -> Self {
        self.displacements.push(displacement.into());
        self
    }

    pub fn with_field_output(mut self, output: impl Into<String>) -> Self {
        self.field_outputs.push(output.into());
        self
    }

    pub fn with_history_output(mut self, output: impl Into<String>) -> Self {
        self.history_outputs.push(output.into());
        self
    }

    pub fn with_controls(mut self, controls: StepControls) -> Self {
        self.controls = controls;
        self
    }

    pub fn with_factor(mut self, factor: f64) -> Self {
        self.controls.factor = factor;
        self
    }

    pub fn with_nlgeom(mut self, nlgeom: bool) -> Self {
        self.controls.nlgeom = nlgeom;
        self
    }
}

impl Named for Step {
    const KIND: &'static str = "step";
    fn name(&self) -> &str {
        &self.name
    }
}
