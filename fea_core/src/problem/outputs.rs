//! Output requests: which result fields the solver should write back.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::registry::Named;

/// Nodal result fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeField {
    /// Displacements
    U,
    /// Rotations
    Ur,
    /// Reaction forces
    Rf,
    /// Reaction moments
    Rm,
    /// Concentrated forces
    Cf,
    /// Concentrated moments
    Cm,
}

impl NodeField {
    pub const ALL: [NodeField; 6] = [
        NodeField::Rf,
        NodeField::Rm,
        NodeField::U,
        NodeField::Ur,
        NodeField::Cf,
        NodeField::Cm,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            NodeField::U => "u",
            NodeField::Ur => "ur",
            NodeField::Rf => "rf",
            NodeField::Rm => "rm",
            NodeField::Cf => "cf",
            NodeField::Cm => "cm",
        }
    }
}

impl fmt::Display for NodeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Element result fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementField {
    /// Section forces
    Sf,
    /// Section moments
    Sm,
    /// Section curvatures
    Sk,
    /// Section strains
    Se,
    /// Stresses
    S,
    /// Strains
    E,
    /// Plastic strains
    Pe,
    /// Rebar forces
    Rbfor,
    /// Connector forces
    Ctf,
}

impl ElementField {
    pub const ALL: [ElementField; 9] = [
        ElementField::Sf,
        ElementField::Sm,
        ElementField::Sk,
        ElementField::Se,
        ElementField::S,
        ElementField::E,
        ElementField::Pe,
        ElementField::Rbfor,
        ElementField::Ctf,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            ElementField::Sf => "sf",
            ElementField::Sm => "sm",
            ElementField::Sk => "sk",
            ElementField::Se => "se",
            ElementField::S => "s",
            ElementField::E => "e",
            ElementField::Pe => "pe",
            ElementField::Rbfor => "rbfor",
            ElementField::Ctf => "ctf",
        }
    }
}

impl fmt::Display for ElementField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOutput {
    pub name: String,
    pub node_fields: Vec<NodeField>,
    pub element_fields: Vec<ElementField>,
}

impl FieldOutput {
    pub fn new(name: impl Into<String>, node_fields: Vec<NodeField>, element_fields: Vec<ElementField>) -> Self {
        FieldOutput {
            name: name.into(),
            node_fields,
            element_fields,
        }
    }

    /// Every node and element field
    pub fn all(name: impl Into<String>) -> Self {
        FieldOutput::new(name, NodeField::ALL.to_vec(), ElementField::ALL.to_vec())
    }
}

impl Named for FieldOutput {
    const KIND: &'static str = "field output";
    fn name(&self) -> &str {
        &self.name
    }
}

/// History request recorded at every increment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryOutput {
    pub name: String,
}

impl HistoryOutput {
    pub fn new(name: impl Into<String>) -> Self {
        HistoryOutput { name: name.into() }
    }
}

impl Named for HistoryOutput {
    const KIND: &'static str = "history output";
    fn name(&self) -> &str {
        &self.name
    }
}
