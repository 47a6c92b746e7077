//! Nodes: coordinates, lumped mass and dof activity.

use serde::{Deserialize, Serialize};

use crate::problem::bcs::BoundaryCondition;

/// A point of the mesh, owned by exactly one part.
///
/// `key` and `name` are assigned by [`crate::model::Part::add_node`]; a node
/// built with [`Node::new`] is unregistered until then.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub key: usize,
    pub name: String,
    pub xyz: [f64; 3],
    /// Lumped mass per translational axis
    pub mass: [f64; 3],
    pub temperature: Option<f64>,
    /// Active flags over `{x, y, z, xx, yy, zz}`
    pub dof: [bool; 6],
}

impl Node {
    pub fn new(xyz: [f64; 3]) -> Self {
        Node {
            key: 0,
            name: String::new(),
            xyz,
            mass: [0.0; 3],
            temperature: None,
            dof: [true; 6],
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Same mass on all three axes
    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = [mass; 3];
        self
    }

    pub fn with_mass_xyz(mut self, mass: [f64; 3]) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn x(&self) -> f64 {
        self.xyz[0]
    }

    pub fn y(&self) -> f64 {
        self.xyz[1]
    }

    pub fn z(&self) -> f64 {
        self.xyz[2]
    }

    pub fn has_mass(&self) -> bool {
        self.mass.iter().any(|m| *m != 0.0)
    }

    /// Restrict the dofs a boundary condition constrains.
    pub fn apply_bc(&mut self, bc: &BoundaryCondition) {
        self.dof = bc.components.activity();
    }

    /// Geometric fingerprint used for duplicate detection.
    pub fn gkey(&self, precision: usize) -> String {
        geometric_key(self.xyz, precision)
    }
}

/// `"x,y,z"` with every coordinate rounded to `precision` decimals.
///
/// Negative zero is printed as zero so that `-0.0001` and `0.0` collide.
pub fn geometric_key(xyz: [f64; 3], precision: usize) -> String {
    let parts: Vec<String> = xyz
        .iter()
        .map(|value| {
            let text = format!("{:.*}", precision, value);
            if text.starts_with('-') && text[1..].chars().all(|c| c == '0' || c == '.') {
                text[1..].to_string()
            } else {
                text
            }
        })
        .collect();
    parts.join(",")
}
