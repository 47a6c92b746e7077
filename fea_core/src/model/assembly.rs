//! Assembly-level entities: instances, constraints, surfaces and contact.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::group::Group;
use crate::registry::{Named, Registry};

/// A placement of a part in the assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub name: String,
    /// Name of the placed part
    pub part: String,
    /// Sets over the part's node/element keys, addressable by BCs and loads
    pub groups: Registry<Group>,
}

impl Instance {
    pub fn new(name: impl Into<String>, part: impl Into<String>) -> Self {
        Instance {
            name: name.into(),
            part: part.into(),
            groups: Registry::new(),
        }
    }

    /// Name given to the instance created with a part
    pub fn default_name(part: &str) -> String {
        format!("{}-1", part)
    }
}

impl Named for Instance {
    const KIND: &'static str = "instance";
    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintKind {
    /// Slave nodes follow all master dofs
    Tie,
    /// Slave translations follow the master
    Pin,
    /// Slave nodes slide along the master
    Slider,
}

impl ConstraintKind {
    pub fn code(&self) -> &'static str {
        match self {
            ConstraintKind::Tie => "tie",
            ConstraintKind::Pin => "pin",
            ConstraintKind::Slider => "slider",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Kinematic coupling between two node sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub name: String,
    pub kind: ConstraintKind,
    /// Master node set name
    pub master: String,
    /// Slave node set name
    pub slave: String,
}

impl Constraint {
    pub fn new(name: impl Into<String>, kind: ConstraintKind, master: impl Into<String>, slave: impl Into<String>) -> Self {
        Constraint {
            name: name.into(),
            kind,
            master: master.into(),
            slave: slave.into(),
        }
    }

    pub fn tie(name: impl Into<String>, master: impl Into<String>, slave: impl Into<String>) -> Self {
        Constraint::new(name, ConstraintKind::Tie, master, slave)
    }
}

impl Named for Constraint {
    const KIND: &'static str = "constraint";
    fn name(&self) -> &str {
        &self.name
    }
}

/// One element face of a surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceFace {
    pub element: usize,
    /// Face tag from the element's template (`s1`, `s2`, ...)
    pub face: String,
}

/// Element faces of one instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub name: String,
    pub instance: String,
    pub faces: Vec<SurfaceFace>,
}

impl Surface {
    pub fn new(name: impl Into<String>, instance: impl Into<String>) -> Self {
        Surface {
            name: name.into(),
            instance: instance.into(),
            faces: Vec::new(),
        }
    }

    pub fn with_face(mut self, element: usize, face: impl Into<String>) -> Self {
        self.faces.push(SurfaceFace {
            element,
            face: face.into(),
        });
        self
    }
}

impl Named for Surface {
    const KIND: &'static str = "surface";
    fn name(&self) -> &str {
        &self.name
    }
}

/// Hard contact with Coulomb friction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionProperty {
    pub name: String,
    pub friction: f64,
}

impl InteractionProperty {
    pub fn hard_contact(name: impl Into<String>, friction: f64) -> Self {
        InteractionProperty {
            name: name.into(),
            friction,
        }
    }
}

impl Named for InteractionProperty {
    const KIND: &'static str = "interaction property";
    fn name(&self) -> &str {
        &self.name
    }
}

/// Surface-to-surface contact governed by an interaction property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactPair {
    pub name: String,
    pub interaction: String,
    pub master: String,
    pub slave: String,
}

impl ContactPair {
    pub fn new(
        name: impl Into<String>,
        interaction: impl Into<String>,
        master: impl Into<String>,
        slave: impl Into<String>,
    ) -> Self {
        ContactPair {
            name: name.into(),
            interaction: interaction.into(),
            master: master.into(),
            slave: slave.into(),
        }
    }
}

impl Named for ContactPair {
    const KIND: &'static str = "contact pair";
    fn name(&self) -> &str {
        &self.name
    }
}
