//! Loads applied within analysis steps.

use serde::{Deserialize, Serialize};

use crate::problem::bcs::{Axes, Components};
use crate::registry::Named;

/// Standard gravitational acceleration
pub const STANDARD_GRAVITY: f64 = 9.81;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Load {
    /// Forces (x, y, z) and moments (xx, yy, zz) on every node of a set
    Point {
        name: String,
        /// Node set name
        target: String,
        components: Components,
        axes: Axes,
    },
    /// Body acceleration over the whole model
    Gravity {
        name: String,
        g: f64,
        /// Direction cosines
        direction: [f64; 3],
    },
}

impl Load {
    pub fn point(name: impl Into<String>, target: impl Into<String>, components: Components) -> Self {
        Load::Point {
            name: name.into(),
            target: target.into(),
            components,
            axes: Axes::Global,
        }
    }

    /// Standard gravity along -z
    pub fn gravity(name: impl Into<String>) -> Self {
        Load::Gravity {
            name: name.into(),
            g: STANDARD_GRAVITY,
            direction: [0.0, 0.0, -1.0],
        }
    }

    pub fn gravity_along(name: impl Into<String>, g: f64, direction: [f64; 3]) -> Self {
        Load::Gravity {
            name: name.into(),
            g,
            direction,
        }
    }

    pub fn with_axes(mut self, new_axes: Axes) -> Self {
        if let Load::Point { axes, .. } = &mut self {
            *axes = new_axes;
        }
        self
    }

    pub fn code(&self) -> &'static str {
        match self {
            Load::Point { .. } => "point",
            Load::Gravity { .. } => "gravity",
        }
    }

    /// Copy with magnitudes multiplied by a step load factor
    pub fn scaled(&self, factor: f64) -> Load {
        match self {
            Load::Point {
                name,
                target,
                components,
                axes,
            } => Load::Point {
                name: name.clone(),
                target: target.clone(),
                components: components.scaled(factor),
                axes: *axes,
            },
            Load::Gravity { name, g, direction } => Load::Gravity {
                name: name.clone(),
                g: g * factor,
                direction: *direction,
            },
        }
    }
}

impl Named for Load {
    const KIND: &'static str = "load";
    fn name(&self) -> &str {
        match self {
            Load::Point { name, .. } | Load::Gravity { name, .. } => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::bcs::Dof;

    #[test]
    fn test_scaling_keeps_absent_slots_absent() {
        let load = Load::point("push", "tip", Components::free().with(Dof::Z, -10.0));
        match load.scaled(1.5) {
            Load::Point { components, .. } => {
                assert_eq!(components.z, Some(-15.0));
                assert_eq!(components.x, None);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_gravity_defaults() {
        let load = Load::gravity("self-weight").scaled(2.0);
        assert_eq!(load.name(), "self-weight");
        match load {
            Load::Gravity { g, direction, .. } => {
                assert_eq!(g, 2.0 * STANDARD_GRAVITY);
                assert_eq!(direction, [0.0, 0.0, -1.0]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
