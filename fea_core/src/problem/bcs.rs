//! # Boundary Conditions
//!
//! Every boundary condition, prescribed displacement and point load shares a
//! single six-slot component record over the degrees of freedom
//! `{x, y, z, xx, yy, zz}`. A slot is either absent (`None`, nothing is
//! emitted for it), zero (fixed) or a prescribed value.
//!
//! The named supports are pure constructors over that record:
//!
//! | support          | x | y | z | xx | yy | zz |
//! |------------------|---|---|---|----|----|----|
//! | `Fixed`          | 0 | 0 | 0 | 0  | 0  | 0  |
//! | `Pinned`         | 0 | 0 | 0 | -  | -  | -  |
//! | `FixedXX`        | 0 | 0 | 0 | 0  | -  | -  |
//! | `RollerX`        | - | 0 | 0 | -  | -  | -  |
//! | `RollerXZ`       | - | 0 | - | -  | -  | -  |
//!
//! ## Example
//!
//! ```rust
//! use fea_core::problem::{BoundaryCondition, Dof, Support};
//!
//! let bc = BoundaryCondition::new("supports", "base", Support::Fixed);
//! assert_eq!(bc.components.present().count(), 6);
//!
//! let roller = BoundaryCondition::new("slide", "right", Support::RollerX);
//! assert_eq!(roller.components.get(Dof::X), None);
//! assert_eq!(roller.components.get(Dof::Y), Some(0.0));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::registry::Named;

// ============================================================================
// Degrees of freedom
// ============================================================================

/// One of the six nodal degrees of freedom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dof {
    X,
    Y,
    Z,
    Xx,
    Yy,
    Zz,
}

impl Dof {
    /// All degrees of freedom in canonical order
    pub const ALL: [Dof; 6] = [Dof::X, Dof::Y, Dof::Z, Dof::Xx, Dof::Yy, Dof::Zz];

    /// Zero-based position in the canonical order
    pub fn index(&self) -> usize {
        match self {
            Dof::X => 0,
            Dof::Y => 1,
            Dof::Z => 2,
            Dof::Xx => 3,
            Dof::Yy => 4,
            Dof::Zz => 5,
        }
    }

    /// One-based column index used by keyword grammars
    pub fn column(&self) -> usize {
        self.index() + 1
    }

    pub fn code(&self) -> &'static str {
        match self {
            Dof::X => "x",
            Dof::Y => "y",
            Dof::Z => "z",
            Dof::Xx => "xx",
            Dof::Yy => "yy",
            Dof::Zz => "zz",
        }
    }

    pub fn is_rotation(&self) -> bool {
        matches!(self, Dof::Xx | Dof::Yy | Dof::Zz)
    }
}

impl fmt::Display for Dof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Six-slot component record shared by BCs and point loads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub xx: Option<f64>,
    pub yy: Option<f64>,
    pub zz: Option<f64>,
}

impl Components {
    /// All slots absent
    pub fn free() -> Self {
        Components::default()
    }

    /// All slots zero
    pub fn zero() -> Self {
        Components {
            x: Some(0.0),
            y: Some(0.0),
            z: Some(0.0),
            xx: Some(0.0),
            yy: Some(0.0),
            zz: Some(0.0),
        }
    }

    pub fn get(&self, dof: Dof) -> Option<f64> {
        match dof {
            Dof::X => self.x,
            Dof::Y => self.y,
            Dof::Z => self.z,
            Dof::Xx => self.xx,
            Dof::Yy => self.yy,
            Dof::Zz => self.zz,
        }
    }

    pub fn set(&mut self, dof: Dof, value: Option<f64>) {
        let slot = match dof {
            Dof::X => &mut self.x,
            Dof::Y => &mut self.y,
            Dof::Z => &mut self.z,
            Dof::Xx => &mut self.xx,
            Dof::Yy => &mut self.yy,
            Dof::Zz => &mut self.zz,
        };
        *slot = value;
    }

    /// Builder form of [`Components::set`]
    pub fn with(mut self, dof: Dof, value: f64) -> Self {
        self.set(dof, Some(value));
        self
    }

    /// Present slots in canonical order; absent slots are skipped.
    pub fn present(&self) -> impl Iterator<Item = (Dof, f64)> + '_ {
        Dof::ALL
            .iter()
            .filter_map(move |&dof| self.get(dof).map(|value| (dof, value)))
    }

    /// Every present slot multiplied by `factor`
    pub fn scaled(&self, factor: f64) -> Self {
        let mut out = Components::free();
        for (dof, value) in self.present() {
            out.set(dof, Some(value * factor));
        }
        out
    }

    /// Activity flags: a dof stays active when its slot is absent
    pub fn activity(&self) -> [bool; 6] {
        let mut flags = [true; 6];
        for (dof, _) in self.present() {
            flags[dof.index()] = false;
        }
        flags
    }
}

// ============================================================================
// Supports
// ============================================================================

/// Reference frame of a component record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axes {
    #[default]
    Global,
    Local,
}

impl Axes {
    pub fn code(&self) -> &'static str {
        match self {
            Axes::Global => "global",
            Axes::Local => "local",
        }
    }
}

/// Closed set of named supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Support {
    /// Caller-supplied components
    General,
    Fixed,
    Pinned,
    FixedXX,
    FixedYY,
    FixedZZ,
    RollerX,
    RollerY,
    RollerZ,
    RollerXY,
    RollerYZ,
    RollerXZ,
}

impl Support {
    /// All named supports (excludes `General`)
    pub const ALL: [Support; 11] = [
        Support::Fixed,
        Support::Pinned,
        Support::FixedXX,
        Support::FixedYY,
        Support::FixedZZ,
        Support::RollerX,
        Support::RollerY,
        Support::RollerZ,
        Support::RollerXY,
        Support::RollerYZ,
        Support::RollerXZ,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Support::General => "general",
            Support::Fixed => "fixed",
            Support::Pinned => "pinned",
            Support::FixedXX => "fixed_xx",
            Support::FixedYY => "fixed_yy",
            Support::FixedZZ => "fixed_zz",
            Support::RollerX => "roller_x",
            Support::RollerY => "roller_y",
            Support::RollerZ => "roller_z",
            Support::RollerXY => "roller_xy",
            Support::RollerYZ => "roller_yz",
            Support::RollerXZ => "roller_xz",
        }
    }

    /// Component record for this support.
    ///
    /// `General` yields an all-absent record.
    pub fn components(&self) -> Components {
        let pinned = Components {
            x: Some(0.0),
            y: Some(0.0),
            z: Some(0.0),
            ..Components::free()
        };

        let (fixed, released): (&[Dof], &[Dof]) = match self {
            Support::General => return Components::free(),
            Support::Fixed => return Components::zero(),
            Support::Pinned => (&[], &[]),
            Support::FixedXX => (&[Dof::Xx], &[]),
            Support::FixedYY => (&[Dof::Yy], &[]),
            Support::FixedZZ => (&[Dof::Zz], &[]),
            Support::RollerX => (&[], &[Dof::X]),
            Support::RollerY => (&[], &[Dof::Y]),
            Support::RollerZ => (&[], &[Dof::Z]),
            Support::RollerXY => (&[], &[Dof::X, Dof::Y]),
            Support::RollerYZ => (&[], &[Dof::Y, Dof::Z]),
            Support::RollerXZ => (&[], &[Dof::X, Dof::Z]),
        };

        let mut out = pinned;
        for &dof in fixed {
            out.set(dof, Some(0.0));
        }
        for &dof in released {
            out.set(dof, None);
        }
        out
    }
}

impl fmt::Display for Support {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A boundary condition or prescribed displacement applied to a node set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryCondition {
    pub name: String,
    /// Name of the node set this condition addresses
    pub target: String,
    pub support: Support,
    pub components: Components,
    pub axes: Axes,
}

impl BoundaryCondition {
    /// A named support on `target`
    pub fn new(name: impl Into<String>, target: impl Into<String>, support: Support) -> Self {
        BoundaryCondition {
            name: name.into(),
            target: target.into(),
            support,
            components: support.components(),
            axes: Axes::Global,
        }
    }

    /// Explicit components; unset slots stay free
    pub fn general(name: impl Into<String>, target: impl Into<String>, components: Components) -> Self {
        BoundaryCondition {
            name: name.into(),
            target: target.into(),
            support: Support::General,
            components,
            axes: Axes::Global,
        }
    }

    pub fn with_axes(mut self, axes: Axes) -> Self {
        self.axes = axes;
        self
    }
}

impl Named for BoundaryCondition {
    const KIND: &'static str = "boundary condition";
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_has_six_zero_components() {
        let c = Support::Fixed.components();
        let present: Vec<(Dof, f64)> = c.present().collect();
        assert_eq!(present.len(), 6);
        assert!(present.iter().all(|(_, v)| *v == 0.0));
    }

    #[test]
    fn test_pinned_frees_rotations() {
        let c = Support::Pinned.components();
        assert_eq!(c.present().map(|(d, _)| d).collect::<Vec<_>>(), vec![Dof::X, Dof::Y, Dof::Z]);
    }

    #[test]
    fn test_fixed_rotation_variants() {
        let c = Support::FixedYY.components();
        assert_eq!(c.yy, Some(0.0));
        assert_eq!(c.xx, None);
        assert_eq!(c.zz, None);
        assert_eq!(c.present().count(), 4);
    }

    #[test]
    fn test_roller_releases_named_axes() {
        let c = Support::RollerXZ.components();
        assert_eq!(c.x, None);
        assert_eq!(c.z, None);
        assert_eq!(c.y, Some(0.0));
        assert_eq!(c.present().count(), 1);

        let c = Support::RollerY.components();
        assert_eq!(c.present().map(|(d, _)| d).collect::<Vec<_>>(), vec![Dof::X, Dof::Z]);
    }

    #[test]
    fn test_general_keeps_caller_values() {
        let bc = BoundaryCondition::general(
            "settle",
            "base",
            Components::free().with(Dof::Z, -0.01).with(Dof::Xx, 0.0),
        );
        assert_eq!(bc.support, Support::General);
        assert_eq!(bc.components.get(Dof::Z), Some(-0.01));
        assert_eq!(bc.components.get(Dof::X), None);
    }

    #[test]
    fn test_activity_flags() {
        let flags = Support::Pinned.components().activity();
        assert_eq!(flags, [false, false, false, true, true, true]);
    }

    #[test]
    fn test_columns_are_one_based() {
        let columns: Vec<usize> = Dof::ALL.iter().map(|d| d.column()).collect();
        assert_eq!(columns, vec![1, 2, 3, 4, 5, 6]);
    }
}
