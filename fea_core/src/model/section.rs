//! # Sections
//!
//! A section pairs a cross-section family with its material. Geometric
//! properties are computed once, at construction, from closed-form formulas
//! per family:
//!
//! | family        | A                         | Ixx                        | J                                  |
//! |---------------|---------------------------|----------------------------|------------------------------------|
//! | circular      | πD²/4                     | πD⁴/64                     | πD⁴/32                             |
//! | rectangular   | bh                        | bh³/12                     | l1·l2³(0.33333 - 0.21·l2/l1·(...)) |
//! | I             | 2b·tf + (h - 2tf)tw       | see [`Shape::properties`]  | (2b·tf³ + (h - tf)tw³)/3           |
//! | pipe          | π/4(D² - (D - 2t)²)       | π/4(r⁴ - (r - t)⁴)         | 2/3·π(r + t/2)t³                   |
//!
//! ## Example
//!
//! ```rust
//! use fea_core::model::{Material, Section};
//!
//! let steel = Material::elastic_isotropic("steel", 210e9, 0.3, 7850.0);
//! let rect = Section::rectangular("r100x200", 0.1, 0.2, steel);
//! assert!((rect.properties.a.unwrap() - 0.02).abs() < 1e-12);
//! assert_eq!(rect.material_name(), Some("steel"));
//! ```

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::model::material::MaterialRef;
use crate::registry::Named;

/// Geometric properties of a section; `None` where the family does not
/// define the quantity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionProperties {
    pub a: Option<f64>,
    pub ixx: Option<f64>,
    pub iyy: Option<f64>,
    pub ixy: Option<f64>,
    pub j: Option<f64>,
}

impl SectionProperties {
    fn beam(a: f64, ixx: f64, iyy: f64, j: Option<f64>) -> Self {
        SectionProperties {
            a: Some(a),
            ixx: Some(ixx),
            iyy: Some(iyy),
            ixy: Some(0.0),
            j,
        }
    }

    fn axial(a: f64) -> Self {
        SectionProperties {
            a: Some(a),
            ixx: Some(0.0),
            iyy: Some(0.0),
            ixy: Some(0.0),
            j: Some(0.0),
        }
    }
}

/// Section families with their defining dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum Shape {
    Angle { b: f64, h: f64, t: f64 },
    Box { b: f64, h: f64, tw: f64, tf: f64 },
    Circular { r: f64 },
    I { b: f64, h: f64, tw: f64, tf: f64 },
    Pipe { r: f64, t: f64 },
    Rectangular { b: f64, h: f64 },
    Trapezoidal { b1: f64, b2: f64, h: f64 },
    /// Beam with user-supplied properties
    GeneralBeam { properties: SectionProperties },
    Truss { a: f64 },
    Strut { a: f64 },
    Tie { a: f64 },
    Shell { t: f64 },
    Membrane { t: f64 },
    Solid,
    Spring { stiffness: f64 },
    Mass { mass: f64 },
}

impl Shape {
    pub fn code(&self) -> &'static str {
        match self {
            Shape::Angle { .. } => "angle",
            Shape::Box { .. } => "box",
            Shape::Circular { .. } => "circular",
            Shape::I { .. } => "i",
            Shape::Pipe { .. } => "pipe",
            Shape::Rectangular { .. } => "rectangular",
            Shape::Trapezoidal { .. } => "trapezoidal",
            Shape::GeneralBeam { .. } => "general_beam",
            Shape::Truss { .. } => "truss",
            Shape::Strut { .. } => "strut",
            Shape::Tie { .. } => "tie",
            Shape::Shell { .. } => "shell",
            Shape::Membrane { .. } => "membrane",
            Shape::Solid => "solid",
            Shape::Spring { .. } => "spring",
            Shape::Mass { .. } => "mass",
        }
    }

    /// Families assigned to beam elements
    pub fn is_beam(&self) -> bool {
        matches!(
            self,
            Shape::Angle { .. }
                | Shape::Box { .. }
                | Shape::Circular { .. }
                | Shape::I { .. }
                | Shape::Pipe { .. }
                | Shape::Rectangular { .. }
                | Shape::Trapezoidal { .. }
                | Shape::GeneralBeam { .. }
        )
    }

    /// Whether a material is meaningful for this family
    pub fn needs_material(&self) -> bool {
        !matches!(self, Shape::Spring { .. } | Shape::Mass { .. })
    }

    /// Closed-form geometric properties.
    pub fn properties(&self) -> SectionProperties {
        match *self {
            Shape::Angle { b, h, t } => {
                let p = 2.0 * (b + h - t);
                let xc = (b.powi(2) + h * t - t.powi(2)) / p;
                let yc = (h.powi(2) + b * t - t.powi(2)) / p;
                let a = t * (b + h - t);
                let ixx = (b * h.powi(3) - (b - t) * (h - t).powi(3)) / 3.0 - a * (h - yc).powi(2);
                let iyy = (h * b.powi(3) - (h - t) * (b - t).powi(3)) / 3.0 - a * (b - xc).powi(2);
                let j = (h + b - t) * t.powi(3) / 3.0;
                SectionProperties {
                    ixy: None,
                    ..SectionProperties::beam(a, ixx, iyy, Some(j))
                }
            }
            Shape::Box { b, h, tw, tf } => {
                let a = b * h - (b - 2.0 * tw) * (h - 2.0 * tf);
                let ap = (h - tf) * (b - tw);
                let ixx = b * h.powi(3) / 12.0 - (b - 2.0 * tw) * (h - 2.0 * tf).powi(3) / 12.0;
                let iyy = h * b.powi(3) / 12.0 - (h - 2.0 * tf) * (b - 2.0 * tw).powi(3) / 12.0;
                let p = 2.0 * ((h - tf) / tw + (b - tw) / tf);
                SectionProperties::beam(a, ixx, iyy, Some(4.0 * ap.powi(2) / p))
            }
            Shape::Circular { r } => {
                let d = 2.0 * r;
                let i = PI * d.powi(4) / 64.0;
                SectionProperties::beam(PI * d.powi(2) / 4.0, i, i, Some(PI * d.powi(4) / 32.0))
            }
            Shape::I { b, h, tw, tf } => {
                let a = 2.0 * b * tf + (h - 2.0 * tf) * tw;
                let ixx = tw * (h - 2.0 * tf).powi(3) / 12.0
                    + 2.0 * (tf.powi(3) * b / 12.0 + b * tf * (h / 2.0 - tf / 2.0).powi(2));
                let iyy = (h - 2.0 * tf) * tw.powi(3) / 12.0 + 2.0 * (b.powi(3) * tf / 12.0);
                let j = (2.0 * b * tf.powi(3) + (h - tf) * tw.powi(3)) / 3.0;
                SectionProperties::beam(a, ixx, iyy, Some(j))
            }
            Shape::Pipe { r, t } => {
                let d = 2.0 * r;
                let a = PI / 4.0 * (d.powi(2) - (d - 2.0 * t).powi(2));
                let i = PI / 4.0 * (r.powi(4) - (r - t).powi(4));
                let j = 2.0 / 3.0 * PI * (r + 0.5 * t) * t.powi(3);
                SectionProperties::beam(a, i, i, Some(j))
            }
            Shape::Rectangular { b, h } => {
                let l1 = b.max(h);
                let l2 = b.min(h);
                let j = l1 * l2.powi(3) * (0.33333 - 0.21 * (l2 / l1) * (1.0 - l2.powi(4) / (12.0 * l1.powi(4))));
                SectionProperties::beam(b * h, b * h.powi(3) / 12.0, h * b.powi(3) / 12.0, Some(j))
            }
            Shape::Trapezoidal { b1, b2, h } => {
                let a = (b1 + b2) * h / 2.0;
                let ixx = (3.0 * b2 + b1) * h.powi(3) / 12.0;
                let iyy = h * (b1 + b2) * (b2.powi(2) + 7.0 * b1.powi(2)) / 48.0;
                SectionProperties::beam(a, ixx, iyy, None)
            }
            Shape::GeneralBeam { properties } => properties,
            Shape::Truss { a } | Shape::Strut { a } | Shape::Tie { a } => SectionProperties::axial(a),
            Shape::Shell { .. }
            | Shape::Membrane { .. }
            | Shape::Solid
            | Shape::Spring { .. }
            | Shape::Mass { .. } => SectionProperties::default(),
        }
    }

    /// Centroid height of a trapezoid measured from the `b1` side
    pub fn trapezoid_centroid(b1: f64, b2: f64, h: f64) -> f64 {
        h * (2.0 * b2 + b1) / (3.0 * (b1 + b2))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    pub shape: Shape,
    pub material: Option<MaterialRef>,
    pub properties: SectionProperties,
}

impl Section {
    pub fn new(name: impl Into<String>, shape: Shape, material: impl Into<MaterialRef>) -> Self {
        let properties = shape.properties();
        Section {
            name: name.into(),
            shape,
            material: Some(material.into()),
            properties,
        }
    }

    /// Sections that carry no material (springs, point masses)
    pub fn without_material(name: impl Into<String>, shape: Shape) -> Self {
        let properties = shape.properties();
        Section {
            name: name.into(),
            shape,
            material: None,
            properties,
        }
    }

    pub fn angle(name: impl Into<String>, b: f64, h: f64, t: f64, material: impl Into<MaterialRef>) -> Self {
        Section::new(name, Shape::Angle { b, h, t }, material)
    }

    pub fn box_section(name: impl Into<String>, b: f64, h: f64, tw: f64, tf: f64, material: impl Into<MaterialRef>) -> Self {
        Section::new(name, Shape::Box { b, h, tw, tf }, material)
    }

    pub fn circular(name: impl Into<String>, r: f64, material: impl Into<MaterialRef>) -> Self {
        Section::new(name, Shape::Circular { r }, material)
    }

    pub fn i_section(name: impl Into<String>, b: f64, h: f64, tw: f64, tf: f64, material: impl Into<MaterialRef>) -> Self {
        Section::new(name, Shape::I { b, h, tw, tf }, material)
    }

    pub fn pipe(name: impl Into<String>, r: f64, t: f64, material: impl Into<MaterialRef>) -> Self {
        Section::new(name, Shape::Pipe { r, t }, material)
    }

    pub fn rectangular(name: impl Into<String>, b: f64, h: f64, material: impl Into<MaterialRef>) -> Self {
        Section::new(name, Shape::Rectangular { b, h }, material)
    }

    pub fn trapezoidal(name: impl Into<String>, b1: f64, b2: f64, h: f64, material: impl Into<MaterialRef>) -> Self {
        Section::new(name, Shape::Trapezoidal { b1, b2, h }, material)
    }

    pub fn general_beam(name: impl Into<String>, properties: SectionProperties, material: impl Into<MaterialRef>) -> Self {
        Section::new(name, Shape::GeneralBeam { properties }, material)
    }

    pub fn truss(name: impl Into<String>, a: f64, material: impl Into<MaterialRef>) -> Self {
        Section::new(name, Shape::Truss { a }, material)
    }

    pub fn shell(name: impl Into<String>, t: f64, material: impl Into<MaterialRef>) -> Self {
        Section::new(name, Shape::Shell { t }, material)
    }

    pub fn membrane(name: impl Into<String>, t: f64, material: impl Into<MaterialRef>) -> Self {
        Section::new(name, Shape::Membrane { t }, material)
    }

    pub fn solid(name: impl Into<String>, material: impl Into<MaterialRef>) -> Self {
        Section::new(name, Shape::Solid, material)
    }

    pub fn spring(name: impl Into<String>, stiffness: f64) -> Self {
        Section::without_material(name, Shape::Spring { stiffness })
    }

    pub fn mass(name: impl Into<String>, mass: f64) -> Self {
        Section::without_material(name, Shape::Mass { mass })
    }

    pub fn material_name(&self) -> Option<&str> {
        self.material.as_ref().map(|m| m.name())
    }
}

impl Named for Section {
    const KIND: &'static str = "section";
    fn name(&self) -> &str {
        &self.name
    }
}

/// How an element names its section.
///
/// A `Definition` is registered with the part (cascading to its material)
/// when the element is added, and is stored as a `Name` from then on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SectionRef {
    Name(String),
    Definition(Box<Section>),
}

impl SectionRef {
    pub fn name(&self) -> &str {
        match self {
            SectionRef::Name(name) => name,
            SectionRef::Definition(section) => &section.name,
        }
    }
}

impl From<Section> for SectionRef {
    fn from(section: Section) -> Self {
        SectionRef::Definition(Box::new(section))
    }
}

impl From<&str> for SectionRef {
    fn from(name: &str) -> Self {
        SectionRef::Name(name.to_string())
    }
}

impl From<String> for SectionRef {
    fn from(name: String) -> Self {
        SectionRef::Name(name)
    }
}
