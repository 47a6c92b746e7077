//! Materials and material references.

use serde::{Deserialize, Serialize};

use crate::registry::Named;

/// Constitutive behaviour of a material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Behavior {
    ElasticIsotropic {
        e: f64,
        v: f64,
    },
    /// Elastic with a plastic `(stress, strain)` hardening table
    ElasticPlastic {
        e: f64,
        v: f64,
        table: Vec<[f64; 2]>,
    },
    /// Constants handed verbatim to a user subroutine
    User {
        constants: Vec<f64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub density: f64,
    pub behavior: Behavior,
}

impl Material {
    pub fn elastic_isotropic(name: impl Into<String>, e: f64, v: f64, density: f64) -> Self {
        Material {
            name: name.into(),
            density,
            behavior: Behavior::ElasticIsotropic { e, v },
        }
    }

    pub fn elastic_plastic(name: impl Into<String>, e: f64, v: f64, density: f64, table: Vec<[f64; 2]>) -> Self {
        Material {
            name: name.into(),
            density,
            behavior: Behavior::ElasticPlastic { e, v, table },
        }
    }

    pub fn user(name: impl Into<String>, constants: Vec<f64>, density: f64) -> Self {
        Material {
            name: name.into(),
            density,
            behavior: Behavior::User { constants },
        }
    }

    /// Young's modulus, if the behaviour defines one
    pub fn e(&self) -> Option<f64> {
        match &self.behavior {
            Behavior::ElasticIsotropic { e, .. } | Behavior::ElasticPlastic { e, .. } => Some(*e),
            Behavior::User { .. } => None,
        }
    }

    /// Poisson ratio, if the behaviour defines one
    pub fn v(&self) -> Option<f64> {
        match &self.behavior {
            Behavior::ElasticIsotropic { v, .. } | Behavior::ElasticPlastic { v, .. } => Some(*v),
            Behavior::User { .. } => None,
        }
    }

    /// Shear modulus `E / (2(1 + v))`
    pub fn shear_modulus(&self) -> Option<f64> {
        Some(self.e()? / (2.0 * (1.0 + self.v()?)))
    }
}

impl Named for Material {
    const KIND: &'static str = "material";
    fn name(&self) -> &str {
        &self.name
    }
}

/// How a section names its material: by a registered name, or by a full
/// definition that is registered along with the section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MaterialRef {
    Name(String),
    Definition(Box<Material>),
}

impl MaterialRef {
    pub fn name(&self) -> &str {
        match self {
            MaterialRef::Name(name) => name,
            MaterialRef::Definition(material) => &material.name,
        }
    }
}

impl From<Material> for MaterialRef {
    fn from(material: Material) -> Self {
        MaterialRef::Definition(Box::new(material))
    }
}

impl From<&str> for MaterialRef {
    fn from(name: &str) -> Self {
        MaterialRef::Name(name.to_string())
    }
}

impl From<String> for MaterialRef {
    fn from(name: String) -> Self {
        MaterialRef::Name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_shear_modulus() {
        let steel = Material::elastic_isotropic("steel", 200e9, 0.25, 7850.0);
        assert_relative_eq!(steel.shear_modulus().unwrap(), 80e9);
    }

    #[test]
    fn test_user_material_has_no_elastic_constants() {
        let umat = Material::user("umat", vec![1.0, 2.0], 2400.0);
        assert!(umat.e().is_none());
        assert!(umat.shear_modulus().is_none());
    }

    #[test]
    fn test_material_ref_names() {
        let by_def: MaterialRef = Material::elastic_isotropic("c30", 33e9, 0.2, 2400.0).into();
        assert_eq!(by_def.name(), "c30");
        assert_eq!(MaterialRef::from("c30").name(), "c30");
    }
}
