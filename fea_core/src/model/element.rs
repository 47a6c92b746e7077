//! # Elements
//!
//! An element is an ordered list of node keys (indices into its part's node
//! arena) plus a section reference. Node order is significant: it fixes the
//! local orientation and, for solids, the face decomposition.
//!
//! ## Solid faces
//!
//! Faces are derived from a fixed template per topology:
//!
//! ```text
//! tetra (4):  s1(0,1,2) s2(0,1,3) s3(1,2,3) s4(0,2,3)
//! hexa  (8):  s1(0,1,2,3) s2(4,5,6,7) s3(0,1,4,5)
//!             s4(1,2,5,6) s5(2,3,6,7) s6(0,3,4,7)
//! ```
//!
//! Quadratic solids (10, 15, 20 nodes) reuse the template of their corner
//! nodes.
//!
//! ## Example
//!
//! ```rust
//! use fea_core::model::{Element, ElementKind};
//!
//! let tet = Element::new(ElementKind::Solid, vec![0, 1, 2, 3], "solid").unwrap();
//! let faces = tet.faces();
//! assert_eq!(faces.len(), 4);
//! assert_eq!(faces[2].tag, "s3");
//! assert_eq!(faces[2].nodes, vec![1, 2, 3]);
//!
//! assert!(Element::new(ElementKind::Beam, vec![0, 1, 2], "beam").is_err());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{FeaError, FeaResult};
use crate::model::section::SectionRef;

/// Beam orientation vector used when an element carries no frame
pub const DEFAULT_BEAM_ORIENTATION: [f64; 3] = [0.0, 0.0, -1.0];

// ============================================================================
// Element kinds
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Mass,
    Beam,
    Spring,
    Truss,
    Strut,
    Tie,
    Shell,
    Membrane,
    Solid,
}

impl ElementKind {
    pub const ALL: [ElementKind; 9] = [
        ElementKind::Mass,
        ElementKind::Beam,
        ElementKind::Spring,
        ElementKind::Truss,
        ElementKind::Strut,
        ElementKind::Tie,
        ElementKind::Shell,
        ElementKind::Membrane,
        ElementKind::Solid,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            ElementKind::Mass => "mass",
            ElementKind::Beam => "beam",
            ElementKind::Spring => "spring",
            ElementKind::Truss => "truss",
            ElementKind::Strut => "strut",
            ElementKind::Tie => "tie",
            ElementKind::Shell => "shell",
            ElementKind::Membrane => "membrane",
            ElementKind::Solid => "solid",
        }
    }

    /// Node counts a well-formed element of this kind may have
    pub fn allowed_node_counts(&self) -> &'static [usize] {
        match self {
            ElementKind::Mass => &[1],
            ElementKind::Beam | ElementKind::Spring => &[2],
            ElementKind::Truss | ElementKind::Strut | ElementKind::Tie => &[2, 3],
            ElementKind::Shell | ElementKind::Membrane => &[3, 4, 6, 8, 9],
            ElementKind::Solid => &[4, 5, 6, 8, 10, 15, 20],
        }
    }

    /// Axial-only members
    pub fn is_truss_like(&self) -> bool {
        matches!(self, ElementKind::Truss | ElementKind::Strut | ElementKind::Tie)
    }

    pub fn is_surface(&self) -> bool {
        matches!(self, ElementKind::Shell | ElementKind::Membrane)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Frame and faces
// ============================================================================

/// Local orientation frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub xaxis: [f64; 3],
    pub yaxis: [f64; 3],
}

impl Frame {
    pub fn new(xaxis: [f64; 3], yaxis: [f64; 3]) -> Self {
        Frame { xaxis, yaxis }
    }

    /// World XY frame
    pub fn global() -> Self {
        Frame::new([1.0, 0.0, 0.0], [0.0, 1.0, 0.0])
    }

    pub fn zaxis(&self) -> [f64; 3] {
        let [ax, ay, az] = self.xaxis;
        let [bx, by, bz] = self.yaxis;
        [ay * bz - az * by, az * bx - ax * bz, ax * by - ay * bx]
    }
}

impl Default for Frame {
    fn default() -> Self {
        Frame::global()
    }
}

/// One face of a solid element, addressed by its template tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Face {
    pub tag: String,
    /// Node keys in template order
    pub nodes: Vec<usize>,
}

type FaceTemplate = &'static [(&'static str, &'static [usize])];

const TETRA_FACES: FaceTemplate = &[
    ("s1", &[0, 1, 2]),
    ("s2", &[0, 1, 3]),
    ("s3", &[1, 2, 3]),
    ("s4", &[0, 2, 3]),
];

const PYRAMID_FACES: FaceTemplate = &[
    ("s1", &[0, 1, 2, 3]),
    ("s2", &[0, 1, 4]),
    ("s3", &[1, 2, 4]),
    ("s4", &[2, 3, 4]),
    ("s5", &[0, 3, 4]),
];

const WEDGE_FACES: FaceTemplate = &[
    ("s1", &[0, 1, 2]),
    ("s2", &[3, 4, 5]),
    ("s3", &[0, 1, 4, 3]),
    ("s4", &[1, 2, 5, 4]),
    ("s5", &[0, 2, 5, 3]),
];

const HEXA_FACES: FaceTemplate = &[
    ("s1", &[0, 1, 2, 3]),
    ("s2", &[4, 5, 6, 7]),
    ("s3", &[0, 1, 4, 5]),
    ("s4", &[1, 2, 5, 6]),
    ("s5", &[2, 3, 6, 7]),
    ("s6", &[0, 3, 4, 7]),
];

fn face_template(node_count: usize) -> Option<FaceTemplate> {
    match node_count {
        4 | 10 => Some(TETRA_FACES),
        5 => Some(PYRAMID_FACES),
        6 | 15 => Some(WEDGE_FACES),
        8 | 20 => Some(HEXA_FACES),
        _ => None,
    }
}

// ============================================================================
// Element
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Assigned on registration, dense per part
    pub key: usize,
    pub name: String,
    pub kind: ElementKind,
    /// Node keys within the owning part
    pub nodes: Vec<usize>,
    pub section: SectionRef,
    pub frame: Option<Frame>,
    /// Backend element type overriding the derived one (e.g. `C3D8I`)
    pub implementation: Option<String>,
    /// Reduced integration where the backend supports it
    pub reduced: bool,
}

impl Element {
    /// Build an unregistered element, checking the node count for `kind`.
    pub fn new(kind: ElementKind, nodes: Vec<usize>, section: impl Into<SectionRef>) -> FeaResult<Self> {
        if !kind.allowed_node_counts().contains(&nodes.len()) {
            return Err(FeaError::invalid_input(
                "nodes",
                nodes.len().to_string(),
                format!(
                    "A {} element takes {:?} nodes",
                    kind,
                    kind.allowed_node_counts()
                ),
            ));
        }
        Ok(Element {
            key: 0,
            name: String::new(),
            kind,
            nodes,
            section: section.into(),
            frame: None,
            implementation: None,
            reduced: false,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frame = Some(frame);
        self
    }

    pub fn with_implementation(mut self, implementation: impl Into<String>) -> Self {
        self.implementation = Some(implementation.into());
        self
    }

    pub fn with_reduced(mut self, reduced: bool) -> Self {
        self.reduced = reduced;
        self
    }

    /// Name of the referenced section
    pub fn section_name(&self) -> &str {
        self.section.name()
    }

    /// Beam orientation vector: the frame's y axis, or the default.
    pub fn orientation(&self) -> [f64; 3] {
        self.frame.map(|f| f.yaxis).unwrap_or(DEFAULT_BEAM_ORIENTATION)
    }

    /// Face decomposition; empty for non-solid elements.
    pub fn faces(&self) -> Vec<Face> {
        if self.kind != ElementKind::Solid {
            return Vec::new();
        }
        face_template(self.nodes.len())
            .map(|template| {
                template
                    .iter()
                    .map(|(tag, indices)| Face {
                        tag: tag.to_string(),
                        nodes: indices.iter().map(|&i| self.nodes[i]).collect(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has_face(&self, tag: &str) -> bool {
        self.faces().iter().any(|face| face.tag == tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_count_validation() {
        assert!(Element::new(ElementKind::Mass, vec![0], "m").is_ok());
        assert!(Element::new(ElementKind::Truss, vec![0, 1, 2], "t").is_ok());
        assert!(Element::new(ElementKind::Shell, vec![0, 1], "s").is_err());
        assert!(Element::new(ElementKind::Solid, vec![0, 1, 2, 3, 4, 5, 6], "c").is_err());
        let err = Element::new(ElementKind::Spring, vec![0, 1, 2], "k").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_hexa_faces_follow_template() {
        let hex = Element::new(ElementKind::Solid, vec![10, 11, 12, 13, 14, 15, 16, 17], "c").unwrap();
        let faces = hex.faces();
        assert_eq!(faces.len(), 6);
        assert_eq!(faces[0].nodes, vec![10, 11, 12, 13]);
        assert_eq!(faces[5].tag, "s6");
        assert_eq!(faces[5].nodes, vec![10, 13, 14, 17]);
    }

    #[test]
    fn test_quadratic_solid_reuses_corner_template() {
        let nodes: Vec<usize> = (0..10).collect();
        let tet10 = Element::new(ElementKind::Solid, nodes, "c").unwrap();
        assert_eq!(tet10.faces().len(), 4);
        assert!(tet10.has_face("s4"));
        assert!(!tet10.has_face("s5"));
    }

    #[test]
    fn test_non_solid_has_no_faces() {
        let shell = Element::new(ElementKind::Shell, vec![0, 1, 2, 3], "s").unwrap();
        assert!(shell.faces().is_empty());
    }

    #[test]
    fn test_orientation_defaults() {
        let beam = Element::new(ElementKind::Beam, vec![0, 1], "b").unwrap();
        assert_eq!(beam.orientation(), DEFAULT_BEAM_ORIENTATION);
        let beam = beam.with_frame(Frame::new([1.0, 0.0, 0.0], [0.0, 0.0, 1.0]));
        assert_eq!(beam.orientation(), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_frame_zaxis() {
        assert_eq!(Frame::global().zaxis(), [0.0, 0.0, 1.0]);
    }
}
