//! # Parts
//!
//! A part owns dense, index-addressed storage for its nodes and elements,
//! plus the materials, sections and groups they reference. Every key and
//! default name is assigned here; nothing else in the crate mutates a part's
//! arenas.
//!
//! ## Registration rules
//!
//! - node and element keys are dense from zero, in insertion order
//! - [`Part::add_element`] checks connectivity and resolves the section
//!   before touching any storage, so a rejected element leaves the part as
//!   it was
//! - registering a section registers its material; re-registering a name is
//!   a logged no-op
//!
//! ## Example
//!
//! ```rust
//! use fea_core::model::{Element, ElementKind, Material, Node, Part, Section};
//!
//! let mut part = Part::new("frame");
//! let a = part.add_node(Node::new([0.0, 0.0, 0.0])).key;
//! let b = part.add_node(Node::new([0.0, 0.0, 3.0])).key;
//!
//! let steel = Material::elastic_isotropic("steel", 210e9, 0.3, 7850.0);
//! let column = Section::i_section("ipe300", 0.15, 0.3, 0.0071, 0.0107, steel);
//! let key = part.add_element(Element::new(ElementKind::Beam, vec![a, b], column)?)?;
//!
//! assert_eq!(key, 0);
//! assert_eq!(part.materials().len(), 1);
//! assert_eq!(part.element(0).unwrap().name, "e-0");
//!
//! // Node 7 does not exist: the part is left unchanged
//! let bad = Element::new(ElementKind::Beam, vec![a, 7], "ipe300")?;
//! assert!(part.add_element(bad).is_err());
//! assert_eq!(part.element_count(), 1);
//! # Ok::<(), fea_core::errors::FeaError>(())
//! ```

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::errors::{FeaError, FeaResult};
use crate::model::element::Element;
use crate::model::group::{Group, GroupKind};
use crate::model::material::{Material, MaterialRef};
use crate::model::node::Node;
use crate::model::section::{Section, SectionRef};
use crate::registry::{AddOutcome, Named, Registry};

/// Key of a node insertion and whether the node was stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inserted {
    /// Key of the stored node, or of the existing node it duplicated
    pub key: usize,
    pub outcome: AddOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub name: String,
    nodes: Vec<Node>,
    elements: BTreeMap<usize, Element>,
    materials: Registry<Material>,
    sections: Registry<Section>,
    groups: Registry<Group>,
    /// Decimals used for geometric node keys
    precision: usize,
    /// Run duplicate-node detection on every `add_node`
    check_duplicates: bool,
}

impl Part {
    pub fn new(name: impl Into<String>) -> Self {
        Part {
            name: name.into(),
            nodes: Vec::new(),
            elements: BTreeMap::new(),
            materials: Registry::new(),
            sections: Registry::new(),
            groups: Registry::new(),
            precision: 3,
            check_duplicates: false,
        }
    }

    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_duplicate_check(mut self, check: bool) -> Self {
        self.check_duplicates = check;
        self
    }

    pub fn precision(&self) -> usize {
        self.precision
    }

    fn container(&self) -> String {
        format!("part '{}'", self.name)
    }

    // ------------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------------

    /// Register a node, with duplicate detection if the part enables it.
    pub fn add_node(&mut self, node: Node) -> Inserted {
        let check = self.check_duplicates;
        self.add_node_checked(node, check)
    }

    /// Register a node.
    ///
    /// With `check_duplicates`, a node whose geometric key matches an existing
    /// node is skipped with a warning and the existing key is returned.
    /// Element connectivity is never re-pointed.
    pub fn add_node_checked(&mut self, mut node: Node, check_duplicates: bool) -> Inserted {
        if check_duplicates {
            let gkey = node.gkey(self.precision);
            if let Some(existing) = self.nodes.iter().find(|n| n.gkey(self.precision) == gkey) {
                tracing::warn!(part = %self.name, gkey = %gkey, existing = existing.key, "duplicate node skipped");
                return Inserted {
                    key: existing.key,
                    outcome: AddOutcome::Duplicate,
                };
            }
        }

        let key = self.nodes.len();
        node.key = key;
        if node.name.is_empty() {
            node.name = format!("n-{}", key);
        }
        self.nodes.push(node);
        Inserted {
            key,
            outcome: AddOutcome::Added,
        }
    }

    pub fn add_nodes(&mut self, nodes: impl IntoIterator<Item = Node>) -> Vec<Inserted> {
        nodes.into_iter().map(|node| self.add_node(node)).collect()
    }

    pub fn node(&self, key: usize) -> Option<&Node> {
        self.nodes.get(key)
    }

    pub fn node_mut(&mut self, key: usize) -> Option<&mut Node> {
        self.nodes.get_mut(key)
    }

    /// Nodes in key order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn check_node_in_part(&self, key: usize) -> bool {
        key < self.nodes.len()
    }

    /// Node with the given geometric key
    pub fn find_node_by_gkey(&self, gkey: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.gkey(self.precision) == gkey)
    }

    /// First node whose coordinates round to the same multiples of `tol`.
    pub fn get_node_from_coordinates(&self, xyz: [f64; 3], tol: f64) -> Option<&Node> {
        if tol.is_nan() || tol <= 0.0 {
            return None;
        }
        let snap = |p: [f64; 3]| p.map(|c| (c / tol).round() as i64);
        let target = snap(xyz);
        self.nodes.iter().find(|n| snap(n.xyz) == target)
    }

    // ------------------------------------------------------------------------
    // Materials and sections
    // ------------------------------------------------------------------------

    pub fn add_material(&mut self, material: Material) -> AddOutcome {
        self.materials.insert(material)
    }

    /// Register a section, registering its material first when the section
    /// carries a definition.
    ///
    /// A section naming an unregistered material is a `Registration` error
    /// and nothing is stored.
    pub fn add_section(&mut self, mut section: Section) -> FeaResult<AddOutcome> {
        if self.sections.contains(&section.name) {
            return Ok(self.sections.insert(section));
        }

        match section.material.take() {
            Some(MaterialRef::Name(name)) => {
                if !self.materials.contains(&name) {
                    return Err(FeaError::registration(Material::KIND, name, self.container()));
                }
                section.material = Some(MaterialRef::Name(name));
            }
            Some(MaterialRef::Definition(material)) => {
                let name = material.name.clone();
                self.add_material(*material);
                section.material = Some(MaterialRef::Name(name));
            }
            None if section.shape.needs_material() => {
                return Err(FeaError::invalid_input(
                    "material",
                    "none",
                    format!("{} section '{}' requires a material", section.shape.code(), section.name),
                ));
            }
            None => {}
        }

        Ok(self.sections.insert(section))
    }

    pub fn materials(&self) -> &Registry<Material> {
        &self.materials
    }

    pub fn sections(&self) -> &Registry<Section> {
        &self.sections
    }

    pub fn material(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    // ------------------------------------------------------------------------
    // Elements
    // ------------------------------------------------------------------------

    /// Register an element with connectivity validation.
    pub fn add_element(&mut self, element: Element) -> FeaResult<usize> {
        self.add_element_checked(element, true)
    }

    /// Register an element.
    ///
    /// Checks run before any mutation: a `Connectivity` error (with
    /// `check_connectivity`) or an unresolved section leaves the part
    /// untouched.
    pub fn add_element_checked(&mut self, mut element: Element, check_connectivity: bool) -> FeaResult<usize> {
        let key = self.elements.len();
        if element.name.is_empty() {
            element.name = format!("e-{}", key);
        }

        if check_connectivity {
            if let Some(&missing) = element.nodes.iter().find(|&&k| !self.check_node_in_part(k)) {
                return Err(FeaError::connectivity(element.name, missing, &self.name));
            }
        }

        let section_name = match element.section {
            SectionRef::Name(name) => {
                if !self.sections.contains(&name) {
                    return Err(FeaError::registration(Section::KIND, name, self.container()));
                }
                name
            }
            SectionRef::Definition(section) => {
                let name = section.name.clone();
                self.add_section(*section)?;
                name
            }
        };
        element.section = SectionRef::Name(section_name);

        element.key = key;
        self.elements.insert(key, element);
        Ok(key)
    }

    pub fn add_elements(&mut self, elements: impl IntoIterator<Item = Element>) -> FeaResult<Vec<usize>> {
        elements.into_iter().map(|e| self.add_element(e)).collect()
    }

    pub fn element(&self, key: usize) -> Option<&Element> {
        self.elements.get(&key)
    }

    /// Elements in key order
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Remove an element and close the gap in the key sequence.
    ///
    /// Later elements shift down by one; default names follow their key and
    /// element groups are remapped. Nodes are left in place.
    pub fn remove_element(&mut self, key: usize) -> Option<Element> {
        let removed = self.elements.remove(&key)?;

        let shifted: Vec<usize> = self.elements.range(key + 1..).map(|(k, _)| *k).collect();
        for old in shifted {
            if let Some(mut element) = self.elements.remove(&old) {
                if element.name == format!("e-{}", old) {
                    element.name = format!("e-{}", old - 1);
                }
                element.key = old - 1;
                self.elements.insert(old - 1, element);
            }
        }

        let remap = |k: usize| match k {
            k if k == key => None,
            k if k > key => Some(k - 1),
            k => Some(k),
        };
        let names: Vec<String> = self.groups.names().map(str::to_string).collect();
        for name in names {
            if let Some(group) = self.groups.get_mut(&name) {
                if group.kind == GroupKind::Elements {
                    group.remap(remap);
                }
            }
        }

        Some(removed)
    }

    /// Move an element into `target`.
    ///
    /// The element, every node it references (shared nodes once), and its
    /// section and material are copied into `target`; the element is then
    /// removed from this part. Returns the element's key in `target`.
    /// Source nodes that no other element uses stay behind.
    pub fn transfer_element(&mut self, key: usize, target: &mut Part) -> FeaResult<usize> {
        let element = self
            .element(key)
            .ok_or_else(|| FeaError::registration("element", key.to_string(), self.container()))?;

        let mut section = self
            .section(element.section_name())
            .cloned()
            .ok_or_else(|| FeaError::registration(Section::KIND, element.section_name(), self.container()))?;
        if let Some(material_name) = section.material_name().map(str::to_string) {
            let material = self
                .material(&material_name)
                .cloned()
                .ok_or_else(|| FeaError::registration(Material::KIND, material_name.clone(), self.container()))?;
            section.material = Some(material.into());
        }

        let mut copied = Vec::with_capacity(element.nodes.len());
        for &node_key in &element.nodes {
            let node = self
                .node(node_key)
                .ok_or_else(|| FeaError::connectivity(element.name.clone(), node_key, &self.name))?;
            copied.push(node.clone());
        }

        let mut moved = element.clone();
        moved.key = 0;
        moved.name = String::new();
        moved.section = section.into();

        let mut mapping: HashMap<usize, usize> = HashMap::new();
        let mut new_nodes = Vec::with_capacity(moved.nodes.len());
        for (old_key, mut node) in element.nodes.clone().into_iter().zip(copied) {
            let new_key = match mapping.get(&old_key) {
                Some(&k) => k,
                None => {
                    node.name = String::new();
                    let k = target.add_node_checked(node, false).key;
                    mapping.insert(old_key, k);
                    k
                }
            };
            new_nodes.push(new_key);
        }
        moved.nodes = new_nodes;

        let new_key = target.add_element(moved)?;
        self.remove_element(key);
        Ok(new_key)
    }

    // ------------------------------------------------------------------------
    // Groups
    // ------------------------------------------------------------------------

    /// Register a group after checking that all of its keys exist.
    pub fn add_group(&mut self, group: Group) -> FeaResult<AddOutcome> {
        let kind = match group.kind {
            GroupKind::Nodes => "node",
            GroupKind::Elements => "element",
        };
        for &key in group.keys() {
            let exists = match group.kind {
                GroupKind::Nodes => self.check_node_in_part(key),
                GroupKind::Elements => self.elements.contains_key(&key),
            };
            if !exists {
                return Err(FeaError::registration(kind, key.to_string(), self.container()));
            }
        }
        Ok(self.groups.insert(group))
    }

    pub fn add_nodes_group(&mut self, name: impl Into<String>, keys: impl IntoIterator<Item = usize>) -> FeaResult<AddOutcome> {
        self.add_group(Group::nodes(name, keys))
    }

    pub fn add_elements_group(&mut self, name: impl Into<String>, keys: impl IntoIterator<Item = usize>) -> FeaResult<AddOutcome> {
        self.add_group(Group::elements(name, keys))
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    pub fn groups(&self) -> &Registry<Group> {
        &self.groups
    }

    pub fn summary(&self) -> String {
        format!(
            "Part '{}': {} nodes, {} elements, {} materials, {} sections, {} groups",
            self.name,
            self.nodes.len(),
            self.elements.len(),
            self.materials.len(),
            self.sections.len(),
            self.groups.len()
        )
    }
}

impl Named for Part {
    const KIND: &'static str = "part";
    fn name(&self) -> &str {
        &self.name
    }
}
