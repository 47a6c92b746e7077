//! # Model
//!
//! The `Model` is the root of the structural graph: it owns the parts, the
//! instances placing them in the assembly, and the assembly-level
//! constraints, surfaces and contact definitions.
//!
//! ## Structure
//!
//! ```text
//! Model
//! ├── meta: ModelMetadata (name, author, uuid, timestamps)
//! ├── settings: ModelSettings (precision, tolerance, overlap)
//! ├── parts: Registry<Part>
//! │   └── nodes / elements / materials / sections / groups
//! ├── instances: Registry<Instance> (one "<part>-1" per part, plus extras)
//! │   └── groups: node/element sets addressed by name
//! ├── constraints, surfaces, interaction properties, contacts
//! ```
//!
//! ## Example
//!
//! ```rust
//! use fea_core::model::{Model, Node};
//! use fea_core::registry::AddOutcome;
//!
//! let mut model = Model::new("portal");
//! let mut part = model.new_part("frame");
//! part.add_node(Node::new([0.0, 0.0, 0.0]));
//!
//! assert_eq!(model.add_part(part.clone()), AddOutcome::Added);
//! assert_eq!(model.add_part(part), AddOutcome::Duplicate);
//! assert!(model.instance("frame-1").is_some());
//! ```

pub mod assembly;
pub mod element;
pub mod group;
pub mod material;
pub mod node;
pub mod part;
pub mod section;

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{FeaError, FeaResult};
use crate::registry::{AddOutcome, Named, Registry};
use crate::settings::ModelSettings;

pub use assembly::{ConstraintKind, Constraint, ContactPair, Instance, InteractionProperty, Surface, SurfaceFace};
pub use element::{Element, ElementKind, Face, Frame};
pub use group::{Group, GroupKind};
pub use material::{Behavior, Material, MaterialRef};
pub use node::Node;
pub use part::{Inserted, Part};
pub use section::{Section, SectionProperties, SectionRef, Shape};

/// Descriptive metadata of a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub name: String,
    pub description: String,
    pub author: String,
    pub id: Uuid,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub meta: ModelMetadata,
    pub settings: ModelSettings,
    parts: Registry<Part>,
    instances: Registry<Instance>,
    constraints: Registry<Constraint>,
    surfaces: Registry<Surface>,
    interaction_properties: Registry<InteractionProperty>,
    contacts: Registry<ContactPair>,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Model {
            meta: ModelMetadata {
                name: name.into(),
                description: String::new(),
                author: String::new(),
                id: Uuid::new_v4(),
                created: Utc::now(),
            },
            settings: ModelSettings::default(),
            parts: Registry::new(),
            instances: Registry::new(),
            constraints: Registry::new(),
            surfaces: Registry::new(),
            interaction_properties: Registry::new(),
            contacts: Registry::new(),
        }
    }

    pub fn with_settings(mut self, settings: ModelSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.meta.description = description.into();
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.meta.author = author.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    // ------------------------------------------------------------------------
    // Parts and instances
    // ------------------------------------------------------------------------

    /// An unregistered part configured from the model settings.
    pub fn new_part(&self, name: impl Into<String>) -> Part {
        Part::new(name)
            .with_precision(self.settings.precision)
            .with_duplicate_check(!self.settings.point_overlap)
    }

    /// Register a part and its default instance `<part>-1`.
    ///
    /// A part name that is already taken is a no-op. When `<part>-1` already
    /// names another instance the first free `<part>-N` is used instead.
    pub fn add_part(&mut self, part: Part) -> AddOutcome {
        let name = part.name.clone();
        let outcome = self.parts.insert(part);
        if outcome.is_added() {
            let instance = self.free_instance_name(&name);
            if instance != Instance::default_name(&name) {
                tracing::debug!(part = %name, instance = %instance, "default instance name taken");
            }
            self.instances.insert(Instance::new(instance, name));
        }
        outcome
    }

    fn free_instance_name(&self, part: &str) -> String {
        let mut candidate = Instance::default_name(part);
        let mut n = 1;
        while self.instances.contains(&candidate) {
            n += 1;
            candidate = format!("{}-{}", part, n);
        }
        candidate
    }

    pub fn part(&self, name: &str) -> Option<&Part> {
        self.parts.get(name)
    }

    /// Node of a registered part at `xyz`, matched within the model's
    /// global tolerance.
    ///
    /// See [`Part::get_node_from_coordinates`].
    pub fn node_at(&self, part: &str, xyz: [f64; 3]) -> Option<&Node> {
        self.parts
            .get(part)?
            .get_node_from_coordinates(xyz, self.settings.global_tolerance)
    }

    pub fn part_mut(&mut self, name: &str) -> Option<&mut Part> {
        self.parts.get_mut(name)
    }

    pub fn parts(&self) -> &Registry<Part> {
        &self.parts
    }

    /// Place a registered part again under a new instance name.
    pub fn add_instance(&mut self, name: impl Into<String>, part: &str) -> FeaResult<AddOutcome> {
        if !self.parts.contains(part) {
            return Err(FeaError::registration(Part::KIND, part, self.container()));
        }
        Ok(self.instances.insert(Instance::new(name, part)))
    }

    /// Drop a placement; its part stays registered.
    pub fn remove_instance(&mut self, name: &str) -> Option<Instance> {
        self.instances.remove(name)
    }

    pub fn instance(&self, name: &str) -> Option<&Instance> {
        self.instances.get(name)
    }

    pub fn instances(&self) -> &Registry<Instance> {
        &self.instances
    }

    /// Part placed by an instance
    pub fn instance_part(&self, instance: &str) -> FeaResult<&Part> {
        let inst = self
            .instances
            .get(instance)
            .ok_or_else(|| FeaError::registration(Instance::KIND, instance, self.container()))?;
        self.parts
            .get(&inst.part)
            .ok_or_else(|| FeaError::registration(Part::KIND, inst.part.as_str(), self.container()))
    }

    /// Number of instances placing `part`
    pub fn placements(&self, part: &str) -> usize {
        self.instances.iter().filter(|i| i.part == part).count()
    }

    /// Move an element between two registered parts.
    ///
    /// See [`Part::transfer_element`].
    pub fn move_element(&mut self, from: &str, key: usize, to: &str) -> FeaResult<usize> {
        for name in [from, to] {
            if !self.parts.contains(name) {
                return Err(FeaError::registration(Part::KIND, name, self.container()));
            }
        }
        let container = self.container();
        let (source, target) = self
            .parts
            .get_pair_mut(from, to)
            .ok_or_else(|| FeaError::invalid_input("to", to, format!("Cannot move an element within {}", container)))?;
        source.transfer_element(key, target)
    }

    // ------------------------------------------------------------------------
    // Sets
    // ------------------------------------------------------------------------

    /// Register a node or element set on an instance.
    ///
    /// Set names are unique across the whole assembly; a taken name is a
    /// logged no-op.
    pub fn add_group(&mut self, instance: &str, group: Group) -> FeaResult<AddOutcome> {
        let part = self.instance_part(instance)?;
        for &key in group.keys() {
            let exists = match group.kind {
                GroupKind::Nodes => part.check_node_in_part(key),
                GroupKind::Elements => part.element(key).is_some(),
            };
            if !exists {
                let kind = match group.kind {
                    GroupKind::Nodes => "node",
                    GroupKind::Elements => "element",
                };
                return Err(FeaError::registration(kind, key.to_string(), format!("part '{}'", part.name)));
            }
        }

        if self.find_set(&group.name).is_some() {
            tracing::warn!(set = %group.name, "duplicate set '{}' skipped", group.name);
            return Ok(AddOutcome::Duplicate);
        }

        let container = self.container();
        let inst = self
            .instances
            .get_mut(instance)
            .ok_or_else(|| FeaError::registration(Instance::KIND, instance, container))?;
        Ok(inst.groups.insert(group))
    }

    pub fn add_nodes_group(
        &mut self,
        instance: &str,
        name: impl Into<String>,
        keys: impl IntoIterator<Item = usize>,
    ) -> FeaResult<AddOutcome> {
        self.add_group(instance, Group::nodes(name, keys))
    }

    pub fn add_elements_group(
        &mut self,
        instance: &str,
        name: impl Into<String>,
        keys: impl IntoIterator<Item = usize>,
    ) -> FeaResult<AddOutcome> {
        self.add_group(instance, Group::elements(name, keys))
    }

    /// Sets addressable through an instance: its own groups, then the
    /// groups of its part when that part is placed by this instance only.
    pub fn instance_sets<'m>(&'m self, instance: &'m Instance) -> Vec<&'m Group> {
        let mut sets: Vec<&Group> = instance.groups.iter().collect();
        if self.placements(&instance.part) == 1 {
            if let Some(part) = self.parts.get(&instance.part) {
                sets.extend(part.groups().iter());
            }
        }
        sets
    }

    /// Every addressable set with the instance it lives on, in instance order
    pub fn sets(&self) -> Vec<(&Instance, &Group)> {
        self.instances
            .iter()
            .flat_map(|inst| self.instance_sets(inst).into_iter().map(move |group| (inst, group)))
            .collect()
    }

    /// Instance owning a set, and the set itself
    pub fn find_set(&self, name: &str) -> Option<(&Instance, &Group)> {
        self.sets().into_iter().find(|(_, group)| group.name == name)
    }

    /// Like [`Model::find_set`], requiring the set to hold `kind` keys.
    pub fn resolve_set(&self, name: &str, kind: GroupKind) -> FeaResult<(&Instance, &Group)> {
        match self.find_set(name) {
            Some((inst, group)) if group.kind == kind => Ok((inst, group)),
            Some(_) => Err(FeaError::registration(format!("{} set", kind), name, self.container())),
            None => match self.parts.iter().find(|part| part.group(name).is_some()) {
                Some(part) => Err(FeaError::invalid_input(
                    "set",
                    name,
                    format!(
                        "Part '{}' is placed by {} instances; define the set on one of them",
                        part.name,
                        self.placements(&part.name)
                    ),
                )),
                None => Err(FeaError::registration(format!("{} set", kind), name, self.container())),
            },
        }
    }

    // ------------------------------------------------------------------------
    // Constraints and contact
    // ------------------------------------------------------------------------

    pub fn add_constraint(&mut self, constraint: Constraint) -> FeaResult<AddOutcome> {
        self.resolve_set(&constraint.master, GroupKind::Nodes)?;
        self.resolve_set(&constraint.slave, GroupKind::Nodes)?;
        Ok(self.constraints.insert(constraint))
    }

    pub fn constraints(&self) -> &Registry<Constraint> {
        &self.constraints
    }

    /// Register a surface after checking every face exists.
    pub fn add_surface(&mut self, surface: Surface) -> FeaResult<AddOutcome> {
        let part = self.instance_part(&surface.instance)?;
        for face in &surface.faces {
            let element = part.element(face.element).ok_or_else(|| {
                FeaError::registration("element", face.element.to_string(), format!("part '{}'", part.name))
            })?;
            if !element.has_face(&face.face) {
                return Err(FeaError::invalid_input(
                    "face",
                    face.face.as_str(),
                    format!("Element {} of part '{}' has no such face", element.name, part.name),
                ));
            }
        }
        Ok(self.surfaces.insert(surface))
    }

    pub fn surface(&self, name: &str) -> Option<&Surface> {
        self.surfaces.get(name)
    }

    pub fn surfaces(&self) -> &Registry<Surface> {
        &self.surfaces
    }

    pub fn add_interaction_property(&mut self, property: InteractionProperty) -> AddOutcome {
        self.interaction_properties.insert(property)
    }

    pub fn interaction_properties(&self) -> &Registry<InteractionProperty> {
        &self.interaction_properties
    }

    pub fn add_contact(&mut self, contact: ContactPair) -> FeaResult<AddOutcome> {
        if !self.interaction_properties.contains(&contact.interaction) {
            return Err(FeaError::registration(
                InteractionProperty::KIND,
                contact.interaction.as_str(),
                self.container(),
            ));
        }
        for surface in [&contact.master, &contact.slave] {
            if !self.surfaces.contains(surface) {
                return Err(FeaError::registration(Surface::KIND, surface.as_str(), self.container()));
            }
        }
        Ok(self.contacts.insert(contact))
    }

    pub fn contacts(&self) -> &Registry<ContactPair> {
        &self.contacts
    }

    // ------------------------------------------------------------------------
    // Derived registries
    // ------------------------------------------------------------------------

    /// Materials of all parts, first definition of each name wins
    pub fn materials(&self) -> Vec<&Material> {
        let mut seen = HashSet::new();
        self.parts
            .iter()
            .flat_map(|part| part.materials().iter())
            .filter(|m| seen.insert(m.name.as_str()))
            .collect()
    }

    /// Sections of all parts, first definition of each name wins
    pub fn sections(&self) -> Vec<&Section> {
        let mut seen = HashSet::new();
        self.parts
            .iter()
            .flat_map(|part| part.sections().iter())
            .filter(|s| seen.insert(s.name.as_str()))
            .collect()
    }

    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("Model '{}' ({})", self.meta.name, self.meta.id),
            format!(
                "  {} parts, {} instances, {} materials, {} sections",
                self.parts.len(),
                self.instances.len(),
                self.materials().len(),
                self.sections().len()
            ),
        ];
        for part in &self.parts {
            lines.push(format!("  {}", part.summary()));
        }
        for inst in &self.instances {
            let sets: Vec<&str> = self.instance_sets(inst).iter().map(|g| g.name.as_str()).collect();
            lines.push(format!("  Instance '{}' of '{}': sets [{}]", inst.name, inst.part, sets.join(", ")));
        }
        lines.push(format!(
            "  {} constraints, {} surfaces, {} contacts",
            self.constraints.len(),
            self.surfaces.len(),
            self.contacts.len()
        ));
        lines.join("\n")
    }

    fn container(&self) -> String {
        format!("model '{}'", self.meta.name)
    }
}
