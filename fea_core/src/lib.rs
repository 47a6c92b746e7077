//! # fea_core - Structural Finite Element Model Graph
//!
//! `fea_core` describes a structural analysis as plain, serializable data
//! and turns it into input documents for external solvers.
//!
//! ## Layers
//!
//! - [`model`]: parts (nodes, elements, sections, materials, sets),
//!   instances and assembly-level constraints and contacts
//! - [`problem`]: boundary conditions, loads, output requests and steps
//!   over a model
//! - [`job`]: one traversal, three grammars (Abaqus, OpenSees, Ansys)
//! - [`results`]: reading back what a solver wrote
//!
//! Nothing here runs a solver. A [`job::SolverLauncher`] implementation
//! supplied by the caller does that.
//!
//! ## Quick Start
//!
//! ```rust
//! use fea_core::job::{backend_by_name, generate};
//! use fea_core::model::{Element, ElementKind, Material, Model, Node, Section};
//! use fea_core::problem::{BoundaryCondition, Components, Dof, Load, Problem, Step, Support};
//!
//! let mut model = Model::new("cantilever");
//! let mut part = model.new_part("beam");
//! part.add_node(Node::new([0.0, 0.0, 0.0]));
//! part.add_node(Node::new([2.0, 0.0, 0.0]));
//! let steel = Material::elastic_isotropic("steel", 210e9, 0.3, 7850.0);
//! let section = Section::circular("rod", 0.05, steel);
//! part.add_element(Element::new(ElementKind::Beam, vec![0, 1], section).unwrap()).unwrap();
//! model.add_part(part);
//! model.add_nodes_group("beam-1", "root", [0]).unwrap();
//! model.add_nodes_group("beam-1", "tip", [1]).unwrap();
//!
//! let mut problem = Problem::new("cantilever", model);
//! problem.add_bc(BoundaryCondition::new("fix", "root", Support::Fixed));
//! problem.add_load(Load::point("push", "tip", Components::free().with(Dof::Z, -100.0)));
//! problem.add_step(Step::static_step("load").with_load("push"));
//!
//! let inp = generate(&problem, backend_by_name("abaqus").unwrap()).unwrap();
//! assert!(inp.contains("*Cload\ntip, 3, -100"));
//! ```

pub mod errors;
pub mod file_io;
pub mod job;
pub mod model;
pub mod problem;
pub mod registry;
pub mod results;
pub mod settings;

pub use errors::{FeaError, FeaResult, ResultsError};
pub use file_io::{load_problem, save_problem, write_input_file, FileLock};
pub use model::Model;
pub use problem::Problem;
pub use registry::{AddOutcome, Named, Registry};
pub use settings::ModelSettings;
