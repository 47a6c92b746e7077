//! # Job Data Generation
//!
//! Turns a [`Problem`] into the text document an external solver consumes.
//!
//! One traversal, [`generate_at`], walks the fixed section order in
//! [`JobSection::ORDER`] and asks a [`BackendSerializer`] strategy to render
//! each block. Backends differ only in grammar; they see the same resolved
//! content through a [`JobContext`].
//!
//! ```text
//! heading -> parts -> materials -> interaction properties -> interactions
//!         -> assembly -> constraints -> boundary conditions -> steps
//! ```
//!
//! Generation is a pure function of the problem and the header stamp: two
//! calls with the same stamp yield identical text.
//!
//! ## Example
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use fea_core::job::{backend_by_name, generate_at};
//! use fea_core::model::Model;
//! use fea_core::problem::Problem;
//!
//! let problem = Problem::new("empty", Model::new("empty"));
//! let abaqus = backend_by_name("abaqus").unwrap();
//! let stamp = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//!
//! let doc = generate_at(&problem, abaqus, stamp).unwrap();
//! assert!(doc.contains("*Heading"));
//! assert_eq!(doc, generate_at(&problem, abaqus, stamp).unwrap());
//! ```

pub mod abaqus;
pub mod ansys;
pub mod opensees;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{FeaError, FeaResult};
use crate::model::{Group, GroupKind, Instance, Material, Model, Part, Section};
use crate::problem::{BoundaryCondition, FieldOutput, HistoryOutput, Load, Problem, Step};
use crate::registry::Named;
use crate::results::{INFO_SUFFIX, RESULTS_SUFFIX};

pub use abaqus::Abaqus;
pub use ansys::Ansys;
pub use opensees::OpenSees;

/// Name written into document headers
pub const GENERATOR: &str = concat!("fea_core ", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Section order
// ============================================================================

/// Blocks of a job document, in the order a solver reads them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobSection {
    Heading,
    Parts,
    Materials,
    InteractionProperties,
    Interactions,
    Assembly,
    Constraints,
    BoundaryConditions,
    Steps,
}

impl JobSection {
    /// Fixed document order
    pub const ORDER: [JobSection; 9] = [
        JobSection::Heading,
        JobSection::Parts,
        JobSection::Materials,
        JobSection::InteractionProperties,
        JobSection::Interactions,
        JobSection::Assembly,
        JobSection::Constraints,
        JobSection::BoundaryConditions,
        JobSection::Steps,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            JobSection::Heading => "heading",
            JobSection::Parts => "parts",
            JobSection::Materials => "materials",
            JobSection::InteractionProperties => "interaction_properties",
            JobSection::Interactions => "interactions",
            JobSection::Assembly => "assembly",
            JobSection::Constraints => "constraints",
            JobSection::BoundaryConditions => "boundary_conditions",
            JobSection::Steps => "steps",
        }
    }

    /// Banner title used in document comments
    pub fn title(&self) -> &'static str {
        match self {
            JobSection::Heading => "HEADING",
            JobSection::Parts => "PARTS",
            JobSection::Materials => "MATERIALS",
            JobSection::InteractionProperties => "INTERACTION PROPERTIES",
            JobSection::Interactions => "INTERACTIONS",
            JobSection::Assembly => "ASSEMBLY",
            JobSection::Constraints => "CONSTRAINTS",
            JobSection::BoundaryConditions => "BOUNDARY CONDITIONS",
            JobSection::Steps => "STEPS",
        }
    }
}

impl fmt::Display for JobSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Backend strategy
// ============================================================================

/// How a backend numbers nodes and elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Numbering {
    /// `key + 1` within each part; instances share their part's numbers
    PerPart,
    /// One 1-based sequence over the whole model, parts offset in instance
    /// order; a part may be placed only once
    Global,
}

/// Grammar of one solver's input format.
///
/// Each method renders one block of the document from the resolved
/// context. Implementations must not keep state between calls.
pub trait BackendSerializer: Sync {
    /// Registry name (`abaqus`, `opensees`, `ansys`)
    fn name(&self) -> &'static str;

    /// Document file extension
    fn extension(&self) -> &'static str;

    fn numbering(&self) -> Numbering;

    fn heading(&self, ctx: &JobContext<'_>) -> FeaResult<String>;
    fn parts(&self, ctx: &JobContext<'_>) -> FeaResult<String>;
    fn materials(&self, ctx: &JobContext<'_>) -> FeaResult<String>;
    fn interaction_properties(&self, ctx: &JobContext<'_>) -> FeaResult<String>;
    fn interactions(&self, ctx: &JobContext<'_>) -> FeaResult<String>;
    fn assembly(&self, ctx: &JobContext<'_>) -> FeaResult<String>;
    fn constraints(&self, ctx: &JobContext<'_>) -> FeaResult<String>;
    fn boundary_conditions(&self, ctx: &JobContext<'_>) -> FeaResult<String>;
    fn steps(&self, ctx: &JobContext<'_>) -> FeaResult<String>;

    /// Dispatch one section to its renderer
    fn render(&self, section: JobSection, ctx: &JobContext<'_>) -> FeaResult<String> {
        match section {
            JobSection::Heading => self.heading(ctx),
            JobSection::Parts => self.parts(ctx),
            JobSection::Materials => self.materials(ctx),
            JobSection::InteractionProperties => self.interaction_properties(ctx),
            JobSection::Interactions => self.interactions(ctx),
            JobSection::Assembly => self.assembly(ctx),
            JobSection::Constraints => self.constraints(ctx),
            JobSection::BoundaryConditions => self.boundary_conditions(ctx),
            JobSection::Steps => self.steps(ctx),
        }
    }
}

static ABAQUS: Abaqus = Abaqus;
static OPENSEES: OpenSees = OpenSees;
static ANSYS: Ansys = Ansys;

/// All built-in backends
pub fn backends() -> [&'static dyn BackendSerializer; 3] {
    [&ABAQUS, &OPENSEES, &ANSYS]
}

/// Look a backend up by name (case-insensitive).
pub fn backend_by_name(name: &str) -> FeaResult<&'static dyn BackendSerializer> {
    backends()
        .into_iter()
        .find(|b| b.name().eq_ignore_ascii_case(name))
        .ok_or_else(|| {
            let known: Vec<&str> = backends().iter().map(|b| b.name()).collect();
            FeaError::invalid_input("backend", name, format!("Known backends: {}", known.join(", ")))
        })
}

// ============================================================================
// Context
// ============================================================================

/// Everything a backend needs for one generation call.
///
/// Built fresh per call; validates every cross-reference up front so the
/// renderers can assume a consistent graph.
pub struct JobContext<'a> {
    pub problem: &'a Problem,
    pub model: &'a Model,
    pub stamp: DateTime<Utc>,
    pub numbering: Numbering,
    /// Per-part (node, element) offsets under global numbering
    offsets: HashMap<&'a str, (usize, usize)>,
}

impl<'a> JobContext<'a> {
    pub fn new(problem: &'a Problem, numbering: Numbering, stamp: DateTime<Utc>) -> FeaResult<Self> {
        let model = &problem.model;
        validate_model(model)?;

        let mut offsets = HashMap::new();
        if numbering == Numbering::Global {
            let (mut nodes, mut elements) = (0, 0);
            for instance in model.instances() {
                if offsets.contains_key(instance.part.as_str()) {
                    return Err(FeaError::unsupported(
                        "global numbering",
                        format!("part '{}' placed by more than one instance", instance.part),
                    ));
                }
                let part = model.instance_part(&instance.name)?;
                offsets.insert(instance.part.as_str(), (nodes, elements));
                nodes += part.node_count();
                elements += part.element_count();
            }
        }

        Ok(JobContext {
            problem,
            model,
            stamp,
            numbering,
            offsets,
        })
    }

    /// Job name (the problem name)
    pub fn job_name(&self) -> &str {
        &self.problem.name
    }

    /// Decimals for coordinates
    pub fn precision(&self) -> usize {
        self.model.settings.precision
    }

    /// Solver number of a node
    pub fn node_tag(&self, part: &Part, key: usize) -> usize {
        let offset = self.offsets.get(part.name.as_str()).map(|o| o.0).unwrap_or(0);
        offset + key + 1
    }

    /// Solver number of an element
    pub fn element_tag(&self, part: &Part, key: usize) -> usize {
        let offset = self.offsets.get(part.name.as_str()).map(|o| o.1).unwrap_or(0);
        offset + key + 1
    }

    /// Parts in instance order (each part once)
    pub fn placed_parts(&self) -> FeaResult<Vec<(&'a Instance, &'a Part)>> {
        let mut seen = Vec::new();
        let mut out = Vec::new();
        for instance in self.model.instances() {
            if seen.contains(&instance.part.as_str()) {
                continue;
            }
            seen.push(instance.part.as_str());
            out.push((instance, self.model.instance_part(&instance.name)?));
        }
        Ok(out)
    }

    /// Index (1-based) of a material in the model's derived registry
    pub fn material_tag(&self, name: &str) -> FeaResult<usize> {
        self.model
            .materials()
            .iter()
            .position(|m| m.name == name)
            .map(|i| i + 1)
            .ok_or_else(|| FeaError::registration(Material::KIND, name, self.model_container()))
    }

    /// Index (1-based) of a section in the model's derived registry
    pub fn section_tag(&self, name: &str) -> FeaResult<usize> {
        self.model
            .sections()
            .iter()
            .position(|s| s.name == name)
            .map(|i| i + 1)
            .ok_or_else(|| FeaError::registration(Section::KIND, name, self.model_container()))
    }

    /// Resolve a node set to its part and the solver tags of its nodes.
    pub fn node_set(&self, name: &str) -> FeaResult<ResolvedSet<'a>> {
        self.resolve_set(name, GroupKind::Nodes)
    }

    pub fn element_set(&self, name: &str) -> FeaResult<ResolvedSet<'a>> {
        self.resolve_set(name, GroupKind::Elements)
    }

    fn resolve_set(&self, name: &str, kind: GroupKind) -> FeaResult<ResolvedSet<'a>> {
        let model: &'a Model = self.model;
        let (instance, group) = model.resolve_set(name, kind)?;
        let part = model.instance_part(&instance.name)?;
        let tags = group
            .keys()
            .iter()
            .map(|&k| match kind {
                GroupKind::Nodes => self.node_tag(part, k),
                GroupKind::Elements => self.element_tag(part, k),
            })
            .collect();
        Ok(ResolvedSet {
            instance,
            part,
            group,
            tags,
        })
    }

    /// Resolve a step's references against the problem's registries.
    ///
    /// Loads come back multiplied by the step factor.
    pub fn resolve_step(&self, step: &'a Step) -> FeaResult<ResolvedStep<'a>> {
        let problem: &'a Problem = self.problem;
        let container = format!("problem '{}'", problem.name);

        check_references(&step.loads, Load::KIND, &container, |n| problem.loads().contains(n))?;
        check_references(&step.displacements, "displacement", &container, |n| {
            problem.displacements().contains(n)
        })?;
        check_references(&step.field_outputs, FieldOutput::KIND, &container, |n| {
            problem.field_outputs().contains(n)
        })?;
        check_references(&step.history_outputs, HistoryOutput::KIND, &container, |n| {
            problem.history_outputs().contains(n)
        })?;

        Ok(ResolvedStep {
            step,
            loads: step
                .loads
                .iter()
                .filter_map(|n| problem.loads().get(n))
                .map(|l| l.scaled(step.controls.factor))
                .collect(),
            displacements: step
                .displacements
                .iter()
                .filter_map(|n| problem.displacements().get(n))
                .collect(),
            field_outputs: step
                .field_outputs
                .iter()
                .filter_map(|n| problem.field_outputs().get(n))
                .collect(),
            history_outputs: step
                .history_outputs
                .iter()
                .filter_map(|n| problem.history_outputs().get(n))
                .collect(),
        })
    }

    fn model_container(&self) -> String {
        format!("model '{}'", self.model.name())
    }
}

/// A named set resolved to solver numbers.
pub struct ResolvedSet<'a> {
    pub instance: &'a Instance,
    pub part: &'a Part,
    pub group: &'a Group,
    pub tags: Vec<usize>,
}

/// A step with its references resolved.
pub struct ResolvedStep<'a> {
    pub step: &'a Step,
    pub loads: Vec<Load>,
    pub displacements: Vec<&'a BoundaryCondition>,
    pub field_outputs: Vec<&'a FieldOutput>,
    pub history_outputs: Vec<&'a HistoryOutput>,
}

fn check_references(names: &[String], kind: &str, container: &str, found: impl Fn(&str) -> bool) -> FeaResult<()> {
    match names.iter().find(|name| !found(name.as_str())) {
        Some(missing) => Err(FeaError::registration(kind, missing.as_str(), container)),
        None => Ok(()),
    }
}

/// Check every reference generation will follow.
fn validate_model(model: &Model) -> FeaResult<()> {
    for instance in model.instances() {
        model.instance_part(&instance.name)?;
    }
    let mut set_names = HashSet::new();
    for (instance, group) in model.sets() {
        if !set_names.insert(group.name.as_str()) {
            return Err(FeaError::invalid_input(
                "set",
                group.name.as_str(),
                format!("Name used more than once in the assembly (again on instance '{}')", instance.name),
            ));
        }
    }
    for part in model.parts() {
        if model.placements(&part.name) == 0 {
            return Err(FeaError::invalid_input("part", part.name.as_str(), "Part is not placed by any instance"));
        }
        let container = format!("part '{}'", part.name);
        for element in part.elements() {
            let section = part
                .section(element.section_name())
                .ok_or_else(|| FeaError::registration(Section::KIND, element.section_name(), container.clone()))?;
            if let Some(material) = section.material_name() {
                if part.material(material).is_none() {
                    return Err(FeaError::registration(Material::KIND, material, container.clone()));
                }
            }
            if let Some(&missing) = element.nodes.iter().find(|&&k| !part.check_node_in_part(k)) {
                return Err(FeaError::connectivity(element.name.clone(), missing, &part.name));
            }
        }
    }
    Ok(())
}

// ============================================================================
// Shared rendering helpers
// ============================================================================

/// Elements sharing a section (and, for beams, an orientation).
pub struct SectionAssignment<'a> {
    pub section: &'a Section,
    pub orientation: Option<[f64; 3]>,
    pub elements: Vec<usize>,
    /// Position among the assignments of the same section
    pub ordinal: usize,
}

impl SectionAssignment<'_> {
    /// Element set name used for this assignment
    pub fn set_name(&self) -> String {
        if self.ordinal == 0 {
            format!("{}-elset", self.section.name)
        } else {
            format!("{}-elset-{}", self.section.name, self.ordinal)
        }
    }
}

/// Group a part's elements by section assignment, in first-seen order.
pub fn section_assignments(part: &Part) -> FeaResult<Vec<SectionAssignment<'_>>> {
    let mut out: Vec<SectionAssignment<'_>> = Vec::new();
    for element in part.elements() {
        let section = part.section(element.section_name()).ok_or_else(|| {
            FeaError::registration(Section::KIND, element.section_name(), format!("part '{}'", part.name))
        })?;
        let orientation = section.shape.is_beam().then(|| element.orientation());

        match out
            .iter_mut()
            .find(|a| a.section.name == section.name && a.orientation == orientation)
        {
            Some(assignment) => assignment.elements.push(element.key),
            None => {
                let ordinal = out.iter().filter(|a| a.section.name == section.name).count();
                out.push(SectionAssignment {
                    section,
                    orientation,
                    elements: vec![element.key],
                    ordinal,
                });
            }
        }
    }
    Ok(out)
}

/// Join numbers in lines of at most `per_line` entries.
pub fn wrap_numbers(values: &[usize], per_line: usize) -> String {
    values
        .chunks(per_line.max(1))
        .map(|chunk| chunk.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", "))
        .collect::<Vec<_>>()
        .join(",\n")
}

/// Comment banner opening a section
pub fn banner(comment: &str, title: &str) -> String {
    format!("{c}\n{c} {t}\n{c}\n", c = comment, t = title)
}

/// Join values with `sep` using their shortest round-trip text
pub fn join_values(values: &[f64], sep: &str) -> String {
    values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(sep)
}

/// Fixed-decimal coordinate text with negative zero normalised
pub fn fmt_coord(value: f64, precision: usize) -> String {
    let text = format!("{:.*}", precision, value);
    if text.starts_with('-') && text[1..].chars().all(|c| c == '0' || c == '.') {
        text[1..].to_string()
    } else {
        text
    }
}

// ============================================================================
// Traversal
// ============================================================================

/// Generate the document for `problem`, stamping the header with `stamp`.
pub fn generate_at(problem: &Problem, backend: &dyn BackendSerializer, stamp: DateTime<Utc>) -> FeaResult<String> {
    let ctx = JobContext::new(problem, backend.numbering(), stamp)?;
    let mut document = String::new();
    for section in JobSection::ORDER {
        let block = backend.render(section, &ctx)?;
        tracing::debug!(backend = backend.name(), section = section.code(), bytes = block.len(), "section rendered");
        document.push_str(&block);
    }
    Ok(document)
}

/// Generate the document for `problem`, stamped with the current time.
pub fn generate(problem: &Problem, backend: &dyn BackendSerializer) -> FeaResult<String> {
    generate_at(problem, backend, Utc::now())
}

// ============================================================================
// Working directory and launcher contract
// ============================================================================

/// File layout of one job: `<base>/<job>/<job>.<ext>` plus result files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPaths {
    pub working_dir: PathBuf,
    pub document: PathBuf,
    pub results: PathBuf,
    pub info: PathBuf,
}

impl JobPaths {
    pub fn new(base: &Path, job: &str, backend: &dyn BackendSerializer) -> Self {
        let working_dir = base.join(job);
        JobPaths {
            document: working_dir.join(format!("{}.{}", job, backend.extension())),
            results: working_dir.join(format!("{}{}", job, RESULTS_SUFFIX)),
            info: working_dir.join(format!("{}{}", job, INFO_SUFFIX)),
            working_dir,
        }
    }
}

/// What a launcher receives for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub document: PathBuf,
    pub job_name: String,
    pub working_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaunchStatus {
    Completed,
    Failed { reason: String },
}

/// Runs an external solver on a written document.
///
/// `launch` returns only once the solver process has terminated; results
/// are read after that and never streamed.
pub trait SolverLauncher {
    fn launch(&self, job: &JobHandle) -> LaunchStatus;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Element, ElementKind, Material, Node};

    fn steel() -> Material {
        Material::elastic_isotropic("steel", 210e9, 0.3, 7850.0)
    }

    fn problem_with_beams() -> Problem {
        let mut model = Model::new("m");
        let mut part = model.new_part("frame");
        for z in [0.0, 1.0, 2.0] {
            part.add_node(Node::new([0.0, 0.0, z]));
        }
        let rect = Section::rectangular("rect", 0.1, 0.2, steel());
        part.add_element(Element::new(ElementKind::Beam, vec![0, 1], rect).unwrap()).unwrap();
        part.add_element(
            Element::new(ElementKind::Beam, vec![1, 2], "rect")
                .unwrap()
                .with_frame(crate::model::Frame::new([0.0, 0.0, 1.0], [1.0, 0.0, 0.0])),
        )
        .unwrap();
        model.add_part(part);
        Problem::new("job", model)
    }

    #[test]
    fn test_order_is_fixed() {
        let codes: Vec<&str> = JobSection::ORDER.iter().map(|s| s.code()).collect();
        assert_eq!(codes.first(), Some(&"heading"));
        assert_eq!(codes.last(), Some(&"steps"));
        let parts = codes.iter().position(|c| *c == "parts").unwrap();
        let materials = codes.iter().position(|c| *c == "materials").unwrap();
        let assembly = codes.iter().position(|c| *c == "assembly").unwrap();
        let bcs = codes.iter().position(|c| *c == "boundary_conditions").unwrap();
        assert!(parts < materials && materials < assembly && assembly < bcs);
    }

    #[test]
    fn test_backend_lookup() {
        assert_eq!(backend_by_name("OpenSees").unwrap().name(), "opensees");
        assert_eq!(backend_by_name("ansys").unwrap().extension(), "txt");
        let err = backend_by_name("calculix").err().unwrap();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_assignments_split_by_orientation() {
        let problem = problem_with_beams();
        let part = problem.model.part("frame").unwrap();
        let assignments = section_assignments(part).unwrap();
        assert_eq!(assignments.len(), 2);
        assert_eq!(assignments[0].set_name(), "rect-elset");
        assert_eq!(assignments[1].set_name(), "rect-elset-1");
        assert_eq!(assignments[1].orientation, Some([1.0, 0.0, 0.0]));
    }

    #[test]
    fn test_global_numbering_offsets() {
        let mut problem = problem_with_beams();
        let mut second = problem.model.new_part("second");
        second.add_node(Node::new([5.0, 0.0, 0.0]));
        problem.model.add_part(second);

        let ctx = JobContext::new(&problem, Numbering::Global, Utc::now()).unwrap();
        let second = problem.model.part("second").unwrap();
        assert_eq!(ctx.node_tag(second, 0), 4);
        let frame = problem.model.part("frame").unwrap();
        assert_eq!(ctx.element_tag(frame, 1), 2);

        let per_part = JobContext::new(&problem, Numbering::PerPart, Utc::now()).unwrap();
        assert_eq!(per_part.node_tag(second, 0), 1);
    }

    #[test]
    fn test_unplaced_part_rejected() {
        let mut problem = problem_with_beams();
        problem.model.remove_instance("frame-1");
        let err = JobContext::new(&problem, Numbering::PerPart, Utc::now()).err().unwrap();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_set_name_shared_by_part_and_instance_rejected() {
        let mut problem = problem_with_beams();
        problem.model.add_nodes_group("frame-1", "base", [0]).unwrap();
        problem
            .model
            .part_mut("frame")
            .unwrap()
            .add_nodes_group("base", [2])
            .unwrap();
        assert!(JobContext::new(&problem, Numbering::PerPart, Utc::now()).is_err());
    }

    #[test]
    fn test_global_numbering_rejects_repeated_placement() {
        let mut problem = problem_with_beams();
        problem.model.add_instance("frame-2", "frame").unwrap();
        assert!(JobContext::new(&problem, Numbering::Global, Utc::now()).is_err());
        assert!(JobContext::new(&problem, Numbering::PerPart, Utc::now()).is_ok());
    }

    #[test]
    fn test_unknown_step_reference_is_registration_error() {
        let mut problem = problem_with_beams();
        problem.add_step(Step::static_step("s").with_load("ghost"));
        let ctx = JobContext::new(&problem, Numbering::PerPart, Utc::now()).unwrap();
        let step = problem.steps().get("s").unwrap();
        let err = ctx.resolve_step(step).err().unwrap();
        assert_eq!(err.error_code(), "REGISTRATION_ERROR");
    }

    #[test]
    fn test_job_paths() {
        let paths = JobPaths::new(Path::new("/tmp/runs"), "beam", backend_by_name("abaqus").unwrap());
        assert_eq!(paths.working_dir, Path::new("/tmp/runs/beam"));
        assert_eq!(paths.document, Path::new("/tmp/runs/beam/beam.inp"));
        assert_eq!(paths.results, Path::new("/tmp/runs/beam/beam-results.json"));
        assert_eq!(paths.info, Path::new("/tmp/runs/beam/beam-info.json"));
    }

    #[test]
    fn test_wrap_numbers() {
        assert_eq!(wrap_numbers(&[1, 2, 3], 2), "1, 2,\n3");
        assert_eq!(fmt_coord(-0.0001, 3), "0.000");
    }
}
