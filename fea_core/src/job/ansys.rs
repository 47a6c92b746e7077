//! Ansys APDL command grammar.
//!
//! Like OpenSees, APDL numbers nodes and elements globally. Element types
//! are declared per distinct (kind, node count) in first-seen order; section
//! and material numbers follow the model's derived registries.

use crate::errors::{FeaError, FeaResult};
use crate::job::{
    banner, fmt_coord, join_values, BackendSerializer, JobContext, JobSection, Numbering, ResolvedSet,
    ResolvedStep, GENERATOR,
};
use crate::model::{Behavior, ConstraintKind, Element, ElementKind, GroupKind, Part, Section, Shape};
use crate::problem::{Components, Dof, ElementField, Load, NodeField, StepKind};

const COMMENT: &str = "!";

pub struct Ansys;

impl Ansys {
    fn unsupported(feature: impl Into<String>) -> FeaError {
        FeaError::unsupported("ansys", feature)
    }

    /// APDL element type name
    pub fn element_type(element: &Element) -> FeaResult<&'static str> {
        let n = element.nodes.len();
        let name = match (element.kind, n) {
            (ElementKind::Mass, _) => "MASS21",
            (ElementKind::Beam, _) => "BEAM188",
            (ElementKind::Spring, _) => "COMBIN14",
            (kind, 2) if kind.is_truss_like() => "LINK180",
            (kind, 3 | 4) if kind.is_surface() => "SHELL181",
            (kind, 6 | 8) if kind.is_surface() => "SHELL281",
            (ElementKind::Solid, 4) => "SOLID285",
            (ElementKind::Solid, 8) => "SOLID185",
            (ElementKind::Solid, 10) => "SOLID187",
            (ElementKind::Solid, 20) => "SOLID186",
            (kind, n) => return Err(Ansys::unsupported(format!("{}-node {} elements", n, kind))),
        };
        Ok(name)
    }

    /// LINK180, SOLID18x and membrane shells have no rotational dofs.
    fn carries_rotations(part: &Part) -> bool {
        part.elements()
            .any(|e| !(e.kind.is_truss_like() || matches!(e.kind, ElementKind::Solid | ElementKind::Membrane)))
    }

    /// Present components of a set's nodes the element types can take
    fn active_components(set: &ResolvedSet<'_>, components: &Components) -> Vec<(Dof, f64)> {
        let rotations = Ansys::carries_rotations(set.part);
        components
            .present()
            .filter(|(dof, _)| {
                let keep = rotations || !dof.is_rotation();
                if !keep {
                    tracing::debug!(set = %set.group.name, dof = %dof, "rotation skipped on translational nodes");
                }
                keep
            })
            .collect()
    }

    fn dof_label(dof: Dof) -> &'static str {
        match dof {
            Dof::X => "UX",
            Dof::Y => "UY",
            Dof::Z => "UZ",
            Dof::Xx => "ROTX",
            Dof::Yy => "ROTY",
            Dof::Zz => "ROTZ",
        }
    }

    fn force_label(dof: Dof) -> &'static str {
        match dof {
            Dof::X => "FX",
            Dof::Y => "FY",
            Dof::Z => "FZ",
            Dof::Xx => "MX",
            Dof::Yy => "MY",
            Dof::Zz => "MZ",
        }
    }

    /// Distinct element types of the model with their numbers
    fn element_types(ctx: &JobContext<'_>) -> FeaResult<Vec<(ElementKind, &'static str)>> {
        let mut types: Vec<(ElementKind, &'static str)> = Vec::new();
        for (_, part) in ctx.placed_parts()? {
            for element in part.elements() {
                let entry = (element.kind, Ansys::element_type(element)?);
                if !types.contains(&entry) {
                    types.push(entry);
                }
            }
        }
        Ok(types)
    }

    fn section_block(ctx: &JobContext<'_>, section: &Section) -> FeaResult<String> {
        let tag = ctx.section_tag(&section.name)?;
        let material = match section.material_name() {
            Some(name) => ctx.material_tag(name)?,
            None => 0,
        };
        let beam = |subtype: &str, data: &[f64]| {
            format!(
                "SECTYPE,{},BEAM,{},{}\nSECDATA,{}\n",
                tag,
                subtype,
                section.name,
                join_values(data, ",")
            )
        };
        let props = section.properties;

        let block = match &section.shape {
            Shape::Rectangular { b, h } => beam("RECT", &[*b, *h]),
            Shape::Circular { r } => beam("CSOLID", &[*r]),
            Shape::Pipe { r, t } => beam("CTUBE", &[r - t, *r]),
            Shape::I { b, h, tw, tf } => beam("I", &[*b, *b, *h, *tf, *tf, *tw]),
            Shape::Box { b, h, tw, tf } => beam("HREC", &[*b, *h, *tw, *tw, *tf, *tf]),
            Shape::Angle { b, h, t } => beam("L", &[*b, *h, *t, *t]),
            Shape::Trapezoidal { .. } | Shape::GeneralBeam { .. } => beam(
                "ASEC",
                &[
                    props.a.unwrap_or(0.0),
                    props.ixx.unwrap_or(0.0),
                    props.ixy.unwrap_or(0.0),
                    props.iyy.unwrap_or(0.0),
                    0.0,
                    props.j.unwrap_or(0.0),
                ],
            ),
            Shape::Truss { a } | Shape::Strut { a } | Shape::Tie { a } => {
                format!("SECTYPE,{},LINK,,{}\nSECDATA,{}\n", tag, section.name, a)
            }
            Shape::Shell { t } | Shape::Membrane { t } => {
                format!("SECTYPE,{},SHELL,,{}\nSECDATA,{},{}\n", tag, section.name, t, material)
            }
            Shape::Solid => String::new(),
            Shape::Spring { stiffness } => format!("R,{},{}\n", tag, stiffness),
            Shape::Mass { mass } => format!("R,{},{},{},{}\n", tag, mass, mass, mass),
        };
        Ok(block)
    }

    fn part_block(&self, ctx: &JobContext<'_>, part: &Part, types: &[(ElementKind, &'static str)]) -> FeaResult<String> {
        let p = ctx.precision();
        let mut out = format!("! Part: {}\n", part.name);

        for node in part.nodes() {
            out.push_str(&format!(
                "N,{},{},{},{}\n",
                ctx.node_tag(part, node.key),
                fmt_coord(node.xyz[0], p),
                fmt_coord(node.xyz[1], p),
                fmt_coord(node.xyz[2], p)
            ));
        }

        for element in part.elements() {
            let section = part.section(element.section_name()).ok_or_else(|| {
                FeaError::registration("section", element.section_name(), format!("part '{}'", part.name))
            })?;
            let etype = Ansys::element_type(element)?;
            let type_tag = types
                .iter()
                .position(|t| *t == (element.kind, etype))
                .map(|i| i + 1)
                .unwrap_or(1);
            let material = match section.material_name() {
                Some(name) => ctx.material_tag(name)?,
                None => 0,
            };
            let section_tag = ctx.section_tag(&section.name)?;
            let attribute = match section.shape {
                Shape::Spring { .. } | Shape::Mass { .. } => format!("REAL,{}", section_tag),
                _ => format!("SECNUM,{}", section_tag),
            };
            let nodes: Vec<String> = element
                .nodes
                .iter()
                .map(|&k| ctx.node_tag(part, k).to_string())
                .collect();
            out.push_str(&format!(
                "TYPE,{}\nMAT,{}\n{}\nEN,{},{}\n",
                type_tag,
                material,
                attribute,
                ctx.element_tag(part, element.key),
                nodes.join(",")
            ));
        }
        Ok(out)
    }

    fn step_block(&self, ctx: &JobContext<'_>, resolved: &ResolvedStep<'_>) -> FeaResult<String> {
        let step = resolved.step;
        let controls = &step.controls;
        let mut out = format!("! Step: {}\n", step.name);

        match step.kind {
            StepKind::Static => out.push_str("ANTYPE,STATIC,NEW\n"),
            StepKind::Modal { modes } => out.push_str(&format!("ANTYPE,MODAL,NEW\nMODOPT,LANB,{}\n", modes)),
        }
        out.push_str(&format!(
            "NLGEOM,{}\nNSUBST,{},{},1\nCNVTOL,F,,{}\n",
            if controls.nlgeom { "ON" } else { "OFF" },
            controls.increments.max(1),
            controls.max_increments,
            controls.tolerance
        ));

        out.push_str("OUTRES,ERASE\n");
        for output in &resolved.field_outputs {
            let mut items: Vec<&str> = Vec::new();
            for field in &output.node_fields {
                let item = match field {
                    NodeField::U | NodeField::Ur => "NSOL",
                    NodeField::Rf | NodeField::Rm => "RSOL",
                    NodeField::Cf | NodeField::Cm => "NLOAD",
                };
                if !items.contains(&item) {
                    items.push(item);
                }
            }
            for field in &output.element_fields {
                let item = match field {
                    ElementField::S | ElementField::E | ElementField::Pe => "ESOL",
                    _ => "MISC",
                };
                if !items.contains(&item) {
                    items.push(item);
                }
            }
            for item in items {
                out.push_str(&format!("OUTRES,{},ALL\n", item));
            }
        }

        for displacement in &resolved.displacements {
            let set = ctx.node_set(&displacement.target)?;
            let components = Ansys::active_components(&set, &displacement.components);
            for tag in &set.tags {
                for (dof, value) in &components {
                    out.push_str(&format!("D,{},{},{}\n", tag, Ansys::dof_label(*dof), value));
                }
            }
        }

        for load in &resolved.loads {
            match load {
                Load::Point { target, components, .. } => {
                    let set = ctx.node_set(target)?;
                    let components = Ansys::active_components(&set, components);
                    for tag in &set.tags {
                        for (dof, value) in &components {
                            out.push_str(&format!("F,{},{},{}\n", tag, Ansys::force_label(*dof), value));
                        }
                    }
                }
                Load::Gravity { g, direction, .. } => {
                    // ACEL accelerates the structure, opposite to the gravity field
                    let acceleration: Vec<f64> = direction
                        .iter()
                        .map(|d| if *d == 0.0 { 0.0 } else { -g * d })
                        .collect();
                    out.push_str(&format!("ACEL,{}\n", join_values(&acceleration, ",")));
                }
            }
        }

        out.push_str("SOLVE\nFDELE,ALL,ALL\nACEL,0,0,0\n");
        Ok(out)
    }
}

impl BackendSerializer for Ansys {
    fn name(&self) -> &'static str {
        "ansys"
    }

    fn extension(&self) -> &'static str {
        "txt"
    }

    fn numbering(&self) -> Numbering {
        Numbering::Global
    }

    fn heading(&self, ctx: &JobContext<'_>) -> FeaResult<String> {
        Ok(format!(
            "/TITLE,{model}\n! Job name: {job} Model name: {model}\n! Generated by: {generator}\n! Generated at: {stamp}\n/PREP7\n",
            model = ctx.model.name(),
            job = ctx.job_name(),
            generator = GENERATOR,
            stamp = ctx.stamp.to_rfc3339()
        ))
    }

    fn parts(&self, ctx: &JobContext<'_>) -> FeaResult<String> {
        let mut out = banner(COMMENT, JobSection::Parts.title());
        let types = Ansys::element_types(ctx)?;
        for (i, (kind, name)) in types.iter().enumerate() {
            out.push_str(&format!("ET,{},{}\n", i + 1, name));
            match kind {
                ElementKind::Membrane => out.push_str(&format!("KEYOPT,{},1,1\n", i + 1)),
                ElementKind::Mass => out.push_str(&format!("KEYOPT,{},3,2\n", i + 1)),
                _ => {}
            }
        }
        for section in ctx.model.sections() {
            out.push_str(&Ansys::section_block(ctx, section)?);
        }
        for (_, part) in ctx.placed_parts()? {
            out.push_str(&self.part_block(ctx, part, &types)?);
        }
        Ok(out)
    }

    fn materials(&self, ctx: &JobContext<'_>) -> FeaResult<String> {
        let mut out = banner(COMMENT, JobSection::Materials.title());
        for material in ctx.model.materials() {
            let tag = ctx.material_tag(&material.name)?;
            out.push_str(&format!("! Material: {}\nMP,DENS,{},{}\n", material.name, tag, material.density));
            match &material.behavior {
                Behavior::ElasticIsotropic { e, v } => {
                    out.push_str(&format!("MP,EX,{},{}\nMP,PRXY,{},{}\n", tag, e, tag, v));
                }
                Behavior::ElasticPlastic { e, v, table } => {
                    out.push_str(&format!("MP,EX,{},{}\nMP,PRXY,{},{}\n", tag, e, tag, v));
                    out.push_str(&format!("TB,MISO,{},1,{}\n", tag, table.len()));
                    for [stress, strain] in table {
                        out.push_str(&format!("TBPT,,{},{}\n", strain, stress));
                    }
                }
                Behavior::User { constants } => {
                    out.push_str(&format!("TB,USER,{},1,{}\n", tag, constants.len()));
                    for (i, chunk) in constants.chunks(6).enumerate() {
                        out.push_str(&format!("TBDATA,{},{}\n", i * 6 + 1, join_values(chunk, ",")));
                    }
                }
            }
        }
        Ok(out)
    }

    fn interaction_properties(&self, _ctx: &JobContext<'_>) -> FeaResult<String> {
        Ok(banner(COMMENT, JobSection::InteractionProperties.title()))
    }

    fn interactions(&self, ctx: &JobContext<'_>) -> FeaResult<String> {
        if !ctx.model.contacts().is_empty() {
            return Err(Ansys::unsupported("contact interactions"));
        }
        Ok(banner(COMMENT, JobSection::Interactions.title()))
    }

    fn assembly(&self, ctx: &JobContext<'_>) -> FeaResult<String> {
        let mut out = banner(COMMENT, JobSection::Assembly.title());
        for instance in ctx.model.instances() {
            out.push_str(&format!("! Instance: {} of part {}\n", instance.name, instance.part));
            for group in ctx.model.instance_sets(instance) {
                let (entity, tags) = match group.kind {
                    GroupKind::Nodes => ("NODE", ctx.node_set(&group.name)?.tags),
                    GroupKind::Elements => ("ELEM", ctx.element_set(&group.name)?.tags),
                };
                let select = if entity == "NODE" { "NSEL" } else { "ESEL" };
                for (i, tag) in tags.iter().enumerate() {
                    let mode = if i == 0 { "S" } else { "A" };
                    out.push_str(&format!("{},{},{},,{}\n", select, mode, entity, tag));
                }
                out.push_str(&format!("CM,{},{}\nALLSEL\n", group.name, entity));
            }
        }
        Ok(out)
    }

    fn constraints(&self, ctx: &JobContext<'_>) -> FeaResult<String> {
        let mut out = banner(COMMENT, JobSection::Constraints.title());
        for constraint in ctx.model.constraints() {
            let labels: &[&str] = match constraint.kind {
                ConstraintKind::Tie => &["ALL"],
                ConstraintKind::Pin => &["UX", "UY", "UZ"],
                ConstraintKind::Slider => return Err(Ansys::unsupported("slider constraints")),
            };
            let master = ctx.node_set(&constraint.master)?.tags;
            let slave = ctx.node_set(&constraint.slave)?.tags;
            if master.len() != slave.len() {
                return Err(FeaError::invalid_input(
                    "constraint",
                    constraint.name.as_str(),
                    format!("Master set has {} nodes, slave set has {}", master.len(), slave.len()),
                ));
            }
            out.push_str(&format!("! Constraint: {}\n", constraint.name));
            for (m, s) in master.iter().zip(&slave) {
                for label in labels {
                    out.push_str(&format!("CP,NEXT,{},{},{}\n", label, m, s));
                }
            }
        }
        Ok(out)
    }

    fn boundary_conditions(&self, ctx: &JobContext<'_>) -> FeaResult<String> {
        let mut out = banner(COMMENT, JobSection::BoundaryConditions.title());
        for bc in ctx.problem.bcs() {
            out.push_str(&format!("! Name: {}\n", bc.name));
            let set = ctx.node_set(&bc.target)?;
            let components = Ansys::active_components(&set, &bc.components);
            for tag in &set.tags {
                for (dof, value) in &components {
                    out.push_str(&format!("D,{},{},{}\n", tag, Ansys::dof_label(*dof), value));
                }
            }
        }
        Ok(out)
    }

    fn steps(&self, ctx: &JobContext<'_>) -> FeaResult<String> {
        let mut out = banner(COMMENT, JobSection::Steps.title());
        out.push_str("FINISH\n/SOLU\n");
        for step in ctx.problem.steps() {
            let resolved = ctx.resolve_step(step)?;
            out.push_str(&self.step_block(ctx, &resolved)?);
        }
        out.push_str("FINISH\n");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::generate_at;
    use crate::model::{Material, Model, Node};
    use crate::problem::{BoundaryCondition, Components, Problem, Step, Support};
    use chrono::{TimeZone, Utc};

    fn plate() -> Problem {
        let mut model = Model::new("plate");
        let mut part = model.new_part("slab");
        for xyz in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]] {
            part.add_node(Node::new(xyz));
        }
        let concrete = Material::elastic_isotropic("concrete", 30e9, 0.2, 2400.0);
        part.add_element(Element::new(ElementKind::Shell, vec![0, 1, 2, 3], Section::shell("slab-200", 0.2, concrete)).unwrap())
            .unwrap();
        model.add_part(part);
        model.add_nodes_group("slab-1", "edge", [0, 3]).unwrap();
        model.add_nodes_group("slab-1", "corner", [2]).unwrap();

        let mut problem = Problem::new("plate-job", model);
        problem.add_bc(BoundaryCondition::new("pin", "edge", Support::Pinned));
        problem.add_load(Load::point("p", "corner", Components::free().with(Dof::Z, -5.0)));
        problem.add_load(Load::gravity("g"));
        problem.add_step(Step::static_step("load").with_load("p").with_load("g"));
        problem
    }

    fn generate(problem: &Problem) -> String {
        let stamp = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        generate_at(problem, &Ansys, stamp).unwrap()
    }

    #[test]
    fn test_prep7_records() {
        let doc = generate(&plate());
        assert!(doc.starts_with("/TITLE,plate\n"));
        assert!(doc.contains("ET,1,SHELL181\n"));
        assert!(doc.contains("SECTYPE,1,SHELL,,slab-200\nSECDATA,0.2,1\n"));
        assert!(doc.contains("N,3,1.000,1.000,0.000\n"));
        assert!(doc.contains("TYPE,1\nMAT,1\nSECNUM,1\nEN,1,1,2,3,4\n"));
        assert!(doc.contains("MP,EX,1,30000000000\nMP,PRXY,1,0.2\n"));
    }

    #[test]
    fn test_fixed_solid_skips_rotations() {
        let mut model = Model::new("block");
        let mut part = model.new_part("block");
        for i in 0..8 {
            let (x, y, z) = ((i & 1) as f64, ((i >> 1) & 1) as f64, (i >> 2) as f64);
            part.add_node(Node::new([x, y, z]));
        }
        let rubber = Material::elastic_isotropic("rubber", 1e6, 0.45, 1100.0);
        part.add_element(Element::new(ElementKind::Solid, (0..8).collect(), Section::solid("solid", rubber)).unwrap())
            .unwrap();
        part.add_nodes_group("bottom", [0]).unwrap();
        model.add_part(part);

        let mut problem = Problem::new("block-job", model);
        problem.add_bc(BoundaryCondition::new("fix", "bottom", Support::Fixed));
        let doc = generate(&problem);
        assert!(doc.contains("! Name: fix\nD,1,UX,0\nD,1,UY,0\nD,1,UZ,0\n"));
        assert!(!doc.contains("ROTX"));
    }

    #[test]
    fn test_pinned_bc_constrains_translations_only() {
        let doc = generate(&plate());
        assert!(doc.contains("! Name: pin\nD,1,UX,0\nD,1,UY,0\nD,1,UZ,0\nD,4,UX,0\nD,4,UY,0\nD,4,UZ,0\n"));
        assert!(!doc.contains("ROTX"));
    }

    #[test]
    fn test_solution_block() {
        let doc = generate(&plate());
        assert!(doc.contains("FINISH\n/SOLU\n! Step: load\nANTYPE,STATIC,NEW\nNLGEOM,OFF\n"));
        assert!(doc.contains("F,3,FZ,-5\n"));
        assert!(doc.contains("ACEL,0,0,9.81\n"));
        assert!(doc.trim_end().ends_with("FINISH"));
    }

    #[test]
    fn test_components_from_sets() {
        let doc = generate(&plate());
        assert!(doc.contains("NSEL,S,NODE,,1\nNSEL,A,NODE,,4\nCM,edge,NODE\nALLSEL\n"));
    }

    #[test]
    fn test_unsupported_topology() {
        let element = Element::new(ElementKind::Solid, (0..6).collect(), "wedge").unwrap();
        let err = Ansys::element_type(&element).unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_FEATURE");
    }
}
