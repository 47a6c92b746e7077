//! Abaqus `.inp` keyword grammar.
//!
//! Nodes and elements are numbered `key + 1` per part. Sets, surfaces and
//! constraints live in the assembly, so the assembly block stays open until
//! the constraints block closes it with `*End Assembly`.

use std::collections::BTreeMap;

use crate::errors::FeaResult;
use crate::job::{
    banner, fmt_coord, join_values, section_assignments, wrap_numbers, BackendSerializer, JobContext,
    JobSection, Numbering, ResolvedStep, SectionAssignment, GENERATOR,
};
use crate::model::{Behavior, ConstraintKind, Element, ElementKind, GroupKind, Part, Shape};
use crate::problem::{BoundaryCondition, Components, Load, StepKind};

const COMMENT: &str = "**";
const PER_LINE: usize = 16;

pub struct Abaqus;

impl Abaqus {
    /// Element type keyword, honouring an explicit implementation
    pub fn element_type(element: &Element) -> String {
        if let Some(implementation) = &element.implementation {
            return implementation.clone();
        }
        let n = element.nodes.len();
        let reduced = if element.reduced { "R" } else { "" };
        match element.kind {
            ElementKind::Mass => "MASS".to_string(),
            ElementKind::Beam => "B31".to_string(),
            ElementKind::Spring => "SPRINGA".to_string(),
            ElementKind::Truss | ElementKind::Strut | ElementKind::Tie => format!("T3D{}", n),
            ElementKind::Shell => format!("S{}{}", n, reduced),
            ElementKind::Membrane => format!("M3D{}{}", n, reduced),
            ElementKind::Solid => format!("C3D{}{}", n, reduced),
        }
    }

    fn part_block(&self, ctx: &JobContext<'_>, part: &Part) -> FeaResult<String> {
        let p = ctx.precision();
        let mut out = format!("*Part, name={}\n", part.name);

        out.push_str("*Node\n");
        for node in part.nodes() {
            out.push_str(&format!(
                "{}, {}, {}, {}\n",
                ctx.node_tag(part, node.key),
                fmt_coord(node.xyz[0], p),
                fmt_coord(node.xyz[1], p),
                fmt_coord(node.xyz[2], p)
            ));
        }

        let mut by_type: Vec<(String, Vec<&Element>)> = Vec::new();
        for element in part.elements() {
            let etype = Abaqus::element_type(element);
            match by_type.iter_mut().find(|(t, _)| *t == etype) {
                Some((_, elements)) => elements.push(element),
                None => by_type.push((etype, vec![element])),
            }
        }
        for (etype, elements) in by_type {
            out.push_str(&format!("*Element, type={}\n", etype));
            for element in elements {
                let nodes: Vec<String> = element
                    .nodes
                    .iter()
                    .map(|&k| ctx.node_tag(part, k).to_string())
                    .collect();
                out.push_str(&format!("{}, {}\n", ctx.element_tag(part, element.key), nodes.join(", ")));
            }
        }

        for assignment in section_assignments(part)? {
            let tags: Vec<usize> = assignment
                .elements
                .iter()
                .map(|&k| ctx.element_tag(part, k))
                .collect();
            out.push_str(&format!("*Elset, elset={}\n{}\n", assignment.set_name(), wrap_numbers(&tags, PER_LINE)));
            out.push_str(&self.section_record(part, &assignment));
        }

        out.push_str("*End Part\n**\n");
        Ok(out)
    }

    fn section_record(&self, part: &Part, assignment: &SectionAssignment<'_>) -> String {
        let section = assignment.section;
        let elset = assignment.set_name();
        let material = section.material_name().unwrap_or_default();
        let orientation = assignment
            .orientation
            .map(|o| join_values(&o, ", "))
            .unwrap_or_default();
        let beam = |code: &str, data: &[f64]| {
            format!(
                "** Section: {}\n*Beam Section, elset={}, material={}, section={}\n{}\n{}\n",
                section.name,
                elset,
                material,
                code,
                join_values(data, ", "),
                orientation
            )
        };

        match &section.shape {
            Shape::Rectangular { b, h } => beam("RECT", &[*b, *h]),
            Shape::Circular { r } => beam("CIRC", &[*r]),
            Shape::I { b, h, tw, tf } => beam("I", &[h / 2.0, *h, *b, *b, *tf, *tf, *tw]),
            Shape::Box { b, h, tw, tf } => beam("BOX", &[*b, *h, *tw, *tf, *tw, *tf]),
            Shape::Pipe { r, t } => beam("PIPE", &[*r, *t]),
            Shape::Angle { b, h, t } => beam("L", &[*b, *h, *t, *t]),
            Shape::Trapezoidal { b1, b2, h } => beam("TRAPEZOID", &[*b1, *h, *b2, (b1 - b2) / 2.0]),
            Shape::GeneralBeam { properties } => {
                let material = section.material_name().and_then(|m| part.material(m));
                let density = material.map(|m| m.density).unwrap_or(0.0);
                let e = material.and_then(|m| m.e()).unwrap_or(0.0);
                let g = material.and_then(|m| m.shear_modulus()).unwrap_or(0.0);
                let data = [
                    properties.a.unwrap_or(0.0),
                    properties.ixx.unwrap_or(0.0),
                    properties.ixy.unwrap_or(0.0),
                    properties.iyy.unwrap_or(0.0),
                    properties.j.unwrap_or(0.0),
                ];
                format!(
                    "** Section: {}\n*Beam General Section, elset={}, section=GENERAL, density={}\n{}\n{}\n{}, {}\n",
                    section.name,
                    elset,
                    density,
                    join_values(&data, ", "),
                    orientation,
                    e,
                    g
                )
            }
            Shape::Truss { a } | Shape::Strut { a } | Shape::Tie { a } => format!(
                "** Section: {}\n*Solid Section, elset={}, material={}\n{},\n",
                section.name, elset, material, a
            ),
            Shape::Shell { t } => format!(
                "** Section: {}\n*Shell Section, elset={}, material={}\n{}, 5\n",
                section.name, elset, material, t
            ),
            Shape::Membrane { t } => format!(
                "** Section: {}\n*Membrane Section, elset={}, material={}\n{},\n",
                section.name, elset, material, t
            ),
            Shape::Solid => format!(
                "** Section: {}\n*Solid Section, elset={}, material={}\n,\n",
                section.name, elset, material
            ),
            Shape::Spring { stiffness } => {
                format!("** Section: {}\n*Spring, elset={}\n\n{}\n", section.name, elset, stiffness)
            }
            Shape::Mass { mass } => format!("** Section: {}\n*Mass, elset={}\n{},\n", section.name, elset, mass),
        }
    }

    /// `*Boundary` data lines of one condition on a set
    fn boundary_lines(set: &str, components: &Components) -> String {
        components
            .present()
            .map(|(dof, value)| {
                let c = dof.column();
                if value == 0.0 {
                    format!("{}, {}, {}\n", set, c, c)
                } else {
                    format!("{}, {}, {}, {}\n", set, c, c, value)
                }
            })
            .collect()
    }

    fn boundary(ctx: &JobContext<'_>, bc: &BoundaryCondition) -> FeaResult<String> {
        ctx.node_set(&bc.target)?;
        Ok(format!(
            "** Name: {} Type: Displacement/Rotation\n*Boundary\n{}",
            bc.name,
            Abaqus::boundary_lines(&bc.target, &bc.components)
        ))
    }

    fn step_block(&self, ctx: &JobContext<'_>, resolved: &ResolvedStep<'_>) -> FeaResult<String> {
        let step = resolved.step;
        let controls = &step.controls;
        let mut out = format!(
            "** STEP: {name}\n*Step, name={name}, nlgeom={nlgeom}, inc={inc}\n",
            name = step.name,
            nlgeom = if controls.nlgeom { "YES" } else { "NO" },
            inc = controls.max_increments
        );
        match step.kind {
            StepKind::Static => out.push_str(&format!(
                "*Static\n{}, 1, {}, {}\n",
                controls.initial_increment, controls.min_increment, controls.max_increment
            )),
            StepKind::Modal { modes } => out.push_str(&format!("*Frequency, eigensolver=LANCZOS\n{},\n", modes)),
        }

        out.push_str("**\n** DISPLACEMENTS\n**\n");
        for displacement in &resolved.displacements {
            out.push_str(&Abaqus::boundary(ctx, displacement)?);
        }

        out.push_str("**\n** LOADS\n**\n");
        for load in &resolved.loads {
            match load {
                Load::Point {
                    name,
                    target,
                    components,
                    ..
                } => {
                    ctx.node_set(target)?;
                    out.push_str(&format!("** Name: {} Type: Concentrated force\n*Cload\n", name));
                    for (dof, value) in components.present() {
                        out.push_str(&format!("{}, {}, {}\n", target, dof.column(), value));
                    }
                }
                Load::Gravity { name, g, direction } => {
                    out.push_str(&format!(
                        "** Name: {} Type: Gravity\n*Dload\n, GRAV, {}, {}\n",
                        name,
                        g,
                        join_values(direction, ", ")
                    ));
                }
            }
        }

        out.push_str("**\n** OUTPUT REQUESTS\n**\n");
        for output in &resolved.field_outputs {
            out.push_str(&format!("** Field output: {}\n*Output, field\n", output.name));
            if !output.node_fields.is_empty() {
                let fields: Vec<&str> = output.node_fields.iter().map(|f| f.code()).collect();
                out.push_str(&format!("*Node Output\n{}\n", fields.join(", ").to_uppercase()));
            }
            if !output.element_fields.is_empty() {
                let fields: Vec<&str> = output.element_fields.iter().map(|f| f.code()).collect();
                out.push_str(&format!(
                    "*Element Output, direction=YES\n{}\n",
                    fields.join(", ").to_uppercase()
                ));
            }
        }
        for output in &resolved.history_outputs {
            out.push_str(&format!("** History output: {}\n*Output, history, variable=PRESELECT\n", output.name));
        }

        out.push_str("*End Step\n**\n");
        Ok(out)
    }
}

impl BackendSerializer for Abaqus {
    fn name(&self) -> &'static str {
        "abaqus"
    }

    fn extension(&self) -> &'static str {
        "inp"
    }

    fn numbering(&self) -> Numbering {
        Numbering::PerPart
    }

    fn heading(&self, ctx: &JobContext<'_>) -> FeaResult<String> {
        Ok(format!(
            "** {model}\n*Heading\n** Job name: {job} Model name: {model}\n** Generated by: {generator}\n** Generated at: {stamp}\n*Preprint, echo=NO, model=NO, history=NO, contact=NO\n",
            model = ctx.model.name(),
            job = ctx.job_name(),
            generator = GENERATOR,
            stamp = ctx.stamp.to_rfc3339()
        ))
    }

    fn parts(&self, ctx: &JobContext<'_>) -> FeaResult<String> {
        let mut out = banner(COMMENT, JobSection::Parts.title());
        for part in ctx.model.parts() {
            out.push_str(&self.part_block(ctx, part)?);
        }
        Ok(out)
    }

    fn materials(&self, ctx: &JobContext<'_>) -> FeaResult<String> {
        let mut out = banner(COMMENT, JobSection::Materials.title());
        for material in ctx.model.materials() {
            out.push_str(&format!("*Material, name={}\n*Density\n{},\n", material.name, material.density));
            match &material.behavior {
                Behavior::ElasticIsotropic { e, v } => {
                    out.push_str(&format!("*Elastic\n{}, {}\n", e, v));
                }
                Behavior::ElasticPlastic { e, v, table } => {
                    out.push_str(&format!("*Elastic\n{}, {}\n*Plastic\n", e, v));
                    for [stress, strain] in table {
                        out.push_str(&format!("{}, {}\n", stress, strain));
                    }
                }
                Behavior::User { constants } => {
                    out.push_str(&format!("*User Material, constants={}\n", constants.len()));
                    for chunk in constants.chunks(8) {
                        out.push_str(&format!("{}\n", join_values(chunk, ", ")));
                    }
                }
            }
            out.push_str("**\n");
        }
        Ok(out)
    }

    fn interaction_properties(&self, ctx: &JobContext<'_>) -> FeaResult<String> {
        let mut out = banner(COMMENT, JobSection::InteractionProperties.title());
        for property in ctx.model.interaction_properties() {
            out.push_str(&format!(
                "*Surface Interaction, name={}\n*Friction\n{},\n*Surface Behavior, pressure-overclosure=HARD\n",
                property.name, property.friction
            ));
        }
        Ok(out)
    }

    fn interactions(&self, ctx: &JobContext<'_>) -> FeaResult<String> {
        let mut out = banner(COMMENT, JobSection::Interactions.title());
        for contact in ctx.model.contacts() {
            out.push_str(&format!(
                "** Interaction: {}\n*Contact Pair, interaction={}, type=SURFACE TO SURFACE\n{}, {}\n**\n",
                contact.name, contact.interaction, contact.slave, contact.master
            ));
        }
        Ok(out)
    }

    fn assembly(&self, ctx: &JobContext<'_>) -> FeaResult<String> {
        let mut out = banner(COMMENT, JobSection::Assembly.title());
        out.push_str(&format!("*Assembly, name={}\n**\n", ctx.model.name()));

        for instance in ctx.model.instances() {
            out.push_str(&format!(
                "*Instance, name={}, part={}\n*End Instance\n**\n",
                instance.name, instance.part
            ));
        }

        for (instance, group) in ctx.model.sets() {
            let part = ctx.model.instance_part(&instance.name)?;
            let (keyword, tags): (&str, Vec<usize>) = match group.kind {
                GroupKind::Nodes => ("Nset, nset", group.keys().iter().map(|&k| ctx.node_tag(part, k)).collect()),
                GroupKind::Elements => (
                    "Elset, elset",
                    group.keys().iter().map(|&k| ctx.element_tag(part, k)).collect(),
                ),
            };
            out.push_str(&format!(
                "*{}={}, instance={}\n{}\n",
                keyword,
                group.name,
                instance.name,
                wrap_numbers(&tags, PER_LINE)
            ));
        }

        for surface in ctx.model.surfaces() {
            let part = ctx.model.instance_part(&surface.instance)?;
            let mut by_face: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
            for face in &surface.faces {
                by_face
                    .entry(face.face.as_str())
                    .or_default()
                    .push(ctx.element_tag(part, face.element));
            }
            let mut data = String::new();
            for (face, tags) in &by_face {
                let elset = format!("_{}_{}", surface.name, face.to_uppercase());
                out.push_str(&format!(
                    "*Elset, elset={}, internal, instance={}\n{}\n",
                    elset,
                    surface.instance,
                    wrap_numbers(tags, PER_LINE)
                ));
                data.push_str(&format!("{}, {}\n", elset, face.to_uppercase()));
            }
            out.push_str(&format!("*Surface, type=ELEMENT, name={}\n{}", surface.name, data));
        }
        Ok(out)
    }

    fn constraints(&self, ctx: &JobContext<'_>) -> FeaResult<String> {
        let mut out = banner(COMMENT, JobSection::Constraints.title());
        for constraint in ctx.model.constraints() {
            ctx.node_set(&constraint.master)?;
            ctx.node_set(&constraint.slave)?;
            let keyword = match constraint.kind {
                ConstraintKind::Tie => "TIE",
                ConstraintKind::Pin => "PIN",
                ConstraintKind::Slider => "SLIDER",
            };
            out.push_str(&format!(
                "** Constraint: {}\n*MPC\n{}, {}, {}\n",
                constraint.name, keyword, constraint.slave, constraint.master
            ));
        }
        out.push_str("*End Assembly\n");
        Ok(out)
    }

    fn boundary_conditions(&self, ctx: &JobContext<'_>) -> FeaResult<String> {
        let mut out = banner(COMMENT, JobSection::BoundaryConditions.title());
        for bc in ctx.problem.bcs() {
            out.push_str(&Abaqus::boundary(ctx, bc)?);
        }
        Ok(out)
    }

    fn steps(&self, ctx: &JobContext<'_>) -> FeaResult<String> {
        let mut out = banner(COMMENT, JobSection::Steps.title());
        for step in ctx.problem.steps() {
            let resolved = ctx.resolve_step(step)?;
            out.push_str(&self.step_block(ctx, &resolved)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::generate_at;
    use crate::model::{Material, Model, Node, Section};
    use crate::problem::{Dof, FieldOutput, NodeField, Problem, Step, Support};
    use chrono::{TimeZone, Utc};

    fn stamp() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn cantilever() -> Problem {
        let mut model = Model::new("cantilever");
        let mut part = model.new_part("beam");
        for x in [0.0, 1.0, 2.0] {
            part.add_node(Node::new([x, 0.0, 0.0]));
        }
        let steel = Material::elastic_isotropic("steel", 210e9, 0.3, 7850.0);
        let section = Section::i_section("ipe", 0.1, 0.2, 0.005, 0.008, steel);
        part.add_element(Element::new(ElementKind::Beam, vec![0, 1], section).unwrap())
            .unwrap();
        part.add_element(Element::new(ElementKind::Beam, vec![1, 2], "ipe").unwrap())
            .unwrap();
        model.add_part(part);
        model.add_nodes_group("beam-1", "root", [0]).unwrap();
        model.add_nodes_group("beam-1", "tip", [2]).unwrap();

        let mut problem = Problem::new("cantilever-job", model);
        problem.add_bc(BoundaryCondition::new("fix", "root", Support::Fixed));
        problem.add_load(Load::point("push", "tip", Components::free().with(Dof::Z, -1000.0)));
        problem.add_field_output(FieldOutput::new("nodes", vec![NodeField::U, NodeField::Rf], vec![]));
        problem.add_step(
            Step::static_step("load")
                .with_load("push")
                .with_field_output("nodes")
                .with_factor(2.0),
        );
        problem
    }

    fn generate(problem: &Problem) -> String {
        generate_at(problem, &Abaqus, stamp()).unwrap()
    }

    #[test]
    fn test_sections_in_fixed_order() {
        let doc = generate(&cantilever());
        let markers = [
            "*Heading",
            "** PARTS",
            "** MATERIALS",
            "** INTERACTION PROPERTIES",
            "** INTERACTIONS",
            "** ASSEMBLY",
            "** CONSTRAINTS",
            "** BOUNDARY CONDITIONS",
            "** STEPS",
        ];
        let positions: Vec<usize> = markers.iter().map(|m| doc.find(m).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{:?}", positions);
    }

    #[test]
    fn test_generation_is_idempotent() {
        let problem = cantilever();
        assert_eq!(generate(&problem), generate(&problem));
    }

    #[test]
    fn test_part_block() {
        let doc = generate(&cantilever());
        assert!(doc.contains("*Part, name=beam\n*Node\n1, 0.000, 0.000, 0.000\n"));
        assert!(doc.contains("*Element, type=B31\n1, 1, 2\n2, 2, 3\n"));
        assert!(doc.contains("*Elset, elset=ipe-elset\n1, 2\n"));
        assert!(doc.contains("*Beam Section, elset=ipe-elset, material=steel, section=I\n0.1, 0.2, 0.1, 0.1, 0.008, 0.008, 0.005\n0, 0, -1\n"));
    }

    #[test]
    fn test_fixed_bc_emits_six_records() {
        let doc = generate(&cantilever());
        let block = "** Name: fix Type: Displacement/Rotation\n*Boundary\nroot, 1, 1\nroot, 2, 2\nroot, 3, 3\nroot, 4, 4\nroot, 5, 5\nroot, 6, 6\n";
        assert!(doc.contains(block));
    }

    #[test]
    fn test_general_bc_skips_absent_components() {
        let mut problem = cantilever();
        let components = Components {
            y: Some(0.0),
            xx: Some(0.0),
            yy: Some(0.0),
            zz: Some(0.0),
            ..Components::free()
        };
        problem.add_bc(BoundaryCondition::general("guide", "tip", components));
        let doc = generate(&problem);
        assert!(doc.contains("*Boundary\ntip, 2, 2\ntip, 4, 4\ntip, 5, 5\ntip, 6, 6\n"));
        assert!(!doc.contains("tip, 1, 1"));
        assert!(!doc.contains("tip, 3, 3"));
    }

    #[test]
    fn test_step_block_scales_loads() {
        let doc = generate(&cantilever());
        assert!(doc.contains("*Step, name=load, nlgeom=NO, inc=100\n*Static\n1, 1, 0.00001, 1\n"));
        assert!(doc.contains("*Cload\ntip, 3, -2000\n"));
        assert!(doc.contains("*Node Output\nU, RF\n"));
        assert!(doc.trim_end().ends_with("*End Step\n**"));
    }

    #[test]
    fn test_assembly_sets() {
        let doc = generate(&cantilever());
        assert!(doc.contains("*Instance, name=beam-1, part=beam\n*End Instance\n"));
        assert!(doc.contains("*Nset, nset=root, instance=beam-1\n1\n"));
        assert!(doc.contains("*Nset, nset=tip, instance=beam-1\n3\n"));
    }

    #[test]
    fn test_bc_on_part_group() {
        let mut problem = cantilever();
        problem
            .model
            .part_mut("beam")
            .unwrap()
            .add_nodes_group("base", [0])
            .unwrap();
        problem.add_bc(BoundaryCondition::new("pin", "base", Support::Pinned));
        let doc = generate(&problem);
        assert!(doc.contains("*Nset, nset=base, instance=beam-1\n1\n"));
        assert!(doc.contains("*Boundary\nbase, 1, 1\nbase, 2, 2\nbase, 3, 3\n"));
    }

    #[test]
    fn test_part_added_after_clashing_instance_is_placed() {
        let mut problem = cantilever();
        problem.model.add_instance("rod-1", "beam").unwrap();
        let mut rod = problem.model.new_part("rod");
        rod.add_node(Node::new([0.0, 1.0, 0.0]));
        problem.model.add_part(rod);
        let doc = generate(&problem);
        assert!(doc.contains("*Instance, name=rod-1, part=beam\n"));
        assert!(doc.contains("*Instance, name=rod-2, part=rod\n"));
    }

    #[test]
    fn test_unknown_bc_target_fails() {
        let mut problem = cantilever();
        problem.add_bc(BoundaryCondition::new("ghost", "nowhere", Support::Pinned));
        let err = generate_at(&problem, &Abaqus, stamp()).unwrap_err();
        assert_eq!(err.error_code(), "REGISTRATION_ERROR");
    }

    #[test]
    fn test_element_type_names() {
        let solid = Element::new(ElementKind::Solid, (0..8).collect(), "s").unwrap().with_reduced(true);
        assert_eq!(Abaqus::element_type(&solid), "C3D8R");
        let shell = Element::new(ElementKind::Shell, vec![0, 1, 2], "s").unwrap();
        assert_eq!(Abaqus::element_type(&shell), "S3");
        let custom = Element::new(ElementKind::Solid, (0..8).collect(), "s")
            .unwrap()
            .with_implementation("C3D8I");
        assert_eq!(Abaqus::element_type(&custom), "C3D8I");
        let tie = Element::new(ElementKind::Tie, vec![0, 1], "s").unwrap();
        assert_eq!(Abaqus::element_type(&tie), "T3D2");
    }
}
