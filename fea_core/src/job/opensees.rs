//! OpenSees Tcl command grammar.
//!
//! OpenSees has no parts or assembly: every node and element gets one
//! global tag, so each part may be placed by a single instance only. Sets
//! become Tcl lists of tags. Material tags follow the model's material
//! registry; `nDMaterial` tags are offset by [`ND_MATERIAL_OFFSET`].
//!
//! Tcl runs top to bottom, so material commands open the `PARTS` section
//! ahead of the elements that use them. `MATERIALS` lists the tag of each
//! material.

use crate::errors::{FeaError, FeaResult};
use crate::job::{
    banner, fmt_coord, join_values, BackendSerializer, JobContext, JobSection, Numbering, ResolvedStep,
    GENERATOR,
};
use crate::model::{ConstraintKind, Element, ElementKind, GroupKind, Material, Part, Section, Shape};
use crate::problem::{ElementField, Load, NodeField, StepKind};
use crate::registry::Named;

const COMMENT: &str = "#";

/// Offset between `uniaxialMaterial` and `nDMaterial` tags of one material
pub const ND_MATERIAL_OFFSET: usize = 1000;

pub struct OpenSees;

impl OpenSees {
    fn unsupported(feature: impl Into<String>) -> FeaError {
        FeaError::unsupported("opensees", feature)
    }

    fn element_material<'a>(ctx: &JobContext<'_>, part: &'a Part, section: &Section) -> FeaResult<&'a Material> {
        let name = section
            .material_name()
            .ok_or_else(|| OpenSees::unsupported(format!("section '{}' without material", section.name)))?;
        let material = part
            .material(name)
            .ok_or_else(|| FeaError::registration(Material::KIND, name, format!("part '{}'", part.name)))?;
        ctx.material_tag(name)?;
        Ok(material)
    }

    fn elastic(material: &Material) -> FeaResult<(f64, f64)> {
        match (material.e(), material.v()) {
            (Some(e), Some(v)) => Ok((e, v)),
            _ => Err(OpenSees::unsupported(format!(
                "material '{}' without elastic constants",
                material.name
            ))),
        }
    }

    /// Element command of one element; beam transformations and shell
    /// sections must already be declared.
    fn element_command(
        ctx: &JobContext<'_>,
        part: &Part,
        element: &Element,
        transforms: &[[f64; 3]],
    ) -> FeaResult<String> {
        let tag = ctx.element_tag(part, element.key);
        let nodes: Vec<String> = element
            .nodes
            .iter()
            .map(|&k| ctx.node_tag(part, k).to_string())
            .collect();
        let nodes = nodes.join(" ");
        let section = part
            .section(element.section_name())
            .ok_or_else(|| FeaError::registration(Section::KIND, element.section_name(), format!("part '{}'", part.name)))?;

        match element.kind {
            ElementKind::Beam => {
                let material = OpenSees::element_material(ctx, part, section)?;
                let (e, v) = OpenSees::elastic(material)?;
                let g = e / (2.0 * (1.0 + v));
                let props = section.properties;
                let (a, ixx, iyy, j) = match (props.a, props.ixx, props.iyy, props.j) {
                    (Some(a), Some(ixx), Some(iyy), Some(j)) => (a, ixx, iyy, j),
                    _ => {
                        return Err(OpenSees::unsupported(format!(
                            "beam section '{}' without complete properties",
                            section.name
                        )))
                    }
                };
                let orientation = element.orientation();
                let transf = transforms
                    .iter()
                    .position(|t| *t == orientation)
                    .map(|i| i + 1)
                    .unwrap_or(1);
                Ok(format!(
                    "element elasticBeamColumn {} {} {} {} {} {} {} {} {}\n",
                    tag, nodes, a, e, g, j, iyy, ixx, transf
                ))
            }
            ElementKind::Truss | ElementKind::Strut | ElementKind::Tie => {
                let material = OpenSees::element_material(ctx, part, section)?;
                let a = section.properties.a.unwrap_or(0.0);
                Ok(format!(
                    "element truss {} {} {} {}\n",
                    tag,
                    nodes,
                    a,
                    ctx.material_tag(&material.name)?
                ))
            }
            ElementKind::Shell => {
                let command = match element.nodes.len() {
                    3 => "ShellDKGT",
                    4 => "ShellMITC4",
                    n => return Err(OpenSees::unsupported(format!("{}-node shell", n))),
                };
                Ok(format!("element {} {} {} {}\n", command, tag, nodes, ctx.section_tag(&section.name)?))
            }
            ElementKind::Solid => {
                let command = match element.nodes.len() {
                    4 => "FourNodeTetrahedron",
                    8 => "stdBrick",
                    n => return Err(OpenSees::unsupported(format!("{}-node solid", n))),
                };
                let material = OpenSees::element_material(ctx, part, section)?;
                Ok(format!(
                    "element {} {} {} {}\n",
                    command,
                    tag,
                    nodes,
                    ctx.material_tag(&material.name)? + ND_MATERIAL_OFFSET
                ))
            }
            ElementKind::Mass => match section.shape {
                Shape::Mass { mass } => Ok(format!("mass {} {} {} {} 0 0 0\n", nodes, mass, mass, mass)),
                _ => Err(OpenSees::unsupported(format!("mass element with section '{}'", section.name))),
            },
            ElementKind::Spring | ElementKind::Membrane => Err(OpenSees::unsupported(format!("{} elements", element.kind))),
        }
    }

    fn part_block(&self, ctx: &JobContext<'_>, part: &Part, transforms: &mut Vec<[f64; 3]>) -> FeaResult<String> {
        let p = ctx.precision();
        let mut out = format!("# Part: {}\n", part.name);

        for node in part.nodes() {
            out.push_str(&format!(
                "node {} {} {} {}",
                ctx.node_tag(part, node.key),
                fmt_coord(node.xyz[0], p),
                fmt_coord(node.xyz[1], p),
                fmt_coord(node.xyz[2], p)
            ));
            if node.has_mass() {
                out.push_str(&format!(" -mass {} 0 0 0", join_values(&node.mass, " ")));
            }
            out.push('\n');
        }

        let mut shell_sections: Vec<&str> = Vec::new();
        for element in part.elements() {
            let section = part.section(element.section_name()).ok_or_else(|| {
                FeaError::registration(Section::KIND, element.section_name(), format!("part '{}'", part.name))
            })?;
            if element.kind == ElementKind::Beam && !transforms.contains(&element.orientation()) {
                transforms.push(element.orientation());
                out.push_str(&format!(
                    "geomTransf Linear {} {}\n",
                    transforms.len(),
                    join_values(&element.orientation(), " ")
                ));
            }
            if let Shape::Shell { t } = section.shape {
                if !shell_sections.contains(&section.name.as_str()) {
                    shell_sections.push(&section.name);
                    let material = OpenSees::element_material(ctx, part, section)?;
                    let (e, v) = OpenSees::elastic(material)?;
                    out.push_str(&format!(
                        "section ElasticMembranePlateSection {} {} {} {} {}\n",
                        ctx.section_tag(&section.name)?,
                        e,
                        v,
                        t,
                        material.density
                    ));
                }
            }
        }

        for element in part.elements() {
            out.push_str(&OpenSees::element_command(ctx, part, element, transforms)?);
        }
        Ok(out)
    }

    fn material_commands(ctx: &JobContext<'_>) -> FeaResult<String> {
        let mut out = String::new();
        for material in ctx.model.materials() {
            let tag = ctx.material_tag(&material.name)?;
            match OpenSees::elastic(material) {
                Ok((e, v)) => out.push_str(&format!(
                    "uniaxialMaterial Elastic {} {}\nnDMaterial ElasticIsotropic {} {} {} {}\n",
                    tag,
                    e,
                    tag + ND_MATERIAL_OFFSET,
                    e,
                    v,
                    material.density
                )),
                Err(_) => out.push_str(&format!("# {} has no elastic constants\n", material.name)),
            }
        }
        Ok(out)
    }

    fn node_tags_of(ctx: &JobContext<'_>, set: &str) -> FeaResult<Vec<usize>> {
        Ok(ctx.node_set(set)?.tags)
    }

    fn recorders(ctx: &JobContext<'_>, resolved: &ResolvedStep<'_>) -> String {
        let (nodes, elements) = ctx.model.instances().iter().fold((0, 0), |(n, e), instance| {
            match ctx.model.instance_part(&instance.name) {
                Ok(part) => (n + part.node_count(), e + part.element_count()),
                Err(_) => (n, e),
            }
        });
        let step = &resolved.step.name;
        let job = ctx.job_name();
        let mut out = String::new();

        for output in &resolved.field_outputs {
            for field in &output.node_fields {
                let (response, dofs) = match field {
                    NodeField::U => ("disp", "1 2 3"),
                    NodeField::Ur => ("disp", "4 5 6"),
                    NodeField::Rf => ("reaction", "1 2 3"),
                    NodeField::Rm => ("reaction", "4 5 6"),
                    NodeField::Cf | NodeField::Cm => {
                        tracing::debug!(field = field.code(), "no OpenSees node recorder for field");
                        continue;
                    }
                };
                if nodes > 0 {
                    out.push_str(&format!(
                        "recorder Node -file {}-{}-{}.out -time -nodeRange 1 {} -dof {} {}\n",
                        job, step, field, nodes, dofs, response
                    ));
                }
            }
            for field in &output.element_fields {
                let response = match field {
                    ElementField::Sf | ElementField::Sm => "force",
                    ElementField::S => "stresses",
                    ElementField::E => "strains",
                    _ => {
                        tracing::debug!(field = field.code(), "no OpenSees element recorder for field");
                        continue;
                    }
                };
                if elements > 0 {
                    out.push_str(&format!(
                        "recorder Element -file {}-{}-{}.out -time -eleRange 1 {} {}\n",
                        job, step, field, elements, response
                    ));
                }
            }
        }
        out
    }

    fn step_block(&self, ctx: &JobContext<'_>, index: usize, resolved: &ResolvedStep<'_>) -> FeaResult<String> {
        let step = resolved.step;
        let controls = &step.controls;
        let mut out = format!("# Step: {}\n", step.name);

        out.push_str(&format!("timeSeries Constant {}\npattern Plain {} {} {{\n", index, index, index));
        for load in &resolved.loads {
            match load {
                Load::Point { target, components, .. } => {
                    let values: Vec<f64> = crate::problem::Dof::ALL
                        .iter()
                        .map(|&dof| components.get(dof).unwrap_or(0.0))
                        .collect();
                    for tag in OpenSees::node_tags_of(ctx, target)? {
                        out.push_str(&format!("    load {} {}\n", tag, join_values(&values, " ")));
                    }
                }
                Load::Gravity { .. } => return Err(OpenSees::unsupported("gravity loads")),
            }
        }
        for displacement in &resolved.displacements {
            for tag in OpenSees::node_tags_of(ctx, &displacement.target)? {
                for (dof, value) in displacement.components.present() {
                    out.push_str(&format!("    sp {} {} {}\n", tag, dof.column(), value));
                }
            }
        }
        out.push_str("}\n");

        out.push_str(&OpenSees::recorders(ctx, resolved));

        match step.kind {
            StepKind::Static => {
                let increments = controls.increments.max(1);
                out.push_str(&format!(
                    "system ProfileSPD\nconstraints Transformation\nnumberer RCM\ntest NormUnbalance {} {} 5\nalgorithm NewtonLineSearch\nintegrator LoadControl {}\nanalysis Static\nanalyze {}\n",
                    controls.tolerance,
                    controls.iterations,
                    1.0 / increments as f64,
                    increments
                ));
            }
            StepKind::Modal { modes } => out.push_str(&format!("eigen {}\n", modes)),
        }
        out.push_str("loadConst -time 0.0\n");
        Ok(out)
    }
}

impl BackendSerializer for OpenSees {
    fn name(&self) -> &'static str {
        "opensees"
    }

    fn extension(&self) -> &'static str {
        "tcl"
    }

    fn numbering(&self) -> Numbering {
        Numbering::Global
    }

    fn heading(&self, ctx: &JobContext<'_>) -> FeaResult<String> {
        Ok(format!(
            "# {model}\n# Job name: {job} Model name: {model}\n# Generated by: {generator}\n# Generated at: {stamp}\nwipe\nmodel basic -ndm 3 -ndf 6\n",
            model = ctx.model.name(),
            job = ctx.job_name(),
            generator = GENERATOR,
            stamp = ctx.stamp.to_rfc3339()
        ))
    }

    fn parts(&self, ctx: &JobContext<'_>) -> FeaResult<String> {
        let mut out = banner(COMMENT, JobSection::Parts.title());
        out.push_str(&OpenSees::material_commands(ctx)?);
        let mut transforms = Vec::new();
        for (_, part) in ctx.placed_parts()? {
            out.push_str(&self.part_block(ctx, part, &mut transforms)?);
        }
        Ok(out)
    }

    fn materials(&self, ctx: &JobContext<'_>) -> FeaResult<String> {
        let mut out = banner(COMMENT, JobSection::Materials.title());
        for material in ctx.model.materials() {
            let tag = ctx.material_tag(&material.name)?;
            out.push_str(&format!(
                "# Material: {} uniaxial {} nD {}\n",
                material.name,
                tag,
                tag + ND_MATERIAL_OFFSET
            ));
        }
        Ok(out)
    }

    fn interaction_properties(&self, _ctx: &JobContext<'_>) -> FeaResult<String> {
        Ok(banner(COMMENT, JobSection::InteractionProperties.title()))
    }

    fn interactions(&self, ctx: &JobContext<'_>) -> FeaResult<String> {
        if !ctx.model.contacts().is_empty() {
            return Err(OpenSees::unsupported("contact interactions"));
        }
        Ok(banner(COMMENT, JobSection::Interactions.title()))
    }

    fn assembly(&self, ctx: &JobContext<'_>) -> FeaResult<String> {
        let mut out = banner(COMMENT, JobSection::Assembly.title());
        for instance in ctx.model.instances() {
            out.push_str(&format!("# Instance: {} of part {}\n", instance.name, instance.part));
            for group in ctx.model.instance_sets(instance) {
                let tags = match group.kind {
                    GroupKind::Nodes => ctx.node_set(&group.name)?.tags,
                    GroupKind::Elements => ctx.element_set(&group.name)?.tags,
                };
                let tags: Vec<String> = tags.iter().map(|t| t.to_string()).collect();
                out.push_str(&format!("set {} [list {}]\n", group.name, tags.join(" ")));
            }
        }
        Ok(out)
    }

    fn constraints(&self, ctx: &JobContext<'_>) -> FeaResult<String> {
        let mut out = banner(COMMENT, JobSection::Constraints.title());
        for constraint in ctx.model.constraints() {
            let dofs = match constraint.kind {
                ConstraintKind::Tie => "1 2 3 4 5 6",
                ConstraintKind::Pin => "1 2 3",
                ConstraintKind::Slider => return Err(OpenSees::unsupported("slider constraints")),
            };
            let master = OpenSees::node_tags_of(ctx, &constraint.master)?;
            let slave = OpenSees::node_tags_of(ctx, &constraint.slave)?;
            if master.len() != slave.len() {
                return Err(FeaError::invalid_input(
                    "constraint",
                    constraint.name.as_str(),
                    format!("Master set has {} nodes, slave set has {}", master.len(), slave.len()),
                ));
            }
            out.push_str(&format!("# Constraint: {}\n", constraint.name));
            for (m, s) in master.iter().zip(&slave) {
                out.push_str(&format!("equalDOF {} {} {}\n", m, s, dofs));
            }
        }
        Ok(out)
    }

    fn boundary_conditions(&self, ctx: &JobContext<'_>) -> FeaResult<String> {
        let mut out = banner(COMMENT, JobSection::BoundaryConditions.title());
        for bc in ctx.problem.bcs() {
            let flags: Vec<&str> = bc
                .components
                .activity()
                .iter()
                .map(|free| if *free { "0" } else { "1" })
                .collect();
            out.push_str(&format!("# Name: {}\n", bc.name));
            for tag in OpenSees::node_tags_of(ctx, &bc.target)? {
                out.push_str(&format!("fix {} {}\n", tag, flags.join(" ")));
            }
        }
        Ok(out)
    }

    fn steps(&self, ctx: &JobContext<'_>) -> FeaResult<String> {
        let mut out = banner(COMMENT, JobSection::Steps.title());
        for (i, step) in ctx.problem.steps().iter().enumerate() {
            let resolved = ctx.resolve_step(step)?;
            out.push_str(&self.step_block(ctx, i + 1, &resolved)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::generate_at;
    use crate::model::{ContactPair, InteractionProperty, Model, Node, Surface};
    use crate::problem::{BoundaryCondition, Components, Dof, FieldOutput, Problem, Step, Support};
    use chrono::{TimeZone, Utc};

    fn stamp() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn portal() -> Problem {
        let mut model = Model::new("portal");
        let mut part = model.new_part("frame");
        for xyz in [[0.0, 0.0, 0.0], [0.0, 0.0, 3.0], [4.0, 0.0, 3.0]] {
            part.add_node(Node::new(xyz));
        }
        let steel = Material::elastic_isotropic("steel", 200e9, 0.25, 7800.0);
        part.add_element(Element::new(ElementKind::Beam, vec![0, 1], Section::rectangular("rect", 0.2, 0.4, steel)).unwrap())
            .unwrap();
        part.add_element(Element::new(ElementKind::Truss, vec![1, 2], Section::truss("rod", 0.01, "steel")).unwrap())
            .unwrap();
        model.add_part(part);
        model.add_nodes_group("frame-1", "base", [0]).unwrap();
        model.add_nodes_group("frame-1", "top", [1, 2]).unwrap();

        let mut problem = Problem::new("portal-job", model);
        problem.add_bc(BoundaryCondition::new("fix", "base", Support::Fixed));
        problem.add_load(Load::point("wind", "top", Components::free().with(Dof::X, 500.0)));
        problem.add_field_output(FieldOutput::new("disp", vec![NodeField::U], vec![ElementField::Sf]));
        problem.add_step(Step::static_step("push").with_load("wind").with_field_output("disp"));
        problem
    }

    #[test]
    fn test_nodes_elements_and_transforms() {
        let doc = generate_at(&portal(), &OpenSees, stamp()).unwrap();
        assert!(doc.contains("model basic -ndm 3 -ndf 6\n"));
        assert!(doc.contains("node 2 0.000 0.000 3.000\n"));
        assert!(doc.contains("geomTransf Linear 1 0 0 -1\n"));
        assert!(doc.contains("element elasticBeamColumn 1 1 2 0.08"));
        assert!(doc.contains("element truss 2 2 3 0.01 1\n"));
        assert!(doc.contains("uniaxialMaterial Elastic 1 200000000000\n"));
        assert!(doc.contains("nDMaterial ElasticIsotropic 1001 200000000000 0.25 7800\n"));
        assert!(doc.contains("# Material: steel uniaxial 1 nD 1001\n"));
    }

    #[test]
    fn test_materials_declared_before_elements() {
        let doc = generate_at(&portal(), &OpenSees, stamp()).unwrap();
        let declared = doc.find("uniaxialMaterial Elastic 1 ").unwrap();
        let used = doc.find("element truss").unwrap();
        assert!(declared < used);
    }

    #[test]
    fn test_fix_flags_follow_components() {
        let mut problem = portal();
        let components = Components {
            y: Some(0.0),
            xx: Some(0.0),
            yy: Some(0.0),
            zz: Some(0.0),
            ..Components::free()
        };
        problem.add_bc(BoundaryCondition::general("guide", "top", components));
        let doc = generate_at(&problem, &OpenSees, stamp()).unwrap();
        assert!(doc.contains("fix 1 1 1 1 1 1 1\n"));
        assert!(doc.contains("fix 2 0 1 0 1 1 1\nfix 3 0 1 0 1 1 1\n"));
    }

    #[test]
    fn test_step_pattern_and_solver() {
        let doc = generate_at(&portal(), &OpenSees, stamp()).unwrap();
        assert!(doc.contains("timeSeries Constant 1\npattern Plain 1 1 {\n    load 2 500 0 0 0 0 0\n    load 3 500 0 0 0 0 0\n}\n"));
        assert!(doc.contains("recorder Node -file portal-job-push-u.out -time -nodeRange 1 3 -dof 1 2 3 disp\n"));
        assert!(doc.contains("recorder Element -file portal-job-push-sf.out -time -eleRange 1 2 force\n"));
        assert!(doc.contains("test NormUnbalance 0.01 100 5\n"));
        assert!(doc.contains("integrator LoadControl 1\nanalysis Static\nanalyze 1\n"));
    }

    #[test]
    fn test_sets_become_tcl_lists() {
        let doc = generate_at(&portal(), &OpenSees, stamp()).unwrap();
        assert!(doc.contains("set top [list 2 3]\n"));
    }

    #[test]
    fn test_part_groups_become_tcl_lists() {
        let mut problem = portal();
        problem
            .model
            .part_mut("frame")
            .unwrap()
            .add_nodes_group("apex", [2])
            .unwrap();
        problem.add_bc(BoundaryCondition::new("hold", "apex", Support::Pinned));
        let doc = generate_at(&problem, &OpenSees, stamp()).unwrap();
        assert!(doc.contains("set apex [list 3]\n"));
        assert!(doc.contains("fix 3 1 1 1 0 0 0\n"));
    }

    #[test]
    fn test_gravity_is_unsupported() {
        let mut problem = portal();
        problem.add_load(Load::gravity("g"));
        problem.add_step(Step::static_step("self-weight").with_load("g"));
        let err = generate_at(&problem, &OpenSees, stamp()).unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_FEATURE");
    }

    #[test]
    fn test_contacts_are_unsupported() {
        let mut problem = Problem::new("contact", Model::new("contact"));
        let mut part = problem.model.new_part("block");
        for i in 0..8 {
            let (x, y, z) = ((i & 1) as f64, ((i >> 1) & 1) as f64, (i >> 2) as f64);
            part.add_node(Node::new([x, y, z]));
        }
        let solid = Section::solid("solid", Material::elastic_isotropic("rubber", 1e6, 0.45, 1100.0));
        part.add_element(Element::new(ElementKind::Solid, (0..8).collect(), solid).unwrap())
            .unwrap();
        problem.model.add_part(part);
        problem
            .model
            .add_surface(Surface::new("top", "block-1").with_face(0, "s2"))
            .unwrap();
        problem
            .model
            .add_surface(Surface::new("bottom", "block-1").with_face(0, "s1"))
            .unwrap();
        problem
            .model
            .add_interaction_property(InteractionProperty::hard_contact("hard", 0.3));
        problem
            .model
            .add_contact(ContactPair::new("pair", "hard", "top", "bottom"))
            .unwrap();

        let err = generate_at(&problem, &OpenSees, stamp()).unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_FEATURE");
    }
}
