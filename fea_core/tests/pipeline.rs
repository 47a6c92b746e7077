//! End-to-end: build a model, generate documents for every backend, run a
//! fake solver, read the results back.

use std::cell::RefCell;
use std::env::temp_dir;
use std::fs;
use std::path::PathBuf;

use approx::assert_relative_eq;
use chrono::{TimeZone, Utc};

use fea_core::file_io::{load_problem, save_problem};
use fea_core::job::{backends, generate_at, JobHandle, JobSection, LaunchStatus, SolverLauncher};
use fea_core::model::{Element, ElementKind, Material, Model, Node, Section};
use fea_core::problem::{
    BoundaryCondition, Components, Dof, ElementField, FieldOutput, Load, NodeField, Problem, Step, Support,
};
use fea_core::results::FieldValue;

fn portal_frame() -> Problem {
    let mut model = Model::new("portal").with_description("two columns and a beam");
    let mut frame = model.new_part("frame");
    frame.add_nodes([
        Node::new([0.0, 0.0, 0.0]),
        Node::new([0.0, 0.0, 4.0]),
        Node::new([6.0, 0.0, 4.0]),
        Node::new([6.0, 0.0, 0.0]),
    ]);
    let steel = Material::elastic_isotropic("S355", 210e9, 0.3, 7850.0);
    let column = Section::i_section("HEA200", 0.2, 0.19, 0.0065, 0.01, steel);
    let beam = Section::i_section("IPE300", 0.15, 0.3, 0.0071, 0.0107, "S355");
    frame
        .add_elements([
            Element::new(ElementKind::Beam, vec![0, 1], column).unwrap(),
            Element::new(ElementKind::Beam, vec![1, 2], beam).unwrap(),
            Element::new(ElementKind::Beam, vec![3, 2], "HEA200").unwrap(),
        ])
        .unwrap();
    model.add_part(frame);
    model.add_nodes_group("frame-1", "supports", [0, 3]).unwrap();
    model.add_nodes_group("frame-1", "eaves", [1]).unwrap();
    model.add_elements_group("frame-1", "rafter", [1]).unwrap();

    let mut problem = Problem::new("portal-static", model);
    problem.add_bc(BoundaryCondition::new("base", "supports", Support::Fixed));
    problem.add_load(Load::point("wind", "eaves", Components::free().with(Dof::X, 12_000.0)));
    problem.add_field_output(FieldOutput::new(
        "main",
        vec![NodeField::U, NodeField::Rf],
        vec![ElementField::Sf],
    ));
    problem.add_step(
        Step::static_step("wind")
            .with_load("wind")
            .with_field_output("main"),
    );
    problem
}

struct FakeSolver {
    seen: RefCell<Vec<JobHandle>>,
}

impl SolverLauncher for FakeSolver {
    fn launch(&self, job: &JobHandle) -> LaunchStatus {
        self.seen.borrow_mut().push(job.clone());
        let results = r#"{
            "wind": {
                "nodal": {"u": {"1": [0.012, 0.0, 0.0], "2": [0.011, 0.0, -0.001]}},
                "element": {"sf": {"1": {"magnitude": 5400.0}}}
            }
        }"#;
        let info = r#"{"wind": {"increments": 1, "converged": true}}"#;
        let dir = &job.working_dir;
        if fs::write(dir.join(format!("{}-results.json", job.job_name)), results).is_err()
            || fs::write(dir.join(format!("{}-info.json", job.job_name)), info).is_err()
        {
            return LaunchStatus::Failed {
                reason: "could not write results".into(),
            };
        }
        LaunchStatus::Completed
    }
}

fn scratch(name: &str) -> PathBuf {
    temp_dir().join(format!("fea_pipeline_{}_{}", name, std::process::id()))
}

#[test]
fn test_every_backend_renders_sections_in_order() {
    let problem = portal_frame();
    let stamp = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

    for backend in backends() {
        let document = generate_at(&problem, backend, stamp).unwrap();
        let mut last = 0;
        for section in JobSection::ORDER.iter().skip(1) {
            let position = document
                .find(section.title())
                .unwrap_or_else(|| panic!("{} lacks {}", backend.name(), section.title()));
            assert!(position > last, "{}: {} out of order", backend.name(), section);
            last = position;
        }
        assert_eq!(document, generate_at(&problem, backend, stamp).unwrap());
    }
}

#[test]
fn test_stamp_only_changes_header() {
    let problem = portal_frame();
    let a = generate_at(&problem, backends()[0], Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()).unwrap();
    let b = generate_at(&problem, backends()[0], Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap()).unwrap();
    let differing: Vec<(&str, &str)> = a.lines().zip(b.lines()).filter(|(x, y)| x != y).collect();
    assert_eq!(differing.len(), 1);
    assert!(differing[0].0.starts_with("** Generated at:"));
}

#[test]
fn test_analyse_round_trip_through_disk() {
    let base = scratch("analyse");
    let mut problem = portal_frame();
    let solver = FakeSolver {
        seen: RefCell::new(Vec::new()),
    };

    let status = problem.analyse(backends()[0], &solver, &base).unwrap();
    assert_eq!(status, LaunchStatus::Completed);

    let handle = solver.seen.borrow()[0].clone();
    assert_eq!(handle.job_name, "portal-static");
    assert_eq!(handle.document, base.join("portal-static").join("portal-static.inp"));

    match &problem.nodal_results("wind", "u").unwrap()[&1] {
        FieldValue::Components(values) => assert_relative_eq!(values[0], 0.012),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(problem.element_results("wind", "sf").unwrap()[&1].magnitude(), Some(5400.0));
    assert_eq!(
        problem.results().unwrap().steps["wind"].info["converged"],
        serde_json::json!(true)
    );

    let file = base.join("portal.fea");
    save_problem(&problem, &file).unwrap();
    let reloaded = load_problem(&file).unwrap();
    assert_eq!(reloaded.results(), problem.results());
    assert_eq!(reloaded.model.sections().len(), 2);

    let _ = fs::remove_dir_all(&base);
}

#[test]
fn test_shared_material_registered_once() {
    let problem = portal_frame();
    let frame = problem.model.part("frame").unwrap();
    assert_eq!(frame.materials().len(), 1);
    assert_eq!(frame.sections().len(), 2);
    assert_eq!(frame.element_count(), 3);
}
