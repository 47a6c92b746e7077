//! # fea CLI
//!
//! Thin command-line driver over `fea_core`: save a sample problem, print
//! summaries, write solver input files, and read back results.
//!
//! Logging goes through `tracing`; set `RUST_LOG=debug` to see per-section
//! generation detail.

mod cli;

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use fea_core::errors::ResultsError;
use fea_core::file_io::{load_problem_with_lock_check, save_problem, write_input_file};
use fea_core::job::backend_by_name;
use fea_core::model::{Element, ElementKind, Material, Model, Node, Section};
use fea_core::problem::{
    BoundaryCondition, Components, Dof, ElementField, FieldOutput, HistoryOutput, Load, NodeField, Problem, Step,
    Support,
};
use fea_core::results::read_results;
use fea_core::settings::ModelSettings;

use cli::{Cli, Commands};

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Demo { out } => {
            let problem = demo_problem()?;
            save_problem(&problem, &out).with_context(|| format!("saving {}", out.display()))?;
            println!("Saved demo problem '{}' to {}", problem.name, out.display());
        }
        Commands::Summary { problem } => {
            let problem = open(&problem)?;
            println!("{}", problem.summary());
        }
        Commands::Generate { problem, backend, out } => {
            let problem = open(&problem)?;
            let backend = backend_by_name(&backend)?;
            tracing::debug!(backend = backend.name(), "backend selected");
            let paths = write_input_file(&problem, backend, &out)
                .with_context(|| format!("generating {} input for '{}'", backend.name(), problem.name))?;
            println!("{}", paths.document.display());
        }
        Commands::Results { problem, dir } => {
            let problem = open(&problem)?;
            let working_dir = dir.join(&problem.name);
            match read_results(&working_dir, &problem.name) {
                Ok(results) => println!("{}", serde_json::to_string_pretty(&results)?),
                Err(ResultsError::NotProduced { path }) => {
                    println!("No results: the solver produced nothing at {}", path);
                }
                Err(e) => return Err(e).context("results are unreadable"),
            }
        }
    }
    Ok(())
}

fn open(path: &Path) -> Result<Problem> {
    let (problem, lock) =
        load_problem_with_lock_check(path).with_context(|| format!("loading {}", path.display()))?;
    if let Some(holder) = lock {
        tracing::warn!(
            user = %holder.user_id,
            machine = %holder.machine,
            since = %holder.locked_at,
            "problem is locked by another user; reading anyway"
        );
    }
    Ok(problem)
}

/// Two-column portal frame, fixed at the base, pushed sideways at the eaves.
fn demo_problem() -> Result<Problem> {
    let settings = ModelSettings::from_env()?;
    let mut model = Model::new("portal").with_settings(settings).with_description("Demo portal frame");

    let mut frame = model.new_part("frame");
    frame.add_nodes([
        Node::new([0.0, 0.0, 0.0]),
        Node::new([0.0, 0.0, 4.0]),
        Node::new([6.0, 0.0, 4.0]),
        Node::new([6.0, 0.0, 0.0]),
    ]);
    let steel = Material::elastic_isotropic("S355", 210e9, 0.3, 7850.0);
    frame.add_elements([
        Element::new(ElementKind::Beam, vec![0, 1], Section::i_section("HEA200", 0.2, 0.19, 0.0065, 0.01, steel))?,
        Element::new(ElementKind::Beam, vec![1, 2], Section::i_section("IPE300", 0.15, 0.3, 0.0071, 0.0107, "S355"))?,
        Element::new(ElementKind::Beam, vec![3, 2], "HEA200")?,
    ])?;
    model.add_part(frame);
    model.add_nodes_group("frame-1", "supports", [0, 3])?;
    model.add_nodes_group("frame-1", "eaves", [1, 2])?;

    let mut problem = Problem::new("portal-static", model).with_description("Lateral push on a portal frame");
    problem.add_bc(BoundaryCondition::new("base", "supports", Support::Fixed));
    problem.add_load(Load::point("wind", "eaves", Components::free().with(Dof::X, 10_000.0)));
    problem.add_field_output(FieldOutput::new(
        "main",
        vec![NodeField::U, NodeField::Rf],
        vec![ElementField::Sf, ElementField::Sm],
    ));
    problem.add_history_output(HistoryOutput::new("energy"));
    problem.add_step(
        Step::static_step("wind")
            .with_load("wind")
            .with_field_output("main")
            .with_history_output("energy"),
    );
    Ok(problem)
}
