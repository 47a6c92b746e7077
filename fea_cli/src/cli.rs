//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// fea - build structural models and write solver input files
#[derive(Parser)]
#[command(name = "fea")]
#[command(version)]
#[command(about = "Structural FE model graph and solver input generator", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a sample portal-frame problem and save it
    Demo {
        /// Output problem file (.fea)
        out: PathBuf,
    },

    /// Print the model and problem summaries
    Summary {
        /// Problem file (.fea)
        problem: PathBuf,
    },

    /// Write the solver input file into <out>/<job>/
    Generate {
        /// Problem file (.fea)
        problem: PathBuf,

        /// Target solver (abaqus, opensees, ansys)
        #[arg(short, long, default_value = "abaqus")]
        backend: String,

        /// Base directory for job folders
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// Read results from <dir>/<job>/ and print them as JSON
    Results {
        /// Problem file (.fea)
        problem: PathBuf,

        /// Base directory holding the job folder
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },
}
