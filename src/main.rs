//! # isomesh
//!
//! A command-line tool that turns large delimited cell datasets into
//! iso-surface meshes, one per value range of an attribute.
//!
//! ## Usage
//!
//! ```bash
//! # Everything in one run: 10 ranges of Temperature, ~100k bins each, 8 threads
//! isomesh build cells.csv 10 Temperature 100000 8 X Y Z 0.1
//!
//! # Or phase by phase
//! isomesh ingest cells.csv
//! isomesh partition cells Temperature -n 10
//! isomesh mesh cells Temperature -r 100000 -i 0.1
//!
//! # Inspect
//! isomesh info cells
//! isomesh query cells 0 17 42 --columns Temperature,X,Y,Z
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
