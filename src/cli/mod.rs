use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod build;
mod info;
mod ingest;
mod mesh;
mod partition;
mod query;

mod config;

pub use config::Config;

/// isomesh - Iso-surface meshes from large cell datasets
#[derive(Parser)]
#[command(name = "isomesh")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Cache directory holding ingested datasets
    #[arg(long, global = true, default_value = "cache", value_name = "DIR")]
    cache: PathBuf,

    /// TOML config file with [pipeline] defaults
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Source parsing flags shared by `build` and `ingest`.
#[derive(clap::Args, Debug, Default)]
pub struct IngestArgs {
    /// Trailing header columns excluded from the value set (default: 2)
    #[arg(long)]
    trailing_columns: Option<usize>,

    /// Field delimiter, a single ASCII character (default: ',')
    #[arg(long)]
    delimiter: Option<char>,
}

/// Mesh tuning flags shared by `build` and `mesh`.
#[derive(clap::Args, Debug, Default)]
pub struct MeshArgs {
    /// Maximum vertices per mesh file (default: 65000)
    #[arg(long)]
    split_cap: Option<usize>,

    /// Skip partition files smaller than this many bytes (default: 0)
    #[arg(long)]
    min_partition_bytes: Option<u64>,

    /// Also write the density grid (.fara) and voxel list (.vox) per partition
    #[arg(long)]
    debug_grids: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest, partition and mesh a source file in one run
    Build {
        /// Delimited source file (first column is the cell number)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Number of value-range partitions per column
        #[arg(value_name = "DIVISIONS")]
        divisions: usize,

        /// Attribute whose partitions are meshed
        #[arg(value_name = "ATTRIBUTE")]
        attribute: String,

        /// Approximate number of voxel bins per partition
        #[arg(value_name = "RESOLUTION")]
        resolution: usize,

        /// Mesh worker threads
        #[arg(value_name = "THREADS")]
        threads: usize,

        /// X axis column
        #[arg(value_name = "X")]
        x: String,

        /// Y axis column
        #[arg(value_name = "Y")]
        y: String,

        /// Z axis column
        #[arg(value_name = "Z")]
        z: String,

        /// Iso-level in the normalized [0, 1] density field
        #[arg(value_name = "ISO_LEVEL")]
        iso_level: f32,

        /// Columns to partition (default: all; must include ATTRIBUTE)
        #[arg(value_name = "SPLIT")]
        split: Vec<String>,

        /// Columns partitioned concurrently (default: 2)
        #[arg(long)]
        partition_threads: Option<usize>,

        #[command(flatten)]
        ingest: IngestArgs,

        #[command(flatten)]
        mesh: MeshArgs,
    },

    /// Ingest a source file into the cache
    Ingest {
        /// Delimited source file (first column is the cell number)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[command(flatten)]
        ingest: IngestArgs,
    },

    /// Split columns of an ingested dataset into value-range partitions
    Partition {
        /// Dataset name in the cache
        #[arg(value_name = "DATASET")]
        dataset: String,

        /// Columns to partition (default: all)
        #[arg(value_name = "COLUMNS")]
        columns: Vec<String>,

        /// Number of partitions per column (default: 10)
        #[arg(short = 'n', long)]
        divisions: Option<usize>,

        /// Columns partitioned concurrently (default: 2)
        #[arg(short = 't', long)]
        threads: Option<usize>,
    },

    /// Build meshes from the partitions of one attribute
    Mesh {
        /// Dataset name in the cache
        #[arg(value_name = "DATASET")]
        dataset: String,

        /// Partitioned attribute to mesh
        #[arg(value_name = "ATTRIBUTE")]
        attribute: String,

        /// Axis columns
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], default_values = ["X", "Y", "Z"])]
        axes: Vec<String>,

        /// Approximate number of voxel bins per partition (default: 100000)
        #[arg(short = 'r', long)]
        resolution: Option<usize>,

        /// Worker threads (default: available parallelism)
        #[arg(short = 't', long)]
        threads: Option<usize>,

        /// Iso-level in the normalized [0, 1] density field (default: 0)
        #[arg(short = 'i', long)]
        iso_level: Option<f32>,

        #[command(flatten)]
        mesh: MeshArgs,
    },

    /// Print full rows for cell ids as JSON
    Query {
        /// Dataset name in the cache
        #[arg(value_name = "DATASET")]
        dataset: String,

        /// Cell ids (row numbers)
        #[arg(value_name = "CELL_ID", required = true)]
        ids: Vec<u32>,

        /// Restrict output to these columns (comma separated)
        #[arg(short, long, value_delimiter = ',')]
        columns: Vec<String>,
    },

    /// Display information about a cached dataset
    Info {
        /// Dataset name in the cache (omit to list datasets)
        #[arg(value_name = "DATASET")]
        dataset: Option<String>,
    },
}

impl Cli {
    /// Get verbosity level
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

/// Initialize logging based on verbosity level.
pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

/// Run the selected subcommand.
pub fn dispatch(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let settings = config.pipeline;
    let cache = cli.cache;

    match cli.command {
        Commands::Build {
            input,
            divisions,
            attribute,
            resolution,
            threads,
            x,
            y,
            z,
            iso_level,
            split,
            partition_threads,
            ingest: ingest_args,
            mesh: mesh_args,
        } => build::run(
            cache,
            build::BuildArgs {
                input,
                divisions,
                attribute,
                resolution,
                threads,
                axes: [x, y, z],
                iso_level,
                split,
                partition_threads,
            },
            ingest_args,
            mesh_args,
            &settings,
        ),
        Commands::Ingest {
            input,
            ingest: ingest_args,
        } => ingest::run(cache, input, ingest_args, &settings),
        Commands::Partition {
            dataset,
            columns,
            divisions,
            threads,
        } => partition::run(cache, dataset, columns, divisions, threads, &settings),
        Commands::Mesh {
            dataset,
            attribute,
            axes,
            resolution,
            threads,
            iso_level,
            mesh: mesh_args,
        } => mesh::run(
            cache,
            dataset,
            mesh::MeshRequest {
                attribute,
                axes,
                resolution,
                threads,
                iso_level,
            },
            mesh_args,
            &settings,
        ),
        Commands::Query {
            dataset,
            ids,
            columns,
        } => query::run(cache, dataset, ids, columns),
        Commands::Info { dataset } => info::run(cache, dataset),
    }
}
