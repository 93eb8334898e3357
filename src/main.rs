use anyhow::Result;
use clap::Parser;
use layerpack::commands::{self, Overrides};
use std::path::PathBuf;

/// layerpack - serverless layer packager
///
/// Installs the dependencies listed in a requirements file into a staging
/// directory laid out the way the function runtime expects
/// (python/lib/pythonX.Y/site-packages), then zips it.
///
/// Examples:
///   layerpack build                          # Build python.zip in the current directory
///   layerpack build --python-version 3.11    # Target a different runtime
///   layerpack clean                          # Remove staging left by a failed build
#[derive(Parser, Debug)]
#[command(author, version = env!("LAYERPACK_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project directory holding the requirements file (defaults to the current directory)
    #[arg(
        long = "project-dir",
        short = 'C',
        env = "LAYERPACK_PROJECT_DIR",
        value_name = "PATH",
        global = true
    )]
    pub project_dir: Option<PathBuf>,

    /// JSON file with build settings
    #[arg(long, env = "LAYERPACK_CONFIG", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Install dependencies and write the layer archive
    Build(BuildArgs),

    /// Remove the staging directory
    Clean,
}

#[derive(clap::Args, Debug)]
pub struct BuildArgs {
    /// Python interpreter used to run pip
    #[arg(long, env = "LAYERPACK_PYTHON", value_name = "EXE")]
    pub python: Option<String>,

    /// Target Python version, e.g. 3.12
    #[arg(long = "python-version", value_name = "VERSION")]
    pub python_version: Option<String>,

    /// Platform tag for prebuilt wheels, e.g. manylinux2014_aarch64
    #[arg(long, value_name = "TAG")]
    pub platform: Option<String>,

    /// Archive file name
    #[arg(long, short = 'o', value_name = "NAME")]
    pub output: Option<String>,

    /// Keep the staging directory after archiving
    #[arg(long = "keep-staging")]
    pub keep_staging: bool,
}

impl From<BuildArgs> for Overrides {
    fn from(args: BuildArgs) -> Self {
        Overrides {
            python: args.python,
            python_version: args.python_version,
            platform: args.platform,
            archive_name: args.output,
            keep_staging: args.keep_staging,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = layerpack::runtime::RealRuntime;

    match cli.command {
        Commands::Build(args) => {
            commands::build(runtime, cli.project_dir, cli.config, args.into())?;
        }
        Commands::Clean => commands::clean(runtime, cli.project_dir, cli.config)?,
    }
    Ok(())
}
