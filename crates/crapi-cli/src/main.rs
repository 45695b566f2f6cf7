//! crapi CLI - offline translation between custom resources and API objects

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod error;
mod exit_codes;
mod util;

use util::VersionArgs;

#[derive(Parser)]
#[command(name = "crapi")]
#[command(version)]
#[command(about = "Translate Kubernetes custom resources to and from cloud API objects", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Translator configuration file (YAML)
    #[arg(long, global = true, env = "CRAPI_CONFIG")]
    config: Option<PathBuf>,
}

/// Options shared by every command
#[derive(Args)]
struct CommonArgs {
    /// CRD file(s), multi-document YAML allowed
    #[arg(long = "crds", required = true)]
    crds: Vec<PathBuf>,

    /// CRD version to translate (default: v1)
    #[arg(long, env = "CRAPI_CRD_VERSION")]
    crd_version: Option<String>,

    /// SDK version block of the resource, e.g. v20250312
    #[arg(long, env = "CRAPI_SDK_VERSION")]
    sdk_version: Option<String>,

    /// Output as JSON instead of YAML
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the reference mappings of a CRD
    Mappings {
        #[command(flatten)]
        common: CommonArgs,

        /// Kind of the CRD to inspect (needed when several are loaded)
        #[arg(short, long)]
        kind: Option<String>,
    },

    /// Build an API request from a custom resource
    ToApi {
        #[command(flatten)]
        common: CommonArgs,

        /// Custom resource file (YAML or JSON)
        #[arg(short = 'r', long)]
        resource: PathBuf,

        /// Referenced Kubernetes objects (multi-document YAML)
        #[arg(short = 'd', long = "deps")]
        deps: Vec<PathBuf>,
    },

    /// Write an API response into a custom resource
    FromApi {
        #[command(flatten)]
        common: CommonArgs,

        /// Custom resource file (YAML or JSON)
        #[arg(short = 'r', long)]
        resource: PathBuf,

        /// API response file (JSON or YAML)
        #[arg(long)]
        response: PathBuf,

        /// Existing Kubernetes objects (multi-document YAML)
        #[arg(short = 'd', long = "deps")]
        deps: Vec<PathBuf>,

        /// Drop fields the CRD does not declare
        #[arg(long)]
        prune: bool,
    },
}

impl CommonArgs {
    fn versions(&self, config: Option<PathBuf>) -> VersionArgs {
        VersionArgs {
            config,
            crd_version: self.crd_version.clone(),
            sdk_version: self.sdk_version.clone(),
        }
    }
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(debug)
        .init();
}

fn run(cli: Cli) -> error::Result<()> {
    match cli.command {
        Commands::Mappings { common, kind } => commands::mappings::run(
            &common.crds,
            kind.as_deref(),
            &common.versions(cli.config),
            common.json,
        ),

        Commands::ToApi {
            common,
            resource,
            deps,
        } => commands::to_api::run(
            &common.crds,
            &resource,
            &deps,
            &common.versions(cli.config),
            common.json,
        ),

        Commands::FromApi {
            common,
            resource,
            response,
            deps,
            prune,
        } => commands::from_api::run(
            &common.crds,
            &resource,
            &response,
            &deps,
            &common.versions(cli.config),
            prune,
            common.json,
        ),
    }
}

fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();
    let _ = miette::set_hook(Box::new(|_| {
        Box::new(miette::MietteHandlerOpts::new().wrap_lines(false).build())
    }));

    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(err) = run(cli) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}
