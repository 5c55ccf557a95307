use std::path::PathBuf;

use anyhow::Context;
use structopt::clap::AppSettings::*;
use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;

#[derive(Debug, StructOpt)]
enum Commands {
    #[structopt(name = "dump", about = "Print every entry of an archive")]
    Dump {
        #[structopt(
            name = "archive",
            parse(from_os_str),
            help = "Path to the archive (binary or .yaml)"
        )]
        path: PathBuf,
    },

    #[structopt(name = "info", about = "Show header details and size of an archive")]
    Info {
        #[structopt(name = "archive", parse(from_os_str), help = "Path to the binary archive")]
        path: PathBuf,
    },

    #[structopt(name = "to-yaml", about = "Convert a binary archive to YAML")]
    ToYaml {
        #[structopt(name = "archive", parse(from_os_str), help = "Path to the binary archive")]
        path: PathBuf,

        #[structopt(
            short,
            long,
            parse(from_os_str),
            help = "Write to this file instead of standard output"
        )]
        output: Option<PathBuf>,
    },

    #[structopt(name = "from-yaml", about = "Convert a YAML document to a binary archive")]
    FromYaml {
        #[structopt(name = "yaml", parse(from_os_str), help = "Path to the YAML document")]
        path: PathBuf,

        #[structopt(short, long, parse(from_os_str), help = "Path of the archive to write")]
        output: PathBuf,
    },

    #[structopt(name = "get", about = "Print a single entry")]
    Get {
        #[structopt(
            name = "archive",
            parse(from_os_str),
            help = "Path to the archive (binary or .yaml)"
        )]
        path: PathBuf,

        #[structopt(help = "Key to look up; `a/b` descends into nested archives")]
        key: String,
    },
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "ka",
    about = "Inspect and convert keyed archives.",
    settings = &[SubcommandRequiredElseHelp, DisableHelpSubcommand, VersionlessSubcommands]
)]
struct CliOpts {
    #[structopt(short, long, help = "Show debug output", global = true)]
    verbose: bool,

    #[structopt(subcommand)]
    cmd: Commands,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Dump { path } => {
            commands::dump(path.clone()).with_context(|| format!("dump of {}", path.display()))
        }
        Commands::Info { path } => {
            commands::info(path.clone()).with_context(|| format!("info for {}", path.display()))
        }
        Commands::ToYaml { path, output } => commands::to_yaml(path.clone(), output)
            .with_context(|| format!("converting {} to YAML", path.display())),
        Commands::FromYaml { path, output } => commands::from_yaml(path.clone(), output)
            .with_context(|| format!("converting {} from YAML", path.display())),
        Commands::Get { path, key } => {
            commands::get(path.clone(), key).with_context(|| format!("lookup in {}", path.display()))
        }
    }
}

fn main() {
    let opts = CliOpts::from_iter(wild::args_os());
    init_logging(opts.verbose);

    if let Err(e) = run(opts.cmd) {
        eprintln!("{:?}", e);
        std::process::exit(1);
    }
}
