mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{Context, EXIT_FAILURE, EXIT_LOCK_ERROR, EXIT_MANIFEST_ERROR};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "reqpin",
    version,
    about = "Resolve, validate and lock pinned requirements manifests"
)]
struct Cli {
    /// Path to the project config file (defaults to ./reqpin.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    /// Reject a package pinned twice within the same file.
    #[arg(long, default_value_t = false, global = true)]
    strict: bool,

    /// Compare package names literally instead of normalizing them.
    #[arg(long, default_value_t = false, global = true)]
    literal_names: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the resolved name==version mapping of a manifest tree.
    Resolve {
        /// Root manifest (defaults to the configured manifest).
        manifest: Option<PathBuf>,
        /// Annotate each pin with the file and line it came from.
        #[arg(long, default_value_t = false)]
        show_origin: bool,
        /// Also list pins that were overridden by later lines.
        #[arg(long, default_value_t = false)]
        show_overrides: bool,
    },
    /// Validate every line of a manifest tree without printing the mapping.
    Check {
        /// Root manifest (defaults to the configured manifest).
        manifest: Option<PathBuf>,
    },
    /// Resolve a manifest tree and write its lock file.
    Lock {
        /// Root manifest (defaults to the configured manifest).
        manifest: Option<PathBuf>,
        /// Lock file to write (defaults to the configured lock path).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Verify a lock file and check the manifest has not drifted from it.
    Verify {
        /// Root manifest (defaults to the configured manifest).
        manifest: Option<PathBuf>,
        /// Lock file to verify against (defaults to the configured lock path).
        #[arg(long)]
        lock: Option<PathBuf>,
    },
    /// Show pins added, removed or changed between two manifest trees.
    Diff {
        /// Older root manifest.
        old: PathBuf,
        /// Newer root manifest.
        new: PathBuf,
    },
    /// Write a default reqpin.toml.
    Init {
        /// Overwrite an existing config file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
    /// Generate man pages in the specified directory.
    ManPages {
        /// Output directory for man pages.
        #[arg(default_value = "man")]
        dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("REQPIN_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let loaded = if matches!(cli.command, Commands::Init { .. }) {
        Ok(Context::for_init(cli.config.as_deref(), cli.json))
    } else {
        Context::load(cli.config.as_deref(), cli.json, cli.strict, cli.literal_names)
    };
    let ctx = match loaded {
        Ok(ctx) => ctx,
        Err(msg) => {
            eprintln!("error: {msg}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    let result = match cli.command {
        Commands::Resolve {
            manifest,
            show_origin,
            show_overrides,
        } => commands::resolve::run(&ctx, manifest.as_deref(), show_origin, show_overrides),
        Commands::Check { manifest } => commands::check::run(&ctx, manifest.as_deref()),
        Commands::Lock { manifest, output } => {
            commands::lock::run(&ctx, manifest.as_deref(), output.as_deref())
        }
        Commands::Verify { manifest, lock } => {
            commands::verify::run(&ctx, manifest.as_deref(), lock.as_deref())
        }
        Commands::Diff { old, new } => commands::diff::run(&ctx, &old, &new),
        Commands::Init { force } => commands::init::run(&ctx, cli.config.as_deref(), force),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
        Commands::ManPages { dir } => commands::man_pages::run::<Cli>(&dir),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("manifest error:")
                || msg.starts_with("failed to read manifest")
            {
                EXIT_MANIFEST_ERROR
            } else if msg.starts_with("lock error:") {
                EXIT_LOCK_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
