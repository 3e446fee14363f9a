use clap::{Parser, Subcommand};
use pubgen::citation::BibtexParser;
use pubgen::{config, output, pipeline};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pubgen")]
#[command(about = "Convert a publication list into front-matter pages")]
#[command(long_about = "\
Convert a publication list into front-matter pages

Reads a JSON, CSV, TSV or BibTeX file and writes one Markdown file per
publication, containing only a YAML front-matter block:

  ---
  title: 'Paper Title Number 1'
  collection: 'publications'
  permalink: '/publications/2009-10-01-paper-title-number-1'
  date: 2009-10-01
  venue: 'Journal 1'
  ---

File names are <date>-<slug>.md. JSON and table records supply `date` and
`urlslug`; BibTeX entries use the year and a slug derived from the title.

Settings come from pubgen.toml (if present), then from command-line flags.
Run 'pubgen gen-config' to generate a documented pubgen.toml.")]
#[command(version)]
struct Cli {
    /// Config file (missing file means defaults)
    #[arg(long, default_value = "pubgen.toml", global = true)]
    config: PathBuf,

    /// Publication list to read (overrides `input`)
    #[arg(long, global = true)]
    input: Option<PathBuf>,

    /// Directory for the generated pages (overrides `output_dir`)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Stop at the first record with a missing field
    #[arg(long, global = true, overrides_with = "no_strict")]
    strict: bool,

    /// Skip records with missing fields, even if the config sets `strict`
    #[arg(long, global = true, overrides_with = "strict")]
    no_strict: bool,

    /// Log progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write one page per publication
    Build,
    /// Load and render everything without writing
    Check,
    /// Print a stock pubgen.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Build => {
            let config = config::load_config(&cli.config, cli_overrides(&cli))?;
            init_thread_pool(&config.processing);
            let report = pipeline::run(&config, &BibtexParser)?;
            output::print_build_output(&report);
        }
        Command::Check => {
            let config = config::load_config(&cli.config, cli_overrides(&cli))?;
            init_thread_pool(&config.processing);
            let plan = pipeline::check(&config, &BibtexParser)?;
            output::print_check_output(&plan);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Command-line flags as a TOML layer over the config file.
fn cli_overrides(cli: &Cli) -> Option<toml::Value> {
    let mut table = toml::map::Map::new();
    if let Some(input) = &cli.input {
        table.insert(
            "input".to_string(),
            toml::Value::String(input.display().to_string()),
        );
    }
    if let Some(output) = &cli.output {
        table.insert(
            "output_dir".to_string(),
            toml::Value::String(output.display().to_string()),
        );
    }
    if cli.strict || cli.no_strict {
        table.insert("strict".to_string(), toml::Value::Boolean(cli.strict));
    }
    (!table.is_empty()).then_some(toml::Value::Table(table))
}

/// Log to stderr. `RUST_LOG` wins; otherwise warnings, or debug with `-v`.
fn init_logging(verbose: bool) {
    let default = if verbose { "pubgen=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the config can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
