use anyhow::{anyhow, Error, Result};
use chrono::prelude::*;
use clap::{Parser, Subcommand};
use log::info;
use nanotemplate::config::Config;
use nanotemplate::instantiate::PubData;
use nanotemplate::schema::{form_fields, ValidationSchema};
use nanotemplate::Session;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "nanotemplate")]
#[command(about = "Inspect nanopublication templates and instantiate nanopublications")]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Verbose mode - sets the RUST_LOG level to info, defaults to warning level
    #[clap(long, short, action, default_value = "false", global = true)]
    verbose: bool,
    /// Debug mode - sets the RUST_LOG level to debug, defaults to warning level
    #[clap(long, action, default_value = "false", global = true)]
    debug: bool,
    /// Offline mode - never fetch documents or option lists from the web
    #[clap(long, short, action, default_value = "false", global = true)]
    offline: bool,
    /// JSON configuration file; built-in defaults are used when omitted
    #[clap(long, short, global = true)]
    config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Prints the version of the nanotemplate binary
    Version,
    /// Print the graph URIs and metadata of a nanopublication
    Inspect {
        /// File path or URL of the nanopublication
        source: String,
        /// Output JSON instead of text
        #[clap(long, action, default_value = "false")]
        json: bool,
    },
    /// Print the fields and statements of a template
    Fields {
        /// File path or URL of the template
        source: String,
        /// Output JSON instead of text
        #[clap(long, action, default_value = "false")]
        json: bool,
    },
    /// Print the form fields and validation rules of a template as JSON
    Schema {
        /// File path or URL of the template
        source: String,
    },
    /// Fill a template with values and print the unsigned nanopublication as TriG
    Apply {
        /// File path or URL of the template
        source: String,
        /// JSON object of field values, inline or as a path to a JSON file
        #[clap(long)]
        values: String,
        /// Display name of the publishing author
        #[clap(long)]
        name: String,
        /// ORCID of the publishing author (URI or bare identifier)
        #[clap(long)]
        orcid: Option<String>,
        #[clap(long)]
        email: Option<String>,
        /// License URI, defaults to the configured default license
        #[clap(long)]
        license: Option<String>,
        /// RFC 3339 creation timestamp, defaults to now
        #[clap(long)]
        timestamp: Option<String>,
        /// Overrides the configured base URI of the placeholder nanopublication URI
        #[clap(long)]
        base_uri: Option<String>,
        /// Mark the nanopublication as an example
        #[clap(long, action, default_value = "false")]
        example: bool,
        /// Output file path; if omitted, writes to STDOUT
        #[clap(long)]
        output: Option<PathBuf>,
    },
    /// Manage nanotemplate configuration.
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show {
        /// Output JSON instead of text
        #[clap(long, action, default_value = "false")]
        json: bool,
    },
    /// Write the effective configuration to a file
    Init {
        /// Where to write the configuration
        path: PathBuf,
        /// Overwrite the file if it already exists
        #[clap(long, default_value = "false")]
        overwrite: bool,
    },
}

pub fn run() -> Result<()> {
    nanotemplate::api::init_logging();
    let cmd = Cli::parse();
    execute(cmd)
}

pub fn run_from_args<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    nanotemplate::api::init_logging();
    let cmd = Cli::try_parse_from(args).map_err(Error::from)?;
    execute(cmd)
}

fn execute(cmd: Cli) -> Result<()> {
    // The RUST_LOG env var is set by `init_logging` if NANOTEMPLATE_LOG is present.
    // CLI flags for verbosity take precedence. If nothing is set, we default to "warn".
    if cmd.debug {
        std::env::set_var("RUST_LOG", "debug");
    } else if cmd.verbose {
        std::env::set_var("RUST_LOG", "info");
    } else if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "warn");
    }
    let _ = env_logger::try_init();

    let mut config = match &cmd.config {
        Some(path) => Config::from_file(path)
            .map_err(|e| anyhow!("Failed to read config {}: {}", path.display(), e))?,
        None => Config::default(),
    };
    if cmd.offline {
        config.offline = true;
    }
    if cmd.verbose || cmd.debug {
        config.print();
    }

    match cmd.command {
        Commands::Version => {
            println!(
                "nanotemplate {} @ {}",
                env!("CARGO_PKG_VERSION"),
                option_env!("GIT_HASH").unwrap_or("unknown")
            );
        }
        Commands::Inspect { source, json } => {
            let session = Session::new(config);
            let nanopub = session.load_nanopub(&source)?;
            if json {
                let out = serde_json::json!({
                    "graphs": nanopub.graphs(),
                    "metadata": nanopub.metadata(),
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                print!("{}", nanopub);
            }
        }
        Commands::Fields { source, json } => {
            let session = Session::new(config);
            let template = session.load_template(&source)?;
            if json {
                let out = serde_json::json!({
                    "metadata": template.metadata(),
                    "fields": template.fields(),
                    "statements": template.statements(),
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                print!("{}", template);
            }
        }
        Commands::Schema { source } => {
            let session = Session::new(config);
            let template = session.load_template(&source)?;
            let out = serde_json::json!({
                "template": template.uri(),
                "form": form_fields(template.fields()),
                "validation": ValidationSchema::from_fields(template.fields()),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Commands::Apply {
            source,
            values,
            name,
            orcid,
            email,
            license,
            timestamp,
            base_uri,
            example,
            output,
        } => {
            let input = read_values(&values)?;
            let timestamp = timestamp
                .map(|t| {
                    DateTime::parse_from_rfc3339(&t)
                        .map(|dt| dt.with_timezone(&Utc))
                        .map_err(|e| anyhow!("Invalid timestamp '{}': {}", t, e))
                })
                .transpose()?;
            let session = Session::new(config.clone());
            let template = session.load_template(&source)?;
            let values = ValidationSchema::from_fields(template.fields())
                .validate(&input)
                .map_err(|issues| {
                    for issue in &issues {
                        eprintln!("{}", issue);
                    }
                    anyhow!("{} invalid value(s) for template {}", issues.len(), template.uri())
                })?;
            let pub_data = PubData {
                orcid,
                name: Some(name),
                email,
                license,
                base_uri,
                timestamp,
                is_example: example,
            };
            let generated = template.instantiate(&values, &pub_data, &config)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &generated.trig)?;
                    info!("Wrote {} to {}", generated.uri(), path.display());
                }
                None => print!("{}", generated.trig),
            }
        }
        Commands::Config(config_cmd) => handle_config_command(config_cmd, &config)?,
    }

    Ok(())
}

fn handle_config_command(config_cmd: ConfigCommands, config: &Config) -> Result<()> {
    match config_cmd {
        ConfigCommands::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                config.print();
            }
        }
        ConfigCommands::Init { path, overwrite } => {
            if path.exists() && !overwrite {
                return Err(anyhow!(
                    "{} already exists. Use --overwrite to replace it.",
                    path.display()
                ));
            }
            config.save_to_file(&path)?;
            println!("Wrote configuration to {}", path.display());
        }
    }
    Ok(())
}

/// Values are given inline as a JSON object or as a path to a JSON file.
fn read_values(values: &str) -> Result<serde_json::Value> {
    let text = if values.trim_start().starts_with('{') {
        values.to_string()
    } else {
        std::fs::read_to_string(Path::new(values))
            .map_err(|e| anyhow!("Failed to read values file {}: {}", values, e))?
    };
    Ok(serde_json::from_str(&text)?)
}
