use anyhow::Context;
use bridge_core::{
    BridgeConfig, BridgeError, EnvValues, Pipeline, RawMessage, ResourceOutcome,
    ValidationOutcome,
};
use clap::{Parser, Subcommand, ValueEnum};
use fhir::{ResourceType, TargetResource};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "bridge")]
#[command(about = "HL7 v2 to FHIR bridge CLI")]
struct Cli {
    /// YAML configuration file (overrides BRIDGE_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a message and print the intermediate model
    Parse {
        /// Message file (reads stdin when omitted)
        file: Option<PathBuf>,
    },
    /// Validate a message and print the findings
    Validate {
        /// Message file (reads stdin when omitted)
        file: Option<PathBuf>,
        /// Which checks to run
        #[arg(long, value_enum, default_value_t = Phase::All)]
        phase: Phase,
    },
    /// Transform a message into FHIR resources
    Transform {
        /// Message file (reads stdin when omitted)
        file: Option<PathBuf>,
        /// Only map the first resource of this type
        #[arg(long)]
        resource: Option<ResourceType>,
    },
    /// Parse, validate and transform a message
    Process {
        /// Message file (reads stdin when omitted)
        file: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Phase {
    Structure,
    Business,
    All,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("bridge=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'bridge --help' for commands");
        return Ok(());
    };

    let mut env = EnvValues::from_process_env();
    if let Some(path) = cli.config {
        env.config_file = Some(path.to_string_lossy().into_owned());
    }
    let config = BridgeConfig::from_env_values(env).context("failed to load configuration")?;
    let pipeline = Pipeline::new(&config);

    match command {
        Commands::Parse { file } => {
            let text = read_message(file.as_deref())?;
            let (parsed, notices) = pipeline.parser().parse_with_notices(&text)?;
            for notice in &notices {
                tracing::warn!(location = %notice.location, "{}", notice.message);
            }
            print_json(&parsed)?;
        }
        Commands::Validate { file, phase } => {
            let text = read_message(file.as_deref())?;
            let validator = pipeline.validator();
            let outcome = match phase {
                Phase::Structure => validator.validate_structure(&text),
                Phase::Business => validator.validate_business_rules(&text),
                Phase::All => validator.validate(&text),
            };
            print_json(&outcome)?;
            ensure_valid(&outcome)?;
        }
        Commands::Transform { file, resource } => {
            let text = read_message(file.as_deref())?;
            let parsed = pipeline.parser().parse(&text)?;
            match resource {
                None => {
                    let report = pipeline.transformer().transform(&parsed);
                    print_json(&documents(&report.resources)?)?;
                }
                Some(resource_type) => {
                    match pipeline.transformer().transform_resource(&parsed, resource_type) {
                        ResourceOutcome::Mapped(resource) => print_json(&resource.document()?)?,
                        ResourceOutcome::NotApplicable => {
                            anyhow::bail!("message has nothing that maps to {resource_type}")
                        }
                        ResourceOutcome::Skipped(skip) => {
                            anyhow::bail!("{resource_type} could not be mapped: {}", skip.reason)
                        }
                    }
                }
            }
        }
        Commands::Process { file } => {
            let text = read_message(file.as_deref())?;
            match pipeline.process(&RawMessage::new(text)) {
                Ok(outcome) => print_json(&outcome)?,
                Err(BridgeError::Rejected { control_id, errors }) => {
                    for issue in &errors {
                        eprintln!("{issue}");
                    }
                    anyhow::bail!("message {control_id} rejected");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    Ok(())
}

fn read_message(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read message from stdin")?;
            Ok(text)
        }
    }
}

fn documents(resources: &[TargetResource]) -> anyhow::Result<Vec<serde_json::Value>> {
    Ok(resources
        .iter()
        .map(TargetResource::document)
        .collect::<Result<_, _>>()?)
}

fn ensure_valid(outcome: &ValidationOutcome) -> anyhow::Result<()> {
    if !outcome.is_valid() {
        anyhow::bail!(
            "message is invalid ({} error(s))",
            outcome.errors().len()
        );
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
