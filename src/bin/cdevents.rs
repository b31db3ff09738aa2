//! CDEvents CLI
//!
//! Inspects event types, the embedded schema DB, and event documents.

use std::path::PathBuf;

use anyhow::{bail, Context as _};
use cdevents_sdk::{CdEvent, EventFactory, EventType, SchemaResolver, SdkConfig, SPEC_VERSION};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cdevents")]
#[command(about = "Inspect, create and validate CDEvents")]
struct Cli {
    /// Config file (defaults to cdevents.toml lookup)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an event type string
    ParseType {
        /// e.g. dev.cdevents.build.started.0.2.0
        event_type: String,
    },

    /// Check whether two event types are compatible
    Compat { a: String, b: String },

    /// Print the schema for a spec version, subject and predicate
    Schema {
        subject: String,
        predicate: String,
        #[arg(long = "spec", default_value = SPEC_VERSION)]
        spec_version: String,
    },

    /// List the embedded schema DB
    Schemas,

    /// Decode and validate an event document
    Validate {
        /// JSON file containing one event
        file: PathBuf,
        /// Skip schema validation after decoding
        #[arg(long)]
        no_schema: bool,
    },

    /// Emit a fresh event of a standard kind
    New {
        subject: String,
        predicate: String,
        /// Subject id
        #[arg(long)]
        id: String,
        /// Overrides the configured default source
        #[arg(long)]
        source: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = SdkConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    let resolver = SchemaResolver::global();

    match cli.command {
        Commands::ParseType { event_type } => {
            let t = EventType::parse(&event_type)?;
            println!("root:      {}", t.root.as_str());
            if let Some(tool) = &t.tool {
                println!("tool:      {}", tool);
            }
            println!("subject:   {}", t.subject);
            println!("predicate: {}", t.predicate);
            println!("version:   {}", t.version);
            println!("short:     {}", t.short());
            match CdEvent::find_known(&t.subject, &t.predicate) {
                Some(known) if !t.is_custom() => {
                    let verdict = if known.is_compatible(&t) { "compatible" } else { "incompatible" };
                    println!("sdk:       {} ({})", known.version, verdict);
                }
                _ => println!("sdk:       not a compiled-in kind"),
            }
            Ok(())
        }

        Commands::Compat { a, b } => {
            let a = EventType::parse(&a)?;
            let b = EventType::parse(&b)?;
            if a.is_compatible(&b) {
                println!("✅ {} and {} are compatible", a, b);
                Ok(())
            } else {
                bail!("{} and {} are not compatible", a, b)
            }
        }

        Commands::Schema { subject, predicate, spec_version } => {
            let doc = resolver.resolve(&spec_version, &subject, &predicate)?;
            println!("# {}", doc.url());
            println!("# sha256 {}", doc.checksum());
            println!("{}", doc.source());
            Ok(())
        }

        Commands::Schemas => {
            for doc in resolver.documents() {
                println!("{}  {}", doc.checksum(), doc.url());
            }
            println!();
            println!("{} documents, bundle {}", resolver.len(), resolver.bundle_checksum());
            Ok(())
        }

        Commands::Validate { file, no_schema } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let event = CdEvent::from_json(&raw)?;
            println!("🔍 {} ({})", event.event_type(), event.id());

            if config.consumer.validate_on_parse && !no_schema {
                event.validate(resolver)?;
                println!("✅ valid against {}", event.schema_url());
            } else {
                println!("✅ decoded (schema validation skipped)");
            }
            Ok(())
        }

        Commands::New { subject, predicate, id, source } => {
            let mut factory = EventFactory::from_config(&config);
            if let Some(source) = source {
                factory = factory.with_source(source);
            }
            let mut event = CdEvent::create(&factory, &subject, &predicate)?;
            event.set_subject_id(id);
            println!("{}", serde_json::to_string_pretty(&event)?);
            Ok(())
        }
    }
}
