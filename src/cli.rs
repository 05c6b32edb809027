//! # providerctl
//!
//! Command-line interface for the Secret Provider Registry.
//!
//! Reads the built-in provider registry to generate documentation and checks
//! secret store manifests against the admission rules offline.
//!
//! ## Usage
//!
//! ```bash
//! # Capability table for the docs site
//! providerctl providers list --output markdown
//!
//! # Details of one provider
//! providerctl providers describe Kubernetes
//!
//! # Check a store manifest before applying it
//! providerctl validate -f store.yaml
//!
//! # Read one key through a store as a consumer in team-a would
//! providerctl get -f store.yaml --namespace team-a db/password
//! ```
//!
//! `get` talks to the cluster in the current kubeconfig context and honours
//! `RESOLVE_TIMEOUT_SECS` and `DEFAULT_TOKEN_TTL_SECS`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use kube::Client;
use secret_provider_registry::config::RuntimeConfig;
use secret_provider_registry::crd::StoreSpec;
use secret_provider_registry::provider::builtin::register_builtin_providers;
use secret_provider_registry::registry::{describe, markdown_table, Registry, RegistryError};
use secret_provider_registry::resolver::{BackingStore, KubeBackingStore};
use secret_provider_registry::validation;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Secret Provider Registry CLI
#[derive(Parser)]
#[command(name = "providerctl")]
#[command(
    about = "Secret Provider Registry CLI",
    long_about = None,
    after_help = "\
Examples:
  providerctl providers list --output markdown
  providerctl providers describe Fake --output json
  providerctl validate -f store.yaml
  providerctl get -f store.yaml --namespace team-a db/password
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect registered providers
    Providers {
        #[command(subcommand)]
        command: ProvidersCommand,
    },
    /// Run the admission check against a store manifest (YAML or JSON)
    Validate {
        /// Path to the store manifest
        #[arg(short, long, value_name = "FILE")]
        file: PathBuf,
    },
    /// Read one remote key through a store, as a consumer in NAMESPACE
    Get {
        /// Path to the store manifest
        #[arg(short, long, value_name = "FILE")]
        file: PathBuf,

        /// Namespace of the consumer
        #[arg(short, long)]
        namespace: String,

        /// Remote key, e.g. `name` or `name/property`
        #[arg(value_name = "KEY")]
        key: String,
    },
    /// Show build information
    Version,
}

#[derive(Subcommand)]
enum ProvidersCommand {
    /// Capability table of every provider
    List {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Markdown)]
        output: OutputFormat,
    },
    /// Details of one provider
    Describe {
        /// Provider name, as used in `provider.kind`
        #[arg(value_name = "NAME")]
        name: String,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Markdown,
    Json,
    Text,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = RuntimeConfig::from_env();

    match cli.command {
        Commands::Providers { command } => {
            let registry = builtin_registry(&config)?;
            match command {
                ProvidersCommand::List { output } => list_command(&registry, output),
                ProvidersCommand::Describe { name, output } => {
                    describe_command(&registry, &name, output)
                }
            }
        }
        Commands::Validate { file } => validate_command(&config, &file),
        Commands::Get {
            file,
            namespace,
            key,
        } => get_command(&config, &file, &namespace, &key).await,
        Commands::Version => {
            println!(
                "providerctl {} (git {}, built {})",
                env!("CARGO_PKG_VERSION"),
                env!("BUILD_GIT_HASH"),
                env!("BUILD_DATETIME")
            );
            Ok(())
        }
    }
}

fn builtin_registry(config: &RuntimeConfig) -> Result<Registry> {
    let registry = Registry::new();
    register_builtin_providers(&registry, config.token_ttl())
        .context("Failed to register built-in providers")?;
    Ok(registry)
}

fn read_store(file: &Path) -> Result<StoreSpec> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    // YAML is a superset of JSON
    serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse store spec from {}", file.display()))
}

fn list_command(registry: &Registry, output: OutputFormat) -> Result<()> {
    let summaries = registry.summaries();
    match output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
        OutputFormat::Markdown => print!("{}", markdown_table(&summaries)),
        OutputFormat::Text => {
            println!("\n{:<20} {:<14} {:<15} {:<10}", "NAME", "STABILITY", "MAINTENANCE", "API");
            println!("{}", "-".repeat(62));
            for summary in &summaries {
                println!(
                    "{:<20} {:<14} {:<15} {:<10}",
                    summary.name,
                    summary.stability.to_string(),
                    summary.maintenance_status.to_string(),
                    summary.api_capabilities.to_string()
                );
            }
        }
    }
    Ok(())
}

fn describe_command(registry: &Registry, name: &str, output: OutputFormat) -> Result<()> {
    let summary = registry
        .summaries()
        .into_iter()
        .find(|s| s.name == name)
        .ok_or_else(|| RegistryError::UnknownProvider(name.to_string()))?;

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Markdown => print!("{}", markdown_table(&[summary])),
        OutputFormat::Text => print!("{}", describe(&summary)),
    }
    Ok(())
}

fn validate_command(config: &RuntimeConfig, file: &Path) -> Result<()> {
    let store = read_store(file)?;
    let registry = builtin_registry(config)?;
    let verdict = validation::validate_store(&registry, &store);

    println!("Store:   {}", store.name);
    println!("State:   {}", verdict.state);
    for warning in &verdict.warnings {
        println!("Warning: {warning}");
    }
    if let Some(message) = &verdict.message {
        println!("Reason:  {message}");
    }

    if !verdict.allowed {
        anyhow::bail!("store '{}' would be rejected", store.name);
    }
    println!("Store would be admitted");
    Ok(())
}

async fn get_command(config: &RuntimeConfig, file: &Path, namespace: &str, key: &str) -> Result<()> {
    let store = read_store(file)?;
    let registry = builtin_registry(config)?;
    let provider = registry.get_provider(&store.provider.kind)?;

    // kube's rustls transport needs a process-wide crypto provider
    let _ = rustls::crypto::ring::default_provider().install_default();
    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client. Ensure kubeconfig is configured.")?;
    let backing: Arc<dyn BackingStore> = Arc::new(KubeBackingStore::new(client));

    let ctx = config.resolve_context();
    let secrets = provider
        .new_client(&ctx, &store, backing, namespace)
        .await
        .with_context(|| format!("Failed to create client for store '{}'", store.name))?;
    let value = secrets
        .get_secret(key)
        .await
        .with_context(|| format!("Failed to read '{key}' through store '{}'", store.name))?;
    secrets.close().await?;

    std::io::stdout().write_all(value.as_bytes())?;
    Ok(())
}
