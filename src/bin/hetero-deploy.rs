//! hetero-deploy: deploys hetero-inventory across CPU architectures.
//!
//! Labels nodes, applies manifests and waits for each component in the order
//! given by a YAML plan.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hetero_inventory::deploy::{Deployer, Plan, runner};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Deployment plan file
    #[arg(long, global = true, env = "HETERO_PLAN", default_value = "deploy/plan.yaml")]
    plan: PathBuf,

    /// Override a plan variable (repeatable); `NAMESPACE` moves the target namespace
    #[arg(long = "set", global = true, value_name = "KEY=VALUE", value_parser = parse_key_value)]
    overrides: Vec<(String, String)>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run every step of the plan
    Up {
        /// Only render the manifests and list the objects that would be applied
        #[arg(long)]
        dry_run: bool,
    },
    /// Show which node and architecture each pod runs on
    Status,
    /// Delete the namespace and remove node labels added by the plan
    Down,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got `{raw}`")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if args.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let mut plan = Plan::load(&args.plan)?;
    plan.apply_overrides(args.overrides);

    if let Command::Up { dry_run: true } = args.command {
        for line in runner::dry_run(&plan)? {
            println!("{line}");
        }
        return Ok(());
    }

    let client = kube::Client::try_default()
        .await
        .context("failed to build Kubernetes client")?;
    tracing::info!(
        plan = %args.plan.display(),
        namespace = %plan.namespace,
        "connected to cluster"
    );
    let deployer = Deployer::new(client, plan);

    match args.command {
        Command::Up { .. } => deployer.up().await,
        Command::Status => {
            let placements = deployer.status().await?;
            println!(
                "{:<40} {:<24} {:<10} {:<10} {:<6} {}",
                "POD", "NODE", "ARCH", "PHASE", "READY", "IP"
            );
            for p in placements {
                println!(
                    "{:<40} {:<24} {:<10} {:<10} {:<6} {}",
                    p.pod, p.node, p.arch, p.phase, p.ready, p.pod_ip
                );
            }
            Ok(())
        }
        Command::Down => deployer.down().await,
    }
}
