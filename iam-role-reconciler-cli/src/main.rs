//! Command-line entry point for the IAM role reconciler.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use iam_role_reconciler::{AwsIamClient, RoleConfig, RoleReconcilerError, RoleService};
use log::debug;
use serde::Serialize;

mod output;

/// Exit code for provider failures and other runtime errors.
const EXIT_FAILURE: u8 = 1;
/// Exit code for invalid configuration; nothing was sent to IAM.
const EXIT_CONFIGURATION: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "iam-role-reconciler",
    version,
    about = "Create, inspect, plan and delete IAM roles from declared configuration"
)]
struct Cli {
    /// AWS region override
    #[arg(long, global = true, env = "AWS_REGION")]
    region: Option<String>,

    /// Named AWS profile to load credentials from
    #[arg(long, global = true, env = "AWS_PROFILE")]
    profile: Option<String>,

    /// Enable debug logging (RUST_LOG takes precedence when set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Path to the role configuration (JSON)
    #[arg(short, long)]
    config: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the role if absent and reconcile its policies
    Create(ConfigArgs),
    /// Show the policy changes `create` would make, without applying them
    Plan(ConfigArgs),
    /// Validate a role configuration without contacting AWS
    Validate(ConfigArgs),
    /// Show the current state of a role
    Read {
        /// Role name
        #[arg(long)]
        role: String,
    },
    /// Delete a role with its instance profiles and policies
    Delete {
        /// Role name
        #[arg(long)]
        role: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidationSummary<'a> {
    role_name: &'a str,
    inline_policies: Vec<&'a str>,
    managed_policies: Vec<&'a str>,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn load_config(path: &Path) -> Result<RoleConfig, RoleReconcilerError> {
    let config = RoleConfig::from_file(path)?;
    // Fail on configuration problems before building any AWS client.
    config.validate()?;
    Ok(config)
}

async fn service(cli: &Cli) -> Result<RoleService<AwsIamClient>> {
    RoleService::from_env(cli.region.clone(), cli.profile.clone())
        .await
        .context("Failed to initialize AWS IAM client")
}

async fn run(cli: Cli) -> Result<()> {
    debug!("{cli:?}");
    match &cli.command {
        Commands::Validate(args) => {
            let validated = RoleConfig::from_file(&args.config)?.validate()?;
            output::print_json(&ValidationSummary {
                role_name: &validated.role_name,
                inline_policies: validated.policies.inline().map(|p| p.name.as_str()).collect(),
                managed_policies: validated.policies.managed().map(|r| r.arn()).collect(),
            })
        }
        Commands::Create(args) => {
            let config = load_config(&args.config)?;
            let report = service(&cli).await?.create(&config).await?;
            output::print_json(&report)
        }
        Commands::Plan(args) => {
            let config = load_config(&args.config)?;
            let diff = service(&cli).await?.plan(&config).await?;
            if diff.is_converged() {
                output::status("Inline policies are up to date");
            }
            output::print_json(&diff)
        }
        Commands::Read { role } => match service(&cli).await?.read(role).await? {
            Some(found) => output::print_json(&found),
            None => {
                output::status(&format!("IAM role {role} does not exist"));
                Ok(())
            }
        },
        Commands::Delete { role } => {
            if service(&cli).await?.delete(role).await? {
                output::status(&format!("Deleted IAM role {role}"));
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error(&err);
            let configuration = err
                .downcast_ref::<RoleReconcilerError>()
                .is_some_and(RoleReconcilerError::is_configuration);
            ExitCode::from(if configuration {
                EXIT_CONFIGURATION
            } else {
                EXIT_FAILURE
            })
        }
    }
}
