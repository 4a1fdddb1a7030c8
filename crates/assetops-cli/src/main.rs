//! AssetOps CLI - inspect and exercise the operation orchestrator
//!
//! Everything runs in-process against in-memory collaborators; no ledger or
//! index needs to be reachable.
//!
//! # Quick Start
//!
//! ```bash
//! # Which operations each asset variant supports
//! assetops matrix
//!
//! # Convert a human amount into base units
//! assetops normalize --amount 1.5 --decimals 6
//!
//! # End-to-end scenarios
//! assetops demo role-update
//! assetops demo top-up --revert-approval
//! assetops demo create --admins 2
//! RUST_LOG=debug assetops demo top-up --index-lag 4
//! ```

use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod display;

use commands::{demo, matrix, normalize};

/// AssetOps CLI - tokenized asset operations with verified, confirmed writes
#[derive(Parser)]
#[command(name = "assetops")]
#[command(author = "AssetOps Contributors")]
#[command(version)]
#[command(about = "Authorize, dispatch and confirm operations on tokenized assets", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, env = "ASSETOPS_LOG", default_value = "warn")]
    log: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the (asset variant, operation) support table
    Matrix {
        /// Also print the ledger entry point of every pair
        #[arg(short, long)]
        selectors: bool,
    },

    /// Convert a decimal amount into base units
    Normalize {
        /// Human decimal amount, e.g. 1.5
        #[arg(short, long)]
        amount: String,

        /// Decimal precision of the asset (0-18)
        #[arg(short, long)]
        decimals: u8,

        /// Accept a zero amount
        #[arg(long)]
        allow_zero: bool,
    },

    /// Run an end-to-end scenario against in-memory collaborators
    Demo {
        #[command(subcommand)]
        scenario: DemoCommands,
    },
}

#[derive(Subcommand)]
enum DemoCommands {
    /// Grant one role and revoke another in a single update
    RoleUpdate {
        /// Make the ledger refuse the revocation
        #[arg(long)]
        reject_revoke: bool,

        #[command(flatten)]
        env: demo::DemoArgs,
    },

    /// Approve the underlying asset, then top up the bond
    TopUp {
        /// Amount of underlying asset to move
        #[arg(long, default_value = "250")]
        amount: String,

        /// Make the approval revert on-chain
        #[arg(long)]
        revert_approval: bool,

        #[command(flatten)]
        env: demo::DemoArgs,
    },

    /// Deploy a bond and enroll its initial admins
    Create {
        /// Number of initial admins
        #[arg(long, default_value = "2")]
        admins: u8,

        /// Make the metadata store refuse the write
        #[arg(long)]
        fail_metadata: bool,

        #[command(flatten)]
        env: demo::DemoArgs,
    },
}

fn init_tracing(default_filter: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn print_banner() {
    println!();
    println!("{}", "  AssetOps".bright_white().bold());
    println!("{}", "  verified writes for tokenized assets".bright_black());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli.log);
    print_banner();

    match cli.command {
        Commands::Matrix { selectors } => matrix::print_matrix(selectors),
        Commands::Normalize {
            amount,
            decimals,
            allow_zero,
        } => normalize::run(&amount, decimals, allow_zero)?,
        Commands::Demo { scenario } => match scenario {
            DemoCommands::RoleUpdate { reject_revoke, env } => {
                demo::run_role_update(env, reject_revoke).await?
            }
            DemoCommands::TopUp {
                amount,
                revert_approval,
                env,
            } => demo::run_top_up(env, &amount, revert_approval).await?,
            DemoCommands::Create {
                admins,
                fail_metadata,
                env,
            } => demo::run_create(env, admins, fail_metadata).await?,
        },
    }

    Ok(())
}
