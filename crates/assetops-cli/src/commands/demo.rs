//! Demo commands - end-to-end scenarios against in-memory collaborators

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::Args;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use assetops_auth::{AuthenticatedCaller, Permissions, VerificationConfig, VerificationGate};
use assetops_ledger::{InMemoryIndex, InMemoryLedger, InMemoryMetadataStore};
use assetops_orchestrator::{Collaborators, Orchestrator, OrchestratorConfig};
use assetops_types::{
    AssetAddress, AssetMetadata, AssetParams, AssetType, CompositeOperationResult,
    CreateAssetRequest, InitialAdmin, OperationPayload, OperationRequest, Role, RoleSet,
    TopUpTarget, VerificationCode, WalletAddress,
};

use crate::display;

/// Settings shared by every demo
#[derive(Args, Debug, Clone)]
pub struct DemoArgs {
    /// Polls the derived index needs before it observes a transaction
    #[arg(long, env = "ASSETOPS_DEMO_INDEX_LAG", default_value = "2")]
    pub index_lag: u32,

    /// PIN code enrolled for the demo operator
    #[arg(long, env = "ASSETOPS_DEMO_PINCODE", default_value = "135790")]
    pub pincode: String,
}

/// In-memory collaborators wired into an orchestrator
struct DemoEnv {
    ledger: Arc<InMemoryLedger>,
    index: Arc<InMemoryIndex>,
    metadata: Arc<InMemoryMetadataStore>,
    orchestrator: Orchestrator,
    operator: WalletAddress,
    caller: AuthenticatedCaller,
    pincode: String,
}

impl DemoEnv {
    async fn new(args: &DemoArgs) -> anyhow::Result<Self> {
        let config = OrchestratorConfig::from_env()?;
        tracing::debug!(
            confirmation_polls = config.confirmation.max_polls,
            finality_polls = config.finality.max_polls,
            "Orchestrator configured"
        );
        let operator = WalletAddress::from_bytes([0x11; 20]);

        let gate = Arc::new(VerificationGate::in_memory(VerificationConfig::default()));
        gate.enroll_pincode(&operator, &args.pincode).await?;

        let index = Arc::new(InMemoryIndex::new());
        let ledger = Arc::new(InMemoryLedger::new().with_index(index.clone()));
        ledger.set_index_lag(args.index_lag);
        let metadata = Arc::new(InMemoryMetadataStore::new());

        let orchestrator = Orchestrator::new(
            Collaborators {
                verification: gate,
                ledger: ledger.clone(),
                index: index.clone(),
                precision: index.clone(),
                metadata: metadata.clone(),
            },
            config,
        );

        display::section("Environment");
        display::kv("operator", operator.as_str());
        display::kv("index lag", &format!("{} polls", args.index_lag));

        Ok(Self {
            ledger,
            index,
            metadata,
            orchestrator,
            caller: AuthenticatedCaller::new(operator.clone(), Permissions::admin()),
            operator,
            pincode: args.pincode.clone(),
        })
    }

    fn request(
        &self,
        asset_type: AssetType,
        asset: &AssetAddress,
        payload: OperationPayload,
    ) -> OperationRequest {
        OperationRequest::new(
            asset_type,
            asset.clone(),
            self.operator.clone(),
            VerificationCode::pincode(self.pincode.clone()),
            payload,
        )
    }

    async fn print_plan(&self, request: &OperationRequest) {
        match self.orchestrator.composer().plan(request).await {
            Ok(plan) => {
                for call in plan.calls() {
                    display::info(&call.to_string());
                }
            }
            Err(err) => display::warning(&err.to_string()),
        }
    }

    async fn run(&self, request: OperationRequest) -> CompositeOperationResult {
        let spinner = spinner("Submitting and waiting for the derived index...");
        let result = self.orchestrator.execute(&self.caller, request).await;
        spinner.finish_and_clear();
        result
    }

    async fn print_outcome(&self, result: &CompositeOperationResult) {
        display::section("Result");
        display::result(result);
        display::kv("ledger submissions", &self.ledger.submission_count().await.to_string());
        display::kv("index polls", &self.index.poll_count().to_string());
    }
}

fn role_names(roles: &[Role]) -> String {
    roles.iter().map(Role::as_str).collect::<Vec<_>>().join(", ")
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Grant SUPPLY_MANAGEMENT and revoke AUDITOR in one update
pub async fn run_role_update(args: DemoArgs, reject_revoke: bool) -> anyhow::Result<()> {
    println!("{}", "Role update: grants and revokes fan out independently".bright_white().bold());
    let env = DemoEnv::new(&args).await?;

    let equity = AssetAddress::from_bytes([0xe1; 20]);
    let member = WalletAddress::from_bytes([0x42; 20]);
    env.index.set_decimals(equity.clone(), 0);
    if reject_revoke {
        env.ledger.reject_function("revokeRole", "last auditor cannot be removed").await;
        display::warning("The ledger will refuse the revocation");
    }

    let desired = RoleSet::none()
        .with(Role::SupplyManagementRole, true)
        .with(Role::AuditorRole, false);
    let current = RoleSet::none()
        .with(Role::SupplyManagementRole, false)
        .with(Role::AuditorRole, true);

    display::section("Plan");
    let diff = RoleSet::diff(&desired, &current);
    display::kv("grant", &role_names(&diff.grant));
    display::kv("revoke", &role_names(&diff.revoke));

    let request = env.request(
        AssetType::Equity,
        &equity,
        OperationPayload::UpdateRoles {
            account: member,
            desired,
            current,
        },
    );
    env.print_plan(&request).await;

    let result = env.run(request).await;
    env.print_outcome(&result).await;
    Ok(())
}

/// Approve the underlying asset, then top up the bond
pub async fn run_top_up(args: DemoArgs, amount: &str, revert_approval: bool) -> anyhow::Result<()> {
    println!("{}", "Bond top-up: the top-up waits for the approval to be final".bright_white().bold());
    let env = DemoEnv::new(&args).await?;

    let bond = AssetAddress::from_bytes([0xb0; 20]);
    let underlying = AssetAddress::from_bytes([0x0c; 20]);
    env.index.set_decimals(bond.clone(), 0);
    env.index.set_decimals(underlying.clone(), 6);
    if revert_approval {
        env.ledger.revert_function("approve", "insufficient balance").await;
        display::warning("The approval will revert on-chain");
    }

    let request = env.request(
        AssetType::Bond,
        &bond,
        OperationPayload::TopUp {
            amount: amount.to_string(),
            underlying,
            target: TopUpTarget::Bond,
            ceiling: None,
        },
    );

    display::section("Plan");
    env.print_plan(&request).await;

    let result = env.run(request).await;
    env.print_outcome(&result).await;
    Ok(())
}

/// Deploy a bond and grant roles to its initial admins
pub async fn run_create(args: DemoArgs, admins: u8, fail_metadata: bool) -> anyhow::Result<()> {
    println!("{}", "Asset creation: metadata, deployment, then admin grants".bright_white().bold());
    let env = DemoEnv::new(&args).await?;

    let underlying = AssetAddress::from_bytes([0x0c; 20]);
    env.index.set_decimals(underlying.clone(), 6);
    if fail_metadata {
        env.metadata.fail_writes(true);
        display::warning("The metadata store will refuse the write");
    }

    let initial_admins: Vec<InitialAdmin> = (0..admins)
        .map(|i| InitialAdmin {
            wallet: WalletAddress::from_bytes([0x20u8.wrapping_add(i); 20]),
            roles: if i == 0 {
                RoleSet::all()
            } else {
                RoleSet::from_roles([Role::AuditorRole])
            },
        })
        .collect();

    let request = CreateAssetRequest {
        actor: env.operator.clone(),
        verification: VerificationCode::pincode(env.pincode.clone()),
        metadata: AssetMetadata {
            name: "Municipal Green Bond 2031".to_string(),
            symbol: "MGB31".to_string(),
            decimals: 0,
            isin: Some("XS0000000009".to_string()),
            attributes: serde_json::Map::new(),
        },
        params: AssetParams::Bond {
            cap: "10000".to_string(),
            face_value: "1000".to_string(),
            maturity_date: Utc::now() + chrono::Duration::days(5 * 365),
            underlying,
        },
        initial_admins,
    };

    display::section("Plan");
    display::kv("symbol", &request.metadata.symbol);
    display::kv("initial admins", &request.initial_admins.len().to_string());

    let spinner = spinner("Deploying and enrolling admins...");
    let created = env.orchestrator.create_asset(&env.caller, request).await;
    spinner.finish_and_clear();

    match &created.address {
        Some(address) => {
            display::success(&format!("Bond deployed at {}", address));
            if env.metadata.get(address).is_some() {
                display::success("Metadata stored");
            }
        }
        None => display::error("Nothing was deployed"),
    }
    env.print_outcome(&created.result).await;
    Ok(())
}
