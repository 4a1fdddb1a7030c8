//! Multi-step operation composer
//!
//! Turns a validated request into an [`ExecutionPlan`]: the ledger calls to
//! send and the ordering constraints between them. Nothing is compensated:
//! a plan that fails half-way reports what was broadcast plus the first error.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use assetops_ledger::{CallArg, CallSelector, LedgerCall, MetadataStore};
use assetops_types::{
    AssetAddress, AssetParams, AssetType, BaseUnits, ChallengeResponse, CreateAssetRequest,
    InitialAdmin, OperationError, OperationKind, OperationPayload, OperationRequest, Result, Role,
    RoleSet, TopUpTarget, WalletAddress, WithdrawTarget, MAX_DECIMALS,
};

use crate::dispatch::{entry_point, selector_for, Leg};
use crate::normalizer::AmountNormalizer;
use crate::pipeline::{ConfirmationPipeline, SubmissionBatch};

/// Ledger calls for one request and how they must be ordered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionPlan {
    /// Independent calls, submitted concurrently
    Parallel(Vec<LedgerCall>),
    /// Grants and revocations; each group concurrent, the groups independent
    RoleUpdate {
        grants: Vec<LedgerCall>,
        revokes: Vec<LedgerCall>,
    },
    /// Each call is sent only after the previous one is final
    Sequential(Vec<LedgerCall>),
}

impl ExecutionPlan {
    pub fn single(call: LedgerCall) -> Self {
        Self::Parallel(vec![call])
    }

    /// Calls in reporting order
    pub fn calls(&self) -> Vec<&LedgerCall> {
        match self {
            Self::Parallel(calls) | Self::Sequential(calls) => calls.iter().collect(),
            Self::RoleUpdate { grants, revokes } => grants.iter().chain(revokes.iter()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.calls().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Grant and revoke calls that turn `current` into `desired` for `account`
pub fn role_update_plan(
    asset_type: AssetType,
    asset: &AssetAddress,
    account: &WalletAddress,
    desired: &RoleSet,
    current: &RoleSet,
) -> Result<ExecutionPlan> {
    let diff = RoleSet::diff(desired, current);
    if diff.is_empty() {
        return Err(OperationError::invalid_request(
            "desired roles already match the current roles",
        ));
    }

    let grant = entry_point(asset_type, OperationKind::UpdateRoles, Leg::Grant)?;
    let revoke = entry_point(asset_type, OperationKind::UpdateRoles, Leg::Revoke)?;
    Ok(ExecutionPlan::RoleUpdate {
        grants: role_calls(grant, asset, account, &diff.grant),
        revokes: role_calls(revoke, asset, account, &diff.revoke),
    })
}

fn role_calls(
    selector: CallSelector,
    asset: &AssetAddress,
    account: &WalletAddress,
    roles: &[Role],
) -> Vec<LedgerCall> {
    roles
        .iter()
        .map(|role| LedgerCall::new(selector, asset).arg(*role).arg(account))
        .collect()
}

/// One `grantRole` call per enabled role of every admin, admins in order
pub fn admin_grant_calls(
    selector: CallSelector,
    asset: &AssetAddress,
    admins: &[InitialAdmin],
) -> Vec<LedgerCall> {
    admins
        .iter()
        .flat_map(|admin| role_calls(selector, asset, &admin.wallet, &admin.roles.enabled()))
        .collect()
}

/// Builds and runs execution plans
#[derive(Clone)]
pub struct Composer {
    normalizer: AmountNormalizer,
    pipeline: ConfirmationPipeline,
    metadata: Arc<dyn MetadataStore>,
}

impl Composer {
    pub fn new(
        normalizer: AmountNormalizer,
        pipeline: ConfirmationPipeline,
        metadata: Arc<dyn MetadataStore>,
    ) -> Self {
        Self {
            normalizer,
            pipeline,
            metadata,
        }
    }

    pub fn pipeline(&self) -> &ConfirmationPipeline {
        &self.pipeline
    }

    // =========================================================================
    // Planning
    // =========================================================================

    /// Resolve selectors, normalize amounts and lay out the calls for `request`
    ///
    /// Every amount field is checked against its own rules: a caller-supplied
    /// ceiling bounds only the field it accompanies, and zero is accepted only
    /// where it has a meaning (lifting a freeze, reporting empty collateral).
    pub async fn plan(&self, request: &OperationRequest) -> Result<ExecutionPlan> {
        let asset_type = request.asset_type();
        let asset = request.asset_address();
        let kind = request.kind();
        let selector = selector_for(asset_type, kind)?;
        let call = || LedgerCall::new(selector, asset);
        let base = self.normalizer.rules();

        let plan = match request.payload() {
            OperationPayload::Mint { to, amount } => {
                let units = self.normalizer.normalize(amount, asset, base).await?;
                ExecutionPlan::single(call().arg(to).arg(units))
            }
            OperationPayload::Transfer {
                to,
                amount,
                ceiling,
            } => {
                let rules = base.bounded_by(ceiling.as_deref());
                let units = self.normalizer.normalize(amount, asset, &rules).await?;
                ExecutionPlan::single(call().arg(to).arg(units))
            }
            OperationPayload::Burn { amount, ceiling } => {
                let rules = base.bounded_by(ceiling.as_deref());
                let units = self.normalizer.normalize(amount, asset, &rules).await?;
                ExecutionPlan::single(call().arg(units))
            }
            OperationPayload::UpdateCollateral { amount } => {
                let units = self
                    .normalizer
                    .normalize(amount, asset, &base.zero_allowed())
                    .await?;
                ExecutionPlan::single(call().arg(units))
            }
            OperationPayload::Freeze {
                user,
                amount,
                ceiling,
            } => {
                let rules = base.bounded_by(ceiling.as_deref()).zero_allowed();
                let units = self.normalizer.normalize(amount, asset, &rules).await?;
                ExecutionPlan::single(call().arg(user).arg(units))
            }
            OperationPayload::Pause | OperationPayload::Unpause | OperationPayload::Mature => {
                ExecutionPlan::single(call())
            }
            OperationPayload::BlockUser { user }
            | OperationPayload::UnblockUser { user }
            | OperationPayload::AllowUser { user }
            | OperationPayload::DisallowUser { user } => ExecutionPlan::single(call().arg(user)),
            OperationPayload::GrantRole { account, roles }
            | OperationPayload::RevokeRole { account, roles } => {
                let mut unique: Vec<Role> = Vec::with_capacity(roles.len());
                for role in roles {
                    if !unique.contains(role) {
                        unique.push(*role);
                    }
                }
                if unique.is_empty() {
                    return Err(OperationError::invalid_request("at least one role is required"));
                }
                ExecutionPlan::Parallel(role_calls(selector, asset, account, &unique))
            }
            OperationPayload::UpdateRoles {
                account,
                desired,
                current,
            } => role_update_plan(asset_type, asset, account, desired, current)?,
            OperationPayload::Withdraw {
                to,
                amount,
                target,
                ceiling,
            } => {
                let rules = base.bounded_by(ceiling.as_deref());
                let units = self
                    .normalizer
                    .normalize(amount, target.precision_asset(), &rules)
                    .await?;
                ExecutionPlan::single(withdraw_call(asset_type, asset, to, units, target)?)
            }
            OperationPayload::SetYieldSchedule {
                start_time,
                end_time,
                rate_bps,
                interval_secs,
            } => {
                if end_time <= start_time {
                    return Err(OperationError::invalid_request(
                        "yield schedule must end after it starts",
                    ));
                }
                if *rate_bps == 0 || *interval_secs == 0 {
                    return Err(OperationError::invalid_request(
                        "yield rate and interval must be greater than zero",
                    ));
                }
                ExecutionPlan::single(
                    LedgerCall::factory(selector)
                        .arg(asset)
                        .arg(CallArg::Timestamp(*start_time))
                        .arg(CallArg::Timestamp(*end_time))
                        .arg(CallArg::Uint(u64::from(*rate_bps)))
                        .arg(CallArg::Uint(*interval_secs)),
                )
            }
            OperationPayload::TopUp {
                amount,
                underlying,
                target,
                ceiling,
            } => {
                let rules = base.bounded_by(ceiling.as_deref());
                let units = self.normalizer.normalize(amount, underlying, &rules).await?;
                let top_up = match target {
                    TopUpTarget::Bond => LedgerCall::new(selector, asset),
                    TopUpTarget::YieldSchedule { schedule } => LedgerCall::new(
                        entry_point(asset_type, kind, Leg::YieldSchedule)?,
                        schedule,
                    ),
                };
                let spender = match top_up.contract() {
                    Some(contract) => contract.clone(),
                    None => asset.clone(),
                };
                let approve =
                    LedgerCall::new(entry_point(asset_type, kind, Leg::Approval)?, underlying)
                        .arg(&spender)
                        .arg(units.clone());
                ExecutionPlan::Sequential(vec![approve, top_up.arg(units)])
            }
        };

        Ok(plan)
    }

    /// Creation call for a new asset
    pub async fn create_call(&self, request: &CreateAssetRequest) -> Result<LedgerCall> {
        let metadata = &request.metadata;
        if metadata.name.trim().is_empty() || metadata.symbol.trim().is_empty() {
            return Err(OperationError::invalid_request("asset name and symbol are required"));
        }
        if metadata.decimals > MAX_DECIMALS {
            return Err(OperationError::invalid_request(format!(
                "decimals must be at most {}",
                MAX_DECIMALS
            )));
        }

        let selector = selector_for(request.asset_type(), OperationKind::Create)?;
        let call = LedgerCall::factory(selector)
            .arg(CallArg::Text(metadata.name.clone()))
            .arg(CallArg::Text(metadata.symbol.clone()))
            .arg(CallArg::Uint(u64::from(metadata.decimals)))
            .arg(CallArg::Text(metadata.isin.clone().unwrap_or_default()));

        let call = match &request.params {
            AssetParams::Bond {
                cap,
                face_value,
                maturity_date,
                underlying,
            } => {
                if *maturity_date <= Utc::now() {
                    return Err(OperationError::invalid_request("maturity date must be in the future"));
                }
                let rules = self.normalizer.rules();
                let cap = self.normalizer.normalize_at(cap, metadata.decimals, rules)?;
                let face_value = self.normalizer.normalize(face_value, underlying, rules).await?;
                call.arg(cap)
                    .arg(face_value)
                    .arg(CallArg::Timestamp(*maturity_date))
                    .arg(underlying)
            }
            AssetParams::Cryptocurrency { initial_supply } => {
                let rules = self.normalizer.rules().zero_allowed();
                call.arg(
                    self.normalizer
                        .normalize_at(initial_supply, metadata.decimals, &rules)?,
                )
            }
            AssetParams::Equity { class, category } => call
                .arg(CallArg::Text(class.clone()))
                .arg(CallArg::Text(category.clone())),
            AssetParams::Fund {
                class,
                category,
                management_fee_bps,
            } => call
                .arg(CallArg::Text(class.clone()))
                .arg(CallArg::Text(category.clone()))
                .arg(CallArg::Uint(u64::from(*management_fee_bps))),
            AssetParams::Stablecoin {
                collateral_liveness_secs,
            }
            | AssetParams::Deposit {
                collateral_liveness_secs,
            } => {
                if *collateral_liveness_secs == 0 {
                    return Err(OperationError::invalid_request(
                        "collateral liveness must be greater than zero",
                    ));
                }
                call.arg(CallArg::Uint(*collateral_liveness_secs))
            }
        };

        Ok(call)
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Submit the calls of `plan`, honouring its ordering constraints
    pub async fn execute(
        &self,
        plan: &ExecutionPlan,
        signer: &WalletAddress,
        proof: &ChallengeResponse,
    ) -> SubmissionBatch {
        match plan {
            ExecutionPlan::Parallel(calls) => self.pipeline.submit_all(calls, signer, proof).await,
            ExecutionPlan::Sequential(calls) => {
                self.pipeline.submit_sequential(calls, signer, proof).await
            }
            ExecutionPlan::RoleUpdate { grants, revokes } => {
                let (mut granted, revoked) = futures::join!(
                    self.pipeline.submit_all(grants, signer, proof),
                    self.pipeline.submit_all(revokes, signer, proof),
                );
                granted.extend(revoked);
                granted
            }
        }
    }

    /// Deploy a new asset from its creation `call` and enroll its initial admins
    ///
    /// Order: predict the address, write metadata, submit the creation call,
    /// wait for it to be final, then grant every admin role concurrently. A
    /// failure before the creation call is returned as `Err` with nothing
    /// broadcast; later failures are carried in the batch next to the hashes.
    ///
    /// If the ledger deploys somewhere other than the predicted address the
    /// metadata is written again under the deployed one.
    pub async fn create_asset(
        &self,
        request: &CreateAssetRequest,
        call: &LedgerCall,
        proof: &ChallengeResponse,
    ) -> Result<(AssetAddress, SubmissionBatch)> {
        let asset_type = request.asset_type();
        let signer = &request.actor;
        let grant = selector_for(asset_type, OperationKind::GrantRole)?;

        let predicted = self.pipeline.ledger().predict_address(call, signer).await?;
        self.metadata
            .upsert(&predicted, &request.metadata)
            .await
            .map_err(|err| OperationError::MetadataWrite {
                reason: err.to_string(),
            })?;

        let record = self.pipeline.submit(call, signer, proof).await?;
        let hash = record.hash.clone();
        let mut batch = SubmissionBatch {
            records: vec![record],
            error: None,
        };

        let receipt = match self.pipeline.await_finality(&hash).await {
            Ok(receipt) => receipt,
            Err(err) => {
                batch.error = Some(err);
                return Ok((predicted, batch));
            }
        };

        let address = match receipt.contract_address {
            Some(deployed) if deployed != predicted => {
                warn!(predicted = %predicted, deployed = %deployed, "Asset deployed to an unexpected address");
                if let Err(err) = self.metadata.upsert(&deployed, &request.metadata).await {
                    warn!(asset = %deployed, error = %err, "Metadata rewrite failed");
                    batch.error = Some(OperationError::MetadataWrite {
                        reason: err.to_string(),
                    });
                }
                deployed
            }
            _ => predicted,
        };
        info!(asset = %address, asset_type = %asset_type, hash = %hash, "Asset created");

        let grants = admin_grant_calls(grant, &address, &request.initial_admins);
        if !grants.is_empty() {
            batch.extend(self.pipeline.submit_all(&grants, signer, proof).await);
        }
        Ok((address, batch))
    }
}

/// Withdrawal call for the chosen target
fn withdraw_call(
    asset_type: AssetType,
    asset: &AssetAddress,
    to: &WalletAddress,
    units: BaseUnits,
    target: &WithdrawTarget,
) -> Result<LedgerCall> {
    let withdraw_leg = |leg| entry_point(asset_type, OperationKind::Withdraw, leg);
    match target {
        WithdrawTarget::Bond { .. } | WithdrawTarget::YieldSchedule { .. }
            if asset_type != AssetType::Bond =>
        {
            Err(OperationError::invalid_request(
                "underlying-asset withdrawals are only available on bonds",
            ))
        }
        WithdrawTarget::Bond { .. } => Ok(LedgerCall::new(withdraw_leg(Leg::Primary)?, asset)
            .arg(to)
            .arg(units)),
        WithdrawTarget::YieldSchedule { schedule, .. } => {
            Ok(LedgerCall::new(withdraw_leg(Leg::YieldSchedule)?, schedule)
                .arg(to)
                .arg(units))
        }
        WithdrawTarget::Token { token } => Ok(LedgerCall::new(withdraw_leg(Leg::Token)?, asset)
            .arg(token)
            .arg(to)
            .arg(units)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset() -> AssetAddress {
        AssetAddress::parse("0x1234567890abcdef1234567890abcdef12345678").unwrap()
    }

    fn account() -> WalletAddress {
        WalletAddress::parse("0xabcdefabcdefabcdefabcdefabcdefabcdefabcd").unwrap()
    }

    #[test]
    fn test_role_update_plan() {
        let desired = RoleSet::none()
            .with(Role::SupplyManagementRole, true)
            .with(Role::AuditorRole, false);
        let current = RoleSet::none()
            .with(Role::SupplyManagementRole, false)
            .with(Role::AuditorRole, true);

        let plan =
            role_update_plan(AssetType::Equity, &asset(), &account(), &desired, &current).unwrap();
        match &plan {
            ExecutionPlan::RoleUpdate { grants, revokes } => {
                assert_eq!(grants.len(), 1);
                assert_eq!(revokes.len(), 1);
                assert_eq!(grants[0].function(), "grantRole");
                assert_eq!(grants[0].args[0], CallArg::Role(Role::SupplyManagementRole));
                assert_eq!(revokes[0].function(), "revokeRole");
                assert_eq!(revokes[0].args[0], CallArg::Role(Role::AuditorRole));
            }
            other => panic!("unexpected plan: {:?}", other),
        }
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn test_role_update_without_changes() {
        let roles = RoleSet::from_roles([Role::AuditorRole]);
        assert!(role_update_plan(AssetType::Fund, &asset(), &account(), &roles, &roles).is_err());
    }

    #[test]
    fn test_admin_grants_follow_admin_order() {
        let admins = vec![
            InitialAdmin {
                wallet: account(),
                roles: RoleSet::all(),
            },
            InitialAdmin {
                wallet: WalletAddress::parse("0x0000000000000000000000000000000000000001").unwrap(),
                roles: RoleSet::from_roles([Role::AuditorRole]),
            },
        ];
        let selector = selector_for(AssetType::Stablecoin, OperationKind::GrantRole).unwrap();
        let calls = admin_grant_calls(selector, &asset(), &admins);
        assert_eq!(calls.len(), Role::ALL.len() + 1);
        assert!(calls.iter().all(|call| call.selector.to_string() == "StableCoin.grantRole"));
        assert_eq!(calls.last().unwrap().args[0], CallArg::Role(Role::AuditorRole));
    }

    #[test]
    fn test_withdraw_targets() {
        let units = BaseUnits::from(10u128);
        let underlying = asset();

        let call = withdraw_call(
            AssetType::Bond,
            &asset(),
            &account(),
            units.clone(),
            &WithdrawTarget::Bond {
                underlying: underlying.clone(),
            },
        )
        .unwrap();
        assert_eq!(call.selector.to_string(), "Bond.withdrawUnderlyingAsset");

        let schedule = AssetAddress::parse("0x00000000000000000000000000000000000000ff").unwrap();
        let call = withdraw_call(
            AssetType::Bond,
            &asset(),
            &account(),
            units.clone(),
            &WithdrawTarget::YieldSchedule {
                schedule: schedule.clone(),
                underlying: underlying.clone(),
            },
        )
        .unwrap();
        assert_eq!(call.contract(), Some(&schedule));

        let call = withdraw_call(
            AssetType::Deposit,
            &asset(),
            &account(),
            units.clone(),
            &WithdrawTarget::Token {
                token: underlying.clone(),
            },
        )
        .unwrap();
        assert_eq!(call.selector.to_string(), "Deposit.withdrawToken");
        assert_eq!(call.args.len(), 3);

        assert!(withdraw_call(
            AssetType::Equity,
            &asset(),
            &account(),
            units,
            &WithdrawTarget::Bond { underlying },
        )
        .is_err());
    }
}
