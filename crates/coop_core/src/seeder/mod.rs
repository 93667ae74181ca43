//! Tenant onboarding and teardown of branch reference data.
//!
//! # Responsibility
//! - Seed every reference table of a new (organization, branch) scope in
//!   foreign-key dependency order.
//! - Destroy the same tables in reverse order.
//!
//! # Invariants
//! - Steps run strictly in list order; the first failure aborts the run and
//!   no later step executes.
//! - The orchestrator never commits or rolls back. Atomicity belongs to the
//!   caller's transaction: roll back on `Err`, commit on `Ok`.
//! - A retried run starts from the first step inside a fresh transaction.
//! - Callers must not run two sequences against the same scope concurrently.

mod data;
mod steps;

use crate::app::Core;
use crate::context::Context;
use crate::entities::{Branch, BranchRequest, Organization, OrganizationRequest};
use crate::model::{Entity, TenantScope};
use crate::registry::{RegistryError, RegistryResult};
use log::{error, info};
use rusqlite::Transaction;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use uuid::Uuid;

pub type SeedFn = fn(&Core, &Context, &Transaction<'_>, &SeedScope) -> RegistryResult<usize>;
pub type DestroyFn = fn(&Core, &Context, &Transaction<'_>, &TenantScope) -> RegistryResult<usize>;

/// Tenant scope being seeded plus the acting user stamped on audit columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedScope {
    pub scope: TenantScope,
    pub user_id: Option<Uuid>,
}

impl SeedScope {
    pub fn new(scope: TenantScope, user_id: Option<Uuid>) -> Self {
        Self { scope, user_id }
    }
}

/// One named category of reference data.
#[derive(Clone, Copy)]
pub struct SeedStep {
    pub name: &'static str,
    pub seed: SeedFn,
    pub destroy: DestroyFn,
}

impl SeedStep {
    pub const fn new(name: &'static str, seed: SeedFn, destroy: DestroyFn) -> Self {
        Self {
            name,
            seed,
            destroy,
        }
    }

    pub fn with_seed(mut self, seed: SeedFn) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_destroy(mut self, destroy: DestroyFn) -> Self {
        self.destroy = destroy;
        self
    }
}

impl std::fmt::Debug for SeedStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedStep").field("name", &self.name).finish()
    }
}

/// Onboarding order; each step only references tables seeded before it.
pub fn default_steps() -> Vec<SeedStep> {
    vec![
        SeedStep::new("bank", steps::seed_banks, steps::destroy_banks),
        SeedStep::new(
            "bill_and_coins",
            steps::seed_bill_and_coins,
            steps::destroy_bill_and_coins,
        ),
        SeedStep::new("holiday", steps::seed_holidays, steps::destroy_holidays),
        SeedStep::new(
            "general_ledger",
            steps::seed_general_ledger,
            steps::destroy_general_ledger,
        ),
        SeedStep::new("account", steps::seed_accounts, steps::destroy_accounts),
        SeedStep::new(
            "account_classification",
            steps::seed_account_classifications,
            steps::destroy_account_classifications,
        ),
        SeedStep::new(
            "account_category",
            steps::seed_account_categories,
            steps::destroy_account_categories,
        ),
        SeedStep::new(
            "member_classification",
            steps::seed_member_classifications,
            steps::destroy_member_classifications,
        ),
        SeedStep::new(
            "member_type",
            steps::seed_member_types,
            steps::destroy_member_types,
        ),
        SeedStep::new("collateral", steps::seed_collaterals, steps::destroy_collaterals),
        SeedStep::new(
            "loan_status",
            steps::seed_loan_statuses,
            steps::destroy_loan_statuses,
        ),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SagaPhase {
    Seed,
    Destroy,
}

impl SagaPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Seed => "seed",
            Self::Destroy => "destroy",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub name: &'static str,
    pub rows: usize,
}

/// Outcome of a completed run. Aborted runs return [`SeedError`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub phase: SagaPhase,
    pub steps: Vec<StepReport>,
}

impl SeedReport {
    pub fn total_rows(&self) -> usize {
        self.steps.iter().map(|step| step.rows).sum()
    }

    pub fn rows_for(&self, name: &str) -> Option<usize> {
        self.steps
            .iter()
            .find(|step| step.name == name)
            .map(|step| step.rows)
    }
}

/// Aborted run: the failing step, its 1-based position in execution order,
/// and the steps that had completed before it.
#[derive(Debug)]
pub struct SeedError {
    pub phase: SagaPhase,
    pub step: &'static str,
    pub position: usize,
    pub completed: Vec<&'static str>,
    pub source: RegistryError,
}

impl Display for SeedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} aborted at step {} `{}`: {}",
            self.phase.as_str(),
            self.position,
            self.step,
            self.source
        )
    }
}

impl Error for SeedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// A freshly onboarded tenant.
#[derive(Debug, Clone)]
pub struct Onboarded {
    pub organization: Organization,
    pub branch: Branch,
    pub report: SeedReport,
}

/// Ordered seed/destroy sequence for one (organization, branch) scope.
#[derive(Debug, Clone)]
pub struct OrganizationSeeder {
    steps: Vec<SeedStep>,
}

impl Default for OrganizationSeeder {
    fn default() -> Self {
        Self::new(default_steps())
    }
}

impl OrganizationSeeder {
    pub fn new(steps: Vec<SeedStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[SeedStep] {
        &self.steps
    }

    /// Replaces the step named `name`; unknown names leave the list unchanged.
    pub fn with_step(mut self, name: &str, replace: impl FnOnce(SeedStep) -> SeedStep) -> Self {
        if let Some(step) = self.steps.iter_mut().find(|step| step.name == name) {
            *step = replace(*step);
        }
        self
    }

    /// Runs every seed function in order inside `tx`.
    pub fn seed(
        &self,
        core: &Core,
        ctx: &Context,
        tx: &Transaction<'_>,
        seed: &SeedScope,
    ) -> Result<SeedReport, SeedError> {
        self.run(SagaPhase::Seed, self.steps.iter(), seed.scope, |step| {
            (step.seed)(core, ctx, tx, seed)
        })
    }

    /// Runs every destroy function in reverse order inside `tx`.
    pub fn destroy(
        &self,
        core: &Core,
        ctx: &Context,
        tx: &Transaction<'_>,
        scope: &TenantScope,
    ) -> Result<SeedReport, SeedError> {
        self.run(SagaPhase::Destroy, self.steps.iter().rev(), *scope, |step| {
            (step.destroy)(core, ctx, tx, scope)
        })
    }

    /// Creates an organization and its first branch, then seeds the branch,
    /// all inside `tx`.
    pub fn onboard(
        &self,
        core: &Core,
        ctx: &Context,
        tx: &Transaction<'_>,
        organization: OrganizationRequest,
        branch: BranchRequest,
        user_id: Option<Uuid>,
    ) -> Result<Onboarded, SeedError> {
        let tenant_error = |source: RegistryError| SeedError {
            phase: SagaPhase::Seed,
            step: "tenant",
            position: 0,
            completed: Vec::new(),
            source,
        };

        let mut organization = organization.into_model(user_id);
        core.organizations()
            .create_with_tx(ctx, tx, &mut organization)
            .map_err(tenant_error)?;
        let mut branch = branch.into_model(organization.id(), user_id);
        core.branches()
            .create_with_tx(ctx, tx, &mut branch)
            .map_err(tenant_error)?;

        let scope = TenantScope::new(organization.id(), branch.id());
        let report = self.seed(core, ctx, tx, &SeedScope::new(scope, user_id))?;
        Ok(Onboarded {
            organization,
            branch,
            report,
        })
    }

    fn run<'s>(
        &self,
        phase: SagaPhase,
        ordered: impl Iterator<Item = &'s SeedStep>,
        scope: TenantScope,
        mut execute: impl FnMut(&SeedStep) -> RegistryResult<usize>,
    ) -> Result<SeedReport, SeedError> {
        let started_at = Instant::now();
        let mut completed = Vec::with_capacity(self.steps.len());

        for (index, step) in ordered.enumerate() {
            let step_started_at = Instant::now();
            match execute(step) {
                Ok(rows) => {
                    info!(
                        "event=seed_step module=seeder status=ok phase={} step={} rows={} organization_id={} branch_id={} duration_ms={}",
                        phase.as_str(),
                        step.name,
                        rows,
                        scope.organization_id,
                        scope.branch_id,
                        step_started_at.elapsed().as_millis()
                    );
                    completed.push(StepReport {
                        name: step.name,
                        rows,
                    });
                }
                Err(source) => {
                    error!(
                        "event=seed_run module=seeder status=aborted phase={} step={} position={} organization_id={} branch_id={} duration_ms={} error_code={}",
                        phase.as_str(),
                        step.name,
                        index + 1,
                        scope.organization_id,
                        scope.branch_id,
                        started_at.elapsed().as_millis(),
                        source.code()
                    );
                    return Err(SeedError {
                        phase,
                        step: step.name,
                        position: index + 1,
                        completed: completed.iter().map(|done| done.name).collect(),
                        source,
                    });
                }
            }
        }

        let report = SeedReport {
            phase,
            steps: completed,
        };
        info!(
            "event=seed_run module=seeder status=ok phase={} steps={} rows={} organization_id={} branch_id={} duration_ms={}",
            phase.as_str(),
            report.steps.len(),
            report.total_rows(),
            scope.organization_id,
            scope.branch_id,
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::{default_steps, OrganizationSeeder, SeedStep};
    use crate::registry::RegistryResult;

    #[test]
    fn default_order_matches_dependencies() {
        let names: Vec<_> = default_steps().iter().map(|step| step.name).collect();
        assert_eq!(
            names,
            vec![
                "bank",
                "bill_and_coins",
                "holiday",
                "general_ledger",
                "account",
                "account_classification",
                "account_category",
                "member_classification",
                "member_type",
                "collateral",
                "loan_status",
            ]
        );
    }

    #[test]
    fn with_step_replaces_only_the_named_step() {
        fn zero(
            _: &crate::app::Core,
            _: &crate::context::Context,
            _: &rusqlite::Transaction<'_>,
            _: &super::SeedScope,
        ) -> RegistryResult<usize> {
            Ok(0)
        }

        let seeder = OrganizationSeeder::default()
            .with_step("holiday", |step: SeedStep| step.with_seed(zero))
            .with_step("missing", |step: SeedStep| step.with_seed(zero));
        assert_eq!(seeder.steps().len(), 11);
        assert_eq!(seeder.steps()[2].seed as usize, zero as usize);
        assert_ne!(seeder.steps()[1].seed as usize, zero as usize);
    }
}
