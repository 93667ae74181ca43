//! Command line entry point for tenant onboarding and teardown.
//!
//! # Responsibility
//! - Open the configured database and run one seeder operation per call.
//! - Print a deterministic JSON outcome on stdout; errors go to stderr.
//!
//! # Invariants
//! - Every mutating command runs in one transaction that commits only when
//!   the whole sequence succeeded.

use clap::{Args, Parser, Subcommand};
use coop_core::entities::{BranchRequest, OrganizationRequest};
use coop_core::{
    Context, Core, CoreConfig, DeleteMode, FilterClause, LogBroker, OrganizationSeeder,
    SeedReport, SeedScope, TenantScope,
};
use serde_json::{json, Value};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "coop")]
#[command(version)]
#[command(about = "Seed and inspect cooperative tenant reference data")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// SQLite database file; an in-memory database when omitted
    #[arg(long, global = true, env = "COOP_DB_PATH")]
    db: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true, env = "COOP_LOG_LEVEL")]
    log_level: Option<String>,

    /// Directory for rolling log files
    #[arg(long, global = true, env = "COOP_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// soft|hard
    #[arg(long, global = true, default_value = "soft")]
    delete_mode: DeleteMode,
}

#[derive(Subcommand)]
enum Command {
    /// Create an organization with its main branch and seed the branch
    InitTenant {
        #[arg(long)]
        organization: String,

        #[arg(long)]
        branch: String,

        #[arg(long, default_value = "main")]
        branch_type: String,

        /// Acting user stamped on audit columns
        #[arg(long)]
        user: Option<Uuid>,
    },

    /// Seed reference data into an existing branch
    Seed {
        #[command(flatten)]
        scope: ScopeArgs,

        #[arg(long)]
        user: Option<Uuid>,
    },

    /// Remove the reference data of a branch
    Destroy {
        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Count live reference rows of a branch
    Summary {
        #[command(flatten)]
        scope: ScopeArgs,
    },
}

#[derive(Args)]
struct ScopeArgs {
    #[arg(long)]
    organization_id: Uuid,

    #[arg(long)]
    branch_id: Uuid,
}

impl ScopeArgs {
    fn scope(&self) -> TenantScope {
        TenantScope::new(self.organization_id, self.branch_id)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<Value, Box<dyn Error>> {
    let mut config = CoreConfig {
        db_path: cli.db,
        log_dir: cli.log_dir,
        delete_mode: cli.delete_mode,
        ..CoreConfig::default()
    };
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Err(err) = config.init_logging() {
        eprintln!("warning: logging disabled: {err}");
    }

    let core = Core::from_config(&config, Arc::new(LogBroker));
    let ctx = Context::background();
    let seeder = OrganizationSeeder::default();
    let mut conn = config.open_db()?;

    match cli.command {
        Command::InitTenant {
            organization,
            branch,
            branch_type,
            user,
        } => {
            let tx = conn.transaction()?;
            let onboarded = seeder.onboard(
                &core,
                &ctx,
                &tx,
                OrganizationRequest {
                    name: organization,
                    description: String::new(),
                    is_private: false,
                },
                BranchRequest {
                    name: branch,
                    branch_type,
                    email: String::new(),
                    address: String::new(),
                },
                user,
            )?;
            tx.commit()?;
            Ok(json!({
                "organization_id": onboarded.organization.record.id,
                "branch_id": onboarded.branch.record.id,
                "seeded": report_json(&onboarded.report),
            }))
        }
        Command::Seed { scope, user } => {
            let tx = conn.transaction()?;
            let report = seeder.seed(&core, &ctx, &tx, &SeedScope::new(scope.scope(), user))?;
            tx.commit()?;
            Ok(json!({ "seeded": report_json(&report) }))
        }
        Command::Destroy { scope } => {
            let tx = conn.transaction()?;
            let report = seeder.destroy(&core, &ctx, &tx, &scope.scope())?;
            tx.commit()?;
            Ok(json!({ "destroyed": report_json(&report) }))
        }
        Command::Summary { scope } => summary(&core, &ctx, &conn, scope.scope()),
    }
}

fn report_json(report: &SeedReport) -> Value {
    let steps: serde_json::Map<String, Value> = report
        .steps
        .iter()
        .map(|step| (step.name.to_string(), json!(step.rows)))
        .collect();
    json!({ "steps": steps, "total_rows": report.total_rows() })
}

fn summary(
    core: &Core,
    ctx: &Context,
    conn: &rusqlite::Connection,
    scope: TenantScope,
) -> Result<Value, Box<dyn Error>> {
    let filters: Vec<FilterClause> = scope.filters();
    Ok(json!({
        "core_version": coop_core::core_version(),
        "organization_id": scope.organization_id,
        "branch_id": scope.branch_id,
        "counts": {
            "bank": core.banks().arr_count(ctx, conn, &filters)?,
            "bill_and_coins": core.bill_and_coins().arr_count(ctx, conn, &filters)?,
            "holiday": core.holidays().arr_count(ctx, conn, &filters)?,
            "general_ledger_accounts_grouping": core
                .general_ledger_accounts_groupings()
                .arr_count(ctx, conn, &filters)?,
            "general_ledger_definition": core
                .general_ledger_definitions()
                .arr_count(ctx, conn, &filters)?,
            "account": core.accounts().arr_count(ctx, conn, &filters)?,
            "account_classification": core.account_classifications().arr_count(ctx, conn, &filters)?,
            "account_category": core.account_categories().arr_count(ctx, conn, &filters)?,
            "member_classification": core.member_classifications().arr_count(ctx, conn, &filters)?,
            "member_type": core.member_types().arr_count(ctx, conn, &filters)?,
            "collateral": core.collaterals().arr_count(ctx, conn, &filters)?,
            "loan_status": core.loan_statuses().arr_count(ctx, conn, &filters)?,
        },
    }))
}
