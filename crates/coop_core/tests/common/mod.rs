#![allow(dead_code)]

use coop_core::db::open_db_in_memory;
use coop_core::entities::{Bank, BankRequest, BranchRequest, OrganizationRequest};
use coop_core::{Context, Core, DeleteMode, MemoryBroker, TenantScope};
use rusqlite::Connection;
use std::sync::Arc;

pub struct Fixture {
    pub core: Core,
    pub broker: Arc<MemoryBroker>,
    pub conn: Connection,
    pub ctx: Context,
}

pub fn fixture() -> Fixture {
    fixture_with(DeleteMode::Soft)
}

pub fn fixture_with(delete_mode: DeleteMode) -> Fixture {
    let broker = Arc::new(MemoryBroker::new());
    Fixture {
        core: Core::new(broker.clone(), delete_mode),
        broker,
        conn: open_db_in_memory().unwrap(),
        ctx: Context::background(),
    }
}

impl Fixture {
    /// Creates an organization with one branch and drops their publishes.
    pub fn tenant(&mut self, name: &str) -> TenantScope {
        let mut organization = OrganizationRequest {
            name: name.to_string(),
            description: String::new(),
            is_private: false,
        }
        .into_model(None);
        self.core
            .organizations()
            .create(&self.ctx, &mut self.conn, &mut organization)
            .unwrap();

        let mut branch = BranchRequest {
            name: format!("{name} main"),
            branch_type: "main".to_string(),
            email: String::new(),
            address: String::new(),
        }
        .into_model(organization.record.id, None);
        self.core
            .branches()
            .create(&self.ctx, &mut self.conn, &mut branch)
            .unwrap();

        self.broker.take();
        TenantScope::new(organization.record.id, branch.record.id)
    }

    pub fn bank(&mut self, scope: TenantScope, name: &str) -> Bank {
        let mut bank = BankRequest {
            name: name.to_string(),
            description: format!("{name} description"),
        }
        .into_model(scope, None);
        self.core
            .banks()
            .create(&self.ctx, &mut self.conn, &mut bank)
            .unwrap();
        bank
    }

    pub fn count_rows(&self, table: &str) -> i64 {
        self.conn
            .query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
                row.get(0)
            })
            .unwrap()
    }
}
