//! View layer: render models for resource tables, the dashboard and the
//! role-dependent navigation. Output is plain text or JSON.

pub mod layout;
pub mod list;
pub mod table;

pub use layout::{navigation, Dashboard, NavItem, Summary};
pub use list::{ListView, ViewState};
pub use table::{RowView, TablePage};

use crate::models::{Asset, Part, User, WorkOrder};
use crate::types::Record;

/// Records that can be shown as table rows.
pub trait Tabular: Record {
    const TITLE: &'static str;
    const EMPTY: &'static str;

    fn headers() -> &'static [&'static str];

    fn cells(&self) -> Vec<String>;
}

fn or_dash(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}

impl Tabular for Asset {
    const TITLE: &'static str = "Assets";
    const EMPTY: &'static str = "No assets registered.";

    fn headers() -> &'static [&'static str] {
        &["ID", "NAME", "TYPE", "STATUS", "LOCATION", "NEXT MAINTENANCE"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.asset_type.to_string(),
            self.status.to_string(),
            or_dash(Some(&self.location)),
            self.next_maintenance_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string()),
        ]
    }
}

impl Tabular for WorkOrder {
    const TITLE: &'static str = "Work orders";
    const EMPTY: &'static str = "No work orders registered.";

    fn headers() -> &'static [&'static str] {
        &["ID", "TITLE", "ASSET", "ASSIGNED TO", "STATUS", "PRIORITY", "DUE"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.title.clone(),
            self.asset_name.clone().unwrap_or_else(|| self.asset.clone()),
            self.assigned_to_username
                .clone()
                .or_else(|| self.assigned_to.clone())
                .unwrap_or_else(|| "Unassigned".to_string()),
            self.status.to_string(),
            self.priority.to_string(),
            self.due_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string()),
        ]
    }
}

impl Tabular for Part {
    const TITLE: &'static str = "Inventory";
    const EMPTY: &'static str = "No parts registered.";

    fn headers() -> &'static [&'static str] {
        &["ID", "NAME", "SKU", "QTY", "REORDER AT", "UNIT COST", "LOCATION"]
    }

    fn cells(&self) -> Vec<String> {
        let quantity = if self.needs_reorder() {
            format!("{} (low)", self.quantity)
        } else {
            self.quantity.to_string()
        };
        vec![
            self.id.clone(),
            self.name.clone(),
            or_dash(self.sku.as_deref()),
            quantity,
            self.reorder_point
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string()),
            self.unit_cost
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".to_string()),
            or_dash(self.location.as_deref()),
        ]
    }
}

impl Tabular for User {
    const TITLE: &'static str = "Users";
    const EMPTY: &'static str = "No users registered.";

    fn headers() -> &'static [&'static str] {
        &["ID", "USERNAME", "NAME", "EMAIL", "ROLE", "ACTIVE"]
    }

    fn cells(&self) -> Vec<String> {
        let full_name = self.full_name();
        vec![
            self.id.clone(),
            self.username.clone(),
            or_dash(Some(&full_name)),
            or_dash(Some(&self.email)),
            self.role.to_string(),
            match self.is_active {
                Some(true) => "yes".to_string(),
                Some(false) => "no".to_string(),
                None => "-".to_string(),
            },
        ]
    }
}
