use std::fmt;

use serde::Serialize;

use rust_decimal::Decimal;

use crate::models::{Asset, Part, User, WorkOrder};
use crate::policy::{Action, Policy};
use crate::types::ResourceKind;

/// Entry of the main navigation menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub label: &'static str,
    pub path: &'static str,
}

impl NavItem {
    const fn new(label: &'static str, path: &'static str) -> Self {
        Self { label, path }
    }
}

/// Menu for `user`. User management is listed only for roles the policy
/// lets read users.
pub fn navigation(user: &User, policy: &dyn Policy) -> Vec<NavItem> {
    let mut items = vec![
        NavItem::new("Dashboard", "/dashboard"),
        NavItem::new("Assets", "/assets"),
        NavItem::new("Work orders", "/work-orders"),
        NavItem::new("Inventory", "/inventory"),
    ];
    if policy.allows(user, ResourceKind::Users, Action::Read, None) {
        items.push(NavItem::new("Users", "/users"));
    }
    items.push(NavItem::new("Settings", "/settings"));
    items
}

/// Counts shown under the greeting when they could be loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub assets: usize,
    pub open_work_orders: usize,
    pub parts_to_reorder: usize,
    /// Total stock value of parts with a unit cost. None on overflow.
    pub inventory_value: Option<Decimal>,
}

impl Summary {
    pub fn tally(assets: &[Asset], orders: &[WorkOrder], parts: &[Part]) -> Self {
        let inventory_value = parts
            .iter()
            .filter(|part| part.unit_cost.is_some())
            .try_fold(Decimal::ZERO, |total, part| {
                part.stock_value().and_then(|value| total.checked_add(value))
            });

        Self {
            assets: assets.len(),
            open_work_orders: orders.iter().filter(|o| !o.status.is_terminal()).count(),
            parts_to_reorder: parts.iter().filter(|p| p.needs_reorder()).count(),
            inventory_value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub greeting: String,
    pub navigation: Vec<NavItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
}

impl Dashboard {
    pub fn new(user: &User, policy: &dyn Policy) -> Self {
        Self {
            greeting: format!("Welcome, {} (role: {})", user.display_name(), user.role),
            navigation: navigation(user, policy),
            summary: None,
        }
    }

    pub fn with_summary(mut self, summary: Summary) -> Self {
        self.summary = Some(summary);
        self
    }
}

impl fmt::Display for Dashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CMMS Dashboard")?;
        writeln!(f, "{}", self.greeting)?;
        writeln!(f)?;
        for item in &self.navigation {
            writeln!(f, "  {:<15} {}", item.label, item.path)?;
        }
        if let Some(summary) = &self.summary {
            writeln!(f)?;
            writeln!(f, "  {:<20} {}", "Assets:", summary.assets)?;
            writeln!(f, "  {:<20} {}", "Open work orders:", summary.open_work_orders)?;
            writeln!(f, "  {:<20} {}", "Parts to reorder:", summary.parts_to_reorder)?;
            if let Some(value) = summary.inventory_value {
                writeln!(f, "  {:<20} {}", "Inventory value:", value)?;
            }
        }
        Ok(())
    }
}
