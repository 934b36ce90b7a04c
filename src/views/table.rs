use std::fmt;

use serde::Serialize;

use super::Tabular;
use crate::models::User;
use crate::policy::{Action, Policy};

/// One table row with the controls the viewer may use on it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowView {
    pub id: String,
    pub cells: Vec<String>,
    pub can_edit: bool,
    pub can_delete: bool,
}

/// Render model of a resource list: rows, per-row controls and the
/// page-level create control, or an inline status message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TablePage {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<RowView>,
    pub can_create: bool,
    /// Loading or error text shown instead of rows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    pub empty_message: String,
}

impl TablePage {
    pub fn build<T: Tabular>(records: &[T], viewer: &User, policy: &dyn Policy) -> Self {
        let rows = records
            .iter()
            .map(|record| RowView {
                id: record.id().to_string(),
                cells: record.cells(),
                can_edit: policy.allows(viewer, T::KIND, Action::Edit, record.assignee()),
                can_delete: policy.allows(viewer, T::KIND, Action::Delete, record.assignee()),
            })
            .collect();

        let can_create = policy.allows(viewer, T::KIND, Action::Create, None);
        let empty_message = if can_create {
            format!("{} Create one!", T::EMPTY)
        } else {
            T::EMPTY.to_string()
        };

        Self {
            title: T::TITLE.to_string(),
            headers: T::headers().iter().map(|h| h.to_string()).collect(),
            rows,
            can_create,
            notice: None,
            empty_message,
        }
    }

    /// Page with no rows and no controls, only a status line.
    pub fn notice<T: Tabular>(message: impl Into<String>) -> Self {
        Self {
            title: T::TITLE.to_string(),
            headers: T::headers().iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
            can_create: false,
            notice: Some(message.into()),
            empty_message: T::EMPTY.to_string(),
        }
    }

    /// Whether any create, edit or delete control is visible.
    pub fn has_controls(&self) -> bool {
        self.can_create || self.rows.iter().any(|r| r.can_edit || r.can_delete)
    }

    pub fn row(&self, id: &str) -> Option<&RowView> {
        self.rows.iter().find(|r| r.id == id)
    }
}

impl fmt::Display for TablePage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;

        if let Some(notice) = &self.notice {
            return writeln!(f, "{}", notice);
        }
        if self.rows.is_empty() {
            return writeln!(f, "{}", self.empty_message);
        }

        let show_actions = self.rows.iter().any(|r| r.can_edit || r.can_delete);
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.cells.iter().enumerate() {
                if let Some(width) = widths.get_mut(i) {
                    *width = (*width).max(cell.chars().count());
                }
            }
        }

        let mut header: Vec<String> = self
            .headers
            .iter()
            .zip(&widths)
            .map(|(h, w)| format!("{:<width$}", h, width = *w))
            .collect();
        if show_actions {
            header.push("ACTIONS".to_string());
        }
        let header = header.join("  ");
        writeln!(f, "{}", header.trim_end())?;
        writeln!(f, "{}", "-".repeat(header.trim_end().chars().count()))?;

        for row in &self.rows {
            let mut cells: Vec<String> = row
                .cells
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:<width$}", c, width = *w))
                .collect();
            if show_actions {
                let actions: Vec<&str> = [(row.can_edit, "edit"), (row.can_delete, "delete")]
                    .into_iter()
                    .filter_map(|(allowed, label)| allowed.then_some(label))
                    .collect();
                cells.push(actions.join(","));
            }
            writeln!(f, "{}", cells.join("  ").trim_end())?;
        }

        if self.can_create {
            writeln!(f)?;
            writeln!(f, "{} item(s). New entries can be created.", self.rows.len())?;
        } else {
            writeln!(f)?;
            writeln!(f, "{} item(s).", self.rows.len())?;
        }
        Ok(())
    }
}
