use crate::application::services::stats_aggregator::TrendState;
use crate::domain::entities::{ListKind, NoteworthyEntry, StatsSnapshot, TimeRange};

/// Active navigation selection. Only `Dashboard` is rendered in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavSelection {
    #[default]
    Dashboard,
    Config,
    Logs,
}

impl NavSelection {
    pub fn as_str(&self) -> &'static str {
        match self {
            NavSelection::Dashboard => "dashboard",
            NavSelection::Config => "config",
            NavSelection::Logs => "logs",
        }
    }
}

impl std::str::FromStr for NavSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dashboard" => Ok(NavSelection::Dashboard),
            "config" => Ok(NavSelection::Config),
            "logs" => Ok(NavSelection::Logs),
            other => Err(format!("unknown destination: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRow {
    pub key: String,
    pub failure_count: u64,
    pub selected: bool,
}

/// Render state of one paginated list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSnapshot {
    pub kind: ListKind,
    pub rows: Vec<KeyRow>,
    pub page: u32,
    pub total_pages: u32,
    /// Raw search box contents
    pub search_input: String,
    /// Debounced term the rows belong to
    pub search: String,
    pub loading: bool,
    pub loaded: bool,
    pub error: Option<String>,
    pub selected_count: usize,
    /// State of the select-all checkbox
    pub all_visible_selected: bool,
}

impl ListSnapshot {
    pub fn page_label(&self) -> String {
        format!("Page {} of {}", self.page, self.total_pages)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.rows.iter().map(|row| row.key.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteworthySnapshot {
    pub status_code: u16,
    pub limit: u32,
    pub entries: Vec<NoteworthyEntry>,
    pub loaded: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendSnapshot {
    pub range: TimeRange,
    pub state: TrendState,
    pub error: Option<String>,
}

/// Key statistics card: counts of the loaded pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyCounts {
    pub valid: usize,
    pub invalid: usize,
    pub total: usize,
}

/// Everything needed to draw the dashboard once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSnapshot {
    pub nav: NavSelection,
    pub valid: ListSnapshot,
    pub invalid: ListSnapshot,
    pub stats: Option<StatsSnapshot>,
    pub stats_error: Option<String>,
    pub trend: TrendSnapshot,
    pub noteworthy: NoteworthySnapshot,
    pub counts: KeyCounts,
    /// Number of composite refreshes issued so far
    pub refresh_cycles: u64,
    /// Outcome of the last user action, if worth showing
    pub notice: Option<String>,
}

impl DashboardSnapshot {
    pub fn list(&self, kind: ListKind) -> &ListSnapshot {
        match kind {
            ListKind::Valid => &self.valid,
            ListKind::Invalid => &self.invalid,
        }
    }
}
