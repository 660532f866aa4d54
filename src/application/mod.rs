pub mod dashboard;
pub mod services;
pub mod snapshot;

pub use dashboard::{Dashboard, DashboardPorts, DashboardSettings};
pub use snapshot::{DashboardSnapshot, KeyCounts, KeyRow, ListSnapshot, NavSelection};
