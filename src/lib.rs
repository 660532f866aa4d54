pub mod application;
pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use application::{Dashboard, DashboardPorts, DashboardSettings, DashboardSnapshot};
pub use config::{Config, ConfigError};
pub use domain::entities::{ListKind, TimeRange};
pub use domain::errors::{MutationError, ServiceError};
