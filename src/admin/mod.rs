//! Review dashboard: aggregate stats, the three-way filter, remote-first
//! mutations, and the gated HTTP surface that serves them.

pub mod dashboard;
pub mod router;
pub mod service;

pub use dashboard::{filter_applications, ApplicationFilter, DashboardStats};
pub use router::admin_router;
pub use service::{AdminError, AdminService, DashboardOverview, DocumentFetch};
