pub mod controller;
pub mod router;
pub mod service;

pub use router::{init_admin_upgrade_requests_router, init_upgrade_requests_router};
