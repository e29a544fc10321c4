pub mod controller;
pub mod google;
pub mod router;
pub mod service;

pub use router::init_auth_router;
