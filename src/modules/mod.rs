pub mod auth;
pub mod communications;
pub mod health;
pub mod notifications;
pub mod public;
pub mod roles;
pub mod settings;
pub mod upgrade_requests;
pub mod uploads;
pub mod users;
