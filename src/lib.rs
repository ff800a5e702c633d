#![doc = "The `planforge_auth` library crate."]
#![doc = ""]
#![doc = "This crate contains the credential and session subsystem of the PlanForge"]
#![doc = "schedule manager: signed token issuance and verification, the Redis-backed"]
#![doc = "refresh-session store, the one-time-password reset flow, OAuth2 federated"]
#![doc = "login, routing configuration, and error handling. It is used by the main"]
#![doc = "binary (`main.rs`) to construct and run the application."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
