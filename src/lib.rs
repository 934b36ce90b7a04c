pub mod api;
pub mod cache;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod guard;
pub mod models;
pub mod policy;
pub mod session;
pub mod types;
pub mod views;

pub use client::CmmsClient;
pub use config::ClientConfig;
pub use error::ClientError;
pub use guard::{GuardDecision, RouteGuard};
pub use policy::{Action, Permission, Policy, PolicyOverrides, RolePolicy};
pub use session::{FileTokenStore, MemoryTokenStore, Session, SessionContext, SessionPhase, TokenStore};
