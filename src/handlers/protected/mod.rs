// handlers/protected/mod.rs - endpoints behind the JWT middleware
//
// Every handler here receives the caller as `Extension<Principal>`.
pub mod auth;
pub mod dashboard;
pub mod leases;
pub mod maintenance;
pub mod payments;
pub mod properties;
pub mod resource;
pub mod users;
