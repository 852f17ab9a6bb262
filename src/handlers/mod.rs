// handlers/mod.rs - two security tiers
//
// Public (no auth) → Protected (Bearer JWT, see middleware::jwt_auth_middleware)
pub mod protected;
pub mod public;
