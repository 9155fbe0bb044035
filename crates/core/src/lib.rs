//! `roster-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** types (no infrastructure concerns):
//! the user record, its closed enumerated attributes, and the partial-update
//! representation applied by the background worker.

pub mod error;
pub mod user;

pub use error::{DomainError, DomainResult};
pub use user::{BloodStatus, Gender, House, NewUser, User, UserId, UserPatch};
