//! The horn itself, independent of any browser API. Platform pieces plug in
//! through the traits declared in these modules.

pub mod ambient;
pub mod analytics;
pub mod asset;
pub mod backend;
pub mod controller;
pub mod engine;
pub mod error;
pub mod hook;
pub mod install;
pub mod page;
pub mod remote;

#[cfg(test)]
mod testing;
