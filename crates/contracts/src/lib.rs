//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Length Model
//! - Every length (fragment, block, threshold) counts chars, not bytes
//! - Fragments inside a block are joined by [`BLOCK_SEPARATOR`]

mod batching;
mod blueprint;
mod chat;
mod error;
mod fragment;
mod sink;

pub use batching::*;
pub use blueprint::*;
pub use chat::*;
pub use error::*;
pub use fragment::{Fragment, BLOCK_SEPARATOR};
pub use sink::*;
