//! Common types used across the Tandem workspace.

mod common;
mod message;
mod trace;

pub use common::*;
pub use message::*;
pub use trace::*;
