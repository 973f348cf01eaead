//! Tool protocol definitions.
//!
//! Tools are the capabilities an agent may invoke during a run.

mod context;
mod definition;
mod result;
mod traits;

pub use context::*;
pub use definition::*;
pub use result::*;
pub use traits::*;
