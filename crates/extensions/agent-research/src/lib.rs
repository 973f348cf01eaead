//! # Tandem research assistant
//!
//! A research agent that searches the web and hands email drafting to a
//! dedicated email agent through a delegation tool. Both agents charge one
//! shared usage ledger per top-level run.

pub mod draft;
pub mod email;
pub mod research;
pub mod search;
pub mod system;

pub use draft::{DraftEmailTool, DraftStore, EmailDraft, InMemoryDraftStore, StoredDraft};
pub use email::{email_agent, email_agent_with_tools, email_toolset, EmailAgent, EMAIL_SYSTEM_PROMPT};
pub use research::{email_delegation, research_agent, ResearchAgent, EMAIL_REQUEST_TEMPLATE};
pub use search::{SearchBackend, SearchHit, SearchWebTool, StaticSearchBackend, MAX_RESULTS_KEY};
pub use system::{ResearchSystem, ResearchSystemBuilder, SystemError};
