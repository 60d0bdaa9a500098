pub mod ats;
pub mod extract;
pub mod handlers;
pub mod impact;
pub mod prompts;
