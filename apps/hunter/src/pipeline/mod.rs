// Hunt pipeline: scouting -> ranking -> tailoring.
// Scouting runs in a child process; ranking and tailoring go through the
// judgment capability in llm_client.

pub mod error;
pub mod extractor;
pub mod handlers;
pub mod orchestrator;
pub mod profile;
pub mod prompts;
pub mod ranking;
pub mod scout;
pub mod tailoring;

#[cfg(test)]
mod testing;

pub use error::{PipelineError, Stage};
pub use orchestrator::Pipeline;
