//! Hunter: scouts job listings, ranks them against a candidate profile and
//! tailors an application package for the best match.
//!
//! The HTTP service (`hunter`), the one-shot CLI (`hunt`) and the isolated
//! scouting child process (`scout`) are thin binaries over this library.

pub mod config;
pub mod errors;
pub mod fetch;
pub mod llm_client;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod state;
