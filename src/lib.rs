//! Local media-processing job server: submit files, run a processor, poll progress,
//! download the result.

pub mod config;
pub mod error;
pub mod http;
pub mod jobs;
pub mod logging;
pub mod pipeline;
pub mod processors;
pub mod reaper;
pub mod registry;
pub mod store;
