//! Application layer orchestrating the request lifecycle.
//!
//! `SupplementService` accepts submissions and answers polls, `Dispatcher`
//! turns queued requests into results, and `Pipeline` wires both to a shared
//! store and transport.

pub mod dispatcher;
pub mod pipeline;
pub mod service;
