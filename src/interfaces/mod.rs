//! Outer surfaces: the HTTP submit/result endpoints and the CSV batch mode.

pub mod batch;
pub mod csv;
pub mod http;
