//! Adapters for the domain ports: the in-memory correlation store and the
//! in-process publish/subscribe bus.

pub mod bus;
pub mod in_memory;
