//! Domain types and pure rules: households, amounts, result slots, the
//! validator, the eligibility engine, and the ports adapters implement.

pub mod household;
pub mod ports;
pub mod rules;
pub mod slot;
pub mod supplement;
pub mod validation;
