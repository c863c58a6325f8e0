//! Decode adapters, one per supported format.
//!
//! Every adapter has the shape of [`crate::registry::DecodeFn`] and defers
//! all reading until the first entry is requested.

pub(crate) mod catalog;
pub(crate) mod compressed;
pub(crate) mod tar;
