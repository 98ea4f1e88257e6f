//! # pathway
//!
//! Library side of the Pathway binary: the HTTP storage API and the layered
//! configuration. The CLI lives in the binary target.

pub mod api;
pub mod config;
