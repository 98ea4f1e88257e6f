//! # Formats
//!
//! Conversion between `GraphDocument` and its persisted representations.
//! Storage and transport live in the gateway backends and the app layer.

pub mod json;

pub use json::{
    WireDocument, WireEdge, WireNode, deserialize, from_json_str, serialize,
    to_json_pretty, to_json_string, wire_from_str,
};
