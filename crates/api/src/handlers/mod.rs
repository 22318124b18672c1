//! HTTP handlers, one module per resource.

pub mod clients;
pub mod contacts;
pub mod imports;
pub mod newsletters;
pub mod segments;
pub mod versions;
