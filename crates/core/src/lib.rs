//! Pure domain logic for the pressroom newsletter backend.
//!
//! Nothing in this crate touches the database, the network, or the
//! filesystem. The `db` and `api` crates call into it before every write.

pub mod audience_import;
pub mod campaign_status;
pub mod contact_lifecycle;
pub mod csv_table;
pub mod delivery;
pub mod error;
pub mod header_resolver;
pub mod import_commit;
pub mod readiness;
pub mod segment;
pub mod types;
pub mod versioning;
