//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod client_repo;
pub mod contact_repo;
pub mod newsletter_repo;
pub mod newsletter_version_repo;
pub mod segment_repo;

pub use client_repo::ClientRepo;
pub use contact_repo::ContactRepo;
pub use newsletter_repo::NewsletterRepo;
pub use newsletter_version_repo::NewsletterVersionRepo;
pub use segment_repo::SegmentRepo;
