//! Authentication primitives.
//!
//! Pressroom does not issue sessions itself; it only verifies bearer tokens
//! minted by the surrounding platform so it can attribute authored content.

pub mod jwt;
