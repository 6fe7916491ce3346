//! Repository layer: one zero-sized repo per table, taking the pool per call.

pub mod listing_repo;

pub use listing_repo::ListingRepo;
