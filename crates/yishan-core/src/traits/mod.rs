//! Repository traits (ports)

mod repositories;

pub use repositories::{purge_cutoff, RepoResult, TokenRepository, UserRepository};
