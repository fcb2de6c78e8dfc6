//! One-off maintenance jobs run from the command line

pub mod seed;
pub mod uploads_audit;

pub use seed::{default_menu, seed_menu};
pub use uploads_audit::{MissingUpload, find_missing, fix_missing};
