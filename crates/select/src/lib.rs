#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Mirror selection for apkidx
//!
//! Races every mirror, keeps the index with the newest verified signature
//! and writes it out.

pub mod arbiter;
pub mod output;
pub mod run;

pub use arbiter::{Arbiter, Offer, SelectionState};
pub use output::write_selection;
pub use run::select_freshest;
