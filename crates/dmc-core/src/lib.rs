#![deny(missing_docs)]
#![doc = "Shared error type and deterministic random streams for the diagrammatic Monte Carlo crates."]

pub mod errors;
pub mod rng;

pub use errors::{DmcError, ErrorInfo};
pub use rng::{derive_substream_seed, RngHandle};
