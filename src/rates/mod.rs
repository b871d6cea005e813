//! Rate resolution: index variation between two dates

mod resolver;
mod weighted;

pub use resolver::{resolve, IndexKind, RateError, RateResolver, Variation};
pub use weighted::{ripte_weighted, RipteDataset};
