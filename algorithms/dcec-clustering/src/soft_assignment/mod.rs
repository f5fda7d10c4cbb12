mod algorithm;
mod centers;
mod errors;
mod hyperparams;

pub use algorithm::*;
pub use centers::*;
pub use errors::*;
pub use hyperparams::*;
