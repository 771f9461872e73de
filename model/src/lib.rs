mod quote;
mod source;

pub use quote::{round_cents, PriceQuote, Snapshot};
pub use source::Source;
