/// The cybercrime complaints dataset
pub mod complaints;

pub use complaints::{Dataset, Item, Taxonomy, TaxonomyError, MISSING_LABEL};
