//! Maps free-text grocery lines to catalog products.

pub mod category;
pub mod query;
pub mod scorer;

pub use category::GroceryCategory;
pub use query::clean_search_query;
pub use scorer::{rank_candidates, score_product, RankedCandidate};
