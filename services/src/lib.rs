pub mod ids;
pub mod indexer;

pub use ids::generate_id;
pub use indexer::SearchIndexer;
