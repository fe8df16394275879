pub mod buckets;
pub mod sessions;
pub mod summaries;
