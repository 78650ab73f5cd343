pub mod filter;

pub use filter::{filter_candidates, select_for_oracle, Candidate};
