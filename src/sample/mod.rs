//! Loading of latency sample tables (tab-separated, one row per core and NUMA node).

pub mod parse;
pub mod row;

pub use parse::parse_sample_file;
pub use row::SampleSet;
