//! Result persistence: one JSON object per line.

mod jsonl;
mod run_id;


pub use jsonl::JsonlReader;
pub use jsonl::JsonlWriter;
pub use jsonl::Record;
pub use run_id::new_run_id;
