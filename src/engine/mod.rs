//! Engine module: jobs, archive handling, the build seam, CLI plumbing

pub mod archive;
pub mod arg_parser;
pub mod builder;
pub mod cli;
pub mod job;
pub mod progress;
pub mod tools;

// Re-export commonly used items
pub use archive::{Archiver, CommandArchiver, Compression};
pub use arg_parser::Cli;
pub use builder::{RootTreeBuilder, SerializedBuilder, TreeBuilder};
pub use cli::handle_run;
pub use job::{Job, JobContext};
pub use tools::{expected_output_path, parse_file_list, read_source, split_input_name};
