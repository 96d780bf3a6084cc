mod command_to_string;
mod expand_and_resolve_path;
mod thread_count;

pub use command_to_string::command_to_string;
pub use expand_and_resolve_path::expand_and_resolve_path;
pub use thread_count::extra_threads;
