pub mod command;
pub mod exec;
pub mod fileformat;
pub mod fit;
pub mod runtime;
pub mod utils;
