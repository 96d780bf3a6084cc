pub mod bam;
pub mod bed;
pub mod distiller;
pub mod fastq;
pub mod pairs;
pub mod sample_list;
pub mod split;

pub use distiller::DistillerProject;
pub use fastq::resolve_fastq;
pub use sample_list::read_columns;
pub use sample_list::read_first;
pub use sample_list::select_index;
pub use split::splits;
pub use split::Split;

use anyhow::Context;
use tempfile::NamedTempFile;

/// Scratch file in the system temp folder, removed when dropped
pub fn temp_file(suffix: &str) -> anyhow::Result<NamedTempFile> {
    tempfile::Builder::new()
        .prefix("robtools-")
        .suffix(suffix)
        .tempfile()
        .context("Could not create temporary file")
}
