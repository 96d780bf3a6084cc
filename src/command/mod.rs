use std::path::Path;

use anyhow::Result;

use crate::fileformat::{read_first, select_index};
use crate::runtime::Error;

pub mod constants;

pub mod bam2bed;
pub mod bowtie2;
pub mod bwa;
pub mod centerannotations;
pub mod chipexoqual;
pub mod distillerresolutions;
pub mod download;
pub mod filterbam;
pub mod fitdoublegaussian;
pub mod fitgaussians;
pub mod genomecov;
pub mod keeprandomreads;
pub mod keeprandomreadsbam;
pub mod merge;
pub mod pairs2hic;
pub mod plot2do;
pub mod printsample;
pub mod shiftannotations;
pub mod siqchip;
pub mod siqchipbed;
pub mod slowsplit;
pub mod statistics;
pub mod trimmomatic;

pub use bam2bed::Bam2BedCMD;
pub use bowtie2::Bowtie2CMD;
pub use bwa::BwaCMD;
pub use centerannotations::CenterAnnotationsCMD;
pub use chipexoqual::ChipexoQualCMD;
pub use distillerresolutions::DistillerResolutionsCMD;
pub use download::DownloadCMD;
pub use filterbam::FilterBamCMD;
pub use fitdoublegaussian::FitDoubleGaussianCMD;
pub use fitgaussians::FitGaussiansCMD;
pub use genomecov::GenomeCovCMD;
pub use keeprandomreads::KeepRandomReadsCMD;
pub use keeprandomreadsbam::KeepRandomReadsBamCMD;
pub use merge::MergeCMD;
pub use pairs2hic::Pairs2HicCMD;
pub use plot2do::Plot2doCMD;
pub use printsample::PrintSampleCMD;
pub use shiftannotations::ShiftAnnotationsCMD;
pub use siqchip::SiqchipCMD;
pub use siqchipbed::SiqchipBedCMD;
pub use slowsplit::SlowSplitCMD;
pub use statistics::StatisticsCMD;
pub use trimmomatic::TrimmomaticCMD;

/// Sample names of a sample list, or only the one at `index`
pub fn sample_names(path: &Path, index: Option<usize>) -> Result<Vec<String>> {
    select_index(read_first(path)?, index)
}

/// Commands that write next to their input refuse to overwrite it
pub fn check_suffixes(input: &str, output: &str) -> Result<()> {
    if input == output {
        return Err(Error::invalid_option(
            "--output-suffix",
            Some("output suffix must be different from input suffix"),
        )
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.txt");
        std::fs::write(&path, "#sample\tsrr\nPOLR2A\tSRR9000001\n\nASDURF\tSRR9000002\n").unwrap();

        assert_eq!(sample_names(&path, None).unwrap(), vec!["POLR2A", "ASDURF"]);
        assert_eq!(sample_names(&path, Some(1)).unwrap(), vec!["ASDURF"]);
        assert!(sample_names(&path, Some(2)).is_err());
        assert!(sample_names(&dir.path().join("missing.txt"), None).is_err());
    }

    #[test]
    fn test_check_suffixes() {
        assert!(check_suffixes("", "-forcov").is_ok());
        let err = check_suffixes("-cov", "-cov").unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::InvalidOption { .. })));
    }
}
