use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use super::constants::DEFAULT_PATH_SAMPLES;
use crate::fileformat::read_columns;
use crate::runtime::Error;

#[derive(Args)]
pub struct PrintSampleCMD {
    #[arg(short = 's', long = "samples", default_value = DEFAULT_PATH_SAMPLES)]
    /// Sample names listed one sample name by line
    pub path_samples: PathBuf,

    #[arg(short = 'p', long = "replicates", overrides_with = "hide_replicates")]
    /// Show all columns (replicates for dataset file) with the suffix appended
    pub replicates: bool,

    #[arg(short = 'u', long = "hide-replicates", overrides_with = "replicates")]
    /// Only show the first column
    pub hide_replicates: bool,

    #[arg(long = "suffix", default_value = "")]
    /// Suffix added to sample name
    pub suffix: String,

    #[arg(short = 'i', long = "index")]
    /// Index of sample to print in samples file
    pub index: usize,
}
impl PrintSampleCMD {
    /// Run the commandline option
    pub fn try_execute(&mut self) -> Result<()> {
        let line = PrintSample::run(&PrintSample {
            path_samples: self.path_samples.clone(),
            replicates: self.replicates && !self.hide_replicates,
            suffix: self.suffix.clone(),
            index: self.index,
        })?;
        println!("{}", line);
        Ok(())
    }
}

pub struct PrintSample {
    pub path_samples: PathBuf,
    pub replicates: bool,
    pub suffix: String,
    pub index: usize,
}
impl PrintSample {
    /// The row at `index`, tab joined, every entry carrying the suffix
    pub fn run(params: &PrintSample) -> Result<String> {
        let rows = read_columns(&params.path_samples)?;
        let row = rows.get(params.index).ok_or_else(|| {
            Error::invalid_option(
                "--index",
                Some(format!("{} is out of range, the list has {} entries", params.index, rows.len())),
            )
        })?;
        let take = if params.replicates { row.len() } else { 1 };
        Ok(row
            .iter()
            .take(take)
            .map(|s| format!("{}{}", s, params.suffix))
            .collect::<Vec<_>>()
            .join("\t"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn print(samples: &std::path::Path, replicates: bool, suffix: &str, index: usize) -> Result<String> {
        PrintSample::run(&PrintSample {
            path_samples: samples.to_path_buf(),
            replicates,
            suffix: suffix.to_string(),
            index,
        })
    }

    #[test]
    fn test_print_sample() {
        let dir = tempfile::tempdir().unwrap();
        let samples = dir.path().join("dataset.txt");
        std::fs::write(&samples, "POLR2A\tPOLR2A_1\tPOLR2A_2\nASDURF\tASDURF_1\n").unwrap();

        assert_eq!(print(&samples, false, "", 0).unwrap(), "POLR2A");
        assert_eq!(print(&samples, false, "-dedup", 0).unwrap(), "POLR2A-dedup");
        assert_eq!(print(&samples, false, "", 1).unwrap(), "ASDURF");
        assert_eq!(
            print(&samples, true, "-dedup", 0).unwrap(),
            "POLR2A-dedup\tPOLR2A_1-dedup\tPOLR2A_2-dedup"
        );
        assert!(print(&samples, false, "", 2).is_err());
    }
}
