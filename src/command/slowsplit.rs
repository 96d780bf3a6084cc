use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use super::constants::DEFAULT_PATH_SAMPLES;
use super::sample_names;
use crate::fileformat::bed::{self, parse_coordinate};
use crate::fileformat::Split;
use crate::runtime::Error;

#[derive(Args)]
pub struct SlowSplitCMD {
    #[arg(short = 's', long = "samples", default_value = DEFAULT_PATH_SAMPLES)]
    /// Sample names listed one sample name by line
    pub path_samples: PathBuf,

    #[arg(short = 'b', long = "binLength", default_value_t = 10)]
    /// Split reads in bins by their length
    pub bin_length: u64,

    #[arg(short = 'l', long = "binMinLength", default_value_t = 100)]
    /// First bin minimum length
    pub bin_min_length: u64,

    #[arg(short = 'L', long = "binMaxLength", default_value_t = 500)]
    /// Last bin maximum length
    pub bin_max_length: u64,

    #[arg(long = "input-suffix", default_value = "")]
    /// Suffix added to sample name in BED filename for input
    pub input_suffix: String,

    #[arg(short = 'i', long = "index")]
    /// Index of sample to process in samples file
    pub index: Option<usize>,
}
impl SlowSplitCMD {
    /// Run the commandline option
    pub fn try_execute(&mut self) -> Result<()> {
        SlowSplit::run(&SlowSplit {
            path_workdir: PathBuf::new(),
            path_samples: self.path_samples.clone(),
            index: self.index,
            bin_length: self.bin_length,
            bin_min_length: self.bin_min_length,
            bin_max_length: self.bin_max_length,
            input_suffix: self.input_suffix.clone(),
        })?;
        log::info!("SlowSplit has finished succesfully");
        Ok(())
    }
}

/// Split the BED of each sample into fragment length bins
pub struct SlowSplit {
    pub path_workdir: PathBuf,
    pub path_samples: PathBuf,
    pub index: Option<usize>,
    pub bin_length: u64,
    pub bin_min_length: u64,
    pub bin_max_length: u64,
    pub input_suffix: String,
}
impl SlowSplit {
    /// Run the algorithm
    pub fn run(params: &SlowSplit) -> Result<()> {
        if params.bin_length == 0 {
            return Err(Error::invalid_option("--binLength", Some("must be greater than 0")).into());
        }
        for sample in sample_names(&params.path_samples, params.index)? {
            println!("Split BED file of sample {}", sample);
            let bed = params
                .path_workdir
                .join(format!("{}{}.bed", sample, params.input_suffix));
            for split in params.bins(&sample) {
                let output = params.path_workdir.join(format!("{}.bed", split.name));
                println!("Splitting BED {:?} to BIN {:?}", bed, output);
                filter_by_length(&bed, &output, split.min_length, split.max_length)
                    .with_context(|| format!("Could not split sample {}", sample))?;
            }
        }
        Ok(())
    }

    /// Bins from the minimum length up to the maximum, the last one truncated at the maximum
    pub fn bins(&self, sample: &str) -> Vec<Split> {
        (self.bin_min_length..self.bin_max_length)
            .step_by(self.bin_length.max(1) as usize)
            .map(|start| {
                let end = (start + self.bin_length).min(self.bin_max_length);
                Split::new(sample, start, end)
            })
            .collect()
    }
}

/// Keep intervals with min <= end - start < max. Header lines are copied,
/// lines with less than 3 columns dropped
pub fn filter_by_length(input: &Path, output: &Path, min: u64, max: u64) -> Result<()> {
    let (min, max) = (min as i64, max as i64);
    bed::map_intervals(input, output, |columns| {
        if columns.len() < 3 {
            return Ok(None);
        }
        let length = parse_coordinate(columns, 2)? - parse_coordinate(columns, 1)?;
        Ok((min <= length && length < max).then(|| columns.iter().map(|c| c.to_string()).collect()))
    })
}
