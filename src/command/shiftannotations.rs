use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use super::constants::{DEFAULT_PATH_SAMPLES, SUFFIX_FORCOV};
use super::{check_suffixes, sample_names};
use crate::exec::{Invocation, Runner, SystemRunner};

#[derive(Args)]
pub struct ShiftAnnotationsCMD {
    #[arg(short = 's', long = "samples", default_value = DEFAULT_PATH_SAMPLES)]
    /// Sample names listed one sample name by line
    pub path_samples: PathBuf,

    #[arg(long = "input-suffix", visible_alias = "is", default_value = "")]
    /// Suffix added to sample name in BED filename for input
    pub input_suffix: String,

    #[arg(long = "output-suffix", visible_alias = "os", default_value = SUFFIX_FORCOV)]
    /// Suffix added to sample name in BED filename for output
    pub output_suffix: String,

    #[arg(short = 'i', long = "index")]
    /// Index of sample to process in samples file
    pub index: Option<usize>,

    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    /// Arguments passed to bedtools shift, e.g. -g sacCer3.chrom.sizes -m 2 -p -2
    pub shift_args: Vec<String>,
}
impl ShiftAnnotationsCMD {
    /// Run the commandline option
    pub fn try_execute(&mut self) -> Result<()> {
        ShiftAnnotations::run(
            &ShiftAnnotations {
                path_workdir: PathBuf::new(),
                path_samples: self.path_samples.clone(),
                index: self.index,
                input_suffix: self.input_suffix.clone(),
                output_suffix: self.output_suffix.clone(),
                shift_args: self.shift_args.clone(),
            },
            &SystemRunner,
        )?;
        log::info!("ShiftAnnotations has finished succesfully");
        Ok(())
    }
}

/// Move BED intervals with bedtools shift
pub struct ShiftAnnotations {
    pub path_workdir: PathBuf,
    pub path_samples: PathBuf,
    pub index: Option<usize>,
    pub input_suffix: String,
    pub output_suffix: String,
    pub shift_args: Vec<String>,
}
impl ShiftAnnotations {
    /// Run the algorithm
    pub fn run(params: &ShiftAnnotations, runner: &dyn Runner) -> Result<()> {
        check_suffixes(&params.input_suffix, &params.output_suffix)?;
        for sample in sample_names(&params.path_samples, params.index)? {
            println!("Shift annotations of sample {}", sample);
            let dir = &params.path_workdir;
            let input = dir.join(format!("{}{}.bed", sample, params.input_suffix));
            let output = dir.join(format!("{}{}.bed", sample, params.output_suffix));
            let inv = Invocation::new("bedtools")
                .args(["shift", "-i"])
                .path(&input)
                .args(params.shift_args.iter().cloned());
            runner
                .run_to_file(&inv, &output)
                .with_context(|| format!("bedtools shift failed on sample {}", sample))?;
        }
        Ok(())
    }
}
