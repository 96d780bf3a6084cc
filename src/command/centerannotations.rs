use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use super::constants::{DEFAULT_PATH_SAMPLES, SUFFIX_FORCOV};
use super::{check_suffixes, sample_names};
use crate::fileformat::bed::{self, parse_coordinate};

#[derive(Args)]
pub struct CenterAnnotationsCMD {
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
}
impl CenterAnnotationsCMD {
    /// Run the commandline option
    pub fn try_execute(&mut self) -> Result<()> {
        CenterAnnotations::run(&CenterAnnotations {
            path_workdir: PathBuf::new(),
            path_samples: self.path_samples.clone(),
            index: self.index,
            input_suffix: self.input_suffix.clone(),
            output_suffix: self.output_suffix.clone(),
        })?;
        log::info!("CenterAnnotations has finished succesfully");
        Ok(())
    }
}

/// Shrink every annotation to the base at its center
pub struct CenterAnnotations {
    pub path_workdir: PathBuf,
    pub path_samples: PathBuf,
    pub index: Option<usize>,
    pub input_suffix: String,
    pub output_suffix: String,
}
impl CenterAnnotations {
    /// Run the algorithm
    pub fn run(params: &CenterAnnotations) -> Result<()> {
        check_suffixes(&params.input_suffix, &params.output_suffix)?;
        for sample in sample_names(&params.path_samples, params.index)? {
            println!("Center annotations of sample {}", sample);
            let dir = &params.path_workdir;
            let input = dir.join(format!("{}{}.bed", sample, params.input_suffix));
            let output = dir.join(format!("{}{}.bed", sample, params.output_suffix));
            center_annotations(&input, &output)
                .with_context(|| format!("Could not center annotations of sample {}", sample))?;
        }
        Ok(())
    }
}

pub fn center_annotations(input: &Path, output: &Path) -> Result<()> {
    bed::map_intervals(input, output, |columns| {
        let start = parse_coordinate(columns, 1)?;
        let end = parse_coordinate(columns, 2)?;
        let center = (start + end) / 2;
        let mut out: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        out[1] = center.to_string();
        out[2] = (center + 1).to_string();
        Ok(Some(out))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_annotations() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("samples.txt"), "POLR2A\n").unwrap();
        std::fs::write(
            dir.path().join("POLR2A.bed"),
            "track name=\"POLR2A\"\nchrI\t100\t200\tr1\t0\t+\nchrII\t10\t21\tr2\t0\t-\n",
        )
        .unwrap();
        let params = CenterAnnotations {
            path_workdir: dir.path().to_path_buf(),
            path_samples: dir.path().join("samples.txt"),
            index: None,
            input_suffix: String::new(),
            output_suffix: SUFFIX_FORCOV.to_string(),
        };
        CenterAnnotations::run(&params).unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("POLR2A-forcov.bed")).unwrap(),
            "track name=\"POLR2A\"\nchrI\t150\t151\tr1\t0\t+\nchrII\t15\t16\tr2\t0\t-\n"
        );
    }

    #[test]
    fn test_center_annotations_same_suffix() {
        let params = CenterAnnotations {
            path_workdir: PathBuf::new(),
            path_samples: PathBuf::from("samples.txt"),
            index: None,
            input_suffix: "-a".to_string(),
            output_suffix: "-a".to_string(),
        };
        assert!(CenterAnnotations::run(&params).is_err());
    }
}
