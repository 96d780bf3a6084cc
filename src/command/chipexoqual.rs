use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use super::constants::DEFAULT_PATH_DATASETS;
use crate::exec::{Invocation, Runner, SystemRunner};
use crate::fileformat::{read_columns, select_index};
use crate::runtime::ToolConfig;

pub const CHIPEXOQUAL_SCRIPT: &str = "chipexoqual.R";

#[derive(Args)]
pub struct ChipexoQualCMD {
    #[arg(short = 'd', long = "datasets", default_value = DEFAULT_PATH_DATASETS)]
    /// Dataset name in first column and sample names on following columns, tab delimited
    pub path_datasets: PathBuf,

    #[arg(long = "suffix", default_value = "")]
    /// Suffix added to sample name in BAM filename for input
    pub suffix: String,

    #[arg(short = 'i', long = "index")]
    /// Index of dataset to process in datasets file
    pub index: Option<usize>,

    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    /// Arguments passed to chipexoqual.R
    pub chipexoqual_args: Vec<String>,
}
impl ChipexoQualCMD {
    /// Run the commandline option
    pub fn try_execute(&mut self) -> Result<()> {
        ChipexoQual::run(
            &ChipexoQual {
                path_datasets: self.path_datasets.clone(),
                index: self.index,
                suffix: self.suffix.clone(),
                chipexoqual_args: self.chipexoqual_args.clone(),
                tools: ToolConfig::from_env(),
            },
            &SystemRunner,
        )?;
        log::info!("ChipexoQual has finished succesfully");
        Ok(())
    }
}

/// Run ChIPexoQual on the BAM files of every dataset
pub struct ChipexoQual {
    pub path_datasets: PathBuf,
    pub index: Option<usize>,
    pub suffix: String,
    pub chipexoqual_args: Vec<String>,
    pub tools: ToolConfig,
}
impl ChipexoQual {
    /// Run the algorithm
    pub fn run(params: &ChipexoQual, runner: &dyn Runner) -> Result<()> {
        for row in select_index(read_columns(&params.path_datasets)?, params.index)? {
            let Some((dataset, samples)) = row.split_first() else {
                continue;
            };
            println!("Running ChIPexoQual on dataset {}", dataset);
            let inv = Invocation::new("Rscript")
                .arg(ToolConfig::in_base(&params.tools.chipexoqual_base, CHIPEXOQUAL_SCRIPT))
                .arg("-p")
                .arg(format!("{}_", dataset))
                .args(params.chipexoqual_args.iter().cloned())
                .args(
                    samples
                        .iter()
                        .filter(|s| !s.is_empty())
                        .map(|s| format!("{}{}.bam", s, params.suffix)),
                );
            runner
                .run(&inv)
                .with_context(|| format!("ChIPexoQual failed on dataset {}", dataset))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::RecordingRunner;

    fn datasets(dir: &std::path::Path) -> PathBuf {
        let path = dir.join("dataset.txt");
        std::fs::write(&path, "POLR2A\tPOLR2A_1\tPOLR2A_2\nASDURF\tASDURF_1\tASDURF_2\n").unwrap();
        path
    }

    #[test]
    fn test_chipexoqual() {
        let dir = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::new();
        let params = ChipexoQual {
            path_datasets: datasets(dir.path()),
            index: None,
            suffix: String::new(),
            chipexoqual_args: Vec::new(),
            tools: ToolConfig::default(),
        };
        ChipexoQual::run(&params, &runner).unwrap();
        assert_eq!(
            runner.argvs(),
            vec![
                vec!["Rscript", "chipexoqual.R", "-p", "POLR2A_", "POLR2A_1.bam", "POLR2A_2.bam"],
                vec!["Rscript", "chipexoqual.R", "-p", "ASDURF_", "ASDURF_1.bam", "ASDURF_2.bam"],
            ]
        );
    }

    #[test]
    fn test_chipexoqual_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::new();
        let params = ChipexoQual {
            path_datasets: datasets(dir.path()),
            index: Some(1),
            suffix: "-dedup".to_string(),
            chipexoqual_args: vec!["--cores".to_string(), "2".to_string()],
            tools: ToolConfig {
                chipexoqual_base: Some("/opt/chipexoqual".to_string()),
                ..Default::default()
            },
        };
        ChipexoQual::run(&params, &runner).unwrap();
        assert_eq!(
            runner.argvs(),
            vec![vec![
                "Rscript",
                "/opt/chipexoqual/chipexoqual.R",
                "-p",
                "ASDURF_",
                "--cores",
                "2",
                "ASDURF_1-dedup.bam",
                "ASDURF_2-dedup.bam"
            ]]
        );
    }
}
