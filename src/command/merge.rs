use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use super::constants::DEFAULT_PATH_DATASETS;
use crate::exec::{Runner, SystemRunner};
use crate::fileformat::{bed, read_columns, select_index, temp_file};

#[derive(Args)]
pub struct MergeCMD {
    #[arg(short = 'd', long = "datasets", default_value = DEFAULT_PATH_DATASETS)]
    /// Dataset name followed by the names of its samples, one dataset by line
    pub path_datasets: PathBuf,

    #[arg(short = 'i', long = "index")]
    /// Index of dataset to process in datasets file
    pub index: Option<usize>,
}
impl MergeCMD {
    /// Run the commandline option
    pub fn try_execute(&mut self) -> Result<()> {
        Merge::run(
            &Merge {
                path_workdir: PathBuf::new(),
                path_datasets: self.path_datasets.clone(),
                index: self.index,
            },
            &SystemRunner,
        )?;
        log::info!("Merge has finished succesfully");
        Ok(())
    }
}

/// Merge the BED files of a dataset's samples
pub struct Merge {
    pub path_workdir: PathBuf,
    pub path_datasets: PathBuf,
    pub index: Option<usize>,
}
impl Merge {
    /// Run the algorithm
    pub fn run(params: &Merge, runner: &dyn Runner) -> Result<()> {
        for row in select_index(read_columns(&params.path_datasets)?, params.index)? {
            let Some((dataset, samples)) = row.split_first() else {
                continue;
            };
            Merge::merge_dataset(params, runner, dataset, samples)
                .with_context(|| format!("Could not merge dataset {}", dataset))?;
        }
        Ok(())
    }

    pub fn merge_dataset(params: &Merge, runner: &dyn Runner, dataset: &str, samples: &[String]) -> Result<()> {
        println!("Merging samples {} into dataset {}", samples.join(", "), dataset);
        let merged = temp_file(".bed")?;
        {
            let mut writer = BufWriter::new(merged.as_file());
            for sample in samples.iter().filter(|s| !s.is_empty()) {
                let path = params.path_workdir.join(format!("{}.bed", sample));
                let mut input =
                    File::open(&path).with_context(|| format!("Could not open BED {:?}", path))?;
                std::io::copy(&mut input, &mut writer)?;
            }
            writer.flush()?;
        }
        let output = params.path_workdir.join(format!("{}.bed", dataset));
        bed::sort(runner, merged.path(), &output)
    }
}
