use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use rayon::prelude::*;

use super::constants::{
    DEFAULT_PATH_CHROM_SIZES, DEFAULT_PATH_SAMPLES, SUFFIX_INPUT_READS, SUFFIX_PARAMS, SUFFIX_READS,
    SUFFIX_SIQCHIP,
};
use super::sample_names;
use crate::exec::{Invocation, Runner, SystemRunner};
use crate::fileformat::{bed, read_first, temp_file};
use crate::runtime::{Error, ToolConfig};

pub const SIQCHIP_SOURCE: &str = "2Dlow-mem.f";
pub const SIQCHIP_EXEC: &str = "Slave.sh";
pub const SIQCHIP_PARAMS: &str = "params.in";
pub const SIQCHIP_RESI: &str = "resi";

#[derive(Args)]
pub struct SiqchipCMD {
    #[arg(short = 's', long = "samples", default_value = DEFAULT_PATH_SAMPLES)]
    /// Sample names listed one sample name by line
    pub path_samples: PathBuf,

    #[arg(long = "chromosomes", default_value = DEFAULT_PATH_CHROM_SIZES)]
    /// File containing chromosome names in the first column
    pub path_chromosomes: PathBuf,

    #[arg(long = "input-suffix", default_value = SUFFIX_INPUT_READS)]
    /// Suffix to add to sample name to obtain input reads BED filename
    pub input_suffix: String,

    #[arg(long = "ip-suffix", default_value = SUFFIX_READS)]
    /// Suffix to add to sample name to obtain IP reads BED filename
    pub ip_suffix: String,

    #[arg(long = "params-suffix", default_value = SUFFIX_PARAMS)]
    /// Suffix to add to sample name to obtain params filename (.in extension)
    pub params_suffix: String,

    #[arg(long = "output-suffix", default_value = SUFFIX_SIQCHIP)]
    /// Suffix added to sample name in output BED filename
    pub output_suffix: String,

    #[arg(short = 'p', long = "threads", default_value_t = 1)]
    /// Number of threads used to process data per sample
    pub threads: usize,

    #[arg(short = 'i', long = "index")]
    /// Index of sample to process in samples file
    pub index: Option<usize>,
}
impl SiqchipCMD {
    /// Run the commandline option
    pub fn try_execute(&mut self) -> Result<()> {
        Siqchip::run(
            &Siqchip {
                path_workdir: PathBuf::new(),
                path_samples: self.path_samples.clone(),
                path_chromosomes: self.path_chromosomes.clone(),
                index: self.index,
                input_suffix: self.input_suffix.clone(),
                ip_suffix: self.ip_suffix.clone(),
                params_suffix: self.params_suffix.clone(),
                output_suffix: self.output_suffix.clone(),
                threads: self.threads,
                tools: ToolConfig::from_env(),
            },
            &SystemRunner,
        )?;
        log::info!("Siqchip has finished succesfully");
        Ok(())
    }
}

/// Run siQ-ChIP per chromosome and gather its output as a bedGraph and bigWig
pub struct Siqchip {
    pub path_workdir: PathBuf,
    pub path_samples: PathBuf,
    pub path_chromosomes: PathBuf,
    pub index: Option<usize>,
    pub input_suffix: String,
    pub ip_suffix: String,
    pub params_suffix: String,
    pub output_suffix: String,
    pub threads: usize,
    pub tools: ToolConfig,
}
impl Siqchip {
    /// Run the algorithm
    pub fn run(params: &Siqchip, runner: &dyn Runner) -> Result<()> {
        for sample in sample_names(&params.path_samples, params.index)? {
            Siqchip::run_sample(params, runner, &sample)
                .with_context(|| format!("siQ-ChIP failed on sample {}", sample))?;
        }
        Ok(())
    }

    fn run_sample(params: &Siqchip, runner: &dyn Runner, sample: &str) -> Result<()> {
        println!("Running siQ-ChIP for sample {}", sample);
        let dir = &params.path_workdir;
        let input_name = format!("{}{}.bed", sample, params.input_suffix);
        let ip_name = format!("{}{}.bed", sample, params.ip_suffix);
        let input = dir.join(&input_name);
        let ip = dir.join(&ip_name);
        let params_in = dir.join(format!("{}{}.in", sample, params.params_suffix));
        let stem = format!("{}{}", sample, params.output_suffix);
        let ce_output = dir.join(format!("{}.ce", stem));
        let bed_output = dir.join(format!("{}.bed", stem));
        let bigwig = dir.join(format!("{}.bw", stem));

        let input_chromosomes = read_chromosomes(&input, 2)?;
        let ip_chromosomes = read_chromosomes(&ip, 2)?;
        let chromosomes: Vec<String> = read_first(&params.path_chromosomes)?
            .into_iter()
            .filter(|c| input_chromosomes.contains(c) && ip_chromosomes.contains(c))
            .collect();
        log::debug!("siQ-ChIP chromosomes for sample {}: {:?}", sample, chromosomes);

        let folder = tempfile::Builder::new()
            .prefix("robtools-siqchip-")
            .tempdir()
            .context("Could not create temporary folder")?;
        prepare_parameters(
            folder.path(),
            &params.tools,
            &input,
            &ip,
            &params_in,
            &dir.join(SIQCHIP_RESI),
        )?;

        let invocations: Vec<Invocation> = chromosomes
            .iter()
            .map(|chromosome| {
                Invocation::new(SIQCHIP_EXEC)
                    .arg(chromosome.strip_prefix("chr").unwrap_or(chromosome))
                    .arg(input_name.as_str())
                    .arg(ip_name.as_str())
                    .current_dir(folder.path())
            })
            .collect();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(params.threads.max(1))
            .build()
            .context("Could not create thread pool")?;
        pool.install(|| invocations.par_iter().try_for_each(|inv| runner.run(inv)))?;

        gather_ce(folder.path(), &chromosomes, &ce_output)?;
        write_bedgraph(runner, &ce_output, &bed_output, &stem)?;
        bed::bedgraph_to_bigwig(runner, &bed_output, &params.path_chromosomes, &bigwig)
    }
}

/// Chromosomes with at least `minimum` intervals in a BED file
pub fn read_chromosomes(bed: &Path, minimum: usize) -> Result<Vec<String>> {
    let file = File::open(bed).with_context(|| format!("Could not open BED {:?}", bed))?;
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut order = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if bed::is_header(&line) {
            continue;
        }
        let Some(chromosome) = line.split('\t').next().filter(|c| !c.is_empty()) else {
            continue;
        };
        let count = counts.entry(chromosome.to_string()).or_insert_with(|| {
            order.push(chromosome.to_string());
            0
        });
        *count += 1;
    }
    Ok(order.into_iter().filter(|c| counts[c] >= minimum).collect())
}

/// Copy the siQ-ChIP program, the read files, params.in and resi into the run folder
pub fn prepare_parameters(
    folder: &Path,
    tools: &ToolConfig,
    input: &Path,
    ip: &Path,
    params: &Path,
    resi: &Path,
) -> Result<()> {
    let copy = |from: &Path, to: &Path| -> Result<()> {
        if !from.is_file() {
            return Err(Error::file_not_found(from).into());
        }
        std::fs::copy(from, to).with_context(|| format!("Could not copy {:?} to {:?}", from, to))?;
        Ok(())
    };
    for program in [SIQCHIP_SOURCE, SIQCHIP_EXEC] {
        let source = PathBuf::from(ToolConfig::in_base(&tools.siqchip_base, program));
        copy(&source, &folder.join(program))?;
    }
    for file in [input, ip] {
        let name = file
            .file_name()
            .ok_or_else(|| Error::file_not_valid(file, Some("not a file name")))?;
        copy(file, &folder.join(name))?;
    }
    copy(params, &folder.join(SIQCHIP_PARAMS))?;
    copy(resi, &folder.join(SIQCHIP_RESI))
}

/// Concatenate `<chrom>.ce` outputs, tab separated, first column set to the chromosome name
pub fn gather_ce(folder: &Path, chromosomes: &[String], output: &Path) -> Result<()> {
    let mut writer = BufWriter::new(
        File::create(output).with_context(|| format!("Could not create {:?}", output))?,
    );
    for chromosome in chromosomes {
        let ce = folder.join(format!("{}.ce", chromosome));
        let file = File::open(&ce).with_context(|| format!("siQ-ChIP produced no {:?}", ce))?;
        for line in BufReader::new(file).lines() {
            let line = line?;
            let mut columns = line.split_whitespace();
            if columns.next().is_none() {
                continue;
            }
            let rest: Vec<&str> = columns.collect();
            writeln!(writer, "{}\t{}", chromosome, rest.join("\t"))?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// First four columns of the .ce output, sorted, behind a track line
pub fn write_bedgraph(runner: &dyn Runner, ce: &Path, output: &Path, track_name: &str) -> Result<()> {
    let unsorted = temp_file(".bed")?;
    {
        let input = File::open(ce).with_context(|| format!("Could not open {:?}", ce))?;
        let mut writer = BufWriter::new(unsorted.as_file());
        for line in BufReader::new(input).lines() {
            let line = line?;
            let columns: Vec<&str> = line.split('\t').take(4).collect();
            writeln!(writer, "{}", columns.join("\t"))?;
        }
        writer.flush()?;
    }
    let sorted = temp_file(".bed")?;
    bed::sort(runner, unsorted.path(), sorted.path())?;

    let mut writer = BufWriter::new(
        File::create(output).with_context(|| format!("Could not create bedGraph {:?}", output))?,
    );
    writeln!(writer, "track type=bedGraph name=\"{}\"", track_name)?;
    std::io::copy(&mut File::open(sorted.path())?, &mut writer)?;
    writer.flush()?;
    Ok(())
}
