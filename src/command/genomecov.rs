use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use super::constants::{BASE_SCALE, DEFAULT_PATH_CHROM_SIZES, DEFAULT_PATH_SAMPLES, SUFFIX_COVERAGE};
use super::sample_names;
use crate::exec::{Invocation, Runner, SystemRunner};
use crate::fileformat::bed::{self, count_bed};
use crate::fileformat::{splits, temp_file};
use crate::runtime::Error;

#[derive(Args)]
pub struct GenomeCovCMD {
    #[arg(short = 's', long = "samples", default_value = DEFAULT_PATH_SAMPLES)]
    /// Sample names listed one sample name by line
    pub path_samples: PathBuf,

    #[arg(short = 'S', long = "sizes", default_value = DEFAULT_PATH_CHROM_SIZES)]
    /// Size of chromosomes
    pub path_sizes: PathBuf,

    #[arg(short = 'C', long = "scale")]
    /// Scale for genome coverage. Defaults to 1000000 / number of reads
    pub scale: Option<f64>,

    #[arg(short = 'T', long = "strand", value_parser = ["+", "-"])]
    /// Calculate coverage of intervals from a specific strand
    pub strand: Option<String>,

    #[arg(long = "input-suffix", visible_alias = "is", default_value = "")]
    /// Suffix added to sample name in BED filename for input
    pub input_suffix: String,

    #[arg(long = "output-suffix", visible_alias = "os", default_value = SUFFIX_COVERAGE)]
    /// Suffix added to sample name in BED filename for output
    pub output_suffix: String,

    #[arg(long = "spike-suffix")]
    /// Suffix added to sample name of BED file containing spiked reads
    pub spike_suffix: Option<String>,

    #[arg(long = "control-suffix")]
    /// Suffix added to sample name of BED file containing control (input) reads
    pub control_suffix: Option<String>,

    #[arg(long = "spike-control-suffix")]
    /// Suffix added to sample name of BED file containing control (input) spiked reads
    pub spike_control_suffix: Option<String>,

    #[arg(short = 'i', long = "index")]
    /// Index of sample to process in samples file
    pub index: Option<usize>,

    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    /// Arguments passed to bedtools genomecov
    pub genomecov_args: Vec<String>,
}
impl GenomeCovCMD {
    /// Run the commandline option
    pub fn try_execute(&mut self) -> Result<()> {
        if !self.path_sizes.is_file() {
            return Err(Error::file_not_found(&self.path_sizes).into());
        }
        GenomeCov::run(
            &GenomeCov {
                path_workdir: PathBuf::new(),
                path_samples: self.path_samples.clone(),
                path_sizes: self.path_sizes.clone(),
                index: self.index,
                scale: self.scale,
                strand: self.strand.clone(),
                input_suffix: self.input_suffix.clone(),
                output_suffix: self.output_suffix.clone(),
                spike_suffix: self.spike_suffix.clone(),
                control_suffix: self.control_suffix.clone(),
                spike_control_suffix: self.spike_control_suffix.clone(),
                genomecov_args: self.genomecov_args.clone(),
            },
            &SystemRunner,
        )?;
        log::info!("GenomeCov has finished succesfully");
        Ok(())
    }
}

/// Scaled bedGraph and bigWig coverage of every sample and its splits.
///
/// Without an explicit scale the coverage is normalized to reads per million:
/// * 1000000 / reads by default
/// * 1000000 / spiked reads with a spike suffix
/// * 1000000 * control spiked reads / (spiked reads * control reads) when
///   control and spike control suffixes are also given
pub struct GenomeCov {
    pub path_workdir: PathBuf,
    pub path_samples: PathBuf,
    pub path_sizes: PathBuf,
    pub index: Option<usize>,
    pub scale: Option<f64>,
    pub strand: Option<String>,
    pub input_suffix: String,
    pub output_suffix: String,
    pub spike_suffix: Option<String>,
    pub control_suffix: Option<String>,
    pub spike_control_suffix: Option<String>,
    pub genomecov_args: Vec<String>,
}
impl GenomeCov {
    /// Run the algorithm
    pub fn run(params: &GenomeCov, runner: &dyn Runner) -> Result<()> {
        params.validate()?;
        for sample in sample_names(&params.path_samples, params.index)? {
            println!("Computing genome coverage on sample {}", sample);
            GenomeCov::run_name(params, runner, &sample)
                .with_context(|| format!("Genome coverage failed on sample {}", sample))?;
            for split in splits(&params.path_workdir, &sample)? {
                GenomeCov::run_name(params, runner, &split.name)
                    .with_context(|| format!("Genome coverage failed on split {}", split.name))?;
            }
        }
        Ok(())
    }

    /// Option combinations that the scale computation cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.output_suffix == self.input_suffix {
            return Err(Error::invalid_option(
                "--output-suffix",
                Some(format!(
                    "output suffix \"{}\" must be different than input suffix",
                    self.output_suffix
                )),
            )
            .into());
        }
        if self.spike_suffix.is_some() && self.scale.is_some() {
            return Err(Error::invalid_option(
                "--spike-suffix",
                Some("--spike-suffix cannot be used if --scale is present"),
            )
            .into());
        }
        match (
            &self.spike_suffix,
            &self.control_suffix,
            &self.spike_control_suffix,
        ) {
            (None, Some(_), _) => Err(Error::invalid_option(
                "--control-suffix",
                Some("--control-suffix requires --spike-suffix and --spike-control-suffix"),
            )
            .into()),
            (None, _, Some(_)) | (Some(_), None, Some(_)) => Err(Error::invalid_option(
                "--spike-control-suffix",
                Some("--spike-control-suffix requires --spike-suffix and --control-suffix"),
            )
            .into()),
            (Some(_), Some(_), None) => Err(Error::invalid_option(
                "--control-suffix",
                Some("--control-suffix requires --spike-suffix and --spike-control-suffix"),
            )
            .into()),
            _ => Ok(()),
        }
    }

    fn bed_of(&self, name: &str, suffix: &str) -> PathBuf {
        self.path_workdir.join(format!("{}{}.bed", name, suffix))
    }

    /// Scale given on the command line, or derived from read counts
    pub fn scale_for(&self, name: &str) -> Result<f64> {
        if let Some(scale) = self.scale.filter(|s| *s != 0.0) {
            return Ok(scale);
        }
        let Some(spike_suffix) = &self.spike_suffix else {
            let count = count_bed(&self.bed_of(name, &self.input_suffix))?;
            return Ok(BASE_SCALE / count.max(1) as f64);
        };
        let spiked = count_bed(&self.bed_of(name, spike_suffix))?;
        let mut scale = BASE_SCALE / spiked.max(1) as f64;
        if let (Some(control), Some(spike_control)) = (&self.control_suffix, &self.spike_control_suffix) {
            let control = count_bed(&self.bed_of(name, control))?;
            let spike_control = count_bed(&self.bed_of(name, spike_control))?;
            scale = scale * spike_control as f64 / control.max(1) as f64;
        }
        Ok(scale)
    }

    fn run_name(params: &GenomeCov, runner: &dyn Runner, name: &str) -> Result<()> {
        let source = params.bed_of(name, &params.input_suffix);
        let scale = params.scale_for(name)?;
        println!("Computing genome coverage on BED {:?} with scale {}", source, scale);

        let strand_suffix = match params.strand.as_deref() {
            Some("-") => "-neg",
            Some(_) => "-pos",
            None => "",
        };
        let stem = format!("{}{}{}", name, params.output_suffix, strand_suffix);
        let bedgraph = params.path_workdir.join(format!("{}.bed", stem));
        let bigwig = params.path_workdir.join(format!("{}.bw", stem));
        coverage(
            runner,
            &source,
            &bedgraph,
            &params.path_sizes,
            name,
            scale,
            params.strand.as_deref(),
            &params.genomecov_args,
        )?;
        bed::bedgraph_to_bigwig(runner, &bedgraph, &params.path_sizes, &bigwig)
    }
}

/// bedtools genomecov as a sorted bedGraph behind a track line
#[allow(clippy::too_many_arguments)]
pub fn coverage(
    runner: &dyn Runner,
    input: &Path,
    output: &Path,
    sizes: &Path,
    name: &str,
    scale: f64,
    strand: Option<&str>,
    genomecov_args: &[String],
) -> Result<()> {
    let raw = temp_file(".bed")?;
    let inv = Invocation::new("bedtools")
        .args(["genomecov", "-bg", "-i"])
        .path(input)
        .arg("-g")
        .path(sizes)
        .args(genomecov_args.iter().cloned())
        .opt("-scale", Some(scale))
        .opt("-strand", strand);
    runner.run_to_file(&inv, raw.path())?;

    let sorted = temp_file(".bed")?;
    bed::sort(runner, raw.path(), sorted.path())?;
    drop(raw);

    let track_name = match strand {
        Some("-") => format!("{} Minus", name),
        Some(_) => format!("{} Plus", name),
        None => name.to_string(),
    };
    let mut writer = BufWriter::new(
        File::create(output).with_context(|| format!("Could not create bedGraph {:?}", output))?,
    );
    writeln!(writer, "track type=bedGraph name=\"{}\"", track_name)?;
    std::io::copy(&mut File::open(sorted.path())?, &mut writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::RecordingRunner;

    fn params(dir: &Path) -> GenomeCov {
        GenomeCov {
            path_workdir: dir.to_path_buf(),
            path_samples: dir.join("samples.txt"),
            path_sizes: PathBuf::from("sacCer3.chrom.sizes"),
            index: None,
            scale: None,
            strand: None,
            input_suffix: String::new(),
            output_suffix: SUFFIX_COVERAGE.to_string(),
            spike_suffix: None,
            control_suffix: None,
            spike_control_suffix: None,
            genomecov_args: Vec::new(),
        }
    }

    fn write_reads(path: &Path, n: usize) {
        let lines: String = (0..n).map(|i| format!("chrI\t{}\t{}\n", i * 10, i * 10 + 50)).collect();
        std::fs::write(path, lines).unwrap();
    }

    /// bedtools stand in: genomecov prints one interval, sort echoes its input
    fn bedtools() -> RecordingRunner {
        RecordingRunner::new().on("bedtools", |inv| match inv.args[0].as_str() {
            "genomecov" => Ok("chrI\t0\t10\t1.5\n".to_string()),
            _ => Ok(std::fs::read_to_string(&inv.args[2])?),
        })
    }

    #[test]
    fn test_validate() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = params(dir.path());
        assert!(p.validate().is_ok());

        p.output_suffix = String::new();
        assert!(p.validate().is_err());
        p.output_suffix = SUFFIX_COVERAGE.to_string();

        p.scale = Some(2.0);
        p.spike_suffix = Some("-spike".to_string());
        assert!(p.validate().is_err());
        p.scale = None;
        assert!(p.validate().is_ok());

        p.control_suffix = Some("-input".to_string());
        assert!(p.validate().is_err());
        p.spike_control_suffix = Some("-input-spike".to_string());
        assert!(p.validate().is_ok());

        p.spike_suffix = None;
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_scale() {
        let dir = tempfile::tempdir().unwrap();
        write_reads(&dir.path().join("POLR2A.bed"), 4);
        write_reads(&dir.path().join("POLR2A-spike.bed"), 2);
        write_reads(&dir.path().join("POLR2A-input.bed"), 5);
        write_reads(&dir.path().join("POLR2A-input-spike.bed"), 10);
        write_reads(&dir.path().join("EMPTY.bed"), 0);

        let mut p = params(dir.path());
        assert_eq!(p.scale_for("POLR2A").unwrap(), 250000.0);
        assert_eq!(p.scale_for("EMPTY").unwrap(), 1000000.0);

        p.spike_suffix = Some("-spike".to_string());
        assert_eq!(p.scale_for("POLR2A").unwrap(), 500000.0);

        p.control_suffix = Some("-input".to_string());
        p.spike_control_suffix = Some("-input-spike".to_string());
        assert_eq!(p.scale_for("POLR2A").unwrap(), 1000000.0);

        p.spike_suffix = None;
        p.scale = Some(1.5);
        assert_eq!(p.scale_for("POLR2A").unwrap(), 1.5);
    }

    #[test]
    fn test_genomecov_with_splits() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("samples.txt"), "POLR2A\n").unwrap();
        write_reads(&dir.path().join("POLR2A.bed"), 2);
        write_reads(&dir.path().join("POLR2A-100-110.bed"), 1);

        let runner = bedtools();
        let mut p = params(dir.path());
        p.strand = Some("-".to_string());
        p.genomecov_args = vec!["-5".to_string()];
        GenomeCov::run(&p, &runner).unwrap();

        let bedgraph = std::fs::read_to_string(dir.path().join("POLR2A-cov-neg.bed")).unwrap();
        assert_eq!(
            bedgraph,
            "track type=bedGraph name=\"POLR2A Minus\"\nchrI\t0\t10\t1.5\n"
        );
        assert!(dir.path().join("POLR2A-100-110-cov-neg.bed").exists());

        let argvs = runner.argvs();
        let source = dir.path().join("POLR2A.bed").to_string_lossy().into_owned();
        assert_eq!(
            argvs[0],
            [
                "bedtools",
                "genomecov",
                "-bg",
                "-i",
                source.as_str(),
                "-g",
                "sacCer3.chrom.sizes",
                "-5",
                "-scale",
                "500000",
                "-strand",
                "-",
            ]
        );
        let bigwig = argvs.iter().find(|a| a[0] == "bedGraphToBigWig").unwrap();
        assert_eq!(bigwig[2], "sacCer3.chrom.sizes");
        assert_eq!(bigwig[3], dir.path().join("POLR2A-cov-neg.bw").to_string_lossy());

        let split_cov = argvs
            .iter()
            .filter(|a| a[1] == "genomecov")
            .nth(1)
            .unwrap();
        assert_eq!(split_cov[9], "1000000");
    }
}
