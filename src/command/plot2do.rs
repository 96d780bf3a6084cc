use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use super::constants::DEFAULT_PATH_SAMPLES;
use super::sample_names;
use crate::exec::{Invocation, Runner, SystemRunner};
use crate::runtime::ToolConfig;

pub const PLOT2DO_SCRIPT: &str = "plot2DO.R";

/// Options forwarded to plot2DO.R under their own names
#[derive(Args, Clone, Debug, Default, PartialEq)]
pub struct Plot2doOptions {
    #[arg(long = "type")]
    /// Type of distribution to plot: occ, dyads, fivePrime_ends, threePrime_ends
    pub kind: Option<String>,

    #[arg(long = "genome")]
    /// Genome version: sacCer3, mm9, hg19 ...
    pub genome: Option<String>,

    #[arg(long = "reference")]
    /// Reference points to align: TSS, TTS, Plus1
    pub reference: Option<String>,

    #[arg(long = "sites")]
    /// User-provided sites to be aligned (BED file)
    pub sites: Option<String>,

    #[arg(long = "align")]
    /// Points of the provided intervals to be aligned: center, fivePrime, threePrime
    pub align: Option<String>,

    #[arg(long = "siteLabel")]
    /// Label for the aligned sites
    pub site_label: Option<String>,

    #[arg(long = "minLength")]
    /// The smallest DNA fragment to be considered
    pub min_length: Option<String>,

    #[arg(long = "maxLength")]
    /// The largest DNA fragment to be considered
    pub max_length: Option<String>,

    #[arg(long = "upstream")]
    /// Length of the upstream region to be plotted
    pub upstream: Option<String>,

    #[arg(long = "downstream")]
    /// Length of the downstream region to be plotted
    pub downstream: Option<String>,

    #[arg(long = "colorScaleMax")]
    /// Maximum value on the color scale
    pub color_scale_max: Option<String>,

    #[arg(long = "simplifyPlot")]
    /// Simplify the plot: on or off
    pub simplify_plot: Option<String>,

    #[arg(long = "squeezePlot")]
    /// Squeeze the plot: on or off
    pub squeeze_plot: Option<String>,
}

impl Plot2doOptions {
    /// plot2DO.R arguments, in plot2DO's own order
    pub fn to_args(&self) -> Vec<String> {
        let options = [
            ("--type", &self.kind),
            ("--genome", &self.genome),
            ("--reference", &self.reference),
            ("--sites", &self.sites),
            ("--align", &self.align),
            ("--siteLabel", &self.site_label),
            ("--minLength", &self.min_length),
            ("--maxLength", &self.max_length),
            ("--upstream", &self.upstream),
            ("--downstream", &self.downstream),
            ("--colorScaleMax", &self.color_scale_max),
            ("--simplifyPlot", &self.simplify_plot),
            ("--squeezePlot", &self.squeeze_plot),
        ];
        options
            .into_iter()
            .filter_map(|(flag, value)| value.as_ref().map(|v| [flag.to_string(), v.clone()]))
            .flatten()
            .collect()
    }
}

#[derive(Args)]
pub struct Plot2doCMD {
    #[arg(short = 'f', long = "file", default_value = DEFAULT_PATH_SAMPLES)]
    /// Sample names listed one sample name by line; BED files are next to this file
    pub path_samples: PathBuf,

    #[arg(long = "input-suffix", default_value = "")]
    /// Suffix added to sample name in BED filename for input
    pub input_suffix: String,

    #[command(flatten)]
    pub options: Plot2doOptions,

    #[arg(short = 'i', long = "index")]
    /// Index of sample to process in samples file
    pub index: Option<usize>,
}
impl Plot2doCMD {
    /// Run the commandline option
    pub fn try_execute(&mut self) -> Result<()> {
        Plot2do::run(
            &Plot2do {
                path_samples: self.path_samples.clone(),
                index: self.index,
                input_suffix: self.input_suffix.clone(),
                options: self.options.clone(),
                tools: ToolConfig::from_env(),
            },
            &SystemRunner,
        )?;
        log::info!("Plot2do has finished succesfully");
        Ok(())
    }
}

/// Run plot2DO on the BED file of every sample
pub struct Plot2do {
    pub path_samples: PathBuf,
    pub index: Option<usize>,
    pub input_suffix: String,
    pub options: Plot2doOptions,
    pub tools: ToolConfig,
}
impl Plot2do {
    /// Run the algorithm
    pub fn run(params: &Plot2do, runner: &dyn Runner) -> Result<()> {
        let folder = params.path_samples.parent().unwrap_or(Path::new(""));
        for sample in sample_names(&params.path_samples, params.index)? {
            let bed = folder.join(format!("{}{}.bed", sample, params.input_suffix));
            if !bed.is_file() {
                log::warn!("BED file {:?} of sample {} does not exist, skipping", bed, sample);
                continue;
            }
            println!("Running plot2DO on sample {}", sample);
            let inv = Invocation::new("Rscript")
                .arg(ToolConfig::in_base(&params.tools.plot2do_base, PLOT2DO_SCRIPT))
                .args(params.options.to_args())
                .arg("-f")
                .path(&bed);
            runner
                .run(&inv)
                .with_context(|| format!("plot2DO failed on sample {}", sample))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::RecordingRunner;

    #[test]
    fn test_plot2do() {
        let dir = tempfile::tempdir().unwrap();
        let samples = dir.path().join("samples.txt");
        std::fs::write(&samples, "POLR2A\nASDURF\n").unwrap();
        std::fs::write(dir.path().join("POLR2A.bed"), "chrI\t1\t2\n").unwrap();

        let runner = RecordingRunner::new();
        let params = Plot2do {
            path_samples: samples,
            index: None,
            input_suffix: String::new(),
            options: Plot2doOptions::default(),
            tools: ToolConfig::default(),
        };
        Plot2do::run(&params, &runner).unwrap();
        let bed = dir.path().join("POLR2A.bed").to_string_lossy().into_owned();
        assert_eq!(
            runner.argvs(),
            vec![vec!["Rscript", "plot2DO.R", "-f", bed.as_str()]]
        );
    }

    #[test]
    fn test_plot2do_parameters() {
        let options = Plot2doOptions {
            kind: Some("dyads".to_string()),
            genome: Some("mm9".to_string()),
            reference: Some("Plus1".to_string()),
            sites: Some("sites.txt".to_string()),
            align: Some("fivePrime".to_string()),
            site_label: Some("site-test".to_string()),
            min_length: Some("100".to_string()),
            max_length: Some("300".to_string()),
            upstream: Some("500".to_string()),
            downstream: Some("600".to_string()),
            color_scale_max: Some("0.05".to_string()),
            simplify_plot: Some("on".to_string()),
            squeeze_plot: Some("on".to_string()),
        };
        assert_eq!(
            options.to_args(),
            vec![
                "--type", "dyads", "--genome", "mm9", "--reference", "Plus1", "--sites",
                "sites.txt", "--align", "fivePrime", "--siteLabel", "site-test", "--minLength",
                "100", "--maxLength", "300", "--upstream", "500", "--downstream", "600",
                "--colorScaleMax", "0.05", "--simplifyPlot", "on", "--squeezePlot", "on",
            ]
        );

        let dir = tempfile::tempdir().unwrap();
        let samples = dir.path().join("samples.txt");
        std::fs::write(&samples, "POLR2A\nASDURF\n").unwrap();
        std::fs::write(dir.path().join("ASDURF-dyad.bed"), "chrI\t1\t2\n").unwrap();
        let runner = RecordingRunner::new();
        let params = Plot2do {
            path_samples: samples,
            index: Some(1),
            input_suffix: "-dyad".to_string(),
            options: Plot2doOptions {
                genome: Some("mm9".to_string()),
                ..Default::default()
            },
            tools: ToolConfig {
                plot2do_base: Some("/opt/plot2DO/".to_string()),
                ..Default::default()
            },
        };
        Plot2do::run(&params, &runner).unwrap();
        let argv = &runner.argvs()[0];
        assert_eq!(argv[..4], ["Rscript", "/opt/plot2DO/plot2DO.R", "--genome", "mm9"]);
        assert_eq!(argv[4], "-f");
    }
}
