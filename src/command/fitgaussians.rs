use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use plotters::style::{Color, BLACK, BLUE, RED};

use super::constants::DEFAULT_PATH_SAMPLES;
use super::sample_names;
use crate::fit::plot::{hue, Plot, Series};
use crate::fit::{check_bounds, fit_curve, read_profile, CurveParameters, Fit, GaussianParameters, Parameter, Profile};
use crate::runtime::Error;

pub const Y_LABEL_FREQUENCY: &str = "Frequency";

/// What goes on a fit plot besides the data and the best fit
#[derive(Args, Clone, Copy, Debug, Default)]
pub struct FitPlotArgs {
    #[arg(short = 'c', long = "components")]
    /// Shows fit components and initial fit in plot
    pub components: bool,

    #[arg(short = 'g', long = "gaussian")]
    /// Shows gaussian components scaled with the constant component
    pub gaussian: bool,

    #[arg(long = "svg")]
    /// Save vectorial plot
    pub svg: bool,

    #[arg(short = 'v', long = "verbose")]
    /// Shows fit report
    pub verbose: bool,
}

impl FitPlotArgs {
    /// Data in red, then the fitted curve and whatever components were asked for.
    /// A failed fit leaves the data alone on the plot
    pub fn plot(&self, title: &str, profile: &Profile, y_label: &str, fit: Option<&Fit>) -> Plot {
        let x = &profile.x;
        let mut plot = Plot::new(title, y_label);
        plot.push(Series::new(x, &profile.y, &RED, 1));
        plot.legend = self.components;
        let Some(fit) = fit else {
            return plot;
        };
        let count = fit.best.gaussians.len();
        if self.components {
            plot.push(Series::new(x, &fit.initial.eval_all(x), &BLUE.mix(0.5), 1).labeled("Initial fit"));
        }
        plot.push(Series::new(x, &fit.best.eval_all(x), &BLUE, 2).labeled("Best fit"));
        if self.gaussian {
            for i in 0..count {
                plot.push(
                    Series::new(x, &fit.best.raised_component(i, x), &hue(i, count + 1), 1)
                        .labeled(format!("Gaussian {}", i)),
                );
            }
        }
        if self.components {
            let constant = vec![fit.best.constant; x.len()];
            plot.push(Series::new(x, &constant, &BLACK, 1).labeled("Constant component"));
            for (i, g) in fit.best.gaussians.iter().enumerate() {
                let ys: Vec<f64> = x.iter().map(|v| g.eval(*v)).collect();
                plot.push(Series::new(x, &ys, &hue(i, count + 1), 1).labeled(format!("Gaussian component {}", i)));
            }
        }
        plot
    }
}

#[derive(Args)]
pub struct FitGaussiansCMD {
    #[arg(short = 's', long = "samples", default_value = DEFAULT_PATH_SAMPLES)]
    /// Sample names listed one sample name by line
    pub path_samples: PathBuf,

    #[command(flatten)]
    pub plot: FitPlotArgs,

    #[arg(long = "curves")]
    /// Saves curve details in text file
    pub curves: bool,

    #[arg(long = "count", default_value_t = 1)]
    /// Number of Gaussian curves to fit
    pub count: usize,

    #[arg(long = "amin", visible_alias = "am")]
    /// Minimum amplitude of gaussians. Defaults to unbounded
    pub amin: Option<f64>,

    #[arg(long = "amax", visible_alias = "aM")]
    /// Maximum amplitude of gaussians. Defaults to unbounded
    pub amax: Option<f64>,

    #[arg(long = "smin", visible_alias = "sm")]
    /// Minimum width (sigma) of gaussians. Defaults to 0
    pub smin: Option<f64>,

    #[arg(long = "smax", visible_alias = "sM")]
    /// Maximum width (sigma) of gaussians. Defaults to unbounded
    pub smax: Option<f64>,

    #[arg(long = "suffix", default_value = "")]
    /// Suffix to append to sample name
    pub suffix: String,

    #[arg(short = 'i', long = "index")]
    /// Index of sample to process in samples file
    pub index: Option<usize>,
}
impl FitGaussiansCMD {
    /// Run the commandline option
    pub fn try_execute(&mut self) -> Result<()> {
        FitGaussians::run(&FitGaussians {
            path_workdir: PathBuf::new(),
            path_samples: self.path_samples.clone(),
            index: self.index,
            plot: self.plot,
            curves: self.curves,
            count: self.count,
            amin: self.amin,
            amax: self.amax,
            smin: self.smin,
            smax: self.smax,
            suffix: self.suffix.clone(),
        })?;
        log::info!("FitGaussians has finished succesfully");
        Ok(())
    }
}

/// Fit a constant plus `count` Gaussians to the dyad coverage of every sample
pub struct FitGaussians {
    pub path_workdir: PathBuf,
    pub path_samples: PathBuf,
    pub index: Option<usize>,
    pub plot: FitPlotArgs,
    pub curves: bool,
    pub count: usize,
    pub amin: Option<f64>,
    pub amax: Option<f64>,
    pub smin: Option<f64>,
    pub smax: Option<f64>,
    pub suffix: String,
}
impl FitGaussians {
    /// Run the algorithm
    pub fn run(params: &FitGaussians) -> Result<()> {
        if params.count == 0 {
            return Err(Error::invalid_option("--count", Some("at least one Gaussian is needed")).into());
        }
        check_bounds("--amin", params.amin, params.amax)?;
        check_bounds("--smin", Some(params.smin.unwrap_or(0.0)), params.smax)?;
        for sample in sample_names(&params.path_samples, params.index)? {
            params
                .fit_sample(&sample)
                .with_context(|| format!("Could not fit Gaussians to sample {}", sample))?;
        }
        Ok(())
    }

    fn output(&self, sample: &str, ending: &str) -> PathBuf {
        self.path_workdir
            .join(format!("{}{}-{}gaussians{}", sample, self.suffix, self.count, ending))
    }

    /// Constant at the lowest value, Gaussians spread evenly over the positions
    pub fn initial_parameters(&self, profile: &Profile) -> CurveParameters {
        let (x_min, x_max) = (profile.x_min(), profile.x_max());
        let n = self.count as f64;
        let amplitude = profile.y_max() * 100.0 / n;
        let sigma = (x_max - x_min) / 2.0 / n;
        CurveParameters {
            constant: Parameter::bounded(profile.y_min(), Some(0.0), None),
            gaussians: (0..self.count)
                .map(|i| GaussianParameters {
                    amplitude: Parameter::bounded(amplitude, self.amin, self.amax),
                    center: Parameter::new(x_min + (x_max - x_min) * (i + 1) as f64 / (n + 1.0)),
                    sigma: Parameter::bounded(sigma, Some(self.smin.unwrap_or(0.0)), self.smax),
                })
                .collect(),
        }
    }

    pub fn fit_sample(&self, sample: &str) -> Result<()> {
        println!("Fits {} gaussian curves to dyad coverage of sample {}", self.count, sample);
        let input = self.path_workdir.join(format!("{}{}.txt", sample, self.suffix));
        let profile = read_profile(&input, None)?;
        let fit = match fit_curve(&profile.x, &profile.y, &self.initial_parameters(&profile)) {
            Ok(fit) => Some(fit),
            Err(e) => {
                log::warn!("could not fit gaussian curves to sample {}: {:#}", sample, e);
                None
            }
        };
        if let Some(fit) = &fit {
            if self.plot.verbose {
                println!("{}", fit);
            }
            if self.curves {
                write_curves(fit, &profile.x, &self.output(sample, "-curves.txt"), &self.output(sample, "-curvesxy.txt"))?;
            }
        }

        let plot = self.plot.plot(sample, &profile, Y_LABEL_FREQUENCY, fit.as_ref());
        plot.save_png(&self.output(sample, ".png"))?;
        if self.plot.svg {
            plot.save_svg(&self.output(sample, ".svg"))?;
        }
        Ok(())
    }
}

/// Parameters of every Gaussian, and every Gaussian raised by the constant at each position
pub fn write_curves(fit: &Fit, x: &[f64], curves: &Path, curves_xy: &Path) -> Result<()> {
    let mut out = BufWriter::new(File::create(curves).with_context(|| format!("Could not create {:?}", curves))?);
    writeln!(
        out,
        "Gaussian index\tAmplitude\tCenter\tSigma\tHeight\tWidth at half maximum\tArea"
    )?;
    for (i, g) in fit.best.gaussians.iter().enumerate() {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            i + 1,
            g.amplitude,
            g.center,
            g.sigma,
            g.height(),
            g.fwhm(),
            g.area()
        )?;
    }
    out.flush()?;

    let mut out = BufWriter::new(File::create(curves_xy).with_context(|| format!("Could not create {:?}", curves_xy))?);
    let mut header = vec!["X".to_string()];
    header.extend((1..=fit.best.gaussians.len()).map(|i| format!("Gaussian {}", i)));
    writeln!(out, "{}", header.join("\t"))?;
    let components: Vec<Vec<f64>> = (0..fit.best.gaussians.len())
        .map(|i| fit.best.raised_component(i, x))
        .collect();
    for (row, xv) in x.iter().enumerate() {
        let mut line = vec![xv.to_string()];
        line.extend(components.iter().map(|c| c[row].to_string()));
        writeln!(out, "{}", line.join("\t"))?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::{Curve, Gaussian};

    fn write_profile(dir: &Path, name: &str, truth: &Curve) {
        let mut text = String::from("Position\tFrequency\n");
        for x in -75..=75 {
            let x = x as f64;
            text.push_str(&format!("{}\t{}\n", x, truth.eval(x) + 0.0001 * (x * 0.9).sin()));
        }
        std::fs::write(dir.join(name), text).unwrap();
    }

    fn params(dir: &Path, count: usize) -> FitGaussians {
        FitGaussians {
            path_workdir: dir.to_path_buf(),
            path_samples: dir.join("samples.txt"),
            index: None,
            plot: FitPlotArgs::default(),
            curves: true,
            count,
            amin: None,
            amax: None,
            smin: None,
            smax: None,
            suffix: "-dyad".to_string(),
        }
    }

    #[test]
    fn test_initial_parameters() {
        let profile = Profile {
            x: vec![-75.0, 0.0, 75.0],
            y: vec![0.1, 0.4, 0.2],
            y_header: "Frequency".to_string(),
        };
        let dir = tempfile::tempdir().unwrap();
        let p = FitGaussians {
            amin: Some(1.0),
            smax: Some(30.0),
            ..params(dir.path(), 2)
        }
        .initial_parameters(&profile);
        assert_eq!(p.constant, Parameter::bounded(0.1, Some(0.0), None));
        assert_eq!(p.gaussians.len(), 2);
        assert_eq!(p.gaussians[0].amplitude, Parameter::bounded(20.0, Some(1.0), None));
        assert_eq!(p.gaussians[0].sigma, Parameter::bounded(37.5, Some(0.0), Some(30.0)));
        assert_eq!(p.gaussians[0].center.value, -25.0);
        assert_eq!(p.gaussians[1].center.value, 25.0);
    }

    #[test]
    fn test_fitgaussians() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("samples.txt"), "POLR2A\n").unwrap();
        let truth = Curve {
            constant: 0.002,
            gaussians: vec![Gaussian::new(0.8, 0.0, 20.0)],
        };
        write_profile(dir.path(), "POLR2A-dyad.txt", &truth);
        FitGaussians::run(&params(dir.path(), 1)).unwrap();

        assert!(dir.path().join("POLR2A-dyad-1gaussians.png").is_file());
        let curves = std::fs::read_to_string(dir.path().join("POLR2A-dyad-1gaussians-curves.txt")).unwrap();
        let mut lines = curves.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Gaussian index\tAmplitude\tCenter\tSigma\tHeight\tWidth at half maximum\tArea"
        );
        let values: Vec<f64> = lines.next().unwrap().split('\t').map(|v| v.parse().unwrap()).collect();
        assert_eq!(values[0], 1.0);
        assert!((values[1] - 0.8).abs() < 0.01);
        assert!(values[2].abs() < 0.1);
        assert!((values[3] - 20.0).abs() < 0.1);

        let curves_xy = std::fs::read_to_string(dir.path().join("POLR2A-dyad-1gaussians-curvesxy.txt")).unwrap();
        assert_eq!(curves_xy.lines().next().unwrap(), "X\tGaussian 1");
        assert_eq!(curves_xy.lines().count(), 152);
        assert!(curves_xy.lines().nth(1).unwrap().starts_with("-75\t"));
    }

    #[test]
    fn test_fitgaussians_zero_count() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FitGaussians::run(&params(dir.path(), 0)).is_err());
    }

    #[test]
    fn test_fitgaussians_inverted_bounds() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("samples.txt"), "POLR2A\n").unwrap();
        let truth = Curve {
            constant: 0.002,
            gaussians: vec![Gaussian::new(0.8, 0.0, 20.0)],
        };
        write_profile(dir.path(), "POLR2A-dyad.txt", &truth);

        for p in [
            FitGaussians {
                amin: Some(10.0),
                amax: Some(5.0),
                ..params(dir.path(), 1)
            },
            FitGaussians {
                smin: Some(40.0),
                smax: Some(30.0),
                ..params(dir.path(), 1)
            },
            FitGaussians {
                smax: Some(-1.0),
                ..params(dir.path(), 1)
            },
        ] {
            let err = FitGaussians::run(&p).unwrap_err();
            assert!(matches!(err.downcast_ref::<Error>(), Some(Error::InvalidOption { .. })));
        }
        assert!(!dir.path().join("POLR2A-dyad-1gaussians.png").exists());
    }
}
