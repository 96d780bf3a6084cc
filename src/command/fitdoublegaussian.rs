use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use super::constants::DEFAULT_PATH_SAMPLES;
use super::fitgaussians::FitPlotArgs;
use super::sample_names;
use crate::fileformat::splits;
use crate::fit::{check_bounds, fit_curve, read_profile, CurveParameters, GaussianParameters, Parameter, Profile};

pub const COLUMN_ABSOLUTE: &str = "Frequency";
pub const COLUMN_RELATIVE: &str = "Relative Frequency";

/// Starting value and bounds of one of the two Gaussians
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GaussianStart {
    pub center: Option<f64>,
    pub cmin: Option<f64>,
    pub cmax: Option<f64>,
    pub amp: Option<f64>,
    pub amin: Option<f64>,
    pub sigma: Option<f64>,
    pub smin: Option<f64>,
}

impl GaussianStart {
    /// Center bounds of Gaussian `n`, checked before any sample is read
    fn check(&self, n: u8) -> Result<()> {
        check_bounds(&format!("--cmin{}", n), self.cmin, self.cmax)
    }

    fn parameters(&self, center: f64, amp: f64, sigma: f64) -> GaussianParameters {
        GaussianParameters {
            amplitude: Parameter::bounded(self.amp.unwrap_or(amp), self.amin, None),
            center: Parameter::bounded(self.center.unwrap_or(center), self.cmin, self.cmax),
            sigma: Parameter::bounded(self.sigma.unwrap_or(sigma), Some(self.smin.unwrap_or(0.0)), None),
        }
    }
}

#[derive(Args)]
pub struct FitDoubleGaussianCMD {
    #[arg(short = 's', long = "samples", default_value = DEFAULT_PATH_SAMPLES)]
    /// Sample names listed one sample name by line
    pub path_samples: PathBuf,

    #[arg(short = 'a', long = "absolute", overrides_with = "relative")]
    /// Use absolute number of reads
    pub absolute: bool,

    #[arg(short = 'r', long = "relative")]
    /// Use relative number of reads
    pub relative: bool,

    #[command(flatten)]
    pub plot: FitPlotArgs,

    #[arg(long = "center1", visible_alias = "c1", allow_hyphen_values = true)]
    /// Center of first gaussian. Defaults to minus a quater of maximum index
    pub center1: Option<f64>,

    #[arg(long = "cmin1", visible_alias = "cm1", allow_hyphen_values = true)]
    /// Minimum value for center of first gaussian. Defaults to unbounded
    pub cmin1: Option<f64>,

    #[arg(long = "cmax1", visible_alias = "cM1", allow_hyphen_values = true)]
    /// Maximum value for center of first gaussian. Defaults to unbounded
    pub cmax1: Option<f64>,

    #[arg(long = "amp1", visible_alias = "a1")]
    /// Amplitude of first gaussian. Defaults to half of maximum relative frequency, approximately
    pub amp1: Option<f64>,

    #[arg(long = "amin1", visible_alias = "am1")]
    /// Minimum amplitude of first gaussian. Defaults to unbounded
    pub amin1: Option<f64>,

    #[arg(long = "sigma1", visible_alias = "s1")]
    /// Width (sigma) of first gaussian. Defaults to a fifth of maximum index
    pub sigma1: Option<f64>,

    #[arg(long = "smin1", visible_alias = "sm1")]
    /// Minimum width (sigma) of first gaussian. Defaults to 0
    pub smin1: Option<f64>,

    #[arg(long = "center2", visible_alias = "c2", allow_hyphen_values = true)]
    /// Center of second gaussian. Defaults to plus a quater of maximum index
    pub center2: Option<f64>,

    #[arg(long = "cmin2", visible_alias = "cm2", allow_hyphen_values = true)]
    /// Minimum value for center of second gaussian. Defaults to unbounded
    pub cmin2: Option<f64>,

    #[arg(long = "cmax2", visible_alias = "cM2", allow_hyphen_values = true)]
    /// Maximum value for center of second gaussian. Defaults to unbounded
    pub cmax2: Option<f64>,

    #[arg(long = "amp2", visible_alias = "a2")]
    /// Amplitude of second gaussian. Defaults to half of maximum relative frequency, approximately
    pub amp2: Option<f64>,

    #[arg(long = "amin2", visible_alias = "am2")]
    /// Minimum amplitude of second gaussian. Defaults to unbounded
    pub amin2: Option<f64>,

    #[arg(long = "sigma2", visible_alias = "s2")]
    /// Width (sigma) of second gaussian. Defaults to a fifth of maximum index
    pub sigma2: Option<f64>,

    #[arg(long = "smin2", visible_alias = "sm2")]
    /// Minimum width (sigma) of second gaussian. Defaults to 0
    pub smin2: Option<f64>,

    #[arg(long = "suffix", default_value = "")]
    /// Suffix to append to sample name
    pub suffix: String,

    #[arg(short = 'i', long = "index")]
    /// Index of sample to process in samples file
    pub index: Option<usize>,
}
impl FitDoubleGaussianCMD {
    /// Run the commandline option
    pub fn try_execute(&mut self) -> Result<()> {
        FitDoubleGaussian::run(&FitDoubleGaussian {
            path_workdir: PathBuf::new(),
            path_samples: self.path_samples.clone(),
            index: self.index,
            absolute: self.absolute,
            plot: self.plot,
            first: GaussianStart {
                center: self.center1,
                cmin: self.cmin1,
                cmax: self.cmax1,
                amp: self.amp1,
                amin: self.amin1,
                sigma: self.sigma1,
                smin: self.smin1,
            },
            second: GaussianStart {
                center: self.center2,
                cmin: self.cmin2,
                cmax: self.cmax2,
                amp: self.amp2,
                amin: self.amin2,
                sigma: self.sigma2,
                smin: self.smin2,
            },
            suffix: self.suffix.clone(),
        })?;
        log::info!("FitDoubleGaussian has finished succesfully");
        Ok(())
    }
}

/// Fit two Gaussians over a constant to the dyad coverage of every sample and its splits
pub struct FitDoubleGaussian {
    pub path_workdir: PathBuf,
    pub path_samples: PathBuf,
    pub index: Option<usize>,
    pub absolute: bool,
    pub plot: FitPlotArgs,
    pub first: GaussianStart,
    pub second: GaussianStart,
    pub suffix: String,
}
impl FitDoubleGaussian {
    /// Run the algorithm
    pub fn run(params: &FitDoubleGaussian) -> Result<()> {
        params.first.check(1)?;
        params.second.check(2)?;
        for sample in sample_names(&params.path_samples, params.index)? {
            params
                .fit_name(&sample)
                .with_context(|| format!("Could not fit double Gaussian to sample {}", sample))?;
            for split in splits(&params.path_workdir, &sample)? {
                if !params.input(&split.name).is_file() {
                    log::warn!("No dyad coverage for split {}, skipping", split.name);
                    continue;
                }
                params
                    .fit_name(&split.name)
                    .with_context(|| format!("Could not fit double Gaussian to split {}", split.name))?;
            }
        }
        Ok(())
    }

    fn column(&self) -> &'static str {
        if self.absolute {
            COLUMN_ABSOLUTE
        } else {
            COLUMN_RELATIVE
        }
    }

    fn input(&self, name: &str) -> PathBuf {
        self.path_workdir.join(format!("{}{}-dyad.txt", name, self.suffix))
    }

    fn output(&self, name: &str, ending: &str) -> PathBuf {
        self.path_workdir
            .join(format!("{}{}-dyad-double-gaussian{}", name, self.suffix, ending))
    }

    /// Gaussians a quarter of the range left and right of the dyad
    pub fn initial_parameters(&self, profile: &Profile) -> CurveParameters {
        let x_max = profile.x_max();
        let y_max = profile.y_max();
        let amp = y_max * 50.0;
        let sigma = x_max / 5.0;
        CurveParameters {
            constant: Parameter::bounded(profile.y_min(), Some(0.0), Some(y_max)),
            gaussians: vec![
                self.first.parameters(-x_max / 4.0, amp, sigma),
                self.second.parameters(x_max / 4.0, amp, sigma),
            ],
        }
    }

    pub fn fit_name(&self, name: &str) -> Result<()> {
        println!("Fits double gaussian curve to dyad coverage of sample {}", name);
        let profile = read_profile(&self.input(name), Some(self.column()))?;
        let fit = match fit_curve(&profile.x, &profile.y, &self.initial_parameters(&profile)) {
            Ok(fit) => Some(fit),
            Err(e) => {
                log::warn!("could not fit double gaussian curve to sample {}: {:#}", name, e);
                None
            }
        };
        if let (Some(fit), true) = (&fit, self.plot.verbose) {
            println!("{}", fit);
        }
        let plot = self.plot.plot(name, &profile, self.column(), fit.as_ref());
        plot.save_png(&self.output(name, ".png"))?;
        if self.plot.svg {
            plot.save_svg(&self.output(name, ".svg"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::{Curve, Gaussian};
    use crate::runtime::Error;
    use std::path::Path;

    fn write_dyads(path: &Path, truth: &Curve) {
        let mut text = String::from("Position\tFrequency\tRelative Frequency\n");
        for x in -75..=75 {
            let x = x as f64;
            let y = truth.eval(x) + 0.00001 * (x * 1.1).sin();
            text.push_str(&format!("{}\t{}\t{}\n", x, (y * 10000.0).round(), y));
        }
        std::fs::write(path, text).unwrap();
    }

    fn params(dir: &Path) -> FitDoubleGaussian {
        FitDoubleGaussian {
            path_workdir: dir.to_path_buf(),
            path_samples: dir.join("samples.txt"),
            index: None,
            absolute: false,
            plot: FitPlotArgs {
                svg: true,
                ..Default::default()
            },
            first: GaussianStart::default(),
            second: GaussianStart::default(),
            suffix: String::new(),
        }
    }

    #[test]
    fn test_initial_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let profile = Profile {
            x: vec![-75.0, 0.0, 75.0],
            y: vec![0.002, 0.01, 0.004],
            y_header: COLUMN_RELATIVE.to_string(),
        };
        let p = FitDoubleGaussian {
            first: GaussianStart {
                center: Some(-30.0),
                cmin: Some(-60.0),
                cmax: Some(0.0),
                ..Default::default()
            },
            second: GaussianStart {
                amin: Some(0.1),
                smin: Some(5.0),
                ..Default::default()
            },
            ..params(dir.path())
        }
        .initial_parameters(&profile);
        assert_eq!(p.constant, Parameter::bounded(0.002, Some(0.0), Some(0.01)));
        assert_eq!(p.gaussians[0].center, Parameter::bounded(-30.0, Some(-60.0), Some(0.0)));
        assert_eq!(p.gaussians[0].amplitude, Parameter::bounded(0.5, None, None));
        assert_eq!(p.gaussians[0].sigma, Parameter::bounded(15.0, Some(0.0), None));
        assert_eq!(p.gaussians[1].center, Parameter::new(18.75));
        assert_eq!(p.gaussians[1].amplitude, Parameter::bounded(0.5, Some(0.1), None));
        assert_eq!(p.gaussians[1].sigma, Parameter::bounded(15.0, Some(5.0), None));
    }

    #[test]
    fn test_fitdoublegaussian() {
        let dir = tempfile::tempdir().unwrap();
        let d = dir.path();
        std::fs::write(d.join("samples.txt"), "POLR2A\n").unwrap();
        let truth = Curve {
            constant: 0.001,
            gaussians: vec![Gaussian::new(0.4, -20.0, 12.0), Gaussian::new(0.4, 20.0, 12.0)],
        };
        write_dyads(&d.join("POLR2A-dyad.txt"), &truth);
        write_dyads(&d.join("POLR2A-100-110-dyad.txt"), &truth);
        std::fs::write(d.join("POLR2A-100-110.bed"), "").unwrap();
        std::fs::write(d.join("POLR2A-110-120.bed"), "").unwrap();

        FitDoubleGaussian::run(&params(d)).unwrap();
        assert!(d.join("POLR2A-dyad-double-gaussian.png").is_file());
        assert!(d.join("POLR2A-dyad-double-gaussian.svg").is_file());
        assert!(d.join("POLR2A-100-110-dyad-double-gaussian.png").is_file());
        assert!(!d.join("POLR2A-110-120-dyad-double-gaussian.png").exists());
    }

    #[test]
    fn test_fitdoublegaussian_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let d = dir.path();
        std::fs::write(d.join("samples.txt"), "POLR2A\n").unwrap();
        std::fs::write(d.join("POLR2A-dyad.txt"), "Position\tCount\n0\t1\n").unwrap();
        assert!(FitDoubleGaussian::run(&params(d)).is_err());
    }

    #[test]
    fn test_fitdoublegaussian_inverted_center_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let d = dir.path();
        std::fs::write(d.join("samples.txt"), "POLR2A\n").unwrap();
        let truth = Curve {
            constant: 0.001,
            gaussians: vec![Gaussian::new(0.4, -20.0, 12.0), Gaussian::new(0.4, 20.0, 12.0)],
        };
        write_dyads(&d.join("POLR2A-dyad.txt"), &truth);

        for p in [
            FitDoubleGaussian {
                first: GaussianStart {
                    cmin: Some(0.0),
                    cmax: Some(-60.0),
                    ..Default::default()
                },
                ..params(d)
            },
            FitDoubleGaussian {
                second: GaussianStart {
                    cmin: Some(10.0),
                    cmax: Some(10.0),
                    ..Default::default()
                },
                ..params(d)
            },
        ] {
            let err = FitDoubleGaussian::run(&p).unwrap_err();
            assert!(matches!(err.downcast_ref::<Error>(), Some(Error::InvalidOption { .. })));
        }
        assert!(!d.join("POLR2A-dyad-double-gaussian.png").exists());
    }
}
