pub mod gaussian;
pub mod plot;
pub mod profile;

pub use gaussian::{Curve, Gaussian};
pub use profile::{read_profile, Profile};

use std::fmt;

use levenberg_marquardt::{LeastSquaresProblem, LevenbergMarquardt};
use nalgebra::storage::Owned;
use nalgebra::{DMatrix, DVector, Dyn};

use crate::runtime::Error;

///////////////////////////////
/// Starting value of a fitted parameter, with optional bounds.
///
/// Bounded parameters are fitted on an unbounded internal scale:
/// * both bounds: `min + (sin(p) + 1) * (max - min) / 2`
/// * lower bound: `min - 1 + sqrt(p^2 + 1)`
/// * upper bound: `max + 1 - sqrt(p^2 + 1)`
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Parameter {
    pub value: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// A minimum not below its maximum is an invalid option
pub fn check_bounds(option: &str, min: Option<f64>, max: Option<f64>) -> anyhow::Result<()> {
    if let (Some(min), Some(max)) = (min, max) {
        if min >= max {
            return Err(Error::invalid_option(
                option,
                Some(format!("minimum {} must be lower than maximum {}", min, max)),
            )
            .into());
        }
    }
    Ok(())
}

impl Parameter {
    pub fn new(value: f64) -> Parameter {
        Parameter {
            value,
            min: None,
            max: None,
        }
    }

    pub fn bounded(value: f64, min: Option<f64>, max: Option<f64>) -> Parameter {
        Parameter { value, min, max }
    }

    fn validate(&self, name: &str) -> anyhow::Result<()> {
        check_bounds(name, self.min, self.max)
    }

    fn clipped(&self) -> f64 {
        let mut value = self.value;
        if let Some(min) = self.min {
            value = value.max(min);
        }
        if let Some(max) = self.max {
            value = value.min(max);
        }
        value
    }

    fn to_internal(&self) -> f64 {
        let value = self.clipped();
        match (self.min, self.max) {
            (Some(min), Some(max)) => (2.0 * (value - min) / (max - min) - 1.0).asin(),
            (Some(min), None) => ((value - min + 1.0).powi(2) - 1.0).sqrt(),
            (None, Some(max)) => ((max - value + 1.0).powi(2) - 1.0).sqrt(),
            (None, None) => value,
        }
    }

    fn to_external(&self, p: f64) -> f64 {
        match (self.min, self.max) {
            (Some(min), Some(max)) => min + (p.sin() + 1.0) * (max - min) / 2.0,
            (Some(min), None) => min - 1.0 + (p * p + 1.0).sqrt(),
            (None, Some(max)) => max + 1.0 - (p * p + 1.0).sqrt(),
            (None, None) => p,
        }
    }

    /// d external / d internal
    fn derivative(&self, p: f64) -> f64 {
        match (self.min, self.max) {
            (Some(min), Some(max)) => p.cos() * (max - min) / 2.0,
            (Some(_), None) => p / (p * p + 1.0).sqrt(),
            (None, Some(_)) => -p / (p * p + 1.0).sqrt(),
            (None, None) => 1.0,
        }
    }
}

/// Starting values of one Gaussian
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GaussianParameters {
    pub amplitude: Parameter,
    pub center: Parameter,
    pub sigma: Parameter,
}

/// Starting values of a constant plus Gaussians model
#[derive(Clone, Debug, PartialEq)]
pub struct CurveParameters {
    pub constant: Parameter,
    pub gaussians: Vec<GaussianParameters>,
}

impl CurveParameters {
    /// Flat parameter list: constant, then amplitude, center, sigma of every Gaussian
    fn flat(&self) -> Vec<Parameter> {
        let mut out = Vec::with_capacity(1 + 3 * self.gaussians.len());
        out.push(self.constant);
        for g in &self.gaussians {
            out.extend([g.amplitude, g.center, g.sigma]);
        }
        out
    }

    /// The model at the starting values, bounds applied
    pub fn initial(&self) -> Curve {
        curve_from(&self.flat().iter().map(Parameter::clipped).collect::<Vec<_>>())
    }
}

fn curve_from(values: &[f64]) -> Curve {
    Curve {
        constant: values[0],
        gaussians: values[1..]
            .chunks_exact(3)
            .map(|c| Gaussian::new(c[0], c[1], c[2]))
            .collect(),
    }
}

///////////////////////////////
/// Least squares problem over the internal parameters
struct CurveProblem<'a> {
    x: &'a [f64],
    y: &'a [f64],
    parameters: Vec<Parameter>,
    internal: DVector<f64>,
}

impl CurveProblem<'_> {
    fn external(&self) -> Vec<f64> {
        self.parameters
            .iter()
            .zip(self.internal.iter())
            .map(|(p, v)| p.to_external(*v))
            .collect()
    }
}

impl LeastSquaresProblem<f64, Dyn, Dyn> for CurveProblem<'_> {
    type ResidualStorage = Owned<f64, Dyn>;
    type JacobianStorage = Owned<f64, Dyn, Dyn>;
    type ParameterStorage = Owned<f64, Dyn>;

    fn set_params(&mut self, p: &DVector<f64>) {
        self.internal.copy_from(p);
    }

    fn params(&self) -> DVector<f64> {
        self.internal.clone()
    }

    fn residuals(&self) -> Option<DVector<f64>> {
        let curve = curve_from(&self.external());
        Some(DVector::from_iterator(
            self.x.len(),
            self.x.iter().zip(self.y).map(|(x, y)| curve.eval(*x) - y),
        ))
    }

    fn jacobian(&self) -> Option<DMatrix<f64>> {
        let curve = curve_from(&self.external());
        let chain: Vec<f64> = self
            .parameters
            .iter()
            .zip(self.internal.iter())
            .map(|(p, v)| p.derivative(*v))
            .collect();
        let mut jacobian = DMatrix::zeros(self.x.len(), self.parameters.len());
        for (row, x) in self.x.iter().enumerate() {
            jacobian[(row, 0)] = chain[0];
            for (i, g) in curve.gaussians.iter().enumerate() {
                for (k, d) in g.gradient(*x).iter().enumerate() {
                    let col = 1 + 3 * i + k;
                    jacobian[(row, col)] = d * chain[col];
                }
            }
        }
        Some(jacobian)
    }
}

///////////////////////////////
/// Outcome of a successful fit
#[derive(Clone, Debug)]
pub struct Fit {
    pub initial: Curve,
    pub best: Curve,
    pub evaluations: usize,
    pub chi_square: f64,
    pub points: usize,
}

/// Least squares fit of `params` to the points
pub fn fit_curve(x: &[f64], y: &[f64], params: &CurveParameters) -> anyhow::Result<Fit> {
    let parameters = params.flat();
    for (i, p) in parameters.iter().enumerate() {
        p.validate(&format!("parameter {}", i))?;
    }
    if x.len() != y.len() || x.len() < parameters.len() {
        return Err(Error::parse_error(
            "curve fit",
            Some(format!("{} points for {} parameters", x.len(), parameters.len())),
        )
        .into());
    }

    let internal = DVector::from_iterator(parameters.len(), parameters.iter().map(Parameter::to_internal));
    let problem = CurveProblem {
        x,
        y,
        parameters,
        internal,
    };
    let (problem, report) = LevenbergMarquardt::new().minimize(problem);
    if !report.termination.was_successful() {
        anyhow::bail!("fit did not converge: {:?}", report.termination);
    }
    let best = curve_from(&problem.external());
    if !best.constant.is_finite()
        || best
            .gaussians
            .iter()
            .any(|g| !(g.amplitude.is_finite() && g.center.is_finite() && g.sigma.is_finite()))
    {
        anyhow::bail!("fit did not give finite parameters");
    }
    let chi_square = x
        .iter()
        .zip(y)
        .map(|(x, y)| (best.eval(*x) - y).powi(2))
        .sum();
    Ok(Fit {
        initial: params.initial(),
        best,
        evaluations: report.number_of_evaluations,
        chi_square,
        points: x.len(),
    })
}

impl fmt::Display for Fit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[[Fit Statistics]]")?;
        writeln!(f, "    # function evals   = {}", self.evaluations)?;
        writeln!(f, "    # data points      = {}", self.points)?;
        writeln!(f, "    # variables        = {}", 1 + 3 * self.best.gaussians.len())?;
        writeln!(f, "    chi-square         = {}", self.chi_square)?;
        writeln!(f, "[[Variables]]")?;
        writeln!(f, "    c:          {} (init = {})", self.best.constant, self.initial.constant)?;
        for (i, (g, init)) in self.best.gaussians.iter().zip(&self.initial.gaussians).enumerate() {
            writeln!(f, "    g{}_amplitude: {} (init = {})", i, g.amplitude, init.amplitude)?;
            writeln!(f, "    g{}_center:    {} (init = {})", i, g.center, init.center)?;
            writeln!(f, "    g{}_sigma:     {} (init = {})", i, g.sigma, init.sigma)?;
            writeln!(f, "    g{}_height:    {}", i, g.height())?;
            writeln!(f, "    g{}_fwhm:      {}", i, g.fwhm())?;
        }
        Ok(())
    }
}
