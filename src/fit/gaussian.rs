use std::f64::consts::PI;

/// 2 * sqrt(2 * ln 2)
pub const FWHM_FACTOR: f64 = 2.354_820_045_030_949;
/// Area of a Gaussian relative to height * FWHM
pub const AREA_FACTOR: f64 = 1.064467;

///////////////////////////////
/// Normalized Gaussian scaled by its amplitude (the area under the curve)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Gaussian {
    pub amplitude: f64,
    pub center: f64,
    pub sigma: f64,
}

impl Gaussian {
    pub fn new(amplitude: f64, center: f64, sigma: f64) -> Gaussian {
        Gaussian {
            amplitude,
            center,
            sigma,
        }
    }

    pub fn eval(&self, x: f64) -> f64 {
        let z = (x - self.center) / self.sigma;
        self.height() * (-0.5 * z * z).exp()
    }

    /// Partial derivatives by amplitude, center and sigma
    pub fn gradient(&self, x: f64) -> [f64; 3] {
        let d = x - self.center;
        let s2 = self.sigma * self.sigma;
        let shape = (-0.5 * d * d / s2).exp() / (self.sigma * (2.0 * PI).sqrt());
        let f = self.amplitude * shape;
        [
            shape,
            f * d / s2,
            f * (d * d / (s2 * self.sigma) - 1.0 / self.sigma),
        ]
    }

    pub fn height(&self) -> f64 {
        self.amplitude / (self.sigma * (2.0 * PI).sqrt())
    }

    /// Full width at half maximum
    pub fn fwhm(&self) -> f64 {
        FWHM_FACTOR * self.sigma
    }

    pub fn area(&self) -> f64 {
        AREA_FACTOR * self.height() * self.fwhm()
    }
}

///////////////////////////////
/// A constant background plus a sum of Gaussians
#[derive(Clone, Debug, PartialEq)]
pub struct Curve {
    pub constant: f64,
    pub gaussians: Vec<Gaussian>,
}

impl Curve {
    pub fn eval(&self, x: f64) -> f64 {
        self.constant + self.gaussians.iter().map(|g| g.eval(x)).sum::<f64>()
    }

    pub fn eval_all(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|x| self.eval(*x)).collect()
    }

    /// Values of one Gaussian raised by the constant
    pub fn raised_component(&self, i: usize, xs: &[f64]) -> Vec<f64> {
        xs.iter()
            .map(|x| self.constant + self.gaussians[i].eval(*x))
            .collect()
    }
}
