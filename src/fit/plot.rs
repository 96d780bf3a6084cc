use std::fmt::Display;
use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

pub const X_LABEL: &str = "Position relative to dyad (bp)";

/// One line of a plot
#[derive(Clone)]
pub struct Series {
    pub label: Option<String>,
    pub points: Vec<(f64, f64)>,
    pub style: ShapeStyle,
}

impl Series {
    pub fn new<C: Color>(xs: &[f64], ys: &[f64], color: &C, width: u32) -> Series {
        Series {
            label: None,
            points: xs.iter().copied().zip(ys.iter().copied()).collect(),
            style: color.stroke_width(width),
        }
    }

    pub fn labeled<S: Into<String>>(mut self, label: S) -> Series {
        self.label = Some(label.into());
        self
    }
}

///////////////////////////////
/// Line plot of a profile and its fitted curves
#[derive(Clone)]
pub struct Plot {
    pub title: String,
    pub y_label: String,
    pub series: Vec<Series>,
    pub legend: bool,
}

fn plot_error<E: Display>(e: E) -> anyhow::Error {
    anyhow::anyhow!("Could not draw plot: {}", e)
}

impl Plot {
    pub fn new<T: Into<String>, Y: Into<String>>(title: T, y_label: Y) -> Plot {
        Plot {
            title: title.into(),
            y_label: y_label.into(),
            series: Vec::new(),
            legend: false,
        }
    }

    pub fn push(&mut self, series: Series) {
        self.series.push(series);
    }

    pub fn save_png(&self, path: &Path) -> anyhow::Result<()> {
        let root = BitMapBackend::new(path, (640, 480)).into_drawing_area();
        root.fill(&WHITE).map_err(plot_error)?;
        self.draw(&root)?;
        root.present().map_err(plot_error)
    }

    /// SVG with a transparent background
    pub fn save_svg(&self, path: &Path) -> anyhow::Result<()> {
        let root = SVGBackend::new(path, (640, 480)).into_drawing_area();
        self.draw(&root)?;
        root.present().map_err(plot_error)
    }

    /// Drawing range: the x extent of the data and all y values with a margin
    fn ranges(&self) -> ((f64, f64), (f64, f64)) {
        let points = || self.series.iter().flat_map(|s| s.points.iter());
        let x_min = points().map(|p| p.0).fold(f64::INFINITY, f64::min);
        let x_max = points().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
        let y_min = points().map(|p| p.1).filter(|y| y.is_finite()).fold(f64::INFINITY, f64::min);
        let y_max = points().map(|p| p.1).filter(|y| y.is_finite()).fold(f64::NEG_INFINITY, f64::max);
        if !(x_min < x_max) || !(y_min <= y_max) {
            return ((0.0, 1.0), (0.0, 1.0));
        }
        let margin = ((y_max - y_min) * 0.05).max(f64::EPSILON);
        ((x_min, x_max), (y_min - margin, y_max + margin))
    }

    fn draw<DB>(&self, root: &DrawingArea<DB, Shift>) -> anyhow::Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let ((x_min, x_max), (y_min, y_max)) = self.ranges();
        let mut chart = ChartBuilder::on(root)
            .caption(&self.title, ("sans-serif", 20))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(plot_error)?;
        chart
            .configure_mesh()
            .disable_mesh()
            .x_desc(X_LABEL)
            .y_desc(&self.y_label)
            .draw()
            .map_err(plot_error)?;

        for series in &self.series {
            let style = series.style;
            let drawn = chart
                .draw_series(LineSeries::new(series.points.iter().copied(), style))
                .map_err(plot_error)?;
            if let Some(label) = &series.label {
                drawn
                    .label(label.as_str())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
            }
        }
        if self.legend {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::LowerRight)
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()
                .map_err(plot_error)?;
        }
        Ok(())
    }
}

/// Evenly spread hues, like a hsv color map split in `count` colors
pub fn hue(i: usize, count: usize) -> HSLColor {
    HSLColor(i as f64 / count.max(1) as f64, 1.0, 0.45)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plot() -> Plot {
        let xs = [-2.0, -1.0, 0.0, 1.0, 2.0];
        let mut plot = Plot::new("POLR2A", "Frequency");
        plot.push(Series::new(&xs, &[1.0, 2.0, 4.0, 2.0, 1.0], &RED, 1));
        plot.push(Series::new(&xs, &[1.1, 2.1, 3.9, 2.1, 1.1], &BLUE, 1).labeled("Best fit"));
        plot.legend = true;
        plot
    }

    #[test]
    fn test_ranges() {
        let ((x_min, x_max), (y_min, y_max)) = plot().ranges();
        assert_eq!((x_min, x_max), (-2.0, 2.0));
        assert!(y_min < 1.0 && y_min > 0.8);
        assert!(y_max > 4.0 && y_max < 4.2);
        assert_eq!(Plot::new("empty", "y").ranges(), ((0.0, 1.0), (0.0, 1.0)));
    }

    #[test]
    fn test_save_svg() {
        let dir = tempfile::tempdir().unwrap();
        let svg = dir.path().join("POLR2A.svg");
        plot().save_svg(&svg).unwrap();
        let text = std::fs::read_to_string(&svg).unwrap();
        assert!(text.contains("<svg"));
        assert!(text.contains("Best fit"));
    }
}
