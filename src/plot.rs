use anyhow::{Context, Result};
use gpfit_gp::MultivariateNormal;
use ndarray::{Array1, Array2};
use plotters::prelude::*;
use std::path::Path;

const PLOT_SIZE: (u32, u32) = (800, 600);

/// Renders training data as black markers, predictive mean as a blue line
/// and the confidence region as a shaded band into an SVG file.
pub fn plot_regression(
    path: &Path,
    (xt, yt): (&Array2<f64>, &Array1<f64>),
    xtest: &Array2<f64>,
    predictive: &MultivariateNormal<f64>,
) -> Result<()> {
    let xs = xtest.column(0).to_vec();
    let mean = predictive.mean();
    let (lower, upper) = predictive.confidence_region();

    let ys = yt.iter().chain(lower.iter()).chain(upper.iter());
    let (ymin, ymax) = ys.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, up), &v| {
        (lo.min(v), up.max(v))
    });
    let margin = 0.1 * (ymax - ymin).max(1e-3);
    let xall = xt.iter().chain(xs.iter());
    let (xmin, xmax) = xall.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, up), &v| {
        (lo.min(v), up.max(v))
    });

    let root = SVGBackend::new(path, PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("GP regression", ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(30)
        .y_label_area_size(40)
        .build_cartesian_2d(xmin..xmax, (ymin - margin)..(ymax + margin))?;
    chart.configure_mesh().disable_mesh().draw()?;

    let band = Polygon::new(
        xs.iter()
            .zip(upper.iter())
            .map(|(&x, &y)| (x, y))
            .chain(xs.iter().zip(lower.iter()).rev().map(|(&x, &y)| (x, y)))
            .collect::<Vec<_>>(),
        BLUE.mix(0.2).filled(),
    );
    chart
        .draw_series(std::iter::once(band))?
        .label("Confidence")
        .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], BLUE.mix(0.2).filled()));

    chart
        .draw_series(LineSeries::new(
            xs.iter().zip(mean.iter()).map(|(&x, &y)| (x, y)),
            &BLUE,
        ))?
        .label("Mean")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    chart
        .draw_series(
            xt.iter()
                .zip(yt.iter())
                .map(|(&x, &y)| Cross::new((x, y), 3, BLACK)),
        )?
        .label("Observed Data")
        .legend(|(x, y)| Cross::new((x + 10, y), 3, BLACK));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    root.present()
        .with_context(|| format!("cannot write plot to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array};

    #[test]
    fn test_plot_regression() {
        let xt = array![[0.], [0.5], [1.]];
        let yt = array![0., 1., 0.];
        let xtest = Array::linspace(0., 1., 5).insert_axis(ndarray::Axis(1));
        let predictive =
            MultivariateNormal::new(array![0., 0.5, 1., 0.5, 0.], Array2::eye(5) * 0.1).unwrap();

        let test_dir = "target/tests";
        std::fs::create_dir_all(test_dir).ok();
        let path = Path::new(test_dir).join("gp_regression.svg");
        plot_regression(&path, (&xt, &yt), &xtest, &predictive).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("Observed Data"));
        assert!(svg.contains("Confidence"));
    }
}
