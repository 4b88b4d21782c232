//! Throughput-vs-size chart

use crate::models::BenchmarkRun;
use crate::Result;
use std::path::{Path, PathBuf};

/// `performance_graph_<stamp>.svg`
pub fn chart_file_name(run: &BenchmarkRun) -> String {
    format!("performance_graph_{}.svg", run.file_stamp())
}

/// Whether this build can draw charts
pub fn is_available() -> bool {
    cfg!(feature = "chart")
}

/// Draw write and read throughput against file size into `dir`
#[cfg(feature = "chart")]
pub fn render_chart(run: &BenchmarkRun, dir: &Path) -> Result<PathBuf> {
    use crate::models::Operation;
    use crate::LustreBenchError;
    use plotters::prelude::*;
    use std::fmt::Display;

    fn chart_err<E: Display>(e: E) -> LustreBenchError {
        LustreBenchError::ChartError(e.to_string())
    }

    let write = run.series(Operation::Write);
    let read = run.series(Operation::Read);
    if write.is_empty() {
        return Err(LustreBenchError::ChartError("no results to plot".into()));
    }

    std::fs::create_dir_all(dir).map_err(chart_err)?;
    let path = dir.join(chart_file_name(run));

    let max_x = write
        .iter()
        .chain(&read)
        .map(|&(x, _)| x)
        .max()
        .unwrap_or(1);
    let max_y = write
        .iter()
        .chain(&read)
        .map(|&(_, y)| y)
        .fold(0.0_f64, f64::max);

    {
        let root = SVGBackend::new(&path, (1000, 600)).into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Lustre I/O Performance", ("sans-serif", 28))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(0u64..max_x + max_x / 10 + 1, 0f64..(max_y * 1.1).max(1.0))
            .map_err(chart_err)?;

        chart
            .configure_mesh()
            .x_desc("File Size (MB)")
            .y_desc("Throughput (MB/s)")
            .draw()
            .map_err(chart_err)?;

        for (label, points, color) in [("Write", &write, BLUE), ("Read", &read, RED)] {
            chart
                .draw_series(LineSeries::new(points.iter().copied(), &color))
                .map_err(chart_err)?
                .label(label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
            chart
                .draw_series(
                    points
                        .iter()
                        .map(|&point| Circle::new(point, 4, color.filled())),
                )
                .map_err(chart_err)?;
        }

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(chart_err)?;

        root.present().map_err(chart_err)?;
    }

    tracing::info!(path = %path.display(), "chart saved");
    Ok(path)
}

#[cfg(not(feature = "chart"))]
pub fn render_chart(_run: &BenchmarkRun, _dir: &Path) -> Result<PathBuf> {
    Err(crate::LustreBenchError::ConfigError(
        "chart support was not compiled into this build".into(),
    ))
}
