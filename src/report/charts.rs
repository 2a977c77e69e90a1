//! SVG charts.
//!
//! - [`draw_gantt`]: one row per server, one bar per busy span, coloured
//!   by job.
//! - [`draw_cost_graph`]: min/mean/max particle cost per epoch.

use std::fs;
use std::path::Path;

use super::records::ensure_parent;
use crate::error::ReportError;
use crate::experiment::RunStat;
use crate::swarm::EpochCost;

const WIDTH: f64 = 960.0;
const MARGIN: f64 = 48.0;
const ROW_HEIGHT: f64 = 18.0;
const GRAPH_HEIGHT: f64 = 420.0;

fn job_color(job_id: u64) -> String {
    // Golden-angle hue steps keep neighbouring ids apart.
    let hue = (job_id as f64 * 137.507_764) % 360.0;
    format!("hsl({hue:.1},65%,55%)")
}

fn header(width: f64, height: f64) -> String {
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.0}\" height=\"{height:.0}\" \
         viewBox=\"0 0 {width:.0} {height:.0}\" font-family=\"sans-serif\" font-size=\"11\">\n\
         <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n"
    )
}

/// Draws the server/time Gantt chart of one run to `path`.
pub fn draw_gantt(
    stat: &RunStat,
    server_count: usize,
    path: impl AsRef<Path>,
) -> Result<(), ReportError> {
    let plot_width = WIDTH - 2.0 * MARGIN;
    let height = 2.0 * MARGIN + ROW_HEIGHT * server_count as f64;
    let scale = if stat.makespan > 0.0 {
        plot_width / stat.makespan
    } else {
        0.0
    };

    let mut svg = header(WIDTH, height);
    svg.push_str(&format!(
        "<text x=\"{MARGIN}\" y=\"{:.1}\">run {} makespan {:.2} cost {:.3}</text>\n",
        MARGIN / 2.0,
        stat.run,
        stat.makespan,
        stat.cost
    ));

    for row in 0..server_count {
        let y = MARGIN + ROW_HEIGHT * row as f64;
        svg.push_str(&format!(
            "<text x=\"4\" y=\"{:.1}\">S{row}</text>\n\
             <rect x=\"{MARGIN}\" y=\"{y:.1}\" width=\"{plot_width:.1}\" height=\"{ROW_HEIGHT}\" \
             fill=\"none\" stroke=\"#ddd\"/>\n",
            y + ROW_HEIGHT * 0.7
        ));
    }

    for task in &stat.tasks {
        let color = job_color(task.job_id);
        for span in task.busy_spans() {
            let x = MARGIN + span.start * scale;
            let y = MARGIN + ROW_HEIGHT * span.server.id() as f64 + 1.0;
            let w = ((span.end - span.start) * scale).max(0.5);
            svg.push_str(&format!(
                "<rect class=\"span\" x=\"{x:.2}\" y=\"{y:.1}\" width=\"{w:.2}\" \
                 height=\"{:.1}\" fill=\"{color}\"><title>job {} [{:.2}, {:.2}]</title></rect>\n",
                ROW_HEIGHT - 2.0,
                span.job_id,
                span.start,
                span.end
            ));
        }
    }

    let axis_y = height - MARGIN / 2.0;
    svg.push_str(&format!(
        "<text x=\"{MARGIN}\" y=\"{axis_y:.1}\">0</text>\n\
         <text x=\"{:.1}\" y=\"{axis_y:.1}\" text-anchor=\"end\">{:.2}</text>\n</svg>\n",
        WIDTH - MARGIN,
        stat.makespan
    ));

    let path = path.as_ref();
    ensure_parent(path)?;
    fs::write(path, svg)?;
    Ok(())
}

/// Draws min, mean and max cost per epoch to `path`.
pub fn draw_cost_graph(costs: &[EpochCost], path: impl AsRef<Path>) -> Result<(), ReportError> {
    let plot_width = WIDTH - 2.0 * MARGIN;
    let plot_height = GRAPH_HEIGHT - 2.0 * MARGIN;
    let lo = costs.iter().map(|c| c.min).fold(f64::INFINITY, f64::min);
    let hi = costs.iter().map(|c| c.max).fold(f64::NEG_INFINITY, f64::max);
    let (lo, hi) = if lo.is_finite() && hi > lo {
        (lo, hi)
    } else if lo.is_finite() {
        (lo - 1.0, lo + 1.0)
    } else {
        (0.0, 1.0)
    };
    let step = if costs.len() > 1 {
        plot_width / (costs.len() - 1) as f64
    } else {
        0.0
    };
    let point = |i: usize, v: f64| {
        let x = MARGIN + step * i as f64;
        let y = MARGIN + plot_height * (1.0 - (v - lo) / (hi - lo));
        format!("{x:.2},{y:.2}")
    };

    let mut svg = header(WIDTH, GRAPH_HEIGHT);
    svg.push_str(&format!(
        "<rect x=\"{MARGIN}\" y=\"{MARGIN}\" width=\"{plot_width:.1}\" height=\"{plot_height:.1}\" \
         fill=\"none\" stroke=\"#999\"/>\n\
         <text x=\"4\" y=\"{:.1}\">{hi:.3}</text>\n\
         <text x=\"4\" y=\"{:.1}\">{lo:.3}</text>\n",
        MARGIN + 4.0,
        MARGIN + plot_height
    ));

    let series: [(&str, &str, fn(&EpochCost) -> f64); 3] = [
        ("min", "#2a9d8f", |c: &EpochCost| c.min),
        ("mean", "#264653", |c: &EpochCost| c.mean),
        ("max", "#e76f51", |c: &EpochCost| c.max),
    ];
    for (row, (name, color, value)) in series.iter().enumerate() {
        let points: Vec<String> = costs
            .iter()
            .enumerate()
            .map(|(i, c)| point(i, value(c)))
            .collect();
        svg.push_str(&format!(
            "<polyline class=\"{name}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"2\" \
             points=\"{}\"/>\n\
             <text x=\"{:.1}\" y=\"{:.1}\" fill=\"{color}\">{name}</text>\n",
            points.join(" "),
            WIDTH - MARGIN + 4.0,
            MARGIN + 14.0 * row as f64
        ));
    }
    svg.push_str(&format!(
        "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\">epoch</text>\n</svg>\n",
        WIDTH / 2.0,
        GRAPH_HEIGHT - MARGIN / 3.0
    ));

    let path = path.as_ref();
    ensure_parent(path)?;
    fs::write(path, svg)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Server, Task};

    fn stat() -> RunStat {
        let mut task = Task::new(1, 4.0, vec![Server::new(0)], 0.0, 4.0);
        task.reconfigure(1.0, vec![Server::new(1)], 1.0);
        RunStat {
            run: 0,
            job_count: 2,
            makespan: 5.0,
            mean_flow_time: 3.0,
            mean_wait_time: 0.5,
            utilization: 0.5,
            energy: 6.0,
            reconfigurations: 1,
            power_offs: 0,
            cost: 3.3,
            tasks: vec![task, Task::new(2, 1.0, vec![Server::new(2)], 4.0, 5.0)],
        }
    }

    #[test]
    fn test_gantt_has_one_bar_per_span() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("epoch_0/particle-0-exp-0.svg");
        draw_gantt(&stat(), 3, &path).unwrap();
        let svg = fs::read_to_string(&path).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("class=\"span\"").count(), 3);
        assert!(svg.contains("job 2"));
    }

    #[test]
    fn test_cost_graph_series() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.svg");
        let costs: Vec<EpochCost> = (0..4)
            .map(|e| EpochCost {
                epoch: e,
                min: 1.0 / (e + 1) as f64,
                max: 2.0,
                mean: 1.5,
                std: 0.1,
            })
            .collect();
        draw_cost_graph(&costs, &path).unwrap();
        let svg = fs::read_to_string(&path).unwrap();
        assert_eq!(svg.matches("<polyline").count(), 3);
        assert!(svg.contains("class=\"mean\""));
    }

    #[test]
    fn test_cost_graph_degenerate_inputs() {
        let dir = tempfile::tempdir().unwrap();
        draw_cost_graph(&[], dir.path().join("empty.svg")).unwrap();
        let flat = [EpochCost {
            epoch: 0,
            min: 2.0,
            max: 2.0,
            mean: 2.0,
            std: 0.0,
        }];
        draw_cost_graph(&flat, dir.path().join("flat.svg")).unwrap();
        let svg = fs::read_to_string(dir.path().join("flat.svg")).unwrap();
        assert!(!svg.contains("NaN"));
    }
}
