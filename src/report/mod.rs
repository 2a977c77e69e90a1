//! Result sinks: CSV records and SVG charts.
//!
//! Every writer creates the parent directories of its output path.

mod charts;
mod records;

pub use charts::{draw_cost_graph, draw_gantt};
pub use records::{read_csv, write_csv};
