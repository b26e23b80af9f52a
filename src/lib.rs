//! Core library for the ridership-yield command line application.
//!
//! The library turns a two-sheet ridership workbook into per-route revenue
//! and yield aggregates. Each pipeline stage lives in its own module and is a
//! plain function over in-memory records: [`schema`] maps positional columns,
//! [`coerce`] filters and types rows, [`join`] attaches operational data,
//! [`metrics`] derives revenue and yield, and [`aggregate`] groups the result.
//! File formats are confined to [`io`], orchestration to [`pipeline`], and
//! the HTTP surface to [`server`].

pub mod aggregate;
pub mod coerce;
pub mod error;
pub mod io;
pub mod join;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod schema;
pub mod server;

pub use error::{PipelineError, Result};
