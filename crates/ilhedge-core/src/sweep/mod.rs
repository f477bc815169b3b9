pub mod grid;
pub mod series;

pub use grid::{evaluate_grid, SensitivityGrid};
pub use series::{
    evaluate_sweep, linspace, ReferenceMarker, SeriesPoint, SkippedPoint, SweepAxis, SweepRange,
    SweepSample, SweepSeries,
};
