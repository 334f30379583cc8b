//! Terminal rendering of a range sweep.
//!
//! One cell per 4° bucket, coloured by the mean distance in that bucket.

use crate::telemetry::RangeSweep;

/// Degrees averaged into one rendered cell.
const BUCKET: usize = 4;

/// Proximity class of a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Proximity {
    /// ≤ 0.3 m
    Danger,
    /// ≤ 0.5 m
    Near,
    /// ≤ 1.0 m
    Close,
    Open,
}

impl Proximity {
    pub fn classify(distance: f32) -> Self {
        if distance <= 0.3 {
            Proximity::Danger
        } else if distance <= 0.5 {
            Proximity::Near
        } else if distance <= 1.0 {
            Proximity::Close
        } else {
            Proximity::Open
        }
    }

    /// ANSI-coloured cell
    pub fn cell(self) -> &'static str {
        match self {
            Proximity::Danger => "\x1b[91m█\x1b[0m",
            Proximity::Near => "\x1b[93m█\x1b[0m",
            Proximity::Close => "\x1b[92m█\x1b[0m",
            Proximity::Open => " ",
        }
    }
}

/// Bucket classes for a full sweep, or `None` if the sweep is not complete.
pub fn classify_sweep(sweep: &RangeSweep) -> Option<Vec<Proximity>> {
    if !sweep.is_full() {
        return None;
    }
    Some(
        sweep
            .samples()
            .chunks(BUCKET)
            .map(|bucket| Proximity::classify(bucket.iter().sum::<f32>() / BUCKET as f32))
            .collect(),
    )
}

/// Render a full sweep as a single line of coloured cells.
pub fn render_sweep(sweep: &RangeSweep) -> Option<String> {
    classify_sweep(sweep).map(|classes| classes.into_iter().map(Proximity::cell).collect())
}
