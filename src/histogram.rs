//! Fixed-width binning of metric samples.

use crate::error::{ReportError, Result};
use serde::Serialize;
use std::ops::Range;

/// Equal-width bins spanning the observed range of the samples
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub lower: f64,
    pub upper: f64,
    pub counts: Vec<u32>,
}

impl Histogram {
    /// Bin `samples` into `bins` equal intervals over [min, max].
    ///
    /// When every sample has the same value the range is widened by 0.5 on
    /// both sides (more for magnitudes where 0.5 is below the float spacing)
    /// so the bins keep a non-zero width. The maximum sample is counted in the
    /// last bin. Returns `None` for an empty sample set.
    pub fn from_samples(samples: &[f64], bins: usize) -> Result<Option<Self>> {
        if bins == 0 {
            return Err(ReportError::InvalidBins);
        }
        let Some(&first) = samples.first() else {
            return Ok(None);
        };

        let (min, max) = samples
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let (lower, upper) = if min == max {
            let pad = 0.5f64.max(min.abs() * f64::EPSILON * bins as f64);
            (min - pad, max + pad)
        } else {
            (min, max)
        };

        // Halved so that spans wider than f64::MAX stay finite
        let half_span = upper / 2.0 - lower / 2.0;
        let mut counts = vec![0u32; bins];
        for &value in samples {
            let fraction = (value / 2.0 - lower / 2.0) / half_span;
            let index = ((fraction * bins as f64) as usize).min(bins - 1);
            counts[index] += 1;
        }

        Ok(Some(Self {
            lower,
            upper,
            counts,
        }))
    }

    pub fn bin_count(&self) -> usize {
        self.counts.len()
    }

    pub fn bin_width(&self) -> f64 {
        (self.upper / 2.0 - self.lower / 2.0) / self.counts.len() as f64 * 2.0
    }

    /// Edges and count of each bin, lowest first
    pub fn bins(&self) -> impl Iterator<Item = (Range<f64>, u32)> + '_ {
        let width = self.bin_width();
        self.counts.iter().enumerate().map(move |(i, &count)| {
            let start = self.lower + width * i as f64;
            let end = if i + 1 == self.counts.len() {
                self.upper
            } else {
                start + width
            };
            (start..end, count)
        })
    }

    pub fn max_count(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| u64::from(c)).sum()
    }
}
