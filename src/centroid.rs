//! Centers of mass of spatial footprints.
//!
//! Each unit's footprint is a `height × width` weight image stored row-major.
//! Its centroid marks the unit when footprints are reviewed: the
//! intensity-weighted mean pixel position, taken relative to the image size
//! and scaled onto the coordinate extent of the field of view.
//!
//! # Example
//!
//! ```
//! use calcitrace::{centroids, Extent, UnitFootprint};
//!
//! // 2×2 image, all weight in the bottom-right pixel
//! let unit = UnitFootprint {
//!     unit_id: 3,
//!     weights: vec![0.0, 0.0, 0.0, 1.0],
//! };
//! let cents = centroids(&[unit], 2, 2, Extent { height: 100.0, width: 200.0 }).unwrap();
//!
//! assert_eq!(cents[0].unit_id, 3);
//! assert_eq!(cents[0].height, 50.0);
//! assert_eq!(cents[0].width, 100.0);
//! ```

use alloc::vec::Vec;

use crate::error::DeconvError;

/// Spatial footprint of one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitFootprint {
    /// Unit identifier
    pub unit_id: u32,
    /// Row-major `height × width` weights
    pub weights: Vec<f64>,
}

/// Largest coordinate along each image axis.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Extent {
    /// Coordinate of the last row
    pub height: f64,
    /// Coordinate of the last column
    pub width: f64,
}

impl Extent {
    /// Extent of plain pixel-index coordinates: `(height - 1, width - 1)`.
    pub fn pixels(height: usize, width: usize) -> Self {
        Self {
            height: height.saturating_sub(1) as f64,
            width: width.saturating_sub(1) as f64,
        }
    }
}

/// Scaled centroid of one unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Centroid {
    /// Unit identifier
    pub unit_id: u32,
    /// Position along the height axis
    pub height: f64,
    /// Position along the width axis
    pub width: f64,
}

/// Intensity-weighted mean `(row, column)` of a footprint, in pixel indices.
///
/// Returns `Ok(None)` if the total weight is zero or not finite, which
/// leaves the center undefined.
///
/// # Errors
///
/// Returns `DeconvError::FootprintShape` if `weights.len() != height * width`.
pub fn center_of_mass(
    weights: &[f64],
    height: usize,
    width: usize,
) -> Result<Option<(f64, f64)>, DeconvError> {
    if height.checked_mul(width) != Some(weights.len()) {
        return Err(DeconvError::FootprintShape {
            height,
            width,
            got: weights.len(),
        });
    }

    let mut total = 0.0;
    let mut row_moment = 0.0;
    let mut col_moment = 0.0;
    for (i, row) in weights.chunks(width.max(1)).enumerate() {
        for (j, &w) in row.iter().enumerate() {
            total += w;
            row_moment += w * i as f64;
            col_moment += w * j as f64;
        }
    }

    if total == 0.0 || !total.is_finite() {
        return Ok(None);
    }
    Ok(Some((row_moment / total, col_moment / total)))
}

/// Centroid of one footprint, relative to the image size and scaled by `extent`.
///
/// # Errors
///
/// Same shape check as [`center_of_mass`].
pub fn centroid(
    footprint: &UnitFootprint,
    height: usize,
    width: usize,
    extent: Extent,
) -> Result<Option<Centroid>, DeconvError> {
    let com = center_of_mass(&footprint.weights, height, width)?;
    Ok(com.map(|(row, col)| Centroid {
        unit_id: footprint.unit_id,
        height: row / height as f64 * extent.height,
        width: col / width as f64 * extent.width,
    }))
}

/// Centroids of every footprint with a defined center.
///
/// Footprints with no weight are skipped and logged.
pub fn centroids(
    footprints: &[UnitFootprint],
    height: usize,
    width: usize,
    extent: Extent,
) -> Result<Vec<Centroid>, DeconvError> {
    let mut out = Vec::with_capacity(footprints.len());
    for footprint in footprints {
        match centroid(footprint, height, width, extent)? {
            Some(c) => out.push(c),
            None => log::warn!("unit {}: empty footprint has no centroid", footprint.unit_id),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn single_pixel(height: usize, width: usize, row: usize, col: usize) -> Vec<f64> {
        let mut weights = vec![0.0; height * width];
        weights[row * width + col] = 2.5;
        weights
    }

    #[test]
    fn test_single_pixel_center() {
        let weights = single_pixel(4, 5, 2, 3);
        assert_eq!(center_of_mass(&weights, 4, 5), Ok(Some((2.0, 3.0))));
    }

    #[test]
    fn test_single_pixel_centroid_scaled() {
        let unit = UnitFootprint {
            unit_id: 8,
            weights: single_pixel(4, 5, 2, 3),
        };
        let c = centroid(&unit, 4, 5, Extent::pixels(4, 5)).unwrap().unwrap();

        // 2/4 of 3 rows, 3/5 of 4 columns
        assert_eq!(c.unit_id, 8);
        assert!(libm::fabs(c.height - 1.5) < 1e-12);
        assert!(libm::fabs(c.width - 2.4) < 1e-12);
    }

    #[test]
    fn test_all_zero_footprint() {
        assert_eq!(center_of_mass(&[0.0; 6], 2, 3), Ok(None));

        let unit = UnitFootprint {
            unit_id: 1,
            weights: vec![0.0; 6],
        };
        assert_eq!(centroid(&unit, 2, 3, Extent::pixels(2, 3)), Ok(None));
    }

    #[test]
    fn test_non_finite_weight_has_no_center() {
        assert_eq!(center_of_mass(&[1.0, f64::NAN], 1, 2), Ok(None));
    }

    #[test]
    fn test_weighted_mean() {
        // Row 0 weight 1, row 1 weight 3: mean row 0.75
        let weights = [1.0, 0.0, 0.0, 3.0];
        let (row, col) = center_of_mass(&weights, 2, 2).unwrap().unwrap();
        assert!(libm::fabs(row - 0.75) < 1e-12);
        assert!(libm::fabs(col - 0.75) < 1e-12);
    }

    #[test]
    fn test_shape_mismatch() {
        assert_eq!(
            center_of_mass(&[1.0; 5], 2, 3),
            Err(DeconvError::FootprintShape {
                height: 2,
                width: 3,
                got: 5
            })
        );
    }

    #[test]
    fn test_empty_grid() {
        assert_eq!(center_of_mass(&[], 0, 4), Ok(None));
    }

    #[test]
    fn test_centroids_skips_empty_units() {
        let units = [
            UnitFootprint {
                unit_id: 1,
                weights: single_pixel(3, 3, 0, 0),
            },
            UnitFootprint {
                unit_id: 2,
                weights: vec![0.0; 9],
            },
            UnitFootprint {
                unit_id: 3,
                weights: single_pixel(3, 3, 1, 2),
            },
        ];
        let cents = centroids(&units, 3, 3, Extent::pixels(3, 3)).unwrap();

        let ids: Vec<u32> = cents.iter().map(|c| c.unit_id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(cents[0].height, 0.0);
    }
}
