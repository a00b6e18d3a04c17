use ndarray::Array1;
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};

use super::{Dataset, LabeledPoint};
use crate::{MlErr, Result};

/// Generates two gaussian blobs in the plane, labeled `+1` around `(center, center)` and
/// `-1` around `(-center, -center)`.
///
/// Both classes are interleaved so any contiguous split keeps them balanced.
///
/// # Arguments
/// * `points_per_class` - The amount of records of each label.
/// * `center` - The distance of the blob centers from the origin along each axis.
/// * `noise` - The standard deviation of every coordinate.
/// * `seed` - The seed of the random number generator.
///
/// # Returns
/// The dense dataset, or an error if `noise` isn't a valid standard deviation.
pub fn two_blobs(points_per_class: usize, center: f32, noise: f32, seed: u64) -> Result<Dataset> {
    if !noise.is_finite() || noise < 0. {
        return Err(MlErr::Precondition(
            "the noise must be a finite, non negative number",
        ));
    }

    let normal = Normal::new(0., noise)
        .map_err(|_| MlErr::Precondition("the noise must be a valid standard deviation"))?;
    let mut rng = StdRng::seed_from_u64(seed);

    let points = (0..points_per_class)
        .flat_map(|_| [1f32, -1.])
        .map(|label| {
            let x = Array1::from_shape_fn(2, |_| label * center + normal.sample(&mut rng));
            LabeledPoint::new(x, label)
        })
        .collect();

    Ok(Dataset {
        points,
        num_features: 2,
    })
}
