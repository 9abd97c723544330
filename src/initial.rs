/*
Initial conditions.

Positions fix the shape of the whole run: the number of rows is the number
of particles P and the number of columns the dimensionality D. Velocity
sources are then asked for a matching P x D matrix.
 */
use crate::constants::MAX_DIMENSIONS;
use crate::error::MdError;

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

pub trait InitialPositions {
    fn positions(&self) -> Result<DMatrix<f64>, MdError>;
}

pub trait InitialVelocities {
    fn velocities(&self, particles: usize, dimensions: usize) -> Result<DMatrix<f64>, MdError>;
}

fn check_dimensions(dimensions: usize) -> Result<(), MdError> {
    if (1..=MAX_DIMENSIONS).contains(&dimensions) {
        Ok(())
    } else {
        Err(MdError::UnsupportedDimension(dimensions))
    }
}

/// Turn nested rows into a P x D matrix, rejecting ragged input.
fn rows_to_matrix(rows: &[Vec<f64>]) -> Result<DMatrix<f64>, MdError> {
    let first = rows.first().ok_or(MdError::EmptyPositions)?;
    let dimensions = first.len();
    for (row, coordinates) in rows.iter().enumerate() {
        if coordinates.len() != dimensions {
            return Err(MdError::MalformedPositions {
                row,
                expected: dimensions,
                found: coordinates.len(),
            });
        }
    }
    Ok(DMatrix::from_fn(rows.len(), dimensions, |i, k| rows[i][k]))
}

/// Explicit list of positions, one inner vector per particle.
#[derive(Clone, Debug)]
pub struct SetPositions {
    rows: Vec<Vec<f64>>,
}

impl SetPositions {
    pub fn new(rows: Vec<Vec<f64>>) -> Self {
        Self { rows }
    }
}

impl InitialPositions for SetPositions {
    fn positions(&self) -> Result<DMatrix<f64>, MdError> {
        let positions = rows_to_matrix(&self.rows)?;
        check_dimensions(positions.ncols())?;
        Ok(positions)
    }
}

/// Face-centred cubic lattice of `cells` unit cells per side spanning `length`.
///
/// A unit cell holds `dimensions + 1` particles, so the lattice has
/// `(dimensions + 1) * cells^dimensions` of them.
#[derive(Clone, Debug)]
pub struct FaceCenteredCube {
    pub cells: usize,
    pub length: f64,
    pub dimensions: usize,
}

impl FaceCenteredCube {
    pub fn new(cells: usize, length: f64, dimensions: usize) -> Self {
        Self {
            cells,
            length,
            dimensions,
        }
    }

    fn basis(&self) -> Vec<Vec<f64>> {
        match self.dimensions {
            1 => vec![vec![0.0], vec![0.5]],
            2 => vec![vec![0.0, 0.0], vec![0.0, 0.5], vec![0.5, 0.0]],
            _ => vec![
                vec![0.0, 0.0, 0.0],
                vec![0.0, 0.5, 0.5],
                vec![0.5, 0.0, 0.5],
                vec![0.5, 0.5, 0.0],
            ],
        }
    }
}

impl Default for FaceCenteredCube {
    fn default() -> Self {
        Self::new(1, 3.0, 3)
    }
}

impl InitialPositions for FaceCenteredCube {
    fn positions(&self) -> Result<DMatrix<f64>, MdError> {
        check_dimensions(self.dimensions)?;
        if self.cells == 0 {
            return Err(MdError::EmptyPositions);
        }

        let basis = self.basis();
        let cell_count = self.cells.pow(self.dimensions as u32);
        let scale = self.length / self.cells as f64;

        let mut rows = Vec::with_capacity(cell_count * basis.len());
        for cell in 0..cell_count {
            // unpack the flat cell index into lattice coordinates, last axis fastest
            let mut origin = vec![0.0; self.dimensions];
            let mut rest = cell;
            for k in (0..self.dimensions).rev() {
                origin[k] = (rest % self.cells) as f64;
                rest /= self.cells;
            }
            for site in &basis {
                rows.push(
                    origin
                        .iter()
                        .zip(site.iter())
                        .map(|(o, s)| (o + s) * scale)
                        .collect::<Vec<f64>>(),
                );
            }
        }
        rows_to_matrix(&rows)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ZeroVelocities;

impl InitialVelocities for ZeroVelocities {
    fn velocities(&self, particles: usize, dimensions: usize) -> Result<DMatrix<f64>, MdError> {
        Ok(DMatrix::zeros(particles, dimensions))
    }
}

#[derive(Clone, Debug)]
pub struct SetVelocities {
    rows: Vec<Vec<f64>>,
}

impl SetVelocities {
    pub fn new(rows: Vec<Vec<f64>>) -> Self {
        Self { rows }
    }
}

impl InitialVelocities for SetVelocities {
    fn velocities(&self, particles: usize, dimensions: usize) -> Result<DMatrix<f64>, MdError> {
        let found = (
            self.rows.len(),
            self.rows.first().map(|row| row.len()).unwrap_or(0),
        );
        let velocities = rows_to_matrix(&self.rows).map_err(|_| MdError::MalformedVelocities {
            expected: (particles, dimensions),
            found,
        })?;
        if velocities.shape() != (particles, dimensions) {
            return Err(MdError::MalformedVelocities {
                expected: (particles, dimensions),
                found: velocities.shape(),
            });
        }
        Ok(velocities)
    }
}

/// Every velocity component drawn from N(0, std_dev^2).
#[derive(Clone, Debug)]
pub struct GaussianVelocities {
    pub std_dev: f64,
    pub seed: Option<u64>,
}

impl GaussianVelocities {
    pub fn new(std_dev: f64) -> Self {
        Self {
            std_dev,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Default for GaussianVelocities {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl InitialVelocities for GaussianVelocities {
    fn velocities(&self, particles: usize, dimensions: usize) -> Result<DMatrix<f64>, MdError> {
        // Normal::new only rejects a non-finite std_dev
        if !(self.std_dev >= 0.0) {
            return Err(MdError::InvalidVelocityScale(self.std_dev));
        }
        let normal = Normal::new(0.0, self.std_dev)
            .map_err(|_| MdError::InvalidVelocityScale(self.std_dev))?;
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        Ok(DMatrix::from_fn(particles, dimensions, |_, _| {
            normal.sample(&mut rng)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fcc_particle_counts() {
        for (dimensions, expected) in [(1, 2 * 3), (2, 3 * 9), (3, 4 * 27)] {
            let lattice = FaceCenteredCube::new(3, 6.0, dimensions).positions().unwrap();
            assert_eq!(lattice.shape(), (expected, dimensions));
        }
    }

    #[test]
    fn test_fcc_sites_are_scaled_to_box() {
        let lattice = FaceCenteredCube::new(2, 4.0, 2).positions().unwrap();
        // first cell at the origin, unit cell length 2
        assert_eq!(lattice.row(0).iter().copied().collect::<Vec<_>>(), vec![0.0, 0.0]);
        assert_eq!(lattice.row(1).iter().copied().collect::<Vec<_>>(), vec![0.0, 1.0]);
        assert_eq!(lattice.row(2).iter().copied().collect::<Vec<_>>(), vec![1.0, 0.0]);
        // second cell is one step along the last axis
        assert_eq!(lattice.row(3).iter().copied().collect::<Vec<_>>(), vec![0.0, 2.0]);
        assert!(lattice.iter().all(|&x| (0.0..4.0).contains(&x)));
    }

    #[test]
    fn test_fcc_rejects_four_dimensions() {
        assert!(matches!(
            FaceCenteredCube::new(1, 1.0, 4).positions(),
            Err(MdError::UnsupportedDimension(4))
        ));
    }

    #[test]
    fn test_set_positions_rejects_ragged_rows() {
        let source = SetPositions::new(vec![vec![0.0, 1.0], vec![2.0]]);
        assert!(matches!(
            source.positions(),
            Err(MdError::MalformedPositions {
                row: 1,
                expected: 2,
                found: 1
            })
        ));
        assert!(matches!(
            SetPositions::new(vec![]).positions(),
            Err(MdError::EmptyPositions)
        ));
        assert!(matches!(
            SetPositions::new(vec![vec![0.0; 4]]).positions(),
            Err(MdError::UnsupportedDimension(4))
        ));
    }

    #[test]
    fn test_set_velocities_must_match_shape() {
        let source = SetVelocities::new(vec![vec![1.0, 1.0]]);
        assert_eq!(source.velocities(1, 2).unwrap()[(0, 1)], 1.0);
        assert!(matches!(
            source.velocities(2, 2),
            Err(MdError::MalformedVelocities { .. })
        ));
    }

    #[test]
    fn test_seeded_gaussian_velocities_are_reproducible() {
        let source = GaussianVelocities::new(2.0).with_seed(42);
        let a = source.velocities(50, 3).unwrap();
        let b = source.velocities(50, 3).unwrap();
        assert_eq!(a, b);
        assert!(a.iter().all(|v| v.is_finite()));
        assert!(a.iter().any(|&v| v != 0.0));
    }

    #[test]
    fn test_gaussian_velocities_reject_negative_scale() {
        for std_dev in [-1.0, -1e-12, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                GaussianVelocities::new(std_dev).with_seed(1).velocities(1, 1),
                Err(MdError::InvalidVelocityScale(_))
            ));
        }
        // a zero scale is a valid (if degenerate) distribution
        let still = GaussianVelocities::new(0.0).with_seed(1).velocities(2, 2).unwrap();
        assert_eq!(still, DMatrix::zeros(2, 2));
    }
}
