/*
Pairwise potentials.

A potential takes a snapshot of the positions together with the boundary
conditions and hands back the net force on every particle, the total
potential energy and the full matrix of squared pair distances.

The distance bookkeeping is shared: every ordered pair gets its displacement
r_i - r_j (boundary corrected), but forces and energies only visit the
unique pairs i < j inside the cutoff, with Newton's third law supplying the
force on j.
 */
use crate::boundary::Boundaries;
use crate::constants::DEFAULT_CUTOFF;
use crate::error::MdError;

use itertools::Itertools;
use nalgebra::{DMatrix, RowDVector};

/// Output of a single force evaluation.
#[derive(Clone, Debug)]
pub struct ForceEvaluation {
    pub forces: DMatrix<f64>,
    pub potential_energy: f64,
    pub squared_distances: DMatrix<f64>,
}

pub trait Potential {
    fn evaluate(&self, positions: &DMatrix<f64>, boundaries: &Boundaries) -> ForceEvaluation;

    fn name(&self) -> &str;
}

/// Boundary-corrected displacements and squared distances for all ordered pairs.
#[derive(Clone, Debug)]
pub struct DistanceMatrix {
    particles: usize,
    // row i * particles + j holds r_i - r_j
    displacements: DMatrix<f64>,
    squared: DMatrix<f64>,
}

impl DistanceMatrix {
    pub fn compute(positions: &DMatrix<f64>, boundaries: &Boundaries) -> Self {
        let (particles, dimensions) = positions.shape();

        let mut displacements = DMatrix::zeros(particles * particles, dimensions);
        for i in 0..particles {
            for j in 0..particles {
                for k in 0..dimensions {
                    displacements[(i * particles + j, k)] = positions[(i, k)] - positions[(j, k)];
                }
            }
        }
        boundaries.correct_displacements(&mut displacements);

        let squared = DMatrix::from_fn(particles, particles, |i, j| {
            displacements.row(i * particles + j).norm_squared()
        });

        Self {
            particles,
            displacements,
            squared,
        }
    }

    pub fn particles(&self) -> usize {
        self.particles
    }

    pub fn displacement(&self, i: usize, j: usize) -> RowDVector<f64> {
        self.displacements.row(i * self.particles + j).into_owned()
    }

    pub fn squared(&self, i: usize, j: usize) -> f64 {
        self.squared[(i, j)]
    }

    /// Unique pairs `i < j` closer than `cutoff`.
    pub fn pairs_within(&self, cutoff: f64) -> impl Iterator<Item = (usize, usize)> + '_ {
        let cutoff_sq = cutoff * cutoff;
        (0..self.particles)
            .tuple_combinations::<(usize, usize)>()
            .filter(move |&(i, j)| self.squared[(i, j)] < cutoff_sq)
    }

    pub fn into_squared(self) -> DMatrix<f64> {
        self.squared
    }
}

/// Lennard-Jones 12-6 potential in reduced units, V(r) = 4 (r^-12 - r^-6).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LennardJones {
    cutoff: f64,
}

impl LennardJones {
    pub fn new(cutoff: f64) -> Result<Self, MdError> {
        if !(cutoff > 0.0) || !cutoff.is_finite() {
            return Err(MdError::InvalidCutoff(cutoff));
        }
        Ok(Self { cutoff })
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// (2 r^-12 - r^-6) / r^2; the pair force on i is 24 times this along r_i - r_j.
    pub fn pair_force_factor(squared_distance: f64) -> f64 {
        let inv_r6 = squared_distance.powi(-3);
        let inv_r12 = inv_r6 * inv_r6;
        let factor = (2.0 * inv_r12 - inv_r6) / squared_distance;
        if factor.is_finite() {
            factor
        } else {
            0.0 // coincident or underflowed pair
        }
    }

    pub fn pair_energy(squared_distance: f64) -> f64 {
        let inv_r6 = squared_distance.powi(-3);
        let energy = 4.0 * (inv_r6 * inv_r6 - inv_r6);
        if energy.is_finite() {
            energy
        } else {
            0.0
        }
    }

    /// Single global shift added to the summed pair energies.
    ///
    /// This is -4 (rc^-12 + rc^-6) once for the whole system, not a per-pair
    /// shift of the potential, so it does not make V(rc) vanish pair by pair.
    pub fn energy_shift(&self) -> f64 {
        -4.0 * (self.cutoff.powi(-12) + self.cutoff.powi(-6))
    }
}

impl Default for LennardJones {
    fn default() -> Self {
        Self {
            cutoff: DEFAULT_CUTOFF,
        }
    }
}

impl Potential for LennardJones {
    fn evaluate(&self, positions: &DMatrix<f64>, boundaries: &Boundaries) -> ForceEvaluation {
        let distances = DistanceMatrix::compute(positions, boundaries);
        let mut forces = DMatrix::zeros(positions.nrows(), positions.ncols());
        let mut pair_energy_sum = 0.0;

        for (i, j) in distances.pairs_within(self.cutoff) {
            let r2 = distances.squared(i, j);
            let pair_force = distances.displacement(i, j) * (24.0 * Self::pair_force_factor(r2));
            for (k, f) in pair_force.iter().enumerate() {
                forces[(i, k)] += f;
                forces[(j, k)] -= f;
            }
            pair_energy_sum += Self::pair_energy(r2);
        }

        log::trace!("lennard-jones: pair energy sum {pair_energy_sum:.8}");

        ForceEvaluation {
            forces,
            potential_energy: pair_energy_sum + self.energy_shift(),
            squared_distances: distances.into_squared(),
        }
    }

    fn name(&self) -> &str {
        "Lennard-Jones potential"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::Boundaries;

    fn cluster() -> DMatrix<f64> {
        DMatrix::from_row_slice(
            5,
            3,
            &[
                0.0, 0.0, 0.0, //
                1.1, 0.2, -0.1, //
                0.3, 1.2, 0.4, //
                -0.8, 0.5, 1.0, //
                2.4, 1.9, 0.7,
            ],
        )
    }

    #[test]
    fn test_net_force_vanishes_for_open_system() {
        let lj = LennardJones::default();
        let eval = lj.evaluate(&cluster(), &Boundaries::open(3).unwrap());
        for k in 0..3 {
            let total: f64 = eval.forces.column(k).sum();
            assert!(total.abs() < 1e-9, "net force along {k} is {total}");
        }
    }

    #[test]
    fn test_pair_forces_are_antisymmetric() {
        let lj = LennardJones::default();
        let positions = DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 1.0, 0.5]);
        let eval = lj.evaluate(&positions, &Boundaries::open(2).unwrap());
        for k in 0..2 {
            assert_eq!(eval.forces[(0, k)], -eval.forces[(1, k)]);
        }
        // r^2 = 1.25 is inside the repulsive core, so particle 0 is pushed away from 1
        assert!(eval.forces[(0, 0)] < 0.0 && eval.forces[(0, 1)] < 0.0);
    }

    #[test]
    fn test_distance_matrix_is_symmetric_with_zero_diagonal() {
        let positions = cluster();
        let boundaries = Boundaries::from_spec("ppp", 3.0).unwrap();
        let eval = LennardJones::default().evaluate(&positions, &boundaries);
        let d = &eval.squared_distances;
        for i in 0..5 {
            assert_eq!(d[(i, i)], 0.0);
            for j in 0..5 {
                assert_eq!(d[(i, j)], d[(j, i)]);
                assert!(d[(i, j)] >= 0.0);
            }
        }
    }

    #[test]
    fn test_pairs_beyond_cutoff_contribute_nothing() {
        let lj = LennardJones::default();
        let boundaries = Boundaries::open(1).unwrap();
        for separation in [3.0, 3.5, 10.0] {
            let positions = DMatrix::from_row_slice(2, 1, &[0.0, separation]);
            let eval = lj.evaluate(&positions, &boundaries);
            assert_eq!(eval.forces, DMatrix::zeros(2, 1));
            assert_eq!(eval.potential_energy, lj.energy_shift());
            // the distance is still reported
            assert!((eval.squared_distances[(0, 1)] - separation * separation).abs() < 1e-12);
        }
    }

    #[test]
    fn test_force_vanishes_at_potential_minimum() {
        let r_min = 2f64.powf(1.0 / 6.0);
        let positions = DMatrix::from_row_slice(2, 1, &[0.0, r_min]);
        let eval = LennardJones::default().evaluate(&positions, &Boundaries::open(1).unwrap());
        assert!(eval.forces[(0, 0)].abs() < 1e-12);
        assert!((LennardJones::pair_energy(r_min * r_min) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_two_particle_energy_matches_reference_formula() {
        let lj = LennardJones::new(3.0).unwrap();
        let positions = DMatrix::from_row_slice(2, 1, &[0.0, 1.5]);
        let eval = lj.evaluate(&positions, &Boundaries::open(1).unwrap());
        let r: f64 = 1.5;
        let expected = 4.0 * (r.powi(-12) - r.powi(-6) - 3f64.powi(-12) - 3f64.powi(-6));
        assert!((eval.potential_energy - expected).abs() < 1e-12);
        // attractive at 1.5 > 2^(1/6): particle 0 is pulled towards +x
        let expected_force = 24.0 * (2.0 * r.powi(-12) - r.powi(-6)) / (r * r) * -r;
        assert!((eval.forces[(0, 0)] - expected_force).abs() < 1e-12);
        assert!(eval.forces[(0, 0)] > 0.0);
    }

    #[test]
    fn test_coincident_particles_are_clamped_to_zero() {
        let positions = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0]);
        let lj = LennardJones::default();
        let eval = lj.evaluate(&positions, &Boundaries::open(2).unwrap());
        assert_eq!(eval.forces, DMatrix::zeros(2, 2));
        assert_eq!(eval.potential_energy, lj.energy_shift());
    }

    #[test]
    fn test_periodic_images_interact_across_the_wall() {
        let positions = DMatrix::from_row_slice(2, 1, &[0.5, 9.5]);
        let lj = LennardJones::default();

        let open = lj.evaluate(&positions, &Boundaries::from_spec("o", 10.0).unwrap());
        assert_eq!(open.forces[(0, 0)], 0.0);

        let periodic = lj.evaluate(&positions, &Boundaries::from_spec("p", 10.0).unwrap());
        // nearest image sits at distance 1, where the pair force is 24
        assert!((periodic.forces[(0, 0)] - 24.0).abs() < 1e-9);
        assert!((periodic.forces[(1, 0)] + 24.0).abs() < 1e-9);
        assert!((periodic.squared_distances[(0, 1)] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_non_positive_cutoff() {
        assert!(matches!(LennardJones::new(0.0), Err(MdError::InvalidCutoff(_))));
        assert!(matches!(LennardJones::new(f64::NAN), Err(MdError::InvalidCutoff(_))));
    }
}
