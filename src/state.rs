use crate::constants::MASS;
use crate::potential::ForceEvaluation;

use nalgebra::DMatrix;

/// Snapshot of the particle system at one timestep.
///
/// Matrices are P x D (one row per particle) except `squared_distances`,
/// which is P x P.
#[derive(Clone, Debug)]
pub struct State {
    pub positions: DMatrix<f64>,
    pub velocities: DMatrix<f64>,
    pub accelerations: DMatrix<f64>,
    pub potential_energy: f64,
    pub squared_distances: DMatrix<f64>,
    pub step: usize,
}

impl State {
    /// Step-0 state before the first force evaluation.
    pub fn new(positions: DMatrix<f64>, velocities: DMatrix<f64>) -> Self {
        let (particles, dimensions) = positions.shape();
        Self {
            positions,
            velocities,
            accelerations: DMatrix::zeros(particles, dimensions),
            potential_energy: 0.0,
            squared_distances: DMatrix::zeros(particles, particles),
            step: 0,
        }
    }

    /// Take over forces, energy and distances evaluated at the current positions.
    pub fn apply(&mut self, evaluation: ForceEvaluation) {
        self.accelerations = evaluation.forces / MASS;
        self.potential_energy = evaluation.potential_energy;
        self.squared_distances = evaluation.squared_distances;
    }

    pub fn particles(&self) -> usize {
        self.positions.nrows()
    }

    pub fn dimensions(&self) -> usize {
        self.positions.ncols()
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * MASS * self.velocities.norm_squared()
    }

    pub fn total_energy(&self) -> f64 {
        self.kinetic_energy() + self.potential_energy
    }

    pub fn temperature(&self) -> f64 {
        /*
        Equipartition in reduced units (k_B = 1):

            T = 2 KE / (P * D)
         */
        let dof = (self.particles() * self.dimensions()) as f64;
        if dof == 0.0 {
            return 0.0;
        }
        2.0 * self.kinetic_energy() / dof
    }

    pub fn distance(&self, i: usize, j: usize) -> f64 {
        self.squared_distances[(i, j)].sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energies_of_moving_pair() {
        let mut state = State::new(
            DMatrix::from_row_slice(2, 1, &[0.0, 1.5]),
            DMatrix::from_row_slice(2, 1, &[1.0, -2.0]),
        );
        state.potential_energy = -0.25;
        assert!((state.kinetic_energy() - 2.5).abs() < 1e-12);
        assert!((state.total_energy() - 2.25).abs() < 1e-12);
        assert!((state.temperature() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_apply_takes_over_evaluation() {
        let mut state = State::new(DMatrix::zeros(2, 2), DMatrix::zeros(2, 2));
        state.apply(ForceEvaluation {
            forces: DMatrix::from_row_slice(2, 2, &[1.0, 2.0, -1.0, -2.0]),
            potential_energy: -3.0,
            squared_distances: DMatrix::from_row_slice(2, 2, &[0.0, 4.0, 4.0, 0.0]),
        });
        assert_eq!(state.accelerations[(1, 1)], -2.0);
        assert_eq!(state.potential_energy, -3.0);
        assert_eq!(state.distance(0, 1), 2.0);
        assert_eq!(state.step, 0);
    }
}
