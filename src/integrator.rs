/*
Time integrators.

All schemes start from a(t), which the state already carries from the
previous force evaluation, and finish by evaluating the potential at the
boundary-corrected r(t+1) so the state leaves every step with forces,
energy and distances that belong to its own positions.

    forward euler:   v(t+1) = v(t) + a(t) dt
                     r(t+1) = r(t) + v(t) dt

    euler-cromer:    v(t+1) = v(t) + a(t) dt
                     r(t+1) = r(t) + v(t+1) dt

    velocity verlet: r(t+1) = r(t) + v(t) dt + 1/2 a(t) dt^2
                     v(t+1) = v(t) + 1/2 (a(t) + a(t+1)) dt

No scheme checks for blow-up; a timestep that is too large simply runs
into non-finite numbers.
 */
use crate::boundary::Boundaries;
use crate::constants::MASS;
use crate::potential::Potential;
use crate::state::State;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

pub trait Integrator {
    /// Advance `state` by one timestep `dt`.
    fn advance(&self, state: &mut State, potential: &dyn Potential, boundaries: &Boundaries, dt: f64);

    fn name(&self) -> &str;
}

/// Enforce the boundaries on the proposed positions, re-evaluate forces there
/// and make the result the new state.
fn commit(
    state: &mut State,
    mut positions: DMatrix<f64>,
    mut velocities: DMatrix<f64>,
    potential: &dyn Potential,
    boundaries: &Boundaries,
) {
    boundaries.correct_positions(&mut positions, &mut velocities);
    let evaluation = potential.evaluate(&positions, boundaries);
    state.positions = positions;
    state.velocities = velocities;
    state.apply(evaluation);
    state.step += 1;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ForwardEuler;

impl Integrator for ForwardEuler {
    fn advance(&self, state: &mut State, potential: &dyn Potential, boundaries: &Boundaries, dt: f64) {
        let velocities = &state.velocities + &state.accelerations * dt;
        let positions = &state.positions + &state.velocities * dt;
        commit(state, positions, velocities, potential, boundaries);
    }

    fn name(&self) -> &str {
        "Forward-Euler"
    }
}

/// Semi-implicit Euler: the position update uses the already updated velocity.
#[derive(Clone, Copy, Debug, Default)]
pub struct EulerCromer;

impl Integrator for EulerCromer {
    fn advance(&self, state: &mut State, potential: &dyn Potential, boundaries: &Boundaries, dt: f64) {
        let velocities = &state.velocities + &state.accelerations * dt;
        let positions = &state.positions + &velocities * dt;
        commit(state, positions, velocities, potential, boundaries);
    }

    fn name(&self) -> &str {
        "Euler-Cromer"
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct VelocityVerlet;

impl Integrator for VelocityVerlet {
    fn advance(&self, state: &mut State, potential: &dyn Potential, boundaries: &Boundaries, dt: f64) {
        let mut positions =
            &state.positions + &state.velocities * dt + &state.accelerations * (0.5 * dt * dt);
        let mut velocities = state.velocities.clone();
        boundaries.correct_positions(&mut positions, &mut velocities);

        // a(t+1) from the corrected positions
        let evaluation = potential.evaluate(&positions, boundaries);
        let new_accelerations = &evaluation.forces / MASS;
        velocities += (&state.accelerations + &new_accelerations) * (0.5 * dt);

        state.positions = positions;
        state.velocities = velocities;
        state.apply(evaluation);
        state.step += 1;
    }

    fn name(&self) -> &str {
        "Velocity-Verlet"
    }
}

/// Integrator choice as it appears in a run file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegratorKind {
    ForwardEuler,
    EulerCromer,
    VelocityVerlet,
}

impl IntegratorKind {
    pub fn build(&self) -> Box<dyn Integrator> {
        match self {
            IntegratorKind::ForwardEuler => Box::new(ForwardEuler),
            IntegratorKind::EulerCromer => Box::new(EulerCromer),
            IntegratorKind::VelocityVerlet => Box::new(VelocityVerlet),
        }
    }
}
