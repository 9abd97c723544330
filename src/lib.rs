/*

=========================================================
 Lennard-Jones Molecular Dynamics (Rust)
=========================================================

Particle Model
--------------
The whole system lives in a single `State`:
- positions, velocities, accelerations: P x D matrices (D = 1, 2 or 3)
- potential energy at the current positions
- P x P matrix of squared pair distances
- the step counter
Reduced units throughout: sigma = epsilon = mass = 1.

Initialization
--------------
- Positions from a face-centred cubic lattice or an explicit list.
- Velocities zero, explicit, or drawn from a normal distribution.

Boundaries
----------
One condition per dimension:
    o - open
    r - reflective (mirror the position, flip the velocity)
    p - periodic   (xi <- xi mod L, minimum image for distances)

Lennard-Jones Potential
-----------------------
    V(r) = 4 [ r^-12 - r^-6 ]
- Each unordered pair within the cutoff is visited once; the force on j is
  minus the force on i.
- The summed energy is shifted once by -4 (rc^-12 + rc^-6).

Integrators
-----------
- Forward Euler
- Euler-Cromer (semi-implicit Euler)
- Velocity Verlet

Outputs
-------
Observer tasks receive the state after every step: xyz trajectory dumps,
energy / distance / position recorders with csv export.

=========================================================

*/
pub mod boundary;
pub mod config;
pub mod constants;
pub mod error;
pub mod initial;
pub mod integrator;
pub mod potential;
pub mod simulation;
pub mod state;
pub mod tasks;

pub use boundary::{Boundaries, BoundaryCondition, BoundaryKind};
pub use config::{RunFile, SimulationConfig};
pub use error::MdError;
pub use initial::{
    FaceCenteredCube, GaussianVelocities, InitialPositions, InitialVelocities, SetPositions,
    SetVelocities, ZeroVelocities,
};
pub use integrator::{EulerCromer, ForwardEuler, Integrator, IntegratorKind, VelocityVerlet};
pub use potential::{DistanceMatrix, ForceEvaluation, LennardJones, Potential};
pub use simulation::Simulation;
pub use state::State;
pub use tasks::{
    read_xyz_trajectory, DistanceRecorder, DumpPositions, EnergyRecorder, PositionRecorder, Task,
};
