/*
The integration loop.

    [Initialize system]
    [Compute forces and energy]           -> step 0, handed to every task

        for t in 0..N                      N = floor(T / dt)
            integrate                      -> step t + 1
            hand the state to every task

    [Finalize every task]

The loop owns the state and is the only thing that mutates it; tasks only
ever see a shared reference.
 */
use crate::config::SimulationConfig;
use crate::constants::MAX_DIMENSIONS;
use crate::error::MdError;
use crate::initial::{InitialPositions, InitialVelocities};
use crate::integrator::Integrator;
use crate::potential::{LennardJones, Potential};
use crate::state::State;
use crate::tasks::Task;

use kdam::tqdm;

pub struct Simulation {
    config: SimulationConfig,
    state: State,
}

impl Simulation {
    /// Validate the configuration and build the step-0 state.
    pub fn new(
        config: SimulationConfig,
        positions: &dyn InitialPositions,
        velocities: &dyn InitialVelocities,
    ) -> Result<Self, MdError> {
        config.validate()?;

        let mut positions = positions.positions()?;
        let (particles, dimensions) = positions.shape();
        if particles == 0 {
            return Err(MdError::EmptyPositions);
        }
        if dimensions == 0 || dimensions > MAX_DIMENSIONS {
            return Err(MdError::UnsupportedDimension(dimensions));
        }
        if config.boundaries.dimensions() != dimensions {
            return Err(MdError::BoundaryDimensionMismatch {
                boundaries: config.boundaries.dimensions(),
                dimensions,
            });
        }

        let mut velocities = velocities.velocities(particles, dimensions)?;
        if velocities.shape() != (particles, dimensions) {
            return Err(MdError::MalformedVelocities {
                expected: (particles, dimensions),
                found: velocities.shape(),
            });
        }

        /*
        Minimum image only shifts by one box length, so periodic coordinates
        have to start inside the box. Reflective ones get the same single
        bounce as during a step.
         */
        let unwrapped = positions.clone();
        config
            .boundaries
            .correct_positions(&mut positions, &mut velocities);
        if positions != unwrapped {
            log::warn!("initial positions outside the box were moved back inside");
        }

        log::info!("Number of particles:  {particles}");
        log::info!("Number of dimensions: {dimensions}");
        log::info!("Boundary conditions:  {}", config.boundaries);
        log::info!("Total time:           {}", config.total_time);
        log::info!("Timestep:             {}", config.dt);

        Ok(Self {
            config,
            state: State::new(positions, velocities),
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn steps(&self) -> usize {
        self.config.steps()
    }

    /// Lennard-Jones potential with the configured cutoff.
    pub fn lennard_jones(&self) -> Result<LennardJones, MdError> {
        LennardJones::new(self.config.cutoff)
    }

    /// Run with the Lennard-Jones potential at the configured cutoff.
    pub fn run_lennard_jones(
        self,
        integrator: &dyn Integrator,
        tasks: &mut [&mut dyn Task],
    ) -> Result<State, MdError> {
        let potential = self.lennard_jones()?;
        self.run(&potential, integrator, tasks)
    }

    /// Run all N steps and hand back the final state.
    ///
    /// The potential is used as given; `SimulationConfig::cutoff` only
    /// applies through [`Simulation::lennard_jones`] or
    /// [`Simulation::run_lennard_jones`].
    pub fn run(
        mut self,
        potential: &dyn Potential,
        integrator: &dyn Integrator,
        tasks: &mut [&mut dyn Task],
    ) -> Result<State, MdError> {
        log::info!("Potential:            {}", potential.name());
        log::info!("Integrator:           {}", integrator.name());
        for task in tasks.iter() {
            log::info!("Task:                 {}", task.name());
        }

        let evaluation = potential.evaluate(&self.state.positions, &self.config.boundaries);
        self.state.apply(evaluation);
        for task in tasks.iter_mut() {
            task.update(&self.state, 0)?;
        }

        let steps = self.config.steps();
        for _ in tqdm!(0..steps, desc = "integrating", disable = !self.config.progress) {
            integrator.advance(
                &mut self.state,
                potential,
                &self.config.boundaries,
                self.config.dt,
            );
            log::debug!(
                "step {:>6} | E_pot={:.8} E_kin={:.8}",
                self.state.step,
                self.state.potential_energy,
                self.state.kinetic_energy()
            );
            for task in tasks.iter_mut() {
                task.update(&self.state, self.state.step)?;
            }
        }

        for task in tasks.iter_mut() {
            task.finalize()?;
        }
        Ok(self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::Boundaries;
    use crate::initial::{SetPositions, SetVelocities, ZeroVelocities};
    use crate::integrator::EulerCromer;
    use nalgebra::DMatrix;

    #[derive(Default)]
    struct CountingTask {
        steps: Vec<usize>,
        finalized: usize,
    }

    impl Task for CountingTask {
        fn update(&mut self, state: &State, step: usize) -> Result<(), MdError> {
            assert_eq!(state.step, step);
            self.steps.push(step);
            Ok(())
        }

        fn finalize(&mut self) -> Result<(), MdError> {
            self.finalized += 1;
            Ok(())
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn two_particles(total_time: f64, dt: f64) -> Simulation {
        let config = SimulationConfig::new(total_time, dt, Boundaries::open(1).unwrap());
        let positions = SetPositions::new(vec![vec![0.0], vec![1.5]]);
        Simulation::new(config, &positions, &ZeroVelocities).unwrap()
    }

    #[test]
    fn test_tasks_see_every_step_then_finalize() {
        let simulation = two_particles(0.1, 0.01);
        assert_eq!(simulation.steps(), 10);
        let lj = simulation.lennard_jones().unwrap();

        let mut counter = CountingTask::default();
        let mut tasks: [&mut dyn Task; 1] = [&mut counter];
        let state = simulation.run(&lj, &EulerCromer, &mut tasks).unwrap();

        assert_eq!(counter.steps, (0..=10).collect::<Vec<_>>());
        assert_eq!(counter.finalized, 1);
        assert_eq!(state.step, 10);
    }

    #[test]
    fn test_step_zero_has_forces_evaluated() {
        let simulation = two_particles(0.0, 0.01);
        let lj = simulation.lennard_jones().unwrap();
        let state = simulation.run(&lj, &EulerCromer, &mut []).unwrap();
        assert_eq!(state.step, 0);
        assert!(state.accelerations[(0, 0)] > 0.0);
        assert!((state.squared_distances[(0, 1)] - 2.25).abs() < 1e-12);
    }

    #[test]
    fn test_boundaries_must_match_dimensions() {
        let config = SimulationConfig::new(1.0, 0.01, Boundaries::open(3).unwrap());
        let positions = SetPositions::new(vec![vec![0.0, 0.0], vec![1.0, 1.0]]);
        assert!(matches!(
            Simulation::new(config, &positions, &ZeroVelocities),
            Err(MdError::BoundaryDimensionMismatch {
                boundaries: 3,
                dimensions: 2
            })
        ));
    }

    #[test]
    fn test_velocity_shape_is_checked() {
        let config = SimulationConfig::new(1.0, 0.01, Boundaries::open(1).unwrap());
        let positions = SetPositions::new(vec![vec![0.0], vec![1.5]]);
        let velocities = SetVelocities::new(vec![vec![0.0]]);
        assert!(matches!(
            Simulation::new(config, &positions, &velocities),
            Err(MdError::MalformedVelocities { .. })
        ));
    }

    #[test]
    fn test_initial_positions_are_wrapped_into_periodic_box() {
        let config = SimulationConfig::new(0.0, 0.01, Boundaries::from_spec("p", 10.0).unwrap());
        let positions = SetPositions::new(vec![vec![0.5], vec![30.0]]);
        let simulation = Simulation::new(config, &positions, &ZeroVelocities).unwrap();
        assert!(simulation.state().positions[(1, 0)].abs() < 1e-12);

        let state = simulation.run_lennard_jones(&EulerCromer, &mut []).unwrap();
        assert!((state.squared_distances[(0, 1)] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_run_lennard_jones_uses_configured_cutoff() {
        // 1.5 apart is inside the default cutoff but outside 1.2
        let config = SimulationConfig::new(0.0, 0.01, Boundaries::open(1).unwrap()).with_cutoff(1.2);
        let positions = SetPositions::new(vec![vec![0.0], vec![1.5]]);
        let simulation = Simulation::new(config, &positions, &ZeroVelocities).unwrap();
        let state = simulation.run_lennard_jones(&EulerCromer, &mut []).unwrap();

        assert_eq!(state.accelerations, DMatrix::zeros(2, 1));
        let shift = LennardJones::new(1.2).unwrap().energy_shift();
        assert!((state.potential_energy - shift).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_timestep_fails_before_running() {
        let config = SimulationConfig::new(1.0, -0.01, Boundaries::open(1).unwrap());
        let positions = SetPositions::new(vec![vec![0.0]]);
        assert!(matches!(
            Simulation::new(config, &positions, &ZeroVelocities),
            Err(MdError::InvalidTimestep(_))
        ));
    }
}
