/*
Run configuration.

`SimulationConfig` holds what the integration loop itself needs. A `RunFile`
wraps it together with the initial conditions, the integrator and the
outputs, so a whole run fits in one JSON document:

    {
      "simulation": {
        "total_time": 5.0,
        "dt": 0.01,
        "cutoff": 3.0,
        "boundaries": [{ "lower": 0.0, "upper": 10.0, "kind": "periodic" }]
      },
      "positions": { "kind": "list", "positions": [[0.0], [1.5]] },
      "velocities": { "kind": "zero" },
      "integrator": "euler_cromer",
      "dump": "two_particles.xyz",
      "energy_csv": "two_particles_energy.csv",
      "distance_csv": "two_particles_distance.csv"
    }
 */
use crate::boundary::Boundaries;
use crate::constants::{DEFAULT_CUTOFF, DEFAULT_DT, DEFAULT_TOTAL_TIME};
use crate::error::MdError;
use crate::initial::{
    FaceCenteredCube, GaussianVelocities, InitialPositions, InitialVelocities, SetPositions,
    SetVelocities, ZeroVelocities,
};
use crate::integrator::IntegratorKind;
use crate::simulation::Simulation;
use crate::state::State;
use crate::tasks::{DistanceRecorder, DumpPositions, EnergyRecorder, Task};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_cutoff() -> f64 {
    DEFAULT_CUTOFF
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub total_time: f64, // total simulated time T
    pub dt: f64,         // timestep
    #[serde(default = "default_cutoff")]
    pub cutoff: f64, // interaction cutoff radius
    pub boundaries: Boundaries,
    #[serde(default)]
    pub progress: bool, // show a progress bar while integrating
}

impl SimulationConfig {
    pub fn new(total_time: f64, dt: f64, boundaries: Boundaries) -> Self {
        Self {
            total_time,
            dt,
            cutoff: DEFAULT_CUTOFF,
            boundaries,
            progress: false,
        }
    }

    /// Default time scales (T = 5, dt = 0.01) for the given boundaries.
    pub fn with_boundaries(boundaries: Boundaries) -> Self {
        Self::new(DEFAULT_TOTAL_TIME, DEFAULT_DT, boundaries)
    }

    pub fn with_cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = cutoff;
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Number of integration steps, N = floor(T / dt).
    pub fn steps(&self) -> usize {
        (self.total_time / self.dt).floor() as usize
    }

    pub fn validate(&self) -> Result<(), MdError> {
        if !(self.dt > 0.0) || !self.dt.is_finite() {
            return Err(MdError::InvalidTimestep(self.dt));
        }
        if !(self.total_time >= 0.0) || !self.total_time.is_finite() {
            return Err(MdError::InvalidTotalTime(self.total_time));
        }
        if !(self.cutoff > 0.0) || !self.cutoff.is_finite() {
            return Err(MdError::InvalidCutoff(self.cutoff));
        }
        Ok(())
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, MdError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| MdError::io(path, source))?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PositionsConfig {
    Fcc {
        cells: usize,
        length: f64,
        dimensions: usize,
    },
    List {
        positions: Vec<Vec<f64>>,
    },
}

impl PositionsConfig {
    pub fn source(&self) -> Box<dyn InitialPositions> {
        match self {
            PositionsConfig::Fcc {
                cells,
                length,
                dimensions,
            } => Box::new(FaceCenteredCube::new(*cells, *length, *dimensions)),
            PositionsConfig::List { positions } => Box::new(SetPositions::new(positions.clone())),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VelocitiesConfig {
    #[default]
    Zero,
    List {
        velocities: Vec<Vec<f64>>,
    },
    Gaussian {
        std_dev: f64,
        #[serde(default)]
        seed: Option<u64>,
    },
}

impl VelocitiesConfig {
    pub fn source(&self) -> Box<dyn InitialVelocities> {
        match self {
            VelocitiesConfig::Zero => Box::new(ZeroVelocities),
            VelocitiesConfig::List { velocities } => {
                Box::new(SetVelocities::new(velocities.clone()))
            }
            VelocitiesConfig::Gaussian { std_dev, seed } => Box::new(GaussianVelocities {
                std_dev: *std_dev,
                seed: *seed,
            }),
        }
    }
}

/// Everything needed to run one simulation from a file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunFile {
    pub simulation: SimulationConfig,
    pub positions: PositionsConfig,
    #[serde(default)]
    pub velocities: VelocitiesConfig,
    pub integrator: IntegratorKind,
    #[serde(default)]
    pub dump: Option<PathBuf>,
    #[serde(default)]
    pub energy_csv: Option<PathBuf>,
    #[serde(default)]
    pub distance_csv: Option<PathBuf>,
}

impl RunFile {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, MdError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| MdError::io(path, source))?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Run the described simulation with the Lennard-Jones potential.
    pub fn execute(&self) -> Result<State, MdError> {
        let simulation = Simulation::new(
            self.simulation.clone(),
            self.positions.source().as_ref(),
            self.velocities.source().as_ref(),
        )?;
        let integrator = self.integrator.build();

        let mut energy = match &self.energy_csv {
            Some(path) => EnergyRecorder::new().with_csv(path),
            None => EnergyRecorder::new(),
        };
        let mut distance = self
            .distance_csv
            .as_ref()
            .map(|path| DistanceRecorder::new().with_csv(path));
        let mut dump = match &self.dump {
            Some(path) => Some(DumpPositions::create(path)?),
            None => None,
        };

        let mut tasks: Vec<&mut dyn Task> = Vec::new();
        tasks.push(&mut energy);
        if let Some(distance) = distance.as_mut() {
            tasks.push(distance);
        }
        if let Some(dump) = dump.as_mut() {
            tasks.push(dump);
        }

        let state = simulation.run_lennard_jones(integrator.as_ref(), &mut tasks)?;
        log::info!(
            "run finished after {} steps, max energy drift {:.3e}",
            state.step,
            energy.max_drift()
        );
        Ok(state)
    }
}
