/*
Observer tasks.

The simulation loop hands every task a read-only view of the state after
each step (including step 0) and calls `finalize` once the loop is done.
Tasks here either stream positions to an xyz dump or keep time series in
memory, optionally writing them out as csv when the run finishes.
 */
use crate::constants::DUMP_TYPE_LABEL;
use crate::error::MdError;
use crate::state::State;

use itertools::Itertools;
use nalgebra::DMatrix;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub trait Task {
    fn update(&mut self, state: &State, step: usize) -> Result<(), MdError>;

    fn finalize(&mut self) -> Result<(), MdError> {
        Ok(())
    }

    fn name(&self) -> &str;
}

/// Appends positions to an xyz file, opened once for the whole run.
///
/// Every frame is written as
///
/// ```text
/// <particles>
/// type x y z
/// Ar x [y [z]]
/// ...
/// ```
pub struct DumpPositions {
    path: PathBuf,
    writer: BufWriter<File>,
    interval: usize,
}

impl DumpPositions {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, MdError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| MdError::io(&path, source))?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            interval: 1,
        })
    }

    /// Only dump every `interval`-th step.
    pub fn with_interval(mut self, interval: usize) -> Self {
        self.interval = interval.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_frame(&mut self, positions: &DMatrix<f64>) -> std::io::Result<()> {
        writeln!(self.writer, "{}", positions.nrows())?;
        writeln!(self.writer, "type x y z")?;
        for row in positions.row_iter() {
            write!(self.writer, "{DUMP_TYPE_LABEL}")?;
            for x in row.iter() {
                write!(self.writer, " {x}")?;
            }
            writeln!(self.writer)?;
        }
        Ok(())
    }
}

impl Task for DumpPositions {
    fn update(&mut self, state: &State, step: usize) -> Result<(), MdError> {
        if step % self.interval != 0 {
            return Ok(());
        }
        self.write_frame(&state.positions)
            .map_err(|source| MdError::io(&self.path, source))
    }

    fn finalize(&mut self) -> Result<(), MdError> {
        self.writer
            .flush()
            .map_err(|source| MdError::io(&self.path, source))
    }

    fn name(&self) -> &str {
        "Dump positions"
    }
}

/// Read back every frame of an xyz dump written by [`DumpPositions`].
pub fn read_xyz_trajectory(path: impl AsRef<Path>) -> Result<Vec<DMatrix<f64>>, MdError> {
    let path = path.as_ref();
    let path_str = path.display().to_string();
    let file = File::open(path).map_err(|source| MdError::io(path, source))?;

    let malformed = |line: usize| MdError::MalformedDump {
        path: path_str.clone(),
        line,
    };

    let mut lines = BufReader::new(file).lines().enumerate();
    let mut frames = Vec::new();

    while let Some((line_idx, line)) = lines.next() {
        let line = line.map_err(|source| MdError::io(path, source))?;
        if line.trim().is_empty() {
            continue;
        }
        let particles: usize = line.trim().parse().map_err(|_| malformed(line_idx + 1))?;

        // column header
        match lines.next() {
            Some((_, Ok(_))) => {}
            Some((_, Err(source))) => return Err(MdError::io(path, source)),
            None => return Err(malformed(line_idx + 2)),
        }

        let mut rows: Vec<Vec<f64>> = Vec::with_capacity(particles);
        for _ in 0..particles {
            let (row_idx, row) = lines.next().ok_or_else(|| malformed(line_idx + 3 + rows.len()))?;
            let row = row.map_err(|source| MdError::io(path, source))?;
            let coordinates = row
                .split_whitespace()
                .skip(1)
                .map(|s| s.parse::<f64>())
                .collect::<Result<Vec<f64>, _>>()
                .map_err(|_| malformed(row_idx + 1))?;
            if coordinates.is_empty()
                || rows.first().is_some_and(|first| first.len() != coordinates.len())
            {
                return Err(malformed(row_idx + 1));
            }
            rows.push(coordinates);
        }

        let dimensions = rows.first().map(|row| row.len()).unwrap_or(0);
        frames.push(DMatrix::from_fn(particles, dimensions, |i, k| rows[i][k]));
    }
    Ok(frames)
}

/// Kinetic, potential and total energy at every step.
#[derive(Debug, Default)]
pub struct EnergyRecorder {
    steps: Vec<usize>,
    kinetic: Vec<f64>,
    potential: Vec<f64>,
    output: Option<PathBuf>,
}

impl EnergyRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `step,kinetic,potential,total` rows to `path` on finalize.
    pub fn with_csv(mut self, path: impl AsRef<Path>) -> Self {
        self.output = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn steps(&self) -> &[usize] {
        &self.steps
    }

    pub fn kinetic(&self) -> &[f64] {
        &self.kinetic
    }

    pub fn potential(&self) -> &[f64] {
        &self.potential
    }

    pub fn total(&self) -> Vec<f64> {
        self.kinetic
            .iter()
            .zip(self.potential.iter())
            .map(|(k, u)| k + u)
            .collect()
    }

    /// Largest deviation of the total energy from its initial value.
    pub fn max_drift(&self) -> f64 {
        let total = self.total();
        match total.first() {
            Some(&initial) => total
                .iter()
                .map(|e| (e - initial).abs())
                .fold(0.0, f64::max),
            None => 0.0,
        }
    }
}

impl Task for EnergyRecorder {
    fn update(&mut self, state: &State, step: usize) -> Result<(), MdError> {
        self.steps.push(step);
        self.kinetic.push(state.kinetic_energy());
        self.potential.push(state.potential_energy);
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), MdError> {
        let Some(path) = &self.output else {
            return Ok(());
        };
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["step", "kinetic", "potential", "total"])?;
        for (i, step) in self.steps.iter().enumerate() {
            let (k, u) = (self.kinetic[i], self.potential[i]);
            writer.write_record([
                step.to_string(),
                k.to_string(),
                u.to_string(),
                (k + u).to_string(),
            ])?;
        }
        writer.flush().map_err(|source| MdError::io(path, source))?;
        log::info!("energies written to {}", path.display());
        Ok(())
    }

    fn name(&self) -> &str {
        "Energy recorder"
    }
}

/// Distance of every unique pair i < j at every step.
#[derive(Debug, Default)]
pub struct DistanceRecorder {
    pairs: Vec<(usize, usize)>,
    distances: Vec<Vec<f64>>,
    output: Option<PathBuf>,
}

impl DistanceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_csv(mut self, path: impl AsRef<Path>) -> Self {
        self.output = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    /// One entry per recorded step, ordered like [`DistanceRecorder::pairs`].
    pub fn distances(&self) -> &[Vec<f64>] {
        &self.distances
    }

    /// Time series for a single pair.
    pub fn series(&self, i: usize, j: usize) -> Option<Vec<f64>> {
        let key = (i.min(j), i.max(j));
        let column = self.pairs.iter().position(|&pair| pair == key)?;
        Some(self.distances.iter().map(|row| row[column]).collect())
    }
}

impl Task for DistanceRecorder {
    fn update(&mut self, state: &State, _step: usize) -> Result<(), MdError> {
        if self.pairs.is_empty() {
            self.pairs = (0..state.particles()).tuple_combinations().collect();
        }
        self.distances
            .push(self.pairs.iter().map(|&(i, j)| state.distance(i, j)).collect());
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), MdError> {
        let Some(path) = &self.output else {
            return Ok(());
        };
        let mut writer = csv::Writer::from_path(path)?;
        let mut header = vec!["step".to_string()];
        header.extend(self.pairs.iter().map(|(i, j)| format!("r_{i}_{j}")));
        writer.write_record(&header)?;
        for (step, row) in self.distances.iter().enumerate() {
            let mut record = vec![step.to_string()];
            record.extend(row.iter().map(|r| r.to_string()));
            writer.write_record(&record)?;
        }
        writer.flush().map_err(|source| MdError::io(path, source))?;
        Ok(())
    }

    fn name(&self) -> &str {
        "Distance recorder"
    }
}

/// Full position history, one P x D matrix per recorded step.
#[derive(Debug, Default)]
pub struct PositionRecorder {
    frames: Vec<DMatrix<f64>>,
}

impl PositionRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[DMatrix<f64>] {
        &self.frames
    }
}

impl Task for PositionRecorder {
    fn update(&mut self, state: &State, _step: usize) -> Result<(), MdError> {
        self.frames.push(state.positions.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "Position recorder"
    }
}
