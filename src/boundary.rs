/*
How do we handle the edges of the simulation box?

Each dimension carries its own condition:

    o - open:       particles move freely, distances are taken as they are
    r - reflective: a particle that leaves the box is mirrored back inside
                    and its velocity along that axis changes sign
    p - periodic:   coordinates wrap modulo the box length and distances
                    use the minimum image convention

 */
use crate::constants::MAX_DIMENSIONS;
use crate::error::MdError;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryKind {
    Open,
    Reflective,
    Periodic,
}

impl BoundaryKind {
    pub fn from_char(c: char) -> Result<Self, MdError> {
        match c {
            'o' => Ok(BoundaryKind::Open),
            'r' => Ok(BoundaryKind::Reflective),
            'p' => Ok(BoundaryKind::Periodic),
            other => Err(MdError::InvalidBoundary(other)),
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            BoundaryKind::Open => 'o',
            BoundaryKind::Reflective => 'r',
            BoundaryKind::Periodic => 'p',
        }
    }
}

/// Bounds and kind of the box along a single dimension.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundaryCondition {
    pub lower: f64,
    pub upper: f64,
    pub kind: BoundaryKind,
}

impl BoundaryCondition {
    pub fn new(kind: BoundaryKind, lower: f64, upper: f64) -> Self {
        Self { lower, upper, kind }
    }

    pub fn length(&self) -> f64 {
        self.upper - self.lower
    }

    /// Nearest periodic image of a single displacement component.
    pub fn minimum_image(&self, dx: f64) -> f64 {
        match self.kind {
            BoundaryKind::Periodic => {
                let length = self.length();
                if dx > 0.5 * length {
                    dx - length
                } else if dx < -0.5 * length {
                    dx + length
                } else {
                    dx
                }
            }
            BoundaryKind::Open | BoundaryKind::Reflective => dx,
        }
    }

    /// Boundary-corrected coordinate and velocity component after a position update.
    pub fn enforce(&self, x: f64, v: f64) -> (f64, f64) {
        match self.kind {
            BoundaryKind::Open => (x, v),
            BoundaryKind::Periodic => {
                let wrapped = self.lower + (x - self.lower).rem_euclid(self.length());
                // rem_euclid can round up to the full length for tiny negative offsets
                if wrapped >= self.upper {
                    (self.lower, v)
                } else {
                    (wrapped, v)
                }
            }
            BoundaryKind::Reflective => {
                if x < self.lower {
                    (2.0 * self.lower - x, -v)
                } else if x > self.upper {
                    (2.0 * self.upper - x, -v)
                } else {
                    (x, v)
                }
            }
        }
    }
}

/// The full set of per-dimension conditions, fixed for the whole run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<BoundaryCondition>", into = "Vec<BoundaryCondition>")]
pub struct Boundaries {
    conditions: Vec<BoundaryCondition>,
}

impl Boundaries {
    pub fn new(conditions: Vec<BoundaryCondition>) -> Result<Self, MdError> {
        if conditions.is_empty() || conditions.len() > MAX_DIMENSIONS {
            return Err(MdError::UnsupportedDimension(conditions.len()));
        }
        for (dimension, condition) in conditions.iter().enumerate() {
            if condition.kind != BoundaryKind::Open && !(condition.upper > condition.lower) {
                return Err(MdError::InvalidBox {
                    dimension,
                    lower: condition.lower,
                    upper: condition.upper,
                });
            }
        }
        Ok(Self { conditions })
    }

    /// Open boundaries in every dimension.
    pub fn open(dimensions: usize) -> Result<Self, MdError> {
        Self::uniform(BoundaryKind::Open, dimensions, 1.0)
    }

    pub fn uniform(kind: BoundaryKind, dimensions: usize, length: f64) -> Result<Self, MdError> {
        Self::new(vec![BoundaryCondition::new(kind, 0.0, length); dimensions])
    }

    /// Parse a spec like `"opr"`, one character per dimension, each box spanning `[0, length]`.
    pub fn from_spec(spec: &str, length: f64) -> Result<Self, MdError> {
        let conditions = spec
            .chars()
            .map(|c| BoundaryKind::from_char(c).map(|kind| BoundaryCondition::new(kind, 0.0, length)))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(conditions)
    }

    pub fn dimensions(&self) -> usize {
        self.conditions.len()
    }

    pub fn conditions(&self) -> &[BoundaryCondition] {
        &self.conditions
    }

    /// Apply the minimum image convention column by column.
    ///
    /// Each row of `displacements` is one displacement vector, so the same call
    /// serves a single pair or the whole P*P pair table.
    pub fn correct_displacements(&self, displacements: &mut DMatrix<f64>) {
        debug_assert_eq!(displacements.ncols(), self.dimensions());
        for (dim, condition) in self.conditions.iter().enumerate() {
            if condition.kind != BoundaryKind::Periodic {
                continue;
            }
            for dx in displacements.column_mut(dim).iter_mut() {
                *dx = condition.minimum_image(*dx);
            }
        }
    }

    /// Wrap or reflect freshly integrated positions, flipping velocities on reflection.
    pub fn correct_positions(&self, positions: &mut DMatrix<f64>, velocities: &mut DMatrix<f64>) {
        debug_assert_eq!(positions.shape(), velocities.shape());
        for (dim, condition) in self.conditions.iter().enumerate() {
            if condition.kind == BoundaryKind::Open {
                continue;
            }
            for i in 0..positions.nrows() {
                let (x, v) = condition.enforce(positions[(i, dim)], velocities[(i, dim)]);
                positions[(i, dim)] = x;
                velocities[(i, dim)] = v;
            }
        }
    }
}

impl TryFrom<Vec<BoundaryCondition>> for Boundaries {
    type Error = MdError;

    fn try_from(conditions: Vec<BoundaryCondition>) -> Result<Self, Self::Error> {
        Boundaries::new(conditions)
    }
}

impl From<Boundaries> for Vec<BoundaryCondition> {
    fn from(boundaries: Boundaries) -> Self {
        boundaries.conditions
    }
}

impl std::fmt::Display for Boundaries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (label, condition) in "xyz".chars().zip(self.conditions.iter()) {
            write!(
                f,
                "{label}:{}[{}, {}] ",
                condition.kind.as_char(),
                condition.lower,
                condition.upper
            )?;
        }
        Ok(())
    }
}
