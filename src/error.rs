/*
Errors raised while setting up or running a simulation.

Everything here is a configuration or I/O problem. Numerical trouble inside
the force kernel never surfaces as an error, it is zeroed in place.
*/

#[derive(Debug)]
pub enum MdError {
    Io {
        path: String,
        source: std::io::Error,
    },
    Csv(csv::Error),
    Json(serde_json::Error),
    EmptyPositions,
    MalformedPositions {
        row: usize,
        expected: usize,
        found: usize,
    },
    MalformedVelocities {
        expected: (usize, usize),
        found: (usize, usize),
    },
    UnsupportedDimension(usize),
    InvalidBoundary(char),
    InvalidBox {
        dimension: usize,
        lower: f64,
        upper: f64,
    },
    BoundaryDimensionMismatch {
        boundaries: usize,
        dimensions: usize,
    },
    InvalidTimestep(f64),
    InvalidTotalTime(f64),
    InvalidCutoff(f64),
    InvalidVelocityScale(f64),
    MalformedDump {
        path: String,
        line: usize,
    },
}

impl MdError {
    pub(crate) fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        MdError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

impl std::fmt::Display for MdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MdError::Io { path, source } => write!(f, "I/O error on `{path}`: {source}"),
            MdError::Csv(err) => write!(f, "failed to write csv output: {err}"),
            MdError::Json(err) => write!(f, "invalid run configuration: {err}"),
            MdError::EmptyPositions => write!(f, "initial positions contain no particles"),
            MdError::MalformedPositions {
                row,
                expected,
                found,
            } => write!(
                f,
                "initial position {row} has {found} coordinates, expected {expected}"
            ),
            MdError::MalformedVelocities { expected, found } => write!(
                f,
                "initial velocities have shape {}x{}, expected {}x{}",
                found.0, found.1, expected.0, expected.1
            ),
            MdError::UnsupportedDimension(d) => {
                write!(f, "the number of dimensions needs to be in [1,3], got {d}")
            }
            MdError::InvalidBoundary(c) => write!(
                f,
                "unknown boundary condition `{c}` (use o - open, r - reflective, p - periodic)"
            ),
            MdError::InvalidBox {
                dimension,
                lower,
                upper,
            } => write!(
                f,
                "box along dimension {dimension} is empty: lower {lower} >= upper {upper}"
            ),
            MdError::BoundaryDimensionMismatch {
                boundaries,
                dimensions,
            } => write!(
                f,
                "{boundaries} boundary conditions given for a {dimensions}-dimensional system"
            ),
            MdError::InvalidTimestep(dt) => write!(f, "timestep must be positive, got {dt}"),
            MdError::InvalidTotalTime(t) => {
                write!(f, "total time must be non-negative, got {t}")
            }
            MdError::InvalidCutoff(rc) => write!(f, "cutoff must be positive, got {rc}"),
            MdError::InvalidVelocityScale(s) => {
                write!(f, "velocity standard deviation must be non-negative, got {s}")
            }
            MdError::MalformedDump { path, line } => {
                write!(f, "malformed trajectory dump `{path}` at line {line}")
            }
        }
    }
}

impl std::error::Error for MdError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MdError::Io { source, .. } => Some(source),
            MdError::Csv(err) => Some(err),
            MdError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<csv::Error> for MdError {
    fn from(err: csv::Error) -> Self {
        MdError::Csv(err)
    }
}

impl From<serde_json::Error> for MdError {
    fn from(err: serde_json::Error) -> Self {
        MdError::Json(err)
    }
}
