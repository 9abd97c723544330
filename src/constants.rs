// Reduced Lennard-Jones units: sigma = epsilon = 1
pub const MASS: f64 = 1.0; // Mass of each particle
pub const DEFAULT_CUTOFF: f64 = 3.0; // Interactions beyond this separation are ignored
pub const DEFAULT_DT: f64 = 0.01; // Time step
pub const DEFAULT_TOTAL_TIME: f64 = 5.0; // Total simulated time
pub const MAX_DIMENSIONS: usize = 3;
pub const DUMP_TYPE_LABEL: &str = "Ar"; // atom label written to xyz dumps
