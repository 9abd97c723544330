//! Run a simulation described by a JSON run file, or the two-particle example
//! when no file is given.
//!
//!     ljmd [run.json]

use ljmd::{
    Boundaries, DistanceRecorder, EnergyRecorder, EulerCromer, MdError, RunFile, SetPositions,
    Simulation, SimulationConfig, State, Task, ZeroVelocities,
};

fn two_particles_one_dimension() -> Result<State, MdError> {
    /*
    Two particles in one dimension, open boundaries, initially separated by
    1.5 sigma and at rest. The separation is beyond the potential minimum, so
    they attract and oscillate about 2^(1/6).
     */
    let config = SimulationConfig::with_boundaries(Boundaries::open(1)?).with_progress(true);
    let positions = SetPositions::new(vec![vec![0.0], vec![1.5]]);
    let simulation = Simulation::new(config, &positions, &ZeroVelocities)?;

    let mut energy = EnergyRecorder::new();
    let mut distance = DistanceRecorder::new();
    let mut tasks: [&mut dyn Task; 2] = [&mut energy, &mut distance];
    let state = simulation.run_lennard_jones(&EulerCromer, &mut tasks)?;

    if let Some(r) = distance.series(0, 1) {
        let r_min = r.iter().copied().fold(f64::INFINITY, f64::min);
        let r_max = r.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        println!("separation oscillates between {r_min:.4} and {r_max:.4}");
    }
    println!("max total energy drift: {:.3e}", energy.max_drift());
    Ok(state)
}

fn main() {
    let result = match std::env::args().nth(1) {
        Some(path) => RunFile::from_json_file(&path).and_then(|run| run.execute()),
        None => two_particles_one_dimension(),
    };

    match result {
        Ok(state) => println!(
            "finished at step {}: E_kin={:.6} E_pot={:.6} E_tot={:.6}",
            state.step,
            state.kinetic_energy(),
            state.potential_energy,
            state.total_energy()
        ),
        Err(e) => {
            eprintln!("Simulation failed: {e}");
            std::process::exit(1);
        }
    }
}
