pub mod chunk;
pub mod experiment;
pub mod fitness;
pub mod ga;
pub mod individual;
pub mod instance;
pub mod param;
pub mod population;
pub mod timetable;
pub mod utils;

use chrono::Local;
use log::debug;
use std::error::Error;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::experiment::Experiment;
use crate::ga::ga;
use crate::individual::Individual;
use crate::instance::Instance;
use crate::param::Param;

/// Loads the instance named in the parameters and evolves timetables for it
pub fn run(param: &Param, running: Arc<AtomicBool>) -> Result<Experiment, Box<dyn Error>> {
    let param = checked(param)?;
    let instance = load_instance(&param)?;
    Ok(run_on_instance(&instance, &param, running)?)
}

/// Loads and checks `data.instance`, logging a summary of its load
pub fn load_instance(param: &Param) -> Result<Instance, Box<dyn Error>> {
    debug!("Loading instance {}...", param.data.instance);
    let instance = Instance::load(&param.data.instance)?;
    cinfo!(
        param.general.display_colorful,
        "\x1b[2;97m{} divisions, {} weekly hours to place\x1b[0m",
        instance.divisions.len(),
        instance.total_hours()
    );
    debug!("{}", instance);
    Ok(instance)
}

/// Validates the parameters, then evolves timetables for the instance
pub fn run_on_instance(
    instance: &Instance,
    param: &Param,
    running: Arc<AtomicBool>,
) -> Result<Experiment, String> {
    let param = checked(param)?;
    let start = std::time::Instant::now();
    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();

    let evolution = ga(instance, &param, running);

    let exec_time = start.elapsed().as_secs_f64();
    Ok(Experiment::new(instance, &param, evolution, timestamp, exec_time))
}

/// Best timetable found for the instance within the parameter budget.
/// Invalid parameters are rejected before anything runs.
pub fn solve(instance: &Instance, param: &Param) -> Result<Individual, String> {
    let param = checked(param)?;
    Ok(ga(instance, &param, Arc::new(AtomicBool::new(true))).best)
}

fn checked(param: &Param) -> Result<Param, String> {
    let mut param = param.clone();
    param::validate(&mut param)?;
    Ok(param)
}
