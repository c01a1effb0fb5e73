use crate::cinfo;
use crate::individual::Individual;
use crate::instance::{Instance, WEEKDAYS};
use crate::param::Param;
use crate::population::{EpochStats, Population};
use crate::utils::{display_epoch, display_epoch_legend};
use log::{debug, info, warn};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Number of weekdays a child receives from its second parent
const CROSSOVER_DAYS: usize = 2;

/// Result of a genetic algorithm run
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Evolution {
    /// Best individual seen during the whole run
    pub best: Individual,
    /// Every generation when `keep_trace` is set, the last one otherwise
    pub populations: Vec<Population>,
    /// One entry per evaluated generation, the initial one included
    pub history: Vec<EpochStats>,
    /// Number of generations bred after the initial population
    pub generations: usize,
    /// Whether the run was stopped by the running flag
    pub interrupted: bool,
}

//-----------------------------------------------------------------------------
// Genetic Algorithm core functions
//-----------------------------------------------------------------------------

/// Main function to run the genetic algorithm
///
/// # Arguments
///
/// * `instance` - The scheduling problem.
/// * `param` - Parameters for the genetic algorithm.
/// * `running` - Cleared to stop the run at the next generation boundary.
///
/// # Returns
///
/// The best timetable found along with the run history. Always returns a
/// timetable, even when no conflict-free one was found.
///
/// `param` must have passed `param::validate`; `solve` and `run` do it.
pub fn ga(instance: &Instance, param: &Param, running: Arc<AtomicBool>) -> Evolution {
    let time = Instant::now();

    let pool = ThreadPoolBuilder::new()
        .num_threads(param.general.thread_number)
        .build()
        .map_err(|e| {
            warn!(
                "Unable to build a {}-thread pool ({}), using the global one.",
                param.general.thread_number, e
            )
        })
        .ok();

    let mut rng = ChaCha8Rng::seed_from_u64(param.general.seed);

    let base_pop = generate_pop(instance, param, &mut rng);
    info!(
        "Population size: {}, {} divisions, {} weekly hours to place",
        base_pop.individuals.len(),
        instance.divisions.len(),
        instance.total_hours()
    );

    cinfo!(
        param.general.display_colorful,
        "{}",
        display_epoch_legend(param)
    );
    let evolution = iterative_evolution(&base_pop, instance, pool.as_ref(), param, running, &mut rng);

    info!(
        "Genetic algorithm computed {} generations in {:.2?}",
        evolution.generations,
        time.elapsed()
    );
    if evolution.best.fit > 0 {
        warn!(
            "No perfect timetable found: returning the best one (score {}).",
            evolution.best.fit
        );
    }

    evolution
}

/// Generate the initial population
pub fn generate_pop(instance: &Instance, param: &Param, rng: &mut ChaCha8Rng) -> Population {
    let mut pop = Population::new();
    debug!("generating...");
    pop.generate(param.ga.population_size, instance, rng);
    pop
}

/// Run the iterative evolution process of the genetic algorithm
///
/// Stops as soon as a timetable scores 0, when `max_epochs` generations have
/// been bred, or when `running` is cleared. The flag is only read between
/// two generations.
///
/// # Arguments
///
/// * `base_pop` - The initial population to start the evolution.
/// * `instance` - The scheduling problem.
/// * `pool` - Optional thread pool for fitness evaluation.
/// * `param` - Parameters for the genetic algorithm.
/// * `running` - Atomic boolean to control the running state of the algorithm.
/// * `rng` - Random number generator.
pub fn iterative_evolution(
    base_pop: &Population,
    instance: &Instance,
    pool: Option<&ThreadPool>,
    param: &Param,
    running: Arc<AtomicBool>,
    rng: &mut ChaCha8Rng,
) -> Evolution {
    let mut epoch: usize = 0;
    let mut populations: Vec<Population> = vec![];
    let mut history: Vec<EpochStats> = vec![];
    let mut interrupted = false;

    let mut pop = base_pop.clone();
    pop.compute_hash();
    debug!("Fitting population...");
    fit_population(&mut pop, instance, pool);
    pop = pop.sort();

    let mut best = match pop.individuals.first() {
        Some(individual) => individual.clone(),
        None => {
            warn!("Empty population: returning an empty timetable.");
            let mut empty = Individual::new();
            empty.fit(instance);
            empty
        }
    };

    let stats = pop.stats(epoch);
    cinfo!(
        param.general.display_colorful,
        "{}",
        display_epoch(&stats, best.fit)
    );
    history.push(stats);

    // Evolve!
    loop {
        if param.general.keep_trace {
            populations.push(pop.clone())
        }

        if best.fit == 0 {
            info!("Perfect timetable found (born at epoch {})", best.epoch);
            break;
        }

        if epoch >= param.ga.max_epochs || pop.individuals.is_empty() {
            info!("Reach max epoch");
            break;
        }

        if !running.load(Ordering::Relaxed) {
            info!("Signal received");
            interrupted = true;
            break;
        }

        epoch += 1;
        pop = evolve(pop, instance, pool, param, epoch, rng);

        let stats = pop.stats(epoch);
        cinfo!(
            param.general.display_colorful,
            "{}",
            display_epoch(&stats, best.fit)
        );
        history.push(stats);

        if pop.individuals[0].fit < best.fit {
            best = pop.individuals[0].clone();
            debug!("New best timetable: {}", best);
        }
    }

    if !param.general.keep_trace {
        populations.push(pop);
    }

    Evolution {
        best,
        populations,
        history,
        generations: epoch,
        interrupted,
    }
}

/// Run one evolution step: selection, cross-over, mutation, fitting
///
/// Survivors keep their score, only children are evaluated.
///
/// # Arguments
///
/// * `pop` - The current sorted population to evolve.
/// * `instance` - The scheduling problem.
/// * `pool` - Optional thread pool for fitness evaluation.
/// * `param` - Parameters for the genetic algorithm.
/// * `epoch` - The current epoch number.
/// * `rng` - Random number generator.
///
/// # Returns
///
/// A new sorted population representing the next generation.
pub fn evolve(
    pop: Population,
    instance: &Instance,
    pool: Option<&ThreadPool>,
    param: &Param,
    epoch: usize,
    rng: &mut ChaCha8Rng,
) -> Population {
    let mut new_pop = Population::new();

    new_pop.add(select_parents(&pop, param));

    // Generate children
    let children_to_create =
        (param.ga.population_size as usize).saturating_sub(new_pop.individuals.len());

    let mut children = cross_over(&new_pop, children_to_create, rng);
    mutate(&mut children, param, rng);

    for i in children.individuals.iter_mut() {
        i.epoch = epoch;
    }
    children.compute_hash();

    debug!("Fitting children...");
    fit_population(&mut children, instance, pool);

    new_pop.add(children);
    new_pop.sort()
}

/// Keeps the best `select_elite_pct` percent of a sorted population, used both
/// as survivors and as breeding pool
fn select_parents(pop: &Population, param: &Param) -> Population {
    let (parents, n) = pop.select_first_pct(param.ga.select_elite_pct);
    if n < 2 {
        debug!("Single parent: children are clones of it");
    }
    parents
}

/// Perform crossover between parents to generate children
///
/// Parents are drawn with replacement. A child copies its first parent, then
/// takes two random weekdays (possibly the same) of one random division from
/// its second parent.
///
/// # Arguments
///
/// * `parents` - The population of parents to crossover.
/// * `children_number` - The number of children to generate.
/// * `rng` - Random number generator.
///
/// # Returns
///
/// A population representing the generated children, empty if there is no parent.
pub fn cross_over(
    parents: &Population,
    children_number: usize,
    rng: &mut ChaCha8Rng,
) -> Population {
    let mut children = Population::new();
    let n = parents.individuals.len();
    if n == 0 {
        return children;
    }

    for _i in 0..children_number {
        let p1 = &parents.individuals[rng.gen_range(0..n)];
        let p2 = &parents.individuals[rng.gen_range(0..n)];

        let mut child = Individual::child(p1);

        let divisions = child.timetables.len().min(p2.timetables.len());
        if divisions > 0 {
            let division = rng.gen_range(0..divisions);
            for _ in 0..CROSSOVER_DAYS {
                let day = rng.gen_range(0..WEEKDAYS);
                child.timetables[division][day] = p2.timetables[division][day].clone();
            }
        }

        child.parents = Some(vec![p1.hash, p2.hash]);
        children.individuals.push(child);
    }
    children
}

/// Mutate each child with probability `mutation_rate`
///
/// # Arguments
///
/// * `children` - The population of children to mutate.
/// * `param` - Parameters for the genetic algorithm.
/// * `rng` - Random number generator.
pub fn mutate(children: &mut Population, param: &Param, rng: &mut ChaCha8Rng) {
    if param.ga.mutation_rate <= 0.0 {
        return;
    }

    for individual in children.individuals.iter_mut() {
        if rng.gen_bool(param.ga.mutation_rate) {
            mutate_swap(individual, rng);
        }
    }
}

/// Swaps two random periods of one random weekday of one random division.
/// Nothing happens when that day has less than two periods.
pub fn mutate_swap(individual: &mut Individual, rng: &mut ChaCha8Rng) {
    if individual.timetables.is_empty() {
        return;
    }

    let division = rng.gen_range(0..individual.timetables.len());
    let day = rng.gen_range(0..WEEKDAYS);
    let periods = &mut individual.timetables[division][day];
    if periods.len() > 1 {
        let a = rng.gen_range(0..periods.len());
        let b = rng.gen_range(0..periods.len());
        periods.swap(a, b);
    }
}

fn fit_population(pop: &mut Population, instance: &Instance, pool: Option<&ThreadPool>) {
    match pool {
        Some(pool) => pool.install(|| pop.fit(instance)),
        None => pop.fit(instance),
    }
}
