use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::individual::Individual;
use crate::instance::Instance;
use crate::param::elite_size;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Population {
    pub individuals: Vec<Individual>,
}

/// Score summary of one generation
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct EpochStats {
    pub epoch: usize,
    pub best: u64,
    pub mean: f64,
    pub worst: u64,
    /// Individuals with distinct timetables
    pub unique: usize,
}

impl Population {
    pub fn new() -> Population {
        Population {
            individuals: Vec::new(),
        }
    }

    /// Adds `size` random individuals built for the instance
    pub fn generate(&mut self, size: u32, instance: &Instance, rng: &mut ChaCha8Rng) {
        self.individuals
            .extend((0..size).map(|_| Individual::random(instance, rng)));
    }

    pub fn add(&mut self, population: Population) {
        self.individuals.extend(population.individuals);
    }

    pub fn compute_hash(&mut self) {
        for individual in &mut self.individuals {
            individual.compute_hash();
        }
    }

    /// Scores every individual. Runs on the current rayon pool, each
    /// evaluation being independent.
    pub fn fit(&mut self, instance: &Instance) {
        self.individuals
            .par_iter_mut()
            .for_each(|i| i.fit(instance));
    }

    /// Ranks individuals by ascending score; ties keep their order
    pub fn sort(mut self) -> Self {
        self.individuals.sort_by_key(|i| i.fit);
        self
    }

    /// Copies the first `pct` percent of a sorted population (at least one individual)
    ///
    /// # Returns
    ///
    /// The selected population and its size
    pub fn select_first_pct(&self, pct: f64) -> (Population, usize) {
        if self.individuals.is_empty() {
            return (Population::new(), 0);
        }
        let n = elite_size(self.individuals.len(), pct);
        (
            Population {
                individuals: self.individuals[..n].to_vec(),
            },
            n,
        )
    }

    /// Lowest scored individual, first one on ties
    pub fn best(&self) -> Option<&Individual> {
        self.individuals.iter().min_by_key(|i| i.fit)
    }

    pub fn stats(&self, epoch: usize) -> EpochStats {
        let n = self.individuals.len();
        let unique = self
            .individuals
            .iter()
            .map(|i| i.hash)
            .collect::<HashSet<u64>>()
            .len();

        EpochStats {
            epoch,
            best: self.individuals.iter().map(|i| i.fit).min().unwrap_or(0),
            mean: if n > 0 {
                self.individuals.iter().map(|i| i.fit as f64).sum::<f64>() / n as f64
            } else {
                0.0
            },
            worst: self.individuals.iter().map(|i| i.fit).max().unwrap_or(0),
            unique,
        }
    }
}

impl Default for Population {
    fn default() -> Self {
        Population::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{Division, Subject};
    use rand::SeedableRng;

    /// Helper function to create a population with decreasing fits
    fn create_test_population(size: usize) -> Population {
        let mut pop = Population::new();
        for i in 0..size {
            let mut individual = Individual::new();
            individual.fit = ((size - i) * 10) as u64;
            individual.hash = i as u64;
            pop.individuals.push(individual);
        }
        pop
    }

    fn create_test_instance() -> Instance {
        Instance {
            divisions: vec![
                Division::new(
                    "1A",
                    vec![Subject::new("math", [2, 2, 0, 0, 0])
                        .with_teacher("LJ")
                        .with_classrooms(&["14", "7"])],
                ),
                Division::new(
                    "1B",
                    vec![Subject::new("math", [2, 0, 0, 0, 0])
                        .with_teacher("LJ")
                        .with_classrooms(&["14"])],
                ),
            ],
            ..Instance::default()
        }
    }

    #[test]
    fn test_generate_and_fit() {
        let instance = create_test_instance();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut pop = Population::new();
        pop.generate(8, &instance, &mut rng);
        assert_eq!(pop.individuals.len(), 8);

        pop.fit(&instance);
        for individual in &pop.individuals {
            // LJ teaches both divisions on Monday's first two periods
            assert_eq!(individual.evaluate(&instance).teacher_overlaps, 2);
            assert_eq!(individual.fit, individual.evaluate(&instance).score());
        }
    }

    #[test]
    fn test_sort_is_ascending_and_stable() {
        let mut pop = create_test_population(5);
        pop.individuals[3].fit = 50;
        let pop = pop.sort();
        let fits: Vec<u64> = pop.individuals.iter().map(|i| i.fit).collect();
        assert_eq!(fits, vec![10, 30, 40, 50, 50]);
        // hash 0 was first among the two 50s
        assert_eq!(pop.individuals[3].hash, 0);
        assert_eq!(pop.individuals[4].hash, 3);
    }

    #[test]
    fn test_select_first_pct() {
        let pop = create_test_population(10).sort();
        let (elite, n) = pop.select_first_pct(50.0);
        assert_eq!(n, 5);
        assert_eq!(elite.individuals.len(), 5);
        assert_eq!(elite.individuals[0].fit, 10);

        let (elite, n) = create_test_population(1).select_first_pct(50.0);
        assert_eq!(n, 1);
        assert_eq!(elite.individuals.len(), 1);

        let (elite, n) = Population::new().select_first_pct(50.0);
        assert_eq!(n, 0);
        assert!(elite.individuals.is_empty());
    }

    #[test]
    fn test_best_and_stats() {
        let mut pop = create_test_population(4);
        pop.individuals[2].hash = 0;
        assert_eq!(pop.best().unwrap().fit, 10);

        let stats = pop.stats(3);
        assert_eq!(stats.epoch, 3);
        assert_eq!(stats.best, 10);
        assert_eq!(stats.worst, 40);
        assert_eq!(stats.mean, 25.0);
        assert_eq!(stats.unique, 3);
    }
}
