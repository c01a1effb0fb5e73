use log::warn;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::BufReader;

// Field definitions and associated default values

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Param {
    #[serde(default)]
    pub general: General,
    #[serde(default)]
    pub data: Data,
    #[serde(default)]
    pub ga: GA,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct General {
    #[serde(default = "seed_default")]
    pub seed: u64,
    #[serde(default = "one_default")]
    pub thread_number: usize,
    #[serde(default = "log_base_default")]
    pub log_base: String,
    #[serde(default = "log_suffix_default")]
    pub log_suffix: String,
    #[serde(default = "log_level_default")]
    pub log_level: String,
    #[serde(default = "true_default")]
    pub display_colorful: bool,
    #[serde(default = "false_default")]
    pub keep_trace: bool,
    #[serde(default = "empty_string")]
    pub save_exp: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Data {
    #[serde(default = "instance_default")]
    pub instance: String,
    #[serde(default = "empty_string")]
    pub output: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GA {
    #[serde(default = "pop_size_default")]
    pub population_size: u32,
    #[serde(default = "max_epochs_default")]
    pub max_epochs: usize,
    #[serde(default = "mutation_rate_default")]
    pub mutation_rate: f64,
    #[serde(default = "ga_elite_pct_default")]
    pub select_elite_pct: f64,
}

// Default section definitions

impl Default for General {
    fn default() -> Self {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }
}

impl Default for Data {
    fn default() -> Self {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }
}

impl Default for GA {
    fn default() -> Self {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }
}

impl Default for Param {
    fn default() -> Self {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }
}

impl Param {
    pub fn new() -> Self {
        Self::default()
    }
}

pub fn get(param_file: String) -> Result<Param, Box<dyn Error>> {
    let param_file_reader = File::open(param_file)?;
    let param_reader = BufReader::new(param_file_reader);

    let mut config: Param = serde_yaml::from_reader(param_reader)?;

    validate(&mut config)?;

    Ok(config)
}

pub fn validate(param: &mut Param) -> Result<(), String> {
    if !param.general.log_base.is_empty() {
        param.general.display_colorful = false;
    }

    if param.general.thread_number == 0 {
        return Err("Invalid thread_number=0. Must be >= 1.".to_string());
    }

    validate_ga(param)
}

fn validate_ga(param: &mut Param) -> Result<(), String> {
    if param.ga.population_size == 0 {
        return Err("Invalid population_size=0. Must be >= 1.".to_string());
    }

    if !(0.0..=1.0).contains(&param.ga.mutation_rate) {
        return Err(format!(
            "Invalid mutation_rate={:.3}. Must be in range [0, 1].",
            param.ga.mutation_rate
        ));
    }

    if !(param.ga.select_elite_pct > 0.0 && param.ga.select_elite_pct <= 100.0) {
        return Err(format!(
            "Invalid select_elite_pct={:.3}. Must be in range (0, 100].",
            param.ga.select_elite_pct
        ));
    }

    if param.ga.population_size < 2 {
        warn!("population_size=1: the only individual will be kept and never recombined.");
    } else if elite_size(param.ga.population_size as usize, param.ga.select_elite_pct) < 2 {
        warn!("Fewer than 2 elite individuals: children will be mutated clones of a single parent.");
    }

    if param.ga.max_epochs == 0 {
        warn!("max_epochs=0: the best individual of the initial population will be returned.");
    }

    Ok(())
}

/// Number of individuals kept as survivors and parents, at least one
pub fn elite_size(population_size: usize, select_elite_pct: f64) -> usize {
    let n = (population_size as f64 * select_elite_pct / 100.0) as usize;
    n.clamp(1, population_size.max(1))
}

// Default value definitions

fn seed_default() -> u64 {
    4815162342
}
fn empty_string() -> String {
    "".to_string()
}
fn instance_default() -> String {
    "samples/instance.yaml".to_string()
}
fn max_epochs_default() -> usize {
    1000
}
fn log_base_default() -> String {
    "".to_string()
}
fn log_suffix_default() -> String {
    "log".to_string()
}
fn log_level_default() -> String {
    "info".to_string()
}
fn one_default() -> usize {
    1
}
fn pop_size_default() -> u32 {
    50
}
fn mutation_rate_default() -> f64 {
    0.1
}
fn ga_elite_pct_default() -> f64 {
    50.0
}
fn false_default() -> bool {
    false
}
fn true_default() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let param = Param::default();
        assert_eq!(param.general.seed, 4815162342);
        assert_eq!(param.general.thread_number, 1);
        assert_eq!(param.ga.population_size, 50);
        assert_eq!(param.ga.max_epochs, 1000);
        assert_eq!(param.ga.mutation_rate, 0.1);
        assert_eq!(param.ga.select_elite_pct, 50.0);
        assert!(param.data.output.is_empty());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "
general:
  seed: 42
ga:
  population_size: 10
";
        let param: Param = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(param.general.seed, 42);
        assert_eq!(param.ga.population_size, 10);
        assert_eq!(param.ga.max_epochs, 1000);
        assert_eq!(param.general.log_level, "info");
    }

    #[test]
    fn test_validate_rejects_invalid_values() {
        let mut param = Param::default();
        param.ga.population_size = 0;
        assert!(validate(&mut param).is_err());

        let mut param = Param::default();
        param.ga.mutation_rate = 1.5;
        assert!(validate(&mut param).is_err());

        let mut param = Param::default();
        param.ga.mutation_rate = -0.1;
        assert!(validate(&mut param).is_err());

        let mut param = Param::default();
        param.ga.mutation_rate = f64::NAN;
        assert!(validate(&mut param).is_err());

        let mut param = Param::default();
        param.ga.select_elite_pct = 0.0;
        assert!(validate(&mut param).is_err());

        let mut param = Param::default();
        param.general.thread_number = 0;
        assert!(validate(&mut param).is_err());
    }

    #[test]
    fn test_validate_accepts_edge_values() {
        let mut param = Param::default();
        param.ga.population_size = 1;
        param.ga.max_epochs = 0;
        param.ga.mutation_rate = 1.0;
        assert!(validate(&mut param).is_ok());

        param.ga.mutation_rate = 0.0;
        assert!(validate(&mut param).is_ok());
    }

    #[test]
    fn test_log_file_disables_colors() {
        let mut param = Param::default();
        param.general.log_base = "arrango".to_string();
        validate(&mut param).unwrap();
        assert!(!param.general.display_colorful);
    }

    #[test]
    fn test_elite_size() {
        assert_eq!(elite_size(10, 50.0), 5);
        assert_eq!(elite_size(11, 50.0), 5);
        assert_eq!(elite_size(3, 50.0), 1);
        assert_eq!(elite_size(1, 50.0), 1);
        assert_eq!(elite_size(10, 100.0), 10);
    }

    #[test]
    fn test_get_reads_and_validates() {
        let path = "test_get_reads_and_validates.yaml";
        std::fs::write(path, "ga:\n  mutation_rate: 2.0\n").unwrap();
        let result = get(path.to_string());
        std::fs::remove_file(path).unwrap();
        assert!(result.is_err());
    }
}
