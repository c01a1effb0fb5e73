use crate::fitness::FitnessReport;
use crate::ga::Evolution;
use crate::individual::Individual;
use crate::instance::Instance;
use crate::param::Param;
use crate::population::EpochStats;
use crate::timetable::Output;
use log::warn;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;

/// Complete record of a scheduling run
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Experiment {
    pub id: String,
    pub version: String,
    pub timestamp: String,
    /// SHA-256 of the instance the timetables were built for
    pub instance_digest: String,
    pub parameters: Param,

    pub best: Individual,
    pub report: FitnessReport,
    pub generations: usize,
    pub history: Vec<EpochStats>,

    pub execution_time: f64,
    pub interrupted: bool,
}

impl Experiment {
    pub fn new(
        instance: &Instance,
        param: &Param,
        evolution: Evolution,
        timestamp: String,
        execution_time: f64,
    ) -> Experiment {
        let report = evolution.best.evaluate(instance);
        let stem = Path::new(&param.general.save_exp)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("arrango");

        Experiment {
            id: format!("{}_ga_{}", stem, timestamp),
            version: version(),
            timestamp,
            instance_digest: instance.digest(),
            parameters: param.clone(),
            best: evolution.best,
            report,
            generations: evolution.generations,
            history: evolution.history,
            execution_time,
            interrupted: evolution.interrupted,
        }
    }

    /// Timetables in the exchange format
    pub fn to_output(&self) -> Output {
        Output {
            timetables: self.best.timetables.clone(),
        }
    }

    /// Whether this experiment was computed for the given instance
    pub fn matches(&self, instance: &Instance) -> bool {
        self.instance_digest == instance.digest()
    }

    pub fn display_results(&self, instance: &Instance) -> String {
        let status = if self.report.score() == 0 {
            "\x1b[1;92mperfect\x1b[0m"
        } else if self.report.is_feasible() {
            "\x1b[1;93mfeasible, unbalanced\x1b[0m"
        } else {
            "\x1b[1;91minfeasible\x1b[0m"
        };

        let mut str = format!(
            "Best timetable after {} generations ({:.2}s{}): score {} [{}]",
            self.generations,
            self.execution_time,
            if self.interrupted { ", interrupted" } else { "" },
            self.report.score(),
            status
        );
        str = format!(
            "{}\n  teacher overlaps {} | classroom overlaps {} | missing hours {} | day spread over tolerance {}",
            str,
            self.report.teacher_overlaps,
            self.report.classroom_overlaps,
            self.report.missing_hours,
            self.report.imbalance
        );
        for (division, loads) in instance.divisions.iter().zip(self.best.day_loads()) {
            str = format!("{}\n  {} day loads {:?}", str, division.name, loads);
        }
        str
    }

    /// Saves in the format given by the extension, JSON (with a `.json`
    /// extension) when it is not recognised
    pub fn save_auto<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn Error>> {
        let path = path.as_ref();
        match Format::from_path(path) {
            Some(format) => self.save_as(format, path),
            None => {
                warn!("Unknown experiment format for {:?}, saving as json", path);
                self.save_as(Format::Json, &path.with_extension("json"))
            }
        }
    }

    /// Loads in the format given by the extension. Otherwise tries bincode,
    /// which rejects text, then JSON and YAML.
    pub fn load_auto<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let path = path.as_ref();
        if let Some(format) = Format::from_path(path) {
            return Self::load_as(format, path);
        }
        [Format::Bincode, Format::Json, Format::Yaml]
            .into_iter()
            .find_map(|format| Self::load_as(format, path).ok())
            .ok_or_else(|| format!("Unable to load an experiment from {:?}", path).into())
    }

    fn save_as(&self, format: Format, path: &Path) -> Result<(), Box<dyn Error>> {
        let bytes = match format {
            Format::Json => serde_json::to_vec_pretty(self)?,
            Format::Yaml => serde_yaml::to_string(self)?.into_bytes(),
            Format::Bincode => bincode::serialize(self)?,
        };
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn load_as(format: Format, path: &Path) -> Result<Self, Box<dyn Error>> {
        let bytes = std::fs::read(path)?;
        let experiment: Experiment = match format {
            Format::Json => serde_json::from_slice(&bytes)?,
            Format::Yaml => serde_yaml::from_slice(&bytes)?,
            Format::Bincode => bincode::deserialize(&bytes)?,
        };
        Ok(experiment)
    }
}

/// On-disk encodings of an experiment
#[derive(Clone, Copy, Debug, PartialEq)]
enum Format {
    Json,
    Yaml,
    /// Compact, Rust-only
    Bincode,
}

impl Format {
    fn from_path(path: &Path) -> Option<Format> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Format::Json),
            "yaml" | "yml" => Some(Format::Yaml),
            "bin" | "bincode" => Some(Format::Bincode),
            _ => None,
        }
    }
}

/// Crate version with the git revision when known at build time
pub fn version() -> String {
    format!(
        "{}#{}",
        env!("CARGO_PKG_VERSION"),
        option_env!("ARRANGO_GIT_SHA").unwrap_or("unknown")
    )
}
