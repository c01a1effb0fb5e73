use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::chunk::extract_chunks;
use crate::fitness::{self, FitnessReport};
use crate::instance::{Classroom, Instance, Subject, WEEKDAYS};
use crate::timetable::{day_loads, single_slot, Days, Lesson};

/// Score of an individual that has not been evaluated yet
pub const UNFIT: u64 = u64::MAX;

/// A candidate solution: one week timetable per division
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    pub timetables: Vec<Days>,
    /// Penalty score, lower is better and 0 is perfect
    pub fit: u64,
    /// Generation this individual was created in
    pub epoch: usize,
    pub hash: u64,
    pub parents: Option<Vec<u64>>,
}

impl Individual {
    /// Generates an empty Individual with no division
    pub fn new() -> Individual {
        Individual {
            timetables: Vec::new(),
            fit: UNFIT,
            epoch: 0,
            hash: 0,
            parents: None,
        }
    }

    /// Builds a random but structurally valid Individual.
    ///
    /// For every division the blocks are appended one after the other to the
    /// least loaded weekday (first one on ties), so a block always occupies
    /// consecutive periods and no day has holes. Only the classroom of each
    /// period is random.
    ///
    /// # Arguments
    ///
    /// * `instance` - The problem to build a timetable for.
    /// * `rng` - Random number generator.
    pub fn random(instance: &Instance, rng: &mut ChaCha8Rng) -> Individual {
        let mut individual = Individual::new();

        for division in &instance.divisions {
            let mut days: Days = Default::default();

            for chunk in extract_chunks(division) {
                let day = least_loaded_day(&days);
                for _ in 0..chunk.size {
                    days[day].push(single_slot(Lesson {
                        global_subject: Some(chunk.subject.global_subject.clone()),
                        teacher: chunk.subject.teacher.clone(),
                        classroom: pick_classroom(chunk.subject, rng),
                        group: Some(chunk.subject.group),
                    }));
                }
            }

            individual.timetables.push(days);
        }

        individual.compute_hash();
        individual
    }

    /// Generates a child inheriting the timetables of its main parent
    pub fn child(main_parent: &Individual) -> Individual {
        let mut i = Individual::new();
        i.timetables = main_parent.timetables.clone();
        i
    }

    /// Computes the penalty details of this Individual
    pub fn evaluate(&self, instance: &Instance) -> FitnessReport {
        fitness::evaluate(&self.timetables, instance)
    }

    /// Updates the score of this Individual
    pub fn fit(&mut self, instance: &Instance) {
        self.fit = fitness::score(&self.timetables, instance);
    }

    pub fn compute_hash(&mut self) {
        let mut hasher = DefaultHasher::new();
        self.timetables.hash(&mut hasher);
        self.hash = hasher.finish();
    }

    /// Number of placed lessons per division and weekday
    pub fn day_loads(&self) -> Vec<[usize; WEEKDAYS]> {
        self.timetables.iter().map(day_loads).collect()
    }

    /// Renders the week of each division as text, one line per weekday
    pub fn display(&self, instance: &Instance) -> String {
        const DAY_NAMES: [&str; WEEKDAYS] = ["Mon", "Tue", "Wed", "Thu", "Fri"];
        let mut str = String::new();

        for (d, days) in self.timetables.iter().enumerate() {
            let name = instance
                .divisions
                .get(d)
                .map(|division| division.name.as_str())
                .unwrap_or("?");
            str = format!("{}\n\x1b[1;93m{}\x1b[0m", str, name);

            for (day, periods) in days.iter().enumerate() {
                let periods: Vec<String> = periods
                    .iter()
                    .map(|slot_group| {
                        slot_group
                            .iter()
                            .filter(|l| !l.is_empty())
                            .map(display_lesson)
                            .collect::<Vec<String>>()
                            .join(" | ")
                    })
                    .collect();
                str = format!("{}\n  {} {}", str, DAY_NAMES[day], periods.join(", "));
            }
        }
        str
    }
}

impl Default for Individual {
    fn default() -> Self {
        Individual::new()
    }
}

impl fmt::Display for Individual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Individual #{:016x} fit {} born at epoch {} | day loads {:?}",
            self.hash,
            self.fit,
            self.epoch,
            self.day_loads()
        )
    }
}

/// Weekday with the fewest periods, the first one on ties
pub fn least_loaded_day(days: &Days) -> usize {
    let mut min_day = 0;
    for day in 1..WEEKDAYS {
        if days[day].len() < days[min_day].len() {
            min_day = day;
        }
    }
    min_day
}

/// Picks one of the acceptable classrooms, none when unconstrained
pub fn pick_classroom(subject: &Subject, rng: &mut ChaCha8Rng) -> Option<Classroom> {
    subject.classrooms.choose(rng).cloned()
}

fn display_lesson(lesson: &Lesson) -> String {
    let mut str = lesson
        .global_subject
        .as_ref()
        .map(|s| s.to_string())
        .unwrap_or_default();
    if let Some(teacher) = &lesson.teacher {
        str = format!("{} ({})", str, teacher);
    }
    if let Some(classroom) = &lesson.classroom {
        str = format!("{} @{}", str, classroom);
    }
    str
}
