use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::chunk::extract_chunks;
use crate::instance::{Classroom, Instance, Teacher};
use crate::timetable::{day_loads, Days};

pub const TEACHER_OVERLAP_PENALTY: u64 = 1000;
pub const CLASSROOM_OVERLAP_PENALTY: u64 = 1000;
pub const MISSING_HOUR_PENALTY: u64 = 500;
pub const IMBALANCE_PENALTY: u64 = 5;
/// Largest day-load spread tolerated within a division
pub const IMBALANCE_TOLERANCE: usize = 4;

/// Violations found in a set of timetables
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitnessReport {
    /// Extra lessons given by an already busy teacher
    pub teacher_overlaps: u64,
    /// Extra lessons held in an already busy classroom
    pub classroom_overlaps: u64,
    /// Required hours not found in the timetable
    pub missing_hours: u64,
    /// Sum of day-load spreads of the divisions exceeding the tolerance
    pub imbalance: u64,
}

impl FitnessReport {
    /// Weighted score, 0 being a feasible and balanced timetable
    pub fn score(&self) -> u64 {
        self.teacher_overlaps * TEACHER_OVERLAP_PENALTY
            + self.classroom_overlaps * CLASSROOM_OVERLAP_PENALTY
            + self.missing_hours * MISSING_HOUR_PENALTY
            + self.imbalance * IMBALANCE_PENALTY
    }

    pub fn is_feasible(&self) -> bool {
        self.teacher_overlaps == 0 && self.classroom_overlaps == 0 && self.missing_hours == 0
    }
}

/// Scores the timetables of every division against the instance.
///
/// Gaps inside a day are not checked: the builder and the genetic operators
/// never create them.
pub fn evaluate(timetables: &[Days], instance: &Instance) -> FitnessReport {
    let mut report = FitnessReport::default();

    let (teacher_overlaps, classroom_overlaps) = count_overlaps(timetables);
    report.teacher_overlaps = teacher_overlaps;
    report.classroom_overlaps = classroom_overlaps;

    for (d, division) in instance.divisions.iter().enumerate() {
        let mut remaining: Vec<(&_, &Option<Teacher>, u64)> = extract_chunks(division)
            .into_iter()
            .map(|c| (&c.subject.global_subject, &c.subject.teacher, c.size as u64))
            .collect();

        if let Some(days) = timetables.get(d) {
            for lesson in days.iter().flatten().flatten() {
                let Some(subject) = &lesson.global_subject else {
                    continue;
                };
                // a placed hour only counts for one block
                if let Some(block) = remaining.iter_mut().find(|(s, t, left)| {
                    *left > 0 && *s == subject && *t == &lesson.teacher
                }) {
                    block.2 -= 1;
                }
            }
        }

        report.missing_hours += remaining.iter().map(|(_, _, left)| left).sum::<u64>();
    }

    for days in timetables {
        report.imbalance += imbalance(days);
    }

    report
}

/// Shortcut for the weighted score
pub fn score(timetables: &[Days], instance: &Instance) -> u64 {
    evaluate(timetables, instance).score()
}

/// Counts teacher and classroom double bookings at the same weekday and period,
/// across all divisions and parallel positions.
fn count_overlaps(timetables: &[Days]) -> (u64, u64) {
    let mut teachers: HashMap<(usize, usize), HashSet<&Teacher>> = HashMap::new();
    let mut classrooms: HashMap<(usize, usize), HashSet<&Classroom>> = HashMap::new();
    let mut teacher_overlaps = 0;
    let mut classroom_overlaps = 0;

    for days in timetables {
        for (day, periods) in days.iter().enumerate() {
            for (period, slot_group) in periods.iter().enumerate() {
                for lesson in slot_group.iter().filter(|l| !l.is_empty()) {
                    if let Some(teacher) = &lesson.teacher {
                        if !teachers.entry((day, period)).or_default().insert(teacher) {
                            teacher_overlaps += 1;
                        }
                    }
                    if let Some(classroom) = &lesson.classroom {
                        if !classrooms.entry((day, period)).or_default().insert(classroom) {
                            classroom_overlaps += 1;
                        }
                    }
                }
            }
        }
    }

    (teacher_overlaps, classroom_overlaps)
}

/// Day-load spread of a division when above tolerance, 0 otherwise
fn imbalance(days: &Days) -> u64 {
    let loads = day_loads(days);
    let max = loads.iter().copied().max().unwrap_or(0);
    let min = loads.iter().copied().min().unwrap_or(0);
    if max - min > IMBALANCE_TOLERANCE {
        (max - min) as u64
    } else {
        0
    }
}
