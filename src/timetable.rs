use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;

use crate::instance::{Classroom, GlobalSubject, Group, Teacher, WEEKDAYS};

/// Maximum number of lessons taught in parallel during one period
pub const PARALLEL_LESSONS: usize = 3;

/// One lesson of a period. A lesson without subject is an unused parallel position.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Lesson {
    #[serde(default)]
    pub global_subject: Option<GlobalSubject>,
    #[serde(default)]
    pub teacher: Option<Teacher>,
    #[serde(default)]
    pub classroom: Option<Classroom>,
    #[serde(default)]
    pub group: Option<Group>,
}

impl Lesson {
    pub fn is_empty(&self) -> bool {
        self.global_subject.is_none()
    }
}

/// Parallel lessons of a single period
pub type SlotGroup = [Lesson; PARALLEL_LESSONS];
/// Periods of a day, in order
pub type Day = Vec<SlotGroup>;
/// A division's week, Monday to Friday
pub type Days = [Day; WEEKDAYS];

/// Builds a period holding a single lesson in its first position
pub fn single_slot(lesson: Lesson) -> SlotGroup {
    [lesson, Lesson::default(), Lesson::default()]
}

/// Number of periods of each weekday
pub fn day_loads(days: &Days) -> [usize; WEEKDAYS] {
    let mut loads = [0; WEEKDAYS];
    for (load, day) in loads.iter_mut().zip(days.iter()) {
        *load = day.len();
    }
    loads
}

/// Timetables handed to the outside world, one per division
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Output {
    pub timetables: Vec<Days>,
}

impl Output {
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Output, Box<dyn Error>> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lesson(subject: &str, teacher: &str) -> Lesson {
        Lesson {
            global_subject: Some(subject.into()),
            teacher: Some(teacher.into()),
            classroom: None,
            group: Some(Group::Whole),
        }
    }

    #[test]
    fn test_day_loads() {
        let mut days: Days = Default::default();
        days[0].push(single_slot(lesson("math", "LJ")));
        days[0].push(single_slot(lesson("math", "LJ")));
        days[3].push(single_slot(lesson("history", "Kc")));
        assert_eq!(day_loads(&days), [2, 0, 0, 1, 0]);
    }

    #[test]
    fn test_single_slot_fills_first_position() {
        let slot = single_slot(lesson("math", "LJ"));
        assert!(!slot[0].is_empty());
        assert!(slot[1].is_empty());
        assert!(slot[2].is_empty());
    }

    #[test]
    fn test_output_json_layout() {
        let mut days: Days = Default::default();
        days[1].push(single_slot(lesson("math", "LJ")));
        let output = Output { timetables: vec![days] };

        let value = serde_json::to_value(&output).unwrap();
        let week = value["timetables"][0].as_array().unwrap();
        assert_eq!(week.len(), WEEKDAYS);
        assert_eq!(week[1][0][0]["global_subject"], "math");
        assert_eq!(week[1][0][0]["group"], "none");
        assert!(week[1][0][1]["global_subject"].is_null());

        let path = "test_output_json_layout.json";
        output.save_json(path).unwrap();
        let loaded = Output::load_json(path);
        std::fs::remove_file(path).unwrap();
        assert_eq!(loaded.unwrap(), output);
    }
}
