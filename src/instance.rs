use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::error::Error;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use crate::chunk::extract_chunks;

/// Number of teaching days in a week (Monday to Friday)
pub const WEEKDAYS: usize = 5;

//-----------------------------------------------------------------------------
// Catalog identifiers
//-----------------------------------------------------------------------------

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Arc<str>);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                $name(Arc::from(value))
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                $name(Arc::from(value))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

identifier!(
    /// A subject of the school catalog (e.g. "matematyka")
    GlobalSubject
);
identifier!(
    /// A teacher identified by its short code
    Teacher
);
identifier!(
    /// A classroom identified by its room code
    Classroom
);

/// Where a subject would rather be placed in a day. Kept in the model but not
/// used by the builder nor the fitness yet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    #[default]
    Any,
    Edges,
    Middle,
}

/// Parallel sub-group of a division a requirement belongs to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Group {
    /// Whole division, not split
    #[default]
    #[serde(rename = "none")]
    Whole,
    One,
    Two,
    Three,
}

//-----------------------------------------------------------------------------
// Problem instance
//-----------------------------------------------------------------------------

/// A subject requirement within a division
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub global_subject: GlobalSubject,
    /// Sizes of the consecutive-hour blocks to place in the week. A zero entry is ignored.
    #[serde(default, deserialize_with = "allocation_from_seq")]
    pub allocation: [u32; WEEKDAYS],
    #[serde(default)]
    pub placement: Placement,
    #[serde(default)]
    pub teacher: Option<Teacher>,
    /// Acceptable classrooms, empty means unconstrained
    #[serde(default)]
    pub classrooms: Vec<Classroom>,
    #[serde(default)]
    pub group: Group,
}

impl Subject {
    pub fn new(global_subject: &str, allocation: [u32; WEEKDAYS]) -> Subject {
        Subject {
            global_subject: GlobalSubject::from(global_subject),
            allocation,
            placement: Placement::Any,
            teacher: None,
            classrooms: Vec::new(),
            group: Group::Whole,
        }
    }

    pub fn with_teacher(mut self, teacher: &str) -> Subject {
        self.teacher = Some(Teacher::from(teacher));
        self
    }

    pub fn with_classrooms(mut self, classrooms: &[&str]) -> Subject {
        self.classrooms = classrooms.iter().map(|c| Classroom::from(*c)).collect();
        self
    }

    pub fn with_group(mut self, group: Group) -> Subject {
        self.group = group;
        self
    }

    pub fn weekly_hours(&self) -> u32 {
        self.allocation.iter().sum()
    }
}

/// A cohort of students with its own weekly requirements
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Division {
    pub name: String,
    /// Relative importance of the division, informative only
    #[serde(default)]
    pub weight: u32,
    #[serde(default)]
    pub subjects: Vec<Subject>,
}

impl Division {
    pub fn new(name: &str, subjects: Vec<Subject>) -> Division {
        Division {
            name: name.to_string(),
            weight: 1,
            subjects,
        }
    }

    pub fn weekly_hours(&self) -> u32 {
        self.subjects.iter().map(Subject::weekly_hours).sum()
    }
}

/// The whole scheduling universe, read-only during a run
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    #[serde(default)]
    pub global_subjects: Vec<GlobalSubject>,
    #[serde(default)]
    pub classrooms: Vec<Classroom>,
    #[serde(default)]
    pub teachers: Vec<Teacher>,
    #[serde(default)]
    pub divisions: Vec<Division>,
}

impl Instance {
    pub fn new() -> Instance {
        Instance::default()
    }

    /// Loads an instance from a YAML or JSON file, chosen by extension.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Instance, Box<dyn Error>> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        let instance: Instance = match ext.as_str() {
            "json" => serde_json::from_reader(BufReader::new(File::open(path)?))?,
            "yaml" | "yml" => serde_yaml::from_reader(BufReader::new(File::open(path)?))?,
            _ => {
                let content = std::fs::read_to_string(path)?;
                match serde_yaml::from_str(&content) {
                    Ok(instance) => instance,
                    Err(_) => serde_json::from_str(&content)?,
                }
            }
        };

        instance.check()?;
        Ok(instance)
    }

    /// Checks that divisions only reference declared catalog entries.
    /// An empty catalog disables the check for its kind.
    pub fn check(&self) -> Result<(), String> {
        let subjects: HashSet<&GlobalSubject> = self.global_subjects.iter().collect();
        let teachers: HashSet<&Teacher> = self.teachers.iter().collect();
        let classrooms: HashSet<&Classroom> = self.classrooms.iter().collect();

        for division in &self.divisions {
            for subject in &division.subjects {
                if !subjects.is_empty() && !subjects.contains(&subject.global_subject) {
                    return Err(format!(
                        "Division '{}' requires unknown subject '{}'",
                        division.name, subject.global_subject
                    ));
                }
                if let Some(teacher) = &subject.teacher {
                    if !teachers.is_empty() && !teachers.contains(teacher) {
                        return Err(format!(
                            "Division '{}' assigns unknown teacher '{}' to '{}'",
                            division.name, teacher, subject.global_subject
                        ));
                    }
                }
                for classroom in &subject.classrooms {
                    if !classrooms.is_empty() && !classrooms.contains(classroom) {
                        return Err(format!(
                            "Division '{}' allows unknown classroom '{}' for '{}'",
                            division.name, classroom, subject.global_subject
                        ));
                    }
                }
            }

            if extract_chunks(division).is_empty() {
                warn!("Division '{}' has no hour to place", division.name);
            }
        }

        Ok(())
    }

    pub fn total_hours(&self) -> u32 {
        self.divisions.iter().map(Division::weekly_hours).sum()
    }

    /// SHA-256 of the canonical JSON form, used to tie results to their input
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        // Plain data with string keys cannot fail to serialize
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        hasher.update(&canonical);
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Instance: {} divisions, {} subjects, {} teachers, {} classrooms, {} weekly hours",
            self.divisions.len(),
            self.global_subjects.len(),
            self.teachers.len(),
            self.classrooms.len(),
            self.total_hours()
        )
    }
}

/// Accepts up to five block sizes and pads the rest with zeros
fn allocation_from_seq<'de, D>(deserializer: D) -> Result<[u32; WEEKDAYS], D::Error>
where
    D: Deserializer<'de>,
{
    let values: Vec<u32> = Vec::deserialize(deserializer)?;
    if values.len() > WEEKDAYS {
        return Err(serde::de::Error::invalid_length(
            values.len(),
            &"at most 5 allocation entries",
        ));
    }
    let mut allocation = [0; WEEKDAYS];
    allocation[..values.len()].copy_from_slice(&values);
    Ok(allocation)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_instance() -> Instance {
        Instance {
            global_subjects: vec!["math".into(), "history".into()],
            classrooms: vec!["14".into(), "44".into()],
            teachers: vec!["LJ".into(), "Kc".into()],
            divisions: vec![Division::new(
                "1A",
                vec![
                    Subject::new("math", [2, 1, 0, 0, 0])
                        .with_teacher("LJ")
                        .with_classrooms(&["14"]),
                    Subject::new("history", [1, 0, 0, 0, 0])
                        .with_teacher("Kc")
                        .with_classrooms(&["44"]),
                ],
            )],
        }
    }

    #[test]
    fn test_short_allocation_is_padded() {
        let yaml = "
global_subject: math
allocation: [4, 4]
teacher: LJ
group: two
";
        let subject: Subject = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(subject.allocation, [4, 4, 0, 0, 0]);
        assert_eq!(subject.group, Group::Two);
        assert_eq!(subject.placement, Placement::Any);
        assert!(subject.classrooms.is_empty());
        assert_eq!(subject.teacher, Some(Teacher::from("LJ")));
    }

    #[test]
    fn test_too_long_allocation_is_rejected() {
        let yaml = "
global_subject: math
allocation: [1, 1, 1, 1, 1, 1]
";
        assert!(serde_yaml::from_str::<Subject>(yaml).is_err());
    }

    #[test]
    fn test_group_none_keyword() {
        let group: Group = serde_yaml::from_str("none").unwrap();
        assert_eq!(group, Group::Whole);
        assert_eq!(serde_json::to_string(&Group::Whole).unwrap(), "\"none\"");
        let placement: Placement = serde_yaml::from_str("middle").unwrap();
        assert_eq!(placement, Placement::Middle);
    }

    #[test]
    fn test_identifiers_compare_by_value() {
        let a = Teacher::from("LJ");
        let b = Teacher::from(String::from("LJ"));
        assert_eq!(a, b);
        assert!(!Arc::ptr_eq(&a.0, &b.0));
    }

    #[test]
    fn test_check_accepts_declared_references() {
        assert!(create_test_instance().check().is_ok());
    }

    #[test]
    fn test_check_rejects_unknown_teacher() {
        let mut instance = create_test_instance();
        instance.divisions[0].subjects[0].teacher = Some("XX".into());
        let err = instance.check().unwrap_err();
        assert!(err.contains("XX"), "unexpected error: {}", err);
    }

    #[test]
    fn test_check_skips_empty_catalogs() {
        let mut instance = create_test_instance();
        instance.teachers.clear();
        instance.classrooms.clear();
        instance.global_subjects.clear();
        instance.divisions[0].subjects[0].teacher = Some("XX".into());
        assert!(instance.check().is_ok());
    }

    #[test]
    fn test_hours_and_digest() {
        let instance = create_test_instance();
        assert_eq!(instance.total_hours(), 4);
        assert_eq!(instance.digest(), instance.clone().digest());
        assert_eq!(instance.digest().len(), 64);

        let mut other = instance.clone();
        other.divisions[0].subjects[1].allocation = [2, 0, 0, 0, 0];
        assert_ne!(instance.digest(), other.digest());
    }

    #[test]
    fn test_load_yaml_file() {
        let path = "test_load_yaml_file.yaml";
        std::fs::write(path, serde_yaml::to_string(&create_test_instance()).unwrap()).unwrap();
        let loaded = Instance::load(path);
        std::fs::remove_file(path).unwrap();
        assert_eq!(loaded.unwrap(), create_test_instance());
    }
}
