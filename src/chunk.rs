use crate::instance::{Division, Subject};

/// An indivisible block of consecutive hours of one subject.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Chunk<'a> {
    pub subject: &'a Subject,
    pub size: u32,
}

/// Lists the blocks a division must place, one per non-zero allocation entry,
/// in subject order then allocation order.
pub fn extract_chunks(division: &Division) -> Vec<Chunk<'_>> {
    division
        .subjects
        .iter()
        .flat_map(|subject| {
            subject
                .allocation
                .iter()
                .filter(|&&size| size > 0)
                .map(move |&size| Chunk { subject, size })
        })
        .collect()
}
