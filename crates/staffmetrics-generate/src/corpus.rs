//! Text drawn from the `fake` English corpora.

use fake::Fake;
use fake::faker::lorem::en::{Paragraph, Sentence};
use fake::faker::name::en::{FirstName, LastName};
use rand::Rng;

pub fn first_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    FirstName().fake_with_rng(rng)
}

pub fn last_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    LastName().fake_with_rng(rng)
}

/// One lorem sentence, used for attendance notes.
pub fn sentence<R: Rng + ?Sized>(rng: &mut R) -> String {
    Sentence(4..10).fake_with_rng(rng)
}

/// One lorem paragraph, used for review comments.
pub fn paragraph<R: Rng + ?Sized>(rng: &mut R) -> String {
    Paragraph(3..6).fake_with_rng(rng)
}

/// `first.last@example.com`, lowercased with anything outside `[a-z0-9-]`
/// dropped from each part.
pub fn email_for(first: &str, last: &str) -> String {
    format!("{}.{}@example.com", local_part(first), local_part(last))
}

fn local_part(name: &str) -> String {
    name.chars()
        .flat_map(char::to_lowercase)
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '-')
        .collect()
}
