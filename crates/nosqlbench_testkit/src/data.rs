//! Random bench data.

use nosqlbench_core::{FieldValue, Fields};
use rand::Rng;

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Generates a lowercase word of 3 to 8 letters.
pub fn random_word<R: Rng + ?Sized>(rng: &mut R) -> String {
    let len = rng.gen_range(3..=8);
    (0..len)
        .map(|_| char::from(LETTERS[rng.gen_range(0..LETTERS.len())]))
        .collect()
}

/// Generates a non-negative number below one million.
pub fn random_number<R: Rng + ?Sized>(rng: &mut R) -> i64 {
    rng.gen_range(0..1_000_000)
}

/// Generates the `{number, text}` fields the insert and query
/// workloads use.
pub fn random_fields<R: Rng + ?Sized>(rng: &mut R) -> Fields {
    let mut fields = Fields::new();
    fields.insert("number".to_string(), FieldValue::Integer(random_number(rng)));
    fields.insert("text".to_string(), FieldValue::Text(random_word(rng)));
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_are_lowercase() {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let word = random_word(&mut rng);
            assert!((3..=8).contains(&word.len()));
            assert!(word.bytes().all(|b| b.is_ascii_lowercase()));
        }
    }

    #[test]
    fn fields_shape() {
        let fields = random_fields(&mut rand::thread_rng());
        assert!(fields["number"].as_integer().is_some());
        assert!(fields["text"].as_text().is_some());
    }
}
