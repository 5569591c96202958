//! Core domain types for Proofdesk.
//!
//! - [`proof`] - Proof records, lifecycle status, issuer classification
//! - [`merchant`] - Merchant directory entries and API-key metadata
//! - [`audit`] - Append-only audit events

mod audit;
mod merchant;
mod proof;

pub use audit::*;
pub use merchant::*;
pub use proof::*;

/// Alphabet for short public identifiers. Lowercase plus digits, with the
/// ambiguous characters (0/o, 1/l/i) removed so the ids survive being read
/// aloud or retyped from a printed label.
const ID_ALPHABET: &[u8] = b"23456789abcdefghjkmnpqrstuvwxyz";

/// Generate a random identifier of `len` characters from [`ID_ALPHABET`].
pub(crate) fn random_id(len: usize) -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| {
            let idx = rng.gen_range(0..ID_ALPHABET.len());
            ID_ALPHABET[idx] as char
        })
        .collect()
}
