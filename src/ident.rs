//! Deterministic, collision-checked identifier minting.

use std::collections::HashSet;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use uuid::Builder as UuidBuilder;

/// Mints function names and link names from two disjoint classes.
///
/// Seeded for reproducibility: the same seed and the same sequence of
/// `fresh_*` calls always produces the same names.
#[derive(Debug)]
pub struct IdentMint {
    rng: ChaCha8Rng,
    function_names: HashSet<Box<str>>,
    link_names: HashSet<Box<str>>,
}

impl IdentMint {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            function_names: HashSet::new(),
            link_names: HashSet::new(),
        }
    }

    fn next_uuid(&mut self) -> uuid::Uuid {
        let mut bytes = [0u8; 16];
        self.rng.fill_bytes(&mut bytes);
        UuidBuilder::from_random_bytes(bytes).into_uuid()
    }

    /// A name that has never previously been returned by `fresh_function_name`
    /// or `fresh_link_name` on this mint.
    pub fn fresh_function_name(&mut self) -> Box<str> {
        loop {
            let candidate: Box<str> = format!("func_{}", self.next_uuid()).into_boxed_str();
            if !self.function_names.contains(&candidate) && !self.link_names.contains(&candidate) {
                self.function_names.insert(candidate.clone());
                log::debug!("minted function name {candidate}");
                return candidate;
            }
        }
    }

    /// A name that has never previously been returned by `fresh_function_name`
    /// or `fresh_link_name` on this mint.
    pub fn fresh_link_name(&mut self) -> Box<str> {
        loop {
            let candidate: Box<str> = format!("link_{}", self.next_uuid()).into_boxed_str();
            if !self.function_names.contains(&candidate) && !self.link_names.contains(&candidate) {
                self.link_names.insert(candidate.clone());
                log::debug!("minted link name {candidate}");
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_for_fixed_seed() {
        let mut a = IdentMint::new(123);
        let mut b = IdentMint::new(123);

        let fa: Vec<_> = (0..5).map(|_| a.fresh_function_name()).collect();
        let fb: Vec<_> = (0..5).map(|_| b.fresh_function_name()).collect();
        assert_eq!(fa, fb);
    }

    #[test]
    fn function_and_link_names_never_collide() {
        let mut mint = IdentMint::new(7);
        let functions: HashSet<_> = (0..50).map(|_| mint.fresh_function_name()).collect();
        let links: HashSet<_> = (0..50).map(|_| mint.fresh_link_name()).collect();
        assert!(functions.is_disjoint(&links));
        assert_eq!(functions.len(), 50);
        assert_eq!(links.len(), 50);
    }

    #[test]
    fn different_seeds_usually_diverge() {
        let mut a = IdentMint::new(1);
        let mut b = IdentMint::new(2);
        assert_ne!(a.fresh_function_name(), b.fresh_function_name());
    }
}
