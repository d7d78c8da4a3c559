//! Seeded random vector space.
//!
//! Every base and role vector is a pure function of `(seed, namespace, key)`:
//! the key is hashed into a per-vector seed for a `ChaCha8Rng`, so vectors can
//! be generated lazily, in any order, from any thread, and regenerated after a
//! model is loaded from disk.

use super::binding::{random_vector, unitary_vector};
use super::vector::cosine_similarity;
use parking_lot::RwLock;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

const NS_BASE: u8 = 0;
const NS_POSITION: u8 = 1;
const NS_RELATION: u8 = 2;

/// A discrete role that can be bound to a base vector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    /// Relative offset slot (Order model).
    Position(isize),
    /// Dependency relation label (Syntax model).
    Relation(String),
}

/// Lazily populated table of base and role vectors.
pub struct VectorSpace {
    dim: usize,
    seed: u64,
    unitary_roles: bool,
    base: RwLock<HashMap<String, Arc<[f32]>>>,
    roles: RwLock<HashMap<Role, Arc<[f32]>>>,
}

impl VectorSpace {
    /// Create an empty space of dimension `dim`.
    pub fn new(dim: usize, seed: u64, unitary_roles: bool) -> Self {
        Self {
            dim,
            seed,
            unitary_roles,
            base: RwLock::new(HashMap::new()),
            roles: RwLock::new(HashMap::new()),
        }
    }

    /// Vector dimensionality.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Seed every vector is derived from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Base vector for `symbol`, generated on first request and cached.
    pub fn get_base_vector(&self, symbol: &str) -> Arc<[f32]> {
        if let Some(v) = self.base.read().get(symbol) {
            return Arc::clone(v);
        }

        let generated: Arc<[f32]> = {
            let mut rng = self.rng_for(NS_BASE, symbol);
            random_vector(&mut rng, self.dim).into()
        };

        // A racing thread may have inserted first; its vector is identical.
        let mut cache = self.base.write();
        Arc::clone(cache.entry(symbol.to_string()).or_insert(generated))
    }

    /// Role vector for `role`, generated on first request and cached.
    pub fn get_role_vector(&self, role: &Role) -> Arc<[f32]> {
        if let Some(v) = self.roles.read().get(role) {
            return Arc::clone(v);
        }

        let generated: Arc<[f32]> = {
            let mut rng = match role {
                Role::Position(offset) => self.rng_for(NS_POSITION, &offset.to_string()),
                Role::Relation(label) => self.rng_for(NS_RELATION, label),
            };
            if self.unitary_roles {
                unitary_vector(&mut rng, self.dim).into()
            } else {
                random_vector(&mut rng, self.dim).into()
            }
        };

        let mut cache = self.roles.write();
        Arc::clone(cache.entry(role.clone()).or_insert(generated))
    }

    /// Shorthand for the position role at `offset`.
    pub fn position_vector(&self, offset: isize) -> Arc<[f32]> {
        self.get_role_vector(&Role::Position(offset))
    }

    /// Shorthand for the relation role labelled `label`.
    pub fn relation_vector(&self, label: &str) -> Arc<[f32]> {
        self.get_role_vector(&Role::Relation(label.to_string()))
    }

    /// Base vectors for `symbols`, in order, generated in parallel.
    pub fn base_table(&self, symbols: &[String]) -> Vec<Arc<[f32]>> {
        symbols.par_iter().map(|s| self.get_base_vector(s)).collect()
    }

    /// Relation labels that have a role vector, sorted.
    pub fn relation_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self
            .roles
            .read()
            .keys()
            .filter_map(|role| match role {
                Role::Relation(label) => Some(label.clone()),
                Role::Position(_) => None,
            })
            .collect();
        labels.sort();
        labels
    }

    /// Cosine similarity, 0 when either vector has zero norm.
    pub fn similarity(&self, a: &[f32], b: &[f32]) -> f64 {
        cosine_similarity(a, b)
    }

    /// Number of cached base vectors.
    pub fn cached_base_vectors(&self) -> usize {
        self.base.read().len()
    }

    fn rng_for(&self, namespace: u8, key: &str) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(symbol_seed(self.seed, namespace, key))
    }
}

impl std::fmt::Debug for VectorSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorSpace")
            .field("dim", &self.dim)
            .field("seed", &self.seed)
            .field("unitary_roles", &self.unitary_roles)
            .field("cached_base_vectors", &self.cached_base_vectors())
            .finish()
    }
}

/// Stable 64-bit seed for `(seed, namespace, key)`: FNV-1a over the key
/// followed by a splitmix64 finalizer.
fn symbol_seed(seed: u64, namespace: u8, key: &str) -> u64 {
    let mut h: u64 = 0xcbf2_9ce4_8422_2325 ^ seed.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    for byte in std::iter::once(namespace).chain(key.bytes()) {
        h ^= byte as u64;
        h = h.wrapping_mul(0x0000_0100_0000_01b3);
    }

    h ^= h >> 30;
    h = h.wrapping_mul(0xbf58_476d_1ce4_e5b9);
    h ^= h >> 27;
    h = h.wrapping_mul(0x94d0_49bb_1331_11eb);
    h ^ (h >> 31)
}
