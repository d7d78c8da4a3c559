//! Vector space and binding algebra.
//!
//! - [`vector`]: dense vector primitives (dot, norm, cosine)
//! - [`binding`]: circular convolution binding, unbinding and superposition
//! - [`space`]: seeded base and role vectors

pub mod binding;
pub mod space;
pub mod vector;

pub use binding::{
    bind, bind_into, involution, random_vector, superpose, superpose_weighted, unbind,
    unitary_vector,
};
pub use space::{Role, VectorSpace};
pub use vector::{add_scaled, cosine_similarity, dot, norm, normalize, Vector};
