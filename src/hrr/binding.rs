//! Holographic reduced representation (HRR) algebra.
//!
//! Binding is circular convolution, unbinding is circular correlation
//! (convolution with the involution of the key), and superposition is the
//! elementwise sum. Retrieval is approximate: unbinding a trace that does
//! not contain the key yields noise rather than an error.
//!
//! References:
//! - Plate (1995): "Holographic Reduced Representations"
//! - Plate (2003): "Holographic Reduced Representation: Distributed
//!   Representation for Cognitive Structures"

use super::vector::{normalize, Vector};
use rand::Rng;
use rand_distr::StandardNormal;
use std::f64::consts::PI;

/// Circular convolution `c[k] = Σ_i a[i]·b[(k−i) mod D]`.
///
/// # Panics
///
/// Panics if `a` and `b` have different lengths.
pub fn bind(a: &[f32], b: &[f32]) -> Vector {
    let mut out = vec![0.0f32; a.len()];
    bind_into(&mut out, a, b);
    out
}

/// Adds the circular convolution of `a` and `b` into `out`.
///
/// Lets encoders superpose many bindings without a temporary per term.
///
/// # Panics
///
/// Panics if the three slices do not share one length.
pub fn bind_into(out: &mut [f32], a: &[f32], b: &[f32]) {
    assert_eq!(a.len(), b.len(), "bind of vectors with different dimensions");
    assert_eq!(out.len(), a.len(), "bind output has the wrong dimension");

    let d = a.len();
    for (i, &ai) in a.iter().enumerate() {
        if ai == 0.0 {
            continue;
        }
        // c[i + j] += a[i] * b[j], split at the wrap-around point
        let (head, tail) = b.split_at(d - i);
        for (o, &bj) in out[i..].iter_mut().zip(head) {
            *o += ai * bj;
        }
        for (o, &bj) in out[..i].iter_mut().zip(tail) {
            *o += ai * bj;
        }
    }
}

/// Involution `b'[i] = b[(D−i) mod D]`, the approximate inverse of `b`.
pub fn involution(b: &[f32]) -> Vector {
    let d = b.len();
    (0..d).map(|i| b[(d - i) % d]).collect()
}

/// Circular correlation: `bind(c, involution(b))`.
///
/// # Panics
///
/// Panics if `c` and `b` have different lengths.
pub fn unbind(c: &[f32], b: &[f32]) -> Vector {
    bind(c, &involution(b))
}

/// Elementwise sum of the given vectors.
///
/// An empty input yields an empty vector.
///
/// # Panics
///
/// Panics if the vectors have different lengths.
pub fn superpose<V: AsRef<[f32]>>(vectors: &[V]) -> Vector {
    let Some(first) = vectors.first() else {
        return Vec::new();
    };
    let mut out = vec![0.0f32; first.as_ref().len()];
    for v in vectors {
        let v = v.as_ref();
        assert_eq!(v.len(), out.len(), "superpose of vectors with different dimensions");
        for (o, x) in out.iter_mut().zip(v) {
            *o += *x;
        }
    }
    out
}

/// Weighted sum `Σ w_i·v_i`.
///
/// # Panics
///
/// Panics if the vectors have different lengths.
pub fn superpose_weighted<V: AsRef<[f32]>>(vectors: &[(V, f32)]) -> Vector {
    let Some((first, _)) = vectors.first() else {
        return Vec::new();
    };
    let mut out = vec![0.0f32; first.as_ref().len()];
    for (v, w) in vectors {
        let v = v.as_ref();
        assert_eq!(v.len(), out.len(), "superpose of vectors with different dimensions");
        for (o, x) in out.iter_mut().zip(v) {
            *o += *w * *x;
        }
    }
    out
}

/// Draws a vector with i.i.d. coordinates from 𝒩(0, 1/D), scaled to unit norm.
pub fn random_vector<R: Rng + ?Sized>(rng: &mut R, dim: usize) -> Vector {
    let scale = 1.0 / (dim as f64).sqrt();
    let mut v: Vector = (0..dim)
        .map(|_| {
            let x: f64 = rng.sample(StandardNormal);
            (x * scale) as f32
        })
        .collect();
    normalize(&mut v);
    v
}

/// Draws a unitary vector: every DFT coefficient has magnitude 1, so the
/// involution is an exact inverse under circular convolution.
///
/// Phases are uniform on (−π, π] with conjugate symmetry so the result is
/// real; the inverse DFT is evaluated directly.
pub fn unitary_vector<R: Rng + ?Sized>(rng: &mut R, dim: usize) -> Vector {
    if dim == 0 {
        return Vec::new();
    }

    let half = (dim - 1) / 2;
    let phases: Vec<f64> = (0..half).map(|_| rng.gen_range(-PI..PI)).collect();
    // DC and (for even D) Nyquist coefficients must be real: ±1
    let dc = if rng.gen::<bool>() { 1.0 } else { -1.0 };
    let nyquist = if dim % 2 == 0 {
        if rng.gen::<bool>() {
            1.0
        } else {
            -1.0
        }
    } else {
        0.0
    };

    let d = dim as f64;
    (0..dim)
        .map(|n| {
            let mut x = dc;
            if dim % 2 == 0 {
                x += if n % 2 == 0 { nyquist } else { -nyquist };
            }
            for (k, phase) in phases.iter().enumerate() {
                let freq = (k + 1) as f64;
                x += 2.0 * (2.0 * PI * freq * n as f64 / d + phase).cos();
            }
            (x / d) as f32
        })
        .collect()
}
