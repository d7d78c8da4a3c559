//! Dense vector primitives shared by binding, accumulation and search.
//!
//! Loops are written in chunks of 8 so they autovectorize on AVX targets.

/// A dense real vector of the model dimensionality.
pub type Vector = Vec<f32>;

/// Dot product of two equal-length slices, accumulated in f64.
#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f64 {
    debug_assert_eq!(a.len(), b.len());

    let chunks = a.len() / 8;
    let mut sum = 0.0f64;

    for i in 0..chunks {
        let base = i * 8;
        let mut partial = 0.0f32;
        for j in base..base + 8 {
            partial += a[j] * b[j];
        }
        sum += partial as f64;
    }

    for i in chunks * 8..a.len() {
        sum += (a[i] * b[i]) as f64;
    }

    sum
}

/// Euclidean norm.
#[inline]
pub fn norm(a: &[f32]) -> f64 {
    dot(a, a).sqrt()
}

/// Cosine similarity. Returns 0 when either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    assert_eq!(a.len(), b.len(), "cosine of vectors with different dimensions");

    let na = norm(a);
    let nb = norm(b);
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    (dot(a, b) / (na * nb)).clamp(-1.0, 1.0)
}

/// Scales `v` in place to unit norm. Zero vectors are left untouched.
pub fn normalize(v: &mut [f32]) {
    let n = norm(v);
    if n > 0.0 {
        let inv = (1.0 / n) as f32;
        for x in v.iter_mut() {
            *x *= inv;
        }
    }
}

/// `acc += weight * v`.
#[inline]
pub fn add_scaled(acc: &mut [f32], v: &[f32], weight: f32) {
    debug_assert_eq!(acc.len(), v.len());

    if weight == 1.0 {
        for (a, x) in acc.iter_mut().zip(v) {
            *a += *x;
        }
    } else {
        for (a, x) in acc.iter_mut().zip(v) {
            *a += weight * *x;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_and_norm() {
        let a: Vec<f32> = (0..19).map(|i| i as f32).collect();
        let expected: f64 = (0..19).map(|i| (i * i) as f64).sum();
        assert!((dot(&a, &a) - expected).abs() < 1e-6);
        assert!((norm(&[3.0, 4.0]) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_zero_vector() {
        let a = vec![0.0f32; 4];
        let b = vec![1.0f32, 2.0, 3.0, 4.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
        assert_eq!(cosine_similarity(&b, &a), 0.0);
    }

    #[test]
    fn test_cosine_identical_and_opposite() {
        let a = vec![1.0f32, -2.0, 0.5];
        let neg: Vec<f32> = a.iter().map(|x| -x).collect();
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-9);
        assert!((cosine_similarity(&a, &neg) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalize() {
        let mut v = vec![3.0f32, 4.0];
        normalize(&mut v);
        assert!((norm(&v) - 1.0).abs() < 1e-6);

        let mut zero = vec![0.0f32; 3];
        normalize(&mut zero);
        assert_eq!(zero, vec![0.0; 3]);
    }

    #[test]
    fn test_add_scaled() {
        let mut acc = vec![1.0f32, 1.0];
        add_scaled(&mut acc, &[2.0, 3.0], 0.5);
        assert_eq!(acc, vec![2.0, 2.5]);
    }
}
