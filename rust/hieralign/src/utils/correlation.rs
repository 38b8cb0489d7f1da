/// Dot product of two vectors already scaled to unit length, that is their
/// cosine similarity.
///
/// Skips the norm computation, callers are responsible for passing
/// slices of the same length (the shorter one wins otherwise).
/// Zero vectors are fine and yield 0.
///
/// # Example
///
/// ```
/// use hieralign::utils::correlation::{normalize_in_place, unit_dot};
///
/// let mut a = vec![1.0, 2.0, 3.0];
/// let mut b = vec![4.0, 5.0, 6.0];
/// normalize_in_place(&mut a);
/// normalize_in_place(&mut b);
/// assert!((unit_dot(&a, &b) - 0.9746318461970762).abs() < 1e-6);
///
/// let zero = vec![0.0, 0.0, 0.0];
/// assert_eq!(unit_dot(&a, &zero), 0.0);
/// ```
pub fn unit_dot(a: &[f32], b: &[f32]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    // Rounding can push identical unit vectors slightly past 1.
    dot(a, b).clamp(-1.0, 1.0)
}

pub fn norm(a: &[f32]) -> f64 {
    a.iter()
        .map(|&x| (x as f64) * (x as f64))
        .sum::<f64>()
        .sqrt()
}

/// Scales the vector in place to unit length; zero vectors are left untouched.
pub fn normalize_in_place(a: &mut [f32]) {
    let magnitude = norm(a);
    if magnitude == 0.0 {
        return;
    }
    a.iter_mut()
        .for_each(|x| *x = ((*x as f64) / magnitude) as f32);
}

fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x as f64) * (y as f64))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_dot_matches_cosine() {
        let mut a = vec![3.0, 0.0, 4.0, 1.0];
        let mut b = vec![1.0, 2.0, 0.0, 5.0];
        // 3 + 0 + 0 + 5 over sqrt(26) * sqrt(30)
        let expected = 8.0 / (26.0f64.sqrt() * 30.0f64.sqrt());
        normalize_in_place(&mut a);
        normalize_in_place(&mut b);
        assert!((norm(&a) - 1.0).abs() < 1e-6);
        assert!((unit_dot(&a, &b) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_zero_vector() {
        let mut a = vec![0.0; 4];
        normalize_in_place(&mut a);
        assert_eq!(a, vec![0.0; 4]);
        assert_eq!(unit_dot(&a, &a), 0.0);
    }
}
