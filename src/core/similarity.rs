use crate::models::DomainVector;

/// Cosine similarity between two term vectors of the same category
///
/// # Arguments
/// * `a` - First profile's vector
/// * `b` - Second profile's vector
///
/// # Returns
/// Similarity in `[0, 1]`; `0` when either vector has zero magnitude
#[inline]
pub fn cosine_similarity(a: &DomainVector, b: &DomainVector) -> f64 {
    let denominator = a.norm() * b.norm();
    if denominator <= 0.0 || !denominator.is_finite() {
        return 0.0;
    }

    // Term weights are non-negative, so only rounding can leave [0, 1]
    (a.dot(b) / denominator).clamp(0.0, 1.0)
}
