//! Similarity and distance measures over sparse vectors and term sets.

use crate::vectorizer::SparseVector;
use std::collections::HashSet;
use std::hash::Hash;

/// L2 norm.
pub fn magnitude(v: &SparseVector) -> f64 {
    v.values().map(|w| w * w).sum::<f64>().sqrt()
}

/// Sum of products over shared keys; keys present on one side only contribute 0.
pub fn dot(a: &SparseVector, b: &SparseVector) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small
        .iter()
        .filter_map(|(k, w)| large.get(k).map(|x| w * x))
        .sum()
}

/// Cosine similarity with precomputed magnitudes. 0 when either magnitude is 0.
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector, mag_a: f64, mag_b: f64) -> f64 {
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    (dot(a, b) / (mag_a * mag_b)).clamp(0.0, 1.0)
}

pub fn euclidean_distance(a: &SparseVector, b: &SparseVector) -> f64 {
    let mut sum = 0.0;
    for (k, wa) in a {
        let d = wa - b.get(k).copied().unwrap_or(0.0);
        sum += d * d;
    }
    for (k, wb) in b {
        if !a.contains_key(k) {
            sum += wb * wb;
        }
    }
    sum.sqrt()
}

/// |A ∩ B| / |A ∪ B|, 0 for two empty sets.
pub fn jaccard_similarity<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sv(pairs: &[(u32, f64)]) -> SparseVector { pairs.iter().copied().collect() }

    #[test]
    fn cosine_of_self_is_one() {
        let v = sv(&[(0, 0.5), (1, 0.3), (2, 0.4)]);
        let m = magnitude(&v);
        assert!((cosine_similarity(&v, &v, m, m) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cosine_is_symmetric() {
        let a = sv(&[(0, 0.5), (1, 0.3), (2, 0.4)]);
        let b = sv(&[(0, 0.6), (1, 0.2), (3, 0.5)]);
        let (ma, mb) = (magnitude(&a), magnitude(&b));
        let ab = cosine_similarity(&a, &b, ma, mb);
        let ba = cosine_similarity(&b, &a, mb, ma);
        assert!((ab - ba).abs() < 1e-12);
        let expected = (0.5 * 0.6 + 0.3 * 0.2) / (ma * mb);
        assert!((ab - expected).abs() < 1e-12);
    }

    #[test]
    fn cosine_zero_magnitude() {
        let a = sv(&[(0, 0.5)]);
        assert_eq!(cosine_similarity(&a, &SparseVector::new(), 0.5, 0.0), 0.0);
        assert_eq!(cosine_similarity(&a, &a, 0.0, 0.5), 0.0);
    }

    #[test]
    fn disjoint_vectors_score_zero() {
        let a = sv(&[(0, 0.5), (1, 0.3)]);
        let b = sv(&[(3, 0.7), (4, 0.6)]);
        assert_eq!(cosine_similarity(&a, &b, magnitude(&a), magnitude(&b)), 0.0);
    }

    #[test]
    fn euclidean() {
        let a = sv(&[(0, 3.0)]);
        let b = sv(&[(1, 4.0)]);
        assert!((euclidean_distance(&a, &b) - 5.0).abs() < 1e-12);
        assert_eq!(euclidean_distance(&a, &a), 0.0);
    }

    #[test]
    fn jaccard() {
        let q: HashSet<&str> = ["demam", "sakit", "kepala"].into_iter().collect();
        let d: HashSet<&str> = ["demam", "panas", "badan"].into_iter().collect();
        assert!((jaccard_similarity(&q, &d) - 0.2).abs() < 1e-12);
        let empty: HashSet<&str> = HashSet::new();
        assert_eq!(jaccard_similarity(&empty, &empty), 0.0);
    }
}
