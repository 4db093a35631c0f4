use crate::profile::InterestProfile;

/// `dot(a, b) / (|a| |b|)`, or 0 when either vector is zero
pub fn cosine_similarity(a: &InterestProfile, b: &InterestProfile) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(tag, x)| large.get(tag).map(|y| x * y))
        .sum();

    let norm_a = a.values().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.values().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a < 1e-12 || norm_b < 1e-12 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(tags: &[&str]) -> InterestProfile {
        tags.iter().map(|t| (t.to_string(), 1.0)).collect()
    }

    #[test]
    fn test_identical_is_one() {
        let a = profile(&["tech", "art"]);
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_symmetric() {
        let a = profile(&["tech"]);
        let b = profile(&["tech", "art", "music"]);
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn test_half_overlap() {
        let a = profile(&["tech"]);
        let b = profile(&["tech", "art"]);
        let expected = 1.0 / 2f64.sqrt();
        assert!((cosine_similarity(&a, &b) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_disjoint_and_empty() {
        let a = profile(&["tech"]);
        assert_eq!(cosine_similarity(&a, &profile(&["art"])), 0.0);
        assert_eq!(cosine_similarity(&a, &profile(&[])), 0.0);
        assert_eq!(cosine_similarity(&profile(&[]), &profile(&[])), 0.0);
    }
}
