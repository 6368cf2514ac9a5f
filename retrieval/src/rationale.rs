//! Human-readable explanation of a match.
//!
//! Presentation only: nothing here feeds back into ranking.

/// Describe a match from its two component scores.
pub fn explain(vector_similarity: f32, score_similarity: f32) -> String {
    let behavior = if vector_similarity > 0.90 {
        "Near-identical behavioral profile"
    } else if vector_similarity > 0.80 {
        "Highly similar behavioral profile"
    } else {
        "Moderate behavioral similarity"
    };

    if score_similarity > 0.90 {
        format!("{behavior}; credit scores are also close")
    } else {
        behavior.to_string()
    }
}
