//! Confidence rollup from pipeline degradations

use crate::core::models::{Confidence, Degradation};

/// Score an answer from the degradations recorded while producing it.
///
/// No degradation is High. A single truncation or translation fallback is
/// Medium. A defaulted language, or any combination of two or more
/// degradations, is Low.
pub fn score(degradations: &[Degradation]) -> Confidence {
    match degradations {
        [] => Confidence::High,
        [Degradation::LanguageDefaulted] => Confidence::Low,
        [_] => Confidence::Medium,
        _ => Confidence::Low,
    }
}
