use crate::models::{ConfidenceLevel, Interpretation};

/// Derives the display form of a stored prediction and its normalized score.
pub fn interpret(prediction: &str, confidence_score: f64) -> Interpretation {
    let percentage = confidence_score * 100.0;
    let level = ConfidenceLevel::from_percentage(percentage);

    Interpretation {
        prediction: prediction.to_string(),
        confidence_score,
        percentage,
        level,
        recommendation: recommendation(prediction, level),
    }
}

fn recommendation(prediction: &str, level: ConfidenceLevel) -> &'static str {
    let pneumonia = prediction.trim().eq_ignore_ascii_case("PNEUMONIA");

    match (pneumonia, level) {
        (true, ConfidenceLevel::High) => {
            "Strong indication of pneumonia. Recommend immediate medical attention."
        }
        (true, ConfidenceLevel::Moderate) => "Moderate indication of pneumonia. Medical review recommended.",
        (true, ConfidenceLevel::Low) => "Possible pneumonia detected. Further examination advised.",
        (false, ConfidenceLevel::High) => "No signs of pneumonia detected. Chest X-ray appears normal.",
        (false, ConfidenceLevel::Moderate) => {
            "Likely normal chest X-ray. Routine follow-up if symptoms persist."
        }
        (false, ConfidenceLevel::Low) => "Unclear result. Manual review by radiologist recommended.",
    }
}
