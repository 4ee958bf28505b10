// libs/notification-cell/src/services/report_view.rs
use classifier_cell::interpret;
use shared_models::records::{AiReport, DoctorDiagnosis};

use crate::models::PatientReportView;

pub fn build_report_view(
    report: AiReport,
    diagnosis: Option<DoctorDiagnosis>,
    report_file_available: bool,
) -> PatientReportView {
    let interpretation = interpret(&report.prediction, report.confidence_score);
    let diagnosis_comments = diagnosis
        .and_then(|d| d.comments)
        .filter(|c| !c.trim().is_empty());

    PatientReportView {
        report,
        interpretation,
        diagnosis_comments,
        report_file_available,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_view_carries_interpretation_and_comments() {
        let report = AiReport {
            id: Uuid::new_v4(),
            image_id: Uuid::new_v4(),
            prediction: "NORMAL".to_string(),
            confidence_score: 0.875,
            generated_at: Utc::now(),
            is_visible: true,
        };
        let diagnosis = DoctorDiagnosis {
            id: Uuid::new_v4(),
            report_id: report.id,
            doctor_id: Uuid::new_v4(),
            diagnosis_result: Some("FINAL_DIAGNOSIS".to_string()),
            comments: Some("Clear lungs.".to_string()),
            diagnosis_date: Utc::now(),
            report_file_path: None,
        };

        let view = build_report_view(report, Some(diagnosis), false);

        assert!((view.interpretation.percentage - 87.5).abs() < 1e-9);
        assert_eq!(view.diagnosis_comments.as_deref(), Some("Clear lungs."));
        assert!(!view.report_file_available);
    }
}
