//! Presentation helpers: the fixed strings and formats the interface
//! renders.
//!
//! Read-only consumers of the model; nothing here feeds back into
//! reconciliation.

use crate::model::{JobStatus, StageKind};

/// Rendered for a stage whose result slot is unavailable.
pub const UNAVAILABLE_RESULT: &str = "Résultat non disponible";

/// Format a byte count with binary units, matching the interface's display
/// ("0 Bytes", "1.5 KB", "500 MB").
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let exponent = (((bytes as f64).ln() / 1024_f64.ln()).floor() as usize).min(UNITS.len() - 1);
    let value = bytes as f64 / 1024_f64.powi(exponent as i32);
    let mut rendered = format!("{:.2}", value);
    while rendered.ends_with('0') {
        rendered.pop();
    }
    if rendered.ends_with('.') {
        rendered.pop();
    }
    format!("{} {}", rendered, UNITS[exponent])
}

/// Format a duration in seconds ("12.3s", "2m 5s").
pub fn format_duration(seconds: f64) -> String {
    if seconds < 60.0 {
        return format!("{:.1}s", seconds);
    }
    let minutes = (seconds / 60.0).floor() as u64;
    let remainder = (seconds % 60.0).round() as u64;
    format!("{}m {}s", minutes, remainder)
}

/// Badge label for an overall job status.
pub fn status_badge(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Uploaded => "Uploadée",
        JobStatus::Processing => "En traitement",
        JobStatus::Completed => "Terminée",
        JobStatus::Failed => "Échouée",
    }
}

/// Short tile label for a stage.
pub fn stage_label(stage: StageKind) -> &'static str {
    match stage {
        StageKind::LanguageDetection => "Détection langue",
        StageKind::Compression => "Compression",
        StageKind::SubtitleGeneration => "Sous-titres",
        StageKind::AnimalDetection => "Animaux",
        StageKind::Aggregation => "Agrégation",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_size_formatting() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(500 * 1024 * 1024), "500 MB");
        assert_eq!(format_file_size(1073741824), "1 GB");
    }

    #[test]
    fn trailing_zeroes_are_trimmed() {
        // 1.25 MB keeps both decimals, 1.50 MB drops the zero.
        assert_eq!(format_file_size(1310720), "1.25 MB");
        assert_eq!(format_file_size(1572864), "1.5 MB");
    }

    #[test]
    fn duration_formatting() {
        assert_eq!(format_duration(0.0), "0.0s");
        assert_eq!(format_duration(12.34), "12.3s");
        assert_eq!(format_duration(65.0), "1m 5s");
        assert_eq!(format_duration(125.4), "2m 5s");
    }

    #[test]
    fn labels_cover_every_stage() {
        for stage in StageKind::ALL {
            assert!(!stage_label(stage).is_empty());
        }
        assert_eq!(status_badge(JobStatus::Processing), "En traitement");
    }
}
