//! Console report formatting.

use crate::network::StageReport;
use crate::tensor::Shape;
use crate::utils::softmax;

/// Line printed after a stage, or `None` for stages that are not reported
/// (dense layers, whose output only appears in the final score line).
pub fn stage_line(label: &str, kind: &str, shape: &Shape) -> Option<String> {
    match (*shape, kind) {
        (
            Shape::Spatial {
                channels,
                height,
                width,
            },
            _,
        ) => Some(format!(
            "After {}: {} channels {}x{}",
            label, channels, height, width
        )),
        (Shape::Flat(len), "flatten") => Some(format!("Flattened size: {}", len)),
        _ => None,
    }
}

pub fn report_line(report: &StageReport<'_>) -> Option<String> {
    stage_line(report.label, report.kind, &report.output.shape())
}

pub fn format_scores(scores: &[f32]) -> String {
    let values: Vec<String> = scores.iter().map(|s| format!("{:.6}", s)).collect();
    format!("Final output: [{}]", values.join(", "))
}

/// Index of the highest score (first one on ties) and its softmax probability.
pub fn top_class(scores: &[f32]) -> Option<(usize, f32)> {
    let probs = softmax(scores);
    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in scores.iter().enumerate() {
        if best.map_or(true, |(b, _)| score > scores[b]) {
            best = Some((i, probs[i]));
        }
    }
    best
}

pub fn format_prediction(scores: &[f32]) -> Option<String> {
    top_class(scores).map(|(class, p)| format!("Predicted class: {} (p={:.4})", class, p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_lines() {
        assert_eq!(
            stage_line("conv1", "conv2d", &Shape::spatial(3, 28, 28)).as_deref(),
            Some("After conv1: 3 channels 28x28")
        );
        assert_eq!(
            stage_line("flatten", "flatten", &Shape::Flat(245)).as_deref(),
            Some("Flattened size: 245")
        );
        assert_eq!(stage_line("dense1", "dense", &Shape::Flat(128)), None);
    }

    #[test]
    fn test_format_scores() {
        assert_eq!(format_scores(&[0.0, 1.5]), "Final output: [0.000000, 1.500000]");
        assert_eq!(format_scores(&[]), "Final output: []");
    }

    #[test]
    fn test_top_class_first_on_tie() {
        let (class, p) = top_class(&[0.0, 2.0, 2.0]).unwrap();
        assert_eq!(class, 1);
        assert!(p > 0.4 && p < 0.5);
        assert_eq!(top_class(&[]), None);
    }

    #[test]
    fn test_prediction_line() {
        assert_eq!(
            format_prediction(&[0.0, 0.0]).as_deref(),
            Some("Predicted class: 0 (p=0.5000)")
        );
    }
}
