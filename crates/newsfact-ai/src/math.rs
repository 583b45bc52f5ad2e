//! Logit post-processing.

use newsfact_core::Prediction;

use crate::error::InferenceError;

/// Normalize logits into a probability distribution.
///
/// Subtracts the max logit before exponentiating so large logits cannot
/// overflow.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Index of the largest value. Ties resolve to the lowest index.
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Softmax the logits of one example and pick the winning class.
pub fn predict_from_logits(logits: &[f32]) -> Result<Prediction, InferenceError> {
    if logits.iter().any(|x| !x.is_finite()) {
        return Err(InferenceError::Output(format!(
            "non-finite logits: {logits:?}"
        )));
    }
    let probs = softmax(logits);
    let class = argmax(&probs)
        .ok_or_else(|| InferenceError::Output("empty logits".to_string()))?;
    // Rounding can push a near-certain probability a hair above 1.0.
    let confidence = probs[class].clamp(0.0, 1.0);
    Ok(Prediction::new(class, confidence)?)
}
