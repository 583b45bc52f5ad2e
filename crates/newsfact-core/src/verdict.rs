//! Classifier verdicts and confidence presentation.
//!
//! The detector is a two-class sequence classifier: class 0 is `Real`, class 1
//! is `Fake`. Confidence is the softmax mass of the winning class.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum VerdictError {
    #[error("confidence must lie in [0, 1], got {0}")]
    ConfidenceOutOfRange(f32),
}

/// Label for an analyzed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Real,
    Fake,
}

impl Verdict {
    /// Map a class index from the model head. Only index 0 is `Real`.
    pub fn from_class(index: usize) -> Self {
        if index == 0 { Self::Real } else { Self::Fake }
    }

    pub fn class_index(self) -> u8 {
        match self {
            Self::Real => 0,
            Self::Fake => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Real => "Real",
            Self::Fake => "Fake",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse confidence band, as shown to end users.
///
/// Thresholds are applied to the percentage: `High` from 75%, `Medium` from
/// 55%, `Low` below that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn from_confidence(confidence: f32) -> Self {
        let percent = f64::from(confidence) * 100.0;
        if percent >= 75.0 {
            Self::High
        } else if percent >= 55.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Output of a single forward pass: winning class and its probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub verdict: Verdict,
    pub confidence: f32,
}

impl Prediction {
    pub fn new(class: usize, confidence: f32) -> Result<Self, VerdictError> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(VerdictError::ConfidenceOutOfRange(confidence));
        }
        Ok(Self {
            verdict: Verdict::from_class(class),
            confidence,
        })
    }

    /// Confidence as a two-decimal percentage string, e.g. `"87.31%"`.
    /// Scaled in `f64`.
    pub fn percentage(&self) -> String {
        format!("{:.2}%", f64::from(self.confidence) * 100.0)
    }

    pub fn level(&self) -> ConfidenceLevel {
        ConfidenceLevel::from_confidence(self.confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_zero_is_real_everything_else_fake() {
        assert_eq!(Verdict::from_class(0), Verdict::Real);
        assert_eq!(Verdict::from_class(1), Verdict::Fake);
        assert_eq!(Verdict::from_class(7), Verdict::Fake);
        assert_eq!(Verdict::Real.class_index(), 0);
        assert_eq!(Verdict::Fake.class_index(), 1);
    }

    #[test]
    fn verdict_serializes_as_label() {
        assert_eq!(serde_json::to_string(&Verdict::Real).unwrap(), "\"Real\"");
        assert_eq!(serde_json::to_string(&Verdict::Fake).unwrap(), "\"Fake\"");
        assert_eq!(Verdict::Fake.to_string(), "Fake");
    }

    #[test]
    fn percentage_has_two_decimals() {
        let p = Prediction::new(1, 0.8731).unwrap();
        assert_eq!(p.percentage(), "87.31%");

        let p = Prediction::new(0, 1.0).unwrap();
        assert_eq!(p.percentage(), "100.00%");

        let p = Prediction::new(0, 0.5).unwrap();
        assert_eq!(p.percentage(), "50.00%");
    }

    #[test]
    fn percentage_rounds_in_double_precision() {
        // Scaling these in f32 lands on the other side of the rounding boundary.
        let p = Prediction::new(1, 0.50895).unwrap();
        assert_eq!(p.percentage(), "50.89%");

        let p = Prediction::new(1, 0.54745).unwrap();
        assert_eq!(p.percentage(), "54.75%");
    }

    #[test]
    fn rejects_confidence_outside_unit_interval() {
        assert_eq!(
            Prediction::new(0, 1.5),
            Err(VerdictError::ConfidenceOutOfRange(1.5))
        );
        assert!(Prediction::new(0, -0.1).is_err());
        assert!(Prediction::new(0, f32::NAN).is_err());
    }

    #[test]
    fn confidence_bands() {
        assert_eq!(ConfidenceLevel::from_confidence(0.99), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_confidence(0.75), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_confidence(0.74), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_confidence(0.55), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_confidence(0.54), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_confidence(0.5), ConfidenceLevel::Low);
    }
}
