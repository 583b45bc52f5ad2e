pub mod report;
pub mod verdict;

pub use report::{AnalysisRequest, AnalysisResult, ErrorBody, HealthReport, text_preview};
pub use verdict::{ConfidenceLevel, Prediction, Verdict, VerdictError};
