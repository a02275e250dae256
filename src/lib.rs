pub mod analyzer;
pub mod handlers;
pub mod stopwords;
pub mod throttle;
pub mod tokenize;

pub use analyzer::{
    AnalysisResult, AnalyzeError, WordFrequency, analyze, analyze_with_workers,
};
pub use handlers::{AppState, router};
pub use throttle::Throttle;
