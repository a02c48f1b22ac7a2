pub mod cache;
pub mod clock;
pub mod engine;
pub mod result;

pub use cache::{AnalysisCache, CacheKey, CacheStats};
#[cfg(test)]
pub use clock::ManualClock;
pub use clock::{Clock, SystemClock};
pub use engine::{AnalysisEngine, EngineSettings};
pub use result::{AnalysisResult, AnalysisStatistics, VarietyAnalysis};
