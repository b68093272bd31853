pub mod loaders;
pub mod metric;
pub mod passage;
pub mod results;

pub use loaders::{load_passages, parse_passages, PassageFormat};
pub use metric::{Metric, MetricGroup, MetricResult, MetricValue, ScoreKind};
pub use passage::{Passage, PassageStore};
pub use results::{MetricResults, MetricRun};
