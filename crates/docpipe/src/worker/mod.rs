pub mod job;
pub mod pool;
pub mod scanner;

pub use job::{ExtractionJob, ExtractionOutcome, ExtractionResult, PreprocessReport};
pub use pool::ExtractionPool;
pub use scanner::DirectoryScanner;
