//! # Optimizer Module
//!
//! Modulo che separa le responsabilità del batch in sottomoduli:
//! - `batch_optimizer`: Orchestratore sequenziale del batch
//! - `progress_tracker`: Contatori e snapshot di progresso del run corrente

pub mod batch_optimizer;
pub mod progress_tracker;

pub use batch_optimizer::BatchOptimizer;
pub use progress_tracker::ProgressTracker;
