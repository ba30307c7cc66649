//! Analysis modules.
//!
//! Stateless statistics over a filtered view: grouped summaries and
//! rankings, correlations, and the one-way ANOVA.

pub mod aggregator;
pub mod anova;
pub mod correlation;

pub use aggregator::{distribution, rank_by_site, summarize};
pub use anova::anova;
pub use correlation::correlation_matrix;
