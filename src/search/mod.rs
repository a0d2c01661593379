//! Facet-aware relevance search over the paper catalog.
//!
//! Queries and catalog names go through the same pipeline: normalization,
//! attribute extraction against fixed vocabularies, then an additive score
//! whose components sit at separated magnitudes (see [`scoring`]).

pub mod attributes;
pub mod normalize;
pub mod rank;
pub mod scoring;

pub use attributes::{AttributeSet, Vocabulary, extract};
pub use normalize::normalize;
pub use rank::{DEFAULT_LIMIT, RankedResult, rank, search};
pub use scoring::{ComponentScores, QueryProfile, ScoredCandidate, score};
