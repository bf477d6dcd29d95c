//! presswire-migration — the ETL core.
//!
//! Moves news-article records out of the source document store into the
//! relational store and the vector index:
//!   1. `source` reads batches by ascending id (resumable cursor)
//!   2. `normalize` validates and cleans each record
//!   3. `transform` maps records into relational rows and vector points
//!   4. `sink` writes through whichever backends a run is configured with
//!   5. `pipeline` drives the batch loop and tracks job state via `job`

pub mod job;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod sink;
pub mod source;
pub mod transform;

pub use job::{InMemoryJobStore, JobStatus, JobStore, MigrationJob};
pub use models::{DateRange, SourceArticle};
pub use normalize::ValidationPolicy;
pub use pipeline::{run_migration, MigrationOptions, MigrationReport, MigrationSinks};
pub use sink::{PostgresSink, RelationalSink, VectorSink};
pub use source::{ArticleSource, MongoArticleSource};
pub use transform::{TransformOutcome, Transformer};
