//! # enrich
//!
//! Core library for multi-source product enrichment. Given a bare product
//! identity (barcode-like identifier, brand, name, optional size and color),
//! it fans a search out to external sources in parallel, extracts and verifies
//! attributes from the noisy results, and reduces them to a single
//! confidence-scored record with a representative retail price, image, and
//! description.
//!
//! The flow is: [`orchestrate::Orchestrator`] invokes throttle-gated
//! [`source::Source`] adapters concurrently, [`extract`] annotates each raw
//! candidate, [`verify`] scores it against the input, and [`aggregate`]
//! selects the final answer. [`pipeline::EnrichmentPipeline`] wires the whole
//! thing together with an optional read-through cache and image oracle.

pub mod aggregate;
pub mod constants;
pub mod errors;
pub mod extract;
pub mod oracle;
pub mod orchestrate;
pub mod pipeline;
pub mod pricing;
pub mod source;
pub mod throttle;
pub mod types;
pub mod verify;

pub use errors::EnrichError;
pub use types::{Candidate, EnrichedRecord, ProductQuery};
