//! Flattens search-engine aggregation results into tabular records.
//!
//! Every path from the root of an `aggregations` section down to a metric
//! becomes one [`Record`]: grouping levels contribute a column holding the
//! bucket key, the metric contributes a column holding its value.
//!
//! ```
//! use serde_json::json;
//!
//! let aggs = json!({
//!     "PROJECT": {"buckets": [
//!         {"key": "FC", "doc_count": 16, "CAMPAIGN_ID": {"buckets": [
//!             {"key": "002", "REGISTRATIONS": {"value": 3}},
//!             {"key": "003", "REGISTRATIONS": {"value": 1}},
//!         ]}},
//!     ]}
//! });
//!
//! let rows = aggwalk::tablify(&aggs);
//! assert_eq!(rows.len(), 2);
//! assert_eq!(rows[1]["CAMPAIGN_ID"], json!("003"));
//! assert_eq!(rows[1]["REGISTRATIONS"], json!(1));
//! ```

pub mod classify;
pub mod config;
pub mod error;
pub mod frame;
pub mod log;
pub mod source;
pub mod walk;

use rayon::prelude::*;
use serde_json::{Map, Value};
use tracing::debug;

pub use classify::{classify, has_buckets, has_values, Node};
pub use error::{Error, Result};
pub use frame::Frame;
pub use walk::{walk, AccumulatorScope, KeyField, Walk, WalkOptions, Walker};

/// One flattened row: column name to scalar, in depth-first discovery order.
pub type Record = Map<String, Value>;

/// Flatten an aggregation tree with default options.
pub fn tablify(aggregations: &Value) -> Vec<Record> {
    tablify_with(aggregations, &WalkOptions::default())
}

/// Flatten an aggregation tree. The walk is run to completion here so the
/// accumulator never outlives the call. Anything other than an object yields
/// no records.
pub fn tablify_with(aggregations: &Value, options: &WalkOptions) -> Vec<Record> {
    let Some(tree) = aggregations.as_object() else {
        debug!("aggregation section is not an object; nothing to flatten");
        return Vec::new();
    };

    let mut accumulator = Record::new();
    let records: Vec<Record> = Walker::new(*options).walk(tree, &mut accumulator).collect();

    debug!(records = records.len(), "flattened aggregation tree");
    records
}

/// Flatten independent trees in parallel. Results keep the input order.
pub fn tablify_many(trees: &[Value], options: &WalkOptions) -> Vec<Vec<Record>> {
    trees
        .par_iter()
        .map(|tree| tablify_with(tree, options))
        .collect()
}
