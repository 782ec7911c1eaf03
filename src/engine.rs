//! Region-finding engine.
//!
//! The engine walks the structure block one token at a time and decides, for
//! each token, whether its bytes belong to the output. Runs of included tokens
//! become regions.
//!
//! ## How the parts work together
//!
//! ```text
//! Fdt::next_token (fdt/token.rs)
//!        │  Token + next offset
//!        v
//! RegionState::step (cursor.rs)
//!   - AncestorStack (stack.rs): path, frame per open node
//!   - Want + RegionFlags (policy.rs): inclusion level of the current node
//!   - Include (include.rs): caller verdict per node / property
//!        │  included? + stop offset
//!        v
//! Accumulator (accumulator.rs)
//!   - open / close / merge
//!   - retroactive supernode regions
//!        │  completed FoundRegion
//!        v
//! RegionState::next ──▶ caller
//! ```
//!
//! All progress lives in `RegionState`, so a scan can be paused after any
//! region and resumed later, or cloned and continued twice.
//!
//! ## Responsibilities by module
//!
//! - `policy.rs`: `RegionFlags` and the `Want` lattice with its decay rule.
//! - `include.rs`: the predicate trait and its closure adapters.
//! - `stack.rs`: ancestor frames and the current node path.
//! - `accumulator.rs`: turns open/close transitions into merged regions.
//! - `cursor.rs`: the resumable state machine and the `Regions` iterator.
//! - `metrics.rs`: counters collected during a scan.
//!
//! ## Debugging
//!
//! Every token decision is logged at `trace` level and every emitted region at
//! `debug` level through `tracing`.

#[path = "engine/accumulator.rs"]
mod accumulator;
#[path = "engine/cursor.rs"]
mod cursor;
#[path = "engine/include.rs"]
mod include;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/policy.rs"]
mod policy;
#[path = "engine/stack.rs"]
mod stack;


pub use cursor::{RegionState, Regions, ScanPhase};
pub use include::{Fallible, Include, Item, Verdict};
pub use metrics::ScanStats;
pub use policy::RegionFlags;
