//! Writer for the dendrite hierarchical recording format.
//!
//! Dendrite stores time-series and event recordings from large populations
//! of simulated entities ("sources") next to a model tree describing those
//! entities, inside a single hierarchical store. A store has three top
//! namespaces:
//!
//! - `/model` - the model tree, groups carrying a `uid` attribute
//! - `/map` - source mappings (the declared row order per population) and
//!   time axes
//! - `/data` - the stored arrays, one per (population, field)
//!
//! # Writing data
//!
//! Declare a population once, then append batches against the returned
//! handle; every batch must cover exactly the declared sources and rows
//! are always stored in the declared order:
//!
//! ```
//! use dendrite::{Dialect, Recorder, SourceId, UniformBatch};
//!
//! # fn main() -> dendrite::Result<()> {
//! let mut recorder = Recorder::new(Dialect::Padded)?;
//! let cells: Vec<SourceId> = ["c0", "c1", "c2"].map(SourceId::from).into();
//! let mapping = recorder.declare_uniform("cells", &cells)?;
//!
//! let mut batch = UniformBatch::new("Vm")
//!     .with_unit("mV")
//!     .with_time_unit("ms")
//!     .with_dt(0.1);
//! for cell in &cells {
//!     batch.insert(cell.clone(), vec![0.0; 5]);
//! }
//! recorder.append_uniform(&mapping, &batch, 0.0, false)?;
//! # Ok(())
//! # }
//! ```
//!
//! The writer is single-threaded and synchronous; callers own the
//! execution context and serialize access to one recorder.

pub mod append;
pub mod batch;
pub mod dialect;
pub mod error;
pub mod link;
pub mod mapping;
pub mod recorder;

pub use batch::{EventBatch, SharedTimeBatch, StaticBatch, TimedBatch, UniformBatch};
pub use dialect::Dialect;
pub use error::{Error, Result};
pub use link::{LinkOutcome, SkipReason};
pub use mapping::{MappingHandle, Namespace};
pub use recorder::{Recorder, FORMAT_VERSION};

pub use dendrite_model::{common_prefix, ModelTree, Path, SourceId};
pub use dendrite_store::{AttrValue, Dtype, Error as StoreError, ObjectId, Store};
