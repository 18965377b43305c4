//! Reserve - choose the identifier of the next record in an auto-increment
//! content store.
//!
//! Records in a [`ContentStore`] receive identifiers from a monotonic
//! sequence owned by the store. The [`GapAllocator`] lets an operator ask for
//! a specific identifier for the next record: it validates the request and
//! writes draft placeholder records that consume the identifiers in between,
//! so the sequence lands on the requested value.
//!
//! # Key Concepts
//!
//! - **ContentStore**: Records plus their sequence, over the shared storage
//!   layer. Never reuses an identifier, even after deletion.
//! - **SequenceInspector**: Reads the highest identifier issued so far.
//! - **GapAllocator**: Validates a target and fills the gap in front of it.
//! - **AllocationGuard**: Hook that can veto an allocation.
//! - **SettingsPage**: Turns a submitted form into one allocation and a
//!   notice for the operator.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use reserve::{Config, ContentStore, GapAllocator, RecordFields};
//!
//! let config = Config::load("reserve.toml")?;
//! let store = Arc::new(ContentStore::open(&config.storage).await?);
//! let allocator = GapAllocator::from_config(Arc::clone(&store), &config);
//!
//! // Current maximum is 10; make the next record number 15.
//! let allocation = allocator.allocate(15).await?;
//! assert_eq!(allocation.next_id.get(), 15);
//!
//! let id = store.insert_record(RecordFields::post("Hello", "World"), None).await?;
//! assert_eq!(id.get(), 15);
//! ```

mod allocator;
mod config;
mod error;
mod guard;
mod inspector;
mod model;
mod report;
mod serde;
mod settings;
mod storage;
mod store;

pub use allocator::{Allocation, GapAllocator};
pub use config::{
    AllocatorConfig, Config, INVALID_TARGET_MESSAGE, Messages, PlacementStrategy, ReportingConfig,
};
pub use error::{
    AllocationError, AllocationResult, ConfigError, Error, InvalidTargetReason, Result,
};
pub use guard::{AllocationGuard, AllowAll, Fixed, NoRecordInStatus};
pub use inspector::SequenceInspector;
pub use model::{
    ContentRecord, PLACEHOLDER_BODY, PLACEHOLDER_SLUG, PLACEHOLDER_TITLE, RecordFields, RecordId,
    RecordStatus,
};
pub use report::{ErrorReporter, LogForwarder, TracingForwarder};
pub use settings::{Notice, SettingsForm, SettingsPage, parse_target};
pub use store::{ContentStore, SequenceLock};
