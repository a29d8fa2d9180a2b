//! # Common — shared contracts for the StratumKV storage core
//!
//! Home of the pieces every other crate leans on:
//!
//! - [`Error`] / [`Result`]: the status kinds that cross layer boundaries.
//! - [`Comparator`]: the three-way ordering contract, plus
//!   [`BytewiseComparator`] and [`InternalKeyComparator`].
//! - Internal-key encoding: `user_key | fixed64((seq << 8) | type)` and
//!   the [`LookupKey`] snapshot-read helper.
//! - [`FilterPolicy`]: the probabilistic-filter capability consumed by the
//!   sstable filter block (implemented by the `bloom` crate).
//! - [`Iter`]: the cursor contract shared by memtable, block, merging and
//!   two-level iterators.

mod comparator;
mod error;
mod filter;
mod iter;
mod key;

pub use comparator::{BytewiseComparator, Comparator, InternalKeyComparator};
pub use error::{Error, Result};
pub use filter::FilterPolicy;
pub use iter::{EmptyIter, Iter};
pub use key::{
    append_internal_key, extract_user_key, pack_sequence_and_type, LookupKey, SequenceNumber,
    ValueType, MAX_SEQUENCE_NUMBER, TYPE_FOR_SEEK,
};

#[cfg(test)]
mod tests;
