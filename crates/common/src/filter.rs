/// Probabilistic-filter capability consumed by the sstable filter block.
///
/// Filters are advisory: `key_may_match` may return false positives but
/// must never return a false negative for a key that was in the
/// `create_filter` input.
pub trait FilterPolicy: Send + Sync {
    /// Identity of this filter scheme. The table reader looks up the
    /// filter block under the metaindex key `"filter." + name()`, so
    /// changing the name orphans existing filters (which is safe — they
    /// are just ignored).
    fn name(&self) -> &'static str;

    /// Appends a filter summarizing `keys` to `dst`. Keys may contain
    /// duplicates.
    fn create_filter(&self, keys: &[&[u8]], dst: &mut Vec<u8>);

    /// True if `key` may be in the set `filter` was built from; `filter`
    /// is exactly the bytes one `create_filter` call appended.
    fn key_may_match(&self, key: &[u8], filter: &[u8]) -> bool;
}
