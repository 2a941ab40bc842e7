//! Static envelope index for window queries.
//!
//! Entries are sorted once by `min_x`; a query binary-searches the last entry
//! that can start left of the window's right edge and filters the prefix by
//! envelope overlap.

use super::primitives::Envelope;

#[derive(Clone, Debug, Default)]
pub struct EnvelopeIndex {
    entries: Vec<(Envelope, usize)>,
}

impl EnvelopeIndex {
    pub fn build<I>(items: I) -> Self
    where
        I: IntoIterator<Item = (Envelope, usize)>,
    {
        let mut entries: Vec<(Envelope, usize)> = items.into_iter().collect();
        entries.sort_by(|a, b| a.0.min_x.total_cmp(&b.0.min_x).then(a.1.cmp(&b.1)));
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Payloads whose envelope intersects `window`, in ascending order.
    pub fn query(&self, window: &Envelope) -> Vec<usize> {
        let end = self
            .entries
            .partition_point(|(env, _)| env.min_x <= window.max_x);
        let mut hits: Vec<usize> = self.entries[..end]
            .iter()
            .filter(|(env, _)| env.intersects(window))
            .map(|&(_, item)| item)
            .collect();
        hits.sort_unstable();
        hits
    }
}
