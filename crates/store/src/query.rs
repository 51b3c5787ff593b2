/// Builder for an ordered range over the `orders` table.
///
/// Rows are always ordered by ascending order id; the range selects a
/// window of that ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderRange {
    /// Number of orders to skip.
    pub skip: usize,

    /// Maximum number of orders to return.
    pub take: Option<usize>,
}

impl OrderRange {
    /// Creates a range covering every order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Skips this many orders before returning results.
    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    /// Limits the number of orders returned.
    pub fn take(mut self, take: usize) -> Self {
        self.take = Some(take);
        self
    }
}
