/// Index-keyed cache for the memoized strategy.
///
/// Owned by the caller and never evicts; `clear` is the only reset. Both
/// counters survive across calls so repeated work can be compared.
#[derive(Default, Clone, Debug)]
pub struct MemoCache {
    values: Vec<Option<u64>>,
    computations: u64,
    lookups: u64,
}

impl MemoCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// F(n) via the defining recurrence, consulting the cache first.
    /// Requires `n <= MAX_INDEX`.
    pub fn fib(&mut self, n: u32) -> u64 {
        if let Some(value) = self.get(n) {
            self.lookups += 1;
            return value;
        }
        let value = if n <= 1 {
            n as u64
        } else {
            self.fib(n - 1) + self.fib(n - 2)
        };
        self.computations += 1;
        self.store(n, value);
        value
    }

    pub fn get(&self, n: u32) -> Option<u64> {
        self.values.get(n as usize).copied().flatten()
    }

    fn store(&mut self, n: u32, value: u64) {
        let slot = n as usize;
        if self.values.len() <= slot {
            self.values.resize(slot + 1, None);
        }
        self.values[slot] = Some(value);
    }

    /// Number of indices currently cached.
    pub fn len(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Recurrence applications that missed the cache.
    pub fn computations(&self) -> u64 {
        self.computations
    }

    /// Calls answered straight from the cache.
    pub fn lookups(&self) -> u64 {
        self.lookups
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.computations = 0;
        self.lookups = 0;
    }
}
