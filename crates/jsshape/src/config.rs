//! Tunables for the shape graph and indexed storage.

/// Largest index (exclusive) that is kept in the contiguous element vector.
pub const MAX_VECTOR_SIZE: u32 = 10000;
/// Shrinking `length` by at least this many elements on a sparse array
/// enumerates existing keys instead of probing every index.
pub const SHRINK_SCAN_THRESHOLD: u32 = 1 << 24;
/// Minimal slot storage handed out by [`crate::structure::Structure::storage_capacity`].
pub const INITIAL_SLOT_CAPACITY: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    pub max_vector_size: u32,
    pub shrink_scan_threshold: u32,
    pub initial_slot_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_vector_size: MAX_VECTOR_SIZE,
            shrink_scan_threshold: SHRINK_SCAN_THRESHOLD,
            initial_slot_capacity: INITIAL_SLOT_CAPACITY,
        }
    }
}

impl Config {
    /// Defaults overridden by `JSSHAPE_MAX_VECTOR_SIZE`,
    /// `JSSHAPE_SHRINK_SCAN_THRESHOLD` and `JSSHAPE_SLOT_CAPACITY`.
    ///
    /// Values accept a `K`, `M` or `G` suffix (optionally followed by `B`).
    /// Unparsable or zero values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(size) = read_uint_from_env("JSSHAPE_MAX_VECTOR_SIZE") {
            config.max_vector_size = clamp_u32(size);
        }
        if let Some(threshold) = read_uint_from_env("JSSHAPE_SHRINK_SCAN_THRESHOLD") {
            config.shrink_scan_threshold = clamp_u32(threshold);
        }
        if let Some(capacity) = read_uint_from_env("JSSHAPE_SLOT_CAPACITY") {
            config.initial_slot_capacity = capacity;
        }
        tracing::debug!(
            target: "jsshape::config",
            max_vector_size = config.max_vector_size,
            shrink_scan_threshold = config.shrink_scan_threshold,
            initial_slot_capacity = config.initial_slot_capacity,
            "configuration loaded"
        );
        config
    }

    pub fn with_max_vector_size(mut self, size: u32) -> Self {
        self.max_vector_size = size.max(1);
        self
    }

    pub fn with_shrink_scan_threshold(mut self, threshold: u32) -> Self {
        self.shrink_scan_threshold = threshold.max(1);
        self
    }

    pub fn with_initial_slot_capacity(mut self, capacity: usize) -> Self {
        self.initial_slot_capacity = capacity.max(1);
        self
    }
}

fn clamp_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

pub fn read_uint_from_env(var: &str) -> Option<usize> {
    let value = std::env::var(var).ok()?;
    parse_size(&value).filter(|&size| size != 0)
}

fn parse_size(value: &str) -> Option<usize> {
    let mut value = value.trim();
    if value.len() > 1 && (value.ends_with('b') || value.ends_with('B')) {
        value = &value[..value.len() - 1];
    }
    let (digits, factor) = match value.as_bytes().last()? {
        b'g' | b'G' => (&value[..value.len() - 1], 1024 * 1024 * 1024),
        b'm' | b'M' => (&value[..value.len() - 1], 1024 * 1024),
        b'k' | b'K' => (&value[..value.len() - 1], 1024),
        _ => (value, 1),
    };
    let number = digits.trim().parse::<f64>().ok()?;
    if !number.is_finite() || number < 0.0 {
        return None;
    }
    Some((number * factor as f64) as usize)
}
