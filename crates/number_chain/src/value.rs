use serde::{Deserialize, Serialize};

/// Identity of a value holder, stable while it moves between cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HolderId(u64);

impl HolderId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Largest power of two that does not exceed `raw`, or `None` for zero.
pub const fn quantize(raw: u32) -> Option<u32> {
    if raw == 0 {
        None
    } else {
        Some(1 << raw.ilog2())
    }
}

/// Exponent of the quantized value, `None` for zero.
pub const fn exponent(raw: u32) -> Option<u32> {
    if raw == 0 { None } else { Some(raw.ilog2()) }
}

/// Two-tier label rule: plain numbers below the threshold, scaled with a
/// suffix above it (`1024` -> `"1K"` with the default format).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelFormat {
    pub threshold_exponent: u32,
    pub scale_divisor: u32,
    pub suffix: String,
}

impl Default for LabelFormat {
    fn default() -> Self {
        Self {
            threshold_exponent: 10,
            scale_divisor: 1000,
            suffix: "K".to_owned(),
        }
    }
}

impl LabelFormat {
    pub fn format(&self, raw: u32) -> String {
        match (quantize(raw), exponent(raw)) {
            (Some(value), Some(exponent))
                if exponent >= self.threshold_exponent && self.scale_divisor > 0 =>
            {
                format!("{}{}", value / self.scale_divisor, self.suffix)
            }
            (Some(value), _) => value.to_string(),
            (None, _) => String::new(),
        }
    }
}

/// The mergeable payload occupying a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueHolder {
    id: HolderId,
    raw: u32,
}

impl ValueHolder {
    pub(crate) const fn new(id: HolderId, raw: u32) -> Self {
        Self { id, raw }
    }

    pub const fn id(&self) -> HolderId {
        self.id
    }

    pub const fn raw(&self) -> u32 {
        self.raw
    }

    /// `None` means the holder counts as empty.
    pub const fn quantized(&self) -> Option<u32> {
        quantize(self.raw)
    }

    pub const fn exponent(&self) -> Option<u32> {
        exponent(self.raw)
    }

    pub fn label(&self, format: &LabelFormat) -> String {
        format.format(self.raw)
    }

    pub(crate) const fn absorb(&mut self, amount: u32) {
        self.raw = self.raw.saturating_add(amount);
    }
}
