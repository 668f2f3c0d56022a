/// Per-sample drop flags produced by a validation stage.
///
/// `true` means the sample at that index must be dropped. A mask always has
/// the same length as the track it was computed from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BooleanMask {
    flags: Vec<bool>,
}

impl BooleanMask {
    pub fn all_false(len: usize) -> Self {
        Self {
            flags: vec![false; len],
        }
    }

    pub fn from_flags(flags: Vec<bool>) -> Self {
        Self { flags }
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn is_flagged(&self, index: usize) -> bool {
        self.flags.get(index).copied().unwrap_or(false)
    }

    pub fn flag(&mut self, index: usize) {
        if let Some(f) = self.flags.get_mut(index) {
            *f = true;
        }
    }

    pub fn flagged_count(&self) -> usize {
        self.flags.iter().filter(|f| **f).count()
    }

    pub fn retained_count(&self) -> usize {
        self.len() - self.flagged_count()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.flags
    }
}
