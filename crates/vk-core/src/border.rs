use serde::{Deserialize, Serialize};

/// How a sample index outside `[0, len)` is resolved.
///
/// `Constant` has no source index: callers substitute the carried value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BorderMode<T> {
    Clamp,
    Constant(T),
    Reflect101,
    Wrap,
}

impl<T: Default> BorderMode<T> {
    /// Treats samples outside the image as zero.
    pub fn zero() -> Self {
        Self::Constant(T::default())
    }
}

pub fn map_index<T>(i: isize, len: usize, mode: &BorderMode<T>) -> Option<usize> {
    match mode {
        BorderMode::Constant(_) => {
            if i >= 0 && (i as usize) < len {
                Some(i as usize)
            } else {
                None
            }
        }
        BorderMode::Clamp => {
            if len == 0 {
                return None;
            }
            if i < 0 {
                Some(0)
            } else {
                let idx = i as usize;
                Some(idx.min(len - 1))
            }
        }
        BorderMode::Reflect101 => {
            if len == 0 {
                return None;
            }
            if len == 1 {
                return Some(0);
            }

            let period = (2 * len - 2) as isize;
            let r = i.rem_euclid(period) as usize;
            if r < len {
                Some(r)
            } else {
                Some((2 * len - 2) - r)
            }
        }
        BorderMode::Wrap => {
            if len == 0 {
                return None;
            }
            Some(i.rem_euclid(len as isize) as usize)
        }
    }
}
