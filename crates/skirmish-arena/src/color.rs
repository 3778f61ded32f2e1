//! Color slot allocation.

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorPolicy {
    /// Lowest free index in `[0, colors_length)`, falling back to 0 when
    /// every slot is taken.
    #[default]
    ScanUnique,
    /// Uniform draw from `[1, colors_length]`. Collisions allowed.
    RandomNonunique,
}

/// Hands out color indices to joining players.
///
/// The scan policy tracks indices in use as a multiset: the fallback color
/// can be held by several players at once and each release frees exactly
/// one holder.
#[derive(Debug, Clone)]
pub enum ColorPool {
    ScanUnique { colors_length: u32, in_use: Vec<u32> },
    RandomNonunique { colors_length: u32 },
}

impl ColorPool {
    pub fn new(policy: ColorPolicy, colors_length: u32) -> Self {
        match policy {
            ColorPolicy::ScanUnique => Self::ScanUnique {
                colors_length,
                in_use: Vec::new(),
            },
            ColorPolicy::RandomNonunique => Self::RandomNonunique { colors_length },
        }
    }

    pub fn allocate<R: Rng>(&mut self, rng: &mut R) -> u32 {
        match self {
            Self::ScanUnique {
                colors_length,
                in_use,
            } => {
                let color = (0..*colors_length)
                    .find(|c| !in_use.contains(c))
                    .unwrap_or(0);
                in_use.push(color);
                color
            }
            Self::RandomNonunique { colors_length } => {
                rng.random_range(1..=(*colors_length).max(1))
            }
        }
    }

    /// Gives one holder's color back. Unknown colors are ignored.
    pub fn release(&mut self, color: u32) {
        if let Self::ScanUnique { in_use, .. } = self {
            if let Some(pos) = in_use.iter().position(|&c| c == color) {
                in_use.swap_remove(pos);
            }
        }
    }

    /// Indices currently held. Always empty for the random policy.
    pub fn in_use(&self) -> &[u32] {
        match self {
            Self::ScanUnique { in_use, .. } => in_use,
            Self::RandomNonunique { .. } => &[],
        }
    }
}
