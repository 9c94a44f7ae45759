//! Cosmetic tag selection.

use crate::model::schedule::{BounceSpeed, CosmeticTags, StarColor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Picks the cosmetic tags attached to a freshly completed task.
pub trait TagSource {
    fn pick_color(&mut self) -> StarColor;
    fn pick_bounce_speed(&mut self) -> BounceSpeed;

    fn pick(&mut self) -> CosmeticTags {
        CosmeticTags {
            color: self.pick_color(),
            bounce_speed: self.pick_bounce_speed(),
        }
    }
}

/// Uniform picks from the full variant lists.
pub struct RandomTagSource {
    rng: StdRng,
}

impl RandomTagSource {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible sequence for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl TagSource for RandomTagSource {
    fn pick_color(&mut self) -> StarColor {
        StarColor::ALL[self.rng.gen_range(0..StarColor::ALL.len())]
    }

    fn pick_bounce_speed(&mut self) -> BounceSpeed {
        BounceSpeed::ALL[self.rng.gen_range(0..BounceSpeed::ALL.len())]
    }
}
