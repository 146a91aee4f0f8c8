//! Cell categories and their fixed visual constants.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three kinds of cell carried by the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Red blood cell: a flattened disc.
    Red,
    /// White blood cell: a bumpy sphere.
    White,
    /// Platelet: a small disc with granules.
    Platelet,
}

/// Per-category constants shared by the kinematics and the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryProfile {
    /// Body colour as 0xRRGGBB.
    pub color: u32,
    /// Colour of decorative sub-shapes as 0xRRGGBB.
    pub secondary_color: u32,
    /// Nominal cell radius in world units before per-cell variation.
    pub base_size: f32,
    /// Vertical squash applied to the unit-sphere body (1.0 = round).
    pub flattening: f32,
}

const RED: CategoryProfile = CategoryProfile {
    color: 0xe74c3c,
    secondary_color: 0xc0392b,
    base_size: 4.0,
    flattening: 0.3,
};

const WHITE: CategoryProfile = CategoryProfile {
    color: 0xecf0f1,
    secondary_color: 0xbdc3c7,
    base_size: 6.0,
    flattening: 1.0,
};

const PLATELET: CategoryProfile = CategoryProfile {
    color: 0xf1c40f,
    secondary_color: 0xf39c12,
    base_size: 2.5,
    flattening: 0.4,
};

impl Category {
    /// All categories in population order.
    pub const ALL: [Category; 3] = [Category::Red, Category::White, Category::Platelet];

    /// Get the constants for this category.
    pub fn profile(self) -> &'static CategoryProfile {
        match self {
            Category::Red => &RED,
            Category::White => &WHITE,
            Category::Platelet => &PLATELET,
        }
    }

    /// Largest base size across all categories.
    pub fn max_base_size() -> f32 {
        Self::ALL
            .iter()
            .map(|c| c.profile().base_size)
            .fold(0.0, f32::max)
    }

    /// Short human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Category::Red => "Red cells",
            Category::White => "White cells",
            Category::Platelet => "Platelets",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Global per-category visibility flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryVisibility {
    pub red: bool,
    pub white: bool,
    pub platelet: bool,
}

impl Default for CategoryVisibility {
    fn default() -> Self {
        Self::all_visible()
    }
}

impl CategoryVisibility {
    /// Every category shown.
    pub const fn all_visible() -> Self {
        Self {
            red: true,
            white: true,
            platelet: true,
        }
    }

    /// Whether cells of `category` are shown.
    pub fn get(&self, category: Category) -> bool {
        match category {
            Category::Red => self.red,
            Category::White => self.white,
            Category::Platelet => self.platelet,
        }
    }

    /// Set the flag for `category`, returning the previous value.
    pub fn set(&mut self, category: Category, visible: bool) -> bool {
        let slot = match category {
            Category::Red => &mut self.red,
            Category::White => &mut self.white,
            Category::Platelet => &mut self.platelet,
        };
        std::mem::replace(slot, visible)
    }
}
