//! Structural description of each cell's renderable shape.
//!
//! A blueprint is expressed in unit space: the body is a sphere of radius 1
//! squashed along Y, and every part is a small sphere placed relative to the
//! body centre. The renderer scales the whole thing by the cell's size.

use bevy_math::Vec3;
use std::f32::consts::{PI, TAU};

use crate::category::Category;

/// Number of surface bumps on a white cell.
pub const WHITE_BUMP_COUNT: usize = 15;
/// Distance of each bump from the white cell centre.
pub const WHITE_BUMP_DISTANCE: f32 = 0.85;
/// Radius of a white cell bump.
pub const WHITE_BUMP_RADIUS: f32 = 0.25;

/// Number of granules embedded in a platelet.
pub const PLATELET_GRANULE_COUNT: usize = 5;
/// Radius of the ring the granules sit on.
pub const PLATELET_GRANULE_RING: f32 = 0.5;
/// Radius of a platelet granule.
pub const PLATELET_GRANULE_RADIUS: f32 = 0.4;

const BODY_SHININESS: f32 = 50.0;
const BUMP_SHININESS: f32 = 35.0;

/// A decorative sphere attached to the body.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    /// Centre of the part relative to the body centre.
    pub offset: Vec3,
    /// Sphere radius in unit space.
    pub radius: f32,
    /// Colour as 0xRRGGBB.
    pub color: u32,
    /// Phong-style shininess (0-100).
    pub shininess: f32,
}

/// Renderable shape for one category.
#[derive(Debug, Clone, PartialEq)]
pub struct Blueprint {
    pub category: Category,
    /// Body colour as 0xRRGGBB.
    pub color: u32,
    /// Vertical scale of the body sphere.
    pub flattening: f32,
    /// Phong-style shininess of the body (0-100).
    pub shininess: f32,
    pub parts: Vec<Part>,
}

/// Build the blueprint for a category.
pub fn blueprint(category: Category) -> Blueprint {
    let profile = category.profile();
    let parts = match category {
        Category::Red => Vec::new(),
        Category::White => white_bumps(profile.secondary_color),
        Category::Platelet => platelet_granules(profile.secondary_color),
    };

    Blueprint {
        category,
        color: profile.color,
        flattening: profile.flattening,
        shininess: BODY_SHININESS,
        parts,
    }
}

/// Point from spherical coordinates, polar angle measured from +Y.
pub fn from_spherical(radius: f32, phi: f32, theta: f32) -> Vec3 {
    let ring = radius * phi.sin();
    Vec3::new(ring * theta.sin(), radius * phi.cos(), ring * theta.cos())
}

fn white_bumps(color: u32) -> Vec<Part> {
    let count = WHITE_BUMP_COUNT as f32;
    (0..WHITE_BUMP_COUNT)
        .map(|i| {
            let phi = (-1.0 + 2.0 * i as f32 / count).acos();
            let theta = (count * PI).sqrt() * phi;
            Part {
                offset: from_spherical(WHITE_BUMP_DISTANCE, phi, theta),
                radius: WHITE_BUMP_RADIUS,
                color,
                shininess: BUMP_SHININESS,
            }
        })
        .collect()
}

fn platelet_granules(color: u32) -> Vec<Part> {
    (0..PLATELET_GRANULE_COUNT)
        .map(|i| {
            let angle = i as f32 / PLATELET_GRANULE_COUNT as f32 * TAU;
            Part {
                offset: Vec3::new(
                    PLATELET_GRANULE_RING * angle.cos(),
                    0.0,
                    PLATELET_GRANULE_RING * angle.sin(),
                ),
                radius: PLATELET_GRANULE_RADIUS,
                color,
                shininess: BODY_SHININESS,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_red_cell_is_plain_disc() {
        let red = blueprint(Category::Red);
        assert!(red.parts.is_empty());
        assert_eq!(red.flattening, 0.3);
        assert_eq!(red.color, 0xe74c3c);
    }

    #[test]
    fn test_white_bumps_sit_on_surface_shell() {
        let white = blueprint(Category::White);
        assert_eq!(white.parts.len(), WHITE_BUMP_COUNT);
        for part in &white.parts {
            assert!((part.offset.length() - WHITE_BUMP_DISTANCE).abs() < 1e-4);
            assert_eq!(part.color, 0xbdc3c7);
        }
        // First bump is at the south pole: acos(-1) = PI
        let first = white.parts[0].offset;
        assert!((first.y + WHITE_BUMP_DISTANCE).abs() < 1e-4);
    }

    #[test]
    fn test_white_bumps_are_deterministic() {
        assert_eq!(blueprint(Category::White), blueprint(Category::White));
    }

    #[test]
    fn test_platelet_granules_evenly_spaced() {
        let platelet = blueprint(Category::Platelet);
        assert_eq!(platelet.parts.len(), PLATELET_GRANULE_COUNT);
        assert_eq!(platelet.flattening, 0.4);

        let first = platelet.parts[0].offset;
        assert!((first - Vec3::new(0.5, 0.0, 0.0)).length() < 1e-6);

        for pair in platelet.parts.windows(2) {
            let a = pair[0].offset;
            let b = pair[1].offset;
            assert_eq!(a.y, 0.0);
            let angle = a.angle_between(b);
            assert!((angle - TAU / 5.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_from_spherical_axes() {
        let up = from_spherical(2.0, 0.0, 1.0);
        assert!((up - Vec3::new(0.0, 2.0, 0.0)).length() < 1e-6);

        let forward = from_spherical(1.0, PI / 2.0, 0.0);
        assert!((forward - Vec3::Z).length() < 1e-6);
    }
}
