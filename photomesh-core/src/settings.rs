//! Generation settings

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Settings bundle controlling every stage of 3D photo generation.
///
/// Most settings should stay on their defaults; the switches exist to
/// produce intermediate visualisations of the algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Name used for generated textures and materials
    pub identifier: String,
    /// Project vertices out from a virtual camera instead of using depth as Z
    pub project_from_origin: bool,
    /// The depth map stores disparity, convert it to depth before use
    pub convert_disparity_to_depth: bool,
    /// Clamp near background outliers and median-filter distances
    pub remove_outliers: bool,
    /// Mean-filter vertex distances
    pub smooth_mesh: bool,
    /// Average XYZ of foreground silhouette vertices to remove jaggies
    pub smooth_foreground_edges: bool,
    /// Emit separate foreground and background meshes instead of one mesh
    pub separate_foreground_background: bool,
    pub generate_foreground: bool,
    pub generate_background: bool,
    /// Fill occlusion holes behind the foreground
    pub generate_inpainted: bool,
    /// Extend the background beyond the original field of view
    pub generate_outpainted: bool,
    pub perform_simplification: bool,
    /// Side length cap, in grid cells, of a region the simplifier may collapse
    pub largest_simplified_region_size: usize,
    /// Largest distance spread a region may have and still count as flat
    pub maximum_delta_distance: f32,
    /// Render the foreground with an alpha-feathered material
    pub foreground_feathering: bool,
    /// Affects how flat the foreground ends up after disparity conversion
    pub max_depth: f32,
    /// Scene depth range after disparity conversion
    pub max_distance: f32,
    /// Replace every depth sample with a constant
    pub depth_override: Option<f32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            identifier: String::from("photo"),
            project_from_origin: true,
            convert_disparity_to_depth: true,
            remove_outliers: true,
            smooth_mesh: true,
            smooth_foreground_edges: true,
            separate_foreground_background: true,
            generate_foreground: true,
            generate_background: true,
            generate_inpainted: true,
            generate_outpainted: true,
            perform_simplification: true,
            largest_simplified_region_size: 256,
            maximum_delta_distance: 0.025,
            foreground_feathering: true,
            max_depth: 1.0,
            max_distance: 1.0,
            depth_override: None,
        }
    }
}

impl Settings {
    /// Reject combinations that would make a generation pass divide by zero or never terminate
    pub fn validate(&self) -> Result<()> {
        if self.largest_simplified_region_size == 0 {
            return Err(Error::InvalidSettings(
                "largest_simplified_region_size must be positive".to_string(),
            ));
        }
        if self
            .largest_simplified_region_size
            .checked_mul(self.largest_simplified_region_size)
            .is_none()
        {
            return Err(Error::InvalidSettings(format!(
                "largest_simplified_region_size {} is too large",
                self.largest_simplified_region_size
            )));
        }
        if !(self.maximum_delta_distance >= 0.0) {
            return Err(Error::InvalidSettings(
                "maximum_delta_distance must be non-negative".to_string(),
            ));
        }
        if self.convert_disparity_to_depth && !(self.max_depth > 0.5) {
            return Err(Error::InvalidSettings(
                "max_depth must be greater than 0.5 when converting disparity".to_string(),
            ));
        }
        if !(self.max_distance > 0.0) {
            return Err(Error::InvalidSettings("max_distance must be positive".to_string()));
        }
        Ok(())
    }
}

/// Field of view the photo was taken with, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraFov {
    pub horizontal: f32,
    pub vertical: f32,
}

impl CameraFov {
    pub fn new(horizontal: f32, vertical: f32) -> Self {
        Self { horizontal, vertical }
    }
}

impl Default for CameraFov {
    fn default() -> Self {
        Self::new(45.0, 58.0)
    }
}
