use crate::displaycontext::OverlayType;
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Number of coefficients of a symmetric SH fit, for orders 0 to 16.
pub const SH_SYMMETRIC_COEFFICIENTS: [usize; 9] = [1, 6, 15, 28, 45, 66, 91, 120, 153];

/// Number of coefficients of an asymmetric SH fit, for orders 0 to 16.
pub const SH_ASYMMETRIC_COEFFICIENTS: [usize; 9] = [1, 9, 25, 49, 81, 121, 169, 225, 289];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayId(Uuid);

impl OverlayId {
    pub fn new() -> Self {
        OverlayId(Uuid::new_v4())
    }
}

impl Default for OverlayId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OverlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// NIfTI intent of an image, as far as it affects the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Intent {
    #[default]
    None,
    RgbVector,
    Other(i16),
}

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayData {
    Image {
        shape: Vec<usize>,
        intent: Intent,
        data_range: [f64; 2],
    },
    Mesh {
        vertex_count: usize,
        source: PathBuf,
    },
}

/// A loaded overlay. Only the metadata the display options depend on is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub id: OverlayId,
    pub name: String,
    pub data: OverlayData,
}

impl Overlay {
    pub fn image(name: &str, shape: &[usize], intent: Intent, data_range: [f64; 2]) -> Self {
        Overlay {
            id: OverlayId::new(),
            name: name.to_string(),
            data: OverlayData::Image {
                shape: shape.to_vec(),
                intent,
                data_range,
            },
        }
    }

    pub fn mesh(name: &str, vertex_count: usize, source: impl AsRef<Path>) -> Self {
        Overlay {
            id: OverlayId::new(),
            name: name.to_string(),
            data: OverlayData::Mesh {
                vertex_count,
                source: source.as_ref().to_path_buf(),
            },
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self.data, OverlayData::Image { .. })
    }

    pub fn is_gifti(&self) -> bool {
        match &self.data {
            OverlayData::Mesh { source, .. } => source
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.to_ascii_lowercase().ends_with(".gii")),
            OverlayData::Image { .. } => false,
        }
    }

    pub fn is_4d(&self) -> bool {
        match &self.data {
            OverlayData::Image { shape, .. } => shape.len() > 3 && shape[3] > 1,
            OverlayData::Mesh { .. } => false,
        }
    }

    /// Number of volumes along the fourth dimension, 1 for 3D images and meshes.
    pub fn num_volumes(&self) -> usize {
        match &self.data {
            OverlayData::Image { shape, .. } if shape.len() > 3 => shape[3].max(1),
            _ => 1,
        }
    }

    pub fn data_range(&self) -> [f64; 2] {
        match &self.data {
            OverlayData::Image { data_range, .. } => *data_range,
            OverlayData::Mesh { .. } => [0.0, 1.0],
        }
    }

    /// Overlay types this overlay may be displayed as. The first entry is the default.
    pub fn possible_overlay_types(&self) -> Vec<OverlayType> {
        let (shape, intent) = match &self.data {
            OverlayData::Image { shape, intent, .. } => (shape, *intent),
            OverlayData::Mesh { .. } => {
                return if self.is_gifti() {
                    vec![OverlayType::GiftiMesh, OverlayType::Mesh]
                } else {
                    vec![OverlayType::Mesh]
                };
            }
        };

        let mut types = vec![
            OverlayType::Volume,
            OverlayType::Mask,
            OverlayType::RgbVector,
            OverlayType::LineVector,
            OverlayType::Label,
            OverlayType::Sh,
            OverlayType::Tensor,
        ];

        let components = if shape.len() == 4 { Some(shape[3]) } else { None };
        let could_be_vector = components == Some(3);
        let could_be_tensor = components == Some(6);
        let could_be_sh = components.is_some_and(|c| {
            SH_SYMMETRIC_COEFFICIENTS.contains(&c) || SH_ASYMMETRIC_COEFFICIENTS.contains(&c)
        });

        if could_be_vector {
            if intent == Intent::RgbVector {
                types.retain(|t| !matches!(t, OverlayType::RgbVector | OverlayType::LineVector));
                types.insert(0, OverlayType::LineVector);
                types.insert(0, OverlayType::RgbVector);
            }
        } else {
            types.retain(|t| !matches!(t, OverlayType::RgbVector | OverlayType::LineVector));
        }
        if !could_be_sh {
            types.retain(|t| *t != OverlayType::Sh);
        }
        if !could_be_tensor {
            types.retain(|t| *t != OverlayType::Tensor);
        }
        types
    }
}
