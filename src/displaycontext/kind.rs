use serde::{Deserialize, Serialize};
use std::fmt;

/// Family of display options.
///
/// Kinds form a static hierarchy: each kind declares the kinds it extends in
/// [`OptionKind::supertypes`]. Property lists, widget specs and strings are all
/// looked up by walking this hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptionKind {
    Display,
    DisplayOpts,
    NiftiOpts,
    ColourMapOpts,
    VolumeOpts,
    MaskOpts,
    LabelOpts,
    VectorOpts,
    RgbVectorOpts,
    LineVectorOpts,
    TensorOpts,
    ShOpts,
    MeshOpts,
    GiftiOpts,
}

impl OptionKind {
    pub const ALL: [OptionKind; 14] = [
        OptionKind::Display,
        OptionKind::DisplayOpts,
        OptionKind::NiftiOpts,
        OptionKind::ColourMapOpts,
        OptionKind::VolumeOpts,
        OptionKind::MaskOpts,
        OptionKind::LabelOpts,
        OptionKind::VectorOpts,
        OptionKind::RgbVectorOpts,
        OptionKind::LineVectorOpts,
        OptionKind::TensorOpts,
        OptionKind::ShOpts,
        OptionKind::MeshOpts,
        OptionKind::GiftiOpts,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            OptionKind::Display => "Display",
            OptionKind::DisplayOpts => "DisplayOpts",
            OptionKind::NiftiOpts => "NiftiOpts",
            OptionKind::ColourMapOpts => "ColourMapOpts",
            OptionKind::VolumeOpts => "VolumeOpts",
            OptionKind::MaskOpts => "MaskOpts",
            OptionKind::LabelOpts => "LabelOpts",
            OptionKind::VectorOpts => "VectorOpts",
            OptionKind::RgbVectorOpts => "RGBVectorOpts",
            OptionKind::LineVectorOpts => "LineVectorOpts",
            OptionKind::TensorOpts => "TensorOpts",
            OptionKind::ShOpts => "SHOpts",
            OptionKind::MeshOpts => "MeshOpts",
            OptionKind::GiftiOpts => "GiftiOpts",
        }
    }

    /// The kinds this kind directly extends, in declaration order.
    pub fn supertypes(&self) -> &'static [OptionKind] {
        match self {
            OptionKind::Display | OptionKind::DisplayOpts | OptionKind::ColourMapOpts => &[],
            OptionKind::NiftiOpts => &[OptionKind::DisplayOpts],
            OptionKind::VolumeOpts => &[OptionKind::ColourMapOpts, OptionKind::NiftiOpts],
            OptionKind::MaskOpts | OptionKind::LabelOpts | OptionKind::VectorOpts => {
                &[OptionKind::NiftiOpts]
            }
            OptionKind::RgbVectorOpts
            | OptionKind::LineVectorOpts
            | OptionKind::TensorOpts
            | OptionKind::ShOpts => &[OptionKind::VectorOpts],
            OptionKind::MeshOpts => &[OptionKind::ColourMapOpts, OptionKind::DisplayOpts],
            OptionKind::GiftiOpts => &[OptionKind::MeshOpts],
        }
    }

    /// This kind followed by all of its ancestors, depth first in declaration
    /// order. A kind reachable along several paths appears once, at its first
    /// position.
    pub fn ancestry(&self) -> Vec<OptionKind> {
        let mut out = Vec::new();
        let mut stack = vec![*self];
        while let Some(kind) = stack.pop() {
            if out.contains(&kind) {
                continue;
            }
            out.push(kind);
            stack.extend(kind.supertypes().iter().rev());
        }
        out
    }

    pub fn is_a(&self, other: OptionKind) -> bool {
        self.ancestry().contains(&other)
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value of the `overlayType` property of a display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OverlayType {
    Volume,
    Mask,
    Label,
    RgbVector,
    LineVector,
    Tensor,
    Sh,
    Mesh,
    GiftiMesh,
}

impl OverlayType {
    pub const ALL: [OverlayType; 9] = [
        OverlayType::Volume,
        OverlayType::Mask,
        OverlayType::Label,
        OverlayType::RgbVector,
        OverlayType::LineVector,
        OverlayType::Tensor,
        OverlayType::Sh,
        OverlayType::Mesh,
        OverlayType::GiftiMesh,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            OverlayType::Volume => "volume",
            OverlayType::Mask => "mask",
            OverlayType::Label => "label",
            OverlayType::RgbVector => "rgbvector",
            OverlayType::LineVector => "linevector",
            OverlayType::Tensor => "tensor",
            OverlayType::Sh => "sh",
            OverlayType::Mesh => "mesh",
            OverlayType::GiftiMesh => "giftimesh",
        }
    }

    pub fn from_key(key: &str) -> Option<OverlayType> {
        OverlayType::ALL.into_iter().find(|t| t.key() == key)
    }

    /// The options kind created for overlays displayed as this type.
    pub fn option_kind(&self) -> OptionKind {
        match self {
            OverlayType::Volume => OptionKind::VolumeOpts,
            OverlayType::Mask => OptionKind::MaskOpts,
            OverlayType::Label => OptionKind::LabelOpts,
            OverlayType::RgbVector => OptionKind::RgbVectorOpts,
            OverlayType::LineVector => OptionKind::LineVectorOpts,
            OverlayType::Tensor => OptionKind::TensorOpts,
            OverlayType::Sh => OptionKind::ShOpts,
            OverlayType::Mesh => OptionKind::MeshOpts,
            OverlayType::GiftiMesh => OptionKind::GiftiOpts,
        }
    }
}

impl fmt::Display for OverlayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
