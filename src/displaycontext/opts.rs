//! Overlay type specific display options.
//!
//! Each options struct is composed of the property groups it shares with other
//! kinds (`NiftiProps`, `ColourMapProps`, `VectorProps`), flattened into it, and
//! its own fields. The Display owning an options object replaces it whenever the
//! overlay type changes; [`create_opts`] is the factory used for that.

use crate::colourmaps::{colour_map_constraints, lut_constraints, DEFAULT_LUT};
use crate::displaycontext::overlay::{SH_ASYMMETRIC_COEFFICIENTS, SH_SYMMETRIC_COEFFICIENTS};
use crate::displaycontext::{OptionKind, Overlay, OverlayData, OverlayType};
use crate::props::{Constraints, Notifier, PropertyValue, Target, TargetId};
use props_macros::Properties;
use std::path::{Path, PathBuf};

macro_rules! impl_target {
    ($ty:ty, $kind:expr) => {
        impl_target!($ty, $kind, |_: &mut $ty, _: &str| {});
    };
    ($ty:ty, $kind:expr, $hook:expr) => {
        impl Target for $ty {
            fn kind(&self) -> OptionKind {
                $kind
            }

            fn target_id(&self) -> TargetId {
                self.id
            }

            fn notifier(&self) -> &Notifier {
                &self.notifier
            }

            fn notifier_mut(&mut self) -> &mut Notifier {
                &mut self.notifier
            }

            fn after_assign(&mut self, name: &str) {
                ($hook)(self, name)
            }
        }
    };
}

/// Properties shared by all options of NIfTI images.
#[derive(Debug, Clone, Properties)]
pub struct NiftiProps {
    #[property(constraints = "volume_constraints")]
    pub volume: i64,
    #[property(read_only)]
    pub num_volumes: i64,
}

fn volume_constraints(props: &NiftiProps) -> Constraints {
    Constraints::Range {
        min: 0.0,
        max: (props.num_volumes - 1).max(0) as f64,
    }
}

impl NiftiProps {
    pub fn new(overlay: &Overlay) -> Self {
        NiftiProps {
            volume: 0,
            num_volumes: overlay.num_volumes() as i64,
        }
    }
}

/// Properties of everything coloured through a colour map.
#[derive(Debug, Clone, Properties)]
pub struct ColourMapProps {
    #[property(skip)]
    pub data_range: [f64; 2],
    #[property(choice, constraints = "colour_map_constraints")]
    pub cmap: String,
    #[property(choice, constraints = "colour_map_constraints")]
    pub negative_cmap: String,
    pub use_negative_cmap: bool,
    #[property(range(2, 1024))]
    pub cmap_resolution: i64,
    pub interpolate_cmaps: bool,
    pub invert: bool,
    pub invert_clipping: bool,
    pub link_low_ranges: bool,
    pub link_high_ranges: bool,
    #[property(constraints = "data_range_constraints")]
    pub display_range: [f64; 2],
    #[property(constraints = "clipping_range_constraints")]
    pub clipping_range: [f64; 2],
}

fn data_range_constraints(props: &ColourMapProps) -> Constraints {
    Constraints::Range {
        min: props.data_range[0],
        max: props.data_range[1],
    }
}

// The upper clipping bound sits slightly above the data maximum so the
// brightest voxels can be kept.
fn clipping_range_constraints(props: &ColourMapProps) -> Constraints {
    let [low, high] = props.data_range;
    Constraints::Range {
        min: low,
        max: high + (high - low).abs() / 100.0,
    }
}

impl ColourMapProps {
    pub fn new(data_range: [f64; 2]) -> Self {
        let [low, high] = data_range;
        ColourMapProps {
            data_range,
            cmap: "greyscale".to_string(),
            negative_cmap: "greyscale".to_string(),
            use_negative_cmap: false,
            cmap_resolution: 256,
            interpolate_cmaps: false,
            invert: false,
            invert_clipping: false,
            link_low_ranges: true,
            link_high_ranges: false,
            display_range: [low, high],
            clipping_range: [low, high + (high - low).abs() / 100.0],
        }
    }

    /// Copies linked range ends from the display range to the clipping range.
    /// Returns the new clipping range if it changed.
    pub fn sync_linked_ranges(&mut self, changed: &str) -> Option<[f64; 2]> {
        let relevant = matches!(
            changed,
            "displayRange" | "linkLowRanges" | "linkHighRanges"
        );
        if !relevant {
            return None;
        }
        let mut clipping = self.clipping_range;
        if self.link_low_ranges {
            clipping[0] = self.display_range[0];
        }
        if self.link_high_ranges {
            clipping[1] = self.display_range[1];
        }
        clipping[1] = clipping[1].max(clipping[0]);
        if clipping == self.clipping_range {
            return None;
        }
        self.clipping_range = clipping;
        Some(clipping)
    }
}

fn sync_colour_map_links<T: Target>(
    target: &mut T,
    colour: fn(&mut T) -> &mut ColourMapProps,
    name: &str,
) {
    if let Some(clipping) = colour(target).sync_linked_ranges(name) {
        target
            .notifier_mut()
            .notify("clippingRange", &PropertyValue::Range(clipping));
    }
}

/// Properties shared by all vector-like image options.
#[derive(Debug, Clone, Properties)]
pub struct VectorProps {
    pub colour_image: Option<String>,
    pub modulate_image: Option<String>,
    pub clip_image: Option<String>,
    #[property(choice, constraints = "colour_map_constraints")]
    pub cmap: String,
    pub clipping_range: [f64; 2],
    pub modulate_range: [f64; 2],
    pub x_colour: [f32; 4],
    pub y_colour: [f32; 4],
    pub z_colour: [f32; 4],
    pub suppress_x: bool,
    pub suppress_y: bool,
    pub suppress_z: bool,
    #[property(choices("white", "black", "transparent"))]
    pub suppress_mode: String,
    pub orient_flip: bool,
}

impl Default for VectorProps {
    fn default() -> Self {
        VectorProps {
            colour_image: None,
            modulate_image: None,
            clip_image: None,
            cmap: "greyscale".to_string(),
            clipping_range: [0.0, 1.0],
            modulate_range: [0.0, 1.0],
            x_colour: [1.0, 0.0, 0.0, 1.0],
            y_colour: [0.0, 1.0, 0.0, 1.0],
            z_colour: [0.0, 0.0, 1.0, 1.0],
            suppress_x: false,
            suppress_y: false,
            suppress_z: false,
            suppress_mode: "white".to_string(),
            orient_flip: false,
        }
    }
}

#[derive(Debug, Properties)]
pub struct VolumeOpts {
    #[property(skip)]
    id: TargetId,
    #[property(skip)]
    notifier: Notifier,
    #[property(flatten)]
    pub nifti: NiftiProps,
    #[property(flatten)]
    pub colour: ColourMapProps,
    #[property(choices("none", "linear", "spline"))]
    pub interpolation: String,
    pub clip_image: Option<String>,
    pub enable_override_data_range: bool,
    pub override_data_range: [f64; 2],
    #[property(range(0.0, 0.1))]
    pub dithering: f64,
    #[property(range(25, 500))]
    pub num_steps: i64,
    #[property(range(0, 5))]
    pub num_clip_planes: i64,
}

impl VolumeOpts {
    pub fn new(overlay: &Overlay) -> Self {
        let data_range = overlay.data_range();
        VolumeOpts {
            id: TargetId::new(),
            notifier: Notifier::new(),
            nifti: NiftiProps::new(overlay),
            colour: ColourMapProps::new(data_range),
            interpolation: "none".to_string(),
            clip_image: None,
            enable_override_data_range: false,
            override_data_range: data_range,
            dithering: 0.01,
            num_steps: 100,
            num_clip_planes: 0,
        }
    }
}

impl_target!(VolumeOpts, OptionKind::VolumeOpts, |o: &mut VolumeOpts, name: &str| {
    sync_colour_map_links(o, |o| &mut o.colour, name)
});

#[derive(Debug, Properties)]
pub struct MaskOpts {
    #[property(skip)]
    id: TargetId,
    #[property(skip)]
    notifier: Notifier,
    #[property(flatten)]
    pub nifti: NiftiProps,
    pub colour: [f32; 4],
    pub invert: bool,
    #[property(skip)]
    data_range: [f64; 2],
    #[property(constraints = "threshold_constraints")]
    pub threshold: [f64; 2],
}

fn threshold_constraints(opts: &MaskOpts) -> Constraints {
    Constraints::Range {
        min: opts.data_range[0],
        max: opts.data_range[1],
    }
}

impl MaskOpts {
    pub fn new(overlay: &Overlay) -> Self {
        let data_range = overlay.data_range();
        MaskOpts {
            id: TargetId::new(),
            notifier: Notifier::new(),
            nifti: NiftiProps::new(overlay),
            colour: [1.0, 0.0, 0.0, 1.0],
            invert: false,
            data_range,
            threshold: [data_range[0].max(0.01).min(data_range[1]), data_range[1]],
        }
    }
}

impl_target!(MaskOpts, OptionKind::MaskOpts);

#[derive(Debug, Properties)]
pub struct LabelOpts {
    #[property(skip)]
    id: TargetId,
    #[property(skip)]
    notifier: Notifier,
    #[property(flatten)]
    pub nifti: NiftiProps,
    #[property(choice, constraints = "lut_constraints")]
    pub lut: String,
    pub outline: bool,
    #[property(range(0, 10))]
    pub outline_width: i64,
}

impl LabelOpts {
    pub fn new(overlay: &Overlay) -> Self {
        LabelOpts {
            id: TargetId::new(),
            notifier: Notifier::new(),
            nifti: NiftiProps::new(overlay),
            lut: DEFAULT_LUT.to_string(),
            outline: false,
            outline_width: 1,
        }
    }
}

impl_target!(LabelOpts, OptionKind::LabelOpts);

#[derive(Debug, Properties)]
pub struct RgbVectorOpts {
    #[property(skip)]
    id: TargetId,
    #[property(skip)]
    notifier: Notifier,
    #[property(flatten)]
    pub nifti: NiftiProps,
    #[property(flatten)]
    pub vector: VectorProps,
    #[property(choices("none", "linear", "spline"))]
    pub interpolation: String,
}

impl RgbVectorOpts {
    pub fn new(overlay: &Overlay) -> Self {
        RgbVectorOpts {
            id: TargetId::new(),
            notifier: Notifier::new(),
            nifti: NiftiProps::new(overlay),
            vector: VectorProps::default(),
            interpolation: "none".to_string(),
        }
    }
}

impl_target!(RgbVectorOpts, OptionKind::RgbVectorOpts);

#[derive(Debug, Properties)]
pub struct LineVectorOpts {
    #[property(skip)]
    id: TargetId,
    #[property(skip)]
    notifier: Notifier,
    #[property(flatten)]
    pub nifti: NiftiProps,
    #[property(flatten)]
    pub vector: VectorProps,
    pub directed: bool,
    pub unit_length: bool,
    #[property(range(1, 10))]
    pub line_width: i64,
    #[property(range(10, 500))]
    pub length_scale: i64,
}

impl LineVectorOpts {
    pub fn new(overlay: &Overlay) -> Self {
        LineVectorOpts {
            id: TargetId::new(),
            notifier: Notifier::new(),
            nifti: NiftiProps::new(overlay),
            vector: VectorProps::default(),
            directed: false,
            unit_length: true,
            line_width: 1,
            length_scale: 100,
        }
    }
}

impl_target!(LineVectorOpts, OptionKind::LineVectorOpts);

#[derive(Debug, Properties)]
pub struct TensorOpts {
    #[property(skip)]
    id: TargetId,
    #[property(skip)]
    notifier: Notifier,
    #[property(flatten)]
    pub nifti: NiftiProps,
    #[property(flatten)]
    pub vector: VectorProps,
    pub lighting: bool,
    #[property(range(4, 20))]
    pub tensor_resolution: i64,
    #[property(range(50, 600))]
    pub tensor_scale: i64,
}

impl TensorOpts {
    pub fn new(overlay: &Overlay) -> Self {
        TensorOpts {
            id: TargetId::new(),
            notifier: Notifier::new(),
            nifti: NiftiProps::new(overlay),
            vector: VectorProps::default(),
            lighting: true,
            tensor_resolution: 10,
            tensor_scale: 100,
        }
    }
}

impl_target!(TensorOpts, OptionKind::TensorOpts);

#[derive(Debug, Properties)]
pub struct ShOpts {
    #[property(skip)]
    id: TargetId,
    #[property(skip)]
    notifier: Notifier,
    #[property(flatten)]
    pub nifti: NiftiProps,
    #[property(flatten)]
    pub vector: VectorProps,
    #[property(range(3, 10))]
    pub sh_resolution: i64,
    #[property(skip)]
    max_order: i64,
    #[property(constraints = "sh_order_constraints")]
    pub sh_order: i64,
    pub lighting: bool,
    #[property(range(10, 500))]
    pub size: i64,
    #[property(range(0.0, 1.0))]
    pub radius_threshold: f64,
    #[property(choices("radius", "direction"))]
    pub colour_mode: String,
}

fn sh_order_constraints(opts: &ShOpts) -> Constraints {
    Constraints::Range {
        min: 0.0,
        max: opts.max_order as f64,
    }
}

/// Highest SH order a fit with `coefficients` coefficients holds.
pub fn sh_max_order(coefficients: usize) -> Option<i64> {
    SH_SYMMETRIC_COEFFICIENTS
        .iter()
        .position(|c| *c == coefficients)
        .or_else(|| {
            SH_ASYMMETRIC_COEFFICIENTS
                .iter()
                .position(|c| *c == coefficients)
        })
        .map(|index| 2 * index as i64)
}

impl ShOpts {
    pub fn new(overlay: &Overlay) -> Self {
        let coefficients = match &overlay.data {
            OverlayData::Image { shape, .. } => shape.get(3).copied().unwrap_or(1),
            OverlayData::Mesh { .. } => 1,
        };
        let max_order = sh_max_order(coefficients).unwrap_or(0);
        ShOpts {
            id: TargetId::new(),
            notifier: Notifier::new(),
            nifti: NiftiProps::new(overlay),
            vector: VectorProps::default(),
            sh_resolution: 5,
            max_order,
            sh_order: max_order,
            lighting: false,
            size: 100,
            radius_threshold: 0.05,
            colour_mode: "direction".to_string(),
        }
    }
}

impl_target!(ShOpts, OptionKind::ShOpts);

/// Options of surface meshes. GIFTI meshes use the same struct under the
/// `GiftiOpts` kind.
#[derive(Debug, Properties)]
pub struct MeshOpts {
    #[property(skip)]
    id: TargetId,
    #[property(skip)]
    notifier: Notifier,
    #[property(skip)]
    kind: OptionKind,
    #[property(flatten)]
    pub colour_map: ColourMapProps,
    pub ref_image: Option<String>,
    #[property(choices("affine", "pixdim", "pixdim-flip", "id", "torig"))]
    pub coord_space: String,
    pub outline: bool,
    #[property(range(0.1, 10.0))]
    pub outline_width: f64,
    pub colour: [f32; 4],
    #[property(skip)]
    vertex_data_files: Vec<(PathBuf, usize)>,
    #[property(constraints = "vertex_data_constraints")]
    pub vertex_data: Option<String>,
    #[property(constraints = "vertex_data_index_constraints")]
    pub vertex_data_index: i64,
    pub use_lut: bool,
    #[property(choice, constraints = "lut_constraints")]
    pub lut: String,
    pub discard_clipped: bool,
    pub wireframe: bool,
    pub lighting: bool,
}

fn vertex_data_constraints(opts: &MeshOpts) -> Constraints {
    Constraints::Choices(
        opts.vertex_data_files
            .iter()
            .map(|(path, _)| path.display().to_string())
            .collect(),
    )
}

fn vertex_data_index_constraints(opts: &MeshOpts) -> Constraints {
    let columns = opts
        .vertex_data
        .as_ref()
        .and_then(|current| {
            opts.vertex_data_files
                .iter()
                .find(|(path, _)| path.display().to_string() == *current)
        })
        .map(|(_, columns)| *columns)
        .unwrap_or(1);
    Constraints::Range {
        min: 0.0,
        max: columns.saturating_sub(1) as f64,
    }
}

impl MeshOpts {
    pub fn new(overlay: &Overlay, kind: OptionKind) -> Self {
        MeshOpts {
            id: TargetId::new(),
            notifier: Notifier::new(),
            kind,
            colour_map: ColourMapProps::new([0.0, 1.0]),
            ref_image: None,
            coord_space: "pixdim-flip".to_string(),
            outline: false,
            outline_width: 2.0,
            colour: [1.0, 0.0, 0.0, 1.0],
            vertex_data_files: Vec::new(),
            vertex_data: None,
            vertex_data_index: 0,
            use_lut: false,
            lut: DEFAULT_LUT.to_string(),
            discard_clipped: false,
            wireframe: false,
            lighting: overlay.is_gifti(),
        }
    }

    /// Makes a vertex data file with `columns` data columns selectable.
    /// Returns the value to assign to `vertexData` to show it.
    pub fn add_vertex_data(&mut self, path: &Path, columns: usize) -> PropertyValue {
        let key = path.display().to_string();
        if !self.vertex_data_files.iter().any(|(p, _)| p == path) {
            self.vertex_data_files.push((path.to_path_buf(), columns.max(1)));
            log::info!("loaded vertex data {key} with {columns} column(s)");
        }
        PropertyValue::Reference(Some(key))
    }

    pub fn vertex_data_files(&self) -> impl Iterator<Item = &Path> {
        self.vertex_data_files.iter().map(|(path, _)| path.as_path())
    }
}

impl Target for MeshOpts {
    fn kind(&self) -> OptionKind {
        self.kind
    }

    fn target_id(&self) -> TargetId {
        self.id
    }

    fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    fn notifier_mut(&mut self) -> &mut Notifier {
        &mut self.notifier
    }

    fn after_assign(&mut self, name: &str) {
        if name == "vertexData" {
            self.vertex_data_index = 0;
        }
        sync_colour_map_links(self, |o| &mut o.colour_map, name);
    }
}

/// Creates the options object for `overlay` shown as `overlay_type`.
pub fn create_opts(overlay_type: OverlayType, overlay: &Overlay) -> Box<dyn Target> {
    match overlay_type {
        OverlayType::Volume => Box::new(VolumeOpts::new(overlay)),
        OverlayType::Mask => Box::new(MaskOpts::new(overlay)),
        OverlayType::Label => Box::new(LabelOpts::new(overlay)),
        OverlayType::RgbVector => Box::new(RgbVectorOpts::new(overlay)),
        OverlayType::LineVector => Box::new(LineVectorOpts::new(overlay)),
        OverlayType::Tensor => Box::new(TensorOpts::new(overlay)),
        OverlayType::Sh => Box::new(ShOpts::new(overlay)),
        OverlayType::Mesh => Box::new(MeshOpts::new(overlay, OptionKind::MeshOpts)),
        OverlayType::GiftiMesh => Box::new(MeshOpts::new(overlay, OptionKind::GiftiOpts)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::displaycontext::Intent;
    use crate::props::{HasProperties, PropertyError};
    use approx::assert_relative_eq;

    fn t1() -> Overlay {
        Overlay::image("t1", &[64, 64, 32, 4], Intent::None, [0.0, 200.0])
    }

    #[test]
    fn test_volume_opts_exposes_flattened_groups() {
        let opts = VolumeOpts::new(&t1());
        for name in [
            "volume",
            "numVolumes",
            "cmap",
            "negativeCmap",
            "useNegativeCmap",
            "displayRange",
            "interpolation",
            "enableOverrideDataRange",
            "numClipPlanes",
        ] {
            assert!(opts.has_property(name), "{name}");
        }
        assert_eq!(opts.kind(), OptionKind::VolumeOpts);
    }

    #[test]
    fn test_volume_index_is_limited_by_volume_count() {
        let mut opts = VolumeOpts::new(&t1());
        opts.set_property("volume", PropertyValue::Int(10)).unwrap();
        assert_eq!(opts.nifti.volume, 3);
    }

    #[test]
    fn test_volume_count_cannot_be_written() {
        let mut opts = VolumeOpts::new(&t1());
        assert_eq!(
            opts.set_property("numVolumes", PropertyValue::Int(50)),
            Err(PropertyError::ReadOnly("numVolumes".to_string()))
        );
        assert_eq!(opts.get_property("numVolumes"), Some(PropertyValue::Int(4)));
        opts.set_property("volume", PropertyValue::Int(40)).unwrap();
        assert_eq!(opts.nifti.volume, 3);
    }

    #[test]
    fn test_scalar_is_rejected_for_narrow_display_range() {
        let overlay = Overlay::image("fa", &[8, 8, 8], Intent::None, [0.2, 0.8]);
        let mut opts = VolumeOpts::new(&overlay);
        assert_eq!(
            opts.set_property("displayRange", PropertyValue::Int(1)),
            Err(PropertyError::TypeMismatch {
                expected: "range",
                found: "int"
            })
        );
        opts.set_property("displayRange", PropertyValue::Range([0.3, 0.9]))
            .unwrap();
        assert_eq!(
            opts.get_property("displayRange"),
            Some(PropertyValue::Range([0.3, 0.8]))
        );
    }

    #[test]
    fn test_choice_attribute_lists_every_option() {
        let mut opts = VolumeOpts::new(&t1());
        assert_eq!(
            opts.static_constraints("interpolation"),
            Constraints::Choices(vec![
                "none".to_string(),
                "linear".to_string(),
                "spline".to_string()
            ])
        );
        assert!(matches!(
            opts.set_property("interpolation", PropertyValue::Choice("cubic".into())),
            Err(PropertyError::InvalidChoice { .. })
        ));
        opts.set_property("interpolation", PropertyValue::Choice("spline".into()))
            .unwrap();
        assert_eq!(
            opts.get_property("interpolation"),
            Some(PropertyValue::Choice("spline".into()))
        );
    }

    #[test]
    fn test_linked_low_range_follows_display_range() {
        let mut opts = VolumeOpts::new(&t1());
        opts.set_property("displayRange", PropertyValue::Range([20.0, 150.0]))
            .unwrap();
        assert_relative_eq!(opts.colour.clipping_range[0], 20.0);
        assert_relative_eq!(opts.colour.clipping_range[1], 202.0);

        opts.set_property("linkHighRanges", PropertyValue::Bool(true))
            .unwrap();
        assert_relative_eq!(opts.colour.clipping_range[1], 150.0);
    }

    #[test]
    fn test_create_opts_matches_overlay_type_kind() {
        let overlay = Overlay::image("dti", &[4, 4, 4, 6], Intent::None, [0.0, 1.0]);
        for overlay_type in overlay.possible_overlay_types() {
            assert_eq!(
                create_opts(overlay_type, &overlay).kind(),
                overlay_type.option_kind()
            );
        }
        let surface = Overlay::mesh("white", 10, "lh.white.gii");
        assert_eq!(
            create_opts(OverlayType::GiftiMesh, &surface).kind(),
            OptionKind::GiftiOpts
        );
    }

    #[test]
    fn test_sh_order_limited_by_coefficients() {
        assert_eq!(sh_max_order(45), Some(8));
        assert_eq!(sh_max_order(81), Some(8));
        assert_eq!(sh_max_order(7), None);
        let overlay = Overlay::image("fod", &[4, 4, 4, 15], Intent::None, [0.0, 1.0]);
        let mut opts = ShOpts::new(&overlay);
        assert_eq!(opts.sh_order, 4);
        opts.set_property("shOrder", PropertyValue::Int(16)).unwrap();
        assert_eq!(opts.sh_order, 4);
    }

    #[test]
    fn test_vertex_data_must_be_loaded_before_selection() {
        let overlay = Overlay::mesh("pial", 100, "lh.pial.gii");
        let mut opts = MeshOpts::new(&overlay, OptionKind::GiftiOpts);
        assert!(opts
            .set_property(
                "vertexData",
                PropertyValue::Reference(Some("thickness.txt".into()))
            )
            .is_err());
        let value = opts.add_vertex_data(Path::new("thickness.txt"), 3);
        opts.set_property("vertexData", value).unwrap();
        opts.set_property("vertexDataIndex", PropertyValue::Int(7))
            .unwrap();
        assert_eq!(opts.vertex_data_index, 2);
        assert_eq!(opts.vertex_data_files().count(), 1);
    }
}
