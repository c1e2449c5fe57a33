//! Labels, tooltips and choice names shown on the overlay display panel.
//!
//! Property strings are keyed by `Kind.property` and looked up through the
//! ancestry of the target kind, so an entry for `ColourMapOpts.cmap` also
//! serves `VolumeOpts` and `MeshOpts` unless they declare their own.

use crate::displaycontext::OptionKind;
use once_cell::sync::Lazy;
use std::collections::HashMap;

pub static STRINGS: Lazy<StringTables> = Lazy::new(StringTables::builtin);

pub trait StringLookup {
    /// Label of `property` as declared for `kind` exactly.
    fn own_property_label(&self, kind: OptionKind, property: &str) -> Option<&str>;

    fn own_property_tooltip(&self, kind: OptionKind, property: &str) -> Option<&str>;

    /// Label of a panel element, e.g. a group (`VolumeOpts`, `3d`) or a button
    /// (`loadCmap`).
    fn panel_label(&self, key: &str) -> Option<&str>;

    /// Display name of `choice` in the choice table `table`
    /// (e.g. `VolumeOpts.interpolation`).
    fn choice_label(&self, table: &str, choice: &str) -> Option<&str>;

    /// A single named string, e.g. range bound labels (`ColourMapOpts.displayRange.min`).
    fn text(&self, key: &str) -> Option<&str>;

    fn property_label(&self, kind: OptionKind, property: &str) -> Option<String> {
        kind.ancestry()
            .into_iter()
            .find_map(|k| self.own_property_label(k, property))
            .map(str::to_string)
    }

    fn property_tooltip(&self, kind: OptionKind, property: &str) -> Option<String> {
        kind.ancestry()
            .into_iter()
            .find_map(|k| self.own_property_tooltip(k, property))
            .map(str::to_string)
    }

    /// Title of the group showing a target of `kind`.
    fn group_label(&self, kind: OptionKind) -> String {
        kind.ancestry()
            .into_iter()
            .find_map(|k| self.panel_label(k.name()))
            .map(str::to_string)
            .unwrap_or_else(|| kind.name().to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct StringTables {
    labels: HashMap<String, String>,
    tooltips: HashMap<String, String>,
    panel: HashMap<String, String>,
    choices: HashMap<String, HashMap<String, String>>,
    texts: HashMap<String, String>,
}

fn property_key(kind: OptionKind, property: &str) -> String {
    format!("{}.{}", kind.name(), property)
}

impl StringTables {
    pub fn with_label(mut self, kind: OptionKind, property: &str, label: &str) -> Self {
        self.labels
            .insert(property_key(kind, property), label.to_string());
        self
    }

    pub fn with_tooltip(mut self, kind: OptionKind, property: &str, tooltip: &str) -> Self {
        self.tooltips
            .insert(property_key(kind, property), tooltip.to_string());
        self
    }

    pub fn with_panel_label(mut self, key: &str, label: &str) -> Self {
        self.panel.insert(key.to_string(), label.to_string());
        self
    }

    pub fn with_choices(mut self, table: &str, choices: &[(&str, &str)]) -> Self {
        self.choices.insert(
            table.to_string(),
            choices
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self
    }

    pub fn with_text(mut self, key: &str, text: &str) -> Self {
        self.texts.insert(key.to_string(), text.to_string());
        self
    }

    fn labels(mut self, kind: OptionKind, entries: &[(&str, &str)]) -> Self {
        for (property, label) in entries {
            self = self.with_label(kind, property, label);
        }
        self
    }

    fn tooltips(mut self, kind: OptionKind, entries: &[(&str, &str)]) -> Self {
        for (property, tooltip) in entries {
            self = self.with_tooltip(kind, property, tooltip);
        }
        self
    }

    pub fn builtin() -> Self {
        use OptionKind::*;

        StringTables::default()
            .with_panel_label("Display", "General display settings")
            .with_panel_label("VolumeOpts", "Volume settings")
            .with_panel_label("MaskOpts", "Mask settings")
            .with_panel_label("LabelOpts", "Label settings")
            .with_panel_label("RGBVectorOpts", "RGB vector settings")
            .with_panel_label("LineVectorOpts", "Line vector settings")
            .with_panel_label("MeshOpts", "Mesh settings")
            .with_panel_label("TensorOpts", "Diffusion tensor settings")
            .with_panel_label("SHOpts", "Diffusion SH settings")
            .with_panel_label("3d", "3D display settings")
            .with_panel_label("loadCmap", "Load colour map")
            .with_panel_label("loadVertexData", "Load data")
            .labels(
                Display,
                &[
                    ("name", "Overlay name"),
                    ("overlayType", "Overlay data type"),
                    ("enabled", "Enabled"),
                    ("alpha", "Opacity"),
                    ("brightness", "Brightness"),
                    ("contrast", "Contrast"),
                ],
            )
            .labels(NiftiOpts, &[("volume", "Volume")])
            .labels(
                ColourMapOpts,
                &[
                    ("displayRange", "Display range"),
                    ("clippingRange", "Clipping range"),
                    ("linkLowRanges", "Link low display/clipping ranges"),
                    ("linkHighRanges", "Link high display/clipping ranges"),
                    ("cmap", "Colour map"),
                    ("custom_cmap", "Colour map"),
                    ("cmapResolution", "Colour map resolution"),
                    ("interpolateCmaps", "Interpolate colour maps"),
                    ("negativeCmap", "-ve colour map"),
                    ("useNegativeCmap", "-ve colour map"),
                    ("invert", "Invert colour map"),
                    ("invertClipping", "Invert clipping range"),
                ],
            )
            .labels(
                VolumeOpts,
                &[
                    ("clipImage", "Clip by"),
                    ("interpolation", "Interpolation"),
                    ("enableOverrideDataRange", "Override image data range"),
                    ("overrideDataRange", "Override image data range"),
                    ("custom_overrideDataRange", "Override image data range"),
                    ("dithering", "Dithering"),
                    ("numSteps", "Number of samples"),
                    ("numClipPlanes", "Number of clipping planes"),
                ],
            )
            .labels(
                MaskOpts,
                &[
                    ("colour", "Colour"),
                    ("invert", "Invert"),
                    ("threshold", "Threshold"),
                ],
            )
            .labels(
                VectorOpts,
                &[
                    ("xColour", "X Colour"),
                    ("yColour", "Y Colour"),
                    ("zColour", "Z Colour"),
                    ("suppressX", "Suppress X value"),
                    ("suppressY", "Suppress Y value"),
                    ("suppressZ", "Suppress Z value"),
                    ("suppressMode", "Suppression mode"),
                    ("colourImage", "Colour by"),
                    ("cmap", "Colour map"),
                    ("modulateImage", "Modulate by"),
                    ("clipImage", "Clip by"),
                    ("clippingRange", "Clipping range"),
                    ("modulateRange", "Modulation range"),
                    ("orientFlip", "L/R orientation flip"),
                ],
            )
            .labels(RgbVectorOpts, &[("interpolation", "Interpolation")])
            .labels(
                LineVectorOpts,
                &[
                    ("directed", "Interpret vectors as directed"),
                    ("lineWidth", "Line width"),
                    ("unitLength", "Scale vectors to unit length"),
                    ("lengthScale", "Length scaling factor (%)"),
                ],
            )
            .labels(
                MeshOpts,
                &[
                    ("colour", "Colour"),
                    ("outline", "Show outline only"),
                    ("outlineWidth", "Outline width"),
                    ("refImage", "Reference image"),
                    ("coordSpace", "Mesh coordinate space"),
                    ("custom_vertexData", "Vertex data"),
                    ("vertexData", "Vertex data"),
                    ("vertexDataIndex", "Vertex data index"),
                    ("custom_lut", "Lookup table"),
                    ("lut", "Lookup table"),
                    ("discardClipped", "Hide clipped areas"),
                    ("wireframe", "Show as wireframe"),
                    ("lighting", "Enable lighting"),
                ],
            )
            .labels(
                LabelOpts,
                &[
                    ("lut", "Look-up table"),
                    ("outline", "Show outline only"),
                    ("outlineWidth", "Outline width"),
                ],
            )
            .labels(
                TensorOpts,
                &[
                    ("lighting", "Lighting effects"),
                    ("tensorResolution", "Ellipsoid quality"),
                    ("tensorScale", "Tensor size"),
                ],
            )
            .labels(
                ShOpts,
                &[
                    ("lighting", "Lighting effects"),
                    ("size", "FOD size"),
                    ("radiusThreshold", "Radius threshold"),
                    ("shResolution", "FOD quality"),
                    ("shOrder", "Maximum SH order"),
                    ("colourMode", "Colour mode"),
                    ("cmap", "Radius colour map"),
                    ("xColour", "X direction colour"),
                    ("yColour", "Y direction colour"),
                    ("zColour", "Z direction colour"),
                ],
            )
            .tooltips(
                Display,
                &[
                    ("name", "The name of this overlay."),
                    (
                        "overlayType",
                        "The overlay type - how this overlay should be displayed.",
                    ),
                    ("enabled", "Show/hide this overlay."),
                    ("alpha", "The opacity of this overlay."),
                    ("brightness", "The brightness of this overlay."),
                    ("contrast", "The contrast of this overlay."),
                ],
            )
            .tooltips(
                VolumeOpts,
                &[
                    (
                        "displayRange",
                        "Data display range - the low value corresponds to \
                         the low colour, and the high value to the high colour.",
                    ),
                    (
                        "clippingRange",
                        "Data clipping range - voxels with values outside of \
                         this range are not displayed.",
                    ),
                    ("cmap", "The colour map to use."),
                    (
                        "negativeCmap",
                        "The colour map to use for negative values.",
                    ),
                    (
                        "useNegativeCmap",
                        "Enable the negative colour map - this allows positive \
                         and negative values to be coloured independently.",
                    ),
                    (
                        "interpolation",
                        "Interpolate the image data for display purposes.",
                    ),
                    (
                        "overrideDataRange",
                        "Override the actual data range of the image with \
                         values that you specify.",
                    ),
                ],
            )
            .tooltips(
                LabelOpts,
                &[("lut", "The lookup table to use for this label image.")],
            )
            .with_text("ColourMapOpts.displayRange.min", "Min.")
            .with_text("ColourMapOpts.displayRange.max", "Max.")
            .with_text("MaskOpts.threshold.min", "Min.")
            .with_text("MaskOpts.threshold.max", "Max.")
            .with_text("VectorOpts.clippingRange.min", "Clip min.")
            .with_text("VectorOpts.clippingRange.max", "Clip max.")
            .with_text("VectorOpts.modulateRange.min", "Mod min.")
            .with_text("VectorOpts.modulateRange.max", "Mod max.")
            .with_text("TensorOpts.tensorResolution.min", "Low")
            .with_text("TensorOpts.tensorResolution.max", "High")
            .with_choices(
                "VectorOpts.suppressMode",
                &[
                    ("white", "White"),
                    ("black", "Black"),
                    ("transparent", "Transparent"),
                ],
            )
            .with_choices(
                "MeshOpts.coordSpace",
                &[
                    ("affine", "World coordinates"),
                    ("pixdim", "Scaled voxels"),
                    (
                        "pixdim-flip",
                        "Scaled voxels forced to radiological orientation",
                    ),
                    ("id", "Voxels"),
                    ("torig", "FreeSurfer coordinates"),
                ],
            )
            .with_choices(
                "VolumeOpts.interpolation",
                &[
                    ("none", "No interpolation"),
                    ("linear", "Linear interpolation"),
                    ("spline", "Spline interpolation"),
                ],
            )
            .with_choices(
                "SHOpts.colourMode",
                &[
                    ("radius", "Colour by radius"),
                    ("direction", "Colour by direction"),
                ],
            )
            .with_choices(
                "Display.overlayType",
                &[
                    ("volume", "3D/4D volume"),
                    ("mask", "3D/4D mask image"),
                    ("label", "Label image"),
                    ("rgbvector", "3-direction vector image (RGB)"),
                    ("linevector", "3-direction vector image (Line)"),
                    ("mesh", "3D mesh"),
                    ("giftimesh", "GIFTI surface"),
                    ("tensor", "Diffusion tensor"),
                    ("sh", "Diffusion SH"),
                ],
            )
    }
}

impl StringLookup for StringTables {
    fn own_property_label(&self, kind: OptionKind, property: &str) -> Option<&str> {
        self.labels
            .get(&property_key(kind, property))
            .map(String::as_str)
    }

    fn own_property_tooltip(&self, kind: OptionKind, property: &str) -> Option<&str> {
        self.tooltips
            .get(&property_key(kind, property))
            .map(String::as_str)
    }

    fn panel_label(&self, key: &str) -> Option<&str> {
        self.panel.get(key).map(String::as_str)
    }

    fn choice_label(&self, table: &str, choice: &str) -> Option<&str> {
        self.choices
            .get(table)
            .and_then(|t| t.get(choice))
            .map(String::as_str)
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.texts.get(key).map(String::as_str)
    }
}
