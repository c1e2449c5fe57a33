//! Built-in property lists, widget specs and composite builders of every
//! option kind.

use crate::colourmaps::{colour_map_label, lut_label};
use crate::config::PanelCommand;
use crate::displaycontext::OptionKind::*;
use crate::props::PropertyValue;
use crate::widgets::registry::{Section, SpecRegistryBuilder};
use crate::widgets::spec::{
    ActionButton, BuildContext, BuilderFn, BuilderOutput, ChoiceLabels, Container,
    WidgetDescriptor, WidgetSpec,
};
use crate::widgets::ResolveError;
use std::path::Path;

const DISPLAY_RANGE_BOUNDS: ChoiceLabels = ChoiceLabels::Bounds(
    "ColourMapOpts.displayRange.min",
    "ColourMapOpts.displayRange.max",
);

fn first_true(values: &[PropertyValue]) -> bool {
    values[0].is_true()
}

fn first_unset(values: &[PropertyValue]) -> bool {
    values[0].is_unset_reference()
}

fn first_set(values: &[PropertyValue]) -> bool {
    !values[0].is_unset_reference()
}

fn more_than_one_volume(values: &[PropertyValue]) -> bool {
    values[0].as_i64().is_some_and(|n| n > 1)
}

/// No colour image, but a modulation image.
fn modulate_enabled(values: &[PropertyValue]) -> bool {
    values[0].is_unset_reference() && !values[1].is_unset_reference()
}

/// Colour image set, or colouring by radius.
fn sh_radius(values: &[PropertyValue]) -> bool {
    !values[0].is_unset_reference() || values[1].as_str() == Some("radius")
}

/// No colour image, colouring by direction.
fn sh_direction(values: &[PropertyValue]) -> bool {
    values[0].is_unset_reference() && values[1].as_str() == Some("direction")
}

/// Over `vertexData`, `outline`, `useLut`.
fn mesh_colour(values: &[PropertyValue]) -> bool {
    !values[0].is_unset_reference() && values[1].is_true() && !values[2].is_true()
}

fn mesh_clipping(values: &[PropertyValue]) -> bool {
    !values[0].is_unset_reference() && values[1].is_true()
}

fn reference_label(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Reference(Some(name)) => name.clone(),
        _ => "None".to_string(),
    }
}

fn vertex_data_label(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Reference(Some(path)) => Path::new(path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.clone()),
        _ => "None".to_string(),
    }
}

fn widget(key: &'static str) -> WidgetDescriptor {
    WidgetDescriptor::new(key)
}

fn entry(descriptor: WidgetDescriptor) -> (String, WidgetSpec) {
    (descriptor.key.clone(), descriptor.into())
}

fn builder_entry(key: &str, builder: BuilderFn) -> (String, WidgetSpec) {
    (key.to_string(), WidgetSpec::Builder(builder))
}

/// `cmap` with a load button next to it, and `negativeCmap` next to
/// `useNegativeCmap`.
fn custom_cmap(ctx: &BuildContext) -> Result<BuilderOutput, ResolveError> {
    let cmap = ctx.control("cmap")?;
    let negative_cmap = ctx.control("negativeCmap")?;
    let use_negative_cmap = ctx
        .control("useNegativeCmap")?
        .with_caption(ctx.label("useNegativeCmap"));
    let widgets = vec![cmap.id, negative_cmap.id, use_negative_cmap.id];
    let container = Container::grid(2)
        .control(cmap)
        .button(ActionButton {
            label: ctx.panel_label("loadCmap"),
            icon: egui_phosphor::regular::FOLDER_OPEN,
            command: PanelCommand::LoadColourMap {
                target: ctx.target.target_id(),
            },
        })
        .control(negative_cmap)
        .control(use_negative_cmap);
    Ok(BuilderOutput::Container { container, widgets })
}

fn custom_override_data_range(ctx: &BuildContext) -> Result<BuilderOutput, ResolveError> {
    let enable = ctx.control("enableOverrideDataRange")?;
    let range = ctx.control("overrideDataRange")?;
    let widgets = vec![enable.id, range.id];
    let container = Container::row().control(enable).control(range);
    Ok(BuilderOutput::Container { container, widgets })
}

fn custom_vertex_data(ctx: &BuildContext) -> Result<BuilderOutput, ResolveError> {
    let vertex_data = ctx.control("vertexData")?;
    let widgets = vec![vertex_data.id];
    let container = Container::row().control(vertex_data).button(ActionButton {
        label: ctx.panel_label("loadVertexData"),
        icon: egui_phosphor::regular::FOLDER_OPEN,
        command: PanelCommand::LoadVertexData {
            target: ctx.target.target_id(),
        },
    });
    Ok(BuilderOutput::Container { container, widgets })
}

fn custom_lut(ctx: &BuildContext) -> Result<BuilderOutput, ResolveError> {
    let enable = ctx.control("useLut")?;
    let lut = ctx.control("lut")?;
    let widgets = vec![enable.id, lut.id];
    let container = Container::row().control(enable).control(lut);
    Ok(BuilderOutput::Container { container, widgets })
}

fn display_widgets() -> Vec<(String, WidgetSpec)> {
    vec![
        entry(widget("name")),
        entry(widget("overlayType").labels(ChoiceLabels::Table("Display.overlayType"))),
        entry(widget("enabled")),
        entry(widget("alpha").show_limits(false)),
        entry(widget("brightness").show_limits(false)),
        entry(widget("contrast").show_limits(false)),
    ]
}

fn nifti_widgets() -> Vec<(String, WidgetSpec)> {
    vec![entry(
        widget("volume")
            .show_limits(false)
            .enabled_when(&["numVolumes"], more_than_one_volume),
    )]
}

fn colour_map_widgets() -> Vec<(String, WidgetSpec)> {
    vec![
        builder_entry("custom_cmap", custom_cmap),
        builder_entry("custom_overrideDataRange", custom_override_data_range),
        entry(widget("cmap").labels(ChoiceLabels::Function(colour_map_label))),
        entry(widget("useNegativeCmap")),
        entry(
            widget("negativeCmap")
                .labels(ChoiceLabels::Function(colour_map_label))
                .enabled_when(&["useNegativeCmap"], first_true),
        ),
        entry(widget("cmapResolution").show_limits(false)),
        entry(widget("interpolateCmaps")),
        entry(widget("invert")),
        entry(widget("invertClipping")),
        entry(widget("linkLowRanges")),
        entry(widget("linkHighRanges")),
        entry(
            widget("displayRange")
                .show_limits(false)
                .labels(DISPLAY_RANGE_BOUNDS),
        ),
        entry(
            widget("clippingRange")
                .show_limits(false)
                .labels(DISPLAY_RANGE_BOUNDS),
        ),
    ]
}

fn volume_widgets() -> Vec<(String, WidgetSpec)> {
    vec![
        entry(widget("interpolation").labels(ChoiceLabels::Table("VolumeOpts.interpolation"))),
        entry(widget("clipImage").labels(ChoiceLabels::Function(reference_label))),
        entry(widget("enableOverrideDataRange")),
        entry(
            widget("overrideDataRange")
                .show_limits(false)
                .slider(false)
                .enabled_when(&["enableOverrideDataRange"], first_true),
        ),
    ]
}

fn volume_3d_widgets() -> Vec<(String, WidgetSpec)> {
    vec![
        entry(widget("dithering").show_limits(false)),
        entry(widget("numSteps").show_limits(false)),
        entry(widget("numClipPlanes").show_limits(false)),
    ]
}

fn mask_widgets() -> Vec<(String, WidgetSpec)> {
    vec![
        entry(widget("colour")),
        entry(widget("invert")),
        entry(widget("threshold").show_limits(false).labels(ChoiceLabels::Bounds(
            "MaskOpts.threshold.min",
            "MaskOpts.threshold.max",
        ))),
    ]
}

fn label_widgets() -> Vec<(String, WidgetSpec)> {
    vec![
        entry(widget("lut").labels(ChoiceLabels::Function(lut_label))),
        entry(widget("outline")),
        entry(widget("outlineWidth").show_limits(false)),
    ]
}

fn vector_widgets() -> Vec<(String, WidgetSpec)> {
    let unless_coloured = |key: &'static str| widget(key).enabled_when(&["colourImage"], first_unset);
    vec![
        entry(widget("colourImage").labels(ChoiceLabels::Function(reference_label))),
        entry(
            widget("modulateImage")
                .labels(ChoiceLabels::Function(reference_label))
                .enabled_when(&["colourImage"], first_unset),
        ),
        entry(widget("clipImage").labels(ChoiceLabels::Function(reference_label))),
        entry(
            widget("cmap")
                .labels(ChoiceLabels::Function(colour_map_label))
                .enabled_when(&["colourImage"], first_set),
        ),
        entry(
            widget("clippingRange")
                .show_limits(false)
                .labels(ChoiceLabels::Bounds(
                    "VectorOpts.clippingRange.min",
                    "VectorOpts.clippingRange.max",
                ))
                .enabled_when(&["clipImage"], first_set),
        ),
        entry(
            widget("modulateRange")
                .show_limits(false)
                .labels(ChoiceLabels::Bounds(
                    "VectorOpts.modulateRange.min",
                    "VectorOpts.modulateRange.max",
                ))
                .enabled_when(&["colourImage", "modulateImage"], modulate_enabled),
        ),
        entry(unless_coloured("xColour")),
        entry(unless_coloured("yColour")),
        entry(unless_coloured("zColour")),
        entry(unless_coloured("suppressX")),
        entry(unless_coloured("suppressY")),
        entry(unless_coloured("suppressZ")),
        entry(unless_coloured("suppressMode").labels(ChoiceLabels::Table("VectorOpts.suppressMode"))),
        entry(widget("orientFlip")),
    ]
}

fn rgb_vector_widgets() -> Vec<(String, WidgetSpec)> {
    vec![entry(
        widget("interpolation").labels(ChoiceLabels::Table("VolumeOpts.interpolation")),
    )]
}

fn line_vector_widgets() -> Vec<(String, WidgetSpec)> {
    vec![
        entry(widget("directed")),
        entry(widget("unitLength")),
        entry(widget("lineWidth").show_limits(false)),
        entry(widget("lengthScale").show_limits(false)),
    ]
}

fn tensor_widgets() -> Vec<(String, WidgetSpec)> {
    vec![
        entry(widget("lighting")),
        entry(
            widget("tensorResolution")
                .show_limits(false)
                .spin(false)
                .labels(ChoiceLabels::Bounds(
                    "TensorOpts.tensorResolution.min",
                    "TensorOpts.tensorResolution.max",
                )),
        ),
        entry(widget("tensorScale").show_limits(false).spin(false)),
    ]
}

fn sh_widgets() -> Vec<(String, WidgetSpec)> {
    let by_direction = |key: &'static str| {
        widget(key).enabled_when(&["colourImage", "colourMode"], sh_direction)
    };
    vec![
        entry(widget("shResolution").spin(false).show_limits(false)),
        entry(widget("shOrder")),
        entry(widget("lighting")),
        entry(widget("size").spin(false).show_limits(false)),
        entry(widget("radiusThreshold").spin(false).show_limits(false)),
        entry(
            widget("colourMode")
                .labels(ChoiceLabels::Table("SHOpts.colourMode"))
                .enabled_when(&["colourImage"], first_unset),
        ),
        entry(
            widget("cmap")
                .labels(ChoiceLabels::Function(colour_map_label))
                .enabled_when(&["colourImage", "colourMode"], sh_radius),
        ),
        entry(by_direction("xColour")),
        entry(by_direction("yColour")),
        entry(by_direction("zColour")),
        entry(by_direction("suppressX")),
        entry(by_direction("suppressY")),
        entry(by_direction("suppressZ")),
        entry(by_direction("suppressMode").labels(ChoiceLabels::Table("VectorOpts.suppressMode"))),
    ]
}

fn mesh_widgets() -> Vec<(String, WidgetSpec)> {
    let colour = |key: &'static str| {
        widget(key).enabled_when(&["vertexData", "outline", "useLut"], mesh_colour)
    };
    vec![
        entry(widget("outline")),
        entry(
            widget("outlineWidth")
                .show_limits(false)
                .enabled_when(&["outline"], first_true),
        ),
        entry(widget("refImage").labels(ChoiceLabels::Function(reference_label))),
        entry(
            widget("coordSpace")
                .labels(ChoiceLabels::Table("MeshOpts.coordSpace"))
                .enabled_when(&["refImage"], first_set),
        ),
        entry(widget("colour")),
        builder_entry("custom_vertexData", custom_vertex_data),
        entry(widget("vertexData").labels(ChoiceLabels::Function(vertex_data_label))),
        entry(
            widget("vertexDataIndex")
                .show_limits(false)
                .enabled_when(&["vertexData"], first_set),
        ),
        entry(widget("useLut").enabled_when(&["outline"], first_true)),
        builder_entry("custom_lut", custom_lut),
        entry(
            widget("lut")
                .labels(ChoiceLabels::Function(lut_label))
                .enabled_when(&["outline"], first_true),
        ),
        entry(colour("cmap").labels(ChoiceLabels::Function(colour_map_label))),
        entry(colour("useNegativeCmap")),
        entry(colour("negativeCmap").labels(ChoiceLabels::Function(colour_map_label))),
        entry(colour("cmapResolution").show_limits(false)),
        entry(colour("interpolateCmaps")),
        entry(colour("invert")),
        entry(colour("invertClipping")),
        entry(colour("linkLowRanges")),
        entry(colour("linkHighRanges")),
        entry(colour("displayRange").show_limits(false).labels(DISPLAY_RANGE_BOUNDS)),
        entry(
            widget("clippingRange")
                .show_limits(false)
                .labels(DISPLAY_RANGE_BOUNDS)
                .enabled_when(&["vertexData", "outline"], mesh_clipping),
        ),
        entry(colour("discardClipped")),
    ]
}

fn mesh_3d_widgets() -> Vec<(String, WidgetSpec)> {
    vec![entry(widget("wireframe")), entry(widget("lighting"))]
}

fn no_widgets() -> Vec<(String, WidgetSpec)> {
    Vec::new()
}

/// Registry builder holding the built-in hierarchy and tables.
pub fn builder() -> SpecRegistryBuilder {
    SpecRegistryBuilder::new()
        .declare_builtin_hierarchy()
        .properties(Display, Section::General, || {
            vec!["name", "overlayType", "enabled", "alpha", "brightness", "contrast"]
        })
        .widgets(Display, Section::General, display_widgets)
        .widgets(NiftiOpts, Section::General, nifti_widgets)
        .widgets(ColourMapOpts, Section::General, colour_map_widgets)
        .properties(VolumeOpts, Section::General, || {
            vec![
                "volume",
                "interpolation",
                "custom_cmap",
                "cmapResolution",
                "interpolateCmaps",
                "invert",
                "invertClipping",
                "linkLowRanges",
                "linkHighRanges",
                "displayRange",
                "clippingRange",
                "clipImage",
                "custom_overrideDataRange",
            ]
        })
        .widgets(VolumeOpts, Section::General, volume_widgets)
        .properties(VolumeOpts, Section::ThreeD, || {
            vec!["dithering", "numSteps", "numClipPlanes"]
        })
        .widgets(VolumeOpts, Section::ThreeD, volume_3d_widgets)
        .properties(MaskOpts, Section::General, || {
            vec!["volume", "colour", "invert", "threshold"]
        })
        .widgets(MaskOpts, Section::General, mask_widgets)
        .properties(LabelOpts, Section::General, || {
            vec!["lut", "outline", "outlineWidth", "volume"]
        })
        .widgets(LabelOpts, Section::General, label_widgets)
        .properties(VectorOpts, Section::General, || {
            vec![
                "colourImage",
                "modulateImage",
                "clipImage",
                "cmap",
                "clippingRange",
                "modulateRange",
                "xColour",
                "yColour",
                "zColour",
                "suppressX",
                "suppressY",
                "suppressZ",
                "suppressMode",
            ]
        })
        .widgets(VectorOpts, Section::General, vector_widgets)
        .properties(RgbVectorOpts, Section::General, || vec!["interpolation"])
        .widgets(RgbVectorOpts, Section::General, rgb_vector_widgets)
        .properties(LineVectorOpts, Section::General, || {
            vec!["directed", "unitLength", "orientFlip", "lineWidth", "lengthScale"]
        })
        .widgets(LineVectorOpts, Section::General, line_vector_widgets)
        .properties(TensorOpts, Section::General, || {
            vec!["lighting", "orientFlip", "tensorResolution", "tensorScale"]
        })
        .widgets(TensorOpts, Section::General, tensor_widgets)
        .properties(ShOpts, Section::General, || {
            vec![
                "shResolution",
                "shOrder",
                "orientFlip",
                "lighting",
                "size",
                "radiusThreshold",
                "colourMode",
            ]
        })
        .widgets(ShOpts, Section::General, sh_widgets)
        .properties(MeshOpts, Section::General, || {
            vec![
                "refImage",
                "coordSpace",
                "outline",
                "outlineWidth",
                "colour",
                "custom_vertexData",
                "vertexDataIndex",
                "custom_lut",
                "custom_cmap",
                "cmapResolution",
                "interpolateCmaps",
                "invert",
                "invertClipping",
                "discardClipped",
                "linkLowRanges",
                "linkHighRanges",
                "displayRange",
                "clippingRange",
            ]
        })
        .widgets(MeshOpts, Section::General, mesh_widgets)
        .properties(MeshOpts, Section::ThreeD, || vec!["wireframe", "lighting"])
        .widgets(MeshOpts, Section::ThreeD, mesh_3d_widgets)
        .properties(GiftiOpts, Section::General, Vec::new)
        .widgets(GiftiOpts, Section::General, no_widgets)
        .properties(GiftiOpts, Section::ThreeD, Vec::new)
        .widgets(GiftiOpts, Section::ThreeD, no_widgets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::displaycontext::opts::create_opts;
    use crate::displaycontext::{DisplayContext, Intent, OptionKind, Overlay, OverlayType};
    use crate::props::Target;
    use crate::strings::STRINGS;
    use crate::widgets::registry::SpecRegistry;
    use crate::widgets::spec::Control;

    fn registry() -> SpecRegistry {
        builder().build().unwrap()
    }

    fn overlay_for(overlay_type: OverlayType) -> Overlay {
        match overlay_type {
            OverlayType::Mesh => Overlay::mesh("pial", 500, "lh.pial.vtk"),
            OverlayType::GiftiMesh => Overlay::mesh("white", 500, "lh.white.gii"),
            _ => Overlay::image("dwi", &[8, 8, 8, 3], Intent::None, [0.0, 100.0]),
        }
    }

    #[test]
    fn test_builtin_tables_are_consistent() {
        assert_eq!(registry().validate(), Vec::new());
    }

    #[test]
    fn test_builtin_lists_concatenate_along_the_hierarchy() {
        let registry = registry();
        assert_eq!(
            registry.resolve_property_list(OptionKind::RgbVectorOpts)[..3],
            ["interpolation", "colourImage", "modulateImage"]
        );
        assert_eq!(
            registry.resolve_property_list(OptionKind::GiftiOpts),
            registry.resolve_property_list(OptionKind::MeshOpts)
        );
        assert_eq!(
            registry.resolve_3d_property_list(OptionKind::VolumeOpts),
            ["dithering", "numSteps", "numClipPlanes"]
        );
        assert!(registry
            .resolve_3d_property_list(OptionKind::TensorOpts)
            .is_empty());
        // Mesh colour settings depend on the vertex data, not the plain map.
        let cmap = registry
            .descriptor(OptionKind::MeshOpts, Section::General, "cmap")
            .unwrap();
        assert_eq!(cmap.dependencies(), ["vertexData", "outline", "useLut"]);
    }

    #[test]
    fn test_every_builtin_entry_builds_for_its_overlay_type() {
        let registry = registry();
        let display_ctx = DisplayContext::default();
        for overlay_type in OverlayType::ALL {
            let overlay = overlay_for(overlay_type);
            let opts = create_opts(overlay_type, &overlay);
            for section in Section::ALL {
                let ctx = BuildContext {
                    target: opts.as_ref(),
                    section,
                    group: "opts",
                    panel: "test",
                    display_ctx: &display_ctx,
                    registry: &registry,
                    strings: &*STRINGS,
                };
                for property in registry.property_list(opts.kind(), section) {
                    match registry.spec(opts.kind(), section, property) {
                        Some(WidgetSpec::Widget(descriptor)) => {
                            Control::build(opts.as_ref(), descriptor.clone()).unwrap();
                        }
                        Some(WidgetSpec::Builder(build)) => {
                            build(&ctx).unwrap();
                        }
                        None => panic!("{overlay_type}: no spec for {property}"),
                    }
                }
            }
        }
    }

    #[test]
    fn test_colour_map_builder_offers_the_load_action() {
        let registry = registry();
        let display_ctx = DisplayContext::default();
        let overlay = overlay_for(OverlayType::Volume);
        let opts = create_opts(OverlayType::Volume, &overlay);
        let ctx = BuildContext {
            target: opts.as_ref(),
            section: Section::General,
            group: "opts",
            panel: "test",
            display_ctx: &display_ctx,
            registry: &registry,
            strings: &*STRINGS,
        };
        let Ok(BuilderOutput::Container { container, widgets }) = custom_cmap(&ctx) else {
            panic!("custom_cmap should build a container");
        };
        assert_eq!(widgets.len(), 3);
        assert!(widgets.iter().all(|id| container.contains(*id)));
        let button = container
            .items
            .iter()
            .find_map(|item| match item {
                crate::widgets::spec::ContainerItem::Button(button) => Some(button),
                _ => None,
            })
            .unwrap();
        assert_eq!(button.label, "Load colour map");
        assert_eq!(
            button.command,
            PanelCommand::LoadColourMap {
                target: opts.target_id()
            }
        );
    }

    #[test]
    fn test_enablement_predicates() {
        let unset = PropertyValue::Reference(None);
        let set = PropertyValue::Reference(Some("fa".into()));
        let radius = PropertyValue::Choice("radius".into());
        let direction = PropertyValue::Choice("direction".into());

        assert!(sh_radius(&[unset.clone(), radius.clone()]));
        assert!(sh_radius(&[set.clone(), direction.clone()]));
        assert!(!sh_radius(&[unset.clone(), direction.clone()]));
        assert!(sh_direction(&[unset.clone(), direction]));
        assert!(!sh_direction(&[unset.clone(), radius]));

        assert!(modulate_enabled(&[unset.clone(), set.clone()]));
        assert!(!modulate_enabled(&[set.clone(), set.clone()]));

        let on = PropertyValue::Bool(true);
        let off = PropertyValue::Bool(false);
        assert!(mesh_colour(&[set.clone(), on.clone(), off.clone()]));
        assert!(!mesh_colour(&[set.clone(), on.clone(), on.clone()]));
        assert!(!mesh_colour(&[unset, on.clone(), off]));
        assert!(mesh_clipping(&[set, on]));

        assert!(more_than_one_volume(&[PropertyValue::Int(3)]));
        assert!(!more_than_one_volume(&[PropertyValue::Int(1)]));
    }

    #[test]
    fn test_reference_labels() {
        assert_eq!(reference_label(&PropertyValue::Reference(None)), "None");
        assert_eq!(
            vertex_data_label(&PropertyValue::Reference(Some("/data/lh.thickness.txt".into()))),
            "lh.thickness.txt"
        );
    }
}
