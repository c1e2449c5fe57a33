use crate::displaycontext::opts::create_opts;
use crate::displaycontext::{OptionKind, Overlay, OverlayId, OverlayType};
use crate::props::{Constraints, Notifier, Target, TargetId};
use props_macros::Properties;
use std::fmt;

/// Display settings common to all overlays.
///
/// A `Display` owns the options object of its overlay. Assigning a new
/// `overlayType` replaces that object: the old one is torn down together with
/// every listener still registered on it, and listeners of `overlayType` are
/// notified once the new one is in place.
#[derive(Properties)]
pub struct Display {
    #[property(skip)]
    id: TargetId,
    #[property(skip)]
    notifier: Notifier,
    #[property(skip)]
    overlay: Overlay,
    #[property(skip)]
    opts: Box<dyn Target>,
    pub name: String,
    #[property(choice, constraints = "overlay_type_constraints")]
    pub overlay_type: String,
    pub enabled: bool,
    #[property(range(0, 100))]
    pub alpha: f64,
    #[property(range(0, 100))]
    pub brightness: f64,
    #[property(range(0, 100))]
    pub contrast: f64,
}

fn overlay_type_constraints(display: &Display) -> Constraints {
    Constraints::Choices(
        display
            .overlay
            .possible_overlay_types()
            .iter()
            .map(|t| t.key().to_string())
            .collect(),
    )
}

impl Display {
    /// Creates the display of `overlay` with its default overlay type.
    pub fn new(overlay: &Overlay) -> Self {
        let overlay_type = overlay
            .possible_overlay_types()
            .first()
            .copied()
            .unwrap_or(OverlayType::Volume);
        Display {
            id: TargetId::new(),
            notifier: Notifier::new(),
            overlay: overlay.clone(),
            opts: create_opts(overlay_type, overlay),
            name: overlay.name.clone(),
            overlay_type: overlay_type.key().to_string(),
            enabled: true,
            alpha: 100.0,
            brightness: 50.0,
            contrast: 50.0,
        }
    }

    pub fn overlay_id(&self) -> OverlayId {
        self.overlay.id
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn overlay_type(&self) -> Option<OverlayType> {
        OverlayType::from_key(&self.overlay_type)
    }

    pub fn opts(&self) -> &dyn Target {
        self.opts.as_ref()
    }

    pub fn opts_mut(&mut self) -> &mut dyn Target {
        self.opts.as_mut()
    }

    /// Removes every listener registered on this display and its options.
    pub fn teardown(&mut self) {
        let opts = self.opts.notifier_mut().clear();
        let own = self.notifier.clear();
        if opts + own > 0 {
            log::debug!(
                "removed {} listener(s) from the display of {}",
                opts + own,
                self.overlay.name
            );
        }
    }

    fn replace_opts(&mut self) {
        let Some(overlay_type) = self.overlay_type() else {
            log::warn!("unknown overlay type {}", self.overlay_type);
            return;
        };
        let mut old = std::mem::replace(&mut self.opts, create_opts(overlay_type, &self.overlay));
        let removed = old.notifier_mut().clear();
        log::debug!(
            "{}: {} replaced by {} ({removed} listener(s) removed)",
            self.overlay.name,
            old.kind(),
            self.opts.kind()
        );
    }
}

impl Target for Display {
    fn kind(&self) -> OptionKind {
        OptionKind::Display
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
        if name == "overlayType" {
            self.replace_opts();
        }
    }
}

impl fmt::Debug for Display {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Display")
            .field("name", &self.name)
            .field("overlay_type", &self.overlay_type)
            .field("opts", &self.opts.kind())
            .finish()
    }
}
