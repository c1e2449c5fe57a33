use crate::props::TargetId;
use std::path::PathBuf;

/// Requests sent from panel buttons to the application.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelCommand {
    /// Ask the user for a colour map file; `target` gets it selected as `cmap`.
    LoadColourMap { target: TargetId },
    /// Ask the user for a vertex data file for the mesh options `target`.
    LoadVertexData { target: TargetId },
    /// A file was chosen in one of the load dialogs.
    OpenFile { target: TargetId, kind: LoadKind, path: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    ColourMap,
    VertexData,
}
