//! Load actions triggered from buttons of the display panel.

use crate::colourmaps::{self, ColourMapError};
use crate::displaycontext::opts::MeshOpts;
use crate::displaycontext::{DisplayContext, OptionKind};
use crate::props::{PropertyError, PropertyValue, Target, TargetId};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    ColourMap(#[from] ColourMapError),
    #[error(transparent)]
    Property(#[from] PropertyError),
    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("target {0} no longer exists")]
    UnknownTarget(TargetId),
    #[error("{0} cannot show vertex data")]
    NotAMesh(OptionKind),
    #[error("{} contains no vertex data", .0.display())]
    NoVertexData(PathBuf),
}

/// Loads a colour map file and selects it as `cmap` of `target`.
pub fn load_colour_map(
    display_ctx: &mut DisplayContext,
    target: TargetId,
    path: &Path,
) -> Result<String, LoadError> {
    let key = colourmaps::load_colour_map(path)?;
    display_ctx
        .target_mut(target)
        .ok_or(LoadError::UnknownTarget(target))?
        .set_property("cmap", PropertyValue::Choice(key.clone()))?;
    Ok(key)
}

/// Number of data columns of a vertex data file: the values on its first
/// line that is neither blank nor a comment.
pub fn vertex_data_columns(text: &str) -> usize {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            line.split(|c: char| c.is_whitespace() || c == ',')
                .filter(|v| !v.is_empty())
                .count()
        })
        .unwrap_or(0)
}

/// Adds a vertex data file to the mesh options `target` and shows it.
pub fn load_vertex_data(
    display_ctx: &mut DisplayContext,
    target: TargetId,
    path: &Path,
) -> Result<PropertyValue, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let columns = vertex_data_columns(&text);
    if columns == 0 {
        return Err(LoadError::NoVertexData(path.to_path_buf()));
    }

    let target = display_ctx
        .target_mut(target)
        .ok_or(LoadError::UnknownTarget(target))?;
    let kind = target.kind();
    let mesh = target
        .downcast_mut::<MeshOpts>()
        .ok_or(LoadError::NotAMesh(kind))?;
    let value = mesh.add_vertex_data(path, columns);
    mesh.set_property("vertexData", value.clone())?;
    Ok(value)
}
