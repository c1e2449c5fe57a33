//! Known colour maps and lookup tables.
//!
//! Both tables are process wide. Built-in entries are present from the first
//! access; colour maps loaded by the user are appended with
//! [`load_colour_map`].

use crate::props::{Constraints, PropertyValue};
use once_cell::sync::Lazy;
use std::fs;
use std::path::Path;
use std::sync::RwLock;
use thiserror::Error;

pub const DEFAULT_LUT: &str = "random";

#[derive(Debug, Clone, PartialEq)]
pub struct ColourMap {
    pub key: String,
    pub name: String,
    /// RGB entries, empty for built-in maps.
    pub colours: Vec<[f32; 3]>,
}

#[derive(Debug, Error)]
pub enum ColourMapError {
    #[error("could not read colour map file: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: expected three colour values between 0 and 1")]
    Parse { line: usize },
    #[error("colour map file contains no colours")]
    Empty,
    #[error("colour map file name is not valid")]
    InvalidName,
}

fn builtin(key: &str, name: &str) -> ColourMap {
    ColourMap {
        key: key.to_string(),
        name: name.to_string(),
        colours: Vec::new(),
    }
}

static COLOUR_MAPS: Lazy<RwLock<Vec<ColourMap>>> = Lazy::new(|| {
    RwLock::new(vec![
        builtin("greyscale", "Greyscale"),
        builtin("red-yellow", "Red-Yellow"),
        builtin("blue-lightblue", "Blue-Light blue"),
        builtin("red", "Red"),
        builtin("green", "Green"),
        builtin("blue", "Blue"),
        builtin("yellow", "Yellow"),
        builtin("pink", "Pink"),
        builtin("hot", "Hot"),
        builtin("cool", "Cool"),
        builtin("copper", "Copper"),
        builtin("hsv", "HSV"),
        builtin("render1", "Render 1"),
        builtin("render2", "Render 2"),
        builtin("render3", "Render 3"),
    ])
});

static LOOKUP_TABLES: Lazy<RwLock<Vec<(String, String)>>> = Lazy::new(|| {
    RwLock::new(
        [
            ("random", "Random (small)"),
            ("random_big", "Random (big)"),
            ("harvard-oxford-cortical", "Harvard-Oxford cortical"),
            ("harvard-oxford-subcortical", "Harvard-Oxford subcortical"),
            ("mgh-cma-freesurfer", "MGH CMA FreeSurfer"),
            ("melodic-classes", "MELODIC component classes"),
        ]
        .iter()
        .map(|(k, n)| (k.to_string(), n.to_string()))
        .collect(),
    )
});

pub fn colour_map_keys() -> Vec<String> {
    COLOUR_MAPS
        .read()
        .map(|maps| maps.iter().map(|m| m.key.clone()).collect())
        .unwrap_or_default()
}

pub fn lut_keys() -> Vec<String> {
    LOOKUP_TABLES
        .read()
        .map(|luts| luts.iter().map(|(k, _)| k.clone()).collect())
        .unwrap_or_default()
}

/// Choice constraints of every colour map property.
pub fn colour_map_constraints<T: ?Sized>(_: &T) -> Constraints {
    Constraints::Choices(colour_map_keys())
}

/// Choice constraints of every lookup table property.
pub fn lut_constraints<T: ?Sized>(_: &T) -> Constraints {
    Constraints::Choices(lut_keys())
}

/// Display name of a colour map choice value. Unknown keys are shown as they are.
pub fn colour_map_label(value: &PropertyValue) -> String {
    let key = value.as_str().unwrap_or_default();
    COLOUR_MAPS
        .read()
        .ok()
        .and_then(|maps| maps.iter().find(|m| m.key == key).map(|m| m.name.clone()))
        .unwrap_or_else(|| key.to_string())
}

pub fn lut_label(value: &PropertyValue) -> String {
    let key = value.as_str().unwrap_or_default();
    LOOKUP_TABLES
        .read()
        .ok()
        .and_then(|luts| luts.iter().find(|(k, _)| k == key).map(|(_, n)| n.clone()))
        .unwrap_or_else(|| key.to_string())
}

/// Adds a colour map, replacing an existing one with the same key.
pub fn register_colour_map(map: ColourMap) {
    match COLOUR_MAPS.write() {
        Ok(mut maps) => {
            log::info!("registered colour map {} ({})", map.key, map.name);
            if let Some(existing) = maps.iter_mut().find(|m| m.key == map.key) {
                *existing = map;
            } else {
                maps.push(map);
            }
        }
        Err(err) => log::error!("colour map table is poisoned: {err}"),
    }
}

/// Parses colour map text: one `r g b` triple per line, values in `[0, 1]`.
pub fn parse_colour_map(text: &str) -> Result<Vec<[f32; 3]>, ColourMapError> {
    let mut colours = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let values: Vec<f32> = line
            .split_whitespace()
            .map(str::parse)
            .collect::<Result<_, _>>()
            .map_err(|_| ColourMapError::Parse { line: index + 1 })?;
        match values.as_slice() {
            [r, g, b] if [r, g, b].iter().all(|v| (0.0..=1.0).contains(*v)) => {
                colours.push([*r, *g, *b])
            }
            _ => return Err(ColourMapError::Parse { line: index + 1 }),
        }
    }
    if colours.is_empty() {
        return Err(ColourMapError::Empty);
    }
    Ok(colours)
}

/// Loads a colour map file and registers it under its file stem.
/// Returns the key of the new colour map.
pub fn load_colour_map(path: &Path) -> Result<String, ColourMapError> {
    let key = path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
        .ok_or(ColourMapError::InvalidName)?;
    let colours = parse_colour_map(&fs::read_to_string(path)?)?;
    register_colour_map(ColourMap {
        name: key.clone(),
        key: key.clone(),
        colours,
    });
    Ok(key)
}
