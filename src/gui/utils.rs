use bevy_egui::egui;

const ELLIPSIS: &str = "…";

/// Calculates the width of a single char.
fn calc_char_width(ui: &egui::Ui, char: char) -> f32 {
    ui.fonts(|f| f.glyph_width(&egui::TextStyle::Body.resolve(ui.style()), char))
}

/// Calculates the width of the specified text using the current font configuration.
/// Does not take new lines or text breaks into account!
pub fn calc_text_width(ui: &egui::Ui, text: &str) -> f32 {
    text.chars().map(|c| calc_char_width(ui, c)).sum()
}

/// Shortens an overlay name to fit into `max_width`, keeping its start and end.
/// File extensions such as `.nii.gz` are kept in full.
pub fn truncate_name(ui: &egui::Ui, name: &str, max_width: f32) -> String {
    if calc_text_width(ui, name) <= max_width {
        return name.to_string();
    }
    let widths: Vec<f32> = name.chars().map(|c| calc_char_width(ui, c)).collect();
    let budget = max_width - calc_text_width(ui, ELLIPSIS);
    elide_middle(name, &widths, budget)
}

fn split_extension(name: &str) -> (&str, &str) {
    match name.find('.') {
        Some(index) if index > 0 => name.split_at(index),
        _ => (name, ""),
    }
}

fn elide_middle(name: &str, widths: &[f32], budget: f32) -> String {
    let (stem, extension) = split_extension(name);
    let stem: Vec<char> = stem.chars().collect();
    let extension_width: f32 = widths[stem.len()..].iter().sum();

    let mut remaining = budget - extension_width;
    let (mut front, mut back) = (0, stem.len());
    while front < back {
        let w = widths[front];
        if w > remaining {
            break;
        }
        remaining -= w;
        front += 1;

        if front >= back {
            break;
        }
        let w = widths[back - 1];
        if w > remaining {
            break;
        }
        remaining -= w;
        back -= 1;
    }

    if front >= back {
        return name.to_string();
    }
    format!(
        "{}{ELLIPSIS}{}{extension}",
        stem[..front].iter().collect::<String>(),
        stem[back..].iter().collect::<String>()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_widths(name: &str) -> Vec<f32> {
        vec![1.0; name.chars().count()]
    }

    #[test]
    fn test_elide_keeps_both_ends_and_extension() {
        let name = "sub-01_T1w_brain.nii.gz";
        assert_eq!(elide_middle(name, &unit_widths(name), 13.0), "sub…ain.nii.gz");
    }

    #[test]
    fn test_elide_is_a_noop_when_everything_fits() {
        let name = "t1.nii";
        assert_eq!(elide_middle(name, &unit_widths(name), 20.0), name);
        assert_eq!(split_extension(".hidden"), (".hidden", ""));
    }
}
