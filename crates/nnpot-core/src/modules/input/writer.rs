use super::model::{HeaderValue, NnpSettings};
use crate::common::Element;
use crate::numerics::format_trainer_float;

const HEADER_KEY_WIDTH: usize = 32;

fn header(key: &str, value: impl std::fmt::Display) -> String {
    format!("{key:<width$}{value}", width = HEADER_KEY_WIDTH)
}

fn render_value(value: HeaderValue) -> String {
    match value {
        HeaderValue::Int(value) => value.to_string(),
        HeaderValue::Float(value) => format_trainer_float(value),
    }
}

/// Renders `input.nn` for a single-element network.
pub fn render_input(settings: &NnpSettings, element: Element) -> String {
    let symbol = element.symbol();
    let general = &settings.general;
    let mut lines = vec![header("number_of_elements", 1), header("elements", symbol)];

    if let Some(atom_energy) = settings.atom_energy {
        lines.push(header(
            "atom_energy",
            format!("{} {}", symbol, format_trainer_float(atom_energy)),
        ));
    }

    lines.push(header("cutoff_type", general.cutoff_type));
    if let Some(keyword) = general.scale_features.keyword() {
        lines.push(keyword.to_string());
    }
    lines.push(header(
        "scale_min_short",
        format_trainer_float(general.scale_min_short),
    ));
    lines.push(header(
        "scale_max_short",
        format_trainer_float(general.scale_max_short),
    ));

    let layers = &general.hidden_layers;
    lines.push(header("global_hidden_layers_short", layers.len()));
    lines.push(header(
        "global_nodes_short",
        layers
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" "),
    ));
    let mut activations = vec![general.activations.as_str(); layers.len()];
    activations.push("l");
    lines.push(header("global_activation_short", activations.join(" ")));

    if general.normalize_nodes {
        lines.push("normalize_nodes".to_string());
    }

    for (key, value) in settings.additional.entries() {
        lines.push(header(key, render_value(value)));
    }
    lines.push("use_short_forces".to_string());

    lines.extend(
        settings
            .symmetry_function
            .functions()
            .iter()
            .map(|function| function.render(symbol)),
    );

    lines.join("\n")
}
