// src/map/modules.rs
//! Built-in overlay modules

use super::registry::{RenderNode, Renderer};
use crate::location::{LocationProvider, PositionErrorKind};
use std::sync::Arc;

pub const POSITION_MARKER: &str = "position-marker";
pub const TRACKING_STATUS: &str = "tracking-status";
pub const ATTRIBUTION: &str = "attribution";

/// Marker at the provider's current position.
///
/// Props: `label` (string), defaults to "You are here".
pub fn position_marker(location: Arc<LocationProvider>) -> Renderer {
    Renderer::map_with_props(move |map, props| {
        if !map.is_ready() {
            return RenderNode::Empty;
        }
        let reading = location.current_reading();
        match reading.coordinates {
            Some(c) => RenderNode::Marker {
                latitude: c.latitude,
                longitude: c.longitude,
                label: Some(
                    props
                        .get("label")
                        .and_then(|v| v.as_str())
                        .unwrap_or("You are here")
                        .to_string(),
                ),
            },
            None => RenderNode::Empty,
        }
    })
}

/// One status line about the reading's tier and the last tracking error.
///
/// Props: `hint` (string) replaces the message shown on permission-denied.
pub fn tracking_status(location: Arc<LocationProvider>) -> Renderer {
    Renderer::props(move |props| {
        let reading = location.current_reading();
        let mut lines = vec![RenderNode::Text(format!("Precision: {}", reading.precision))];

        if let Some(error) = &reading.error {
            let hint = match (error.kind, props.get("hint").and_then(|v| v.as_str())) {
                (PositionErrorKind::PermissionDenied, Some(custom)) => custom.to_string(),
                _ => error.hint().to_string(),
            };
            lines.push(RenderNode::Text(format!("{} ({})", hint, error.message)));
        }

        if lines.len() == 1 {
            lines.remove(0)
        } else {
            RenderNode::Group(lines)
        }
    })
}

/// Style attribution line, when the surface shows attribution
pub fn attribution() -> Renderer {
    Renderer::map(|map| {
        map.with_map(|surface| {
            if surface.attribution_enabled() {
                RenderNode::Text(format!("Map style: {}", surface.style_url()))
            } else {
                RenderNode::Empty
            }
        })
        .unwrap_or(RenderNode::Empty)
    })
}
