use crate::ir::{ComponentFootprint, Obstacle};

use super::geometry::direction_vector;

/// Extra cells around the pin box of a multi-pin component.
const COMPONENT_PADDING: i32 = 1;
/// A single-pin body sits this many cells behind its pin.
const SINGLE_PIN_OFFSET: f32 = 2.5;
const SINGLE_PIN_SIZE: f32 = 1.5;

/// Shapes a placed component into a grid keep-out rectangle.
///
/// The body is inferred from the pin positions alone:
/// - one pin: a small square sitting behind the pin, leaving the pin cell
///   outside the strict buffer so the wire can approach from the side;
/// - two pins: a thin bar between the pins that stops half a cell short of
///   each of them;
/// - more pins: the pin bounding box plus one cell of padding.
///
/// Returns `None` for components without pins or for a non-positive grid.
pub fn obstacle_for_component(component: &ComponentFootprint, grid_size: f32) -> Option<Obstacle> {
    if !(grid_size.is_finite() && grid_size > 0.0) {
        return None;
    }
    let first = component.ports.first()?;
    let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
    let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
    for port in &component.ports {
        min_x = min_x.min(port.position.x);
        min_y = min_y.min(port.position.y);
        max_x = max_x.max(port.position.x);
        max_y = max_y.max(port.position.y);
    }

    let g = grid_size;
    let (x, y, width, height) = match component.ports.len() {
        1 => {
            let dir = direction_vector(first.direction.as_ref());
            let cx = min_x - dir.x as f32 * SINGLE_PIN_OFFSET * g;
            let cy = min_y - dir.y as f32 * SINGLE_PIN_OFFSET * g;
            let half = g * SINGLE_PIN_SIZE / 2.0;
            let gx1 = ((cx - half) / g).floor() as i32;
            let gx2 = ((cx + half) / g).ceil() as i32;
            let gy1 = ((cy - half) / g).floor() as i32;
            let gy2 = ((cy + half) / g).ceil() as i32;
            (gx1, gy1, gx2 - gx1, gy2 - gy1)
        }
        2 => {
            let inset = g / 2.0;
            let thickness = g / 2.0;
            let (body_min_x, body_max_x, body_min_y, body_max_y) = if max_x - min_x > max_y - min_y {
                let cy = (min_y + max_y) / 2.0;
                (min_x + inset, max_x - inset, cy - thickness, cy + thickness)
            } else {
                let cx = (min_x + max_x) / 2.0;
                (cx - thickness, cx + thickness, min_y + inset, max_y - inset)
            };
            // grid nodes lying inside the body, edges included
            let gx1 = (body_min_x / g).ceil() as i32;
            let gx2 = (body_max_x / g).floor() as i32;
            let gy1 = (body_min_y / g).ceil() as i32;
            let gy2 = (body_max_y / g).floor() as i32;
            (gx1, gy1, (gx2 - gx1 + 1).max(0), (gy2 - gy1 + 1).max(0))
        }
        _ => {
            let gx1 = (min_x / g).floor() as i32;
            let gx2 = (max_x / g).ceil() as i32;
            let gy1 = (min_y / g).floor() as i32;
            let gy2 = (max_y / g).ceil() as i32;
            (
                gx1 - COMPONENT_PADDING,
                gy1 - COMPONENT_PADDING,
                gx2 - gx1 + 2 * COMPONENT_PADDING,
                gy2 - gy1 + 2 * COMPONENT_PADDING,
            )
        }
    };

    Some(Obstacle::new(component.id.clone(), x, y, width, height))
}
