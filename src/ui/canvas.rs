use cgmath::Vector2;
use iced::mouse::{self, Cursor};
use iced::widget::canvas::{self, Frame, Path, Program, Stroke, Text};
use iced::{Color, Point, Rectangle, Renderer, Size, Theme};

use crate::viewer::markers::MARKER_RADIUS;
use crate::viewer::{MarkersPlugin, SphereViewer};
use crate::Message;

/// Pointer travel (pixels) below which a press/release counts as a click
const CLICK_SLOP: f32 = 4.0;

/// Canvas program drawing the panorama, its markers and the zoom readout.
///
/// Holds a borrow of the renderer for the current frame only; all state
/// changes travel back to the application as messages.
pub struct PanoramaCanvas<'a> {
    pub viewer: &'a SphereViewer,
}

impl Program<Message> for PanoramaCanvas<'_> {
    type State = DragState;

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        let (width, height) = (bounds.width, bounds.height);
        let camera = self.viewer.camera();

        frame.fill_rectangle(Point::ORIGIN, bounds.size(), Color::BLACK);

        if let Some(image) = self.viewer.image() {
            let rect = camera.image_rect(width, height);

            // Repeat the strip until it covers the surface horizontally
            let mut x = rect.x.rem_euclid(rect.width) - rect.width;
            while x < width {
                frame.draw_image(
                    Rectangle::new(Point::new(x, rect.y), Size::new(rect.width, rect.height)),
                    &image.handle,
                );
                x += rect.width;
            }
        }

        if let Some(markers) = self.viewer.plugin::<MarkersPlugin>() {
            let accent = theme.extended_palette().primary.strong.color;
            for marker in markers.markers() {
                let Some((mx, my)) = camera.spherical_to_screen(
                    marker.position.pitch,
                    marker.position.yaw,
                    width,
                    height,
                ) else {
                    continue;
                };

                let radius = MARKER_RADIUS * marker.scale;
                let circle = Path::circle(Point::new(mx, my), radius);
                frame.fill(&circle, Color { a: 0.6, ..accent });
                frame.stroke(&circle, Stroke::default().with_width(2.0).with_color(Color::WHITE));
            }
        }

        if self.viewer.is_loading() {
            frame.fill_text(Text {
                content: "Loading…".to_string(),
                position: Point::new(12.0, 12.0),
                color: Color::WHITE,
                ..Text::default()
            });
        }

        if self.viewer.navbar() {
            let bar = 28.0;
            frame.fill_rectangle(
                Point::new(0.0, height - bar),
                Size::new(width, bar),
                Color::from_rgba(0.0, 0.0, 0.0, 0.5),
            );
            frame.fill_text(Text {
                content: format!(
                    "Zoom {:.0}  FOV {:.0}°",
                    camera.zoom_lvl,
                    camera.fov().to_degrees()
                ),
                position: Point::new(12.0, height - bar + 6.0),
                color: Color::WHITE,
                ..Text::default()
            });
        }

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        match event {
            // Mouse wheel for zooming
            canvas::Event::Mouse(mouse::Event::WheelScrolled { delta }) => {
                if cursor.position_in(bounds).is_none() {
                    return (canvas::event::Status::Ignored, None);
                }
                let zoom_delta = match delta {
                    mouse::ScrollDelta::Lines { y, .. } => y * 5.0,
                    mouse::ScrollDelta::Pixels { y, .. } => y * 0.1,
                };
                return (canvas::event::Status::Captured, Some(Message::Zoom(zoom_delta)));
            }

            // Mouse button press - start dragging
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if let Some(pos) = cursor.position_in(bounds) {
                    state.is_dragging = true;
                    state.press_position = Some(pos);
                    state.last_position = Some(pos);
                    state.travelled = 0.0;
                    return (canvas::event::Status::Captured, None);
                }
            }

            // Mouse button release - a short press is a click on the surface
            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                if !state.is_dragging {
                    return (canvas::event::Status::Ignored, None);
                }
                let press = state.press_position.take();
                let travelled = state.travelled;
                state.is_dragging = false;
                state.last_position = None;

                let click = press
                    .filter(|_| travelled < CLICK_SLOP)
                    .and_then(|p| self.viewer.click_at(p.x, p.y, bounds.width, bounds.height))
                    .map(Message::Viewer);
                return (canvas::event::Status::Captured, click);
            }

            // Mouse move - pan if dragging
            canvas::Event::Mouse(mouse::Event::CursorMoved { .. }) => {
                if state.is_dragging {
                    if let (Some(current), Some(last)) = (cursor.position_in(bounds), state.last_position) {
                        let delta = Vector2::new(current.x - last.x, current.y - last.y);
                        state.travelled += delta.x.abs() + delta.y.abs();
                        state.last_position = Some(current);

                        if state.travelled >= CLICK_SLOP {
                            return (
                                canvas::event::Status::Captured,
                                Some(Message::Pan(delta, bounds.width)),
                            );
                        }
                        return (canvas::event::Status::Captured, None);
                    }
                }
            }

            _ => {}
        }

        (canvas::event::Status::Ignored, None)
    }

    fn mouse_interaction(
        &self,
        state: &Self::State,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> mouse::Interaction {
        if state.is_dragging {
            mouse::Interaction::Grabbing
        } else if cursor.is_over(bounds) {
            mouse::Interaction::Grab
        } else {
            mouse::Interaction::default()
        }
    }
}

/// State for drag interactions
#[derive(Debug, Clone, Default)]
pub struct DragState {
    pub is_dragging: bool,
    pub press_position: Option<Point>,
    pub last_position: Option<Point>,
    /// Manhattan distance moved since the press
    pub travelled: f32,
}
