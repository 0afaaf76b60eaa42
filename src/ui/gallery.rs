use iced::widget::image::Handle;
use iced::widget::{button, container, image, text};
use iced::{Element, Length};
use iced_aw::Wrap;
use std::collections::HashMap;

use crate::media::thumbnail::{THUMBNAIL_HEIGHT, THUMBNAIL_WIDTH};
use crate::state::data::PanoramaItem;
use crate::state::session::Session;
use crate::Message;

/// One selectable tile per gallery item, active one highlighted
pub fn view<'a>(session: &'a Session, thumbnails: &'a HashMap<String, Handle>) -> Element<'a, Message> {
    let tiles = session
        .items()
        .iter()
        .map(|item| tile(item, thumbnails.get(&item.id)))
        .collect();

    Wrap::with_elements(tiles)
        .spacing(8.0)
        .line_spacing(8.0)
        .into()
}

fn tile<'a>(item: &'a PanoramaItem, thumbnail: Option<&Handle>) -> Element<'a, Message> {
    let width = THUMBNAIL_WIDTH as f32;
    let height = THUMBNAIL_HEIGHT as f32;

    // Placeholder until the thumbnail task reports back
    let content: Element<'a, Message> = match thumbnail {
        Some(handle) => image(handle.clone())
            .width(Length::Fixed(width))
            .height(Length::Fixed(height))
            .into(),
        None => container(text(item.id.as_str()).size(14))
            .width(Length::Fixed(width))
            .height(Length::Fixed(height))
            .center_x(Length::Fixed(width))
            .center_y(Length::Fixed(height))
            .into(),
    };

    let style = if item.active {
        button::primary
    } else {
        button::secondary
    };

    button(content)
        .padding(4)
        .style(style)
        .on_press(Message::SelectThumbnail(item.id.clone()))
        .into()
}
