use iced::widget::{button, row, text};
use iced::{Alignment, Element};

use crate::state::data::InteractionMode;
use crate::Message;

pub fn view<'a>(mode: InteractionMode, rotating: bool, status: &'a str) -> Element<'a, Message> {
    let rotation_label = if rotating { "Pause rotation" } else { "Resume rotation" };

    let mode_button = button(mode.toggle_label())
        .padding(10)
        .on_press(Message::ToggleMode);
    let mode_button = match mode {
        InteractionMode::Edit => mode_button.style(button::danger),
        InteractionMode::Browse => mode_button,
    };

    row![
        button(rotation_label)
            .padding(10)
            .on_press(Message::ToggleAutorotate),
        mode_button,
        button("Upload panorama")
            .padding(10)
            .on_press(Message::Upload),
        text(status).size(16),
    ]
    .spacing(12)
    .align_y(Alignment::Center)
    .into()
}
