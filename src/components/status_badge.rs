use crate::message::Message;
use crate::model::StudyStatus;
use iced::widget::text::Wrapping;
use iced::widget::{container, text, Container};
use iced::{Alignment, Background, Color, Length, Theme};

pub fn status_badge(status: StudyStatus) -> Container<'static, Message> {
    container(text(status.label()).size(13).wrapping(Wrapping::None))
        .padding([2, 10])
        .width(Length::Shrink)
        .align_x(Alignment::Center)
        .style(move |theme| badge_style(theme, status))
}

fn badge_style(theme: &Theme, status: StudyStatus) -> iced::widget::container::Style {
    let palette = theme.extended_palette();

    let (background, text_color) = match status {
        StudyStatus::Available => (palette.success.weak.color, palette.success.weak.text),
        StudyStatus::Pending => (
            palette.background.strong.color.scale_alpha(0.8),
            palette.background.strong.text,
        ),
        StudyStatus::Archived => (
            palette.secondary.weak.color.scale_alpha(0.6),
            palette.secondary.weak.text,
        ),
    };

    iced::widget::container::Style {
        background: Some(Background::Color(background)),
        text_color: Some(text_color),
        border: iced::border::Border {
            color: Color::TRANSPARENT,
            width: 0.0,
            radius: iced::border::Radius::new(999.0),
        },
        ..Default::default()
    }
}
