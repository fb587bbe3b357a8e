use crate::components::status_badge;
use crate::message::Message;
use crate::model::{ListView, StudyListState, StudyRow};
use crate::utils::format_study_count;
use iced::widget::text::Wrapping;
use iced::widget::{button, column, container, row, text, Column};
use iced::{Alignment, Element, Length};

pub fn study_list_panel(state: &StudyListState) -> Element<'static, Message> {
    match ListView::from_state(state) {
        ListView::Progress => text("Loading CT studies…").size(16).into(),
        ListView::Empty { message } => text(message).into(),
        ListView::Rows { count, rows } => rows_table(count, rows),
        ListView::Error { kind, message } => column![
            text(kind.title()).size(16),
            text(message).wrapping(Wrapping::Word),
            button("Retry").on_press(Message::RetryFetch),
        ]
        .spacing(12)
        .align_x(Alignment::Start)
        .into(),
    }
}

fn rows_table(count: usize, rows: Vec<StudyRow>) -> Element<'static, Message> {
    let header = row![
        text("Date").width(Length::FillPortion(2)),
        text("Description").width(Length::FillPortion(5)),
        text("Status").width(Length::FillPortion(2)),
    ]
    .spacing(12);

    let table = rows
        .into_iter()
        .fold(column![header].spacing(8), |table, study| {
            table.push(study_row(study))
        });

    column![text(format_study_count(count)).size(14), table]
        .spacing(12)
        .into()
}

fn study_row(study: StudyRow) -> Column<'static, Message> {
    let main = row![
        text(study.date).width(Length::FillPortion(2)),
        text(study.description)
            .width(Length::FillPortion(5))
            .wrapping(Wrapping::Word),
        container(status_badge(study.status)).width(Length::FillPortion(2)),
    ]
    .spacing(12)
    .align_y(Alignment::Center);

    let detail = match study.extent {
        Some(extent) => format!("Study {} · {extent}", study.study_id),
        None => format!("Study {}", study.study_id),
    };

    column![main, text(detail).size(12)].spacing(2)
}
