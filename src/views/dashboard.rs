use super::study_list_panel;
use crate::message::Message;
use crate::model::StudyList;
use iced::widget::{column, horizontal_rule, text, Column};

pub fn dashboard_panel(study_list: &StudyList) -> Column<'static, Message> {
    column![
        text(format!("Patient {}", study_list.patient())).size(22),
        text("CT Studies").size(18),
        horizontal_rule(1),
        study_list_panel(study_list.state()),
    ]
    .spacing(12)
}
