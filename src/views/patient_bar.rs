use crate::message::Message;
use iced::widget::{button, row, text_input, Row};
use iced::{Alignment, Length};

pub fn patient_bar<'a>(input: &'a str, patient_open: bool) -> Row<'a, Message> {
    let input = text_input("Patient identifier", input)
        .on_input(Message::PatientInputChanged)
        .on_submit(Message::OpenPatient)
        .padding(8)
        .width(Length::Fixed(260.0));

    let close = button("Close patient").on_press_maybe(patient_open.then_some(Message::ClosePatient));

    row![
        input,
        button("Open patient").on_press(Message::OpenPatient),
        close,
        button("Choose DICOM folder").on_press(Message::PickDicomFolder),
    ]
    .spacing(12)
    .align_y(Alignment::Center)
}
