use crate::message::Message;
use crate::model::{FetchRequest, PatientId, Resolution, StudyList};
use crate::sources::{DicomFolderSource, StudySource};
use crate::views::{dashboard_panel, patient_bar};
use iced::task;
use iced::widget::text::Wrapping;
use iced::widget::{column, container, scrollable, text};
use iced::{application, Alignment, Element, Length, Task, Theme};
use rfd::AsyncFileDialog;
use std::sync::Arc;

const APP_TITLE: &str = "CT Study Viewer";
const BLANK_PATIENT_NOTICE: &str = "Enter a patient identifier to open a dashboard.";
const NO_SOURCE_NOTICE: &str =
    "Choose a DICOM folder or start with --api-url to load studies.";

pub fn run(
    initial_patient: Option<PatientId>,
    source: Option<Arc<dyn StudySource>>,
) -> iced::Result {
    application(App::title, App::update, App::view)
        .theme(App::theme)
        .run_with(move || App::new(initial_patient, source))
}

pub struct App {
    source: Option<Arc<dyn StudySource>>,
    patient_input: String,
    study_list: Option<StudyList>,
    fetch_handle: Option<task::Handle>,
    notice: Option<String>,
}

impl App {
    pub fn new(
        initial_patient: Option<PatientId>,
        source: Option<Arc<dyn StudySource>>,
    ) -> (Self, Task<Message>) {
        let mut app = Self {
            source,
            patient_input: String::new(),
            study_list: None,
            fetch_handle: None,
            notice: None,
        };

        let task = match initial_patient {
            Some(patient) => {
                app.patient_input = patient.to_string();
                app.open_patient(patient)
            }
            None => Task::none(),
        };
        (app, task)
    }

    pub fn title(&self) -> String {
        match &self.study_list {
            Some(list) => format!("Patient Dashboard ({})", list.patient()),
            None => APP_TITLE.to_string(),
        }
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::PatientInputChanged(value) => {
                self.patient_input = value;
                Task::none()
            }
            Message::OpenPatient => match PatientId::new(&self.patient_input) {
                Ok(patient) => self.open_patient(patient),
                Err(err) => {
                    log::debug!("Rejected patient input: {err}");
                    self.notice = Some(BLANK_PATIENT_NOTICE.to_string());
                    Task::none()
                }
            },
            Message::ClosePatient => {
                self.close_patient();
                Task::none()
            }
            Message::RetryFetch => {
                let request = self.study_list.as_mut().and_then(StudyList::retry);
                self.spawn_fetch(request)
            }
            Message::StudiesFetched { tag, result } => {
                if let Some(list) = self.study_list.as_mut() {
                    if list.resolve(&tag, result) == Resolution::Applied {
                        self.fetch_handle = None;
                    }
                }
                Task::none()
            }
            Message::PickDicomFolder => Task::perform(
                async {
                    AsyncFileDialog::new()
                        .pick_folder()
                        .await
                        .map(|handle| handle.path().to_path_buf())
                },
                Message::DicomFolderPicked,
            ),
            Message::DicomFolderPicked(None) => Task::none(),
            Message::DicomFolderPicked(Some(path)) => {
                let source = DicomFolderSource::new(path);
                log::info!("Switching study source to {}", source.describe());
                self.source = Some(Arc::new(source));
                self.notice = None;

                match self.study_list.as_ref().map(|list| list.patient().clone()) {
                    Some(patient) => {
                        self.close_patient();
                        self.open_patient(patient)
                    }
                    None => Task::none(),
                }
            }
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let bar = patient_bar(&self.patient_input, self.study_list.is_some());

        let source_label = self
            .source
            .as_ref()
            .map(|source| source.describe())
            .unwrap_or_else(|| "No study source selected".to_string());

        let body: Element<'_, Message> = match &self.study_list {
            Some(list) => scrollable(dashboard_panel(list)).into(),
            None => text("Open a patient to view their CT studies").into(),
        };

        let mut content = column![bar, text(source_label).size(13)].spacing(20);

        if let Some(notice) = &self.notice {
            content = content.push(text(notice).size(16).wrapping(Wrapping::Word));
        }

        content
            .push(
                container(body)
                    .padding(16)
                    .width(Length::Fill)
                    .height(Length::Fill),
            )
            .padding(20)
            .align_x(Alignment::Start)
            .into()
    }

    pub fn theme(&self) -> Theme {
        Theme::Dark
    }

    fn open_patient(&mut self, patient: PatientId) -> Task<Message> {
        if self.source.is_none() {
            self.notice = Some(NO_SOURCE_NOTICE.to_string());
            return Task::none();
        }
        self.notice = None;

        let request = match self.study_list.as_mut() {
            Some(list) => list.change_patient(patient),
            None => {
                let (list, request) = StudyList::mount(patient);
                self.study_list = Some(list);
                Some(request)
            }
        };
        self.spawn_fetch(request)
    }

    fn close_patient(&mut self) {
        if let Some(mut list) = self.study_list.take() {
            list.unmount();
        }
        self.fetch_handle = None;
    }

    fn spawn_fetch(&mut self, request: Option<FetchRequest>) -> Task<Message> {
        let (Some(request), Some(source)) = (request, self.source.clone()) else {
            return Task::none();
        };

        let patient = request.patient().clone();
        let tag = request.tag;
        log::debug!(
            "Fetching CT studies for patient {patient} (generation {})",
            tag.generation()
        );
        let (task, handle) = Task::perform(
            async move { source.fetch_ct_studies(&patient).await },
            move |result| Message::StudiesFetched {
                tag: tag.clone(),
                result,
            },
        )
        .abortable();

        // Replacing the handle aborts the superseded request.
        self.fetch_handle = Some(handle.abort_on_drop());
        task
    }
}
