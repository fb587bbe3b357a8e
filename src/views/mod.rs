pub mod dashboard;
pub mod patient_bar;
pub mod study_list;

pub use dashboard::dashboard_panel;
pub use patient_bar::patient_bar;
pub use study_list::study_list_panel;
