pub mod formatting;

pub use formatting::{
    format_study_count, format_study_date, format_study_extent, truncate_description,
};
