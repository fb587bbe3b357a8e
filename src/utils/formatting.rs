use chrono::{DateTime, Timelike, Utc};

const MAX_DESCRIPTION_LEN: usize = 80;

pub fn format_study_date(date: &DateTime<Utc>) -> String {
    if date.hour() == 0 && date.minute() == 0 {
        date.format("%Y-%m-%d").to_string()
    } else {
        date.format("%Y-%m-%d %H:%M").to_string()
    }
}

pub fn truncate_description(description: &str) -> String {
    let trimmed = description.trim();
    if trimmed.chars().count() > MAX_DESCRIPTION_LEN {
        let mut truncated = trimmed.chars().take(MAX_DESCRIPTION_LEN).collect::<String>();
        truncated.push('…');
        truncated
    } else {
        trimmed.to_string()
    }
}

pub fn format_study_count(count: usize) -> String {
    let suffix = if count == 1 { "study" } else { "studies" };
    format!("{count} {suffix}")
}

pub fn format_study_extent(series: Option<usize>, instances: Option<usize>) -> Option<String> {
    let plural = |count: usize| if count == 1 { "" } else { "s" };
    match (series, instances) {
        (Some(series), Some(instances)) => Some(format!(
            "{series} series · {instances} image{}",
            plural(instances)
        )),
        (Some(series), None) => Some(format!("{series} series")),
        (None, Some(instances)) => Some(format!("{instances} image{}", plural(instances))),
        (None, None) => None,
    }
}
