//! Shared utility functions for the weather forecast crates.

/// Date utility functions
pub mod dates {
    use chrono::NaiveDate;

    /// ISO 8601 calendar date, used at every file and HTTP boundary.
    pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format(ISO_DATE_FORMAT).to_string()
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s.trim(), ISO_DATE_FORMAT)?)
    }

    /// Parse a date that may carry a time-of-day suffix ("2024-01-15 00:00:00"
    /// or "2024-01-15T00:00"), keeping only the calendar day.
    pub fn parse_calendar_day(s: &str) -> anyhow::Result<NaiveDate> {
        let trimmed = s.trim();
        let day = trimmed
            .split(|c: char| c == ' ' || c == 'T')
            .next()
            .unwrap_or(trimmed);
        parse_date(day)
    }

}

/// Output path helpers
pub mod paths {
    use std::path::Path;

    /// Lowercase a place name and collapse every run of non-alphanumeric
    /// characters into a single underscore, e.g. "Austin, US" -> "austin_us".
    pub fn slugify(name: &str) -> String {
        let mut slug = String::with_capacity(name.len());
        let mut pending_separator = false;
        for c in name.trim().chars().flat_map(char::to_lowercase) {
            if c.is_ascii_alphanumeric() {
                if pending_separator && !slug.is_empty() {
                    slug.push('_');
                }
                pending_separator = false;
                slug.push(c);
            } else {
                pending_separator = true;
            }
        }
        slug
    }

    /// Create the parent directory of `path` if it does not exist yet.
    pub fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }

}
