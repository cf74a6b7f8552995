//! Run configuration: the JSON config file, its defaults and validation.

use std::fmt;
use std::fs;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, TimesheetError};

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

const DEFAULT_CONTRACTOR: &str = "contractor";
const DEFAULT_FILE_FORMAT: &str = "xlsx";
const DEFAULT_CLIENT: &str = "Client";
const DEFAULT_PROJECT_NAME: &str = "Project";
const DEFAULT_WORK_HOURS: f64 = 8.0;
const DEFAULT_DATE_FORMAT: &str = "dd/MM/yyyy";

// --- File Shape ---
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ConfigFile {
    contractor: String,
    file_format: String,
    client: String,
    project_name: String,
    work_hours: f64,
    date_format: String,
    year: Option<i32>,
    month: Option<i32>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            contractor: DEFAULT_CONTRACTOR.to_string(),
            file_format: DEFAULT_FILE_FORMAT.to_string(),
            client: DEFAULT_CLIENT.to_string(),
            project_name: DEFAULT_PROJECT_NAME.to_string(),
            work_hours: DEFAULT_WORK_HOURS,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            year: None,
            month: None,
        }
    }
}

// --- Validated Config ---
/// Everything a run needs, validated once and then passed by reference.
#[derive(Debug, Clone)]
pub struct Config {
    pub contractor: String,
    pub file_format: FileFormat,
    pub client: String,
    pub project_name: String,
    pub work_hours: f64,
    pub date_format: DatePattern,
    pub year: Option<i32>,
    pub month: Option<i32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            contractor: DEFAULT_CONTRACTOR.to_string(),
            file_format: FileFormat::Xlsx,
            client: DEFAULT_CLIENT.to_string(),
            project_name: DEFAULT_PROJECT_NAME.to_string(),
            work_hours: DEFAULT_WORK_HOURS,
            date_format: DatePattern::default(),
            year: None,
            month: None,
        }
    }
}

impl Config {
    /// Reads and validates the JSON config at `path`. A missing file is an
    /// error; missing keys fall back to the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| TimesheetError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&text).map_err(|e| match e {
            ConfigError::Parse(source) => TimesheetError::ConfigParse {
                path: path.to_path_buf(),
                source,
            },
            ConfigError::Invalid(e) => e,
        })?;
        debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    fn from_json(text: &str) -> std::result::Result<Self, ConfigError> {
        let file: ConfigFile = serde_json::from_str(text).map_err(ConfigError::Parse)?;
        Self::from_file(file).map_err(ConfigError::Invalid)
    }

    fn from_file(file: ConfigFile) -> Result<Self> {
        let contractor = file.contractor.trim().to_string();
        if contractor.is_empty() {
            return Err(invalid("contractor", "must not be empty"));
        }
        if contractor.contains(['/', '\\']) {
            return Err(invalid("contractor", "must not contain path separators"));
        }
        if !file.work_hours.is_finite() || file.work_hours < 0.0 {
            return Err(invalid(
                "workHours",
                format!("{} is not a non-negative number", file.work_hours),
            ));
        }

        Ok(Self {
            contractor,
            file_format: FileFormat::parse(&file.file_format)?,
            client: file.client,
            project_name: file.project_name,
            work_hours: file.work_hours,
            date_format: DatePattern::parse(&file.date_format)?,
            year: file.year,
            month: file.month,
        })
    }

    /// Replaces the configured target with any CLI-supplied year/month.
    pub fn with_overrides(mut self, year: Option<i32>, month: Option<i32>) -> Self {
        if year.is_some() {
            self.year = year;
        }
        if month.is_some() {
            self.month = month;
        }
        self
    }

    /// Target (year, 1-based month); unset parts come from `today`.
    pub fn target(&self, today: NaiveDate) -> (i32, i32) {
        (
            self.year.unwrap_or_else(|| today.year()),
            self.month.unwrap_or_else(|| today.month() as i32),
        )
    }

    /// `{contractor}_{YYYYMM}.{ext}`
    pub fn output_file_name(&self, year: i32, month: i32) -> String {
        format!(
            "{}_{:04}{:02}.{}",
            self.contractor,
            year,
            month,
            self.file_format.extension()
        )
    }
}

enum ConfigError {
    Parse(serde_json::Error),
    Invalid(TimesheetError),
}

fn invalid(key: &'static str, reason: impl Into<String>) -> TimesheetError {
    TimesheetError::InvalidConfig {
        key,
        reason: reason.into(),
    }
}

// --- File Format ---
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Xlsx,
    Csv,
}

impl FileFormat {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "xlsx" => Ok(FileFormat::Xlsx),
            "csv" => Ok(FileFormat::Csv),
            other => Err(invalid(
                "fileFormat",
                format!("unsupported format `{other}` (expected xlsx or csv)"),
            )),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Xlsx => "xlsx",
            FileFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

// --- Date Pattern ---
/// A display pattern in date-fns style (`dd/MM/yyyy`), compiled to a chrono
/// strftime string.
#[derive(Clone, PartialEq, Eq)]
pub struct DatePattern {
    source: String,
    strftime: String,
}

impl fmt::Debug for DatePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DatePattern({:?})", self.as_str())
    }
}

impl Default for DatePattern {
    fn default() -> Self {
        Self {
            source: DEFAULT_DATE_FORMAT.to_string(),
            strftime: "%d/%m/%Y".to_string(),
        }
    }
}

impl DatePattern {
    pub fn parse(pattern: &str) -> Result<Self> {
        let mut strftime = String::new();
        let mut chars = pattern.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '\'' {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    strftime.push('\'');
                    continue;
                }
                // Quoted literal, '' inside stands for one quote.
                loop {
                    match chars.next() {
                        Some('\'') if chars.peek() == Some(&'\'') => {
                            chars.next();
                            strftime.push('\'');
                        }
                        Some('\'') => break,
                        Some(ch) => push_literal(&mut strftime, ch),
                        None => {
                            return Err(invalid(
                                "dateFormat",
                                format!("unterminated quoted text in `{pattern}`"),
                            ));
                        }
                    }
                }
            } else if c.is_ascii_alphabetic() {
                let mut run = 1;
                while chars.peek() == Some(&c) {
                    chars.next();
                    run += 1;
                }
                let spec = match (c, run) {
                    ('y', 2) => "%y",
                    ('y', _) => "%Y",
                    ('M', 1) => "%-m",
                    ('M', 2) => "%m",
                    ('M', 3) => "%b",
                    ('M', 4) => "%B",
                    ('d', 1) => "%-d",
                    ('d', 2) => "%d",
                    ('E', 1..=3) => "%a",
                    ('E', 4) => "%A",
                    _ => {
                        return Err(invalid(
                            "dateFormat",
                            format!(
                                "unsupported token `{}` in `{pattern}`",
                                c.to_string().repeat(run)
                            ),
                        ));
                    }
                };
                strftime.push_str(spec);
            } else {
                push_literal(&mut strftime, c);
            }
        }

        Ok(Self {
            source: pattern.to_string(),
            strftime,
        })
    }

    pub fn format(&self, date: NaiveDate) -> String {
        date.format(&self.strftime).to_string()
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}
