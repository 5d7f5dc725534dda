use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::Error;

pub const COLUMNS: [&str; 3] = ["title", "body", "url"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub title: String,
    pub body: String,
    pub url: String,
}

/// Column-aligned article rows in discovery order.
///
/// The three columns only grow together through [`ArticleTable::push`], so
/// they always have the same length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleTable {
    titles: Vec<String>,
    bodies: Vec<String>,
    urls: Vec<String>,
}

impl ArticleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ArticleRecord) {
        self.titles.push(record.title);
        self.bodies.push(record.body);
        self.urls.push(record.url);
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    pub fn bodies(&self) -> &[String] {
        &self.bodies
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Row `i` as `[title, body, url]`, in [`COLUMNS`] order.
    pub fn row(&self, i: usize) -> Option<[&str; 3]> {
        Some([
            self.titles.get(i)?.as_str(),
            self.bodies.get(i)?.as_str(),
            self.urls.get(i)?.as_str(),
        ])
    }

    pub fn rows(&self) -> impl Iterator<Item = [&str; 3]> + '_ {
        (0..self.len()).filter_map(move |i| self.row(i))
    }

    pub fn records(&self) -> Vec<ArticleRecord> {
        self.rows()
            .map(|[title, body, url]| ArticleRecord {
                title: title.to_string(),
                body: body.to_string(),
                url: url.to_string(),
            })
            .collect()
    }
}

impl FromIterator<ArticleRecord> for ArticleTable {
    fn from_iter<I: IntoIterator<Item = ArticleRecord>>(iter: I) -> Self {
        let mut table = ArticleTable::new();
        for record in iter {
            table.push(record);
        }
        table
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Csv,
    Xlsx,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => ".csv",
            OutputFormat::Xlsx => ".xlsx",
            OutputFormat::Json => ".json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "text/csv",
            OutputFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            OutputFormat::Json => "application/json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    /// Accepts the extension tags (`.csv`, `.xlsx`, `.json`), with or without
    /// the leading dot.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "xlsx" => Ok(OutputFormat::Xlsx),
            "json" => Ok(OutputFormat::Json),
            _ => Err(Error::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Serialized table ready for a single block upload.
#[derive(Debug, Clone)]
pub struct UploadArtifact {
    pub name: String,
    pub format: OutputFormat,
    pub content: Vec<u8>,
}

impl UploadArtifact {
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadReceipt {
    pub container: String,
    pub blob_name: String,
    pub content_type: String,
    pub size: usize,
    pub uploaded_at: DateTime<Local>,
}
