use std::borrow::Cow;

use chrono::NaiveDateTime;
use mn_core::types::COLUMNS;
use mn_core::{ArticleTable, Error, OutputFormat, Result, UploadArtifact};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use serde::Serialize;
use tracing::warn;

/// Excel refuses cells longer than this many characters.
pub const XLSX_MAX_CELL_CHARS: usize = 32_767;

pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// `{YYYYMMDD_HHMMSS}_{base_name}{extension}`
pub fn object_name(base_name: &str, format: OutputFormat, timestamp: &NaiveDateTime) -> String {
    format!(
        "{}_{}{}",
        timestamp.format(TIMESTAMP_FORMAT),
        base_name,
        format.extension()
    )
}

pub fn build_artifact(
    table: &ArticleTable,
    base_name: &str,
    format: OutputFormat,
    timestamp: &NaiveDateTime,
) -> Result<UploadArtifact> {
    Ok(UploadArtifact {
        name: object_name(base_name, format, timestamp),
        format,
        content: serialize_table(table, format)?,
    })
}

pub fn serialize_table(table: &ArticleTable, format: OutputFormat) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Csv => to_csv(table),
        OutputFormat::Xlsx => to_xlsx(table).map_err(|e| Error::Export(format!("xlsx: {}", e))),
        OutputFormat::Json => to_json(table),
    }
}

fn to_csv(table: &ArticleTable) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let csv_err = |e: csv::Error| Error::Export(format!("csv: {}", e));
    writer.write_record(COLUMNS).map_err(csv_err)?;
    for row in table.rows() {
        writer.write_record(row).map_err(csv_err)?;
    }
    writer
        .into_inner()
        .map_err(|e| Error::Export(format!("csv: {}", e)))
}

fn to_xlsx(table: &ArticleTable) -> std::result::Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Sheet1")?;

    for (col, name) in COLUMNS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *name, &header)?;
    }
    for (i, row) in table.rows().enumerate() {
        for (col, cell) in row.iter().enumerate() {
            worksheet.write_string(i as u32 + 1, col as u16, truncate_cell(cell).as_ref())?;
        }
    }

    workbook.save_to_buffer()
}

fn truncate_cell(cell: &str) -> Cow<'_, str> {
    match cell.char_indices().nth(XLSX_MAX_CELL_CHARS) {
        Some((cut, _)) => {
            warn!(
                chars = cell.chars().count(),
                "✂️ Cell exceeds the Excel limit, truncating to {} chars", XLSX_MAX_CELL_CHARS
            );
            Cow::Owned(cell[..cut].to_string())
        }
        None => Cow::Borrowed(cell),
    }
}

/// pandas "split" orientation.
#[derive(Serialize)]
struct SplitTable<'a> {
    columns: [&'static str; 3],
    index: Vec<usize>,
    data: Vec<[&'a str; 3]>,
}

fn to_json(table: &ArticleTable) -> Result<Vec<u8>> {
    let split = SplitTable {
        columns: COLUMNS,
        index: (0..table.len()).collect(),
        data: table.rows().collect(),
    };
    Ok(serde_json::to_vec(&split)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use mn_core::ArticleRecord;

    fn sample_table() -> ArticleTable {
        vec![
            ArticleRecord {
                title: "Collision Report".to_string(),
                body: "Two vessels collided, \"minor\" damage, no injuries".to_string(),
                url: "https://www.fleetmon.com/maritime-news/2024/1/collision".to_string(),
            },
            ArticleRecord {
                title: String::new(),
                body: "only text\nwith a second line".to_string(),
                url: "https://www.fleetmon.com/maritime-news/2024/2/other".to_string(),
            },
        ]
        .into_iter()
        .collect()
    }

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap()
    }

    #[test]
    fn test_object_name() {
        assert_eq!(
            object_name("fleetmon_scraping_results", OutputFormat::Xlsx, &timestamp()),
            "20240102_030405_fleetmon_scraping_results.xlsx"
        );
        assert_eq!(
            object_name("results", OutputFormat::Csv, &timestamp()),
            "20240102_030405_results.csv"
        );
    }

    #[test]
    fn test_csv_round_trip() {
        let table = sample_table();
        let bytes = serialize_table(&table, OutputFormat::Csv).unwrap();

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), COLUMNS);

        let rows: Vec<ArticleRecord> = reader
            .records()
            .map(|r| {
                let r = r.unwrap();
                assert_eq!(r.len(), 3);
                ArticleRecord {
                    title: r[0].to_string(),
                    body: r[1].to_string(),
                    url: r[2].to_string(),
                }
            })
            .collect();
        assert_eq!(rows, table.records());
    }

    #[test]
    fn test_csv_has_no_index_column() {
        let bytes = serialize_table(&sample_table(), OutputFormat::Csv).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("title,body,url\n"));
    }

    #[test]
    fn test_json_split_orientation() {
        let bytes = serialize_table(&sample_table(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["columns"], serde_json::json!(["title", "body", "url"]));
        assert_eq!(value["index"], serde_json::json!([0, 1]));
        assert_eq!(value["data"][0][0], "Collision Report");
        assert_eq!(value["data"][1][0], "");
        assert_eq!(value["data"][1][1], "only text\nwith a second line");
    }

    #[test]
    fn test_json_empty_table() {
        let bytes = serialize_table(&ArticleTable::new(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["index"], serde_json::json!([]));
        assert_eq!(value["data"], serde_json::json!([]));
    }

    fn read_xlsx(bytes: Vec<u8>) -> (Vec<String>, Vec<Vec<String>>) {
        use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};

        let mut workbook: Xlsx<_> = open_workbook_from_rs(std::io::Cursor::new(bytes)).unwrap();
        let sheets = workbook.sheet_names();
        let range = workbook.worksheet_range(&sheets[0]).unwrap();
        let rows = range
            .rows()
            .map(|row| {
                row.iter()
                    .map(|cell| match cell {
                        Data::String(s) => s.clone(),
                        Data::Empty => String::new(),
                        other => panic!("unexpected cell {:?}", other),
                    })
                    .collect()
            })
            .collect();
        (sheets, rows)
    }

    #[test]
    fn test_xlsx_layout() {
        let table = sample_table();
        let bytes = serialize_table(&table, OutputFormat::Xlsx).unwrap();
        assert_eq!(&bytes[..2], b"PK");

        let (sheets, rows) = read_xlsx(bytes);
        assert_eq!(sheets, ["Sheet1"]);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], COLUMNS);
        for (row, record) in rows[1..].iter().zip(table.records()) {
            assert_eq!(row, &[record.title, record.body, record.url]);
        }
    }

    #[test]
    fn test_xlsx_truncates_oversized_cells() {
        let table: ArticleTable = vec![ArticleRecord {
            title: "Long".to_string(),
            body: "x".repeat(XLSX_MAX_CELL_CHARS + 100),
            url: "https://www.fleetmon.com/maritime-news/long".to_string(),
        }]
        .into_iter()
        .collect();

        let (_, rows) = read_xlsx(serialize_table(&table, OutputFormat::Xlsx).unwrap());
        assert_eq!(rows[1][1].chars().count(), XLSX_MAX_CELL_CHARS);
        assert_eq!(rows[1][2], "https://www.fleetmon.com/maritime-news/long");
    }

    #[test]
    fn test_truncate_cell() {
        let short = "short";
        assert!(matches!(truncate_cell(short), Cow::Borrowed("short")));

        let long = "é".repeat(XLSX_MAX_CELL_CHARS + 10);
        assert_eq!(truncate_cell(&long).chars().count(), XLSX_MAX_CELL_CHARS);
    }

    #[test]
    fn test_build_artifact() {
        let artifact =
            build_artifact(&sample_table(), "fleetmon", OutputFormat::Json, &timestamp()).unwrap();
        assert_eq!(artifact.name, "20240102_030405_fleetmon.json");
        assert_eq!(artifact.content_type(), "application/json");
        assert!(!artifact.content.is_empty());
    }
}
