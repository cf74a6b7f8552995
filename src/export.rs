//! Sheet layout and the xlsx/csv writers.
//!
//! The layout is fixed: a header row, one row per week starting at row 1, and
//! the two total formulas on row 10 under the hour columns. Everything is
//! placed inside the declared A1:L12 extent.

use std::collections::BTreeMap;
use std::path::Path;

use rust_xlsxwriter::{
    Format, FormatAlign, FormatBorder, Formula, Workbook, column_number_to_name,
};
use tracing::info;

use crate::config::FileFormat;
use crate::error::{Result, TimesheetError};
use crate::rows::TimesheetRow;

pub const HEADERS: [&str; 6] = [
    "LOG_DATE_FROM",
    "LOG_DATE_TO",
    "LOG_CLIENT",
    "LOG_ISSUE_NAME",
    "LOG_PROJECT_HOURS",
    "LOG_INTERNAL_HOURS",
];

pub const FIRST_DATA_ROW: u32 = 1;
pub const TOTALS_ROW: u32 = 10;
pub const PROJECT_HOURS_COL: u16 = 4;
pub const INTERNAL_HOURS_COL: u16 = 5;
pub const EXTENT_ROWS: u32 = 12;
pub const EXTENT_COLS: u16 = 12;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    /// Formula text without the leading `=`, plus its computed value.
    Formula { expr: String, result: f64 },
}

impl Cell {
    fn to_csv_field(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => n.to_string(),
            Cell::Formula { expr, .. } => format!("={expr}"),
        }
    }
}

// --- Layout ---
/// Zero-based cell positions of the finished sheet.
#[derive(Debug, Clone)]
pub struct SheetLayout {
    cells: BTreeMap<(u32, u16), Cell>,
    rows: u32,
    cols: u16,
}

impl SheetLayout {
    pub fn new(rows: &[TimesheetRow]) -> Self {
        let mut cells = BTreeMap::new();

        for (col, label) in HEADERS.iter().enumerate() {
            cells.insert((0, col as u16), Cell::Text((*label).to_string()));
        }

        for (i, row) in rows.iter().enumerate() {
            let r = FIRST_DATA_ROW + i as u32;
            cells.insert((r, 0), Cell::Text(row.date_from.clone()));
            cells.insert((r, 1), Cell::Text(row.date_to.clone()));
            cells.insert((r, 2), Cell::Text(row.client.clone()));
            cells.insert((r, 3), Cell::Text(row.project_name.clone()));
            cells.insert((r, PROJECT_HOURS_COL), Cell::Number(row.project_hours));
            cells.insert((r, INTERNAL_HOURS_COL), Cell::Number(row.internal_hours));
        }

        // The sums track the real row count; row 10 only moves if the data would reach it.
        let last_data_row = FIRST_DATA_ROW + (rows.len() as u32).max(1) - 1;
        let totals_row = TOTALS_ROW.max(last_data_row + 2);
        let project_total = rows.iter().map(|r| r.project_hours).sum();
        let internal_total = rows.iter().map(|r| r.internal_hours).sum();
        cells.insert(
            (totals_row, PROJECT_HOURS_COL),
            Cell::Formula {
                expr: sum_formula(PROJECT_HOURS_COL, FIRST_DATA_ROW, last_data_row),
                result: project_total,
            },
        );
        cells.insert(
            (totals_row, INTERNAL_HOURS_COL),
            Cell::Formula {
                expr: sum_formula(INTERNAL_HOURS_COL, FIRST_DATA_ROW, last_data_row),
                result: internal_total,
            },
        );

        Self {
            cells,
            rows: EXTENT_ROWS.max(totals_row + 2),
            cols: EXTENT_COLS,
        }
    }

    pub fn cell(&self, row: u32, col: u16) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    pub fn cells(&self) -> impl Iterator<Item = (u32, u16, &Cell)> {
        self.cells.iter().map(|(&(r, c), cell)| (r, c, cell))
    }

    /// Declared extent as an A1-style range, e.g. `A1:L12`.
    pub fn extent(&self) -> String {
        format!(
            "A1:{}{}",
            column_number_to_name(self.cols - 1),
            self.rows
        )
    }
}

/// `SUM(E2:E6)` over zero-based rows `first..=last` of `col`.
fn sum_formula(col: u16, first: u32, last: u32) -> String {
    let name = column_number_to_name(col);
    format!("SUM({name}{}:{name}{})", first + 1, last + 1)
}

// --- Writers ---
/// Writes `rows` to `path` in `format`, replacing any existing file.
pub fn write(rows: &[TimesheetRow], path: &Path, format: FileFormat) -> Result<()> {
    let layout = SheetLayout::new(rows);
    match format {
        FileFormat::Xlsx => write_xlsx(&layout, path)?,
        FileFormat::Csv => write_csv(&layout, path)?,
    }
    info!(path = %path.display(), %format, rows = rows.len(), extent = %layout.extent(), "wrote timesheet");
    Ok(())
}

fn write_xlsx(layout: &SheetLayout, path: &Path) -> Result<()> {
    let err = |e: rust_xlsxwriter::XlsxError| TimesheetError::write(path, e);

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    let header_fmt = Format::new().set_bold().set_border_bottom(FormatBorder::Thin);
    let text_fmt = Format::new();
    let hours_fmt = Format::new().set_align(FormatAlign::Center);
    let total_fmt = Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_border_top(FormatBorder::Medium);

    for col in 0..4 {
        worksheet.set_column_width(col, 18).map_err(err)?;
    }
    for col in [PROJECT_HOURS_COL, INTERNAL_HOURS_COL] {
        worksheet.set_column_width(col, 20).map_err(err)?;
    }

    for (row, col, cell) in layout.cells() {
        let fmt = match (row, cell) {
            (0, _) => &header_fmt,
            (_, Cell::Formula { .. }) => &total_fmt,
            (_, Cell::Number(_)) => &hours_fmt,
            _ => &text_fmt,
        };
        let written = match cell {
            Cell::Text(s) => worksheet.write_string_with_format(row, col, s, fmt),
            Cell::Number(n) => worksheet.write_number_with_format(row, col, *n, fmt),
            Cell::Formula { expr, result } => worksheet.write_formula_with_format(
                row,
                col,
                Formula::new(expr).set_result(result.to_string()),
                fmt,
            ),
        };
        written.map_err(err)?;
    }

    // Anchor the sheet dimension at the far corner of the extent.
    worksheet
        .write_blank(layout.rows - 1, layout.cols - 1, &text_fmt)
        .map_err(err)?;

    workbook.save(path).map_err(err)?;
    Ok(())
}

fn write_csv(layout: &SheetLayout, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| TimesheetError::write(path, e))?;

    for row in 0..layout.rows {
        let record: Vec<String> = (0..layout.cols)
            .map(|col| layout.cell(row, col).map(Cell::to_csv_field).unwrap_or_default())
            .collect();
        writer
            .write_record(&record)
            .map_err(|e| TimesheetError::write(path, e))?;
    }
    writer.flush().map_err(|e| TimesheetError::write(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::resolve;
    use crate::config::Config;
    use crate::rows::build_rows;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn rows_for(year: i32, month: i32) -> Vec<TimesheetRow> {
        let (bounds, weeks) = resolve(year, month).unwrap();
        build_rows(&weeks, &bounds, &Config::default())
    }

    fn formula_at(layout: &SheetLayout, row: u32, col: u16) -> (String, f64) {
        match layout.cell(row, col) {
            Some(Cell::Formula { expr, result }) => (expr.clone(), *result),
            other => panic!("expected formula at ({row}, {col}), got {other:?}"),
        }
    }

    #[test]
    fn header_row_has_fixed_labels() {
        let layout = SheetLayout::new(&rows_for(2021, 2));
        for (col, label) in HEADERS.iter().enumerate() {
            assert_eq!(
                layout.cell(0, col as u16),
                Some(&Cell::Text(label.to_string()))
            );
        }
    }

    #[test]
    fn totals_sum_exactly_the_data_rows() {
        // 4 weeks
        let layout = SheetLayout::new(&rows_for(2021, 2));
        assert_eq!(formula_at(&layout, 10, 4), ("SUM(E2:E5)".to_string(), 160.0));
        assert_eq!(formula_at(&layout, 10, 5), ("SUM(F2:F5)".to_string(), 0.0));

        // 5 weeks
        let layout = SheetLayout::new(&rows_for(2024, 6));
        assert_eq!(formula_at(&layout, 10, 4), ("SUM(E2:E6)".to_string(), 160.0));

        // 6 weeks: Sep 2024 starts on Sunday and ends on Monday
        let layout = SheetLayout::new(&rows_for(2024, 9));
        assert_eq!(formula_at(&layout, 10, 4).0, "SUM(E2:E7)");
    }

    #[test]
    fn data_rows_start_below_header() {
        let layout = SheetLayout::new(&rows_for(2024, 6));
        assert_eq!(layout.cell(1, 0), Some(&Cell::Text("01/06/2024".into())));
        assert_eq!(layout.cell(1, 4), Some(&Cell::Number(0.0)));
        assert_eq!(layout.cell(5, 1), Some(&Cell::Text("30/06/2024".into())));
        assert_eq!(layout.cell(6, 0), None);
    }

    #[test]
    fn extent_is_twelve_by_twelve() {
        assert_eq!(SheetLayout::new(&rows_for(2024, 6)).extent(), "A1:L12");
    }

    #[test]
    fn csv_covers_the_extent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write(&rows_for(2021, 2), &path, FileFormat::Csv).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 12);
        assert_eq!(
            lines[0],
            "LOG_DATE_FROM,LOG_DATE_TO,LOG_CLIENT,LOG_ISSUE_NAME,LOG_PROJECT_HOURS,LOG_INTERNAL_HOURS,,,,,,"
        );
        assert_eq!(lines[1], "01/02/2021,07/02/2021,Client,Project,40,0,,,,,,");
        assert_eq!(lines[10], ",,,,=SUM(E2:E5),=SUM(F2:F5),,,,,,");
        assert_eq!(lines[11], ",,,,,,,,,,,");
    }

    #[test]
    fn xlsx_is_a_zip_container() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        write(&rows_for(2024, 6), &path, FileFormat::Xlsx).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn same_input_same_csv_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        write(&rows_for(2023, 7), &a, FileFormat::Csv).unwrap();
        write(&rows_for(2023, 7), &b, FileFormat::Csv).unwrap();
        assert_eq!(fs::read(a).unwrap(), fs::read(b).unwrap());
    }

    #[test]
    fn unwritable_path_is_a_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        for format in [FileFormat::Csv, FileFormat::Xlsx] {
            assert!(matches!(
                write(&rows_for(2024, 6), &path, format),
                Err(TimesheetError::Write { .. })
            ));
        }
    }
}
