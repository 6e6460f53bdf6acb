//! XLSX and XLS workbooks via calamine, rendered as aligned text tables.

use std::io::{Cursor, Read, Seek};

use calamine::{Data, Range, Reader, Xls, Xlsx};
use tracing::debug;

use notechat_core::{Error, Result};

pub fn extract_xlsx(bytes: &[u8]) -> Result<String> {
    let workbook: Xlsx<_> =
        Xlsx::new(Cursor::new(bytes)).map_err(|e| Error::extraction("xlsx", e))?;
    render_workbook(workbook, "xlsx")
}

pub fn extract_xls(bytes: &[u8]) -> Result<String> {
    let workbook: Xls<_> = Xls::new(Cursor::new(bytes)).map_err(|e| Error::extraction("xls", e))?;
    render_workbook(workbook, "xls")
}

/// Each sheet with content becomes a `--- Sheet: <name> ---` header followed
/// by its table. Parts are separated by blank lines.
fn render_workbook<RS, R>(mut workbook: R, file_type: &str) -> Result<String>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: std::fmt::Display,
{
    let mut parts = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| Error::extraction(file_type, e))?;
        match render_table(&range) {
            Some(table) => {
                parts.push(format!("--- Sheet: {} ---", name));
                parts.push(table);
            }
            None => debug!("Sheet {:?} is empty, skipping", name),
        }
    }
    Ok(parts.join("\n\n"))
}

/// Columns padded to their widest cell, two spaces apart. `None` when the
/// sheet holds no non-empty cell.
fn render_table(range: &Range<Data>) -> Option<String> {
    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .filter(|cells: &Vec<String>| cells.iter().any(|c| !c.is_empty()))
        .collect();
    if rows.is_empty() {
        return None;
    }

    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let lines: Vec<String> = rows
        .iter()
        .map(|row| {
            let mut line = String::new();
            for (i, cell) in row.iter().enumerate() {
                if i > 0 {
                    line.push_str("  ");
                }
                line.push_str(cell);
                let pad = widths[i] - cell.chars().count();
                line.extend(std::iter::repeat(' ').take(pad));
            }
            line.trim_end().to_string()
        })
        .collect();
    Some(lines.join("\n"))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}
