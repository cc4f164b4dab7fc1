use crate::api::DocumentItem;
use crate::pagination::PaginationWindow;

const HEADERS: [&str; 4] = ["#", "ID", "Name", "Status"];

/// Plain-text table; `first_ordinal` numbers the first row.
pub fn document_table(items: &[DocumentItem], first_ordinal: u64) -> String {
    if items.is_empty() {
        return "No documents.".to_string();
    }

    let rows: Vec<[String; 4]> = items
        .iter()
        .enumerate()
        .map(|(row, item)| {
            [
                (first_ordinal + row as u64).to_string(),
                item.id.to_string(),
                item.key.clone(),
                item.status.clone(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &HEADERS.map(str::to_string), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(rule.join("  ").as_str());
    out.push('\n');
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out.pop();
    out
}

fn push_row(out: &mut String, cells: &[String; 4], widths: &[usize; 4]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect();
    out.push_str(padded.join("  ").trim_end());
    out.push('\n');
}

pub fn page_footer(window: &PaginationWindow) -> String {
    format!(
        "Page {} of {} ({} documents, {} per page)",
        window.page_index() + 1,
        window.page_count(),
        window.total_items(),
        window.page_size()
    )
}

pub fn document_page(window: &PaginationWindow, items: &[DocumentItem]) -> String {
    format!(
        "{}\n{}",
        document_table(items, window.row_ordinal(0)),
        page_footer(window)
    )
}
