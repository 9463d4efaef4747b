//! Column-aligned plain-text tables.

/// Render rows under a header, columns padded to their widest cell.
pub fn render(header: &[&str], rows: &[Vec<String>]) -> String {
    let columns = header.len();
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (idx, cell) in row.iter().take(columns).enumerate() {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    render_line(&mut out, header.iter().map(|h| *h), &widths);
    for row in rows {
        render_line(&mut out, row.iter().map(String::as_str), &widths);
    }
    out
}

fn render_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let mut line = String::new();
    for (idx, cell) in cells.enumerate() {
        line.push_str(cell);
        if idx + 1 < widths.len() {
            let pad = widths[idx].saturating_sub(cell.chars().count()) + 2;
            line.extend(std::iter::repeat_n(' ', pad));
        }
    }
    out.push_str(line.trim_end());
    out.push('\n');
}
