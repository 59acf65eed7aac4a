use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

static TABLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table").expect("static table selector"));
static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr").expect("static row selector"));

const MAX_COLSPAN: usize = 64;

/// Text grid of one `<table>`: header rows (outermost first) and data rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlTable {
    pub id: Option<String>,
    pub header_rows: Vec<Vec<String>>,
    pub rows: Vec<Vec<String>>,
}

impl HtmlTable {
    /// Leaf column names. Grouped headers are flattened to their second level.
    pub fn headers(&self) -> Vec<String> {
        self.header_rows
            .get(1)
            .or_else(|| self.header_rows.first())
            .cloned()
            .unwrap_or_default()
    }

    pub fn has_columns(&self, names: &[&str]) -> bool {
        let headers = self.headers();
        names.iter().all(|name| headers.iter().any(|h| h == name))
    }
}

/// Every table in the document, in document order.
pub fn parse_tables(html: &str) -> Vec<HtmlTable> {
    let document = Html::parse_document(html);
    document.select(&TABLE_SELECTOR).map(read_table).collect()
}

fn read_table(table: ElementRef<'_>) -> HtmlTable {
    let mut out = HtmlTable {
        id: table.value().attr("id").map(|s| s.to_string()),
        ..HtmlTable::default()
    };
    let has_thead = table
        .children()
        .filter_map(ElementRef::wrap)
        .any(|el| el.value().name() == "thead");

    for row in table.select(&ROW_SELECTOR) {
        if !owned_by(row, table) {
            continue;
        }
        // Mid-body header repeats on long tables.
        if row.value().classes().any(|c| c == "thead") {
            continue;
        }
        let section = row
            .parent()
            .and_then(ElementRef::wrap)
            .map(|p| p.value().name().to_string())
            .unwrap_or_default();
        let (cells, all_th) = read_cells(row);
        if cells.is_empty() {
            continue;
        }

        let is_header = match section.as_str() {
            "thead" => true,
            _ => !has_thead && out.rows.is_empty() && all_th,
        };
        if is_header {
            out.header_rows.push(cells);
        } else {
            out.rows.push(cells);
        }
    }

    let width = out.headers().len();
    if width > 0 {
        for row in &mut out.rows {
            row.resize(width, String::new());
        }
    }
    out
}

// Rows of a table nested inside a cell belong to that inner table.
fn owned_by(row: ElementRef<'_>, table: ElementRef<'_>) -> bool {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "table")
        .is_some_and(|owner| owner.id() == table.id())
}

fn read_cells(row: ElementRef<'_>) -> (Vec<String>, bool) {
    let mut cells = Vec::new();
    let mut all_th = true;
    for cell in row.children().filter_map(ElementRef::wrap) {
        let name = cell.value().name();
        if name != "th" && name != "td" {
            continue;
        }
        all_th &= name == "th";
        let text = normalize_ws(&cell.text().collect::<String>());
        let span = cell
            .value()
            .attr("colspan")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(1)
            .clamp(1, MAX_COLSPAN);
        for _ in 0..span {
            cells.push(text.clone());
        }
    }
    (cells, all_th)
}

fn normalize_ws(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
