// src/services/tables.rs

//! Bulletin PDF table extraction.
//!
//! The municipality table on the first page is printed as side-by-side
//! fragments, each opened by a `市町村` header. Words are extracted with their
//! page positions, grouped into lines and cells, and each cell is assigned to
//! the fragment whose header column it falls under.

use std::time::Duration;

use pdfplumber::{Pdf, WordOptions};
use reqwest::Client;
use unicode_normalization::UnicodeNormalization;

use crate::error::{AppError, Result};
use crate::models::{BulletinLink, CaseRow, CaseTable, SiteConfig, TableConfig};
use crate::utils::http::fetch_bytes;
use crate::utils::resolve_url;

/// Words whose tops differ by at most this many points share a line.
const LINE_TOLERANCE: f64 = 3.0;

/// Adjacent words closer than this many points form one cell.
const CELL_GAP: f64 = 4.0;

/// Slack when comparing a cell's left edge with a header column.
const COLUMN_TOLERANCE: f64 = 5.0;

/// Lines starting with these are footnotes under the table.
const NOTE_MARKERS: [&str; 3] = ["※", "注", "*"];

/// A word and its position, in points from the page's top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedWord {
    pub text: String,
    pub x0: f64,
    pub x1: f64,
    pub top: f64,
}

/// Service for turning bulletin PDFs into case tables.
pub struct TableExtractor {
    client: Client,
    base_url: String,
    config: TableConfig,
    delay: Duration,
}

impl TableExtractor {
    pub fn new(site: &SiteConfig, config: &TableConfig, client: Client) -> Self {
        Self {
            client,
            base_url: site.base_url.clone(),
            config: config.clone(),
            delay: Duration::from_millis(site.request_delay_ms),
        }
    }

    /// Download the bulletin PDF and parse its case table.
    ///
    /// Sleeps for the configured delay afterwards to go easy on the host.
    pub async fn extract(&self, link: &BulletinLink) -> Result<CaseTable> {
        let url = resolve_url(&self.base_url, &link.href)?;
        log::info!("Downloading bulletin PDF {}", url);

        let bytes = fetch_bytes(&self.client, url.as_str()).await?;
        let words = extract_page_words(&bytes, self.config.page)?;
        let table = parse_case_table(&words, &self.config, link.identifier())?;

        log::info!(
            "Extracted {} municipalities from {} (total {})",
            table.rows().len() - 1,
            link.identifier(),
            table.total().count
        );

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        Ok(table)
    }
}

/// Extract the positioned words of one 1-based page of a PDF.
///
/// Word text is NFKC-normalized so full-width digits parse as counts.
pub fn extract_page_words(bytes: &[u8], page: u32) -> Result<Vec<PlacedWord>> {
    let index = page
        .checked_sub(1)
        .ok_or_else(|| AppError::validation("table.page is 1-based"))?;

    let pdf = Pdf::open(bytes, None).map_err(|e| AppError::Pdf(format!("{e:?}")))?;
    let page = pdf
        .page(index as usize)
        .map_err(|e| AppError::Pdf(format!("page {page}: {e:?}")))?;

    Ok(page
        .extract_words(&WordOptions::default())
        .into_iter()
        .map(|word| PlacedWord {
            text: word.text.nfkc().collect(),
            x0: word.bbox.x0,
            x1: word.bbox.x1,
            top: word.bbox.top,
        })
        .collect())
}

/// Parse positioned words into a case table with a totals row.
pub fn parse_case_table(
    words: &[PlacedWord],
    config: &TableConfig,
    context: &str,
) -> Result<CaseTable> {
    let fragments = parse_fragments(words, &config.name_header, context)?;

    if fragments.len() != config.fragments {
        return Err(AppError::table(
            context,
            format!(
                "expected {} table fragments, found {}",
                config.fragments,
                fragments.len()
            ),
        ));
    }

    let rows: Vec<CaseRow> = fragments
        .into_iter()
        .flatten()
        .filter(|row| {
            if row.municipality == config.total_label {
                log::debug!("Skipping printed totals row in {}", context);
                false
            } else {
                true
            }
        })
        .collect();

    if rows.is_empty() {
        return Err(AppError::table(context, "no municipality rows found"));
    }

    CaseTable::with_total(rows, &config.total_label).map_err(|e| AppError::table(context, e))
}

#[derive(Debug)]
struct Cell {
    text: String,
    x0: f64,
    x1: f64,
}

/// Split the page into table fragments in reading order.
///
/// Every cell matching `name_header` opens a fragment at its x position.
/// Headers on one line sit side by side; a later header line starts a new
/// set of fragments below. Each fragment row must be a name followed by a
/// count.
pub fn parse_fragments(
    words: &[PlacedWord],
    name_header: &str,
    context: &str,
) -> Result<Vec<Vec<CaseRow>>> {
    let name_header: String = name_header.nfkc().collect();
    let mut fragments: Vec<Vec<CaseRow>> = Vec::new();
    let mut columns: Vec<f64> = Vec::new();
    let mut base = 0;

    for line in group_lines(words) {
        let headers: Vec<f64> = line
            .iter()
            .filter(|cell| cell.text == name_header)
            .map(|cell| cell.x0)
            .collect();
        if !headers.is_empty() {
            base = fragments.len();
            fragments.resize_with(base + headers.len(), Vec::new);
            columns = headers;
            continue;
        }

        // Preamble before the first header
        if columns.is_empty() {
            continue;
        }

        if line
            .first()
            .is_some_and(|cell| NOTE_MARKERS.iter().any(|m| cell.text.starts_with(m)))
        {
            log::debug!("Skipping footnote in {}", context);
            continue;
        }

        let mut slots: Vec<Vec<&Cell>> = vec![Vec::new(); columns.len()];
        for cell in &line {
            slots[column_of(&columns, cell.x0)].push(cell);
        }

        for (slot, cells) in slots.iter().enumerate() {
            match cells.as_slice() {
                [] => {}
                [name, count] if parse_count(&name.text).is_none() => {
                    let count = parse_count(&count.text).ok_or_else(|| {
                        AppError::table(
                            context,
                            format!("count for {} is not a number: '{}'", name.text, count.text),
                        )
                    })?;
                    fragments[base + slot].push(CaseRow {
                        municipality: name.text.clone(),
                        count,
                    });
                }
                other => {
                    let texts: Vec<&str> = other.iter().map(|c| c.text.as_str()).collect();
                    return Err(AppError::table(
                        context,
                        format!(
                            "fragment {} row is not a name and a count: [{}]",
                            base + slot + 1,
                            texts.join(", ")
                        ),
                    ));
                }
            }
        }
    }

    Ok(fragments)
}

/// Group words into lines top to bottom, and each line into cells.
fn group_lines(words: &[PlacedWord]) -> Vec<Vec<Cell>> {
    let mut sorted: Vec<&PlacedWord> = words.iter().filter(|w| !w.text.trim().is_empty()).collect();
    sorted.sort_by(|a, b| a.top.total_cmp(&b.top).then(a.x0.total_cmp(&b.x0)));

    let mut lines: Vec<(f64, Vec<&PlacedWord>)> = Vec::new();
    for word in sorted {
        match lines.last_mut() {
            Some((top, line)) if (word.top - *top).abs() <= LINE_TOLERANCE => line.push(word),
            _ => lines.push((word.top, vec![word])),
        }
    }

    lines
        .into_iter()
        .map(|(_, mut line)| {
            line.sort_by(|a, b| a.x0.total_cmp(&b.x0));
            let mut cells: Vec<Cell> = Vec::new();
            for word in line {
                match cells.last_mut() {
                    Some(cell) if word.x0 - cell.x1 <= CELL_GAP => {
                        cell.text.push_str(word.text.trim());
                        cell.x1 = cell.x1.max(word.x1);
                    }
                    _ => cells.push(Cell {
                        text: word.text.trim().to_string(),
                        x0: word.x0,
                        x1: word.x1,
                    }),
                }
            }
            cells
        })
        .collect()
}

/// Index of the rightmost header column starting at or left of `x`.
fn column_of(columns: &[f64], x: f64) -> usize {
    columns
        .iter()
        .rposition(|&start| start <= x + COLUMN_TOLERANCE)
        .unwrap_or(0)
}

/// Parse `1,234` style counts.
fn parse_count(token: &str) -> Option<u64> {
    let digits: String = token.chars().filter(|c| *c != ',').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Document, Object, Stream, dictionary};

    fn config() -> TableConfig {
        TableConfig::default()
    }

    fn word(text: &str, x0: f64, top: f64) -> PlacedWord {
        PlacedWord {
            text: text.to_string(),
            x0,
            x1: x0 + 10.0 * text.chars().count() as f64,
            top,
        }
    }

    fn line(top: f64, cells: &[(&str, f64)]) -> Vec<PlacedWord> {
        cells.iter().map(|(text, x)| word(text, *x, top)).collect()
    }

    /// Two fragments: names at x=50 and x=300, counts at x=150 and x=400.
    fn side_by_side(rows: Vec<Vec<PlacedWord>>) -> Vec<PlacedWord> {
        let mut words = vec![
            word("新型コロナウイルス感染症", 50.0, 40.0),
            word("市町村", 50.0, 100.0),
            word("感染者数", 150.0, 100.0),
            word("市町村", 300.0, 100.0),
            word("感染者数", 400.0, 100.0),
        ];
        words.extend(rows.into_iter().flatten());
        words
    }

    fn names(table: &CaseTable) -> Vec<&str> {
        table.rows().iter().map(|r| r.municipality.as_str()).collect()
    }

    #[test]
    fn test_side_by_side_fragments_concatenate_in_order() {
        let words = side_by_side(vec![
            line(120.0, &[("奈良市", 50.0), ("1,234", 150.0), ("天理市", 300.0), ("56", 400.0)]),
            line(140.0, &[("大和高田市", 50.0), ("78", 150.0), ("調査中・非公表", 300.0), ("9", 400.0)]),
            line(160.0, &[("橿原市", 50.0), ("10", 150.0)]),
        ]);

        let table = parse_case_table(&words, &config(), "R40105.pdf").unwrap();
        assert_eq!(
            names(&table),
            vec!["奈良市", "大和高田市", "橿原市", "天理市", "調査中・非公表", "合計"]
        );
        assert_eq!(table.get("奈良市"), Some(1234));
        assert_eq!(table.total().count, 1234 + 78 + 10 + 56 + 9);
    }

    #[test]
    fn test_row_assigned_by_column_not_line_position() {
        // The right fragment runs one row longer than the left one
        let words = side_by_side(vec![
            line(120.0, &[("奈良市", 50.0), ("5", 150.0), ("天理市", 300.0), ("3", 400.0)]),
            line(140.0, &[("橿原市", 300.0), ("7", 400.0)]),
        ]);

        let fragments = parse_fragments(&words, "市町村", "x").unwrap();
        let left: Vec<&str> = fragments[0].iter().map(|r| r.municipality.as_str()).collect();
        let right: Vec<&str> = fragments[1].iter().map(|r| r.municipality.as_str()).collect();

        assert_eq!(left, vec!["奈良市"]);
        assert_eq!(right, vec!["天理市", "橿原市"]);
    }

    #[test]
    fn test_stacked_fragments() {
        let words = vec![
            word("市町村", 50.0, 100.0),
            word("感染者数", 150.0, 100.0),
            word("奈良市", 50.0, 120.0),
            word("12", 150.0, 120.0),
            word("市町村", 50.0, 300.0),
            word("感染者数", 150.0, 300.0),
            word("天理市", 50.0, 320.0),
            word("3", 150.0, 320.0),
        ];

        let table = parse_case_table(&words, &config(), "x").unwrap();
        assert_eq!(names(&table), vec!["奈良市", "天理市", "合計"]);
    }

    #[test]
    fn test_split_glyph_words_merge_into_cells() {
        let mut words = side_by_side(vec![line(120.0, &[("3", 400.0)])]);
        // 奈良市 extracted one glyph at a time, touching each other
        words.push(word("奈", 50.0, 121.0));
        words.push(word("良", 60.0, 120.5));
        words.push(word("市", 70.0, 120.0));
        words.push(word("5", 150.0, 120.0));
        words.push(word("天理市", 300.0, 120.0));

        let table = parse_case_table(&words, &config(), "x").unwrap();
        assert_eq!(names(&table), vec!["奈良市", "天理市", "合計"]);
    }

    #[test]
    fn test_non_numeric_count_is_fatal() {
        let words = side_by_side(vec![line(120.0, &[("奈良市", 50.0), ("-", 150.0), ("天理市", 300.0), ("3", 400.0)])]);

        match parse_case_table(&words, &config(), "R40105.pdf") {
            Err(AppError::Table { context, message }) => {
                assert_eq!(context, "R40105.pdf");
                assert!(message.contains("奈良市"));
            }
            other => panic!("expected table error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_count_is_fatal() {
        let words = side_by_side(vec![line(120.0, &[("奈良市", 50.0), ("天理市", 300.0), ("3", 400.0)])]);
        let result = parse_case_table(&words, &config(), "x");
        assert!(matches!(result, Err(AppError::Table { .. })));
    }

    #[test]
    fn test_full_width_digits_normalized() {
        let words: Vec<PlacedWord> = side_by_side(vec![line(
            120.0,
            &[("奈良市", 50.0), ("１２", 150.0), ("天理市", 300.0), ("３", 400.0)],
        )])
        .into_iter()
        .map(|w| PlacedWord {
            text: w.text.nfkc().collect(),
            ..w
        })
        .collect();

        let table = parse_case_table(&words, &config(), "x").unwrap();
        assert_eq!(table.get("奈良市"), Some(12));
        assert_eq!(table.get("天理市"), Some(3));
    }

    #[test]
    fn test_printed_total_and_footnote_skipped() {
        let mut words = side_by_side(vec![
            line(120.0, &[("奈良市", 50.0), ("5", 150.0), ("天理市", 300.0), ("3", 400.0)]),
            line(140.0, &[("合計", 300.0), ("999", 400.0)]),
        ]);
        words.push(word("※居住地別", 50.0, 200.0));

        let table = parse_case_table(&words, &config(), "x").unwrap();
        assert_eq!(names(&table), vec!["奈良市", "天理市", "合計"]);
        assert_eq!(table.total().count, 8);
    }

    #[test]
    fn test_wrong_fragment_count() {
        let words = vec![
            word("市町村", 50.0, 100.0),
            word("感染者数", 150.0, 100.0),
            word("奈良市", 50.0, 120.0),
            word("5", 150.0, 120.0),
        ];
        let result = parse_case_table(&words, &config(), "x");
        assert!(matches!(result, Err(AppError::Table { .. })));
    }

    #[test]
    fn test_no_rows() {
        let result = parse_case_table(&side_by_side(vec![]), &config(), "x");
        assert!(matches!(result, Err(AppError::Table { .. })));
    }

    #[test]
    fn test_duplicate_rows_rejected() {
        let words = side_by_side(vec![line(120.0, &[("奈良市", 50.0), ("5", 150.0), ("奈良市", 300.0), ("3", 400.0)])]);
        let result = parse_case_table(&words, &config(), "x");
        assert!(matches!(result, Err(AppError::Table { .. })));
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("1,234"), Some(1234));
        assert_eq!(parse_count("0"), Some(0));
        assert_eq!(parse_count(","), None);
        assert_eq!(parse_count("奈良市"), None);
        assert_eq!(parse_count("-3"), None);
    }

    #[test]
    fn test_invalid_pdf_bytes() {
        let result = extract_page_words(b"not a pdf", 1);
        assert!(matches!(result, Err(AppError::Pdf(_))));
    }

    /// One-page PDF with Courier text placed at `(x, y)` in PDF user space.
    fn fixture_pdf(cells: &[(&str, i64, i64)]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "FirstChar" => 32,
            "LastChar" => 126,
            "Widths" => (32..=126).map(|_| Object::Integer(600)).collect::<Vec<_>>(),
        });

        let mut operations = Vec::new();
        for (text, x, y) in cells {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 10.into()]));
            operations.push(Operation::new("Td", vec![(*x).into(), (*y).into()]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_pdf_fixture_two_fragments() {
        let bytes = fixture_pdf(&[
            ("Cases by city", 50, 780),
            ("City", 50, 700),
            ("Count", 150, 700),
            ("City", 300, 700),
            ("Count", 400, 700),
            ("Nara", 50, 680),
            ("1,234", 150, 680),
            ("Tenri", 300, 680),
            ("56", 400, 680),
            ("Takada", 50, 660),
            ("78", 150, 660),
            ("Gose", 300, 660),
            ("9", 400, 660),
            ("Kashihara", 300, 640),
            ("10", 400, 640),
        ]);
        let config = TableConfig {
            name_header: "City".to_string(),
            total_label: "Total".to_string(),
            ..TableConfig::default()
        };

        let words = extract_page_words(&bytes, 1).unwrap();
        let table = parse_case_table(&words, &config, "fixture.pdf").unwrap();

        assert_eq!(
            names(&table),
            vec!["Nara", "Takada", "Tenri", "Gose", "Kashihara", "Total"]
        );
        assert_eq!(table.get("Nara"), Some(1234));
        assert_eq!(table.total().count, 1234 + 78 + 56 + 9 + 10);
    }

    #[test]
    fn test_pdf_fixture_page_out_of_range() {
        let bytes = fixture_pdf(&[("City", 50, 700)]);
        assert!(matches!(extract_page_words(&bytes, 2), Err(AppError::Pdf(_))));
        assert!(matches!(
            extract_page_words(&bytes, 0),
            Err(AppError::Validation(_))
        ));
    }
}
