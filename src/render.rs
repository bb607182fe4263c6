use crate::model::{BookRecord, SavedBook};
use crate::session::Notice;

/// Cards are laid out across this many columns; card `i` lands in column
/// `i % GRID_COLUMNS`.
pub const GRID_COLUMNS: usize = 3;

/// The three mutually exclusive pages, selected from the sidebar menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Search,
    Saved,
    Scan,
}

impl View {
    const ALL: [View; 3] = [View::Search, View::Saved, View::Scan];

    pub fn path(self) -> &'static str {
        match self {
            View::Search => "/search",
            View::Saved => "/saved",
            View::Scan => "/scan",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            View::Search => "Search Books",
            View::Saved => "Saved Books",
            View::Scan => "Scan Book",
        }
    }
}

/// Minimal HTML escaping for text and attribute values. Everything rendered
/// into a page besides our own markup comes from the upstream catalog or the
/// user and goes through here.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

const STYLE: &str = r#"
    body { background-color: #0f1117; color: white; font-family: sans-serif; margin: 0; display: flex; }
    nav { width: 200px; min-height: 100vh; padding: 20px; background: #161824; }
    nav a { display: block; color: #eeeeee; text-decoration: none; padding: 8px 10px; border-radius: 8px; margin-bottom: 6px; }
    nav a.active { background: #1e1e2f; color: #ffd369; font-weight: bold; }
    main { flex: 1; padding: 24px; }
    h1, h2 { color: #ffd369; }
    .grid { display: flex; gap: 20px; align-items: flex-start; }
    .grid-col { flex: 1; }
    .book-card { background: #1e1e2f; padding: 15px; border-radius: 12px; margin-bottom: 20px; box-shadow: 0px 4px 10px rgba(0,0,0,0.4); }
    .book-title { font-size: 18px; font-weight: bold; color: #ffd369; }
    .book-author { font-size: 14px; color: #eeeeee; }
    .book-desc { font-size: 13px; color: #bbbbbb; }
    .notice { padding: 10px 14px; border-radius: 8px; margin-bottom: 16px; }
    .notice.error { background: #5c1f2b; }
    .notice.warning { background: #5c4a1f; }
    .notice.success { background: #1f5c33; }
    .notice.info { background: #1f3a5c; }
    .empty { color: #bbbbbb; }
    input[type=text] { padding: 8px; border-radius: 8px; border: none; width: 320px; }
    button { padding: 8px 12px; border-radius: 8px; border: none; background: #ffd369; cursor: pointer; }
"#;

fn page(active: View, heading: &str, body: &str) -> String {
    let mut nav = String::new();
    for view in View::ALL {
        let class = if view == active { " class=\"active\"" } else { "" };
        nav.push_str(&format!(
            "<a href=\"{}\"{class}>{}</a>",
            view.path(),
            view.label()
        ));
    }

    format!(
        "<!doctype html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>bookscout</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<nav>{nav}</nav>\n<main>\n<h1>{heading}</h1>\n{body}\n</main>\n</body>\n</html>\n"
    )
}

fn notice_banner(notice: Option<&Notice>) -> String {
    match notice {
        Some(notice) => format!(
            "<p class=\"notice {}\">{}</p>",
            notice.kind(),
            escape_html(notice.text())
        ),
        None => String::new(),
    }
}

/// Distributes pre-rendered cards over the fixed column layout.
fn card_grid(cards: &[String]) -> String {
    let mut columns = vec![String::new(); GRID_COLUMNS];
    for (i, card) in cards.iter().enumerate() {
        columns[i % GRID_COLUMNS].push_str(card);
    }

    let mut out = String::from("<div class=\"grid\">");
    for (col, cards) in columns.iter().enumerate() {
        out.push_str(&format!("<div class=\"grid-col\" data-col=\"{col}\">{cards}</div>"));
    }
    out.push_str("</div>");
    out
}

fn result_card(index: usize, record: &BookRecord) -> String {
    let title = escape_html(&record.title);
    format!(
        "<div class=\"book-card\" data-index=\"{index}\" data-col=\"{col}\">\
<img src=\"{cover}\" width=\"120\" alt=\"cover\">\
<div class=\"book-title\">{title}</div>\
<div class=\"book-author\">{authors}</div>\
<div class=\"book-author\">{publisher} ({date})</div>\
<div class=\"book-author\">Rating: {rating}</div>\
<div class=\"book-desc\">{description}</div>\
<form method=\"post\" action=\"/search/save/{index}\"><button>Save '{title}'</button></form>\
</div>",
        col = index % GRID_COLUMNS,
        cover = escape_html(&record.cover_url),
        authors = escape_html(&record.authors),
        publisher = escape_html(&record.publisher),
        date = escape_html(&record.published_date),
        rating = escape_html(&record.rating),
        description = escape_html(&record.description),
    )
}

fn saved_card(index: usize, book: &SavedBook) -> String {
    let title = escape_html(&book.title);
    format!(
        "<div class=\"book-card\" data-index=\"{index}\" data-col=\"{col}\">\
<img src=\"{cover}\" width=\"120\" alt=\"cover\">\
<div class=\"book-title\">{title}</div>\
<div class=\"book-author\">{authors}</div>\
<div class=\"book-author\">{publisher} ({date})</div>\
<div class=\"book-author\">Rating: {rating}</div>\
<form method=\"post\" action=\"/saved/remove/{index}\"><button>Remove '{title}'</button></form>\
</div>",
        col = index % GRID_COLUMNS,
        cover = escape_html(&book.cover_url),
        authors = escape_html(&book.authors),
        publisher = escape_html(&book.publisher),
        date = escape_html(&book.published_date),
        rating = escape_html(&book.rating),
    )
}

pub fn search_page(
    query: &str,
    searched: bool,
    results: &[BookRecord],
    notice: Option<&Notice>,
) -> String {
    let mut body = notice_banner(notice);
    body.push_str(&format!(
        "<p>Enter a topic or keyword and discover books.</p>\
<form method=\"post\" action=\"/search\">\
<input type=\"text\" name=\"query\" value=\"{}\" placeholder=\"Enter a topic or keyword\">\
<button>Search Books</button>\
</form>",
        escape_html(query)
    ));

    if !results.is_empty() {
        let cards: Vec<_> = results
            .iter()
            .enumerate()
            .map(|(i, record)| result_card(i, record))
            .collect();
        body.push_str("<h2>Recommended Books</h2>");
        body.push_str(&card_grid(&cards));
    } else if searched {
        body.push_str("<p class=\"notice warning\">No books found! Try another keyword.</p>");
    }

    page(View::Search, "Smart Book Recommender", &body)
}

pub fn saved_page(books: &[SavedBook], notice: Option<&Notice>) -> String {
    let mut body = notice_banner(notice);
    if books.is_empty() {
        body.push_str("<p class=\"empty\">You haven't saved any books yet.</p>");
    } else {
        let cards: Vec<_> = books
            .iter()
            .enumerate()
            .map(|(i, book)| saved_card(i, book))
            .collect();
        body.push_str(&card_grid(&cards));
    }

    page(View::Saved, "Your Saved Books", &body)
}

pub fn scan_page(uploaded_file: Option<&str>, notice: Option<&Notice>) -> String {
    let mut body = notice_banner(notice);
    body.push_str(
        "<form method=\"post\" action=\"/scan\" enctype=\"multipart/form-data\">\
<input type=\"file\" name=\"cover\" accept=\".jpg,.jpeg,.png\">\
<button>Upload</button>\
</form>",
    );

    if let Some(file_name) = uploaded_file {
        body.push_str(&format!(
            "<figure>\
<img src=\"/scan/cover\" alt=\"uploaded book cover\" width=\"320\">\
<figcaption>Uploaded Book Cover: {}</figcaption>\
</figure>\
<p class=\"notice info\">Future feature: book details will be detected from the cover. Not implemented yet.</p>",
            escape_html(file_name)
        ));
    }

    page(View::Scan, "Scan a Book", &body)
}
