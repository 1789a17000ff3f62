use codebook_extract::{extract_elements, trim_pages, ElementKind, PageRange};
use scraper::Html;
use std::env;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: debug_elements <codebook.html> [start-end]");
        std::process::exit(1);
    }

    let default = PageRange::default();
    let range = match args.get(2).and_then(|r| r.split_once('-')) {
        Some((a, b)) => PageRange {
            start: a.parse().unwrap_or(default.start),
            end: b.parse().unwrap_or(default.end),
        },
        None => default,
    };

    let html = std::fs::read_to_string(&args[1]).expect("Failed to read input");
    let document = Html::parse_document(&html);
    let boxes = trim_pages(&document, range).expect("Failed to trim pages");
    let elements = extract_elements(&boxes).expect("Failed to extract elements");

    println!(
        "=== PAGES {}-{} ({} elements) ===",
        range.start,
        range.end,
        elements.len()
    );
    for e in &elements {
        match e.kind {
            ElementKind::Divider => println!("  ---------- divider top={} ----------", e.top),
            ElementKind::Text => println!(
                "  x={:4} y={:6} w={:4} h={:4} text={:?}",
                e.left, e.top, e.width, e.height, e.text
            ),
        }
    }
}
