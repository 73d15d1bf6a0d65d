//! Collates successful per-URL reports into a single Markdown document,
//! in input order, skipping failed URLs.

use common::models::batch::CollateOptions;

/// One successfully crawled URL, ready to be folded into a collated
/// report.
pub struct CollatedEntry<'a> {
    pub url: &'a str,
    pub markdown: &'a str,
}

#[must_use]
pub fn collate(options: &CollateOptions, entries: &[CollatedEntry<'_>]) -> String {
    let mut out = String::new();

    let title = options.title.as_deref().unwrap_or("Batch Crawl Report");
    out.push_str(&format!("# {title}\n\n"));

    if options.add_toc {
        out.push_str("## Table of Contents\n\n");
        for (i, entry) in entries.iter().enumerate() {
            out.push_str(&format!("{}. [{}](#section-{i})\n", i + 1, entry.url));
        }
        out.push('\n');
    }

    for (i, entry) in entries.iter().enumerate() {
        if options.add_source_headers {
            out.push_str(&format!("<a id=\"section-{i}\"></a>\n## Source: {}\n\n", entry.url));
        }
        out.push_str(entry.markdown);
        if !entry.markdown.ends_with('\n') {
            out.push('\n');
        }
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collate_concatenates_in_input_order() {
        let options = CollateOptions::default();
        let entries = vec![
            CollatedEntry { url: "https://a.example", markdown: "A body" },
            CollatedEntry { url: "https://b.example", markdown: "B body" },
        ];
        let out = collate(&options, &entries);
        assert!(out.find("A body").unwrap() < out.find("B body").unwrap());
    }

    #[test]
    fn toc_and_source_headers_are_opt_in() {
        let options = CollateOptions {
            title: Some("My Batch".to_string()),
            add_toc: true,
            add_source_headers: true,
        };
        let entries = vec![CollatedEntry { url: "https://a.example", markdown: "body" }];
        let out = collate(&options, &entries);
        assert!(out.contains("My Batch"));
        assert!(out.contains("Table of Contents"));
        assert!(out.contains("Source: https://a.example"));
    }

    #[test]
    fn default_options_skip_toc_and_headers() {
        let options = CollateOptions::default();
        let entries = vec![CollatedEntry { url: "https://a.example", markdown: "body" }];
        let out = collate(&options, &entries);
        assert!(!out.contains("Table of Contents"));
        assert!(!out.contains("Source:"));
    }
}
