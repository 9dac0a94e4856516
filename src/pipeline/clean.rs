//! Content cleaning: deterministic removal of publisher noise from ACS section bodies.
//!
//! Journal PDFs repeat running headers, submission dates, DOI banners and
//! page-citation footers on every page; the converter drops them straight
//! into the body text. None of it is prose a question could be asked about,
//! so every retained section passes through [`clean_section_content`] before
//! it is re-emitted.
//!
//! ## Rule Order
//!
//! Line rules run first on the raw lines, then blank-line runs left behind by
//! removed lines are collapsed, and placeholder decoding runs last so that a
//! decoded glyph can never make a line match (or stop matching) a rule.

use crate::pipeline::placeholder::decode_placeholders;
use once_cell::sync::Lazy;
use regex::Regex;

/// `DOI:` label followed by a DOI-shaped token. Shared with DOI extraction.
pub(crate) static RE_DOI_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)DOI:\s*(10\.\d{4,}/\S+)").unwrap());

/// Apply all cleaning rules to one section body.
///
/// Rules (applied in order):
/// 1. Drop HTML comment lines (`<!-- image -->` and friends)
/// 2. Drop `Received:` / `Revised:` / `Published:` labels with their value line
/// 3. Drop standalone month-day-year date lines
/// 4. Drop lines carrying a `DOI:` label
/// 5. Drop "Journal Year, Volume, Start-End" citation footers
/// 6. Drop lone `*` lines
/// 7. Collapse 3+ consecutive newlines to one blank line and trim
/// 8. Decode `/uniXXXX` placeholders
pub fn clean_section_content(text: &str) -> String {
    let s = strip_noise_lines(text);
    let s = collapse_blank_lines(&s);
    decode_placeholders(s.trim())
}

// ── Rules 1–6: line filters ──────────────────────────────────────────────────

fn strip_noise_lines(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let mut kept: Vec<&str> = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        let s = line.trim();

        if is_date_label(s) {
            // The value sits on the following line.
            i += 2;
            continue;
        }
        if is_html_comment(s)
            || is_date_line(s)
            || RE_DOI_LINE.is_match(line)
            || is_citation_footer(s)
            || s == "*"
        {
            i += 1;
            continue;
        }

        kept.push(line);
        i += 1;
    }

    kept.join("\n")
}

fn is_html_comment(s: &str) -> bool {
    s.starts_with("<!--") && s.ends_with("-->")
}

fn is_date_label(s: &str) -> bool {
    matches!(
        s.to_lowercase().as_str(),
        "received:" | "revised:" | "published:"
    )
}

static RE_DATE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2},?\s+\d{4}\s*$",
    )
    .unwrap()
});

fn is_date_line(s: &str) -> bool {
    RE_DATE_LINE.is_match(s)
}

static RE_CITATION_FOOTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z\s]+\s+\d{4}\s*,\s*\d+\s*,\s*\d+\s*[-–]\s*\d+\s*$").unwrap()
});

fn is_citation_footer(s: &str) -> bool {
    RE_CITATION_FOOTER.is_match(s)
}

// ── Rule 7: Collapse blank-line runs ─────────────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").into_owned()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html_comment() {
        let input = "Intro text.\n<!-- image -->\nMore text.";
        assert_eq!(clean_section_content(input), "Intro text.\nMore text.");
    }

    #[test]
    fn test_strip_received_label_with_value() {
        let input = "Received:\nMarch 3, 2021\nRevised:\nApril 1, 2021\nBody.";
        assert_eq!(clean_section_content(input), "Body.");
    }

    #[test]
    fn test_label_match_is_case_insensitive() {
        assert!(is_date_label("PUBLISHED:"));
        assert!(!is_date_label("Published: May 2, 2020"));
    }

    #[test]
    fn test_strip_date_line() {
        assert!(is_date_line("September 14, 2022"));
        assert!(is_date_line("june 1 2019"));
        assert!(!is_date_line("In June 2019 we measured"));
    }

    #[test]
    fn test_strip_doi_line() {
        let input = "Body.\nCite This: J. Phys. Chem. DOI: 10.1021/acs.jpcc.2c01234\nMore.";
        assert_eq!(clean_section_content(input), "Body.\nMore.");
    }

    #[test]
    fn test_strip_citation_footer() {
        assert!(is_citation_footer("J Phys Chem Lett 2021, 12, 1034-1042"));
        assert!(is_citation_footer("Chem Mater 2019 , 31 , 10 – 20"));
        assert!(!is_citation_footer("We studied 2021 samples, 12 of them"));
    }

    #[test]
    fn test_strip_lone_asterisk() {
        assert_eq!(clean_section_content("A\n *\nB"), "A\nB");
    }

    #[test]
    fn test_collapse_blank_lines() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_removed_lines_leave_single_blank_line() {
        let input = "Para one.\n\n<!-- image -->\n\nPara two.";
        assert_eq!(clean_section_content(input), "Para one.\n\nPara two.");
    }

    #[test]
    fn test_placeholders_decoded_last() {
        assert_eq!(
            clean_section_content("  The e /uniFB00 ect was large.  "),
            "The e\u{FB00}ect was large."
        );
    }
}
