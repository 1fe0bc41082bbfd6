use pubmed_crawl::parse::{
    is_field_start, join_lines, normalize_value, page_text, parse_page, parse_segment,
    split_segments,
};
use pubmed_crawl::ParseError;

const SAMPLE_PAGE: &str = "Search results for Doe, Jane
Save citations to file
PMID- 15372042
OWN - NLM
STAT- MEDLINE
TI  - Pre- and post-operative outcomes of a study whose title
      wraps onto a second line.
FAU - Doe, Jane
AU  - Doe J
AD  - Department of Biology, University of Oxford, Oxford, UK.
FAU - Smith, John
AU  - Smith J
LA  - eng
";

#[test]
fn test_sample_page_yields_one_record() {
    let page = parse_page(SAMPLE_PAGE);

    assert_eq!(page.segments, 1);
    assert!(page.rejected.is_empty());
    assert_eq!(page.records.len(), 1);

    let record = &page.records[0];
    assert_eq!(record.get("PMID").unwrap(), ["15372042"]);
    assert_eq!(record.authors().len(), 2);
    assert_eq!(record.get("Doe, Jane_AD").unwrap().len(), 1);
    assert_eq!(
        record.affiliations_of("Doe, Jane"),
        ["Department of Biology, University of Oxford, Oxford, UK."]
    );
    assert!(record.affiliations_of("Smith, John").is_empty());
}

#[test]
fn test_continuation_lines_join_and_separator_splits_once() {
    let record = parse_segment(
        "PMID- 1\nTI  - Pre- and post-test - results of a\n      long trial.\nFAU - Doe, Jane",
    )
    .unwrap();

    assert_eq!(
        record.get("TI").unwrap(),
        ["Pre- and post-test - results of a long trial."]
    );
}

#[test]
fn test_repeated_codes_accumulate_in_order() {
    let record = parse_segment(
        "PMID- 7\nFAU - Alpha, A\nAD  - First lab.\nAD  - Second lab.\nFAU - Beta, B\nAD  - First lab.\nMH  - Humans\nMH  - Mice",
    )
    .unwrap();

    assert_eq!(record.authors(), ["Alpha, A", "Beta, B"]);
    assert_eq!(record.get("AD").unwrap(), ["First lab.", "Second lab.", "First lab."]);
    assert_eq!(record.affiliations_of("Alpha, A"), ["First lab.", "Second lab."]);
    assert_eq!(record.affiliations_of("Beta, B"), ["First lab."]);
    assert_eq!(record.get("MH").unwrap(), ["Humans", "Mice"]);
}

#[test]
fn test_carriage_returns_and_wrap_gaps_are_normalized() {
    let record = parse_segment(
        "PMID- 9\r\nAB  - An abstract that\r\n      continues       here.\r\nFAU - Doe, Jane\r\n",
    )
    .unwrap();

    assert_eq!(record.get("AB").unwrap(), ["An abstract that continues here."]);
    assert_eq!(record.authors(), ["Doe, Jane"]);
    assert_eq!(normalize_value("  a\r  b   c "), "a b c");
}

#[test]
fn test_indented_code_like_text_is_a_continuation() {
    let fields = join_lines("PMID- 3\nAB  - Results were\n      ABC - not a new field.").unwrap();

    assert_eq!(fields.len(), 2);
    assert_eq!(fields[1].code, "AB");
    assert_eq!(fields[1].value, "Results were ABC - not a new field.");
}

#[test]
fn test_continuation_only_segment_is_malformed() {
    let result = join_lines("      no field code here\n      nor here");

    assert_eq!(
        result,
        Err(ParseError::MalformedSegment {
            line: 1,
            text: "no field code here".to_string(),
        })
    );
    assert!(matches!(
        parse_segment("   stray text"),
        Err(ParseError::MalformedSegment { .. })
    ));
}

#[test]
fn test_field_start_requires_two_to_six_capitals() {
    assert!(is_field_start("PMID- 1"));
    assert!(is_field_start("AU  - Doe J"));
    assert!(is_field_start("STAT- MEDLINE"));
    assert!(!is_field_start("A   - too short"));
    assert!(!is_field_start("TOOLONGX - eight letters"));
    assert!(!is_field_start("      AB  - indented"));
    assert!(!is_field_start("Ti  - lowercase"));
}

#[test]
fn test_blank_lines_are_ignored() {
    let fields = join_lines("\n\nPMID- 5\n\nFAU - Doe, Jane\n\n").unwrap();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].code, "PMID");
    assert_eq!(fields[0].value, "5");
}

#[test]
fn test_affiliation_before_author_rejects_record() {
    let result = parse_segment("PMID- 11\nAD  - Nowhere Institute.\nFAU - Doe, Jane");

    assert_eq!(
        result,
        Err(ParseError::OrphanAffiliation {
            pmid: "11".to_string()
        })
    );
}

#[test]
fn test_record_without_authors_is_rejected() {
    let result = parse_segment("PMID- 12\nTI  - Consortium paper\nCN  - Some Consortium");

    assert_eq!(
        result,
        Err(ParseError::MissingRequiredField {
            pmid: "12".to_string(),
            field: "FAU",
        })
    );
}

#[test]
fn test_bad_segment_does_not_spoil_the_page() {
    let text = "PMID- 1\nFAU - Doe, Jane\nPMID- 2\nAD  - Orphaned.\nFAU - Doe, Jane\nPMID- 3\nTI  - No authors\nPMID- 4\nFAU - Doe, Jane\n";
    let page = parse_page(text);

    assert_eq!(page.segments, 4);
    assert_eq!(page.records.len(), 2);
    assert_eq!(page.rejected.len(), 2);
    assert_eq!(page.records[0].pmid(), Some("1"));
    assert_eq!(page.records[1].pmid(), Some("4"));
    assert_eq!(page.rejected[0].kind(), "orphan_affiliation");
    assert_eq!(page.rejected[1].kind(), "missing_required_field");
}

#[test]
fn test_page_without_records_is_empty_not_an_error() {
    let page = parse_page("No results were found.");
    assert_eq!(page.segments, 0);
    assert!(page.records.is_empty());
    assert!(page.rejected.is_empty());
}

#[test]
fn test_split_segments_discards_preamble() {
    let segments = split_segments("Search results\nPMID- 1\nTI  - One\nPMID- 2\nTI  - Two\n");
    assert_eq!(segments, vec!["PMID- 1\nTI  - One", "PMID- 2\nTI  - Two"]);
}

#[test]
fn test_split_segments_tolerates_marker_spacing() {
    let segments = split_segments("PMID -  42\nTI  - x\nPMID-7\nTI  - y");
    assert_eq!(segments.len(), 2);
    assert!(segments[1].starts_with("PMID-7"));
}

#[test]
fn test_split_segments_of_concatenated_pages() {
    let pages = [
        ("PMID- 1\nTI  - One\nFAU - Doe, Jane\n", "PMID- 2\nTI  - Two\nPMID- 3\nTI  - Three\n"),
        ("PMID- 10\n", "PMID- 11\nAB  - x\n      y\n"),
        ("PMID- 5\nTI  - a\n\n", "PMID- 6\n"),
    ];

    for (a, b) in pages {
        let joined = format!("{}{}", a, b);
        let mut separate = split_segments(a);
        separate.extend(split_segments(b));
        assert_eq!(split_segments(&joined), separate);
    }
}

#[test]
fn test_page_text_prefers_result_block() {
    let html = r#"<html><head><title>PubMed</title></head><body>
<nav>PMID- 999 navigation noise</nav>
<pre class="search-results-chunks">PMID- 15372042
TI  - Salt &amp; water balance.
FAU - Doe, Jane
</pre>
<footer>Footer text</footer>
</body></html>"#;

    let text = page_text(html);
    assert!(text.starts_with("PMID- 15372042"));
    assert!(text.contains("Salt & water balance."));
    assert!(!text.contains("navigation noise"));
    assert!(!text.contains("Footer text"));

    let page = parse_page(&text);
    assert_eq!(page.records.len(), 1);
    assert_eq!(page.records[0].get("TI").unwrap(), ["Salt & water balance."]);
}

#[test]
fn test_page_text_falls_back_to_whole_document() {
    let html = "<html><body><div>PMID- 8\nFAU - Doe, Jane\n</div></body></html>";
    let page = parse_page(&page_text(html));

    assert_eq!(page.records.len(), 1);
    assert_eq!(page.records[0].pmid(), Some("8"));
}
