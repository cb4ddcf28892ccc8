use anime_stats::table::{Page, render_page, render_table};

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[test]
fn render_table_aligns_columns() {
    let headers = strings(&["Source", "Release"]);
    let rows = vec![strings(&["Manga", "1998"]), strings(&["Light novel", "2001"])];

    let rendered = render_table(&headers, &rows);
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(
        lines,
        vec![
            "Source       Release",
            "-----------  -------",
            "Manga        1998",
            "Light novel  2001",
        ]
    );
}

#[test]
fn render_table_marks_empty_results() {
    let headers = strings(&["Release", "Genres", "Popularity"]);
    let rendered = render_table(&headers, &[]);
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[2], "(no rows)");
}

#[test]
fn render_table_normalizes_control_characters() {
    let headers = strings(&["note"]);
    let rows = vec![strings(&["line1\nline2\tvalue"])];

    let rendered = render_table(&headers, &rows);
    assert_eq!(rendered.lines().nth(2), Some("line1 line2 value"));
}

#[test]
fn render_page_shows_requested_slice_and_footer() {
    let headers = strings(&["n"]);
    let rows = (1..=12).map(|n| vec![n.to_string()]).collect::<Vec<_>>();

    let rendered = render_page(&headers, &rows, Page::new(2, 10));
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines[2], "11");
    assert_eq!(lines[3], "12");
    assert_eq!(lines.last(), Some(&"page 2 of 2 (12 rows)"));
}

#[test]
fn render_page_clamps_past_the_end() {
    let headers = strings(&["n"]);
    let rows = vec![strings(&["only"])];

    let rendered = render_page(&headers, &rows, Page::new(5, 10));
    assert!(rendered.contains("only"));
    assert!(rendered.ends_with("page 1 of 1 (1 rows)\n"));
}
