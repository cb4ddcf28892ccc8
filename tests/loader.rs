mod common;

use anime_stats::{
    aired::parse_release_year,
    io_utils,
    loader::{self, LoadError, LoadOptions, UNKNOWN_SENTINEL},
};
use common::{SAMPLE_DATA, TestWorkspace, fixture_path, sample_table};

#[test]
fn sample_drops_unknown_rows_and_keeps_the_rest() {
    let table = sample_table();
    assert_eq!(table.summary().rows_read, 10);
    assert_eq!(table.summary().rows_dropped, 1);
    assert_eq!(table.len(), 9);
    assert!(table.rows().iter().all(|row| row.cells[1] != "Delta"));
}

#[test]
fn no_cleaned_field_is_the_sentinel() {
    let table = sample_table();
    for row in table.rows() {
        assert!(row.cells.iter().all(|cell| cell != UNKNOWN_SENTINEL));
    }
}

#[test]
fn release_matches_the_aired_year_token() {
    let table = sample_table();
    for record in table.records() {
        assert_eq!(Ok(record.release), parse_release_year(&record.aired));
    }
    let releases = table.records().map(|r| r.release).collect::<Vec<_>>();
    assert_eq!(
        releases,
        vec![1998, 1998, 1999, 2000, 2000, 1998, 1998, 2001, 1960]
    );
}

#[test]
fn missing_values_are_filled_with_zero() {
    let table = sample_table();
    let iota = table
        .rows()
        .iter()
        .find(|row| row.cells[1] == "Iota")
        .expect("Iota row");
    assert_eq!(iota.anime.score, 0.0);
    assert_eq!(iota.anime.members, 0.0);
    assert_eq!(iota.anime.favorites, 0.0);
    assert_eq!(iota.cells[2], "0");
    assert_eq!(table.summary().fields_filled, 3);
}

#[test]
fn genres_collapse_to_primary_entry() {
    let table = sample_table();
    let genres = table
        .records()
        .map(|r| r.genre.as_str())
        .collect::<Vec<_>>();
    assert_eq!(genres[0], "Action");
    assert_eq!(genres[2], "Drama");
}

#[test]
fn limit_caps_scanned_rows() {
    let options = LoadOptions {
        limit: Some(3),
        ..LoadOptions::default()
    };
    let table = loader::load_cleaned_table(&fixture_path(SAMPLE_DATA), &options).unwrap();
    assert_eq!(table.summary().rows_read, 3);
    assert_eq!(table.len(), 3);
}

#[test]
fn tab_separated_input_is_detected_by_extension() {
    let workspace = TestWorkspace::new();
    let path = workspace.write(
        "anime.tsv",
        "Genres\tSource\tAired\tScore\tMembers\tFavorites\tPopularity\n\
         Comedy, Drama\tManga\tJan 1, 2005\t7.1\t300\t4\t900\n",
    );
    let table = loader::load_cleaned_table(&path, &LoadOptions::default()).unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.rows()[0].anime.genre, "Comedy");
    assert_eq!(table.rows()[0].anime.release, 2005);
}

#[test]
fn missing_column_aborts_loading() {
    let workspace = TestWorkspace::new();
    let path = workspace.write(
        "anime.csv",
        "Genres,Source,Aired,Score,Members,Favorites\nAction,Manga,\"Jan 1, 2005\",7,1,1\n",
    );
    let err = loader::load_cleaned_table(&path, &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, LoadError::MissingColumn("Popularity")));
}

#[test]
fn aired_without_comma_aborts_loading() {
    let workspace = TestWorkspace::new();
    let path = workspace.write(
        "anime.csv",
        "Genres,Source,Aired,Score,Members,Favorites,Popularity\nAction,Manga,2005,7,1,1,1\n",
    );
    let err = loader::load_cleaned_table(&path, &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, LoadError::Aired { row: 2, .. }));
    assert!(err.to_string().contains("row 2"));
}

#[test]
fn missing_file_is_a_read_error() {
    let workspace = TestWorkspace::new();
    let err = loader::load_cleaned_table(
        &workspace.path().join("absent.csv"),
        &LoadOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, LoadError::Read(_)));
}

#[test]
fn cleaned_table_writes_release_column() {
    let workspace = TestWorkspace::new();
    let table = sample_table();
    let output = workspace.path().join("clean.csv");
    let rows = loader::write_cleaned_table(&table, Some(&output), io_utils::DEFAULT_CSV_DELIMITER)
        .unwrap();
    assert_eq!(rows, 9);

    let mut reader = csv::Reader::from_path(&output).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.iter().last(), Some("Release"));
    let first = reader.records().next().unwrap().unwrap();
    assert_eq!(first.get(3), Some("Action"));
    assert_eq!(first.get(9), Some("1998"));
}
