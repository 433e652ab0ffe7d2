// Dweve Flatrec - Streaming Flat-File Record Parser
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Integration tests for the CSV reader.

use flatrec_csv::{CsvError, FileDecl, Reader};

fn decl(json: &str) -> FileDecl {
    serde_json::from_str(json).unwrap()
}

fn read_all(reader: &mut Reader<&[u8]>) -> Vec<String> {
    let mut out = Vec::new();
    loop {
        match reader.read() {
            Ok(Some(node)) => {
                out.push(reader.tree().subtree_to_string(node));
                reader.release(node);
            }
            Ok(None) => return out,
            Err(err) => panic!("unexpected error: {err}"),
        }
    }
}

#[test]
fn test_weather_data_auto_target() {
    // No is_target anywhere: the first root record is designated.
    let decl = decl(
        r#"{
            "delimiter": ",",
            "records": [
                { "name": "row", "columns": [{ "name": "date" }, { "name": "tempF" }] }
            ]
        }"#,
    );
    let input = "2020-01-01,32\n2020-01-02,35\n";
    let mut reader = Reader::new("weather.csv", input.as_bytes(), &decl, None).unwrap();
    assert_eq!(
        read_all(&mut reader),
        vec![
            "<row><date>2020-01-01</date><tempF>32</tempF></row>",
            "<row><date>2020-01-02</date><tempF>35</tempF></row>",
        ]
    );
}

#[test]
fn test_column_match_routes_rows_to_siblings() {
    // Header rows carry a lone "H"; everything else is data. The short
    // header row still matches `hdr`: index 1 is beyond the row's length
    // and the `rest` column has no regex.
    let decl = decl(
        r#"{
            "delimiter": ",",
            "records": [
                {
                    "name": "hdr", "is_target": true, "min": 0,
                    "columns": [{ "name": "flag", "match": "^H$" }, { "name": "rest" }]
                },
                {
                    "name": "data", "min": 0,
                    "columns": [{ "name": "a" }, { "name": "b" }]
                }
            ]
        }"#,
    );
    let input = "H\nx,1\ny,2\n";
    let mut reader = Reader::new("sections.csv", input.as_bytes(), &decl, None).unwrap();
    let node = reader.read().unwrap().expect("header target");
    assert_eq!(
        reader.tree().subtree_to_string(node),
        "<hdr><flag>H</flag></hdr>"
    );
    reader.release(node);
    // The data rows are absorbed by the non-target sibling and parsing
    // ends cleanly.
    assert_eq!(reader.read().unwrap(), None);
    // Root plus two retained data subtrees (element + 2 columns + 2 texts
    // each).
    assert_eq!(reader.tree().live_nodes(), 11);
}

#[test]
fn test_column_with_regex_beyond_short_row_is_mismatch() {
    let decl = decl(
        r#"{
            "delimiter": ",",
            "records": [
                {
                    "name": "pair", "min": 0,
                    "columns": [{ "name": "a" }, { "name": "b", "match": "^\\d+$" }]
                },
                {
                    "name": "single", "min": 0,
                    "columns": [{ "name": "a" }]
                }
            ]
        }"#,
    );
    // One-cell row: `pair` requires a regex match at index 1, which is
    // beyond the row, so the row lands on `single`. Target auto-designates
    // `pair`, so the emitted stream is empty but the parse succeeds.
    let mut reader = Reader::new("short.csv", "x\n".as_bytes(), &decl, None).unwrap();
    assert_eq!(read_all(&mut reader), Vec::<String>::new());
}

#[test]
fn test_nested_records_with_group_target() {
    let decl = decl(
        r#"{
            "delimiter": ",",
            "records": [
                {
                    "name": "order_group", "type": "record_group", "is_target": true,
                    "min": 0,
                    "child_records": [
                        {
                            "name": "order", "min": 1, "max": 1,
                            "columns": [{ "name": "kind", "match": "^O$" }, { "name": "id" }]
                        },
                        {
                            "name": "line", "min": 0,
                            "columns": [{ "name": "kind", "match": "^L$" }, { "name": "sku" }]
                        }
                    ]
                }
            ]
        }"#,
    );
    let input = "O,1001\nL,apple\nL,pear\nO,1002\n";
    let mut reader = Reader::new("orders.csv", input.as_bytes(), &decl, None).unwrap();
    assert_eq!(
        read_all(&mut reader),
        vec![
            "<order_group>\
                <order><kind>O</kind><id>1001</id></order>\
                <line><kind>L</kind><sku>apple</sku></line>\
                <line><kind>L</kind><sku>pear</sku></line>\
             </order_group>",
            "<order_group>\
                <order><kind>O</kind><id>1002</id></order>\
             </order_group>",
        ]
    );
}

#[test]
fn test_unequal_row_lengths_truncate_columns() {
    let decl = decl(
        r#"{
            "delimiter": ",",
            "records": [
                { "name": "row", "columns": [{ "name": "a" }, { "name": "b" }, { "name": "c" }] }
            ]
        }"#,
    );
    let mut reader = Reader::new("ragged.csv", "1,2\n".as_bytes(), &decl, None).unwrap();
    assert_eq!(
        read_all(&mut reader),
        vec!["<row><a>1</a><b>2</b></row>"]
    );
}

#[test]
fn test_custom_delimiter() {
    let decl = decl(
        r#"{
            "delimiter": "|",
            "records": [
                { "name": "row", "columns": [{ "name": "a" }, { "name": "b" }] }
            ]
        }"#,
    );
    let mut reader = Reader::new("pipes.csv", "1|2\n".as_bytes(), &decl, None).unwrap();
    assert_eq!(read_all(&mut reader), vec!["<row><a>1</a><b>2</b></row>"]);
}

#[test]
fn test_replace_double_quotes() {
    let decl = decl(
        r#"{
            "delimiter": ",",
            "replace_double_quotes": true,
            "records": [
                { "name": "row", "columns": [{ "name": "a" }, { "name": "b" }] }
            ]
        }"#,
    );
    // The stray quote would otherwise start an unterminated quoted field.
    let input = "say \"hi,now\n";
    let mut reader = Reader::new("quotes.csv", input.as_bytes(), &decl, None).unwrap();
    assert_eq!(
        read_all(&mut reader),
        vec!["<row><a>say 'hi</a><b>now</b></row>"]
    );
}

#[test]
fn test_min_occurs_underflow_reports_fqdn_and_line() {
    let decl = decl(
        r#"{
            "delimiter": ",",
            "records": [
                {
                    "name": "P", "is_target": true, "min": 0,
                    "child_records": [
                        {
                            "name": "C", "min": 2, "max": 2,
                            "columns": [{ "name": "kind", "match": "^C$" }]
                        },
                        {
                            "name": "D", "min": 0,
                            "columns": [{ "name": "kind", "match": "^D$" }]
                        }
                    ]
                }
            ]
        }"#,
    );
    let input = "P\nC\nD\n";
    // `P` has no columns, so any row matches it; its children then demand
    // two `C` rows but only one arrives before the `D` sibling.
    let mut reader = Reader::new("under.csv", input.as_bytes(), &decl, None).unwrap();
    let err = reader.read().unwrap_err();
    assert_eq!(
        err,
        CsvError::Invalid(
            "input 'under.csv' line 3: record/record_group 'P/C' needs min occur 2, \
             but only got 1"
                .to_string()
        )
    );
    assert!(!reader.is_continuable_error(&err));
}

#[test]
fn test_unexpected_data_reports_line() {
    let decl = decl(
        r#"{
            "delimiter": ",",
            "records": [
                { "name": "row", "max": 1, "columns": [{ "name": "a" }] }
            ]
        }"#,
    );
    let mut reader = Reader::new("extra.csv", "1\n2\n".as_bytes(), &decl, None).unwrap();
    let node = reader.read().unwrap().expect("first row");
    reader.release(node);
    let err = reader.read().unwrap_err();
    assert_eq!(
        err,
        CsvError::Invalid("input 'extra.csv' line 2: unexpected data".to_string())
    );
}

#[test]
fn test_format_error_is_continuable_with_context() {
    let decl = decl(
        r#"{
            "delimiter": ",",
            "records": [{ "name": "row", "columns": [{ "name": "a" }] }]
        }"#,
    );
    let reader = Reader::new("ctx.csv", "1\n".as_bytes(), &decl, None).unwrap();
    let err = reader.format_error(format_args!("bad value '{}'", "x"));
    assert_eq!(
        err,
        CsvError::Record("input 'ctx.csv' line 1: bad value 'x'".to_string())
    );
    assert!(reader.is_continuable_error(&err));
}

#[test]
fn test_schema_error_from_new() {
    let decl = decl(
        r#"{
            "delimiter": ",,",
            "records": [{ "name": "row" }]
        }"#,
    );
    let err = Reader::new("bad.csv", "".as_bytes(), &decl, None).unwrap_err();
    assert!(matches!(err, CsvError::Schema(_)));
}

#[test]
fn test_release_keeps_arena_bounded() {
    let decl = decl(
        r#"{
            "delimiter": ",",
            "records": [{ "name": "row", "columns": [{ "name": "a" }] }]
        }"#,
    );
    let input = "1\n2\n3\n4\n5\n";
    let mut reader = Reader::new("leak.csv", input.as_bytes(), &decl, None).unwrap();
    while let Some(node) = reader.read().unwrap() {
        reader.release(node);
        // Only the document root stays live between reads.
        assert_eq!(reader.tree().live_nodes(), 1);
    }
}
