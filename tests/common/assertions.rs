//! Domain-specific assertion macros for nomina harnesses.
//!
//! These wrap `pretty_assertions` and name the sheet or row that broke the
//! expectation, so a failing harness points straight at the fixture.

// ---------------------------------------------------------------------------
// Sheet-level assertions
// ---------------------------------------------------------------------------

/// Assert the result set lists exactly these sheet labels, in this order.
///
/// ```rust
/// assert_sheets!(results, ["BASE", "HISTORICO"]);
/// ```
#[macro_export]
macro_rules! assert_sheets {
    ($results:expr, [$($label:expr),* $(,)?]) => {{
        let expected: Vec<String> = vec![$($label.to_string()),*];
        pretty_assertions::assert_eq!(
            $results.labels(),
            expected,
            "assert_sheets! failed: result sheets differ"
        );
    }};
}

/// Assert the matching row positions of one sheet.
///
/// ```rust
/// assert_rows!(results, "BASE", [0, 2]);
/// ```
#[macro_export]
macro_rules! assert_rows {
    ($results:expr, $label:expr, [$($row:expr),* $(,)?]) => {{
        let label: &str = $label;
        let expected: Vec<usize> = vec![$($row),*];
        match $results.get(label) {
            Some(m) => pretty_assertions::assert_eq!(
                m.row_indices().to_vec(),
                expected,
                "assert_rows! failed for sheet {:?}",
                label
            ),
            None => panic!(
                "assert_rows! failed: sheet {:?} not in results.\n  Present: {:?}",
                label,
                $results.labels()
            ),
        }
    }};
}

/// Assert a sheet was left out of the results for the given reason.
#[macro_export]
macro_rules! assert_skipped {
    ($results:expr, $label:expr, $reason:pat) => {{
        let label: &str = $label;
        match $results.skipped().iter().find(|s| s.key.label() == label) {
            Some(s) => assert!(
                matches!(s.reason, $reason),
                "assert_skipped! failed for {:?}: reason was {:?}",
                label,
                s.reason
            ),
            None => panic!(
                "assert_skipped! failed: {:?} was not skipped.\n  Skipped: {:?}",
                label,
                $results.skipped().iter().map(|s| s.key.label()).collect::<Vec<_>>()
            ),
        }
    }};
}

// ---------------------------------------------------------------------------
// Row-level assertions
// ---------------------------------------------------------------------------

/// Assert every returned row satisfies a predicate over `(sheet_label, row)`.
#[macro_export]
macro_rules! assert_every_row {
    ($results:expr, $pred:expr) => {{
        let pred = $pred;
        for m in $results.iter() {
            let label = m.key().label();
            for (idx, row) in m.row_indices().iter().zip(m.rows()) {
                if !pred(label.as_str(), row) {
                    panic!(
                        "assert_every_row! failed: {:?} row {} = {:?}",
                        label, idx, row
                    );
                }
            }
        }
    }};
}
