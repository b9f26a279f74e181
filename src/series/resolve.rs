//! Column resolution.
//!
//! Selectors either match exactly (case-insensitive, whitespace-trimmed) or
//! fail with the list of selectable columns. There is no substring or fuzzy
//! fallback: a near miss is reported, never silently substituted.

use tracing::debug;

use crate::domain::{ColumnCatalog, ColumnResolution, ColumnSelector, ResolvedColumn};

/// Resolve `selector` against `catalog`.
///
/// Position 0 (the date column) is never a valid target.
pub fn resolve(selector: &ColumnSelector, catalog: &ColumnCatalog) -> ColumnResolution {
    let index = match selector {
        ColumnSelector::ByIndex(i) => Some(*i).filter(|&i| i > 0 && i < catalog.len()),
        ColumnSelector::ByName(name) => find_by_name(name, catalog),
    };

    match index {
        Some(index) => {
            let column = ResolvedColumn {
                index,
                name: catalog.display_name(index),
            };
            debug!(%selector, index, name = %column.name, "resolved column");
            ColumnResolution::Resolved(column)
        }
        None => {
            debug!(%selector, columns = catalog.len(), "column not resolved");
            ColumnResolution::Unresolved {
                attempted: selector.clone(),
                available: catalog.value_columns(),
            }
        }
    }
}

/// Lowest non-date position whose header equals `name`, ignoring case.
fn find_by_name(name: &str, catalog: &ColumnCatalog) -> Option<usize> {
    let wanted = normalize_header_name(name);
    if wanted.is_empty() {
        return None;
    }
    (1..catalog.len()).find(|&i| {
        catalog
            .header(i)
            .map(|h| normalize_header_name(h) == wanted)
            .unwrap_or(false)
    })
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes carry a BOM on the first header.
    name.trim().trim_start_matches('\u{feff}').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AvailableColumn;

    fn catalog(names: &[&str]) -> ColumnCatalog {
        ColumnCatalog::new(names.iter().map(|s| s.to_string()).collect())
    }

    fn available_names(resolution: &ColumnResolution) -> Vec<String> {
        match resolution {
            ColumnResolution::Unresolved { available, .. } => {
                available.iter().map(|c| c.name.clone()).collect()
            }
            ColumnResolution::Resolved(c) => panic!("unexpectedly resolved to {c:?}"),
        }
    }

    #[test]
    fn name_resolves_to_its_position() {
        let cat = catalog(&["DATE", "BETULA", "ALNUS", "CORYLUS"]);
        let res = resolve(&ColumnSelector::ByName("ALNUS".into()), &cat);
        assert_eq!(
            res,
            ColumnResolution::Resolved(ResolvedColumn { index: 2, name: "ALNUS".into() })
        );
    }

    #[test]
    fn name_match_ignores_case_and_padding() {
        let cat = catalog(&["DATE", "Betula ", "ALNUS"]);
        let res = resolve(&ColumnSelector::ByName(" betula".into()), &cat);
        assert!(matches!(res, ColumnResolution::Resolved(ResolvedColumn { index: 1, .. })));
    }

    #[test]
    fn name_has_no_partial_match() {
        let cat = catalog(&["DATE", "BETULA", "ALNUS", "CORYLUS"]);
        let res = resolve(&ColumnSelector::ByName("ALN".into()), &cat);
        assert_eq!(available_names(&res), vec!["BETULA", "ALNUS", "CORYLUS"]);
    }

    #[test]
    fn duplicate_headers_pick_lowest_position() {
        let cat = catalog(&["DATE", "ALNUS", "ALNUS"]);
        let res = resolve(&ColumnSelector::ByName("alnus".into()), &cat);
        assert!(matches!(res, ColumnResolution::Resolved(ResolvedColumn { index: 1, .. })));
    }

    #[test]
    fn date_column_name_is_not_selectable() {
        let cat = catalog(&["DATE", "BETULA"]);
        let res = resolve(&ColumnSelector::ByName("date".into()), &cat);
        assert_eq!(available_names(&res), vec!["BETULA"]);
    }

    #[test]
    fn every_valid_index_resolves() {
        let cat = catalog(&["DATE", "A1", "A2", "A3", "A4", "A5"]);
        for i in 1..cat.len() {
            match resolve(&ColumnSelector::ByIndex(i), &cat) {
                ColumnResolution::Resolved(c) => assert_eq!(c.index, i),
                other => panic!("index {i} failed: {other:?}"),
            }
        }
    }

    #[test]
    fn out_of_range_index_lists_all_value_columns() {
        let cat = catalog(&["DATE", "BETULA", "ALNUS", "CORYLUS", "POACEAE"]);
        for i in [0, 5, 6, 100] {
            let res = resolve(&ColumnSelector::ByIndex(i), &cat);
            assert_eq!(available_names(&res).len(), cat.len() - 1);
        }

        let res = resolve(&ColumnSelector::ByIndex(6), &cat);
        assert_eq!(
            res,
            ColumnResolution::Unresolved {
                attempted: ColumnSelector::ByIndex(6),
                available: vec![
                    AvailableColumn { index: 1, name: "BETULA".into() },
                    AvailableColumn { index: 2, name: "ALNUS".into() },
                    AvailableColumn { index: 3, name: "CORYLUS".into() },
                    AvailableColumn { index: 4, name: "POACEAE".into() },
                ],
            }
        );
    }

    #[test]
    fn unresolved_converts_to_pipeline_error() {
        let cat = catalog(&["DATE", "BETULA"]);
        let err = resolve(&ColumnSelector::ByIndex(3), &cat).into_result().unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
