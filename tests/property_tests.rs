//! Property-based tests for configuration validation, reference derivation
//! and result containers
//!
//! These tests verify that:
//! - Cross-mode validation accepts exactly the documents whose name sets match
//! - Derived references never exceed 20 characters and explicit ones always win
//! - Containers preserve rows and project columns consistently

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_yaml::{Mapping, Value as Yaml};
    use simqle::config::{validate, LoadOptions};
    use simqle::core::db::{derive_reference, Value};
    use simqle::{ErrorKind, RecordScalar, RecordSet};
    use std::collections::BTreeSet;

    fn section(names: &BTreeSet<String>, driver: &str) -> Yaml {
        Yaml::Sequence(
            names
                .iter()
                .map(|name| {
                    let mut entry = Mapping::new();
                    entry.insert("name".into(), name.as_str().into());
                    entry.insert("driver".into(), driver.into());
                    entry.insert("connection".into(), "".into());
                    Yaml::Mapping(entry)
                })
                .collect(),
        )
    }

    fn arb_names() -> impl Strategy<Value = BTreeSet<String>> {
        prop::collection::btree_set("[a-e]", 1..5)
    }

    proptest! {
        #[test]
        fn names_validate_iff_sets_match(
            prod in arb_names(),
            dev in prop::option::of(arb_names()),
            test in prop::option::of(arb_names()),
        ) {
            let mut doc = Mapping::new();
            doc.insert("connections".into(), section(&prod, "sqlite:///"));
            if let Some(dev) = &dev {
                doc.insert("dev-connections".into(), section(dev, "sqlite:///"));
            }
            if let Some(test) = &test {
                doc.insert("test-connections".into(), section(test, "sqlite://"));
            }

            let matches = dev.as_ref().map_or(true, |d| *d == prod)
                && test.as_ref().map_or(true, |t| *t == prod);
            let yaml = Yaml::Mapping(doc);
            let result = validate(&yaml, LoadOptions::default());

            match result {
                Ok(_) => prop_assert!(matches),
                Err(e) => {
                    prop_assert!(!matches);
                    prop_assert_eq!(e.kind(), ErrorKind::EnvironSync);
                }
            }
        }

        #[test]
        fn derived_reference_is_a_short_prefix(sql in "[a-zA-Z0-9 *,=]{0,80}") {
            let reference = derive_reference(&sql, None);
            prop_assert!(reference.chars().count() <= 20);
            prop_assert!(sql.trim().starts_with(&reference));
        }

        #[test]
        fn explicit_reference_wins(sql in ".{0,80}", reference in "[a-z]{1,40}") {
            prop_assert_eq!(derive_reference(&sql, Some(&reference)), reference);
        }

        #[test]
        fn recordset_column_matches_rows(values in prop::collection::vec(any::<i64>(), 0..20)) {
            let rows: Vec<Vec<Value>> = values
                .iter()
                .map(|v| vec![Value::Integer(*v), Value::Null])
                .collect();
            let rs = RecordSet::new(vec!["n".to_string(), "x".to_string()], rows.clone());

            prop_assert_eq!(rs.has_data(), !values.is_empty());
            prop_assert_eq!(rs.iter().cloned().collect::<Vec<_>>(), rows);
            let expected: Vec<Value> = values.iter().map(|v| Value::Integer(*v)).collect();
            prop_assert_eq!(rs.column("n").unwrap(), expected);
        }

        #[test]
        fn scalar_truthiness_tracks_rows_not_values(value in any::<i64>(), present in any::<bool>()) {
            let rows = if present { vec![vec![Value::Integer(value)]] } else { vec![] };
            let scalar = RecordScalar::new(vec!["n".to_string()], rows);
            prop_assert_eq!(scalar.has_data(), present);
            let fallback = Value::Null;
            if present {
                prop_assert_eq!(scalar.sdatum(&fallback), &Value::Integer(value));
            } else {
                prop_assert_eq!(scalar.sdatum(&fallback), &Value::Null);
            }
        }
    }
}
