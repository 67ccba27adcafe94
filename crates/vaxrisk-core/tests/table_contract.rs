use vaxrisk_core::{interp_periodic, stable_hash_string, ResultTable};

#[test]
fn tables_keep_column_order_and_values() {
    let table = ResultTable::from_columns(vec![
        ("time".to_string(), vec![0.0, 1.0, 2.0]),
        ("outbreak_risk".to_string(), vec![0.5, 0.4, 0.3]),
    ])
    .unwrap();
    assert_eq!(table.columns(), &["time".to_string(), "outbreak_risk".to_string()]);
    assert_eq!(table.len(), 3);
    assert_eq!(table.rows()[1], vec![1.0, 0.4]);
    assert_eq!(table.column("outbreak_risk").unwrap(), vec![0.5, 0.4, 0.3]);
    assert!(table.column("missing").is_none());
}

#[test]
fn tables_reject_ragged_and_duplicate_columns() {
    assert!(ResultTable::from_columns(vec![
        ("time".to_string(), vec![0.0, 1.0]),
        ("titer".to_string(), vec![0.0]),
    ])
    .is_err());
    assert!(ResultTable::new(["time", "time"]).is_err());

    let mut table = ResultTable::new(["time", "titer"]).unwrap();
    assert!(table.push_row(vec![1.0]).is_err());
    table.push_row(vec![1.0, 2.0]).unwrap();
    assert!(!table.is_empty());
}

#[test]
fn periodic_interpolation_wraps() {
    let values = [0.0, 1.0, 2.0, 3.0];
    assert_eq!(interp_periodic(&values, 1.0), 1.0);
    assert!((interp_periodic(&values, 1.5) - 1.5).abs() < 1e-12);
    assert!((interp_periodic(&values, 3.5) - 1.5).abs() < 1e-12);
    assert_eq!(interp_periodic(&values, -1.0), 3.0);
    assert_eq!(interp_periodic(&values, 6.0), 2.0);
}

#[test]
fn stable_hash_ignores_key_order() {
    let a = serde_json::json!({"k": 0.41, "period": 365});
    let b = serde_json::json!({"period": 365, "k": 0.41});
    assert_eq!(stable_hash_string(&a).unwrap(), stable_hash_string(&b).unwrap());
}
