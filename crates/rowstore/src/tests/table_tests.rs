use super::helpers::*;
use crate::*;
use std::sync::Arc;
use tempfile::tempdir;

// --------------------- add / get_row_by_key ---------------------

#[test]
fn add_then_get_row_by_key() {
    let dir = tempdir().unwrap();
    let mut table = focus_table(&container_in(dir.path()));

    let row = focus_row(&table, "DV01", 3);
    let stored = table.add(row).unwrap();
    assert!(stored.is_added());
    assert_eq!(stored.table_name(), "CalFocus");

    let found = table
        .get_row_by_key(&AntennaKey::new("DV01", 3))
        .unwrap()
        .unwrap();
    assert_eq!(found.key().antenna_name, "DV01");
    assert_eq!(found.value().temperature, 273.0);
    assert!(table
        .get_row_by_key(&AntennaKey::new("DV01", 6))
        .unwrap()
        .is_none());
}

#[test]
fn duplicate_key_is_rejected() {
    let dir = tempdir().unwrap();
    let mut table = focus_table(&container_in(dir.path()));

    table.add(focus_row(&table, "DV01", 3)).unwrap();
    let mut second = focus_row(&table, "DV01", 3);
    second.value_mut().temperature = 100.0;

    match table.add(second) {
        Err(TableError::DuplicateKey { table: name, key }) => {
            assert_eq!(name, "CalFocus");
            assert!(key.contains("DV01"), "{key}");
        }
        other => panic!("expected DuplicateKey, got {other:?}"),
    }
    assert_eq!(table.size(), 1);
    assert_eq!(table.get().unwrap()[0].value().temperature, 273.0);
}

#[test]
fn check_and_add_has_the_add_contract() {
    let dir = tempdir().unwrap();
    let mut table = focus_table(&container_in(dir.path()));

    table.check_and_add(focus_row(&table, "DA41", 6)).unwrap();
    assert!(matches!(
        table.check_and_add(focus_row(&table, "DA41", 6)),
        Err(TableError::DuplicateKey { .. })
    ));
    assert!(matches!(
        table.add_without_checking_unique(focus_row(&table, "DA41", 6)),
        Err(TableError::DuplicateKey { .. })
    ));
    table
        .add_without_checking_unique(focus_row(&table, "DA42", 6))
        .unwrap();
    assert_eq!(table.size(), 2);
}

#[test]
fn append_skips_the_key_check() {
    let dir = tempdir().unwrap();
    let mut table = focus_table(&container_in(dir.path()));

    table.append(focus_row(&table, "PM01", 7)).unwrap();
    table.append(focus_row(&table, "PM01", 7)).unwrap();
    assert_eq!(table.size(), 2);
    assert!(table.rows().iter().all(Row::is_added));
}

#[test]
fn rows_keep_insertion_order() {
    let dir = tempdir().unwrap();
    let mut table = focus_table(&container_in(dir.path()));

    for name in ["DV03", "DV01", "DV02"] {
        table.add(focus_row(&table, name, 3)).unwrap();
    }
    let names: Vec<_> = table
        .get()
        .unwrap()
        .iter()
        .map(|r| r.key().antenna_name.clone())
        .collect();
    assert_eq!(names, ["DV03", "DV01", "DV02"]);
}

// --------------------- lookup / comparisons ---------------------

#[test]
fn lookup_needs_equal_values() {
    let dir = tempdir().unwrap();
    let mut table = focus_table(&container_in(dir.path()));
    table.add(focus_row(&table, "DV01", 3)).unwrap();

    let key = AntennaKey::new("DV01", 3);
    assert!(table.lookup(&key, &focus_value(273.0)).unwrap().is_some());
    assert!(table.lookup(&key, &focus_value(274.0)).unwrap().is_none());
}

#[test]
fn compare_by_key_and_by_value() {
    let dir = tempdir().unwrap();
    let table = focus_table(&container_in(dir.path()));

    let a = focus_row(&table, "DV01", 3);
    let mut b = focus_row(&table, "DV01", 3);
    assert!(a.compare_by_key(&b));
    assert!(a.compare_by_value(&b));

    b.value_mut().comment = "changed".to_string();
    assert!(a.compare_by_key(&b));
    assert!(!a.compare_by_value(&b));
}

#[test]
fn values_of_stored_rows_are_mutable() {
    let dir = tempdir().unwrap();
    let mut table = focus_table(&container_in(dir.path()));
    table.add(focus_row(&table, "DV01", 3)).unwrap();

    let row = table
        .get_row_by_key_mut(&AntennaKey::new("DV01", 3))
        .unwrap()
        .unwrap();
    row.value_mut().width = None;

    assert_eq!(table.rows()[0].value().width, None);
}

// --------------------- Row factories and frozen keys ---------------------

#[test]
fn new_row_has_default_attributes() {
    let dir = tempdir().unwrap();
    let table = focus_table(&container_in(dir.path()));

    let row = table.new_row();
    assert_eq!(row.key(), &AntennaKey::default());
    assert_eq!(row.value(), &FocusValue::default());
    assert!(!row.is_added());
}

#[test]
fn key_is_frozen_once_added() {
    let dir = tempdir().unwrap();
    let mut table = focus_table(&container_in(dir.path()));

    let mut row = focus_row(&table, "DV01", 3);
    row.set_key(AntennaKey::new("DV02", 3)).unwrap();
    table.add(row).unwrap();

    let mut stored = table.rows()[0].clone();
    assert!(matches!(
        stored.set_key(AntennaKey::new("DV09", 3)),
        Err(TableError::KeyFrozen { .. })
    ));
}

#[test]
fn new_row_from_detaches_a_copy() {
    let dir = tempdir().unwrap();
    let mut table = focus_table(&container_in(dir.path()));
    table.add(focus_row(&table, "DV01", 3)).unwrap();

    let mut copy = table.new_row_from(&table.rows()[0]);
    assert!(!copy.is_added());
    assert_eq!(copy.value(), table.rows()[0].value());

    copy.set_key(AntennaKey::new("DV05", 3)).unwrap();
    table.add(copy).unwrap();
    assert_eq!(table.size(), 2);
}

// --------------------- Metadata ---------------------

#[test]
fn schema_names_and_defaults() {
    let dir = tempdir().unwrap();
    let table = focus_table(&container_in(dir.path()));

    assert_eq!(table.name(), "CalFocus");
    assert_eq!(table.version(), "3");
    assert_eq!(table.key_names(), &["antennaName", "receiverBand"]);
    assert_eq!(table.attribute_names().len(), 9);
    assert_eq!(table.attribute_names()[2], "startValidTime");
    assert_eq!(table.default_binary_order(), table.attribute_names());
    assert_eq!(table.entity().entity_id, DEFAULT_ENTITY_ID);
    assert_eq!(table.entity().entity_type_name, "CalFocusTable");
    assert_eq!(table.residency(), Residency::Resident);
    assert!(!table.archive_as_bin());
}

#[test]
fn tables_start_with_the_container_format() {
    let dir = tempdir().unwrap();
    let mut config = config::StoreConfig::in_dir(dir.path());
    config.file_as_bin = true;
    let table = focus_table(&container_with(config));
    assert!(table.file_as_bin());
}

#[test]
fn unknown_reader_cannot_shadow_a_known_attribute() {
    let dir = tempdir().unwrap();
    let mut table = focus_table(&container_in(dir.path()));
    let reader: UnknownAttributeReader =
        Arc::new(|_: &str, r: &mut bytestream::EndianReader<'_>| r.read_i32().map(|_| ()));

    assert!(matches!(
        table.set_unknown_attribute_binary_reader("antennaName", Arc::clone(&reader)),
        Err(TableError::Conversion { .. })
    ));
    assert!(table.unknown_attribute_binary_reader("antennaName").is_none());

    table
        .set_unknown_attribute_binary_reader("newAttribute", reader)
        .unwrap();
    assert!(table.unknown_attribute_binary_reader("newAttribute").is_some());
}
