use effi::bits::bits_for_max_decimal;
use effi::file::{EffiFile, WriterOptions};
use effi::schema::{Correction, DataKind, Detection, Schema};
use effi::value::row_of;
use effi::{resolve, text, EffiError, RowLayout, Value};
use std::fs;
use tempfile::NamedTempFile;

fn people_schema() -> Schema {
    Schema::new()
        .add_field("Id", bits_for_max_decimal(1_000_000), DataKind::Decimal, Detection::None, Correction::None).unwrap()
        .add_field("Age", bits_for_max_decimal(200), DataKind::Decimal, Detection::None, Correction::None).unwrap()
        .add_field("Phone", bits_for_max_decimal(9_999_999_999), DataKind::Decimal, Detection::None, Correction::None).unwrap()
}

#[test]
fn test_people_scenario() {
    let temp_file = NamedTempFile::new().unwrap();
    let file = EffiFile::new(temp_file.path(), people_schema());

    let layout = file.layout().unwrap();
    assert_eq!(layout.widths().as_slice(), &[20, 8, 34]);
    assert_eq!(layout.sum_bits(), 62);
    assert_eq!(layout.slot_bits(), 64);

    {
        let mut writer = file.writer(WriterOptions { truncate: true, ..Default::default() }).unwrap();
        for _ in 0..10 {
            writer.write_row(&row_of(&[0, 50, 1_211_211_212])).unwrap();
        }
        writer.finish().unwrap();
    }

    assert_eq!(fs::metadata(temp_file.path()).unwrap().len(), 80);

    let rows = file.reader().unwrap().read_all().unwrap();
    assert_eq!(rows.len(), 10);
    assert!(rows.iter().all(|r| r == &row_of(&[0, 50, 1_211_211_212])));
}

#[test]
fn test_file_size_law() {
    let schema = Schema::new()
        .add_decimal("a", 40).unwrap()
        .add_decimal("b", 40).unwrap(); // 80 bits -> 128-bit slot
    let temp_file = NamedTempFile::new().unwrap();
    let file = EffiFile::new(temp_file.path(), schema);

    let mut writer = file.writer(WriterOptions { truncate: true, ..Default::default() }).unwrap();
    for i in 0..37u128 {
        writer.write_row(&row_of(&[i, i * 3])).unwrap();
    }
    writer.finish().unwrap();

    assert_eq!(fs::metadata(temp_file.path()).unwrap().len(), 37 * 16);
    assert_eq!(file.reader().unwrap().row_count().unwrap(), 37);
}

#[test]
fn test_overflow_writes_nothing() {
    let temp_file = NamedTempFile::new().unwrap();
    let file = EffiFile::new(temp_file.path(), people_schema());

    let mut writer = file.writer(WriterOptions { truncate: true, ..Default::default() }).unwrap();
    writer.write_row(&row_of(&[1, 2, 3])).unwrap();
    let err = writer.write_row(&row_of(&[1 << 20, 2, 3])).unwrap_err();
    assert!(matches!(err, EffiError::FieldOverflow { field: 0, width: 20, .. }));
    assert_eq!(writer.finish().unwrap(), 1);

    assert_eq!(fs::metadata(temp_file.path()).unwrap().len(), 8);
}

#[test]
fn test_arity_mismatch() {
    let layout = RowLayout::new(&people_schema()).unwrap();
    assert!(matches!(
        layout.encode(&row_of(&[1, 2, 3, 4])),
        Err(EffiError::RowShape { expected: 3, actual: 4 })
    ));
}

#[test]
fn test_unsupported_feature_names_field_and_flag() {
    let schema = people_schema()
        .add_field("Checked", 8, DataKind::Decimal, Detection::Parity, Correction::ReedSolomon)
        .unwrap();
    let err = resolve(&schema).unwrap_err();
    assert!(matches!(err, EffiError::UnsupportedFeature { ref field, .. } if field == "Checked"));
    assert!(err.to_string().contains("parity"));

    let temp_file = NamedTempFile::new().unwrap();
    assert!(EffiFile::new(temp_file.path(), schema).writer(WriterOptions::default()).is_err());
}

#[test]
fn test_text_fields_through_file() {
    let schema = Schema::new()
        .add_decimal("Id", 16).unwrap()
        .add_text("Country", 3).unwrap()
        .add_text("City", 10).unwrap(); // 16 + 21 + 70 = 107 bits -> 16 B
    let temp_file = NamedTempFile::new().unwrap();
    let file = EffiFile::new(temp_file.path(), schema);

    let rows = [
        (1u128, "NLD", "Amsterdam"),
        (2, "PRT", "Lisbon"),
        (3, "JP", "Tokyo"),
    ];
    let mut writer = file.writer(WriterOptions { truncate: true, ..Default::default() }).unwrap();
    for (id, country, city) in rows {
        writer.write_row(&[Value::Int(id), text::pack(country, 3).unwrap(), text::pack(city, 10).unwrap()]).unwrap();
    }
    writer.finish().unwrap();

    assert_eq!(fs::metadata(temp_file.path()).unwrap().len(), 3 * 16);
    let decoded = file.reader().unwrap().read_all().unwrap();
    for ((id, country, city), row) in rows.iter().zip(&decoded) {
        assert_eq!(row[0], Value::Int(*id));
        assert_eq!(text::unpack(&row[1], 3).unwrap(), *country);
        assert_eq!(text::unpack(&row[2], 10).unwrap(), *city);
    }
}

#[test]
fn test_wide_fields_through_file() {
    // 200 + 40 * 7 = 480 bits -> 512-bit slot
    let schema = Schema::new()
        .add_decimal("Digest", 200).unwrap()
        .add_text("Title", 40).unwrap();
    let temp_file = NamedTempFile::new().unwrap();
    let file = EffiFile::new(temp_file.path(), schema);
    assert_eq!(file.layout().unwrap().slot_bytes(), 64);

    let max: Value = "1606938044258990275541962092341162602522202993782792835301375".parse().unwrap();
    let rows = vec![
        vec![max.clone(), text::pack("A title well past eighteen characters", 40).unwrap()],
        vec![Value::Int(7), text::pack("short", 40).unwrap()],
    ];
    let mut writer = file.writer(WriterOptions { truncate: true, ..Default::default() }).unwrap();
    writer.write_rows(&rows).unwrap();
    writer.finish().unwrap();

    assert_eq!(fs::metadata(temp_file.path()).unwrap().len(), 2 * 64);
    let reader = file.reader().unwrap();
    assert_eq!(reader.read_all().unwrap(), rows);
    let second = reader.read_row(1).unwrap();
    assert_eq!(text::unpack(&second[1], 40).unwrap(), "short");
    assert!(matches!(reader.read_row(2), Err(EffiError::RowOutOfRange { index: 2, rows: 2 })));
}

#[test]
fn test_append_after_torn_write_refused() {
    let temp_file = NamedTempFile::new().unwrap();
    let file = EffiFile::new(temp_file.path(), people_schema());

    let mut writer = file.writer(WriterOptions { truncate: true, ..Default::default() }).unwrap();
    writer.write_row(&row_of(&[1, 2, 3])).unwrap();
    writer.finish().unwrap();

    // Simulate a half-written slot at the end of the file.
    let mut bytes = fs::read(temp_file.path()).unwrap();
    bytes.extend_from_slice(&[0xAB; 3]);
    fs::write(temp_file.path(), &bytes).unwrap();

    assert!(matches!(
        file.writer(WriterOptions::default()),
        Err(EffiError::TruncatedRecord { len: 11, slot_bytes: 8 })
    ));
    assert_eq!(fs::metadata(temp_file.path()).unwrap().len(), 11);
}

#[test]
fn test_schema_sidecar_roundtrip() {
    let sidecar = NamedTempFile::new().unwrap();
    let schema = people_schema().add_text("Initials", 2).unwrap();
    fs::write(sidecar.path(), schema.to_json().unwrap()).unwrap();

    let loaded = Schema::from_json(&fs::read_to_string(sidecar.path()).unwrap()).unwrap();
    assert_eq!(loaded, schema);
    assert_eq!(RowLayout::new(&loaded).unwrap(), RowLayout::new(&schema).unwrap());
}
