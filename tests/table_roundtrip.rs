use mol_forge::fingerprint;
use mol_forge::stream::PullStream;
use mol_forge::table::{
    Cell, FingerprintColumns, Table, TableReadOptions, TableWriteOptions, TypePolicy,
    read_sd_table, table_to_flat_file,
};
use mol_forge::{ChemContext, Mol, Toolkit};
use proptest::prelude::*;

fn compounds() -> Table {
    let mut columns: Vec<String> = vec!["id".into(), "smiles".into(), "pIC50".into()];
    columns.extend((0..16).map(|bit| format!("fp_{bit:04}")));
    columns.push("series".into());

    let mut table = Table::new(columns);
    let rows = [
        ("CMP-1", "CCO", Cell::Float(6.5), 0b1010_0000_0000_0001u16, "A"),
        ("CMP-2", "c1ccccc1O", Cell::Float(7.25), 0b0000_1111_0000_1111, "B"),
        ("CMP-3", "CC(=O)[O-]", Cell::Missing, 0b1111_1111_1111_1111, "A"),
    ];
    for (id, smiles, potency, bits, series) in rows {
        let mut row = vec![
            Cell::Text(id.into()),
            Cell::Text(smiles.into()),
            potency,
        ];
        row.extend((0..16).map(|i| Cell::Int(i64::from(bits >> (15 - i) & 1))));
        row.push(Cell::Text(series.into()));
        table.push_row(row).unwrap();
    }
    table
}

#[test]
fn tables_survive_an_sd_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("compounds.sdf");
    let ctx = ChemContext::new(Toolkit::Table);
    let original = compounds();

    let write_options = TableWriteOptions::new("smiles")
        .with_id_column("id")
        .with_fingerprint(FingerprintColumns::new("FP", "fp_"));
    let written = table_to_flat_file(&original, &write_options, &ctx, &path).unwrap();
    assert_eq!(written, 3);

    let mut input = ctx.open_input(&path).unwrap();
    let first = input.advance().unwrap();
    assert_eq!(first.title(), "CMP-1");
    assert_eq!(first.keys(), vec!["id", "pIC50", "FP", "series"]);
    let bits: Vec<u8> = fingerprint::decode(&first.get("FP").unwrap().to_string()).unwrap();
    assert_eq!(&bits[..4], &[1, 0, 1, 0]);
    input.close().unwrap();

    let read_options = TableReadOptions::new("smiles", 1)
        .with_fingerprint(FingerprintColumns::new("FP", "fp_"));
    let back = read_sd_table(&path, &ctx, &read_options).unwrap();

    assert_eq!(back.columns(), original.columns());
    assert_eq!(back.num_rows(), 3);
    for row in 0..3 {
        for column in original.columns() {
            let expected = original.cell(row, column).unwrap();
            let actual = back.cell(row, column).unwrap();
            if column == "smiles" {
                let canonical = Mol::from_smiles(Toolkit::Table, &expected.to_string())
                    .unwrap()
                    .canonical_smiles();
                assert_eq!(actual.to_string(), canonical);
            } else {
                assert_eq!(actual, expected, "row {row} column {column}");
            }
        }
    }
}

#[test]
fn reference_fingerprint_expands_to_bit_columns_and_back() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("fp.sdf");
    let ctx = ChemContext::new(Toolkit::Table);

    let mut mol = ctx.mol_from_smiles("CCO").unwrap();
    mol.set_title("m1");
    mol.set("FP", "UY5lpg==");
    let mut output = ctx.create_output(&source).unwrap();
    output.write(&mol).unwrap();
    output.close().unwrap();

    let fingerprint = FingerprintColumns::new("FP", "fp_");
    let read_options = TableReadOptions::new("smiles", 0).with_fingerprint(fingerprint.clone());
    let table = read_sd_table(&source, &ctx, &read_options).unwrap();
    assert_eq!(table.num_columns(), 33);
    assert_eq!(table.columns()[1], "fp_0000");
    assert_eq!(table.columns()[32], "fp_0031");
    let bits: String = table.columns()[1..]
        .iter()
        .map(|column| table.cell(0, column).unwrap().to_string())
        .collect();
    assert_eq!(bits, "01010001100011100110010110100110");

    let target = dir.path().join("back.sdf");
    let write_options = TableWriteOptions::new("smiles").with_fingerprint(fingerprint);
    assert_eq!(table_to_flat_file(&table, &write_options, &ctx, &target).unwrap(), 1);

    let mut input = ctx.open_input(&target).unwrap();
    let back = input.advance().unwrap();
    assert_eq!(back.keys(), vec!["FP"]);
    assert_eq!(back.get("FP").unwrap().to_string(), "UY5lpg==");
}

#[test]
fn tables_survive_a_csv_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("compounds.csv");
    let original = compounds();
    original.write_csv(&path).unwrap();

    let back = Table::read_csv(&path, &TypePolicy::default()).unwrap();
    assert_eq!(back, original);
}

proptest! {
    #[test]
    fn fingerprints_round_trip_when_whole_bytes(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let bits: Vec<bool> = bytes
            .iter()
            .flat_map(|byte| (0..8).map(move |i| byte & (0x80 >> i) != 0))
            .collect();
        let text = fingerprint::encode(&bits);
        let decoded: Vec<bool> = fingerprint::decode(&text).unwrap();
        prop_assert_eq!(decoded, bits);
    }

    #[test]
    fn partial_fingerprints_decode_with_zero_padding(bits in prop::collection::vec(any::<bool>(), 1..70)) {
        let decoded: Vec<bool> = fingerprint::decode(&fingerprint::encode(&bits)).unwrap();
        prop_assert_eq!(decoded.len() % 8, 0);
        prop_assert_eq!(decoded.len(), bits.len().div_ceil(8) * 8);
        prop_assert_eq!(&decoded[..bits.len()], &bits[..]);
        prop_assert!(decoded[bits.len()..].iter().all(|bit| !bit));
    }
}
