use mol_forge::ops::{CountAtoms, HydroConfig, Hydrogens};
use mol_forge::stream::{MemStream, PullStream, Pushback, Transform, lambda, map};
use mol_forge::{Error, Mol, PropValue, Toolkit};
use proptest::prelude::*;

fn mols(smiles: &[&str]) -> Vec<Mol> {
    smiles
        .iter()
        .map(|s| Mol::from_smiles(Toolkit::Table, s).unwrap())
        .collect()
}

#[test]
fn molecule_pipeline_filters_and_annotates() {
    let source = MemStream::from(mols(&["C", "CCO", "c1ccccc1", "O"]));
    let heavy = lambda(source, |mol: Mol| Ok((mol.num_atoms() > 1).then_some(mol)));
    let counted = Transform::new(heavy, CountAtoms::new("heavy_atoms"));
    let with_h = Transform::new(counted, Hydrogens::new(HydroConfig::add()));

    let out: Vec<Mol> = with_h.records().collect::<Result<_, _>>().unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].get("heavy_atoms").unwrap(), PropValue::Integer(3));
    assert_eq!(out[0].num_atoms(), 9);
    assert_eq!(out[1].get("heavy_atoms").unwrap(), PropValue::Integer(6));
    assert_eq!(out[1].num_atoms(), 12);
}

#[test]
fn stage_errors_abort_the_stream() {
    let source = MemStream::from(vec![1, 2, 3]);
    let mut stage = lambda(source, |x: i32| {
        if x == 2 {
            Err(Error::stage("reject-two", "2 is not allowed"))
        } else {
            Ok(Some(x))
        }
    });

    assert_eq!(stage.advance().unwrap(), 1);
    let err = stage.advance().expect_err("second record fails");
    assert!(matches!(err, Error::Stage { .. }));

    let mut records = lambda(MemStream::from(vec![1, 2, 3]), |x: i32| {
        if x == 2 {
            Err(Error::stage("reject-two", "2 is not allowed"))
        } else {
            Ok(Some(x))
        }
    })
    .records();
    assert_eq!(records.next().unwrap().unwrap(), 1);
    assert!(records.next().unwrap().is_err());
    assert!(records.next().is_none());
}

#[test]
fn pushback_replays_records_as_a_stack() {
    let mut stream = Pushback::new(MemStream::from(mols(&["C", "N", "O"])));
    let a = stream.advance().unwrap();
    let b = stream.advance().unwrap();
    stream.pushback(a);
    stream.pushback(b);

    let order: Vec<String> = stream
        .records()
        .map(|m| m.unwrap().canonical_smiles())
        .collect();
    assert_eq!(order, vec!["N", "C", "O"]);
}

#[test]
fn replaying_pushed_back_records_leaves_upstream_untouched() {
    let mut stream = Pushback::new(MemStream::from(mols(&["C", "N", "O"])));
    let first = stream.advance().unwrap();
    assert_eq!(stream.inner().len(), 2);

    stream.pushback(first);
    assert!(stream.has_next().unwrap());
    assert!(stream.has_next().unwrap());
    assert_eq!(stream.inner().len(), 2);

    assert_eq!(stream.advance().unwrap().canonical_smiles(), "C");
    assert_eq!(stream.inner().len(), 2);
    assert_eq!(stream.advance().unwrap().canonical_smiles(), "N");
    assert_eq!(stream.inner().len(), 1);
}

#[test]
fn memory_stream_accepts_records_after_construction() {
    let mut stream = MemStream::from(mols(&["C"]));
    stream.push(Mol::from_smiles(Toolkit::Table, "CC").unwrap());

    assert_eq!(stream.advance().unwrap().num_atoms(), 1);
    assert_eq!(stream.advance().unwrap().num_atoms(), 2);
    assert!(stream.advance().unwrap_err().is_exhausted());
}

proptest! {
    #[test]
    fn has_next_never_skips_or_duplicates(
        items in prop::collection::vec(any::<u32>(), 0..40),
        polls in prop::collection::vec(0usize..4, 0..40),
    ) {
        let mut stream = map(MemStream::from(items.clone()), |x: u32| x);
        let mut seen = Vec::new();
        let mut round = 0;
        loop {
            let extra = polls.get(round).copied().unwrap_or(0);
            let mut available = stream.has_next().unwrap();
            for _ in 0..extra {
                prop_assert_eq!(stream.has_next().unwrap(), available);
                available = stream.has_next().unwrap();
            }
            if !available {
                break;
            }
            seen.push(stream.advance().unwrap());
            round += 1;
        }
        prop_assert_eq!(seen, items);
    }

    #[test]
    fn filtering_keeps_exactly_matching_records(
        items in prop::collection::vec(0u8..10, 0..60),
        threshold in 0u8..10,
    ) {
        let stream = lambda(MemStream::from(items.clone()), move |x: u8| {
            Ok((x >= threshold).then_some(x))
        });
        let out: Vec<u8> = stream.records().collect::<Result<_, _>>().unwrap();
        let expected: Vec<u8> = items.into_iter().filter(|x| *x >= threshold).collect();
        prop_assert_eq!(out, expected);
    }
}
