//! Integration tests for the in-memory store's transaction semantics.

use nosqlbench_core::{
    CoreError, Database, FieldValue, Fields, MemoryDatabase, Session, StoreConfig,
};
use proptest::prelude::*;
use std::sync::{Arc, Barrier};
use std::thread;

fn open() -> MemoryDatabase {
    MemoryDatabase::open(&StoreConfig::default()).unwrap()
}

fn number(n: i64) -> Fields {
    let mut fields = Fields::new();
    fields.insert("number".to_string(), FieldValue::Integer(n));
    fields
}

fn read_number(db: &MemoryDatabase, session: &mut Session, key: &str) -> i64 {
    db.get(session, key).unwrap().unwrap()["number"]
        .as_integer()
        .unwrap()
}

#[test]
fn failed_commit_changes_nothing() {
    let db = open();
    let mut setup = db.session();
    let a = db.insert(&mut setup, "Test", number(1)).unwrap();
    let b = db.insert(&mut setup, "Test", number(2)).unwrap();
    let c = db.insert(&mut setup, "Test", number(3)).unwrap();

    let mut tx = db.session();
    db.start_transaction(&mut tx).unwrap();
    db.get(&mut tx, &a).unwrap();
    db.get(&mut tx, &b).unwrap();
    db.get(&mut tx, &c).unwrap();
    db.put(&mut tx, "Test", &a, number(10)).unwrap();
    db.put(&mut tx, "Test", &b, number(20)).unwrap();
    db.delete(&mut tx, "Test", &c).unwrap();
    let fresh = db.insert(&mut tx, "Test", number(4)).unwrap();

    // A concurrent writer bumps b, invalidating the captured version.
    db.put(&mut setup, "Test", &b, number(200)).unwrap();

    // Every other operation in the batch is valid on its own; only the
    // stale read of b may reject it.
    let err = db.commit_transaction(&mut tx).unwrap_err();
    assert!(
        matches!(&err, CoreError::VersionConflict { key, .. } if *key == b),
        "{err:?}"
    );

    assert_eq!(read_number(&db, &mut setup, &a), 1);
    assert_eq!(read_number(&db, &mut setup, &b), 200);
    assert_eq!(read_number(&db, &mut setup, &c), 3);
    assert_eq!(db.get(&mut setup, &fresh).unwrap(), None);
    assert_eq!(db.version_of(&a).unwrap(), Some(1));
    assert_eq!(db.len().unwrap(), 3);
}

#[test]
fn batch_without_stale_reads_commits() {
    let db = open();
    let mut setup = db.session();
    let a = db.insert(&mut setup, "Test", number(1)).unwrap();
    let c = db.insert(&mut setup, "Test", number(3)).unwrap();

    let mut tx = db.session();
    db.start_transaction(&mut tx).unwrap();
    db.get(&mut tx, &a).unwrap();
    db.get(&mut tx, &c).unwrap();
    db.put(&mut tx, "Test", &a, number(10)).unwrap();
    db.delete(&mut tx, "Test", &c).unwrap();
    db.commit_transaction(&mut tx).unwrap();

    assert_eq!(read_number(&db, &mut setup, &a), 10);
    assert_eq!(db.get(&mut setup, &c).unwrap(), None);
}

#[test]
fn conflict_names_the_key() {
    let db = open();
    let mut setup = db.session();
    let key = db.insert(&mut setup, "Test", number(0)).unwrap();

    let mut tx = db.session();
    db.start_transaction(&mut tx).unwrap();
    db.get(&mut tx, &key).unwrap();
    db.put(&mut tx, "Test", &key, number(1)).unwrap();
    db.put(&mut setup, "Test", &key, number(5)).unwrap();

    match db.commit_transaction(&mut tx) {
        Err(CoreError::VersionConflict {
            key: conflicted,
            expected,
            actual,
        }) => {
            assert_eq!(conflicted, key);
            assert_eq!(expected, 1);
            assert_eq!(actual, 2);
        }
        other => panic!("expected version conflict, got {other:?}"),
    }
}

#[test]
fn retry_after_conflict_starts_fresh() {
    let db = open();
    let mut setup = db.session();
    let key = db.insert(&mut setup, "Test", number(0)).unwrap();

    let mut tx = db.session();
    db.start_transaction(&mut tx).unwrap();
    db.get(&mut tx, &key).unwrap();
    db.put(&mut tx, "Test", &key, number(1)).unwrap();
    db.put(&mut setup, "Test", &key, number(7)).unwrap();
    assert!(db.commit_transaction(&mut tx).is_err());

    // The failed context is gone; a rollback is a no-op.
    db.rollback_transaction(&mut tx).unwrap();

    db.start_transaction(&mut tx).unwrap();
    let current = read_number(&db, &mut tx, &key);
    db.put(&mut tx, "Test", &key, number(current + 1)).unwrap();
    db.commit_transaction(&mut tx).unwrap();

    assert_eq!(read_number(&db, &mut setup, &key), 8);
}

#[test]
fn racing_readers_one_winner() {
    let db = Arc::new(open());
    let mut setup = db.session();
    let key = db.insert(&mut setup, "Test", number(0)).unwrap();
    let before = db.version_of(&key).unwrap().unwrap();

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = (0..2)
        .map(|i| {
            let db = Arc::clone(&db);
            let barrier = Arc::clone(&barrier);
            let key = key.clone();
            thread::spawn(move || {
                let mut session = db.session();
                db.start_transaction(&mut session).unwrap();
                let current = read_number(&db, &mut session, &key);
                db.put(&mut session, "Test", &key, number(current + i + 1))
                    .unwrap();
                // Both have read version V before either commits.
                barrier.wait();
                db.commit_transaction(&mut session)
            })
        })
        .collect();

    let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let wins = outcomes.iter().filter(|r| r.is_ok()).count();
    let conflicts = outcomes
        .iter()
        .filter(|r| matches!(r, Err(e) if e.is_conflict()))
        .count();

    assert_eq!(wins, 1);
    assert_eq!(conflicts, 1);
    assert_eq!(db.version_of(&key).unwrap(), Some(before + 1));
    assert_eq!(db.stats().conflicts(), 1);
}

#[test]
fn transfer_keeps_sum() {
    let db = open();
    let mut setup = db.session();
    let a = db.insert(&mut setup, "Account", number(0)).unwrap();
    let b = db.insert(&mut setup, "Account", number(10)).unwrap();

    let mut tx = db.session();
    db.start_transaction(&mut tx).unwrap();
    let va = read_number(&db, &mut tx, &a);
    let vb = read_number(&db, &mut tx, &b);
    db.put(&mut tx, "Account", &a, number(va + 1)).unwrap();
    db.put(&mut tx, "Account", &b, number(vb - 1)).unwrap();

    // Neither half is visible before commit.
    assert_eq!(read_number(&db, &mut setup, &a), 0);
    assert_eq!(read_number(&db, &mut setup, &b), 10);

    db.commit_transaction(&mut tx).unwrap();
    let sum = read_number(&db, &mut setup, &a) + read_number(&db, &mut setup, &b);
    assert_eq!(sum, 10);
    assert_eq!(read_number(&db, &mut setup, &a), 1);
}

fn field_value() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        any::<i64>().prop_map(FieldValue::Integer),
        (-1.0e9f64..1.0e9).prop_map(FieldValue::Double),
        "[a-z ]{0,16}".prop_map(FieldValue::Text),
        prop::collection::vec("[a-z]{1,8}", 0..4).prop_map(FieldValue::TextList),
    ]
}

proptest! {
    #[test]
    fn insert_then_get_round_trips(
        fields in prop::collection::btree_map("[a-z]{1,8}", field_value(), 0..6)
    ) {
        let db = open();
        let mut session = db.session();
        let key = db.insert(&mut session, "Test", fields.clone()).unwrap();
        prop_assert_eq!(db.get(&mut session, &key).unwrap(), Some(fields));
    }

    #[test]
    fn versions_increase_by_one(updates in 1usize..20) {
        let db = open();
        let mut session = db.session();
        let key = db.insert(&mut session, "Test", number(0)).unwrap();

        let mut last = db.version_of(&key).unwrap().unwrap();
        for n in 0..updates {
            db.start_transaction(&mut session).unwrap();
            db.get(&mut session, &key).unwrap();
            db.put(&mut session, "Test", &key, number(n as i64)).unwrap();
            db.commit_transaction(&mut session).unwrap();

            let next = db.version_of(&key).unwrap().unwrap();
            prop_assert_eq!(next, last + 1);
            last = next;
        }
    }
}
