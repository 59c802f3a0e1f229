use emberdb::collection::DocId;
use emberdb::common::{Value, DOC_ID};
use emberdb::doc;
use emberdb::errors::ErrorKind;
use emberdb::filter::{all, field};
use emberdb::index::{index_options, IndexKind};
use emberdb_int_test::test_util::{cleanup, create_test_context, insert_test_documents, run_test};

#[test]
fn test_insert_assigns_ids() {
    run_test(
        || create_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            let ids = insert_test_documents(&collection)?;
            assert_eq!(ids.len(), 3);
            assert_eq!(collection.size()?, 3);

            for id in ids {
                let document = collection.get_by_id(id)?.expect("stored document");
                assert_eq!(document.id(), Some(id));
            }
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_insert_with_preset_id_fails() {
    run_test(
        || create_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            let first = collection.insert(doc! { a: 1 })?;

            let mut copy = collection.get_by_id(first)?.expect("stored document");
            copy.put("a", 2)?;
            let err = collection.insert(copy).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidId);

            let mut preset = doc! { a: 3 };
            preset.put(DOC_ID, Value::from(DocId::create_id(5)?))?;
            let err = collection.insert(preset).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidId);
            assert_eq!(collection.size()?, 1);

            // ids keep following creation order
            let second = collection.insert(doc! { a: 4 })?;
            assert_eq!(collection.find(all())?.ids(), &[first, second]);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_unique_index_rejects_equal_values() {
    run_test(
        || create_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            insert_test_documents(&collection)?;
            collection.create_index("first_name", Some(index_options(IndexKind::Unique)))?;

            let err = collection.insert(doc! { first_name: "fn1" }).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::UniqueConstraintViolation);
            assert_eq!(collection.find(field("first_name").eq("fn1"))?.size(), 1);

            // numbers are unique by value across representations
            collection.create_index("age", Some(index_options(IndexKind::Unique)))?;
            let err = collection.insert(doc! { age: 31.0 }).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::UniqueConstraintViolation);

            let err = collection
                .update(field("first_name").eq("fn2"), &doc! { first_name: "fn3" })
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::UniqueConstraintViolation);
            assert_eq!(collection.find(field("first_name").eq("fn2"))?.size(), 1);

            collection.insert(doc! { first_name: "fn4" })?;
            assert_eq!(collection.size()?, 4);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_unique_index_allows_absent_values() {
    run_test(
        || create_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.create_index("email", Some(index_options(IndexKind::Unique)))?;
            collection.insert(doc! { name: "a" })?;
            collection.insert(doc! { name: "b" })?;
            assert_eq!(collection.size()?, 2);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_update_and_update_by_id() {
    run_test(
        || create_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            let ids = insert_test_documents(&collection)?;
            collection.create_index("last_name", None)?;

            let changed = collection.update(field("last_name").eq("ln2"), &doc! { last_name: "ln9" })?;
            assert_eq!(changed, 2);
            assert_eq!(collection.find(field("last_name").eq("ln2"))?.size(), 0);
            assert_eq!(collection.find(field("last_name").eq("ln9"))?.size(), 2);

            assert!(collection.update_by_id(ids[0], &doc! { address: { city: "Rome" } })?);
            let updated = collection.get_by_id(ids[0])?.expect("stored document");
            assert_eq!(updated.get("address.city")?, Some(Value::from("Rome")));

            let missing = DocId::create_id(42)?;
            assert!(!collection.update_by_id(missing, &doc! { a: 1 })?);

            let err = collection.update(all(), &doc! { _id: 42 }).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_remove_and_clear() {
    run_test(
        || create_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            insert_test_documents(&collection)?;
            collection.create_index("age", None)?;

            assert_eq!(collection.remove(field("age").gt(30))?, 2);
            assert_eq!(collection.size()?, 1);
            assert_eq!(collection.find(field("age").gt(0))?.size(), 1);

            collection.clear()?;
            assert_eq!(collection.size()?, 0);
            assert!(collection.has_index("age")?);
            assert_eq!(collection.find(field("age").gt(0))?.size(), 0);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_operations_after_drop_or_close_fail() {
    run_test(
        || create_test_context(),
        |ctx| {
            let db = ctx.db();
            let collection = db.collection("test")?;
            collection.insert(doc! { a: 1 })?;

            db.drop_collection("test")?;
            assert!(collection.is_dropped());
            assert!(!db.has_collection("test")?);
            assert_eq!(collection.size().unwrap_err().kind(), &ErrorKind::InvalidOperation);

            let fresh = db.collection("test")?;
            assert_eq!(fresh.size()?, 0);

            db.close()?;
            assert!(db.is_closed());
            assert_eq!(fresh.size().unwrap_err().kind(), &ErrorKind::InvalidOperation);
            assert_eq!(db.collection("other").unwrap_err().kind(), &ErrorKind::InvalidOperation);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
