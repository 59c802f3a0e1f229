use emberdb::errors::ErrorKind;
use emberdb::index::{index_options, IndexKind};
use emberdb_int_test::test_util::{cleanup, create_test_context, insert_test_documents, run_test};

#[test]
fn test_create_duplicate_index_fails() {
    run_test(
        || create_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            insert_test_documents(&collection)?;
            collection.create_index("age", None)?;

            let err = collection
                .create_index("age", Some(index_options(IndexKind::Unique)))
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::IndexingError);
            assert_eq!(collection.list_indices()?[0].kind(), IndexKind::NonUnique);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_unique_index_on_duplicate_values_fails() {
    run_test(
        || create_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            insert_test_documents(&collection)?;

            let err = collection
                .create_index("last_name", Some(index_options(IndexKind::Unique)))
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::UniqueConstraintViolation);
            assert!(!collection.has_index("last_name")?);
            assert!(collection.list_indices()?.is_empty());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_index_on_invalid_field_fails() {
    run_test(
        || create_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            for field in ["", "_id"] {
                let err = collection.create_index(field, None).unwrap_err();
                assert_eq!(err.kind(), &ErrorKind::ValidationError);
            }
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_drop_or_rebuild_missing_index_fails() {
    run_test(
        || create_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            insert_test_documents(&collection)?;

            let err = collection.drop_index("age").unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::IndexNotFound);
            let err = collection.rebuild_index("age", false).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::IndexNotFound);

            // dropping everything on an unindexed collection is fine
            collection.drop_all_indices()?;
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
