use emberdb::collection::Document;
use emberdb::doc;
use emberdb::errors::ErrorKind;
use emberdb::filter::field;
use emberdb::index::{index_options, BuildState, IndexKind, IndexOptions};
use emberdb_int_test::test_util::{
    cleanup, create_gated_test_context, create_test_context, insert_test_documents, run_test,
    GatedTextIndexer,
};
use std::thread;
use std::time::Duration;

#[test]
fn test_async_value_index_build() {
    run_test(
        || create_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            for i in 0..2000 {
                collection.insert(doc! { n: i, parity: (i % 2) })?;
            }

            collection.create_index("n", Some(IndexOptions::async_of(IndexKind::Unique)))?;
            // visible right away, whatever the build progress
            assert!(collection.has_index("n")?);
            assert_eq!(collection.find(field("n").lt(10))?.size(), 10);

            awaitility::at_most(Duration::from_secs(10))
                .until(|| !collection.is_indexing("n").unwrap_or(true));
            assert_eq!(collection.index_status("n")?, Some(BuildState::Built));
            assert_eq!(collection.find(field("n").gte(1990))?.size(), 10);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_rebuild_while_building_fails() {
    run_test(
        || create_test_context(),
        |_| {
            let indexer = GatedTextIndexer::new();
            let ctx = create_gated_test_context(indexer.clone())?;
            let collection = ctx.db().collection("test")?;
            insert_test_documents(&collection)?;

            collection.create_index("body", Some(IndexOptions::async_of(IndexKind::Fulltext)))?;
            awaitility::at_most(Duration::from_secs(10))
                .until(|| collection.is_indexing("body").unwrap_or(false));
            assert_eq!(collection.index_status("body")?, Some(BuildState::Building));

            let err = collection.rebuild_index("body", true).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::IndexingError);
            let err = collection.rebuild_index("body", false).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::IndexingError);

            indexer.open();
            awaitility::at_most(Duration::from_secs(10))
                .until(|| !collection.is_indexing("body").unwrap_or(true));
            assert_eq!(collection.index_status("body")?, Some(BuildState::Built));

            // the guard is released once the build completes
            collection.rebuild_index("body", true)?;
            awaitility::at_most(Duration::from_secs(10))
                .until(|| !collection.is_indexing("body").unwrap_or(true));
            assert_eq!(collection.find(field("body").text("lorem"))?.size(), 1);

            cleanup(ctx)
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_builds_on_different_fields_are_independent() {
    run_test(
        || create_test_context(),
        |_| {
            let indexer = GatedTextIndexer::new();
            let ctx = create_gated_test_context(indexer.clone())?;
            let collection = ctx.db().collection("test")?;
            insert_test_documents(&collection)?;

            collection.create_index("body", Some(IndexOptions::async_of(IndexKind::Fulltext)))?;
            awaitility::at_most(Duration::from_secs(10))
                .until(|| collection.is_indexing("body").unwrap_or(false));

            // reads are not blocked by the pending build
            assert_eq!(collection.find(field("age").gt(30))?.size(), 2);
            assert!(!collection.is_indexing("age")?);

            indexer.open();
            awaitility::at_most(Duration::from_secs(10))
                .until(|| !collection.is_indexing("body").unwrap_or(true));
            collection.create_index("age", None)?;
            assert_eq!(collection.list_indices()?.len(), 2);

            cleanup(ctx)
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_failed_async_build_is_reported() {
    run_test(
        || create_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            insert_test_documents(&collection)?;

            collection.create_index("last_name", Some(IndexOptions::async_of(IndexKind::Unique)))?;
            awaitility::at_most(Duration::from_secs(10))
                .until(|| !collection.is_indexing("last_name").unwrap_or(true));

            let state = collection.index_status("last_name")?.expect("failed entry");
            assert!(state.is_failed());
            assert_eq!(
                state.failure().map(|cause| cause.kind().clone()),
                Some(ErrorKind::UniqueConstraintViolation)
            );
            assert!(!collection.has_index("last_name")?);
            assert_eq!(collection.list_indices()?.len(), 1);

            // queries scan, and a new index replaces the failed entry
            assert_eq!(collection.find(field("last_name").eq("ln2"))?.size(), 2);
            collection.create_index("last_name", None)?;
            assert_eq!(collection.index_status("last_name")?, Some(BuildState::Built));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_drop_during_async_value_build() {
    run_test(
        || create_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            let documents: Vec<Document> = (0..20_000).map(|i| doc! { n: i }).collect();
            collection.insert_many(documents)?;

            collection.create_index("n", Some(IndexOptions::async_of(IndexKind::NonUnique)))?;
            collection.drop_index("n")?;
            assert!(!collection.is_indexing("n")?);

            // give the cancelled build time to finish; it must not come back
            thread::sleep(Duration::from_millis(200));
            assert!(!collection.has_index("n")?);
            assert!(collection.list_indices()?.is_empty());
            assert_eq!(collection.index_status("n")?, None);

            collection.create_index("n", Some(index_options(IndexKind::Unique)))?;
            let indices = collection.list_indices()?;
            assert_eq!(indices.len(), 1);
            assert_eq!(indices[0].kind(), IndexKind::Unique);
            assert_eq!(collection.index_status("n")?, Some(BuildState::Built));
            assert_eq!(collection.find(field("n").gte(19_990))?.size(), 10);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_drop_during_async_text_build() {
    run_test(
        || create_test_context(),
        |_| {
            let indexer = GatedTextIndexer::new();
            let ctx = create_gated_test_context(indexer.clone())?;
            let collection = ctx.db().collection("test")?;
            insert_test_documents(&collection)?;

            collection.create_index("body", Some(IndexOptions::async_of(IndexKind::Fulltext)))?;
            awaitility::at_most(Duration::from_secs(10))
                .until(|| collection.is_indexing("body").unwrap_or(false));

            // the drop waits for the running build to release the collection
            let gate = indexer.clone();
            let opener = thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                gate.open();
            });
            collection.drop_index("body")?;
            opener.join().expect("gate opener");

            awaitility::at_most(Duration::from_secs(10))
                .until(|| !collection.is_indexing("body").unwrap_or(true));
            assert!(!collection.has_index("body")?);
            assert!(collection.list_indices()?.is_empty());
            let err = collection.find(field("body").text("quick")).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::FilterError);

            collection.create_index("body", Some(index_options(IndexKind::Fulltext)))?;
            assert_eq!(collection.index_status("body")?, Some(BuildState::Built));
            assert_eq!(collection.find(field("body").text("quick"))?.size(), 2);

            cleanup(ctx)
        },
        |ctx| cleanup(ctx),
    )
}
