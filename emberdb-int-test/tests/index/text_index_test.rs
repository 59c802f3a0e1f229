use emberdb::doc;
use emberdb::errors::ErrorKind;
use emberdb::filter::field;
use emberdb::index::{index_options, IndexKind};
use emberdb_int_test::test_util::{
    cleanup, create_test_context, create_text_test_context, insert_test_documents, run_test,
};

#[test]
fn test_text_search() {
    run_test(
        || create_text_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            insert_test_documents(&collection)?;
            collection.create_index("body", Some(index_options(IndexKind::Fulltext)))?;

            assert_eq!(collection.find(field("body").text("quick"))?.size(), 2);
            assert_eq!(collection.find(field("body").text("QUICK"))?.size(), 2);
            assert_eq!(collection.find(field("body").text("lorem"))?.size(), 1);
            // terms are or-ed
            assert_eq!(collection.find(field("body").text("fox ipsum"))?.size(), 2);
            // stop words are not indexed
            assert_eq!(collection.find(field("body").text("the"))?.size(), 0);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_text_search_with_wildcards() {
    run_test(
        || create_text_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            insert_test_documents(&collection)?;
            collection.create_index("body", Some(index_options(IndexKind::Fulltext)))?;

            assert_eq!(collection.find(field("body").text("qui*"))?.size(), 2);
            assert_eq!(collection.find(field("body").text("*orld"))?.size(), 1);
            assert_eq!(collection.find(field("body").text("*ips*"))?.size(), 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_text_index_follows_writes() {
    run_test(
        || create_text_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.create_index("body", Some(index_options(IndexKind::Fulltext)))?;

            let id = collection.insert(doc! { body: "embedded stores are small" })?;
            assert_eq!(collection.find(field("body").text("embedded"))?.size(), 1);

            collection.update_by_id(id, &doc! { body: "tiny databases" })?;
            assert_eq!(collection.find(field("body").text("embedded"))?.size(), 0);
            assert_eq!(collection.find(field("body").text("databases"))?.size(), 1);

            collection.remove(field("body").text("tiny"))?;
            assert_eq!(collection.find(field("body").text("databases"))?.size(), 0);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_text_filter_combined_with_value_filter() {
    run_test(
        || create_text_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            insert_test_documents(&collection)?;
            collection.create_index("body", Some(index_options(IndexKind::Fulltext)))?;

            let filter = field("body").text("quick").and(field("age").gt(30));
            let docs = collection.find(filter)?.to_vec()?;
            assert_eq!(docs.len(), 1);
            assert_eq!(docs[0].get("first_name")?, Some(emberdb::common::Value::from("fn1")));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_dropped_text_index_cannot_be_searched() {
    run_test(
        || create_text_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            insert_test_documents(&collection)?;
            collection.create_index("body", Some(index_options(IndexKind::Fulltext)))?;
            collection.drop_index("body")?;

            let err = collection.find(field("body").text("quick")).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::FilterError);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_text_search_without_configured_indexer() {
    run_test(
        || create_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            insert_test_documents(&collection)?;
            collection.create_index("body", Some(index_options(IndexKind::Fulltext)))?;

            let err = collection.find(field("body").text("quick")).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::FilterError);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
