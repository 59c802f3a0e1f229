use emberdb::common::Value;
use emberdb::doc;
use emberdb::filter::field;
use emberdb::index::{index_options, BuildState, IndexKind, IndexOptions};
use emberdb_int_test::test_util::{cleanup, create_test_context, insert_test_documents, run_test};

#[test]
fn test_create_index_with_default_options() {
    run_test(
        || create_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            insert_test_documents(&collection)?;

            collection.create_index("last_name", None)?;
            assert!(collection.has_index("last_name")?);
            assert!(!collection.is_indexing("last_name")?);
            assert_eq!(collection.index_status("last_name")?, Some(BuildState::Built));

            let indices = collection.list_indices()?;
            assert_eq!(indices.len(), 1);
            assert_eq!(indices[0].field(), "last_name");
            assert_eq!(indices[0].kind(), IndexKind::NonUnique);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_list_indices_is_ordered_by_field() {
    run_test(
        || create_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            insert_test_documents(&collection)?;

            collection.create_index("last_name", None)?;
            collection.create_index("age", Some(index_options(IndexKind::Unique)))?;
            collection.create_index("address.city", None)?;

            let fields: Vec<String> = collection
                .list_indices()?
                .iter()
                .map(|index| index.field().to_string())
                .collect();
            assert_eq!(fields, vec!["address.city", "age", "last_name"]);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_index_on_nested_field_and_array_values() {
    run_test(
        || create_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            insert_test_documents(&collection)?;

            collection.create_index("address.city", None)?;
            assert_eq!(collection.find(field("address.city").eq("Paris"))?.size(), 1);
            assert_eq!(collection.find(field("address.city").gte("A"))?.size(), 2);

            collection.create_index("arr", None)?;
            let cursor = collection.find(field("arr").eq(Value::from_vec(vec![3, 4, 3])))?;
            assert_eq!(cursor.size(), 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_rebuild_index() {
    run_test(
        || create_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            insert_test_documents(&collection)?;
            collection.create_index("age", Some(index_options(IndexKind::Unique)))?;

            collection.rebuild_index("age", false)?;
            assert_eq!(collection.index_status("age")?, Some(BuildState::Built));
            assert_eq!(collection.list_indices()?[0].kind(), IndexKind::Unique);
            assert_eq!(collection.find(field("age").gt(30))?.size(), 2);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_drop_index() {
    run_test(
        || create_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            insert_test_documents(&collection)?;
            collection.create_index("age", None)?;
            collection.create_index("last_name", None)?;

            collection.drop_index("age")?;
            assert!(!collection.has_index("age")?);
            assert!(collection.has_index("last_name")?);
            assert_eq!(collection.index_status("age")?, None);

            // queries fall back to scanning
            assert_eq!(collection.find(field("age").gt(30))?.size(), 2);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_drop_all_indices_then_recreate() {
    run_test(
        || create_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            insert_test_documents(&collection)?;
            collection.create_index("first_name", Some(index_options(IndexKind::Unique)))?;
            collection.create_index("age", None)?;

            collection.drop_all_indices()?;
            assert!(collection.list_indices()?.is_empty());

            // the new index does not inherit the dropped one's kind or data
            collection.insert(doc! { first_name: "fn1" })?;
            collection.create_index("first_name", Some(IndexOptions::default()))?;
            assert_eq!(collection.list_indices()?[0].kind(), IndexKind::NonUnique);
            assert_eq!(collection.find(field("first_name").eq("fn1"))?.size(), 2);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_indexes_follow_writes() {
    run_test(
        || create_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.create_index("score", None)?;

            let a = collection.insert(doc! { score: 10 })?;
            collection.insert(doc! { score: 20 })?;
            collection.update_by_id(a, &doc! { score: 30 })?;
            assert_eq!(collection.find(field("score").gt(15))?.size(), 2);
            assert_eq!(collection.find(field("score").eq(10))?.size(), 0);

            collection.remove(field("score").eq(20))?;
            assert_eq!(collection.find(field("score").gte(0))?.ids(), &[a]);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
