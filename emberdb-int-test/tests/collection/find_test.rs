use emberdb::collection::{order_by, skip_by, FindOptions};
use emberdb::common::{SortOrder, Value};
use emberdb::doc;
use emberdb::filter::{all, and, by_id, field, or};
use emberdb_int_test::test_util::{
    cleanup, create_test_context, insert_test_documents, is_sorted, run_test,
};

#[test]
fn test_find_all() {
    run_test(
        || create_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            let ids = insert_test_documents(&collection)?;

            let cursor = collection.find(all())?;
            assert_eq!(cursor.size(), 3);
            assert_eq!(cursor.total_count(), 3);
            assert!(!cursor.has_more());
            assert_eq!(cursor.ids(), ids.as_slice());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_find_by_equality_and_comparison() {
    run_test(
        || create_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            insert_test_documents(&collection)?;

            assert_eq!(collection.find(field("last_name").eq("ln2"))?.size(), 2);
            assert_eq!(collection.find(field("age").gt(30))?.size(), 2);
            assert_eq!(collection.find(field("age").gte(47))?.size(), 1);
            assert_eq!(collection.find(field("age").lt(24))?.size(), 0);
            assert_eq!(collection.find(field("age").lte(31.0))?.size(), 2);
            assert_eq!(collection.find(field("age").between(24, 31))?.size(), 2);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_find_on_nested_fields_and_arrays() {
    run_test(
        || create_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            insert_test_documents(&collection)?;

            let cursor = collection.find(field("address.city").eq("Oslo"))?;
            let doc = cursor.first()?.expect("one match");
            assert_eq!(doc.get("first_name")?, Some(Value::from("fn2")));

            assert_eq!(collection.find(field("arr.0").eq(9))?.size(), 1);
            assert_eq!(collection.find(field("list.1").eq("two"))?.size(), 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_find_with_regex() {
    run_test(
        || create_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            insert_test_documents(&collection)?;

            assert_eq!(collection.find(field("body").regex("^quick"))?.size(), 1);
            assert_eq!(collection.find(field("body").regex("quick"))?.size(), 2);
            assert_eq!(collection.find(field("first_name").regex("fn[12]"))?.size(), 2);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_find_with_combinators() {
    run_test(
        || create_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            insert_test_documents(&collection)?;

            let filter = and(vec![field("last_name").eq("ln2"), field("age").gt(30)]);
            assert_eq!(collection.find(filter)?.size(), 1);

            let filter = or(vec![field("first_name").eq("fn1"), field("age").gt(40)]);
            assert_eq!(collection.find(filter)?.size(), 2);

            let filter = field("first_name").eq("fn1").or(all());
            assert_eq!(collection.find(filter)?.size(), 3);

            let filter = field("age").in_values(vec![24, 47, 99]);
            assert_eq!(collection.find(filter)?.size(), 2);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_find_by_id() {
    run_test(
        || create_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            let ids = insert_test_documents(&collection)?;

            let cursor = collection.find(by_id(ids[1]))?;
            assert_eq!(cursor.ids(), &[ids[1]]);
            assert_eq!(
                cursor.first()?.and_then(|d| d.id()),
                Some(ids[1])
            );
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_find_null_and_absent_fields() {
    run_test(
        || create_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            collection.insert(doc! { name: "a", age: 25 })?;
            collection.insert(doc! { name: "b", age: (Value::Null) })?;
            collection.insert(doc! { name: "c" })?;

            // only a present null matches
            let cursor = collection.find(field("age").eq(Value::Null))?;
            assert_eq!(cursor.size(), 1);
            assert_eq!(cursor.first()?.and_then(|d| d.get("name").ok().flatten()), Some(Value::from("b")));

            assert_eq!(collection.find(field("age").gte(0))?.size(), 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_find_with_pagination() {
    run_test(
        || create_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            for i in 0..10 {
                collection.insert(doc! { n: i })?;
            }

            let cursor = collection.find_with_options(all(), &skip_by(0).limit(4))?;
            assert_eq!(cursor.size(), 4);
            assert_eq!(cursor.total_count(), 10);
            assert!(cursor.has_more());

            // a window running past the end yields the remainder
            let cursor = collection.find_with_options(all(), &skip_by(7).limit(5))?;
            assert_eq!(cursor.size(), 3);
            assert_eq!(cursor.total_count(), 10);
            assert!(!cursor.has_more());

            let cursor = collection.find_with_options(all(), &skip_by(10))?;
            assert_eq!(cursor.size(), 0);
            assert!(!cursor.has_more());

            let cursor = collection.find_with_options(all(), &FindOptions::new().limit(0))?;
            assert_eq!(cursor.size(), 0);
            assert!(cursor.has_more());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_find_with_sort() {
    run_test(
        || create_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            insert_test_documents(&collection)?;

            let ages = |order| -> emberdb::errors::EmberResult<Vec<i64>> {
                let cursor = collection.find_with_options(all(), &order_by("age", order))?;
                Ok(cursor
                    .to_vec()?
                    .iter()
                    .filter_map(|d| d.get("age").ok().flatten().and_then(|v| v.as_i64()))
                    .collect())
            };

            let ascending = ages(SortOrder::Ascending)?;
            assert_eq!(ascending, vec![24, 31, 47]);
            assert!(is_sorted(ascending, true));

            let descending = ages(SortOrder::Descending)?;
            assert!(is_sorted(descending, false));

            // indexed order is the same as the scan order
            collection.create_index("age", None)?;
            assert_eq!(ages(SortOrder::Ascending)?, vec![24, 31, 47]);
            assert_eq!(ages(SortOrder::Descending)?, vec![47, 31, 24]);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_find_with_sort_and_window() {
    run_test(
        || create_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            for name in ["d", "b", "e", "a", "c"] {
                collection.insert(doc! { name: name })?;
            }

            let options = order_by("name", SortOrder::Ascending).skip(1).limit(2);
            let names: Vec<Value> = collection
                .find_with_options(all(), &options)?
                .to_vec()?
                .iter()
                .filter_map(|d| d.get("name").ok().flatten())
                .collect();
            assert_eq!(names, vec![Value::from("b"), Value::from("c")]);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
