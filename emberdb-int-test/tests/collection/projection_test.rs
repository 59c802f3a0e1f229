use emberdb::collection::skip_by;
use emberdb::common::Value;
use emberdb::doc;
use emberdb::errors::ErrorKind;
use emberdb::filter::{all, field};
use emberdb_int_test::test_util::{cleanup, create_test_context, insert_test_documents, run_test};

#[test]
fn test_project_top_level_and_nested_fields() {
    run_test(
        || create_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            insert_test_documents(&collection)?;

            let shape = doc! {
                _id: (Value::Null),
                first_name: (Value::Null),
                address: { city: (Value::Null) },
            };
            let projected = collection.find(field("age").lt(40))?.project(&shape)?;
            assert_eq!(projected.size(), 2);

            let docs = projected.to_vec()?;
            let first = &docs[0];
            assert_eq!(first.get("first_name")?, Some(Value::from("fn1")));
            assert_eq!(first.get("address.city")?, Some(Value::from("Paris")));
            assert_eq!(first.get("address.zip")?, None);
            assert_eq!(first.get("age")?, None);
            assert!(first.id().is_some());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_project_skips_absent_fields() {
    run_test(
        || create_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            insert_test_documents(&collection)?;

            let shape = doc! { list: (Value::Null) };
            let docs = collection.find(field("first_name").eq("fn3"))?.project(&shape)?.to_vec()?;
            assert_eq!(docs.len(), 1);
            assert!(!docs[0].contains_key("list"));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_invalid_projection_shapes() {
    run_test(
        || create_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            insert_test_documents(&collection)?;
            let cursor = collection.find(all())?;

            for shape in [doc! {}, doc! { name: 1 }, doc! { address: {} }] {
                let err = cursor.project(&shape).err().expect("invalid shape");
                assert_eq!(err.kind(), &ErrorKind::ValidationError);
            }
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_projected_cursor_is_read_only() {
    run_test(
        || create_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            insert_test_documents(&collection)?;

            let projected = collection.find(all())?.project(&doc! { age: (Value::Null) })?;
            for _ in 0..2 {
                let mut iter = projected.iter();
                assert!(iter.next().is_some());
                assert_eq!(iter.remove().unwrap_err().kind(), &ErrorKind::InvalidOperation);
            }
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_projected_cursor_metadata_and_debug() {
    run_test(
        || create_test_context(),
        |ctx| {
            let collection = ctx.db().collection("test")?;
            insert_test_documents(&collection)?;

            let shape = doc! { first_name: (Value::Null) };
            let projected = collection
                .find_with_options(all(), &skip_by(1).limit(1))?
                .project(&shape)?;
            assert_eq!(projected.size(), 1);
            assert_eq!(projected.total_count(), 3);
            assert!(projected.has_more());
            assert_eq!(
                projected.first()?.and_then(|d| d.get("first_name").ok().flatten()),
                Some(Value::from("fn2"))
            );

            assert_eq!(
                format!("{:?}", projected),
                "ProjectedCursor { size: 1, total_count: 3, has_more: true, paths: [\"first_name\"] }"
            );
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
