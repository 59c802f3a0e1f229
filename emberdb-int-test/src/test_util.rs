use emberdb::collection::{Collection, DocId, Document};
use emberdb::doc;
use emberdb::ember::EmberDb;
use emberdb::errors::EmberResult;
use emberdb::index::{InMemoryTextIndexer, TextIndexer};
use std::backtrace::Backtrace;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Runs a test with retry logic and error handling.
/// `after` runs whether the test body succeeds or fails.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> EmberResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> EmberResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> EmberResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    const MAX_RETRIES: u32 = 3;
    let mut last_error: Option<String> = None;
    let mut last_backtrace: Option<String> = None;

    for attempt in 1..=MAX_RETRIES {
        let start_time = Instant::now();

        let result = std::panic::catch_unwind(|| {
            let backtrace = Backtrace::capture();
            match before() {
                Ok(ctx) => match test(ctx.clone()) {
                    Ok(_) => after(ctx)
                        .map_err(|e| (format!("After run failed: {:?}", e), backtrace.to_string())),
                    Err(e) => {
                        let _ = after(ctx);
                        Err((format!("Test failed: {:?}", e), backtrace.to_string()))
                    }
                },
                Err(e) => Err((format!("Before run failed: {:?}", e), backtrace.to_string())),
            }
        });

        let elapsed = start_time.elapsed();

        match result {
            Ok(Ok(_)) => return,
            Ok(Err((e, bt))) => {
                eprintln!(
                    "\n========== Test Attempt {}/{} Failed (took {:?}) ==========",
                    attempt, MAX_RETRIES, elapsed
                );
                eprintln!("Error: {}", e);
                last_error = Some(e);
                last_backtrace = Some(bt);
            }
            Err(panic_err) => {
                let err_msg = if let Some(s) = panic_err.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_err.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                eprintln!(
                    "\n========== Test Attempt {}/{} Panicked (took {:?}) ==========",
                    attempt, MAX_RETRIES, elapsed
                );
                eprintln!("Panic: {}", err_msg);
                last_error = Some(format!("Panic: {}", err_msg));
                last_backtrace = Some(Backtrace::capture().to_string());
            }
        }

        if attempt < MAX_RETRIES {
            eprintln!("Retrying in {}ms...\n", 100 * attempt);
            thread::sleep(Duration::from_millis(100 * attempt as u64));
        }
    }

    eprintln!("\n==================== TEST FAILED ====================");
    eprintln!("Failed after {} attempts", MAX_RETRIES);
    eprintln!("Last error: {}", last_error.as_deref().unwrap_or("Unknown"));
    if let Some(bt) = &last_backtrace {
        if !bt.is_empty() && !bt.contains("disabled") {
            eprintln!("\nBacktrace:\n{}", bt);
        }
    }
    eprintln!("=====================================================\n");

    panic!(
        "Test failed after {} attempts. Last error: {}",
        MAX_RETRIES,
        last_error.unwrap_or_default()
    );
}

#[derive(Clone)]
pub struct TestContext {
    db: EmberDb,
}

impl TestContext {
    pub fn new(db: EmberDb) -> Self {
        Self { db }
    }

    pub fn db(&self) -> EmberDb {
        self.db.clone()
    }
}

pub fn create_test_context() -> EmberResult<TestContext> {
    let db = EmberDb::builder().build_workers(2).open()?;
    Ok(TestContext::new(db))
}

/// A context whose collections carry an in-memory full-text index.
pub fn create_text_test_context() -> EmberResult<TestContext> {
    let db = EmberDb::builder()
        .build_workers(2)
        .in_memory_text_index()
        .open()?;
    Ok(TestContext::new(db))
}

pub fn cleanup(ctx: TestContext) -> EmberResult<()> {
    ctx.db().close()
}

pub fn create_test_docs() -> Vec<Document> {
    let doc1 = doc! {
        first_name: "fn1",
        last_name: "ln1",
        age: 31,
        data: (emberdb::common::Value::bytes(vec![1u8, 2u8, 3u8])),
        arr: [1, 2, 3],
        list: ["one", "two", "three"],
        address: { city: "Paris", zip: 75001 },
        body: "a quick brown fox jump over the lazy dog",
    };

    let doc2 = doc! {
        first_name: "fn2",
        last_name: "ln2",
        age: 24,
        data: (emberdb::common::Value::bytes(vec![3u8, 4u8, 3u8])),
        arr: [3, 4, 3],
        list: ["three", "four", "five"],
        address: { city: "Oslo", zip: 150 },
        body: "quick hello world from ember",
    };

    let doc3 = doc! {
        first_name: "fn3",
        last_name: "ln2",
        age: 47,
        data: (emberdb::common::Value::bytes(vec![9u8, 4u8, 8u8])),
        arr: [9, 4, 8],
        body: "Lorem ipsum dolor sit amet, consectetur \
        adipiscing elit. Sed nunc mi, mattis ullamcorper \
        dignissim vitae, condimentum non lorem.",
    };

    vec![doc1, doc2, doc3]
}

pub fn insert_test_documents(collection: &Collection) -> EmberResult<Vec<DocId>> {
    collection.insert_many(create_test_docs())
}

pub fn is_sorted<T: Ord>(iterable: impl IntoIterator<Item = T>, ascending: bool) -> bool {
    let mut iter = iterable.into_iter();
    if let Some(mut prev) = iter.next() {
        for current in iter {
            if ascending {
                if prev > current {
                    return false;
                }
            } else if prev < current {
                return false;
            }
            prev = current;
        }
    }
    true
}

/// An in-memory text indexer whose builds wait until [GatedTextIndexer::open]
/// is called. Lets tests observe an index while it is still building.
#[derive(Clone, Default)]
pub struct GatedTextIndexer {
    delegate: InMemoryTextIndexer,
    released: Arc<AtomicBool>,
}

impl GatedTextIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

impl TextIndexer for GatedTextIndexer {
    fn build(
        &self,
        field: &str,
        documents: &mut dyn Iterator<Item = (DocId, Document)>,
    ) -> EmberResult<()> {
        while !self.released.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(5));
        }
        self.delegate.build(field, documents)
    }

    fn write(&self, field: &str, id: DocId, document: &Document) -> EmberResult<()> {
        self.delegate.write(field, id, document)
    }

    fn remove(&self, field: &str, id: DocId, document: &Document) -> EmberResult<()> {
        self.delegate.remove(field, id, document)
    }

    fn search(&self, field: &str, query: &str) -> EmberResult<BTreeSet<DocId>> {
        self.delegate.search(field, query)
    }

    fn drop_index(&self, field: &str) -> EmberResult<()> {
        self.delegate.drop_index(field)
    }
}

/// A context whose collections all share `indexer`.
pub fn create_gated_test_context(indexer: GatedTextIndexer) -> EmberResult<TestContext> {
    let db = EmberDb::builder()
        .build_workers(2)
        .text_indexer(move |_| Arc::new(indexer.clone()) as Arc<dyn TextIndexer>)
        .open()?;
    Ok(TestContext::new(db))
}
