use std::sync::Arc;

use index::{IndexAdmin, InMemoryStore, Metadata, Namespace, VectorIndex};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), index::IndexError> {
    let store = Arc::new(InMemoryStore::new("demo").with_dimension(4));
    let index = VectorIndex::new(store.clone()).with_dimension(Some(4));
    let admin = IndexAdmin::new(store);
    let ns = Namespace::new("guides");

    let metadata: Vec<Metadata> = [json!({"source": "guide.md"}), json!({"source": "faq.md"})]
        .into_iter()
        .filter_map(|value| value.as_object().cloned())
        .collect();

    let summary = index
        .upsert_chunks(
            vec!["doc-1".into(), "doc-2".into()],
            vec![vec![0.9, 0.1, 0.0, 0.2], vec![0.1, 0.8, 0.3, 0.0]],
            Some(metadata),
            &ns,
        )
        .await?;
    println!("Upserted {} vectors into {}.", summary.upserted_count, summary.namespace);

    let hits = index
        .query(
            vec![0.8, 0.2, 0.0, 0.1],
            2,
            Some(json!({"source": {"$in": ["guide.md", "faq.md"]}})),
            &ns,
        )
        .await?;
    println!("Hits: {hits:#?}");

    println!("Namespaces: {:?}", admin.list_namespaces().await?);
    println!("Health: {:?}", admin.verify_connection().await);
    Ok(())
}
