use ttime::db;
use ttime::pipeline::window::retrieve_in_window;
use ttime::types::FeedbackMetadata;
use ttime::vector::local::LocalIndex;
use ttime::vector::{IndexedFeedback, MetadataFilter, TimeRange, VectorIndex};

fn item(id: &str, values: Vec<f32>, timestamp: i64, label: &str) -> IndexedFeedback {
    IndexedFeedback {
        id: id.into(),
        values,
        metadata: FeedbackMetadata {
            text: Some(format!("feedback {id}")),
            timestamp: Some(timestamp),
            source_platform: Some("reddit".into()),
            sentiment_label: Some(label.into()),
            ..Default::default()
        },
    }
}

#[tokio::test]
async fn vectors_survive_reopening_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("feedback.db");

    {
        let index = LocalIndex::open(&path).unwrap();
        let written = index
            .upsert(vec![
                item("a", vec![1.0, 0.0], 100, "positive"),
                item("b", vec![0.0, 1.0], 200, "negative"),
            ])
            .await
            .unwrap();
        assert_eq!(written, 2);
    }

    let index = LocalIndex::open(&path).unwrap();
    assert_eq!(index.count().await.unwrap(), 2);
    let records = index.query(&[0.0, 1.0], 1, None).await.unwrap();
    assert_eq!(records[0].id, "b");
    assert_eq!(records[0].metadata.text.as_deref(), Some("feedback b"));
}

#[tokio::test]
async fn sentiment_label_filter() {
    let index = LocalIndex::in_memory().unwrap();
    index
        .upsert(vec![
            item("a", vec![1.0, 0.0], 100, "positive"),
            item("b", vec![0.9, 0.1], 200, "negative"),
        ])
        .await
        .unwrap();

    let filter = MetadataFilter {
        sentiment_label: Some("negative".into()),
        ..Default::default()
    };
    let records = index.query(&[1.0, 0.0], 10, Some(&filter)).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "b");
}

#[tokio::test]
async fn windowed_retrieval_against_sqlite() {
    let index = LocalIndex::in_memory().unwrap();
    index
        .upsert(vec![
            item("early", vec![1.0, 0.0], 100, "neutral"),
            item("late", vec![0.8, 0.2], 5_000, "neutral"),
        ])
        .await
        .unwrap();

    let records = retrieve_in_window(&index, &[1.0, 0.0], 10, TimeRange::new(1_000, 9_000)).await;
    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["late"]);

    let none = retrieve_in_window(&index, &[1.0, 0.0], 10, TimeRange::new(10_000, 20_000)).await;
    assert!(none.is_empty());
}

#[test]
fn schema_records_embedding_model() {
    let dir = tempfile::tempdir().unwrap();
    let conn = db::open_database(dir.path().join("meta.db")).unwrap();
    assert_eq!(db::schema::embedding_model(&conn).unwrap(), None);
    db::schema::set_embedding_model(&conn, "e5-base-v2").unwrap();
    assert_eq!(
        db::schema::embedding_model(&conn).unwrap().as_deref(),
        Some("e5-base-v2")
    );
}
