//! Tests for the retrieval answer source: one ingestion per document no matter
//! how many callers race for it, retry after failure, and reset.

#[cfg(test)]
mod tests {
    use crate::answer_source::AnswerSource;
    use crate::single_flight::FlightStatus;
    use crate::tests::support::*;
    use futures::future::join_all;
    use inquest_core::AppError;
    use inquest_knowledge::{VectorIndex, VectorStore};
    use std::time::Duration;

    #[tokio::test]
    async fn test_concurrent_asks_ingest_once() {
        let fixture = retrieval_fixture(CountingLoader::new(Duration::from_millis(50), 0), None);

        let asks = (0..5).map(|_| fixture.source.ask("Where was the key kept?"));
        let answers = join_all(asks).await;

        assert!(answers.iter().all(|a| a.is_ok()));
        assert_eq!(fixture.loader.loads(), 1);
        assert_eq!(fixture.source.ingestion_status().unwrap(), FlightStatus::Done);

        // One add of the three chunks, embedded in a single batch
        let collection = fixture.store.create_or_connect("case").await.unwrap();
        assert_eq!(collection.count().await.unwrap(), 3);
        let batches = fixture.embeddings.batches();
        assert_eq!(batches.iter().filter(|&&n| n == 3).count(), 1);
        // The rest are the five query embeddings
        assert_eq!(batches.iter().sum::<usize>(), 3 + 5);
    }

    #[tokio::test]
    async fn test_concurrent_waiters_share_a_failure() {
        let fixture = retrieval_fixture(CountingLoader::new(Duration::from_millis(50), 1), None);

        let answers = join_all((0..3).map(|_| fixture.source.ask("Where?"))).await;

        assert!(answers
            .iter()
            .all(|a| matches!(a, Err(AppError::Ingestion(_)))));
        assert_eq!(fixture.loader.loads(), 1);
    }

    #[tokio::test]
    async fn test_failed_ingestion_is_retried() {
        let fixture = retrieval_fixture(CountingLoader::new(Duration::ZERO, 1), None);

        let err = fixture.source.ask("Where was the key kept?").await.unwrap_err();
        assert!(matches!(err, AppError::Ingestion(msg) if msg.contains("503")));
        assert_eq!(
            fixture.source.ingestion_status().unwrap(),
            FlightStatus::NotStarted
        );

        fixture.source.ask("Where was the key kept?").await.unwrap();
        assert_eq!(fixture.loader.loads(), 2);

        // Success is cached
        fixture.source.ask("Who had the key?").await.unwrap();
        assert_eq!(fixture.loader.loads(), 2);
    }

    #[tokio::test]
    async fn test_reset_chat_clears_collection_and_reingests() {
        let fixture = retrieval_fixture(CountingLoader::new(Duration::ZERO, 0), None);
        let collection = fixture.store.create_or_connect("case").await.unwrap();

        fixture.source.ask("Where was the key kept?").await.unwrap();
        assert_eq!(collection.count().await.unwrap(), 3);

        fixture.source.reset_chat().await.unwrap();
        assert_eq!(collection.count().await.unwrap(), 0);
        assert_eq!(
            fixture.source.ingestion_status().unwrap(),
            FlightStatus::NotStarted
        );

        fixture.source.ask("Where was the key kept?").await.unwrap();
        assert_eq!(fixture.loader.loads(), 2);
        assert_eq!(collection.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_reset_before_first_ask_is_a_no_op() {
        let fixture = retrieval_fixture(CountingLoader::new(Duration::ZERO, 0), None);
        fixture.source.reset_chat().await.unwrap();
        assert_eq!(fixture.loader.loads(), 0);
    }

    #[tokio::test]
    async fn test_answer_is_synthesized_from_relevant_excerpts() {
        let fixture = retrieval_fixture(CountingLoader::new(Duration::ZERO, 0), None);
        fixture
            .generator
            .questions
            .lock()
            .unwrap()
            .push_back(Ok("  I kept it on the kitchen hook.  ".to_string()));

        let answer = fixture
            .source
            .ask("Where did the gardener keep the key?")
            .await
            .unwrap();
        assert_eq!(answer, "I kept it on the kitchen hook.");

        let requests = fixture.generator.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.model, "test-model");
        assert_eq!(request.temperature, Some(0.2));
        assert!(request.prompt.contains("[Excerpt 1]"));
        assert!(request.prompt.contains("hook in the kitchen"));
        assert!(request.prompt.contains("Where did the gardener keep the key?"));
        assert!(request.system.as_deref().unwrap().contains("first person"));
    }

    #[tokio::test]
    async fn test_no_relevant_chunks_answers_without_generator() {
        let fixture = retrieval_fixture(CountingLoader::new(Duration::ZERO, 0), Some(0.99));

        let answer = fixture.source.ask("Quantum chromodynamics lectures").await.unwrap();

        assert_eq!(answer, catalog().pack().no_information_answer);
        assert!(fixture.generator.requests.lock().unwrap().is_empty());
    }
}
