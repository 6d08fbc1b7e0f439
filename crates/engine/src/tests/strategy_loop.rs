//! Tests for the interrogation loop: strategy cycle, follow-ups, the stuck
//! override, cancellation and error handling.

#[cfg(test)]
mod tests {
    use crate::progress::{NoProgress, ProgressSink};
    use crate::strategy::Strategy;
    use crate::tests::support::*;
    use crate::types::{ProgressEvent, RunStatus};
    use inquest_core::{AppError, AppResult};
    use std::sync::{Arc, Mutex};
    use tokio_util::sync::CancellationToken;

    const HYPOTHESIS: &str = "the missing ledger";

    fn strategies(outcome: &crate::types::InterrogationOutcome) -> Vec<Strategy> {
        outcome.turns.iter().map(|t| t.strategy).collect()
    }

    #[tokio::test]
    async fn test_full_cycle_completes_at_initial_strategy() {
        let source = ScriptedSource::neutral();
        let outcome = offline(Strategy::BroadOverview)
            .interrogate(HYPOTHESIS, &source, 10, &CancellationToken::new(), &NoProgress)
            .await
            .unwrap();

        assert_eq!(outcome.status, RunStatus::Completed);
        assert_eq!(outcome.iterations, 4);
        assert_eq!(strategies(&outcome), Strategy::ORDER.to_vec());
        assert_eq!(outcome.final_strategy, Strategy::Timeline);

        // Offline questions come from the fallback templates
        let catalog = catalog();
        for (turn, question) in outcome.turns.iter().zip(source.asked()) {
            assert_eq!(
                question,
                catalog
                    .fallback_question(turn.strategy.as_str(), HYPOTHESIS)
                    .unwrap()
            );
        }
    }

    #[tokio::test]
    async fn test_cycle_starts_at_configured_strategy() {
        let source = ScriptedSource::neutral();
        let outcome = offline(Strategy::FactCheck)
            .interrogate(HYPOTHESIS, &source, 10, &CancellationToken::new(), &NoProgress)
            .await
            .unwrap();

        assert_eq!(
            strategies(&outcome),
            vec![
                Strategy::FactCheck,
                Strategy::Timeline,
                Strategy::BroadOverview,
                Strategy::DeepDive
            ]
        );
        assert_eq!(outcome.status, RunStatus::Completed);
    }

    #[tokio::test]
    async fn test_follow_up_is_asked_before_switching() {
        let source = ScriptedSource::new(&["He paid the invoice in cash.", NEUTRAL]);
        let outcome = offline(Strategy::BroadOverview)
            .interrogate(HYPOTHESIS, &source, 10, &CancellationToken::new(), &NoProgress)
            .await
            .unwrap();

        let asked = source.asked();
        assert_eq!(asked[1], "What were the amount and purpose of that transaction?");
        assert_eq!(outcome.turns[1].strategy, Strategy::BroadOverview);
        assert_eq!(outcome.turns[2].strategy, Strategy::DeepDive);
        assert_eq!(outcome.iterations, 5);
        assert_eq!(
            outcome.findings,
            vec!["The answer involves a financial transaction.".to_string()]
        );
    }

    #[tokio::test]
    async fn test_budget_exhaustion_is_limit_reached() {
        let events: Arc<Mutex<Vec<ProgressEvent>>> = Arc::default();
        let sink = {
            let events = events.clone();
            move |e: &ProgressEvent| events.lock().unwrap().push(e.clone())
        };
        let source = ScriptedSource::neutral();

        let outcome = offline(Strategy::BroadOverview)
            .interrogate(HYPOTHESIS, &source, 2, &CancellationToken::new(), &sink)
            .await
            .unwrap();

        assert_eq!(outcome.status, RunStatus::LimitReached);
        assert_eq!(outcome.iterations, 2);

        let statuses: Vec<RunStatus> = events.lock().unwrap().iter().map(|e| e.status).collect();
        assert_eq!(statuses, vec![RunStatus::Running, RunStatus::LimitReached]);
    }

    #[tokio::test]
    async fn test_endless_follow_ups_stop_at_budget() {
        let source = ScriptedSource::new(&["We met at the office."]);
        let outcome = offline(Strategy::BroadOverview)
            .interrogate(HYPOTHESIS, &source, 5, &CancellationToken::new(), &NoProgress)
            .await
            .unwrap();

        assert_eq!(outcome.iterations, 5);
        assert!(outcome.turns.iter().all(|t| t.strategy == Strategy::BroadOverview));
        assert_eq!(outcome.status, RunStatus::LimitReached);
    }

    #[tokio::test]
    async fn test_events_match_turns() {
        let events: Arc<Mutex<Vec<ProgressEvent>>> = Arc::default();
        let sink = {
            let events = events.clone();
            move |e: &ProgressEvent| events.lock().unwrap().push(e.clone())
        };
        let source = ScriptedSource::neutral();
        let outcome = offline(Strategy::BroadOverview)
            .interrogate(HYPOTHESIS, &source, 10, &CancellationToken::new(), &sink)
            .await
            .unwrap();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), outcome.turns.len());
        for (i, (event, turn)) in events.iter().zip(&outcome.turns).enumerate() {
            assert_eq!(event.iteration, i + 1);
            assert_eq!(event.max_iterations, 10);
            assert_eq!(event.question, turn.question);
            assert_eq!(event.strategy, turn.strategy);
        }
        assert_eq!(events.last().unwrap().status, RunStatus::Completed);
    }

    #[tokio::test]
    async fn test_two_absent_answers_force_a_switch() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .analysis("FINDINGS:\n- Nothing about the key.\nFOLLOW-UPS:\n- Where was the key kept?")
                .analysis("FINDINGS:\n- Nothing about the key.\nFOLLOW-UPS:\n- Who else had a key?")
                .analysis("FINDINGS:\nFOLLOW-UPS:\n"),
        );
        let interrogator = offline(Strategy::BroadOverview).with_generator(generator.clone(), "m");
        let source = ScriptedSource::new(&["That is not mentioned in my content."]);

        let outcome = interrogator
            .interrogate("The key was hidden", &source, 3, &CancellationToken::new(), &NoProgress)
            .await
            .unwrap();

        let asked = source.asked();
        assert_eq!(asked[0], "Generated question 1?");
        assert_eq!(asked[1], "Where was the key kept?");
        // The pending follow-up is dropped after two absent answers
        assert_eq!(asked[2], "Generated question 2?");
        assert_eq!(
            strategies(&outcome),
            vec![Strategy::BroadOverview, Strategy::BroadOverview, Strategy::DeepDive]
        );
    }

    #[tokio::test]
    async fn test_absence_is_recognized_in_any_locale() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .analysis("FINDINGS:\nFOLLOW-UPS:\n- Onde estava a chave?")
                .analysis("FINDINGS:\nFOLLOW-UPS:\n- Quem tinha a chave?"),
        );
        let interrogator = offline(Strategy::BroadOverview).with_generator(generator, "m");
        let source = ScriptedSource::new(&["Não há informação sobre isso."]);

        let outcome = interrogator
            .interrogate("The key was hidden", &source, 3, &CancellationToken::new(), &NoProgress)
            .await
            .unwrap();

        assert_eq!(outcome.turns[2].strategy, Strategy::DeepDive);
    }

    #[tokio::test]
    async fn test_deep_dive_uses_question_hypothesis_verbatim() {
        let generator = Arc::new(ScriptedGenerator::new());
        let interrogator = offline(Strategy::DeepDive).with_generator(generator.clone(), "m");
        let source = ScriptedSource::neutral();

        interrogator
            .interrogate("  Where was the key kept?  ", &source, 1, &CancellationToken::new(), &NoProgress)
            .await
            .unwrap();

        assert_eq!(source.asked(), vec!["Where was the key kept?".to_string()]);
        assert_eq!(generator.question_calls(), 0);
    }

    #[tokio::test]
    async fn test_interrogative_opener_counts_as_question() {
        let source = ScriptedSource::neutral();
        offline(Strategy::DeepDive)
            .interrogate("Where was the key kept", &source, 1, &CancellationToken::new(), &NoProgress)
            .await
            .unwrap();

        assert_eq!(source.asked(), vec!["Where was the key kept".to_string()]);
    }

    #[tokio::test]
    async fn test_auxiliary_opener_without_question_mark_is_a_statement() {
        let source = ScriptedSource::neutral();
        offline(Strategy::DeepDive)
            .interrogate("Will Turner forged the ledger", &source, 1, &CancellationToken::new(), &NoProgress)
            .await
            .unwrap();

        assert_eq!(
            source.asked(),
            vec!["What are the specific details regarding Will Turner forged the ledger?".to_string()]
        );
    }

    #[tokio::test]
    async fn test_statement_hypothesis_is_not_used_verbatim() {
        let source = ScriptedSource::neutral();
        offline(Strategy::DeepDive)
            .interrogate("The shed was locked", &source, 1, &CancellationToken::new(), &NoProgress)
            .await
            .unwrap();

        assert_eq!(
            source.asked(),
            vec!["What are the specific details regarding The shed was locked?".to_string()]
        );
    }

    #[tokio::test]
    async fn test_generated_analysis_is_parsed() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .question("  \"Who held the key?\"  ")
                .analysis("**FINDINGS:**\n1. The gardener held the key.\nFOLLOW-UPS:\n- When was it last used?"),
        );
        let interrogator = offline(Strategy::BroadOverview).with_generator(generator.clone(), "m");
        let source = ScriptedSource::new(&["The gardener held it."]);

        let outcome = interrogator
            .interrogate(HYPOTHESIS, &source, 2, &CancellationToken::new(), &NoProgress)
            .await
            .unwrap();

        assert_eq!(source.asked(), vec!["Who held the key?", "When was it last used?"]);
        assert_eq!(outcome.turns[0].findings, vec!["The gardener held the key."]);

        let requests = generator.requests.lock().unwrap();
        assert_eq!(requests[0].temperature, Some(0.7));
        assert_eq!(requests[1].temperature, Some(0.2));
        assert!(requests[1].prompt.contains("The gardener held it."));
    }

    #[tokio::test]
    async fn test_unlabeled_analysis_falls_back_to_heuristics() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .question("   ")
                .analysis("The answer looks fine to me."),
        );
        let interrogator = offline(Strategy::BroadOverview).with_generator(generator, "m");
        let source = ScriptedSource::new(&["He paid the invoice."]);

        let outcome = interrogator
            .interrogate(HYPOTHESIS, &source, 1, &CancellationToken::new(), &NoProgress)
            .await
            .unwrap();

        // A blank generated question is replaced by the fallback
        assert_eq!(
            source.asked(),
            vec!["What can you tell me about the missing ledger?".to_string()]
        );
        assert_eq!(
            outcome.turns[0].follow_ups,
            vec!["What were the amount and purpose of that transaction?"]
        );
    }

    #[tokio::test]
    async fn test_cancel_after_k_iterations_keeps_k_turns() {
        let token = CancellationToken::new();
        let sink = {
            let token = token.clone();
            move |e: &ProgressEvent| {
                if e.iteration == 2 {
                    token.cancel();
                }
            }
        };
        let source = ScriptedSource::neutral();

        let outcome = offline(Strategy::BroadOverview)
            .interrogate(HYPOTHESIS, &source, 10, &token, &sink)
            .await
            .unwrap();

        assert_eq!(outcome.status, RunStatus::Cancelled);
        assert_eq!(outcome.turns.len(), 2);
        assert_eq!(source.asked().len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_asks_nothing() {
        let token = CancellationToken::new();
        token.cancel();
        let source = ScriptedSource::neutral();

        let outcome = offline(Strategy::BroadOverview)
            .interrogate(HYPOTHESIS, &source, 10, &token, &NoProgress)
            .await
            .unwrap();

        assert_eq!(outcome.status, RunStatus::Cancelled);
        assert!(outcome.turns.is_empty());
        assert!(source.asked().is_empty());
    }

    #[tokio::test]
    async fn test_zero_budget_is_config_error() {
        let result = offline(Strategy::BroadOverview)
            .interrogate(HYPOTHESIS, &ScriptedSource::neutral(), 0, &CancellationToken::new(), &NoProgress)
            .await;
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_source_transport_error_ends_the_run() {
        let source = ScriptedSource::failing_at(&[NEUTRAL], AppError::transport_status(503, "down"));
        let err = offline(Strategy::BroadOverview)
            .interrogate(HYPOTHESIS, &source, 10, &CancellationToken::new(), &NoProgress)
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(503));
        assert_eq!(source.asked().len(), 2);
    }

    #[tokio::test]
    async fn test_generator_failure_is_fatal() {
        let generator = Arc::new(
            ScriptedGenerator::new().failing_analysis(AppError::Unauthorized("bad key".to_string())),
        );
        let interrogator = offline(Strategy::BroadOverview).with_generator(generator, "m");

        let err = interrogator
            .interrogate(HYPOTHESIS, &ScriptedSource::neutral(), 10, &CancellationToken::new(), &NoProgress)
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
    }

    struct BrokenSink;

    impl ProgressSink for BrokenSink {
        fn deliver(&self, _event: &ProgressEvent) -> AppResult<()> {
            Err(AppError::Other("display closed".to_string()))
        }
    }

    #[tokio::test]
    async fn test_failing_progress_sink_does_not_abort() {
        let outcome = offline(Strategy::BroadOverview)
            .interrogate(HYPOTHESIS, &ScriptedSource::neutral(), 10, &CancellationToken::new(), &BrokenSink)
            .await
            .unwrap();

        assert_eq!(outcome.status, RunStatus::Completed);
        assert_eq!(outcome.iterations, 4);
    }

    #[tokio::test]
    async fn test_runs_share_no_state() {
        let interrogator = offline(Strategy::BroadOverview);
        let (quiet, chatty) = (
            ScriptedSource::neutral(),
            ScriptedSource::new(&["He paid the invoice."]),
        );
        let (first, second) = (CancellationToken::new(), CancellationToken::new());
        let (a, b) = tokio::join!(
            interrogator.interrogate(HYPOTHESIS, &quiet, 10, &first, &NoProgress),
            interrogator.interrogate("the forged will", &chatty, 3, &second, &NoProgress),
        );

        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(a.iterations, 4);
        assert!(a.findings.is_empty());
        assert_eq!(b.iterations, 3);
        assert!(b.turns[0].question.contains("the forged will"));
    }
}
