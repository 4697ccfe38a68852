use anyhow::Result;

use super::types::{FetchOutcome, OutcomeCounts, RecipientRow, ResponseRow};

/// Classified batch: the two persistence payloads plus the per-category
/// breakdown. Recipients must never be persisted before the matching
/// responses landed; the load coordinator enforces that ordering.
#[derive(Debug, Clone, Default)]
pub struct BatchPayload {
    pub recipients: Vec<RecipientRow>,
    pub responses: Vec<ResponseRow>,
    pub counts: OutcomeCounts,
}

/// Fold per-identifier fetch results into payload rows and counters.
/// Total over the outcome set: every result bumps exactly one counter, and
/// only `Loaded` contributes rows. Pure, so the whole thing is unit-testable
/// with synthetic outcome lists.
pub fn create_payloads(results: Vec<(i64, Result<FetchOutcome>)>) -> BatchPayload {
    let mut payload = BatchPayload::default();
    for (_rid, result) in results {
        match result {
            Ok(FetchOutcome::Loaded { recipient, responses }) => {
                payload.counts.loaded += 1;
                payload.recipients.push(recipient);
                payload.responses.extend(responses);
            }
            Ok(FetchOutcome::NoUpdate) => payload.counts.no_updates += 1,
            Ok(FetchOutcome::NoProfile) => payload.counts.no_profile += 1,
            Ok(FetchOutcome::EmptyResponse) => payload.counts.empty_response += 1,
            Ok(FetchOutcome::NoQuestions) => payload.counts.no_questions += 1,
            Ok(FetchOutcome::ParsingError) => payload.counts.parsing_error += 1,
            Err(_) => payload.counts.unknown_error += 1,
        }
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use chrono::Utc;

    fn recipient(rid: i64) -> RecipientRow {
        RecipientRow {
            recipient_id: rid,
            name: Some("Jane".into()),
            age: Some(34),
            country: Some("Kenya".into()),
            occupation: Some("farmer".into()),
            completed: false,
            last_updated: Utc::now(),
        }
    }

    fn response(rid: i64, survey: i64) -> ResponseRow {
        ResponseRow {
            recipient_id: rid,
            survey_id: survey,
            question: "How did you spend it?".into(),
            answer: "School fees".into(),
            payment: Some("2nd payment".into()),
            amount_usd: Some(450.0),
            amount_local: Some(45000.0),
            published_at: None,
        }
    }

    fn loaded(rid: i64, surveys: &[i64]) -> FetchOutcome {
        FetchOutcome::Loaded {
            recipient: recipient(rid),
            responses: surveys.iter().map(|s| response(rid, *s)).collect(),
        }
    }

    #[test]
    fn every_outcome_lands_in_exactly_one_counter() {
        let results: Vec<(i64, Result<FetchOutcome>)> = vec![
            (1000, Ok(loaded(1000, &[1]))),
            (1010, Ok(FetchOutcome::NoUpdate)),
            (1020, Ok(FetchOutcome::NoProfile)),
            (1030, Ok(FetchOutcome::EmptyResponse)),
            (1040, Ok(FetchOutcome::NoQuestions)),
            (1050, Ok(FetchOutcome::ParsingError)),
            (1060, Err(anyhow!("socket reset"))),
        ];
        let n = results.len();
        let payload = create_payloads(results);
        assert_eq!(payload.counts.total(), n);
        assert_eq!(payload.counts.loaded, 1);
        assert_eq!(payload.counts.no_updates, 1);
        assert_eq!(payload.counts.no_profile, 1);
        assert_eq!(payload.counts.empty_response, 1);
        assert_eq!(payload.counts.no_questions, 1);
        assert_eq!(payload.counts.parsing_error, 1);
        assert_eq!(payload.counts.unknown_error, 1);
    }

    #[test]
    fn only_loaded_contributes_rows() {
        let results: Vec<(i64, Result<FetchOutcome>)> = vec![
            (1000, Ok(loaded(1000, &[10001, 10002]))),
            (1010, Ok(FetchOutcome::NoProfile)),
            (1020, Ok(loaded(1020, &[10201]))),
            (1030, Err(anyhow!("timeout"))),
        ];
        let payload = create_payloads(results);
        assert_eq!(payload.recipients.len(), 2);
        assert_eq!(payload.responses.len(), 3);
        let rids: Vec<i64> = payload.recipients.iter().map(|r| r.recipient_id).collect();
        assert_eq!(rids, vec![1000, 1020]);
    }

    #[test]
    fn empty_input_is_an_empty_payload() {
        let payload = create_payloads(Vec::new());
        assert!(payload.recipients.is_empty());
        assert!(payload.responses.is_empty());
        assert_eq!(payload.counts.total(), 0);
    }
}
