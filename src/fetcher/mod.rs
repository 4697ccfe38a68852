use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

use crate::harvest::types::{FetchOutcome, RecipientRow, ResponseRow};

pub mod parse;

pub const DEFAULT_BASE_URL: &str = "https://live.givedirectly.org/newsfeed";

/// Fetch boundary of the pipeline. Expected negative cases (no profile,
/// blank page, nothing new, parse failure) are `Ok` variants; only
/// transport-level or otherwise unexpected failures come back as `Err`.
#[async_trait]
pub trait ProfileFetcher: Send + Sync {
    async fn fetch(&self, rid: i64, completed_surveys: &HashSet<i64>) -> Result<FetchOutcome>;
}

/// Production fetcher: one GET per identifier against the GDLive newsfeed,
/// parsed with the selectors in [`parse`].
pub struct HttpProfileFetcher {
    client: Client,
    base: Url,
}

impl HttpProfileFetcher {
    pub fn new(base: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(20))
            .build()?;
        Ok(Self { client, base: Url::parse(base)? })
    }

    fn profile_url(&self, rid: i64) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("base url cannot carry a path: {}", self.base))?
            .push(&rid.to_string());
        Ok(url)
    }
}

#[async_trait]
impl ProfileFetcher for HttpProfileFetcher {
    async fn fetch(&self, rid: i64, completed_surveys: &HashSet<i64>) -> Result<FetchOutcome> {
        let url = self.profile_url(rid)?;
        let resp = self.client.get(url).send().await?;
        if matches!(resp.status(), StatusCode::NOT_FOUND | StatusCode::GONE) {
            return Ok(FetchOutcome::NoProfile);
        }
        let html = resp.error_for_status()?.text().await?;
        if html.trim().is_empty() {
            return Ok(FetchOutcome::EmptyResponse);
        }

        let profile = match parse::parse_profile(&html) {
            Ok(Some(p)) => p,
            Ok(None) => return Ok(FetchOutcome::NoProfile),
            Err(_) => return Ok(FetchOutcome::ParsingError),
        };

        Ok(outcome_from_profile(rid, profile, completed_surveys))
    }
}

/// Turn a parsed page into the outcome for this identifier, dropping surveys
/// that are already persisted.
fn outcome_from_profile(
    rid: i64,
    profile: parse::ParsedProfile,
    completed_surveys: &HashSet<i64>,
) -> FetchOutcome {
    let fresh: Vec<parse::ParsedSurvey> = profile
        .surveys
        .into_iter()
        .filter(|s| !completed_surveys.contains(&s.survey_id))
        .collect();

    if fresh.is_empty() {
        return FetchOutcome::NoUpdate;
    }
    if fresh.iter().all(|s| s.entries.is_empty()) {
        return FetchOutcome::NoQuestions;
    }

    let recipient = RecipientRow {
        recipient_id: rid,
        name: profile.name,
        age: profile.age,
        country: profile.country,
        occupation: profile.occupation,
        completed: profile.campaign_complete,
        last_updated: Utc::now(),
    };

    let mut responses = Vec::new();
    for survey in fresh {
        for (question, answer) in survey.entries {
            responses.push(ResponseRow {
                recipient_id: rid,
                survey_id: survey.survey_id,
                question,
                answer,
                payment: survey.payment.clone(),
                amount_usd: survey.amount_usd,
                amount_local: survey.amount_local,
                published_at: survey.published_at,
            });
        }
    }

    FetchOutcome::Loaded { recipient, responses }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn survey(id: i64, entries: Vec<(String, String)>) -> parse::ParsedSurvey {
        parse::ParsedSurvey {
            survey_id: id,
            payment: Some("1st payment".into()),
            amount_usd: Some(450.0),
            amount_local: None,
            published_at: None,
            entries,
        }
    }

    fn profile(surveys: Vec<parse::ParsedSurvey>) -> parse::ParsedProfile {
        parse::ParsedProfile {
            name: Some("Jane".into()),
            age: Some(34),
            country: Some("Kenya".into()),
            occupation: Some("farmer".into()),
            campaign_complete: false,
            surveys,
        }
    }

    #[test]
    fn all_surveys_completed_is_no_update() {
        let completed: HashSet<i64> = [11, 12].into_iter().collect();
        let p = profile(vec![
            survey(11, vec![("q".into(), "a".into())]),
            survey(12, vec![("q".into(), "a".into())]),
        ]);
        assert_eq!(outcome_from_profile(7, p, &completed), FetchOutcome::NoUpdate);
    }

    #[test]
    fn fresh_surveys_without_entries_is_no_questions() {
        let p = profile(vec![survey(11, vec![])]);
        assert_eq!(
            outcome_from_profile(7, p, &HashSet::new()),
            FetchOutcome::NoQuestions
        );
    }

    #[test]
    fn fresh_surveys_become_rows() {
        let completed: HashSet<i64> = [11].into_iter().collect();
        let p = profile(vec![
            survey(11, vec![("old q".into(), "old a".into())]),
            survey(
                12,
                vec![
                    ("q1".into(), "a1".into()),
                    ("q2".into(), "a2".into()),
                ],
            ),
        ]);
        match outcome_from_profile(7, p, &completed) {
            FetchOutcome::Loaded { recipient, responses } => {
                assert_eq!(recipient.recipient_id, 7);
                assert_eq!(responses.len(), 2);
                assert!(responses.iter().all(|r| r.survey_id == 12));
            }
            other => panic!("expected Loaded, got {other:?}"),
        }
    }

    #[test]
    fn profile_url_appends_rid() {
        let f = HttpProfileFetcher::new(DEFAULT_BASE_URL).unwrap();
        let url = f.profile_url(158000).unwrap();
        assert_eq!(url.as_str(), "https://live.givedirectly.org/newsfeed/158000");
    }
}
