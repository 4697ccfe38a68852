use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Header fields plus the survey updates scraped off one profile page.
#[derive(Debug, Clone)]
pub struct ParsedProfile {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub country: Option<String>,
    pub occupation: Option<String>,
    pub campaign_complete: bool,
    pub surveys: Vec<ParsedSurvey>,
}

#[derive(Debug, Clone)]
pub struct ParsedSurvey {
    pub survey_id: i64,
    pub payment: Option<String>,
    pub amount_usd: Option<f64>,
    pub amount_local: Option<f64>,
    pub published_at: Option<DateTime<Utc>>,
    pub entries: Vec<(String, String)>,
}

/// Parse a profile page. `Ok(None)` means the page is a recognizable
/// "no such profile" response; `Err` means the markup did not match the
/// expected structure at all.
pub fn parse_profile(html: &str) -> Result<Option<ParsedProfile>> {
    let doc = Html::parse_document(html);

    if select_first(&doc, ".profile").is_none() {
        if select_first(&doc, ".error-page, #page-not-found").is_some() {
            return Ok(None);
        }
        return Err(anyhow!("no profile container in page"));
    }

    let name = select_text(&doc, ".profile .recipient-name");
    let age = select_text(&doc, ".profile .recipient-age").and_then(|t| first_int(&t));
    let country = select_text(&doc, ".profile .recipient-country");
    let occupation = select_text(&doc, ".profile .recipient-occupation");
    let campaign_complete = select_first(&doc, ".profile .campaign-complete").is_some();

    let card_sel = sel("div.survey-card[data-survey-id]")?;
    let mut surveys = Vec::new();
    for card in doc.select(&card_sel) {
        surveys.push(parse_survey(card)?);
    }

    Ok(Some(ParsedProfile {
        name,
        age,
        country,
        occupation,
        campaign_complete,
        surveys,
    }))
}

fn parse_survey(card: ElementRef<'_>) -> Result<ParsedSurvey> {
    let survey_id: i64 = card
        .value()
        .attr("data-survey-id")
        .and_then(|raw| raw.trim().parse().ok())
        .ok_or_else(|| anyhow!("survey card without a numeric data-survey-id"))?;

    let payment = child_text(card, ".payment-label");
    let amount_usd = child_text(card, ".amount-usd").and_then(|t| first_number(&t));
    let amount_local = child_text(card, ".amount-local").and_then(|t| first_number(&t));
    let published_at = child_attr(card, "time[datetime]", "datetime")
        .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
        .map(|dt| dt.with_timezone(&Utc));

    let entry_sel = sel(".survey-response")?;
    let mut entries = Vec::new();
    for entry in card.select(&entry_sel) {
        let question = child_text(entry, ".question");
        let answer = child_text(entry, ".answer");
        if let (Some(q), Some(a)) = (question, answer) {
            entries.push((q, a));
        }
    }

    Ok(ParsedSurvey {
        survey_id,
        payment,
        amount_usd,
        amount_local,
        published_at,
        entries,
    })
}

fn sel(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| anyhow!("bad selector {s}: {e:?}"))
}

fn select_first<'a>(doc: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let sel = Selector::parse(selector).ok()?;
    doc.select(&sel).next()
}

fn select_text(doc: &Html, selector: &str) -> Option<String> {
    let node = select_first(doc, selector)?;
    normalized_text(node)
}

fn child_text(node: ElementRef<'_>, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    let child = node.select(&sel).next()?;
    normalized_text(child)
}

fn child_attr(node: ElementRef<'_>, selector: &str, attr: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    let child = node.select(&sel).next()?;
    child.value().attr(attr).map(|s| s.trim().to_string())
}

fn normalized_text(node: ElementRef<'_>) -> Option<String> {
    let text = node.text().collect::<String>();
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() { None } else { Some(collapsed) }
}

fn first_int(text: &str) -> Option<i64> {
    let re = Regex::new(r"\d+").ok()?;
    re.find(text)?.as_str().parse().ok()
}

fn first_number(text: &str) -> Option<f64> {
    let re = Regex::new(r"\d[\d,]*\.?\d*").ok()?;
    re.find(text)?.as_str().replace(',', "").parse().ok()
}
