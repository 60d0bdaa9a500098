//! Per-industry market insights, generated by the LLM and refreshed weekly.
//!
//! Model output is normalized before it is stored: `demand_level` and
//! `market_outlook` are mapped onto fixed vocabularies, `growth_rate` is
//! clamped, and salary ranges are repaired or dropped.

pub mod handlers;
pub mod prompts;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::insights::prompts::INSIGHT_PROMPT_TEMPLATE;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::LlmClient;
use crate::models::insight::IndustryInsightRow;

pub const REFRESH_INTERVAL_DAYS: i64 = 7;
pub const MIN_GROWTH_RATE: f64 = -100.0;
pub const MAX_GROWTH_RATE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub role: String,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    #[serde(default)]
    pub location: String,
}

#[derive(Debug, Deserialize)]
struct RawInsight {
    #[serde(default)]
    salary_ranges: Vec<SalaryRange>,
    #[serde(default)]
    growth_rate: f64,
    #[serde(default)]
    demand_level: String,
    #[serde(default)]
    top_skills: Vec<String>,
    #[serde(default)]
    market_outlook: String,
    #[serde(default)]
    key_trends: Vec<String>,
    #[serde(default)]
    recommended_skills: Vec<String>,
}

/// Insight content ready to be written to `industry_insights`.
#[derive(Debug, Clone, PartialEq)]
pub struct InsightData {
    pub salary_ranges: Vec<SalaryRange>,
    pub growth_rate: f64,
    pub demand_level: String,
    pub top_skills: Vec<String>,
    pub market_outlook: String,
    pub key_trends: Vec<String>,
    pub recommended_skills: Vec<String>,
}

pub fn normalize_demand_level(value: &str) -> &'static str {
    match value.trim().to_lowercase().as_str() {
        "high" | "very high" | "strong" => "High",
        "low" | "very low" | "weak" => "Low",
        _ => "Medium",
    }
}

pub fn normalize_market_outlook(value: &str) -> &'static str {
    match value.trim().to_lowercase().as_str() {
        "positive" | "optimistic" | "growing" => "Positive",
        "negative" | "pessimistic" | "declining" => "Negative",
        _ => "Neutral",
    }
}

pub fn clamp_growth_rate(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(MIN_GROWTH_RATE, MAX_GROWTH_RATE)
    } else {
        0.0
    }
}

/// Drops ranges with no role or negative amounts; orders min <= median <= max.
fn normalize_salary_ranges(ranges: Vec<SalaryRange>) -> Vec<SalaryRange> {
    ranges
        .into_iter()
        .filter(|r| !r.role.trim().is_empty())
        .filter(|r| [r.min, r.max, r.median].iter().all(|v| v.is_finite() && *v >= 0.0))
        .map(|r| {
            let mut amounts = [r.min, r.median, r.max];
            amounts.sort_by(f64::total_cmp);
            SalaryRange {
                role: r.role.trim().to_string(),
                min: amounts[0],
                median: amounts[1],
                max: amounts[2],
                location: r.location.trim().to_string(),
            }
        })
        .collect()
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl From<RawInsight> for InsightData {
    fn from(raw: RawInsight) -> Self {
        InsightData {
            salary_ranges: normalize_salary_ranges(raw.salary_ranges),
            growth_rate: clamp_growth_rate(raw.growth_rate),
            demand_level: normalize_demand_level(&raw.demand_level).to_string(),
            top_skills: clean_list(raw.top_skills),
            market_outlook: normalize_market_outlook(&raw.market_outlook).to_string(),
            key_trends: clean_list(raw.key_trends),
            recommended_skills: clean_list(raw.recommended_skills),
        }
    }
}

/// `software-development` → `software development`.
pub fn industry_label(slug: &str) -> String {
    slug.replace('-', " ")
}

pub fn next_update_after(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::days(REFRESH_INTERVAL_DAYS)
}

pub async fn generate_insight(llm: &LlmClient, industry: &str) -> Result<InsightData, AppError> {
    let prompt = INSIGHT_PROMPT_TEMPLATE.replace("{industry}", &industry_label(industry));
    let raw: RawInsight = llm
        .call_json(&prompt, JSON_ONLY_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("Insight generation failed: {e}")))?;
    info!("Generated industry insight for {industry}");
    Ok(raw.into())
}

fn salary_json(data: &InsightData) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(&data.salary_ranges)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize salary ranges: {e}")))
}

/// Inserts the insight unless one already exists for `industry`.
pub async fn insert_if_missing(
    conn: &mut PgConnection,
    industry: &str,
    data: &InsightData,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO industry_insights
            (id, industry, salary_ranges, growth_rate, demand_level, top_skills,
             market_outlook, key_trends, recommended_skills, last_updated, next_update)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (industry) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(industry)
    .bind(salary_json(data)?)
    .bind(data.growth_rate)
    .bind(&data.demand_level)
    .bind(&data.top_skills)
    .bind(&data.market_outlook)
    .bind(&data.key_trends)
    .bind(&data.recommended_skills)
    .bind(now)
    .bind(next_update_after(now))
    .execute(conn)
    .await?;
    Ok(())
}

/// Overwrites the stored insight for `industry` with fresh data.
pub async fn refresh(
    conn: &mut PgConnection,
    industry: &str,
    data: &InsightData,
    now: DateTime<Utc>,
) -> Result<IndustryInsightRow, AppError> {
    let row = sqlx::query_as::<_, IndustryInsightRow>(
        r#"
        UPDATE industry_insights
        SET salary_ranges = $2,
            growth_rate = $3,
            demand_level = $4,
            top_skills = $5,
            market_outlook = $6,
            key_trends = $7,
            recommended_skills = $8,
            last_updated = $9,
            next_update = $10
        WHERE industry = $1
        RETURNING *
        "#,
    )
    .bind(industry)
    .bind(salary_json(data)?)
    .bind(data.growth_rate)
    .bind(&data.demand_level)
    .bind(&data.top_skills)
    .bind(&data.market_outlook)
    .bind(&data.key_trends)
    .bind(&data.recommended_skills)
    .bind(now)
    .bind(next_update_after(now))
    .fetch_one(conn)
    .await?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_demand_level_normalized() {
        assert_eq!(normalize_demand_level(" HIGH "), "High");
        assert_eq!(normalize_demand_level("low"), "Low");
        assert_eq!(normalize_demand_level("medium"), "Medium");
        assert_eq!(normalize_demand_level("booming?"), "Medium");
    }

    #[test]
    fn test_market_outlook_normalized() {
        assert_eq!(normalize_market_outlook("positive"), "Positive");
        assert_eq!(normalize_market_outlook("Negative"), "Negative");
        assert_eq!(normalize_market_outlook(""), "Neutral");
    }

    #[test]
    fn test_growth_rate_clamped() {
        assert_eq!(clamp_growth_rate(12.5), 12.5);
        assert_eq!(clamp_growth_rate(350.0), MAX_GROWTH_RATE);
        assert_eq!(clamp_growth_rate(-400.0), MIN_GROWTH_RATE);
        assert_eq!(clamp_growth_rate(f64::NAN), 0.0);
    }

    #[test]
    fn test_salary_ranges_repaired() {
        let ranges = vec![
            SalaryRange {
                role: " Engineer ".to_string(),
                min: 150_000.0,
                max: 90_000.0,
                median: 120_000.0,
                location: "US".to_string(),
            },
            SalaryRange {
                role: "".to_string(),
                min: 1.0,
                max: 2.0,
                median: 1.5,
                location: String::new(),
            },
            SalaryRange {
                role: "Intern".to_string(),
                min: -5.0,
                max: 10.0,
                median: 5.0,
                location: String::new(),
            },
        ];
        let repaired = normalize_salary_ranges(ranges);
        assert_eq!(repaired.len(), 1);
        assert_eq!(repaired[0].role, "Engineer");
        assert_eq!(repaired[0].min, 90_000.0);
        assert_eq!(repaired[0].median, 120_000.0);
        assert_eq!(repaired[0].max, 150_000.0);
    }

    #[test]
    fn test_raw_insight_with_missing_fields() {
        let raw: RawInsight =
            serde_json::from_str(r#"{"growth_rate": 900, "demand_level": "high"}"#).unwrap();
        let data = InsightData::from(raw);
        assert_eq!(data.growth_rate, 100.0);
        assert_eq!(data.demand_level, "High");
        assert_eq!(data.market_outlook, "Neutral");
        assert!(data.salary_ranges.is_empty());
    }

    #[test]
    fn test_next_update_is_one_week_later() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(
            next_update_after(now),
            Utc.with_ymd_and_hms(2024, 3, 8, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_industry_label() {
        assert_eq!(industry_label("tech-software-development"), "tech software development");
    }
}
