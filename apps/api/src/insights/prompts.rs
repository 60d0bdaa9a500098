// Industry insight prompt template.

pub const INSIGHT_PROMPT_TEMPLATE: &str = r#"Analyze the current state of the {industry} industry.

Return JSON with this exact shape:
{
  "salary_ranges": [
    { "role": "string", "min": number, "max": number, "median": number, "location": "string" }
  ],
  "growth_rate": number (percentage, year over year),
  "demand_level": "High" | "Medium" | "Low",
  "top_skills": ["string"],
  "market_outlook": "Positive" | "Neutral" | "Negative",
  "key_trends": ["string"],
  "recommended_skills": ["string"]
}

RULES:
- At least 5 common roles in salary_ranges, amounts in USD per year.
- At least 5 items in each of top_skills, key_trends and recommended_skills."#;
