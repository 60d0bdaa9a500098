// Interview prompt templates.

pub const QUIZ_PROMPT_TEMPLATE: &str = r#"Generate {count} {category} interview questions for a candidate.

{profile}

Each question is multiple choice with exactly 4 options and one correct answer.
Questions should match what interviewers in this industry actually ask.

Return JSON with this exact shape:
{
  "questions": [
    {
      "question": "string",
      "options": ["string", "string", "string", "string"],
      "correct_answer": "string (must equal one of options)",
      "explanation": "string (why the answer is correct)"
    }
  ]
}"#;

pub const TIP_PROMPT_TEMPLATE: &str = r#"A candidate took a {category} interview quiz. {profile}

They answered these questions incorrectly:
{wrong_answers}

Write one concise improvement tip (under 50 words) about what to study or practise next.
Be encouraging. Do not restate the questions or the answers. Reply with the tip text only."#;

pub const VOICE_FEEDBACK_PROMPT_TEMPLATE: &str = r#"Evaluate this mock interview for the role of {role}.

{profile}

TRANSCRIPT:
{transcript}

Return JSON with this exact shape:
{
  "score": number (0-100, overall interview performance),
  "strengths": ["string", ...] (2-4 items),
  "improvements": ["string", ...] (2-4 items, each actionable),
  "summary": "string (2-3 sentences)"
}"#;
