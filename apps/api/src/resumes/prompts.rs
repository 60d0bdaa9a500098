// Resume improvement prompt templates.

pub const IMPROVE_SYSTEM: &str = "\
You are an expert resume writer. You rewrite one resume section at a time. \
Respond with the improved section text only: no preamble, no headings, no code fences.";

pub const IMPROVE_PROMPT_TEMPLATE: &str = r#"Improve the following {section} section of a resume.

{profile}

CURRENT CONTENT:
{current}

RULES:
- Lead every bullet with a strong action verb.
- Quantify outcomes wherever the original gives you a basis; never invent numbers.
- Use keywords that are standard in the user's industry.
- Keep it concise: one paragraph or at most 6 bullets.
- Preserve every fact in the original. Do not add employers, titles or dates."#;
