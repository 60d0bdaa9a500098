// Course generation prompt templates.

pub const COURSE_SYSTEM: &str = "\
You are an expert instructor who writes structured, self-paced courses for working \
professionals. You write in clear markdown. You MUST follow the heading structure \
exactly: one `#` title, `##` for each chapter, `###` for each section. \
Do NOT wrap the course in code fences. Do NOT add commentary before or after the course.";

pub const COURSE_PROMPT_TEMPLATE: &str = r#"Write a complete course on the topic below.

TOPIC: {topic}
LEVEL: {level}
LEARNER NOTES: {description}
LEARNER PROFILE: {profile}

STRUCTURE:
# <course title>
<two or three sentence course overview>

## <chapter title>
### <section title>
<section body: explanations, examples, short code snippets where relevant>

RULES:
- Between 4 and 8 chapters, each with 2 to 4 sections.
- Every section teaches one idea and ends with a one-line key takeaway in bold.
- Match depth to the LEVEL; assume no prior knowledge at beginner level.
- Code samples go in fenced blocks with a language tag."#;
