// All LLM prompt text for the analysis catalog.
// Single-document instructions are rendered as "<instruction>: {resume}".

/// Shared frame for prompts grounded on both the resume and the job description.
/// The operation's instruction is appended after it.
pub const DUAL_DOCUMENT_FRAME: &str = "Based on this resume:
{resume}

And this job description:
{jd}

";

pub const SUMMARIZE_INSTRUCTION: &str = "Summarize this resume";

pub const STRENGTHS_INSTRUCTION: &str = "Based on this resume, list the candidate's strengths";

pub const WEAKNESSES_INSTRUCTION: &str =
    "Based on this resume, list the candidate's weaknesses";

pub const RECOMMEND_ROLES_INSTRUCTION: &str =
    "Based on this resume, recommend suitable job roles";

pub const SUGGEST_IMPROVEMENTS_INSTRUCTION: &str =
    "Suggest specific areas of improvement in the following resume";

pub const JOB_MATCH_INSTRUCTION: &str = "\
List the percentage match and identify any missing or weak areas in the resume for the role.";

pub const FINAL_THOUGHTS_INSTRUCTION: &str = "\
Should the candidate apply for this role? Please provide final thoughts on how the candidate \
can improve their CV to match this role better.
Highlight what changes could give the candidate an upper edge and a higher percentage match \
for the job.";
