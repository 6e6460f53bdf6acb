//! Question-answering prompt template.
//!
//! Rendering is a pure string transform. The verbosity directive is the last
//! block of the prompt, so switching detail level changes only the text after
//! [`INSTRUCTION_HEADER`].

use serde::{Deserialize, Serialize};

use notechat_store::Chunk;

/// Response detail level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    #[default]
    Concise,
    Detailed,
}

impl Verbosity {
    fn directive(&self) -> &'static str {
        match self {
            Self::Concise => CONCISE_DIRECTIVE,
            Self::Detailed => DETAILED_DIRECTIVE,
        }
    }
}

pub const INSTRUCTION_HEADER: &str = "## REQUIRED RESPONSE STRUCTURE:";

const PREAMBLE: &str = "# DETAILED EXPERT ANALYSIS";

const RESPONSE_GUIDANCE: &str = "\
## RESPONSE PARAMETERS:
- **Detail Level**: Focused and relevant depth
- **Evidence**: Include key examples and data from the context
- **Formatting**: Use markdown for clarity

## INSTRUCTIONS FOR AI:
1. **Grounding**: Answer from the source context above
2. **Multiple Perspectives**: Consider the relevant angles and viewpoints
3. **Evidence-Based**: Support claims with concrete evidence from the context
4. **Structured Flow**: Maintain a logical progression
5. **Critical Analysis**: Note strengths, weaknesses and limitations where relevant

## ADDITIONAL REQUIREMENTS:
- If any information is missing from the context, explicitly state what's needed
- Use markdown for readability
- Use analogies to explain complex concepts";

const CONCISE_DIRECTIVE: &str =
    "Provide a concise and clear answer, focusing on the key points.";

const DETAILED_DIRECTIVE: &str = "\
# DETAILED RESPONSE REQUIREMENTS

## CORE REQUIREMENTS:
- Concise yet comprehensive response (500-800 words)
- Focus on key aspects with relevant details
- 2-3 levels of nested details
- Balanced analysis from key perspectives

## MANDATORY SECTIONS:

1. **COMPREHENSIVE INTRODUCTION**
   - Background and context
   - Current state and relevance

2. **DEEP DIVE INTO KEY CONCEPTS**
   - Definitions and explanations
   - Relationships between concepts

3. **DETAILED ANALYSIS**
   - Break the topic into its components
   - Interactions, variations and edge cases

4. **EVIDENCE & EXAMPLES**
   - Multiple concrete examples
   - Data and findings from the document

5. **COMPARATIVE ANALYSIS**
   - Compare with related concepts
   - Advantages and disadvantages

6. **PRACTICAL IMPLEMENTATION**
   - Step-by-step guidance
   - Common pitfalls and best practices

7. **CRITICAL EVALUATION**
   - Limitations and open challenges
   - Future developments

8. **COMPREHENSIVE CONCLUSION**
   - Summary of key points
   - Actionable insights

9. **EXTENDED RESOURCES**
   - Further reading and tools

## FORMATTING REQUIREMENTS:
- Use Markdown headings, lists and tables
- Use bold/italic for emphasis
- Use blockquotes for important notes";

/// Render the prompt for `question` over `context` chunks (in search order).
pub fn render(question: &str, context: &[Chunk], verbosity: Verbosity) -> String {
    let context_text = context
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "{}\n\n## SOURCE CONTEXT:\n{}\n\n## USER'S QUERY:\n{}\n\n{}\n\n{}\n{}\n",
        PREAMBLE,
        context_text,
        question,
        RESPONSE_GUIDANCE,
        INSTRUCTION_HEADER,
        verbosity.directive()
    )
}
