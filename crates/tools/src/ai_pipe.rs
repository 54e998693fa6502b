//! `ai_pipe`: a small registry of text workflows behind a simulated
//! network delay.

use std::time::Duration;

use agentflow_core::error::ToolError;
use agentflow_core::tool::Tool;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use rand::Rng;
use serde_json::{Value, json};
use tracing::debug;

const IBM_SUMMARY: &str = "**IBM Blog Post Summary:**

Key Points:
• IBM is a century-old technology company transformed into an AI and cloud leader
• Major focus areas: AI (Watson/watsonx), hybrid cloud (Red Hat), quantum computing
• Strategic shift from hardware to software and services
• Strong enterprise customer base and B2B market position
• Recent innovations in generative AI and enterprise automation

Recommended blog structure:
1. Introduction: IBM's transformation journey
2. AI Leadership: Watson evolution to watsonx platform
3. Cloud Strategy: Red Hat acquisition impact
4. Future Technologies: Quantum computing initiatives
5. Conclusion: IBM's role in enterprise digital transformation";

const IBM_OUTLINE: &str = "**IBM Blog Post Outline:**

# \"IBM in 2024: Leading the Enterprise AI Revolution\"

## I. Introduction (300 words)
- Brief company history and transformation
- Current market position
- Thesis: IBM's unique enterprise AI approach

## II. AI Leadership with watsonx (400 words)
- Evolution from Watson to watsonx platform
- Enterprise-focused AI solutions
- Customer success stories

## III. Hybrid Cloud Dominance (400 words)
- Red Hat acquisition strategy
- OpenShift and hybrid cloud benefits
- Competitive advantage in enterprise market

## IV. Innovation Frontiers (300 words)
- Quantum computing research
- Future technology investments
- R&D initiatives

## V. Conclusion (200 words)
- IBM's strategic positioning
- Future outlook
- Call to action for enterprises

**Target Length:** 1,600 words
**SEO Keywords:** IBM, enterprise AI, hybrid cloud, watsonx, digital transformation";

const POSITIVE: &[&str] = &["good", "great", "excellent", "amazing", "love", "best", "awesome"];
const NEGATIVE: &[&str] = &["bad", "terrible", "awful", "hate", "worst", "horrible"];

/// The workflows `ai_pipe` knows. Unknown names run `Summarize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workflow {
    Summarize,
    AnalyzeSentiment,
    ExtractKeywords,
    Translate,
    BlogOutline,
}

impl Workflow {
    pub fn from_name(name: &str) -> Self {
        match name {
            "analyze_sentiment" => Workflow::AnalyzeSentiment,
            "extract_keywords" => Workflow::ExtractKeywords,
            "translate" => Workflow::Translate,
            "blog_outline" => Workflow::BlogOutline,
            _ => Workflow::Summarize,
        }
    }

    pub fn run(self, text: &str) -> String {
        let lower = text.to_lowercase();
        match self {
            Workflow::Summarize if lower.contains("ibm") => IBM_SUMMARY.to_string(),
            Workflow::Summarize => format!(
                "Summary: {}... Key themes identified and structured for content creation.",
                prefix(text, 200)
            ),
            Workflow::AnalyzeSentiment => {
                let count = |words: &[&str]| words.iter().filter(|w| lower.contains(*w)).count();
                let (pos, neg) = (count(POSITIVE), count(NEGATIVE));
                let sentiment = match pos.cmp(&neg) {
                    std::cmp::Ordering::Greater => "Positive",
                    std::cmp::Ordering::Less => "Negative",
                    std::cmp::Ordering::Equal => "Neutral",
                };
                format!("Sentiment Analysis: {sentiment} (Confidence: {}%)", confidence())
            }
            Workflow::ExtractKeywords => {
                let mut keywords: Vec<&str> = Vec::new();
                for word in text
                    .split(' ')
                    .filter(|w| w.chars().count() > 3)
                    .take(10)
                {
                    if !keywords.contains(&word) {
                        keywords.push(word);
                    }
                }
                format!("Keywords: {}", keywords.join(", "))
            }
            Workflow::Translate => format!("Translated: [{text}]"),
            Workflow::BlogOutline if lower.contains("ibm") => IBM_OUTLINE.to_string(),
            Workflow::BlogOutline => {
                format!("Content outline generated for: {}...", prefix(text, 50))
            }
        }
    }
}

fn prefix(text: &str, chars: usize) -> String {
    text.chars().take(chars).collect()
}

fn confidence() -> u32 {
    rand::rng().random_range(80..100)
}

pub struct AiPipeTool {
    latency: Duration,
}

impl AiPipeTool {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl Tool for AiPipeTool {
    fn name(&self) -> &str {
        "ai_pipe"
    }

    fn description(&self) -> &str {
        "Execute an AI workflow using the AI Pipe API for data processing and analysis"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "workflow": {
                    "type": "string",
                    "description": "The AI workflow to execute",
                    "enum": ["summarize", "analyze_sentiment", "extract_keywords", "translate", "blog_outline"]
                },
                "data": {
                    "type": "string",
                    "description": "Input data for the workflow"
                }
            },
            "required": ["workflow", "data"]
        })
    }

    async fn execute(&self, arguments: Value) -> std::result::Result<Value, ToolError> {
        let workflow = arguments["workflow"].as_str().unwrap_or("summarize");
        let data = match &arguments["data"] {
            Value::String(s) => s.clone(),
            Value::Null => {
                return Err(ToolError::InvalidArguments("Missing 'data' argument".into()));
            }
            other => other.to_string(),
        };

        debug!(workflow, bytes = data.len(), "Running AI workflow");
        tokio::time::sleep(self.latency).await;

        let output = Workflow::from_name(workflow).run(&data);
        Ok(json!({
            "workflow": workflow,
            "input": data,
            "output": output,
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            "confidence": confidence(),
        }))
    }
}
