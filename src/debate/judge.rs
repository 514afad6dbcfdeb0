//! The Judge Agent (C4): structured-output synthesis with JSON extraction,
//! score clamping, and requirement-fulfilment hard caps, plus a separate
//! consensus-confidence evaluator.

use std::sync::Arc;

use crate::debate::error::ProviderError;
use crate::debate::model::{
    AgentConfig, ContributionType, DebateRound, Provider, Role, Solution, SummarizationConfig,
};
use crate::debate::provider::{CompletionRequest, ProviderPort};
use crate::debate::summarizer::{SummarizeRequest, Summarizer};

const JUDGE_JSON_INSTRUCTION: &str = r#"Respond with strict JSON only, matching this schema:
{"solutionMarkdown": string, "tradeoffs": [string], "recommendations": [string],
 "unfulfilledMajorRequirements": [string], "openQuestions": [string], "confidence": number}"#;

pub struct JudgeAgent<P: ProviderPort> {
    model: String,
    temperature: f32,
    provider_kind: Provider,
    provider: Arc<P>,
    summarizer: Arc<dyn Summarizer>,
}

impl<P: ProviderPort> JudgeAgent<P> {
    pub fn new(
        model: String,
        temperature: f32,
        provider_kind: Provider,
        provider: Arc<P>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        JudgeAgent {
            model,
            temperature,
            provider_kind,
            provider,
            summarizer,
        }
    }

    /// True iff summarization is enabled, rounds is non-empty, and the
    /// character count of the final round's proposals + refinements (from
    /// every participant, unlike a role agent's self-only trigger) meets
    /// the configured threshold.
    pub fn should_summarize(&self, rounds: &[DebateRound], cfg: &SummarizationConfig) -> bool {
        if !cfg.enabled || rounds.is_empty() {
            return false;
        }
        let last = rounds.last().unwrap();
        let chars: usize = last
            .contributions
            .iter()
            .filter(|c| {
                matches!(
                    c.kind,
                    ContributionType::Proposal | ContributionType::Refinement
                )
            })
            .map(|c| c.content.len())
            .sum();
        chars >= cfg.threshold
    }

    async fn final_round_content(
        &self,
        rounds: &[DebateRound],
        cfg: Option<&SummarizationConfig>,
    ) -> String {
        let full = render_final_round(rounds);
        let Some(cfg) = cfg else {
            return render_all_rounds(rounds);
        };
        if !self.should_summarize(rounds, cfg) {
            return render_all_rounds(rounds);
        }
        let req = SummarizeRequest {
            content: full.clone(),
            role: Role::Judge,
            cfg,
            system_prompt: "Summarize the final round of the debate concisely.".to_string(),
            user_prompt: full.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
            provider: self.provider_kind,
        };
        match self.summarizer.summarize(req).await {
            Ok(outcome) => outcome.summary,
            Err(err) => {
                tracing::warn!(error = %err, "judge summarization failed; falling back to final-round content");
                full
            }
        }
    }

    pub async fn synthesize(
        &self,
        problem: &str,
        rounds: &[DebateRound],
        summarization_cfg: Option<&SummarizationConfig>,
    ) -> Result<Solution, ProviderError> {
        let history = self.final_round_content(rounds, summarization_cfg).await;
        let user_prompt = format!(
            "Problem:\n{problem}\n\nDebate history:\n{history}\n\n{JUDGE_JSON_INSTRUCTION}"
        );
        let response = self
            .provider
            .complete(CompletionRequest {
                model: self.model.clone(),
                temperature: self.temperature,
                system_prompt: "You are the judge synthesizing a multi-agent debate.".to_string(),
                user_prompt,
                messages: None,
                max_tokens: None,
                stop_sequences: Vec::new(),
                tools: Vec::new(),
            })
            .await?;
        Ok(parse_judge_response(&response.text))
    }

    /// Inspects only the refinements of the latest round; returns 0 if
    /// there are none. Prompts for a single-field confidence JSON and
    /// clamps the result, defaulting to 50 on parse failure.
    pub async fn evaluate_confidence(
        &self,
        rounds: &[DebateRound],
    ) -> Result<u8, ProviderError> {
        let Some(last) = rounds.last() else {
            return Ok(0);
        };
        let refinements: Vec<&str> = last
            .contributions
            .iter()
            .filter(|c| c.kind == ContributionType::Refinement)
            .map(|c| c.content.as_str())
            .collect();
        if refinements.is_empty() {
            return Ok(0);
        }
        let joined = refinements.join("\n\n");
        let user_prompt = format!(
            "Refinements from the latest round:\n{joined}\n\n\
             Rate overall consensus as a single JSON object: {{\"confidence\": int}}.\n\
             Bands: 0-40 no consensus, 41-70 partial, 71-89 mostly aligned, 90-100 strong \
             consensus. Prefer a value under 50 when ambiguous."
        );
        let response = self
            .provider
            .complete(CompletionRequest {
                model: self.model.clone(),
                temperature: self.temperature,
                system_prompt: "You are a skeptical consensus evaluator.".to_string(),
                user_prompt,
                messages: None,
                max_tokens: None,
                stop_sequences: Vec::new(),
                tools: Vec::new(),
            })
            .await?;
        Ok(parse_confidence_only(&response.text).unwrap_or(50))
    }
}

fn render_all_rounds(rounds: &[DebateRound]) -> String {
    let mut out = String::new();
    for round in rounds {
        out.push_str(&render_round(round));
    }
    out
}

fn render_final_round(rounds: &[DebateRound]) -> String {
    rounds.last().map(render_round).unwrap_or_default()
}

fn render_round(round: &DebateRound) -> String {
    let mut out = format!("== Round {} ==\n", round.round_number);
    for c in &round.contributions {
        out.push_str(&format!("[{}] {}\n", c.agent_id, c.content));
    }
    out
}

/// Extracted judge JSON payload, deserialized loosely so missing/malformed
/// fields fall back to their spec-mandated defaults rather than failing
/// the whole parse.
#[derive(Debug, Default, serde::Deserialize)]
struct RawJudgePayload {
    #[serde(default, alias = "solutionMarkdown")]
    solution_markdown: Option<String>,
    #[serde(default)]
    tradeoffs: Vec<String>,
    #[serde(default)]
    recommendations: Vec<String>,
    #[serde(default, alias = "unfulfilledMajorRequirements")]
    unfulfilled_major_requirements: Vec<String>,
    #[serde(default, alias = "openQuestions")]
    open_questions: Vec<String>,
    #[serde(default)]
    confidence: Option<serde_json::Value>,
}

/// Strips ```json fences, extracts the first balanced `{...}` object by
/// brace counting, parses it, validates, clamps confidence, applies the
/// unfulfilled-requirements hard cap, then renders the fixed-order
/// Judge Assessment section.
fn parse_judge_response(raw: &str) -> Solution {
    let stripped = strip_json_fences(raw);
    let extracted = extract_balanced_braces(&stripped);

    let payload = extracted
        .as_deref()
        .and_then(|s| serde_json::from_str::<RawJudgePayload>(s).ok());

    let Some(payload) = payload else {
        return Solution {
            description: raw.trim().to_string(),
            tradeoffs: Vec::new(),
            recommendations: Vec::new(),
            confidence: apply_cap(50, &[]),
            synthesized_by: "judge".to_string(),
            unfulfilled_major_requirements: Vec::new(),
            open_questions: Vec::new(),
        };
    };

    let solution_markdown = payload
        .solution_markdown
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| raw.trim().to_string());

    let confidence = clamp_confidence(
        payload
            .confidence
            .as_ref()
            .and_then(|v| v.as_f64())
            .unwrap_or(50.0),
    );
    let confidence = apply_cap(confidence, &payload.unfulfilled_major_requirements);

    let description = render_description(
        &solution_markdown,
        confidence,
        &payload.unfulfilled_major_requirements,
        &payload.open_questions,
        &payload.recommendations,
        &payload.tradeoffs,
    );

    Solution {
        description,
        tradeoffs: payload.tradeoffs,
        recommendations: payload.recommendations,
        confidence,
        synthesized_by: "judge".to_string(),
        unfulfilled_major_requirements: payload.unfulfilled_major_requirements,
        open_questions: payload.open_questions,
    }
}

fn strip_json_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(rest) = trimmed.strip_prefix("```json") {
        rest.trim_end_matches("```").trim().to_string()
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        rest.trim_end_matches("```").trim().to_string()
    } else {
        trimmed.to_string()
    }
}

fn extract_balanced_braces(s: &str) -> Option<String> {
    let start = s.find('{')?;
    let bytes = s.as_bytes();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape = false;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escape {
                escape = false;
            } else if b == b'\\' {
                escape = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(s[start..=i].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

fn clamp_confidence(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

fn apply_cap(confidence: u8, unfulfilled: &[String]) -> u8 {
    if unfulfilled.is_empty() {
        confidence
    } else {
        confidence.min(40)
    }
}

fn render_description(
    solution_markdown: &str,
    confidence: u8,
    unfulfilled: &[String],
    open_questions: &[String],
    recommendations: &[String],
    tradeoffs: &[String],
) -> String {
    let mut out = format!("{solution_markdown}\n\n---\n\n## Judge Assessment\n\n");
    out.push_str(&format!("**Confidence Score**: {confidence}/100\n"));
    if !unfulfilled.is_empty() {
        out.push_str("\n### ⚠️ Unfulfilled Major Requirements\n");
        for item in unfulfilled {
            out.push_str(&format!("- {item}\n"));
        }
    }
    if !open_questions.is_empty() {
        out.push_str("\n### Open Questions\n");
        for item in open_questions {
            out.push_str(&format!("- {item}\n"));
        }
    }
    if !recommendations.is_empty() {
        out.push_str("\n### Recommendations\n");
        for item in recommendations {
            out.push_str(&format!("- {item}\n"));
        }
    }
    if !tradeoffs.is_empty() {
        out.push_str("\n### Trade-offs\n");
        for item in tradeoffs {
            out.push_str(&format!("- {item}\n"));
        }
    }
    out
}

fn parse_confidence_only(raw: &str) -> Option<u8> {
    let stripped = strip_json_fences(raw);
    let extracted = extract_balanced_braces(&stripped)?;
    let value: serde_json::Value = serde_json::from_str(&extracted).ok()?;
    let confidence = value.get("confidence")?.as_f64()?;
    Some(clamp_confidence(confidence))
}

pub fn judge_agent_config(id: &str, model: &str) -> AgentConfig {
    AgentConfig {
        id: id.to_string(),
        name: "Judge".to_string(),
        role: Role::Judge,
        model: model.to_string(),
        provider: Provider::Mock,
        temperature: 0.2,
        enabled: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_json_and_preserves_confidence() {
        let raw = r#"{"solutionMarkdown":"OK","confidence":82,"unfulfilledMajorRequirements":[]}"#;
        let sol = parse_judge_response(raw);
        assert_eq!(sol.confidence, 82);
        assert!(sol.description.contains("OK"));
        assert!(sol.description.contains("**Confidence Score**: 82/100"));
    }

    #[test]
    fn unfulfilled_requirements_hard_cap_confidence_at_40() {
        let raw = r#"{"solutionMarkdown":"OK","confidence":95,"unfulfilledMajorRequirements":["X"]}"#;
        let sol = parse_judge_response(raw);
        assert_eq!(sol.confidence, 40);
        assert!(sol.description.contains("⚠️ Unfulfilled Major Requirements"));
        assert!(sol.description.contains("- X"));
    }

    #[test]
    fn non_json_falls_back_to_raw_text_with_default_confidence() {
        let raw = "[Rarchitect] proposal";
        let sol = parse_judge_response(raw);
        assert_eq!(sol.confidence, 50);
        assert_eq!(sol.description, raw);
    }

    #[test]
    fn strips_json_code_fences() {
        let raw = "```json\n{\"solutionMarkdown\":\"OK\",\"confidence\":70}\n```";
        let sol = parse_judge_response(raw);
        assert_eq!(sol.confidence, 70);
    }

    #[test]
    fn missing_confidence_defaults_to_50() {
        let raw = r#"{"solutionMarkdown":"OK"}"#;
        let sol = parse_judge_response(raw);
        assert_eq!(sol.confidence, 50);
    }

    #[test]
    fn section_order_is_fixed() {
        let raw = r#"{"solutionMarkdown":"OK","confidence":30,
            "unfulfilledMajorRequirements":["U1"],"openQuestions":["Q1"],
            "recommendations":["R1"],"tradeoffs":["T1"]}"#;
        let sol = parse_judge_response(raw);
        let u = sol.description.find("Unfulfilled Major Requirements").unwrap();
        let q = sol.description.find("Open Questions").unwrap();
        let r = sol.description.find("Recommendations").unwrap();
        let t = sol.description.find("Trade-offs").unwrap();
        assert!(u < q && q < r && r < t);
    }

    #[test]
    fn extract_balanced_braces_ignores_braces_inside_strings() {
        let s = r#"noise { "a": "}" } trailing"#;
        let extracted = extract_balanced_braces(s).unwrap();
        assert_eq!(extracted, r#"{ "a": "}" }"#);
    }

    #[test]
    fn confidence_only_parse_clamps_and_defaults() {
        assert_eq!(parse_confidence_only(r#"{"confidence": 150}"#), Some(100));
        assert_eq!(parse_confidence_only("not json"), None);
    }
}
