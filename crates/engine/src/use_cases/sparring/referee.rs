//! Referee: generates opponents and rounds for the sparring arcade.
//!
//! Every generation has a `try_` form that reports a [`GenerationError`] and a
//! plain form that routes any error to the deterministic fallback content.
//! Model output is parsed strictly: an option record must carry exactly the
//! five expected fields, with non-negative integer damages and a known kind.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use motstand_domain::catalog::AVATAR_POOL;
use motstand_domain::game_rules::{fallback_batch, fallback_level, fallback_round, level_title};
use motstand_domain::{
    ChatTurn, OptionKind, SparringLevel, SparringOption, SparringRound, SparringTopic,
    StartingHitPoints, ROUND_OPTION_COUNT,
};

use crate::infrastructure::agent_gateway::{AgentError, AgentGateway, AgentRole};
use crate::infrastructure::ports::{pick_index, RandomPort};
use crate::use_cases::json::extract_json;

/// History entries included in a single-round prompt.
const ROUND_HISTORY_WINDOW: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error("Referee returned invalid JSON: {0}")]
    InvalidJson(String),
    #[error("Referee output has the wrong shape: {0}")]
    Schema(String),
    #[error("Referee output contained no usable rounds")]
    NoUsableRounds,
}

// =============================================================================
// Wire shapes
// =============================================================================

#[derive(Debug, Deserialize)]
struct LevelPayload {
    opponent_name: Option<String>,
    opponent_role: Option<String>,
    attack_style: Option<String>,
    weakness: Option<String>,
    win_condition: Option<String>,
    difficulty_prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RoundPayload {
    context: Option<String>,
    attack: Option<String>,
    #[serde(default)]
    options: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct BatchPayload {
    #[serde(default)]
    rounds: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OptionRecord {
    text: String,
    damage_user: u32,
    damage_opponent: u32,
    feedback: String,
    #[serde(rename = "type")]
    kind: OptionKind,
}

impl From<OptionRecord> for SparringOption {
    fn from(record: OptionRecord) -> Self {
        SparringOption::new(
            record.text,
            record.damage_user,
            record.damage_opponent,
            record.feedback,
            record.kind,
        )
    }
}

// =============================================================================
// Parsing
// =============================================================================

fn decode<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T, GenerationError> {
    let value: Value = serde_json::from_str(extract_json(raw))
        .map_err(|e| GenerationError::InvalidJson(e.to_string()))?;
    if !value.is_object() {
        return Err(GenerationError::Schema("expected a JSON object".to_string()));
    }
    serde_json::from_value(value).map_err(|e| GenerationError::Schema(e.to_string()))
}

fn or_default(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Build a level from referee output. Missing fields get defaults.
pub fn parse_level(
    raw: &str,
    topic: &SparringTopic,
    level_number: u32,
    avatar: &str,
) -> Result<SparringLevel, GenerationError> {
    let payload: LevelPayload = decode(raw)?;
    let hp = StartingHitPoints::for_level(level_number);
    let opponent_role = or_default(payload.opponent_role, "Motstander");

    Ok(SparringLevel {
        id: format!("{}_lvl_{}", topic.id, level_number),
        title: level_title(level_number, &opponent_role),
        opponent_name: or_default(payload.opponent_name, "Motstander"),
        opponent_role,
        attack_style: or_default(payload.attack_style, "Pressende og krevende"),
        weakness: or_default(payload.weakness, "Rolig fakta"),
        win_condition: or_default(payload.win_condition, "Hold roen og sett grenser"),
        opponent_instructions: or_default(
            payload.difficulty_prompt,
            "Vær direkte, pressende og test grensene til spilleren.",
        ),
        initial_player_hp: hp.player,
        initial_opponent_hp: hp.opponent,
        avatar: avatar.to_string(),
    })
}

/// Keep the well-formed option records; `None` unless exactly four remain
fn valid_options(records: Vec<Value>) -> Option<[SparringOption; ROUND_OPTION_COUNT]> {
    let options: Vec<SparringOption> = records
        .into_iter()
        .filter_map(|record| serde_json::from_value::<OptionRecord>(record).ok())
        .map(SparringOption::from)
        .collect();
    options.try_into().ok()
}

fn build_round(
    payload: RoundPayload,
    default_context: &str,
    default_attack: &str,
) -> Option<SparringRound> {
    let options = valid_options(payload.options)?;
    Some(SparringRound::from_options(
        or_default(payload.context, default_context),
        or_default(payload.attack, default_attack),
        options,
    ))
}

/// Parse a single round. Options keep the order the model gave them.
pub fn parse_round(raw: &str) -> Result<SparringRound, GenerationError> {
    let payload: RoundPayload = decode(raw)?;
    build_round(
        payload,
        "Motstanderen vil teste deg videre.",
        "Dette holder ikke, hva tenker du egentlig?",
    )
    .ok_or_else(|| {
        GenerationError::Schema(format!("expected {} valid options", ROUND_OPTION_COUNT))
    })
}

/// Parse a batch, discarding malformed rounds and keeping at most `count`.
pub fn parse_round_batch(raw: &str, count: usize) -> Result<Vec<SparringRound>, GenerationError> {
    let payload: BatchPayload = decode(raw)?;
    let total = payload.rounds.len();

    let rounds: Vec<SparringRound> = payload
        .rounds
        .into_iter()
        .filter_map(|item| serde_json::from_value::<RoundPayload>(item).ok())
        .filter_map(|item| {
            build_round(item, "Uklart sted", "Jeg er uenig, hvorfor insisterer du?")
        })
        .take(count)
        .collect();

    if rounds.is_empty() {
        return Err(GenerationError::NoUsableRounds);
    }
    if rounds.len() < total.min(count) {
        tracing::debug!(kept = rounds.len(), received = total, "Discarded malformed rounds");
    }
    Ok(rounds)
}

// =============================================================================
// Prompts
// =============================================================================

pub fn level_prompt(topic: &SparringTopic, level_number: u32) -> String {
    format!(
        r#"You are a Game Designer creating a level for a verbal sparring game.
**Topic**: {title} ({description})
**Level Difficulty**: {level} (1=Easy, 10=Impossible)
**Language**: NORWEGIAN (Norsk)

**Your Job**:
Create a unique opponent and scenario.
- **Easy Levels (1-3)**: Clumsy manipulation, obvious flaws.
- **Medium Levels (4-6)**: Subtle guilt-tripping, passive-aggressive.
- **Hard Levels (7+)**: Master manipulators, narcissists, gaslighting pros.

**Output Format**:
Return ONLY a JSON object:
{{
  "opponent_name": "Name (Norwegian)",
  "opponent_role": "Role (e.g. 'Gjerrig Sjef')",
  "attack_style": "Short description of their style (in Norwegian)",
  "weakness": "What works against them? (in Norwegian)",
  "win_condition": "Goal for the player (in Norwegian)",
  "difficulty_prompt": "Instructions for the AI playing this opponent. Be specific about their tone and tactics."
}}"#,
        title = topic.title,
        description = topic.description,
        level = level_number,
    )
}

pub fn round_prompt(level: &SparringLevel) -> String {
    format!(
        r#"You are the GAME MASTER for a verbal sparring match.
**Level**: {title}
**Opponent**: {name} ({role})
**Style**: {style}
**Weakness**: {weakness}
**Win Condition**: {win}
**Opponent Instructions**: {instructions}
**Language**: NORWEGIAN (Norsk)

**Your Job**:
Generate the next turn in the conversation.
1. **Context**: A brief setup (e.g., "Du kommer 5 minutter for sent.").
2. **Attack**: The opponent's line (Gaslighting/Manipulation).
3. **4 Options**: Distinct responses for the user.
   - **Critical Fail**: Defensive, apologetic, or aggressive (User takes 20-30 dmg).
   - **Weak**: Passive or vague (User takes 10-15 dmg).
   - **Good**: Clear boundary or fact-check (Opponent takes 10-15 dmg).
   - **Critical Hit**: Perfect counter using the specific weakness (Opponent takes 20-30 dmg).

**Output Format**:
Return ONLY a JSON object:
{{
  "context": "...",
  "attack": "...",
  "options": [
    {{ "text": "...", "damage_user": 30, "damage_opponent": 0, "feedback": "Ikke unnskyld deg!", "type": "critical_fail" }},
    {{ "text": "...", "damage_user": 10, "damage_opponent": 0, "feedback": "For passivt.", "type": "weak" }},
    {{ "text": "...", "damage_user": 0, "damage_opponent": 15, "feedback": "God grensesetting.", "type": "good" }},
    {{ "text": "...", "damage_user": 0, "damage_opponent": 30, "feedback": "Perfekt treff!", "type": "critical_hit" }}
  ]
}}"#,
        title = level.title,
        name = level.opponent_name,
        role = level.opponent_role,
        style = level.attack_style,
        weakness = level.weakness,
        win = level.win_condition,
        instructions = level.opponent_instructions,
    )
}

/// User prompt carrying the last few exchanges
pub fn round_history_prompt(history: &[ChatTurn]) -> String {
    let recent = &history[history.len().saturating_sub(ROUND_HISTORY_WINDOW)..];
    let history_text = if recent.is_empty() {
        "Start of conversation.".to_string()
    } else {
        recent
            .iter()
            .flat_map(|turn| {
                [
                    format!("Bruker: {}", turn.user),
                    format!("Motstander: {}", turn.assistant),
                ]
            })
            .collect::<Vec<_>>()
            .join("\n")
    };
    format!("**History**:\n{}\n\nGenerate the next round.", history_text)
}

pub fn batch_prompt(level: &SparringLevel, count: usize) -> String {
    format!(
        r#"You are the GAME MASTER for a verbal sparring match.
Generate {count} DIFFERENT nano-scenarios under the same topic.
Each round must have a distinct setting that still fits the topic (e.g. familieselskap, jobb-lunsj, treningssenter, chat/gruppe, taxi).
Each context should be 2-3 short sentences that set the scene before the attack.
Keep them concise and self-contained: one vivid setup + one attack + 4 responses.

**Opponent**: {name} ({role})
**Style**: {style}
**Weakness**: {weakness}
**Win Condition**: {win}
**Instructions**: {instructions}
**Language**: NORWEGIAN (Norsk)

Output ONLY a single JSON object containing an array of rounds:
{{
  "rounds": [
    {{
      "context": "... (2-3 setninger, hvor/hvordan skjer det nå?)",
      "attack": "... (setningen som triggere et svar)",
      "options": [
        {{ "text": "...", "damage_user": 25, "damage_opponent": 0, "feedback": "...", "type": "critical_fail" }},
        {{ "text": "...", "damage_user": 12, "damage_opponent": 0, "feedback": "...", "type": "weak" }},
        {{ "text": "...", "damage_user": 0, "damage_opponent": 12, "feedback": "...", "type": "good" }},
        {{ "text": "...", "damage_user": 0, "damage_opponent": 25, "feedback": "...", "type": "critical_hit" }}
      ]
    }}
  ]
}}
Rules: vary the setting each round, stay on topic, keep it short, no English.
Ensure the output is valid JSON."#,
        count = count,
        name = level.opponent_name,
        role = level.opponent_role,
        style = level.attack_style,
        weakness = level.weakness,
        win = level.win_condition,
        instructions = level.opponent_instructions,
    )
}

// =============================================================================
// Referee
// =============================================================================

pub struct Referee {
    gateway: Arc<AgentGateway>,
    random: Arc<dyn RandomPort>,
}

impl Referee {
    pub fn new(gateway: Arc<AgentGateway>, random: Arc<dyn RandomPort>) -> Self {
        Self { gateway, random }
    }

    fn shuffled(&self, mut round: SparringRound) -> SparringRound {
        round.shuffle_options(|n| pick_index(self.random.as_ref(), n));
        round
    }

    pub async fn try_generate_level(
        &self,
        topic: &SparringTopic,
        level_number: u32,
    ) -> Result<SparringLevel, GenerationError> {
        let raw = self
            .gateway
            .run_structured(AgentRole::Referee, &level_prompt(topic, level_number), None)
            .await?;
        let avatar = AVATAR_POOL[pick_index(self.random.as_ref(), AVATAR_POOL.len())];
        parse_level(&raw, topic, level_number, avatar)
    }

    /// Generated level, or the topic-based fallback on any failure
    pub async fn generate_level(&self, topic: &SparringTopic, level_number: u32) -> SparringLevel {
        match self.try_generate_level(topic, level_number).await {
            Ok(level) => {
                tracing::info!(level = level_number, opponent = %level.opponent_name, "Sparring level generated");
                level
            }
            Err(e) => {
                tracing::warn!(level = level_number, error = %e, "Level generation failed, using fallback");
                fallback_level(topic, level_number)
            }
        }
    }

    pub async fn try_generate_round(
        &self,
        level: &SparringLevel,
        history: &[ChatTurn],
    ) -> Result<SparringRound, GenerationError> {
        let user_prompt = round_history_prompt(history);
        let raw = self
            .gateway
            .run_structured(AgentRole::Referee, &round_prompt(level), Some(&user_prompt))
            .await?;
        parse_round(&raw).map(|round| self.shuffled(round))
    }

    pub async fn generate_round(&self, level: &SparringLevel, history: &[ChatTurn]) -> SparringRound {
        match self.try_generate_round(level, history).await {
            Ok(round) => round,
            Err(e) => {
                tracing::warn!(error = %e, "Round generation failed, using fallback");
                self.shuffled(fallback_round(level))
            }
        }
    }

    pub async fn try_generate_round_batch(
        &self,
        level: &SparringLevel,
        count: usize,
    ) -> Result<Vec<SparringRound>, GenerationError> {
        let raw = self
            .gateway
            .run_structured(AgentRole::Referee, &batch_prompt(level, count), None)
            .await?;
        Ok(parse_round_batch(&raw, count)?
            .into_iter()
            .map(|round| self.shuffled(round))
            .collect())
    }

    /// Between one and `count` generated rounds, or exactly `count` fallback rounds
    pub async fn generate_round_batch(&self, level: &SparringLevel, count: usize) -> Vec<SparringRound> {
        match self.try_generate_round_batch(level, count).await {
            Ok(rounds) => {
                tracing::info!(rounds = rounds.len(), "Round batch generated");
                rounds
            }
            Err(e) => {
                tracing::warn!(error = %e, "Batch generation failed, using fallback batch");
                fallback_batch(level, count)
                    .into_iter()
                    .map(|round| self.shuffled(round))
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedRandom;
    use crate::test_fixtures::{gateway_with, FailingLlm, ScriptedLlm};
    use motstand_domain::catalog::find_topic;
    use motstand_domain::game_rules::FALLBACK_CONTEXTS;

    fn topic() -> SparringTopic {
        find_topic("politisk_bedreviter").unwrap()
    }

    fn option_json(kind: &str, user: u32, opponent: u32) -> String {
        format!(
            r#"{{"text": "svar {kind}", "damage_user": {user}, "damage_opponent": {opponent}, "feedback": "ok", "type": "{kind}"}}"#
        )
    }

    fn round_json(context: &str) -> String {
        format!(
            r#"{{"context": "{context}", "attack": "Du tar feil.", "options": [{}, {}, {}, {}]}}"#,
            option_json("critical_fail", 25, 0),
            option_json("weak", 12, 0),
            option_json("good", 0, 12),
            option_json("critical_hit", 0, 25),
        )
    }

    fn referee(llm: Arc<dyn crate::infrastructure::ports::LlmPort>) -> Referee {
        let (gateway, _) = gateway_with(llm);
        Referee::new(gateway, Arc::new(FixedRandom(0)))
    }

    #[test]
    fn test_parse_level_fills_defaults() {
        let level = parse_level(
            r#"{"opponent_name": "Terje", "opponent_role": "Bedreviter"}"#,
            &topic(),
            4,
            "🦊",
        )
        .unwrap();

        assert_eq!(level.id, "politisk_bedreviter_lvl_4");
        assert_eq!(level.title, "Nivå 4: Bedreviter");
        assert_eq!(level.opponent_name, "Terje");
        assert_eq!(level.weakness, "Rolig fakta");
        assert_eq!(level.initial_opponent_hp, 120);
        assert_eq!(level.initial_player_hp, 100);
        assert_eq!(level.avatar, "🦊");
    }

    #[test]
    fn test_parse_level_accepts_code_fence() {
        let raw = "```json\n{\"opponent_name\": \"Kari\"}\n```";
        let level = parse_level(raw, &topic(), 1, "🔥").unwrap();
        assert_eq!(level.opponent_name, "Kari");
        assert_eq!(level.opponent_role, "Motstander");
    }

    #[test]
    fn test_parse_level_rejects_non_object() {
        assert!(matches!(
            parse_level("[1, 2]", &topic(), 1, "🔥"),
            Err(GenerationError::Schema(_))
        ));
        assert!(matches!(
            parse_level("ikke json", &topic(), 1, "🔥"),
            Err(GenerationError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_parse_round_requires_four_valid_options() {
        let round = parse_round(&round_json("Lunsj")).unwrap();
        assert_eq!(round.options().len(), 4);
        assert_eq!(round.context(), "Lunsj");

        let three = format!(
            r#"{{"attack": "Nei.", "options": [{}, {}, {}]}}"#,
            option_json("weak", 10, 0),
            option_json("good", 0, 10),
            option_json("critical_hit", 0, 20),
        );
        assert!(matches!(parse_round(&three), Err(GenerationError::Schema(_))));
    }

    #[test]
    fn test_option_records_are_strict() {
        let negative = r#"{"text": "a", "damage_user": -5, "damage_opponent": 0, "feedback": "f", "type": "weak"}"#;
        let fractional = r#"{"text": "a", "damage_user": 2.5, "damage_opponent": 0, "feedback": "f", "type": "weak"}"#;
        let missing = r#"{"text": "a", "damage_opponent": 0, "feedback": "f", "type": "weak"}"#;
        let extra = r#"{"text": "a", "damage_user": 1, "damage_opponent": 0, "feedback": "f", "type": "weak", "mood": "sint"}"#;
        let unknown_kind = r#"{"text": "a", "damage_user": 1, "damage_opponent": 0, "feedback": "f", "type": "meh"}"#;

        for raw in [negative, fractional, missing, extra, unknown_kind] {
            let value: Value = serde_json::from_str(raw).unwrap();
            assert!(
                serde_json::from_value::<OptionRecord>(value).is_err(),
                "accepted {}",
                raw
            );
        }
    }

    #[test]
    fn test_parse_batch_discards_malformed_and_caps_count() {
        let broken = format!(
            r#"{{"context": "Ødelagt", "options": [{}, {}, {}]}}"#,
            option_json("weak", 10, 0),
            option_json("good", 0, 10),
            option_json("critical_hit", 0, 20),
        );
        let raw = format!(
            r#"{{"rounds": [{}, {}, {}, {}]}}"#,
            round_json("A"),
            broken,
            round_json("B"),
            round_json("C"),
        );

        let rounds = parse_round_batch(&raw, 2).unwrap();

        assert_eq!(rounds.len(), 2);
        assert_eq!(rounds[0].context(), "A");
        assert_eq!(rounds[1].context(), "B");
    }

    #[test]
    fn test_parse_batch_without_rounds() {
        assert!(matches!(
            parse_round_batch(r#"{"rounds": []}"#, 5),
            Err(GenerationError::NoUsableRounds)
        ));
        assert!(matches!(
            parse_round_batch(r#"{"levels": []}"#, 5),
            Err(GenerationError::NoUsableRounds)
        ));
    }

    #[test]
    fn test_history_prompt_uses_last_three_turns() {
        let history: Vec<ChatTurn> = (1..=5)
            .map(|i| ChatTurn::new(format!("svar {}", i), format!("angrep {}", i)))
            .collect();

        let prompt = round_history_prompt(&history);

        assert!(!prompt.contains("svar 2"));
        assert!(prompt.contains("Bruker: svar 3\nMotstander: angrep 3"));
        assert!(prompt.contains("Bruker: svar 5"));
        assert_eq!(
            round_history_prompt(&[]),
            "**History**:\nStart of conversation.\n\nGenerate the next round."
        );
    }

    #[tokio::test]
    async fn test_generate_level_falls_back_to_topic() {
        let level = referee(Arc::new(FailingLlm)).generate_level(&topic(), 7).await;

        assert_eq!(level.id, "fallback");
        assert_eq!(level.opponent_name, topic().title);
        assert_eq!(level.initial_player_hp, 80);
        assert_eq!(level.initial_opponent_hp, 120);
    }

    #[tokio::test]
    async fn test_generate_level_picks_avatar_from_pool() {
        let llm = Arc::new(ScriptedLlm::new([r#"{"opponent_name": "Oda"}"#]));
        let level = referee(llm.clone()).generate_level(&topic(), 1).await;

        assert_eq!(level.avatar, AVATAR_POOL[0]);
        assert!(llm.prompt_text(0).contains("**Level Difficulty**: 1"));
    }

    #[tokio::test]
    async fn test_generate_round_uses_history_and_falls_back() {
        let llm = Arc::new(ScriptedLlm::new([round_json("Kontoret"), "{}".to_string()]));
        let referee = referee(llm.clone());
        let level = fallback_level(&topic(), 1);
        let history = vec![ChatTurn::new("Jeg er uenig", "Du tar feil")];

        let generated = referee.generate_round(&level, &history).await;
        let fallback = referee.generate_round(&level, &history).await;

        assert_eq!(generated.context(), "Kontoret");
        assert!(llm.prompt_text(0).contains("Bruker: Jeg er uenig"));
        assert!(fallback.attack().starts_with(&level.opponent_name));
        assert_eq!(fallback.options().len(), 4);
    }

    #[tokio::test]
    async fn test_failed_batch_gives_exactly_count_fallback_rounds() {
        let level = fallback_level(&topic(), 1);
        let rounds = referee(Arc::new(FailingLlm))
            .generate_round_batch(&level, 5)
            .await;

        assert_eq!(rounds.len(), 5);
        for (i, round) in rounds.iter().enumerate() {
            assert_eq!(round.context(), FALLBACK_CONTEXTS[i]);
            assert_eq!(round.options().len(), 4);
        }
    }

    #[tokio::test]
    async fn test_generated_batch_keeps_every_kind() {
        let raw = format!(r#"{{"rounds": [{}, {}]}}"#, round_json("A"), round_json("B"));
        let llm = Arc::new(ScriptedLlm::new([raw]));
        let level = fallback_level(&topic(), 1);

        let rounds = referee(llm).generate_round_batch(&level, 5).await;

        assert_eq!(rounds.len(), 2);
        assert!(rounds.iter().all(SparringRound::covers_every_kind));
    }
}
