//! Sparring rules with no model involved: deterministic fallback content
//!
//! Everything here is pure. Option order in fallback rounds is fixed; the
//! engine shuffles before showing them.

use crate::catalog::FALLBACK_AVATAR;
use crate::entities::{
    OptionKind, SparringLevel, SparringOption, SparringRound, SparringTopic, ROUND_OPTION_COUNT,
};
use crate::value_objects::StartingHitPoints;

const FALLBACK_ROUND_CONTEXT: &str = "Systemgenerert runde: en pågående samtalepartner utfordrer deg. Du er i en hverdagssituasjon og merker at motparten presser agendaen sin.";

/// Scene templates cycled through by [`fallback_batch`]
pub const FALLBACK_CONTEXTS: [&str; 5] = [
    "Familiebesøk: onkel tar ordet ved middagsbordet, alle lytter mens han gjør et poeng ut av politikken.",
    "Kantina på jobb: kollega kommenterer høyt mens flere rundt dere følger med.",
    "Treningssenteret: en bekjent starter småprat og vil fortelle deg hvordan ting bør gjøres.",
    "Chatgruppe: noen kaster inn en spiss kommentar og forventer svar fra deg.",
    "Taxi-kø: en fremmed vil diskutere temaet og presser på mens dere venter.",
];

/// Level title as shown in the arcade header
pub fn level_title(level_number: u32, opponent: &str) -> String {
    format!("Nivå {}: {}", level_number, opponent)
}

fn or_default(value: &str) -> String {
    if value.trim().is_empty() {
        "Motstander".to_string()
    } else {
        value.to_string()
    }
}

/// Opponent used when level generation fails
pub fn fallback_level(topic: &SparringTopic, level_number: u32) -> SparringLevel {
    let hp = StartingHitPoints::for_level(level_number);
    let opponent = or_default(&topic.title);

    SparringLevel {
        id: "fallback".to_string(),
        title: level_title(level_number, &opponent),
        opponent_role: or_default(&topic.description),
        opponent_name: opponent,
        attack_style: "Belærende og pressende".to_string(),
        weakness: "Rolig fakta og grensesetting".to_string(),
        win_condition: "Hold deg saklig og avslutt på dine premisser".to_string(),
        opponent_instructions:
            "Vær pågående og overbevist om at du har rett, men uten å bli aggressiv.".to_string(),
        initial_player_hp: hp.player,
        initial_opponent_hp: hp.opponent,
        avatar: FALLBACK_AVATAR.to_string(),
    }
}

fn fallback_options() -> [SparringOption; ROUND_OPTION_COUNT] {
    [
        SparringOption::new(
            "Ok, kanskje du har rett, jeg dropper det.",
            25,
            0,
            "Du ga opp for lett.",
            OptionKind::CriticalFail,
        ),
        SparringOption::new(
            "La oss ta dette senere.",
            12,
            0,
            "Uklart og forsinkende.",
            OptionKind::Weak,
        ),
        SparringOption::new(
            "Jeg hører deg, men faktum er at vi avtalte dette.",
            0,
            12,
            "Tydelig grensesetting.",
            OptionKind::Good,
        ),
        SparringOption::new(
            "Jeg forholder meg til avtalen: vi gjør det slik, punktum.",
            0,
            24,
            "Presist og stødig.",
            OptionKind::CriticalHit,
        ),
    ]
}

/// Round used when single-round generation fails
pub fn fallback_round(level: &SparringLevel) -> SparringRound {
    let attack = format!(
        "{}: 'Dette henger ikke på greip, hvorfor presser du dette?'",
        level.opponent_name
    );

    SparringRound::from_options(FALLBACK_ROUND_CONTEXT, attack, fallback_options())
}

/// `count` fallback rounds, cycling through [`FALLBACK_CONTEXTS`]
pub fn fallback_batch(level: &SparringLevel, count: usize) -> Vec<SparringRound> {
    let base = fallback_round(level);
    (0..count)
        .map(|i| base.with_context(FALLBACK_CONTEXTS[i % FALLBACK_CONTEXTS.len()]))
        .collect()
}
