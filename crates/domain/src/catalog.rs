//! Static catalogs: prebuilt scenarios, sparring topics and name pools

use crate::entities::{Scenario, SparringTopic};

pub const PREBUILT_SCENARIOS: [Scenario; 3] = [
    Scenario {
        id: "steamroller",
        title: "Dampveivalsen",
        summary: "En kollega som avbryter og overkjører deg i møter.",
        role: "Prosjektmedarbeider",
        situation: "Du sitter i et planleggingsmøte. Hver gang du prøver å legge frem ditt forslag, avbryter 'Reidar' deg med sine egne meninger og nekter å slippe deg til.",
        goal: "Få lagt frem forslaget ditt fullt ut og marker at du ikke vil bli avbrutt, uten å bli aggressiv.",
        difficulty_modifier: "Du er utålmodig og høylytt. Avbryt brukeren hvis de nøler. Vær overbevist om at din løsning er best.",
        opponent_name: "Reidar",
        icon: "😤",
        avatar_path: Some("assets/avatars/reidar.png"),
    },
    Scenario {
        id: "silent_wall",
        title: "Den stille veggen",
        summary: "En medarbeider som ikke gir respons eller tar initiativ.",
        role: "Teamleder",
        situation: "Du har et oppfølgingsmøte med 'Ingrid'. Hun leverer greit, men sier ingenting i møter og virker uengasjert. Du trenger at hun tar mer eierskap.",
        goal: "Få Ingrid til å åpne seg om hva hun tenker, og få en konkret forpliktelse til å bidra mer muntlig.",
        difficulty_modifier: "Vær unnvikende. Svar med enstavelsesord ('ja', 'nei', 'vet ikke'). Vær passiv, men ikke fiendtlig. La brukeren jobbe for å få deg i tale.",
        opponent_name: "Ingrid",
        icon: "😶",
        avatar_path: Some("assets/avatars/ingrid.png"),
    },
    Scenario {
        id: "guilt_tripper",
        title: "Samvittighetsfangen",
        summary: "En nabo/venn som bruker skyldfølelse for å få viljen sin.",
        role: "Nabo",
        situation: "Naboen 'Leif' ber deg vanne plantene hans i ferien for tredje gang i år. Det passer veldig dårlig for deg denne uken.",
        goal: "Si nei på en vennlig men bestemt måte, uten å la deg manipulere av hans 'stakkars meg'-historier.",
        difficulty_modifier: "Spill offeret. Bruk fraser som 'Jeg trodde vi var venner', 'Jeg har ingen andre', og 'Det er typisk at jeg alltid blir sittende alene med problemene'.",
        opponent_name: "Leif",
        icon: "🥺",
        avatar_path: Some("assets/avatars/leif.png"),
    },
];

/// Names handed to custom-scenario opponents the planner left unnamed
pub const OPPONENT_NAMES: [&str; 10] = [
    "Reidar", "Ingrid", "Marte", "Amar", "Siv", "Leif", "Aisha", "Håkon", "Nora", "Jonas",
];

/// Emoji avatars for generated sparring opponents
pub const AVATAR_POOL: [&str; 10] = ["💥", "😠", "😤", "😑", "😏", "🧊", "🧠", "🦊", "🪨", "🔥"];

/// Avatar of the deterministic fallback opponent
pub const FALLBACK_AVATAR: &str = "🤖";

pub fn find_scenario(id: &str) -> Option<&'static Scenario> {
    PREBUILT_SCENARIOS.iter().find(|s| s.id == id)
}

pub fn sparring_topics() -> Vec<SparringTopic> {
    vec![
        SparringTopic::new(
            "politisk_bedreviter",
            "Politisk Bedreviter",
            "Onkel ved middagsbordet som vet best om alt.",
            "🗣️",
        ),
        SparringTopic::new(
            "kantine_kommentator",
            "Kantine-kommentator",
            "Kollega som alltid overprøver meningene dine i lunsjen.",
            "🍽️",
        ),
        SparringTopic::new(
            "gym_guru",
            "Gym-guru",
            "Treningsbekjent som belærer deg om alt mulig.",
            "🏋️",
        ),
    ]
}

pub fn find_topic(id: &str) -> Option<SparringTopic> {
    sparring_topics().into_iter().find(|t| t.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steamroller_has_fixed_opponent() {
        let scenario = find_scenario("steamroller").unwrap();
        assert_eq!(scenario.title, "Dampveivalsen");

        let ctx = scenario.to_context();
        assert_eq!(ctx.opponent_name.as_deref(), Some("Reidar"));
        assert_eq!(ctx.agent_instructions.as_deref(), Some(scenario.difficulty_modifier));
        assert_eq!(ctx.avatar_path.as_deref(), Some("assets/avatars/reidar.png"));
    }

    #[test]
    fn test_catalog_ids_are_unique() {
        let mut ids: Vec<_> = PREBUILT_SCENARIOS.iter().map(|s| s.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), PREBUILT_SCENARIOS.len());
    }

    #[test]
    fn test_find_topic() {
        assert_eq!(find_topic("gym_guru").unwrap().title, "Gym-guru");
        assert!(find_topic("sjakk").is_none());
        assert!(find_scenario("sjakk").is_none());
    }
}
