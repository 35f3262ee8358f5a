//! Motstandstrener engine - console driver.

use std::str::FromStr;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use motstand_domain::catalog::PREBUILT_SCENARIOS;
use motstand_domain::{ArcadePhase, Difficulty};
use motstand_engine::infrastructure::settings::Settings;
use motstand_engine::use_cases::{SessionError, Step, TrainingSession};
use motstand_engine::App;

const HELP: &str = "\
Kommandoer:
  scenarios | select <id> | custom <rolle> | <situasjon> | <mål>
  option <id> | difficulty <easy|medium|hard> | start
  say <tekst> | done | feedback | reflect | back
  sparring | topic <id> | answer <1-4> | next | restart | menu
  status | reset | profile | help | quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv_from_repo_root();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "motstand_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Motstandstrener engine");

    let settings = Settings::from_env()?;
    let app = App::new(&settings).await?;
    let mut session = app.new_session();

    println!("{}", HELP);
    print_state(&mut session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match Command::from_str(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }
        if let Err(e) = execute(&app, &mut session, command).await {
            match e {
                SessionError::Rerouted(step) => println!("Tilbake til {}", step),
                other => println!("Feil: {}", other),
            }
        }
        print_state(&mut session);
    }

    tracing::info!("Console closed");
    Ok(())
}

/// Load `.env.local` and `.env` from the workspace root when present.
fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Help,
    Status,
    Scenarios,
    Select(String),
    Custom {
        role: String,
        situation: String,
        goal: String,
    },
    Option(String),
    Difficulty(Difficulty),
    Start,
    Say(String),
    Done,
    Feedback,
    Reflect,
    Back,
    Sparring,
    Topic(String),
    Answer(usize),
    Next,
    Restart,
    Menu,
    Reset,
    Profile,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let argument = |name: &str| {
            if rest.is_empty() {
                Err(format!("{} mangler et argument", name))
            } else {
                Ok(rest.to_string())
            }
        };

        match word.to_lowercase().as_str() {
            "" | "help" => Ok(Command::Help),
            "status" => Ok(Command::Status),
            "scenarios" => Ok(Command::Scenarios),
            "select" => argument("select").map(Command::Select),
            "custom" => {
                let parts: Vec<&str> = rest.split('|').map(str::trim).collect();
                match parts.as_slice() {
                    [role, situation, goal] => Ok(Command::Custom {
                        role: role.to_string(),
                        situation: situation.to_string(),
                        goal: goal.to_string(),
                    }),
                    _ => Err("custom <rolle> | <situasjon> | <mål>".to_string()),
                }
            }
            "option" => argument("option").map(Command::Option),
            "difficulty" => Difficulty::from_str(rest)
                .map(Command::Difficulty)
                .map_err(|e| e.to_string()),
            "start" => Ok(Command::Start),
            "say" => argument("say").map(Command::Say),
            "done" => Ok(Command::Done),
            "feedback" => Ok(Command::Feedback),
            "reflect" => Ok(Command::Reflect),
            "back" => Ok(Command::Back),
            "sparring" => Ok(Command::Sparring),
            "topic" => argument("topic").map(Command::Topic),
            "answer" => match rest.parse::<usize>() {
                Ok(n) if n >= 1 => Ok(Command::Answer(n - 1)),
                _ => Err("answer <1-4>".to_string()),
            },
            "next" => Ok(Command::Next),
            "restart" => Ok(Command::Restart),
            "menu" => Ok(Command::Menu),
            "reset" => Ok(Command::Reset),
            "profile" => Ok(Command::Profile),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(format!("Ukjent kommando: {}", other)),
        }
    }
}

async fn execute(
    app: &App,
    session: &mut TrainingSession,
    command: Command,
) -> Result<(), SessionError> {
    match command {
        Command::Help => println!("{}", HELP),
        Command::Status | Command::Quit => {}
        Command::Scenarios => {
            for scenario in PREBUILT_SCENARIOS.iter() {
                println!("  {} {}: {}", scenario.icon, scenario.id, scenario.title);
            }
        }
        Command::Select(id) => session.select_prebuilt(&id)?,
        Command::Custom {
            role,
            situation,
            goal,
        } => {
            if session.step() == Step::SelectScenario {
                session.begin_custom()?;
            }
            session.submit_custom(&role, &situation, &goal).await?;
            for option in session.scenario_options() {
                println!("  {}: {} - {}", option.id, option.title, option.summary);
            }
        }
        Command::Option(id) => session.choose_option(&id)?,
        Command::Difficulty(difficulty) => session.set_difficulty(difficulty)?,
        Command::Start => {
            session.start_training().await?;
            session.open_chat().await?;
            if let Some(turn) = session.chat_history().last() {
                println!("> {}", turn.assistant);
            }
        }
        Command::Say(text) => match session.step() {
            Step::Reflection => println!("> {}", session.send_reflection_message(&text).await?),
            _ => println!("> {}", session.send_chat_message(&text).await?),
        },
        Command::Done => {
            session.complete_scenario()?;
            println!("{}", session.load_feedback().await?);
        }
        Command::Feedback => println!("{}", session.load_feedback().await?),
        Command::Reflect => {
            session.start_reflection().await?;
            session.open_reflection().await?;
            if let Some(turn) = session.reflection_history().last() {
                println!("> {}", turn.assistant);
            }
        }
        Command::Back => {
            session.go_back()?;
        }
        Command::Sparring => {
            session.open_sparring_menu()?;
            for topic in session.topics() {
                println!("  {} {}: {}", topic.icon, topic.id, topic.title);
            }
        }
        Command::Topic(id) => {
            session.start_sparring(&id).await?;
            session.prepare_game().await?;
        }
        Command::Answer(index) => {
            let exchange = session.choose_sparring_option(index)?;
            println!("  [{}] {}", exchange.kind.verdict(), exchange.feedback);
            session.prepare_game().await?;
        }
        Command::Next => {
            session.next_level()?;
            session.prepare_game().await?;
        }
        Command::Restart => session.restart_sparring()?,
        Command::Menu => session.exit_to_menu()?,
        Command::Reset => session.reset_for_new_scenario().await?,
        Command::Profile => match app.profiler() {
            Some(profiler) => {
                for entry in profiler.drain() {
                    println!("  {} {} ms", entry.name, entry.duration_ms);
                }
            }
            None => println!("Profilering er av (PROFILE_AGENTS=true)"),
        },
    }
    Ok(())
}

fn print_state(session: &mut TrainingSession) {
    println!("[{}]", session.step());
    if session.step() != Step::Game {
        return;
    }
    let Some(game) = session.game() else {
        return;
    };
    let phase = game.phase();
    let header = format!(
        "  Nivå {} | Poeng {} | Du {} HP | Motstander {} HP | {}",
        game.level_number,
        game.score,
        game.player_hp,
        game.opponent_hp,
        game.progress_label()
    );
    println!("{}", header);

    match phase {
        ArcadePhase::PlayerDepleted => println!("  Game over. 'restart' for å prøve igjen."),
        ArcadePhase::BatchExhausted => println!("  Nivået er ferdig. 'next' eller 'menu'."),
        _ => {
            if let Some(round) = session.current_round() {
                println!("  {}", round.context());
                println!("  \"{}\"", round.attack());
                for (i, option) in round.options().iter().enumerate() {
                    println!("    {}. {}", i + 1, option.text);
                }
            }
        }
    }
}
