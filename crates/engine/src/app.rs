//! Application state and composition.

use std::sync::Arc;

use crate::infrastructure::{
    agent_gateway::{AgentGateway, AgentRegistry},
    clock::{SystemClock, SystemRandom},
    openai::OpenAiClient,
    ports::{ClockPort, LlmPort, RandomPort, SessionMemoryPort, SessionStoreError, TelemetryPort},
    profiler::{NoopTelemetry, Profiler},
    resilient_llm::ResilientLlmClient,
    session::{AgentSessions, InMemorySessionMemory, SqliteSessionMemory},
    settings::{SessionDb, Settings, SparringSettings},
};
use crate::use_cases::{
    sparring::{ArcadeEngine, Referee},
    SparringUseCases, TrainingSession, TrainingUseCases,
};

/// Main application state.
///
/// Shared by every [`TrainingSession`]; sessions own only per-user state.
pub struct App {
    pub use_cases: UseCases,
    pub llm: Arc<dyn LlmPort>,
    pub gateway: Arc<AgentGateway>,
    memory: Arc<dyn SessionMemoryPort>,
    random: Arc<dyn RandomPort>,
    profiler: Option<Arc<Profiler>>,
}

/// Container for all use cases.
pub struct UseCases {
    pub training: Arc<TrainingUseCases>,
    pub sparring: Arc<SparringUseCases>,
}

impl App {
    /// Wire the production adapters described by `settings`.
    pub async fn new(settings: &Settings) -> Result<Self, SessionStoreError> {
        let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
        let random: Arc<dyn RandomPort> = Arc::new(SystemRandom::new());

        let openai = Arc::new(OpenAiClient::new(
            &settings.openai.base_url,
            Some(settings.openai.api_key.clone()),
            &settings.openai.scenario_model,
        ));
        tracing::info!(
            base_url = %settings.openai.base_url,
            max_retries = settings.retry.max_retries,
            base_delay_ms = settings.retry.base_delay_ms,
            "LLM client configured"
        );
        let llm: Arc<dyn LlmPort> = Arc::new(ResilientLlmClient::new(
            openai,
            settings.retry.clone(),
            random.clone(),
        ));

        let memory: Arc<dyn SessionMemoryPort> = match &settings.session_db {
            SessionDb::Sqlite(path) => {
                tracing::info!(path = %path, "Using SQLite session memory");
                Arc::new(SqliteSessionMemory::new(path, clock.clone()).await?)
            }
            SessionDb::InMemory => {
                tracing::info!("Using in-memory session memory");
                Arc::new(InMemorySessionMemory::new())
            }
        };

        let profiler = settings
            .profile_agents
            .then(|| Arc::new(Profiler::new(clock)));

        Ok(Self::from_parts(
            llm,
            memory,
            random,
            profiler,
            AgentRegistry::from_settings(&settings.openai),
            settings.sparring,
        ))
    }

    /// Wire the use cases around already-built adapters.
    pub fn from_parts(
        llm: Arc<dyn LlmPort>,
        memory: Arc<dyn SessionMemoryPort>,
        random: Arc<dyn RandomPort>,
        profiler: Option<Arc<Profiler>>,
        registry: AgentRegistry,
        sparring_settings: SparringSettings,
    ) -> Self {
        let telemetry: Arc<dyn TelemetryPort> = match &profiler {
            Some(profiler) => profiler.clone(),
            None => Arc::new(NoopTelemetry),
        };
        let gateway = Arc::new(AgentGateway::new(
            llm.clone(),
            memory.clone(),
            registry,
            telemetry,
        ));

        let training = Arc::new(TrainingUseCases::new(gateway.clone()));
        let referee = Arc::new(Referee::new(gateway.clone(), random.clone()));
        let engine = Arc::new(ArcadeEngine::new(referee.clone(), sparring_settings));
        let sparring = Arc::new(SparringUseCases::new(referee, engine));

        Self {
            use_cases: UseCases { training, sparring },
            llm,
            gateway,
            memory,
            random,
            profiler,
        }
    }

    /// Fresh per-user session with its own agent memory sessions
    pub fn new_session(&self) -> TrainingSession {
        TrainingSession::new(
            self.use_cases.training.clone(),
            self.use_cases.sparring.clone(),
            self.random.clone(),
            AgentSessions::new(self.memory.clone(), self.random.clone()),
        )
    }

    pub fn profiler(&self) -> Option<&Arc<Profiler>> {
        self.profiler.as_ref()
    }
}
