//! Application context - dependency injection container

use std::sync::Arc;

use slotwise_core::{
    AgentService, AvailabilityRepository, AvailabilityService, BookingRepository, BookingService,
    CalendarGateway, ConversationRepository, KnowledgeBase, Mailer, Notifier, RescheduleService,
    SyncService, UserRepository, UserService,
};
use slotwise_domain::{AgentConfig, AppConfig, Result};
use slotwise_infra::knowledge::load_knowledge_file;
use slotwise_infra::{
    Argon2PasswordHasher, DbManager, GmailMailer, GoogleCalendarGateway, GoogleEndpoints,
    GoogleOAuth, HttpClient, JwtTokenService, NoopMailer, OpenAIClient,
    SqliteAvailabilityRepository, SqliteBookingRepository, SqliteConversationRepository,
    SqliteUserRepository,
};
use tracing::{info, warn};

/// Application context - holds all services and adapters
pub struct AppContext {
    pub config: AppConfig,
    pub db: Arc<DbManager>,

    // Use cases
    pub users: Arc<UserService>,
    pub availability: Arc<AvailabilityService>,
    pub bookings: Arc<BookingService>,
    pub reschedule: Arc<RescheduleService>,
    pub sync: Arc<SyncService>,
    pub agent: Arc<AgentService>,

    // Adapters used directly by handlers
    pub oauth: Arc<GoogleOAuth>,
    pub user_repository: Arc<dyn UserRepository>,
}

impl AppContext {
    /// Wire the context against the real Google endpoints.
    pub fn new(config: AppConfig) -> Result<Self> {
        Self::with_endpoints(config, GoogleEndpoints::default())
    }

    /// Open the database, run migrations and build every service.
    pub fn with_endpoints(config: AppConfig, endpoints: GoogleEndpoints) -> Result<Self> {
        let db = Arc::new(DbManager::new(&config.database.path, config.database.pool_size)?);
        db.run_migrations()?;

        let http = HttpClient::new()?;

        let user_repository: Arc<dyn UserRepository> =
            Arc::new(SqliteUserRepository::new(Arc::clone(&db)));
        let slot_repository: Arc<dyn AvailabilityRepository> =
            Arc::new(SqliteAvailabilityRepository::new(Arc::clone(&db)));
        let booking_repository: Arc<dyn BookingRepository> =
            Arc::new(SqliteBookingRepository::new(Arc::clone(&db)));
        let conversation_repository: Arc<dyn ConversationRepository> =
            Arc::new(SqliteConversationRepository::new(Arc::clone(&db)));

        let oauth = Arc::new(
            GoogleOAuth::new(&config.google, http.clone()).with_endpoints(endpoints.clone()),
        );
        if !oauth.is_configured() {
            warn!("Google OAuth client is not configured; sign-in and calendar are unavailable");
        }
        let calendars: Arc<dyn CalendarGateway> = Arc::new(GoogleCalendarGateway::new(
            Arc::clone(&oauth),
            Arc::clone(&user_repository),
            http.clone(),
            endpoints.events_url.clone(),
        ));

        let mailer: Arc<dyn Mailer> = if config.email.enabled {
            Arc::new(GmailMailer::new(
                http.clone(),
                endpoints.gmail_send_url.clone(),
                config.email.from_name.clone(),
            ))
        } else {
            Arc::new(NoopMailer)
        };
        let notifier = Notifier::new(mailer, config.server.base_url.clone());

        let tokens = Arc::new(JwtTokenService::new(
            &config.auth.secret_key,
            config.auth.access_token_expire_minutes,
        )?);
        let users = Arc::new(UserService::new(
            Arc::clone(&user_repository),
            Arc::new(Argon2PasswordHasher::new()),
            tokens,
            notifier.clone(),
        ));

        let availability = Arc::new(AvailabilityService::new(
            Arc::clone(&slot_repository),
            Arc::clone(&booking_repository),
            Arc::clone(&calendars),
        ));
        let bookings = Arc::new(BookingService::new(
            Arc::clone(&booking_repository),
            slot_repository,
            Arc::clone(&user_repository),
            Arc::clone(&calendars),
            Arc::clone(&availability),
            notifier.clone(),
        ));
        let reschedule = Arc::new(RescheduleService::new(
            Arc::clone(&booking_repository),
            Arc::clone(&calendars),
            notifier,
        ));
        let sync = Arc::new(SyncService::new(
            Arc::clone(&user_repository),
            booking_repository,
            Arc::clone(&calendars),
            config.sync.clone(),
        ));

        let mut agent = AgentService::new(
            Arc::clone(&bookings),
            Arc::clone(&availability),
            conversation_repository,
            calendars,
            build_knowledge(&config.agent),
        );
        let api_key = config.openai.api_key.as_deref().filter(|key| !key.trim().is_empty());
        if let Some(api_key) = api_key {
            let client = OpenAIClient::new(api_key, http).with_model(config.openai.model.clone());
            agent = agent.with_language_model(Arc::new(client));
        }
        info!(
            llm_enabled = agent.llm_enabled(),
            email_enabled = config.email.enabled,
            "application context ready"
        );

        Ok(Self {
            config,
            db,
            users,
            availability,
            bookings,
            reschedule,
            sync,
            agent: Arc::new(agent),
            oauth,
            user_repository,
        })
    }
}

/// Seed knowledge, extended with the configured knowledge file when it loads.
fn build_knowledge(config: &AgentConfig) -> KnowledgeBase {
    let mut knowledge = KnowledgeBase::default();
    if let Some(path) = config.knowledge_path.as_deref() {
        match load_knowledge_file(path) {
            Ok(categories) => {
                let added = knowledge.merge(categories);
                info!(path, added, "extended knowledge base from file");
            }
            Err(err) => warn!(path, error = %err, "ignoring knowledge file"),
        }
    }
    knowledge
}
