//! Application state: database, session store, prompts and the optional OpenAI client.
//!
//! Built once at startup. The skill registry is synced into the database here,
//! so every skill a session can practice has a row to hang progress on.

use tracing::{info, instrument};

use crate::config::{load_tutor_config_from_env, Prompts, Settings, TutorConfig};
use crate::db::Db;
use crate::error::StoreError;
use crate::openai::OpenAI;
use crate::registry::SKILLS;
use crate::session::SessionStore;

pub struct AppState {
    pub db: Db,
    pub sessions: SessionStore,
    pub openai: Option<OpenAI>,
    pub prompts: Prompts,
}

impl AppState {
    /// Build state from env: load config, open the database, sync the registry, init OpenAI.
    #[instrument(level = "info", skip_all)]
    pub fn from_env(settings: &Settings) -> Result<Self, StoreError> {
        let cfg = load_tutor_config_from_env();
        let db = Db::open(&settings.database_path)?;

        let openai = OpenAI::from_env();
        if let Some(oa) = &openai {
            info!(target: "algebra_tutor", base_url = %oa.base_url, chat_model = %oa.chat_model, vision_model = %oa.vision_model, "OpenAI enabled.");
        } else {
            info!(target: "algebra_tutor", "OpenAI disabled (no OPENAI_API_KEY). Tutor chat and drawing checks will answer 503.");
        }

        Self::with_parts(db, cfg, openai)
    }

    pub fn with_parts(db: Db, cfg: TutorConfig, openai: Option<OpenAI>) -> Result<Self, StoreError> {
        let report = db.sync_registry(SKILLS, &cfg.dependencies)?;
        info!(
            target: "algebra_tutor",
            skills = SKILLS.len(),
            inserted = report.inserted,
            updated = report.updated,
            edges_added = report.edges_added,
            "Skill registry synced"
        );

        Ok(Self { db, sessions: SessionStore::default(), openai, prompts: cfg.prompts })
    }
}
