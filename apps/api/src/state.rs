use std::sync::Arc;

use tracing::{info, warn};

use appointment_cell::AppointmentWorkflowService;
use classifier_cell::{Classifier, ClassifierClient, ClassifierError};
use diagnostic_cell::{DiagnosticPipeline, DiagnosticState, PhysicianReviewService};
use notification_cell::VisibilityNotifier;
use shared_config::AppConfig;
use shared_database::{
    FileStorage, InMemoryRecordStore, LocalFileStorage, RecordStore, SupabaseClient, SupabaseRecordStore,
};

/// Every service the HTTP layer needs, wired over one store and one file root.
pub struct AppServices {
    pub config: Arc<AppConfig>,
    pub workflow: Arc<AppointmentWorkflowService>,
    pub diagnostics: DiagnosticState,
    pub notifier: Arc<VisibilityNotifier>,
}

impl AppServices {
    pub fn from_config(config: AppConfig) -> Result<Self, ClassifierError> {
        let store: Arc<dyn RecordStore> = if config.is_configured() {
            info!("Using Supabase record store at {}", config.supabase_url);
            Arc::new(SupabaseRecordStore::new(Arc::new(SupabaseClient::new(&config))))
        } else {
            warn!("Supabase is not configured, records are kept in memory only");
            Arc::new(InMemoryRecordStore::new())
        };

        info!("Storing files under {}", config.storage_root.display());
        let files: Arc<dyn FileStorage> = Arc::new(LocalFileStorage::new(config.storage_root.clone()));
        let classifier: Arc<dyn Classifier> = Arc::new(ClassifierClient::new(&config)?);

        Ok(Self::with_components(Arc::new(config), store, files, classifier))
    }

    pub fn with_components(
        config: Arc<AppConfig>,
        store: Arc<dyn RecordStore>,
        files: Arc<dyn FileStorage>,
        classifier: Arc<dyn Classifier>,
    ) -> Self {
        let workflow = Arc::new(AppointmentWorkflowService::new(store.clone()));
        let diagnostics = DiagnosticState {
            pipeline: Arc::new(DiagnosticPipeline::new(store.clone(), files.clone(), classifier)),
            review: Arc::new(PhysicianReviewService::new(store.clone(), files.clone())),
        };
        let notifier = Arc::new(VisibilityNotifier::new(store, files, workflow.clone()));

        Self {
            config,
            workflow,
            diagnostics,
            notifier,
        }
    }
}
