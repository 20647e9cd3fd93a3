//! # Target Tracker Backend
//!
//! Non-UI logic for the daily-target tracker: the month calendar, the overlay
//! of targets and leave onto it, and the leave editing workflow.
//!
//! ## Architecture
//!
//! ```text
//! Presentation layer (any UI)
//!     ↓
//! Domain Layer (calendar, selection session, bulk save)
//!     ↓
//! Storage traits (target and leave services)
//! ```

pub mod config;
pub mod domain;
pub mod logging;
pub mod storage;

use std::sync::Arc;
use tracing::info;

use crate::config::TrackerConfig;
use crate::domain::{CalendarService, Clock, LeaveSaveService, MonthViewService, Notifier};
use crate::storage::{LeaveStorage, TargetStorage};

pub use domain::*;
pub use storage::*;

/// Services wired together for one user session
pub struct AppState<T, L> {
    pub config: TrackerConfig,
    pub calendar_service: CalendarService,
    pub month_view_service: MonthViewService<T, L>,
    pub leave_save_service: LeaveSaveService<T, L>,
}

/// Wire the services from configuration and the external collaborators
pub fn initialize_backend<T, L>(
    config: TrackerConfig,
    target_storage: Arc<T>,
    leave_storage: Arc<L>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
) -> AppState<T, L>
where
    T: TargetStorage + 'static,
    L: LeaveStorage,
{
    info!("Setting up domain services");
    let calendar_service = CalendarService::new(config.calendar.clone(), clock);
    let month_view_service = MonthViewService::new(
        calendar_service.clone(),
        Arc::clone(&target_storage),
        Arc::clone(&leave_storage),
    );
    let leave_save_service = LeaveSaveService::new(
        target_storage,
        leave_storage,
        notifier,
        config.calendar.clone(),
        config.leave.revalidation,
    );

    AppState {
        config,
        calendar_service,
        month_view_service,
        leave_save_service,
    }
}
