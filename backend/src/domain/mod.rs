//! # Domain Module
//!
//! Business logic for the daily-target calendar and the leave workflow. It
//! operates on the collaborator traits in `storage` and knows nothing about
//! transports or rendering.
//!
//! ## Module Organization
//!
//! - **calendar**: fixed six-week month grid and month navigation
//! - **day_state**: overlay of targets and leave records onto the grid
//! - **leave_selection**: edit-mode selection of leave days and removals
//! - **leave_save**: two-phase bulk commit of a selection
//! - **month_view**: month loading and progress summary
//! - **clock** / **notifications**: injected collaborators for "today" and user notices

pub mod calendar;
pub mod clock;
pub mod day_state;
pub mod leave_save;
pub mod leave_selection;
pub mod month_view;
pub mod notifications;

pub use calendar::*;
pub use clock::*;
pub use day_state::*;
pub use leave_save::*;
pub use leave_selection::*;
pub use month_view::*;
pub use notifications::*;
