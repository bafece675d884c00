//! Request sequencing with capability fallback.
//!
//! Executes the plan for one run against an open session: switch profile if
//! asked, update the recording path, then optionally make sure the replay
//! buffer is running. Older servers do not know the per-category profile
//! parameter requests; when they reject one as an unknown request type, the
//! plain recording-folder request is used instead. Any other rejection is
//! fatal and is not retried.

use anyhow::Result;

use crate::client::RequestRejected;

/// Simple output mode stores its recording path here.
const SIMPLE_CATEGORY: &str = "SimpleOutput";
const SIMPLE_PARAMETER: &str = "FilePath";

/// Advanced output mode uses a separate parameter.
const ADVANCED_CATEGORY: &str = "AdvOut";
const ADVANCED_PARAMETER: &str = "RecFilePath";

/// The requests a run needs from an open control-channel session.
///
/// `ObsClient` is the live implementation; tests drive the sequencer with a
/// scripted double.
pub trait RecorderControl {
    fn set_current_profile(&mut self, profile: &str) -> Result<()>;
    fn set_profile_parameter(&mut self, category: &str, parameter: &str, value: &str)
        -> Result<()>;
    fn get_profile_parameter(&mut self, category: &str, parameter: &str) -> Result<String>;
    fn set_recording_folder(&mut self, folder: &str) -> Result<()>;
    fn get_recording_folder(&mut self) -> Result<String>;
    fn replay_buffer_active(&mut self) -> Result<bool>;
    fn start_replay_buffer(&mut self) -> Result<()>;
}

/// Everything one run intends to do. Built from the CLI, never persisted.
#[derive(Debug, Clone)]
pub struct OperationPlan {
    /// Directory the server should write finished recordings into.
    pub record_path: String,
    /// Profile to switch to first; failure to switch aborts the run.
    pub profile: Option<String>,
    /// Try the per-category profile parameters before the folder request.
    pub per_category_first: bool,
    /// Check the replay buffer and start it when idle, best-effort.
    pub ensure_replay_buffer: bool,
}

/// Which path-update tier landed, with the server-confirmed value(s).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathUpdate {
    PerCategory {
        simple_output: String,
        advanced_output: String,
    },
    Folder(String),
}

/// Outcome of the replay-buffer step. `Unavailable` is degraded, not fatal:
/// the run still succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayOutcome {
    AlreadyActive,
    Started,
    Unavailable(String),
    Skipped,
}

/// What the sequencer confirmed for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub path: PathUpdate,
    pub replay: ReplayOutcome,
}

impl RunReport {
    /// True when the preferred per-category tier was planned but the server
    /// refused it and the folder tier was used instead.
    pub fn fell_back(&self, plan: &OperationPlan) -> bool {
        plan.per_category_first && matches!(self.path, PathUpdate::Folder(_))
    }
}

/// Does this error mean "the server does not know this request type"?
///
/// v4 servers phrase it as "invalid request type"; some builds say "unknown
/// request". Matched case-insensitively, and only on rejections the server
/// itself produced. Anything else (transport loss, genuine server errors)
/// must not look like a capability gap.
fn is_unsupported_request(error: &anyhow::Error) -> bool {
    let Some(rejected) = error.downcast_ref::<RequestRejected>() else {
        return false;
    };
    let message = rejected.message.to_lowercase();
    message.contains("invalid request type") || message.contains("unknown request")
}

/// Run the plan. Steps 1 and 2 abort on failure; the replay-buffer step is
/// contained and lands in the report instead.
pub fn run_plan<C: RecorderControl>(control: &mut C, plan: &OperationPlan) -> Result<RunReport> {
    if let Some(profile) = &plan.profile {
        control.set_current_profile(profile)?;
    }

    let path = if plan.per_category_first {
        match set_per_category(control, &plan.record_path) {
            Ok(update) => update,
            Err(error) if is_unsupported_request(&error) => {
                set_folder(control, &plan.record_path)?
            }
            Err(error) => return Err(error),
        }
    } else {
        set_folder(control, &plan.record_path)?
    };

    let replay = if plan.ensure_replay_buffer {
        ensure_replay_buffer(control)
    } else {
        ReplayOutcome::Skipped
    };

    Ok(RunReport { path, replay })
}

/// Preferred tier: set both output categories, then read both back.
fn set_per_category<C: RecorderControl>(control: &mut C, record_path: &str) -> Result<PathUpdate> {
    control.set_profile_parameter(SIMPLE_CATEGORY, SIMPLE_PARAMETER, record_path)?;
    control.set_profile_parameter(ADVANCED_CATEGORY, ADVANCED_PARAMETER, record_path)?;

    let simple_output = control.get_profile_parameter(SIMPLE_CATEGORY, SIMPLE_PARAMETER)?;
    let advanced_output = control.get_profile_parameter(ADVANCED_CATEGORY, ADVANCED_PARAMETER)?;

    Ok(PathUpdate::PerCategory {
        simple_output,
        advanced_output,
    })
}

/// Fallback tier: the single folder request, confirmed by its get.
fn set_folder<C: RecorderControl>(control: &mut C, record_path: &str) -> Result<PathUpdate> {
    control.set_recording_folder(record_path)?;
    let confirmed = control.get_recording_folder()?;
    Ok(PathUpdate::Folder(confirmed))
}

/// Best-effort: start the replay buffer when it is idle. A failing status
/// query means the feature is likely disabled; report it and move on without
/// issuing a start.
fn ensure_replay_buffer<C: RecorderControl>(control: &mut C) -> ReplayOutcome {
    match control.replay_buffer_active() {
        Ok(true) => ReplayOutcome::AlreadyActive,
        Ok(false) => match control.start_replay_buffer() {
            Ok(()) => ReplayOutcome::Started,
            Err(error) => ReplayOutcome::Unavailable(format!("{error:#}")),
        },
        Err(error) => ReplayOutcome::Unavailable(format!("{error:#}")),
    }
}
