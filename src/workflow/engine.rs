//! The step-graph executor.
//!
//! A workflow declares its steps, an entry point, an optional recovery
//! step, a pure routing function, and an async `apply` per step. The
//! executor runs steps strictly sequentially over one owned state value
//! and enforces the failure discipline:
//!
//! - an error escaping a step is recorded on the state (first error wins)
//!   and routing diverts to the recovery step, never back into the
//!   success path;
//! - an error escaping the recovery step itself is logged and swallowed;
//! - the recovery step always terminates the run.

use super::StepError;

/// Where to go after a step completes.
pub enum Transition<S> {
    Next(S),
    End,
}

/// Run state contract every workflow state implements. The error marker
/// is write-once: the first recorded error survives to the end of the run.
pub trait StepState: Send {
    fn error(&self) -> Option<&str>;
    fn record_error(&mut self, message: String);
}

/// One workflow definition: steps, routing, and per-step behavior.
#[async_trait::async_trait]
pub trait Workflow: Send + Sync {
    type State: StepState;
    type Step: Copy + PartialEq + std::fmt::Debug + Send;

    fn name(&self) -> &'static str;
    fn entry(&self) -> Self::Step;
    /// The shared error-handling step, if the workflow has one.
    fn recovery(&self) -> Option<Self::Step>;
    fn step_name(step: Self::Step) -> &'static str;

    /// Pure routing over the state a step just produced.
    fn route(&self, step: Self::Step, state: &Self::State) -> Transition<Self::Step>;

    /// Execute one step's side effects against the state.
    async fn apply(&self, step: Self::Step, state: &mut Self::State) -> Result<(), StepError>;
}

// A routing bug cannot loop forever; no workflow here has anywhere near
// this many steps.
const MAX_STEPS: usize = 32;

/// Drive a workflow from its entry step to termination.
pub async fn run_workflow<W: Workflow>(workflow: &W, state: &mut W::State) {
    let mut step = workflow.entry();
    let mut executed = 0usize;

    loop {
        if executed >= MAX_STEPS {
            tracing::error!(workflow = workflow.name(), "step limit reached, aborting run");
            state.record_error("workflow aborted: step limit reached".to_string());
            return;
        }
        executed += 1;

        let in_recovery = workflow.recovery() == Some(step);
        let step_name = W::step_name(step);
        let span = tracing::info_span!("workflow_step", workflow = workflow.name(), step = step_name);
        let result = tracing::Instrument::instrument(workflow.apply(step, state), span).await;

        if let Err(e) = result {
            if in_recovery {
                // A doubly-failed cleanup must never propagate.
                tracing::warn!(
                    workflow = workflow.name(),
                    step = step_name,
                    error = %e,
                    "recovery step failed"
                );
                return;
            }
            state.record_error(format!("{step_name} failed: {e}"));
        }

        if in_recovery {
            return;
        }

        // Structural short-circuit: once the error marker is set, the only
        // reachable step is recovery. Checked before routing so that a
        // failure in a graph-final step still reaches recovery instead of
        // ending on the success path.
        if state.error().is_some() {
            match workflow.recovery() {
                Some(recovery) => step = recovery,
                None => return,
            }
            continue;
        }

        step = match workflow.route(step, state) {
            Transition::Next(next) => next,
            Transition::End => return,
        };
    }
}
