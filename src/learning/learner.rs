use std::fmt;

use crate::dataset::Example;
use crate::pddl::{Action, Domain};

use super::grounding::ground_action_space;
use super::projection::{project, Combine};
use super::state::State;
use super::LearningError;

/// What has been learned about one action so far.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionModel {
    pub action: String,
    /// Literals held by every successful application.
    pub preconditions: State,
    /// Literals every observed successful transition made true. `None` until one is seen.
    pub effects: Option<State>,
    /// One entry per failed application: candidate preconditions the state did not satisfy.
    pub failures: Vec<State>,
    pub successes: usize,
    /// Examples of other actions.
    pub ignored: usize,
    /// Examples whose parameters cannot be paired with the action's (wrong count or a repeated object).
    pub skipped: usize,
}

impl fmt::Display for ActionModel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "action {}: {} successes, {} failures, {} ignored, {} skipped",
                 self.action, self.successes, self.failures.len(), self.ignored, self.skipped)?;
        writeln!(f, "preconditions:")?;
        write!(f, "{}", self.preconditions)?;
        match &self.effects {
            Some(effects) => {
                writeln!(f, "effects:")?;
                write!(f, "{}", effects)?;
            }
            None => writeln!(f, "effects: unknown")?,
        }
        for (i, failure) in self.failures.iter().enumerate() {
            writeln!(f, "failure {}:", i + 1)?;
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}

/// Folds examples of one action into an [`ActionModel`].
pub struct Learner<'a> {
    action: &'a Action,
    space: State,
    model: ActionModel,
}

impl<'a> Learner<'a> {
    pub fn new(domain: &'a Domain, action_name: &str) -> Result<Self, LearningError> {
        let action = domain.action(action_name)
            .ok_or_else(|| LearningError::UnknownAction(action_name.to_string()))?;
        let space = ground_action_space(domain, action_name)?;
        let model = ActionModel {
            action: action.name.clone(),
            preconditions: space.clone(),
            effects: None,
            failures: Vec::new(),
            successes: 0,
            ignored: 0,
            skipped: 0,
        };
        Ok(Self { action, space, model })
    }

    /// Folds one example into the model. Examples whose parameters do not pair up with
    /// the action's are logged and counted as skipped.
    pub fn observe(&mut self, example: &Example) -> Result<(), LearningError> {
        if !example.action.eq_ignore_ascii_case(&self.action.name) {
            tracing::trace!(action = %example.action, "ignoring example for another action");
            self.model.ignored += 1;
            return Ok(());
        }
        match self.apply(example) {
            Err(e @ (LearningError::AmbiguousBinding { .. } | LearningError::ArityMismatch { .. })) => {
                tracing::warn!(parameters = ?example.parameters, error = %e, "skipping example");
                self.model.skipped += 1;
                Ok(())
            }
            result => result,
        }
    }

    /// Projects everything first so a rejected example leaves the model untouched.
    fn apply(&mut self, example: &Example) -> Result<(), LearningError> {
        let params = example.parameters.as_slice();
        if !example.success {
            let explanation = project(&example.state, self.action, params, &self.model.preconditions, Combine::Difference)?;
            tracing::debug!(?params, unsatisfied = explanation.len(), "failed application");
            self.model.failures.push(explanation);
            return Ok(());
        }

        let preconditions = project(&example.state, self.action, params, &self.model.preconditions, Combine::Intersect)?;
        let added = match &example.next_state {
            Some(next) => {
                let before = project(&example.state, self.action, params, &self.space, Combine::Intersect)?;
                let after = project(next, self.action, params, &self.space, Combine::Intersect)?;
                Some(after.difference(&before))
            }
            None => None,
        };
        self.model.preconditions = preconditions;
        if let Some(added) = added {
            self.model.effects = Some(match self.model.effects.take() {
                Some(effects) => effects.intersection(&added),
                None => added,
            });
        }
        self.model.successes += 1;
        tracing::debug!(?params, candidates = self.model.preconditions.len(), "successful application");
        Ok(())
    }

    pub fn observe_all<'e, I>(&mut self, examples: I) -> Result<(), LearningError>
    where
        I: IntoIterator<Item = &'e Example>,
    {
        let _span = tracing::span!(tracing::Level::DEBUG, "learn", action = %self.action.name).entered();
        for example in examples {
            self.observe(example)?;
        }
        Ok(())
    }

    pub fn model(&self) -> &ActionModel {
        &self.model
    }

    pub fn into_model(self) -> ActionModel {
        self.model
    }
}
