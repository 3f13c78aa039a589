//! Campaign creation as an explicit state machine.
//!
//! The bot's campaign dialogue collects one field per step. Each `step`
//! validates its input and returns the next stage; callers persist the draft
//! between steps instead of blocking on a synchronous conversation. Invalid
//! input fails the transition without advancing. A completed draft builds an
//! immutable [`Campaign`].

use crate::validation::{
    MAX_DESCRIPTION_BYTES_V1, MAX_TASKS_V1, MAX_TASK_FIELD_BYTES_V1, MAX_TITLE_BYTES_V1,
};
use crate::{AkariError, CampaignId, Points, Result};
use serde::{Deserialize, Serialize};

/// Campaign task, tagged-variant schema validated at the boundary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum TaskSpec {
    Follow { handle: String },
    Repost { post_url: String },
    JoinChannel { channel: String },
}

impl TaskSpec {
    fn validate(&self) -> Result<()> {
        let (field, value) = match self {
            TaskSpec::Follow { handle } => ("handle", handle),
            TaskSpec::Repost { post_url } => ("post_url", post_url),
            TaskSpec::JoinChannel { channel } => ("channel", channel),
        };
        if value.is_empty() || value.len() > MAX_TASK_FIELD_BYTES_V1 {
            return Err(AkariError::InvalidArgument(format!(
                "task {field} must be 1..={MAX_TASK_FIELD_BYTES_V1} bytes"
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftStage {
    Title,
    Description,
    Budget,
    Tasks,
    Confirm,
    Complete,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DraftInput {
    Title(String),
    Description(String),
    Budget(Points),
    AddTask(TaskSpec),
    FinishTasks,
    Confirm,
}

/// Partially collected campaign. Persistable between steps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    stage: DraftStage,
    title: Option<String>,
    description: Option<String>,
    budget: Option<Points>,
    tasks: Vec<TaskSpec>,
}

impl Draft {
    pub fn new() -> Self {
        Self {
            stage: DraftStage::Title,
            title: None,
            description: None,
            budget: None,
            tasks: Vec::new(),
        }
    }

    pub fn stage(&self) -> DraftStage {
        self.stage
    }

    /// Apply one collected field.
    ///
    /// Postconditions:
    /// - On `Ok`, the returned stage is the draft's new stage.
    /// - On `Err`, the draft is unchanged.
    pub fn step(&mut self, input: DraftInput) -> Result<DraftStage> {
        match (self.stage, input) {
            (DraftStage::Title, DraftInput::Title(title)) => {
                if title.is_empty() || title.len() > MAX_TITLE_BYTES_V1 {
                    return Err(AkariError::InvalidArgument(format!(
                        "title must be 1..={MAX_TITLE_BYTES_V1} bytes"
                    )));
                }
                self.title = Some(title);
                self.stage = DraftStage::Description;
            }
            (DraftStage::Description, DraftInput::Description(description)) => {
                if description.len() > MAX_DESCRIPTION_BYTES_V1 {
                    return Err(AkariError::InvalidArgument(format!(
                        "description exceeds {MAX_DESCRIPTION_BYTES_V1} bytes"
                    )));
                }
                self.description = Some(description);
                self.stage = DraftStage::Budget;
            }
            (DraftStage::Budget, DraftInput::Budget(budget)) => {
                if budget == Points::ZERO {
                    return Err(AkariError::InvalidArgument(
                        "reward budget must be positive".into(),
                    ));
                }
                self.budget = Some(budget);
                self.stage = DraftStage::Tasks;
            }
            (DraftStage::Tasks, DraftInput::AddTask(task)) => {
                task.validate()?;
                if self.tasks.len() >= MAX_TASKS_V1 {
                    return Err(AkariError::InvalidArgument(format!(
                        "campaign is limited to {MAX_TASKS_V1} tasks"
                    )));
                }
                self.tasks.push(task);
            }
            (DraftStage::Tasks, DraftInput::FinishTasks) => {
                if self.tasks.is_empty() {
                    return Err(AkariError::InvalidArgument(
                        "campaign needs at least one task".into(),
                    ));
                }
                self.stage = DraftStage::Confirm;
            }
            (DraftStage::Confirm, DraftInput::Confirm) => {
                self.stage = DraftStage::Complete;
            }
            (stage, _) => {
                return Err(AkariError::InvalidState(format!(
                    "unexpected input at stage {stage:?}"
                )));
            }
        }
        Ok(self.stage)
    }

    /// Build the immutable campaign from a completed draft.
    pub fn build(self, id: CampaignId) -> Result<Campaign> {
        if self.stage != DraftStage::Complete {
            return Err(AkariError::InvalidState(format!(
                "draft is not complete (stage {:?})",
                self.stage
            )));
        }
        Ok(Campaign {
            id,
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            budget: self.budget.unwrap_or(Points::ZERO),
            tasks: self.tasks,
        })
    }
}

impl Default for Draft {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub title: String,
    pub description: String,
    pub budget: Points,
    pub tasks: Vec<TaskSpec>,
}

impl Campaign {
    /// Scope key under which this campaign's completion events accrue.
    pub fn scope_key(&self) -> String {
        format!("campaign-{}", self.id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_draft() -> Draft {
        let mut draft = Draft::new();
        draft.step(DraftInput::Title("Spring push".into())).unwrap();
        draft
            .step(DraftInput::Description("Grow the channel".into()))
            .unwrap();
        draft
            .step(DraftInput::Budget(Points::from_whole(100).unwrap()))
            .unwrap();
        draft
            .step(DraftInput::AddTask(TaskSpec::Follow {
                handle: "@akari".into(),
            }))
            .unwrap();
        draft.step(DraftInput::FinishTasks).unwrap();
        draft.step(DraftInput::Confirm).unwrap();
        draft
    }

    #[test]
    fn walks_every_stage_in_order() {
        let draft = complete_draft();
        assert_eq!(draft.stage(), DraftStage::Complete);
        let campaign = draft.build(CampaignId(1)).unwrap();
        assert_eq!(campaign.title, "Spring push");
        assert_eq!(campaign.scope_key(), "campaign-1");
    }

    #[test]
    fn out_of_order_input_does_not_advance() {
        let mut draft = Draft::new();
        let err = draft.step(DraftInput::Confirm).unwrap_err();
        assert!(matches!(err, AkariError::InvalidState(_)));
        assert_eq!(draft.stage(), DraftStage::Title);
    }

    #[test]
    fn invalid_field_keeps_stage() {
        let mut draft = Draft::new();
        assert!(draft.step(DraftInput::Title(String::new())).is_err());
        assert_eq!(draft.stage(), DraftStage::Title);

        draft.step(DraftInput::Title("ok".into())).unwrap();
        draft.step(DraftInput::Description("d".into())).unwrap();
        assert!(draft.step(DraftInput::Budget(Points::ZERO)).is_err());
        assert_eq!(draft.stage(), DraftStage::Budget);
    }

    #[test]
    fn tasks_stage_requires_at_least_one_task() {
        let mut draft = Draft::new();
        draft.step(DraftInput::Title("t".into())).unwrap();
        draft.step(DraftInput::Description("d".into())).unwrap();
        draft
            .step(DraftInput::Budget(Points::from_whole(1).unwrap()))
            .unwrap();
        assert!(draft.step(DraftInput::FinishTasks).is_err());
        assert_eq!(draft.stage(), DraftStage::Tasks);
    }

    #[test]
    fn incomplete_draft_does_not_build() {
        let mut draft = Draft::new();
        draft.step(DraftInput::Title("t".into())).unwrap();
        assert!(draft.build(CampaignId(1)).is_err());
    }

    #[test]
    fn task_fields_are_bounded() {
        let mut draft = Draft::new();
        draft.step(DraftInput::Title("t".into())).unwrap();
        draft.step(DraftInput::Description("d".into())).unwrap();
        draft
            .step(DraftInput::Budget(Points::from_whole(1).unwrap()))
            .unwrap();
        let err = draft
            .step(DraftInput::AddTask(TaskSpec::Repost {
                post_url: String::new(),
            }))
            .unwrap_err();
        assert!(matches!(err, AkariError::InvalidArgument(_)));
    }
}
