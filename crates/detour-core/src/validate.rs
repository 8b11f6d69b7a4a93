//! The business-rule contract applied to candidate aggregates before
//! persistence.
//!
//! Validation failure is never fatal to a reconciliation run: callers count
//! the rejection (separately per destination) and continue with the next
//! candidate.

use thiserror::Error;

use crate::disruption::{Consequence, ConsequenceDetail, Disruption};

pub const MAX_SUMMARY_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 1000;
pub const MAX_CONSEQUENCE_DESCRIPTION_LEN: usize = 500;
pub const MAX_DELAY_MINUTES: u32 = 999;
pub const MAX_MESSAGE_LEN: usize = 280;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
  #[error("summary is empty or longer than {MAX_SUMMARY_LEN} characters")]
  BadSummary,

  #[error("description is empty or longer than {MAX_DESCRIPTION_LEN} characters")]
  BadDescription,

  #[error("publish window has no start")]
  MissingPublishStart,

  #[error("validity window ends before it starts")]
  ValidityInverted,

  #[error("publish window ends before it starts")]
  PublishInverted,

  #[error("consequence {index}: description is empty or too long")]
  BadConsequenceDescription { index: u32 },

  #[error("consequence {index}: delay of {minutes} minutes is out of range")]
  DelayOutOfRange { index: u32, minutes: u32 },

  #[error("consequence {index}: payload is empty for its kind")]
  EmptyConsequencePayload { index: u32 },

  #[error("social media post {index}: message is empty or longer than {MAX_MESSAGE_LEN} characters")]
  BadPostMessage { index: u32 },
}

/// Check a candidate aggregate against the structural and business-rule
/// contract. The first violated rule is reported.
pub fn validate(candidate: &Disruption) -> Result<(), ValidationError> {
  if candidate.summary.is_empty() || candidate.summary.len() > MAX_SUMMARY_LEN
  {
    return Err(ValidationError::BadSummary);
  }
  if candidate.description.is_empty()
    || candidate.description.len() > MAX_DESCRIPTION_LEN
  {
    return Err(ValidationError::BadDescription);
  }
  if candidate.publish_start.is_none() {
    return Err(ValidationError::MissingPublishStart);
  }
  if let (Some(start), Some(end)) =
    (candidate.validity_start, candidate.validity_end)
    && end < start
  {
    return Err(ValidationError::ValidityInverted);
  }
  if let (Some(start), Some(end)) =
    (candidate.publish_start, candidate.publish_end)
    && end < start
  {
    return Err(ValidationError::PublishInverted);
  }

  for consequence in &candidate.consequences {
    validate_consequence(consequence)?;
  }

  for post in &candidate.social_media_posts {
    if post.message.is_empty() || post.message.len() > MAX_MESSAGE_LEN {
      return Err(ValidationError::BadPostMessage { index: post.index });
    }
  }

  Ok(())
}

fn validate_consequence(
  consequence: &Consequence,
) -> Result<(), ValidationError> {
  let index = consequence.index;

  if consequence.description.is_empty()
    || consequence.description.len() > MAX_CONSEQUENCE_DESCRIPTION_LEN
  {
    return Err(ValidationError::BadConsequenceDescription { index });
  }
  if let Some(minutes) = consequence.delay_minutes
    && minutes > MAX_DELAY_MINUTES
  {
    return Err(ValidationError::DelayOutOfRange { index, minutes });
  }

  // A scoped consequence must name at least one thing in scope.
  let empty = match &consequence.detail {
    ConsequenceDetail::NetworkWide => false,
    ConsequenceDetail::OperatorWide { operators } => operators.is_empty(),
    ConsequenceDetail::Services { services, .. } => services.is_empty(),
    ConsequenceDetail::Stops { stops } => stops.is_empty(),
    ConsequenceDetail::Journeys { journeys } => journeys.is_empty(),
  };
  if empty {
    return Err(ValidationError::EmptyConsequencePayload { index });
  }

  Ok(())
}
