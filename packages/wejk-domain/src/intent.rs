use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentLabel {
	Question,
	Casual,
	Attack,
	Nonsense,
}
impl IntentLabel {
	pub const ALL: [IntentLabel; 4] = [Self::Question, Self::Casual, Self::Attack, Self::Nonsense];
	pub const LABELS: [&'static str; 4] = ["question", "casual", "attack", "nonsense"];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Question => "question",
			Self::Casual => "casual",
			Self::Attack => "attack",
			Self::Nonsense => "nonsense",
		}
	}

	/// Only questions are worth a retrieval pass; everything else gets the quick reply alone.
	pub fn is_informational(self) -> bool {
		matches!(self, Self::Question)
	}
}
impl FromStr for IntentLabel {
	type Err = UnknownIntent;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|label| label.as_str() == raw)
			.ok_or_else(|| UnknownIntent(raw.to_string()))
	}
}
impl fmt::Display for IntentLabel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown intent label {0:?}.")]
pub struct UnknownIntent(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	User,
	Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
	pub role: Role,
	pub text: String,
}
impl ChatTurn {
	pub fn user(text: impl Into<String>) -> Self {
		Self { role: Role::User, text: text.into() }
	}

	pub fn assistant(text: impl Into<String>) -> Self {
		Self { role: Role::Assistant, text: text.into() }
	}
}

pub fn render_history(history: &[ChatTurn]) -> String {
	if history.is_empty() {
		return "No history".to_string();
	}

	history
		.iter()
		.map(|turn| {
			let speaker = match turn.role {
				Role::User => "User",
				Role::Assistant => "Assistant",
			};

			format!("{speaker}: {}", turn.text)
		})
		.collect::<Vec<_>>()
		.join("\n")
}
