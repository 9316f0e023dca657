use serde::{Deserialize, Serialize};

/// Closed set of tax document kinds the extraction pipeline understands.
///
/// The wire names match the backend's `type` field on document records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    #[serde(rename = "w2")]
    W2,
    #[serde(rename = "1099-r")]
    Form1099R,
    #[serde(rename = "1099-g")]
    Form1099G,
    #[serde(rename = "1099-int")]
    Form1099Int,
    #[serde(rename = "1099-div")]
    Form1099Div,
    #[serde(rename = "1099-nec")]
    Form1099Nec,
    #[serde(rename = "k1")]
    K1,
    #[serde(rename = "other")]
    Other,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::W2 => "w2",
            Self::Form1099R => "1099-r",
            Self::Form1099G => "1099-g",
            Self::Form1099Int => "1099-int",
            Self::Form1099Div => "1099-div",
            Self::Form1099Nec => "1099-nec",
            Self::K1 => "k1",
            Self::Other => "other",
        }
    }

    /// The five 1099 variants share the distribution-statement record shape.
    pub fn is_distribution(&self) -> bool {
        matches!(
            self,
            Self::Form1099R
                | Self::Form1099G
                | Self::Form1099Int
                | Self::Form1099Div
                | Self::Form1099Nec
        )
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle statuses a tax return moves through on the backend.
///
/// The rule engine only ever advances `Intake` and `DocumentsPending`;
/// everything past `DocumentsComplete` requires preparer action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnStatus {
    Intake,
    DocumentsPending,
    DocumentsComplete,
    InPreparation,
    WaitingOnClient,
    ReadyForSigning,
    ExtensionFiled,
    Completed,
    Filed,
    PickedUp,
}

impl ReturnStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Intake => "intake",
            Self::DocumentsPending => "documents_pending",
            Self::DocumentsComplete => "documents_complete",
            Self::InPreparation => "in_preparation",
            Self::WaitingOnClient => "waiting_on_client",
            Self::ReadyForSigning => "ready_for_signing",
            Self::ExtensionFiled => "extension_filed",
            Self::Completed => "completed",
            Self::Filed => "filed",
            Self::PickedUp => "picked_up",
        }
    }

    /// Lenient parse — the backend owns the status vocabulary, so unknown
    /// strings map to `None` rather than an error.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "intake" => Some(Self::Intake),
            "documents_pending" => Some(Self::DocumentsPending),
            "documents_complete" => Some(Self::DocumentsComplete),
            "in_preparation" => Some(Self::InPreparation),
            "waiting_on_client" => Some(Self::WaitingOnClient),
            "ready_for_signing" => Some(Self::ReadyForSigning),
            "extension_filed" => Some(Self::ExtensionFiled),
            "completed" => Some(Self::Completed),
            "filed" => Some(Self::Filed),
            "picked_up" => Some(Self::PickedUp),
            _ => None,
        }
    }

    /// Position in the forward progression. Used to assert that status
    /// recommendations never regress.
    pub fn stage(&self) -> u8 {
        match self {
            Self::Intake => 0,
            Self::DocumentsPending => 1,
            Self::DocumentsComplete => 2,
            Self::InPreparation => 3,
            Self::WaitingOnClient => 4,
            Self::ReadyForSigning => 5,
            Self::ExtensionFiled => 6,
            Self::Completed => 7,
            Self::Filed => 8,
            Self::PickedUp => 9,
        }
    }

    /// Returns in these statuses are done — deadline scans skip them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Filed | Self::PickedUp)
    }

    /// Early-stage statuses qualify a return for a filing extension when
    /// its due date is close.
    pub fn is_early_stage(&self) -> bool {
        matches!(
            self,
            Self::Intake
                | Self::DocumentsPending
                | Self::DocumentsComplete
                | Self::InPreparation
        )
    }
}

impl std::fmt::Display for ReturnStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery channel for an outbound client communication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Email,
    Sms,
    Call,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Sms => "sms",
            Self::Call => "call",
        }
    }
}
