//! Request Ledger entities: blood requests and their lifecycle.
//!
//! Status moves monotonically along `Pending -> Approved -> Dispatched`, or
//! `Pending -> Fulfilled` when a donor accepts, or `Pending -> Cancelled`.
//! The broadcast list is only ever populated while the request is pending and
//! is cleared on approval.

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{BloodGroup, SmartId};

/// Store-assigned identifier of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Mint a fresh identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Clinical urgency attached by the requester.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Urgency {
    /// Routine request.
    #[default]
    Standard,
    /// Needed within hours.
    Urgent,
    /// Life-threatening.
    Critical,
}

impl Urgency {
    /// Label as stored and serialised.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::Urgent => "Urgent",
            Self::Critical => "Critical",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when an urgency or status label is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownLabel {
    /// What was being parsed.
    pub kind: &'static str,
    /// Offending input.
    pub value: String,
}

impl FromStr for Urgency {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "urgent" => Ok(Self::Urgent),
            "critical" => Ok(Self::Critical),
            _ => Err(UnknownLabel {
                kind: "urgency",
                value: s.to_owned(),
            }),
        }
    }
}

/// Lifecycle status of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    /// Waiting for stock or a donor.
    Pending,
    /// Units reserved for the request.
    Approved,
    /// A donor accepted the request.
    Fulfilled,
    /// Reserved units have left the blood bank.
    Dispatched,
    /// Withdrawn by the requester.
    Cancelled,
}

impl RequestStatus {
    /// Label as stored and serialised.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Fulfilled => "Fulfilled",
            Self::Dispatched => "Dispatched",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Approved" => Ok(Self::Approved),
            "Fulfilled" => Ok(Self::Fulfilled),
            "Dispatched" => Ok(Self::Dispatched),
            "Cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownLabel {
                kind: "request status",
                value: other.to_owned(),
            }),
        }
    }
}

const NETWORK_LABEL: &str = "LifeLink Network";
const AUTO_ALLOCATION_LABEL: &str = "LifeLink Auto-Allocation";
const MANUAL_LABEL: &str = "Blood Bank (Manual)";
const DONOR_PREFIX: &str = "Donor: ";

/// Who satisfied a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Fulfiller {
    /// Stock reserved when the request was created.
    Network,
    /// Stock reserved by the back-in-stock reconciler.
    AutoAllocation,
    /// Stock reserved by a blood bank approving by hand.
    ManualApproval,
    /// A donor accepted the broadcast; holds the donor's display name.
    Donor(String),
}

impl Fulfiller {
    /// Parse a stored label. Unknown labels are kept as donor names so no
    /// history is lost.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label {
            NETWORK_LABEL => Self::Network,
            AUTO_ALLOCATION_LABEL => Self::AutoAllocation,
            MANUAL_LABEL => Self::ManualApproval,
            other => Self::Donor(other.strip_prefix(DONOR_PREFIX).unwrap_or(other).to_owned()),
        }
    }
}

impl fmt::Display for Fulfiller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => f.write_str(NETWORK_LABEL),
            Self::AutoAllocation => f.write_str(AUTO_ALLOCATION_LABEL),
            Self::ManualApproval => f.write_str(MANUAL_LABEL),
            Self::Donor(name) => write!(f, "{DONOR_PREFIX}{name}"),
        }
    }
}

/// Action attempted against a request, used in transition errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestAction {
    /// Reserve units and approve.
    Approve,
    /// Record a broadcast list.
    Broadcast,
    /// Dispatch reserved units.
    Dispatch,
    /// Record a donor's acceptance.
    Donate,
    /// Withdraw the request.
    Cancel,
}

impl RequestAction {
    /// Status the request must hold for the action to be legal.
    #[must_use]
    pub const fn required_status(self) -> RequestStatus {
        match self {
            Self::Dispatch => RequestStatus::Approved,
            Self::Approve | Self::Broadcast | Self::Donate | Self::Cancel => RequestStatus::Pending,
        }
    }
}

impl fmt::Display for RequestAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Approve => "approve",
            Self::Broadcast => "broadcast",
            Self::Dispatch => "dispatch",
            Self::Donate => "donate to",
            Self::Cancel => "cancel",
        };
        f.write_str(label)
    }
}

/// Raised when an action is not legal for the request's current status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot {action} request {request_id} while it is {status}")]
pub struct RequestTransitionError {
    /// Request the action targeted.
    pub request_id: RequestId,
    /// Attempted action.
    pub action: RequestAction,
    /// Status the request actually held.
    pub status: RequestStatus,
}

/// Validated submission for a new request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBloodRequest {
    /// Member raising the request.
    pub requester: SmartId,
    /// Requested blood group.
    pub blood_group: BloodGroup,
    /// Units needed.
    pub units_needed: NonZeroU32,
    /// Hospital the units should go to.
    pub hospital_name: Option<String>,
    /// Clinical urgency.
    pub urgency: Urgency,
}

/// A request for blood units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BloodRequest {
    /// Store identifier.
    pub id: RequestId,
    /// Member who raised the request.
    pub requester: SmartId,
    /// Requested blood group.
    pub blood_group: BloodGroup,
    /// Units needed.
    pub units_needed: NonZeroU32,
    /// Hospital the units should go to.
    pub hospital_name: Option<String>,
    /// Clinical urgency.
    pub urgency: Urgency,
    /// Lifecycle status.
    pub status: RequestStatus,
    /// Who satisfied the request, once satisfied.
    pub fulfilled_by: Option<Fulfiller>,
    /// Donors notified of the request.
    pub broadcast_to: Vec<SmartId>,
    /// Submission timestamp; defines FIFO order.
    pub created_at: DateTime<Utc>,
}

impl BloodRequest {
    /// Open a pending request from a validated submission.
    #[must_use]
    pub fn open(submission: NewBloodRequest, id: RequestId, created_at: DateTime<Utc>) -> Self {
        let NewBloodRequest {
            requester,
            blood_group,
            units_needed,
            hospital_name,
            urgency,
        } = submission;
        Self {
            id,
            requester,
            blood_group,
            units_needed,
            hospital_name,
            urgency,
            status: RequestStatus::Pending,
            fulfilled_by: None,
            broadcast_to: Vec::new(),
            created_at,
        }
    }

    /// Number of units needed as a `usize` for slice arithmetic.
    #[must_use]
    pub fn units_needed_len(&self) -> usize {
        usize::try_from(self.units_needed.get()).unwrap_or(usize::MAX)
    }

    fn require(&self, action: RequestAction) -> Result<(), RequestTransitionError> {
        if self.status == action.required_status() {
            Ok(())
        } else {
            Err(RequestTransitionError {
                request_id: self.id,
                action,
                status: self.status,
            })
        }
    }

    /// Mark the request approved; the broadcast list is cleared.
    pub fn approve(mut self, fulfiller: Fulfiller) -> Result<Self, RequestTransitionError> {
        self.require(RequestAction::Approve)?;
        self.status = RequestStatus::Approved;
        self.fulfilled_by = Some(fulfiller);
        self.broadcast_to.clear();
        Ok(self)
    }

    /// Record the donors notified about a pending request.
    ///
    /// Duplicate identifiers are dropped, keeping first-seen order.
    pub fn broadcast(mut self, donors: Vec<SmartId>) -> Result<Self, RequestTransitionError> {
        self.require(RequestAction::Broadcast)?;
        let mut unique: Vec<SmartId> = Vec::with_capacity(donors.len());
        for donor in donors {
            if !unique.contains(&donor) {
                unique.push(donor);
            }
        }
        self.broadcast_to = unique;
        Ok(self)
    }

    /// Mark reserved units as dispatched.
    pub fn dispatch(mut self) -> Result<Self, RequestTransitionError> {
        self.require(RequestAction::Dispatch)?;
        self.status = RequestStatus::Dispatched;
        Ok(self)
    }

    /// Record a donor's acceptance of a pending request.
    pub fn accept_donation(mut self, donor_name: &str) -> Result<Self, RequestTransitionError> {
        self.require(RequestAction::Donate)?;
        self.status = RequestStatus::Fulfilled;
        self.fulfilled_by = Some(Fulfiller::Donor(donor_name.to_owned()));
        Ok(self)
    }

    /// Withdraw a pending request.
    pub fn cancel(mut self) -> Result<Self, RequestTransitionError> {
        self.require(RequestAction::Cancel)?;
        self.status = RequestStatus::Cancelled;
        Ok(self)
    }
}
