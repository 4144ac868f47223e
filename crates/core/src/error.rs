//! Common error infrastructure.
//!
//! Each concern has its own error enum; all of them classify into a
//! shared [`ErrorSeverity`] so hosts can pick a recovery strategy
//! without matching on every variant. Failures are structured values,
//! never panics: precondition and safety violations are expected
//! outcomes of user requests.

use crate::cost::ResourceDef;
use crate::ids::{NodeGuid, TreeGuid, TreeTag};
use crate::node::NodeState;

/// Severity level of an error, used for categorization and recovery
/// strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorSeverity {
    /// May succeed later or with a different request (insufficient
    /// resources, unmet prerequisites).
    Recoverable,
    /// Invalid input; retrying unchanged will not help.
    Validation,
    /// Unexpected inconsistency that indicates a bug.
    Internal,
    /// State cannot be trusted; the tree should be reset.
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }
}

/// Common trait for engine errors.
pub trait EngineError: std::fmt::Display + std::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;
}

/// Failure of a node action request: precondition violations, safety
/// violations and the authority check.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ActionError {
    #[error("node {guid} not found in any managed tree")]
    NodeNotFound { guid: NodeGuid },

    #[error("node {guid} is {state} and cannot {requested}")]
    WrongState {
        guid: NodeGuid,
        state: NodeState,
        requested: &'static str,
    },

    #[error("node {guid} is already at max level")]
    AtMaxLevel { guid: NodeGuid },

    #[error("prerequisites for node {guid} are not met{}", reason_suffix(.reasons))]
    PrerequisitesNotMet {
        guid: NodeGuid,
        /// Human-readable reasons from failed conditions, each with the
        /// blocking dependency node when one exists.
        reasons: Vec<ConditionFailure>,
    },

    #[error("insufficient {resource}: need {required}, have {available}")]
    InsufficientResources {
        guid: NodeGuid,
        resource: ResourceDef,
        required: u32,
        available: u32,
    },

    #[error("decrementing node {guid} would invalidate {} dependent node(s)", .invalidated.len())]
    SafetyViolated {
        guid: NodeGuid,
        invalidated: Vec<NodeGuid>,
    },

    #[error("the root node cannot be deactivated or decremented")]
    RootImmutable { guid: NodeGuid },

    #[error("manager is not authoritative; mutations must run on the server instance")]
    NotAuthoritative,
}

fn reason_suffix(reasons: &[ConditionFailure]) -> String {
    if reasons.is_empty() {
        String::new()
    } else {
        format!(
            ": {}",
            reasons
                .iter()
                .map(|r| r.text.as_str())
                .collect::<Vec<_>>()
                .join("; ")
        )
    }
}

/// One failed condition, with the dependency node that caused it when
/// the condition targets another node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConditionFailure {
    pub text: String,
    pub dependency: Option<NodeGuid>,
}

impl EngineError for ActionError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NodeNotFound { .. } | Self::NotAuthoritative => ErrorSeverity::Validation,
            Self::WrongState { .. }
            | Self::AtMaxLevel { .. }
            | Self::PrerequisitesNotMet { .. }
            | Self::InsufficientResources { .. }
            | Self::SafetyViolated { .. }
            | Self::RootImmutable { .. } => ErrorSeverity::Recoverable,
        }
    }
}

/// Structural failure of a tree template or instance.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum TreeError {
    #[error("tree {tree}: no parentless node to use as root")]
    MissingRoot { tree: TreeGuid },

    #[error("tree {tree}: ambiguous root, {} parentless candidates", .candidates.len())]
    AmbiguousRoot {
        tree: TreeGuid,
        candidates: Vec<NodeGuid>,
    },

    #[error("tree {tree}: duplicate node guid {guid}")]
    DuplicateNodeGuid { tree: TreeGuid, guid: NodeGuid },

    #[error("tree {tree}: edge references unknown node guid {guid}")]
    UnknownEdgeEndpoint { tree: TreeGuid, guid: NodeGuid },

    #[error("no tree configured with tag {tag}")]
    UnknownTag { tag: TreeTag },

    #[error("tree {tag}: no node named {name:?}")]
    UnknownNodeName { tag: TreeTag, name: String },
}

impl EngineError for TreeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::MissingRoot { .. } | Self::AmbiguousRoot { .. } | Self::DuplicateNodeGuid { .. } => {
                ErrorSeverity::Fatal
            }
            Self::UnknownEdgeEndpoint { .. } => ErrorSeverity::Fatal,
            Self::UnknownTag { .. } | Self::UnknownNodeName { .. } => ErrorSeverity::Validation,
        }
    }
}

/// Persistence failure. A save-version mismatch is *not* an error: it
/// recovers locally via refund-and-reset.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("save store unavailable or failed: {0}")]
    Store(#[from] crate::ports::PortError),

    #[error("failed to encode save blob: {0}")]
    Encode(String),

    #[error("failed to decode save blob: {0}")]
    Decode(String),
}

impl EngineError for SaveError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Store(_) => ErrorSeverity::Recoverable,
            Self::Encode(_) | Self::Decode(_) => ErrorSeverity::Internal,
        }
    }
}

/// Umbrella error for manager operations that can fail across concerns.
#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error(transparent)]
    Action(#[from] ActionError),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Save(#[from] SaveError),
}

impl EngineError for ManagerError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Action(err) => err.severity(),
            Self::Tree(err) => err.severity(),
            Self::Save(err) => err.severity(),
        }
    }
}
