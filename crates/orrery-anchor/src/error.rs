use orrery_frames::AnchorId;

/// Errors raised by anchor graph mutation and update.
///
/// Traversals log these and carry on with the next anchor.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnchorError {
    #[error("unknown anchor {0}")]
    UnknownAnchor(AnchorId),

    #[error("anchor {0} is not a system")]
    NotASystem(AnchorId),

    #[error("anchor {0} is not an octree system")]
    NotAnOctree(AnchorId),

    #[error("anchor {child} is not a child of {system}")]
    NotAChild { system: AnchorId, child: AnchorId },

    #[error("reference frames of anchor {0} form a cycle")]
    FrameCycle(AnchorId),

    #[error("update of anchor {0} produced a non-finite state")]
    NonFiniteState(AnchorId),
}
