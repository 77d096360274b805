//! Preview and frame data coordination
//!
//! Cache-first access to thumbnails and per-file frame sequences, with the
//! native backend as the source of truth. Every request type maps to one
//! local store:
//!
//! | request            | store         |
//! |--------------------|---------------|
//! | preview            | `Preview`     |
//! | timeline frames    | `Frames`      |
//! | recognition frames | `Recognition` |
//! | subtitle frames    | `Subtitle`    |

pub mod coordinator;
pub mod error;
pub mod nearest;

pub use coordinator::{
    CompletionCallback, ErrorCallback, PreviewCoordinator, RequestKind,
};
pub use error::PreviewError;
pub use nearest::nearest_frame;
