// Pointer interaction on the time grid
// Create, move and resize controllers plus the coordinator that owns them

pub mod coordinator;
pub mod create;
pub mod drag;
pub mod frame;
pub mod resize;
pub mod scroll_lock;

pub use coordinator::{
    ActiveInteraction, GridEvent, InteractionCoordinator, PointerInput, PointerTarget, Preview,
};
pub use create::{CreateController, CreatePreview, CreateRequest};
pub use drag::{MoveCommit, MoveController, MoveOutcome, MovePreview, PointerKind};
pub use frame::FrameCoalescer;
pub use hit_test::{DayColumns, DayHit, DayHitTester};
pub use resize::{HandleRects, ResizeCommit, ResizeController, ResizeHandle, ResizePreview};
pub use scroll_lock::{AtomicScrollLock, NoopScrollLock, ScrollLock, ScrollLockGuard};
