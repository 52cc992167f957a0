//! Owns the three pointer controllers and routes host input to whichever one
//! is active.
//!
//! The host forwards raw pointer input through [`InteractionCoordinator::handle`],
//! calls [`InteractionCoordinator::tick`] from its timer and
//! [`InteractionCoordinator::frame`] once per animation frame. Pointer moves
//! are coalesced between frames; a release flushes the last position
//! synchronously before the gesture ends.
//!
//! # Invariants
//! - At most one controller is active at a time.
//! - The scroll lock is held exactly while a gesture is active.

use std::sync::Arc;
use std::time::Instant;

use chrono_tz::Tz;
use egui::{Pos2, Rect};

use crate::interaction::create::{CreateController, CreatePreview, CreateRequest};
use crate::interaction::drag::{MoveCommit, MoveController, MoveOutcome, MovePreview, PointerKind};
use crate::interaction::frame::FrameCoalescer;
use crate::interaction::hit_test::DayHitTester;
use crate::interaction::resize::{HandleRects, ResizeCommit, ResizeController, ResizePreview};
use crate::interaction::scroll_lock::{NoopScrollLock, ScrollLock, ScrollLockGuard};
use crate::models::entry::{Entry, EntryId};
use crate::models::settings::GridSettings;
use crate::services::store::DayFragment;
use crate::utils::clock::Clock;

/// What the pointer went down on.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerTarget {
    EmptyDay,
    /// An entry fragment and the rect it was drawn in.
    Entry { fragment: DayFragment, rect: Rect },
}

#[derive(Debug, Clone, PartialEq)]
pub enum PointerInput {
    Down {
        pos: Pos2,
        kind: PointerKind,
        target: PointerTarget,
    },
    Move {
        pos: Pos2,
    },
    Up {
        pos: Pos2,
    },
    /// Touch tap on empty day space.
    Tap {
        pos: Pos2,
    },
    /// Click delivered separately from press/release by the host.
    Click {
        pos: Pos2,
        entry: Entry,
    },
    Cancel,
}

/// Notifications for the editor and the reconciler.
#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    OpenCreate(CreateRequest),
    OpenEdit { entry: Entry, anchor: Pos2 },
    MoveCommitted(MoveCommit),
    ResizeCommitted(ResizeCommit),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Preview {
    Create(CreatePreview),
    Move(MovePreview),
    Resize(ResizePreview),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveInteraction {
    None,
    Creating,
    /// Pressed on an entry; not yet a move.
    PendingMove,
    Moving,
    Resizing,
}

pub struct InteractionCoordinator<H, C> {
    hit_tester: H,
    clock: C,
    create: CreateController,
    moving: MoveController,
    resize: ResizeController,
    frames: FrameCoalescer<Pos2>,
    scroll_lock: Arc<dyn ScrollLock>,
    scroll_guard: Option<ScrollLockGuard>,
    click_suppress: std::time::Duration,
    suppressed_click: Option<(EntryId, Instant)>,
}

impl<H: DayHitTester, C: Clock> InteractionCoordinator<H, C> {
    pub fn new(settings: &GridSettings, tz: Tz, hit_tester: H, clock: C) -> Self {
        Self {
            hit_tester,
            clock,
            create: CreateController::new(&settings.grid, tz),
            moving: MoveController::new(&settings.grid, &settings.interaction, tz),
            resize: ResizeController::new(&settings.grid, tz),
            frames: FrameCoalescer::new(),
            scroll_lock: Arc::new(NoopScrollLock),
            scroll_guard: None,
            click_suppress: settings.interaction.click_suppress(),
            suppressed_click: None,
        }
    }

    pub fn with_scroll_lock(mut self, lock: Arc<dyn ScrollLock>) -> Self {
        self.scroll_lock = lock;
        self
    }

    pub fn hit_tester_mut(&mut self) -> &mut H {
        &mut self.hit_tester
    }

    pub fn active(&self) -> ActiveInteraction {
        if self.create.is_active() {
            ActiveInteraction::Creating
        } else if self.resize.is_active() {
            ActiveInteraction::Resizing
        } else if self.moving.is_dragging() {
            ActiveInteraction::Moving
        } else if self.moving.is_pending() {
            ActiveInteraction::PendingMove
        } else {
            ActiveInteraction::None
        }
    }

    pub fn is_idle(&self) -> bool {
        self.active() == ActiveInteraction::None
    }

    pub fn handle(&mut self, input: PointerInput) -> Option<GridEvent> {
        match input {
            PointerInput::Down { pos, kind, target } => {
                self.pointer_down(pos, kind, target);
                None
            }
            PointerInput::Move { pos } => {
                if self.moving.is_pending() && self.moving.pointer_move(pos) {
                    self.lock_scroll();
                }
                if !self.is_idle() {
                    self.frames.push(pos);
                }
                None
            }
            PointerInput::Up { pos } => self.pointer_up(pos),
            PointerInput::Tap { pos } => {
                if !self.is_idle() {
                    return None;
                }
                let column = self.hit_tester.hit_test(pos)?;
                self.create.tap(column, pos).map(GridEvent::OpenCreate)
            }
            PointerInput::Click { pos, entry } => {
                if !self.is_idle() || self.is_click_suppressed(&entry.id) {
                    log::debug!("click on {} suppressed", entry.id);
                    return None;
                }
                Some(GridEvent::OpenEdit { entry, anchor: pos })
            }
            PointerInput::Cancel => {
                self.cancel();
                None
            }
        }
    }

    /// Drive timers. Returns true when a long press started a move.
    pub fn tick(&mut self) -> bool {
        let started = self.moving.tick(self.clock.now());
        if started {
            self.lock_scroll();
        }
        started
    }

    /// Apply the latest pointer position, once per animation frame.
    pub fn frame(&mut self) -> Option<Preview> {
        if let Some(pos) = self.frames.take() {
            self.apply(pos);
        }
        self.preview()
    }

    pub fn preview(&self) -> Option<Preview> {
        self.create
            .preview()
            .map(Preview::Create)
            .or_else(|| self.moving.preview().map(Preview::Move))
            .or_else(|| self.resize.preview().map(Preview::Resize))
    }

    pub fn cancel(&mut self) {
        self.create.cancel();
        self.moving.cancel();
        self.resize.cancel();
        self.frames.clear();
        self.unlock_scroll();
    }

    fn pointer_down(&mut self, pos: Pos2, kind: PointerKind, target: PointerTarget) {
        if !self.is_idle() {
            log::debug!("pointer down ignored while {:?}", self.active());
            return;
        }
        match target {
            PointerTarget::EmptyDay => {
                let Some(column) = self.hit_tester.hit_test(pos) else {
                    log::warn!("pointer down at {:?} outside every day column", pos);
                    return;
                };
                if self.create.begin(column, pos) {
                    self.lock_scroll();
                }
            }
            PointerTarget::Entry { fragment, rect } => {
                match HandleRects::for_fragment(rect, &fragment).hit_test(pos) {
                    Some(handle) => {
                        self.resize.begin(fragment.entry, handle);
                        self.lock_scroll();
                    }
                    None => {
                        let now = self.clock.now();
                        self.moving.press(fragment, rect, pos, kind, now);
                    }
                }
            }
        }
    }

    fn pointer_up(&mut self, pos: Pos2) -> Option<GridEvent> {
        // The release position replaces anything still waiting for a frame.
        self.frames.clear();
        self.apply(pos);

        let event = match self.active() {
            ActiveInteraction::Creating => self.create.finish(pos).map(GridEvent::OpenCreate),
            ActiveInteraction::PendingMove | ActiveInteraction::Moving => {
                match self.moving.release(pos) {
                    Some(MoveOutcome::Click { entry, anchor }) => {
                        if self.is_click_suppressed(&entry.id) {
                            None
                        } else {
                            Some(GridEvent::OpenEdit { entry, anchor })
                        }
                    }
                    Some(MoveOutcome::Commit(commit)) => Some(GridEvent::MoveCommitted(commit)),
                    None => None,
                }
            }
            ActiveInteraction::Resizing => {
                if let Some(context) = self.resize.active() {
                    let until = self.clock.now() + self.click_suppress;
                    self.suppressed_click = Some((context.entry.id.clone(), until));
                }
                self.resize.release().map(GridEvent::ResizeCommitted)
            }
            ActiveInteraction::None => None,
        };
        self.unlock_scroll();
        event
    }

    fn apply(&mut self, pos: Pos2) {
        match self.active() {
            ActiveInteraction::Creating => self.create.update(pos),
            ActiveInteraction::Moving => {
                let hit = self.hit_tester.hit_test(pos);
                self.moving.frame(pos, hit);
            }
            ActiveInteraction::Resizing => {
                let hit = self.hit_tester.hit_test(pos);
                self.resize.frame(pos, hit);
            }
            ActiveInteraction::PendingMove | ActiveInteraction::None => {}
        }
    }

    fn is_click_suppressed(&self, id: &EntryId) -> bool {
        matches!(
            &self.suppressed_click,
            Some((suppressed, until)) if suppressed == id && self.clock.now() < *until
        )
    }

    fn lock_scroll(&mut self) {
        if self.scroll_guard.is_none() {
            self.scroll_guard = Some(ScrollLockGuard::acquire(Arc::clone(&self.scroll_lock)));
        }
    }

    fn unlock_scroll(&mut self) {
        self.scroll_guard = None;
    }
}
