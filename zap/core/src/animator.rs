//! Zap Animator - the mascot's presentation state machine
//!
//! Owns the state table, the live session (current state, pending
//! auto-return, lip-sync guard) and a cooperative [`Timeline`]. Every
//! side effect goes through the optional collaborators.
//!
//! # Timing
//!
//! Nothing here sleeps or reads a clock. Hosts call [`ZapAnimator::advance`]
//! with the elapsed time (from a frame loop, a `tokio::time::interval`, or a
//! test) and every timer due in that window fires in order, including timers
//! scheduled by earlier firings.
//!
//! # Timers
//!
//! | Timer | Lifetime |
//! |-------|----------|
//! | auto-return | at most one, replaced by every transition |
//! | idle ticker | recurring for the animator's whole life |
//! | idle variation revert | at most one, only while idle |
//! | lip-sync | fire-and-forget, guarded by `lip_sync_active` |
//! | sequence advance | at most one, only while a sequence runs |
//!
//! [`ZapAnimator::shutdown`] (also run on drop) cancels all of them.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use tracing::{debug, info, trace, warn};

use crate::collaborators::{Feedback, MemorySurface, Messenger, Renderer};
use crate::context::{battle_result_state, room_entry_state};
use crate::lipsync::{AudioData, MouthShape};
use crate::options::{Callback, PlayOptions};
use crate::sequence::{completion_sequence, SequenceQueue, SequenceStep};
use crate::states::{StateTable, EXPLAINING, IDLE};
use crate::timeline::{TimerHandle, Timeline};

/// Default interval between idle-variation ticks
pub const DEFAULT_IDLE_TICK_MS: u64 = 8000;

/// Default time an idle variation stays visible
pub const DEFAULT_IDLE_VARIATION_MS: u64 = 2000;

// =============================================================================
// Settings
// =============================================================================

/// Timing knobs for the idle cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnimatorSettings {
    /// Interval between idle-variation ticks (0 disables the cycle)
    pub idle_tick_ms: u64,

    /// How long a variation replaces the base idle class
    pub idle_variation_ms: u64,
}

impl Default for AnimatorSettings {
    fn default() -> Self {
        Self {
            idle_tick_ms: DEFAULT_IDLE_TICK_MS,
            idle_variation_ms: DEFAULT_IDLE_VARIATION_MS,
        }
    }
}

// =============================================================================
// Session
// =============================================================================

#[derive(Debug)]
enum TimerEvent {
    ReturnToIdle,
    IdleTick,
    IdleVariationEnd,
    MouthShape(MouthShape),
    LipSyncReset,
    SequenceAdvance,
}

/// What happens when the current state finishes
struct Completion {
    timer: Option<TimerHandle>,
    callback: Option<Callback>,
    /// Set when the state was played as a sequence step
    advance_after_ms: Option<u64>,
}

struct IdleVariation {
    class: String,
    revert: TimerHandle,
}

struct Session {
    current_state: String,
    completion: Option<Completion>,
    lip_sync_active: bool,
    lip_sync_timers: Vec<TimerHandle>,
    idle_ticker: Option<TimerHandle>,
    variation: Option<IdleVariation>,
}

struct SequenceRun {
    queue: SequenceQueue,
    pending_advance: Option<TimerHandle>,
}

// =============================================================================
// Builder
// =============================================================================

/// Assembles a [`ZapAnimator`]
pub struct ZapAnimatorBuilder {
    table: StateTable,
    settings: AnimatorSettings,
    renderer: Option<Box<dyn Renderer>>,
    messenger: Option<Box<dyn Messenger>>,
    feedback: Option<Box<dyn Feedback>>,
    rng: Option<Box<dyn RngCore + Send>>,
}

impl ZapAnimatorBuilder {
    /// Use this state table instead of the default catalog
    #[must_use]
    pub fn state_table(mut self, table: StateTable) -> Self {
        self.table = table;
        self
    }

    /// Override idle-cycle timing
    #[must_use]
    pub fn settings(mut self, settings: AnimatorSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Render target
    #[must_use]
    pub fn renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    /// Speech bubble
    #[must_use]
    pub fn messenger(mut self, messenger: impl Messenger + 'static) -> Self {
        self.messenger = Some(Box::new(messenger));
        self
    }

    /// Haptic / audio cues
    #[must_use]
    pub fn feedback(mut self, feedback: impl Feedback + 'static) -> Self {
        self.feedback = Some(Box::new(feedback));
        self
    }

    /// Use one in-memory surface for all three collaborators
    #[must_use]
    pub fn surface(self, surface: &MemorySurface) -> Self {
        self.renderer(surface.clone())
            .messenger(surface.clone())
            .feedback(surface.clone())
    }

    /// Random source for message and variation picks
    #[must_use]
    pub fn rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Some(Box::new(rng));
        self
    }

    /// Seeded random source, for reproducible runs
    #[must_use]
    pub fn seed(self, seed: u64) -> Self {
        self.rng(StdRng::seed_from_u64(seed))
    }

    /// Build the animator, apply the idle class and start the idle cycle
    #[must_use]
    pub fn build(self) -> ZapAnimator {
        let rng = self
            .rng
            .unwrap_or_else(|| Box::new(StdRng::from_entropy()));

        let mut animator = ZapAnimator {
            table: self.table,
            settings: self.settings,
            renderer: self.renderer,
            messenger: self.messenger,
            feedback: self.feedback,
            rng,
            timeline: Timeline::new(),
            session: Session {
                current_state: IDLE.to_string(),
                completion: None,
                lip_sync_active: false,
                lip_sync_timers: Vec::new(),
                idle_ticker: None,
                variation: None,
            },
            sequence: None,
            advance_target_ms: 0,
            shut_down: false,
        };

        let idle_class = animator.table.idle().visual_class.clone();
        animator.apply_class(&idle_class);
        animator.schedule_idle_tick();

        info!(
            states = animator.table.len(),
            idle_tick_ms = animator.settings.idle_tick_ms,
            "Zap animator ready"
        );
        animator
    }
}

// =============================================================================
// Animator
// =============================================================================

/// The mascot animation state controller
pub struct ZapAnimator {
    table: StateTable,
    settings: AnimatorSettings,
    renderer: Option<Box<dyn Renderer>>,
    messenger: Option<Box<dyn Messenger>>,
    feedback: Option<Box<dyn Feedback>>,
    rng: Box<dyn RngCore + Send>,
    timeline: Timeline<TimerEvent>,
    session: Session,
    sequence: Option<SequenceRun>,
    /// Target of the `advance` call in progress
    advance_target_ms: u64,
    shut_down: bool,
}

impl ZapAnimator {
    /// Start building an animator with the default table and no collaborators
    #[must_use]
    pub fn builder() -> ZapAnimatorBuilder {
        ZapAnimatorBuilder {
            table: StateTable::default(),
            settings: AnimatorSettings::default(),
            renderer: None,
            messenger: None,
            feedback: None,
            rng: None,
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Name of the active state
    #[must_use]
    pub fn current_state(&self) -> &str {
        &self.session.current_state
    }

    /// Whether a lip-sync run is in flight
    #[must_use]
    pub fn lip_sync_active(&self) -> bool {
        self.session.lip_sync_active
    }

    /// Whether a sequence is still running
    #[must_use]
    pub fn sequence_running(&self) -> bool {
        self.sequence.is_some()
    }

    /// Whether the current state will return to idle on its own
    #[must_use]
    pub fn auto_return_pending(&self) -> bool {
        self.session
            .completion
            .as_ref()
            .is_some_and(|c| c.timer.is_some())
    }

    /// Virtual time in milliseconds since construction
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.timeline.now_ms()
    }

    /// Number of timers currently scheduled
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timeline.len()
    }

    /// The state table
    #[must_use]
    pub fn state_table(&self) -> &StateTable {
        &self.table
    }

    /// Whether [`ZapAnimator::shutdown`] has run
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    // -------------------------------------------------------------------------
    // Transitions
    // -------------------------------------------------------------------------

    /// Transition to `state`
    ///
    /// Unknown states are logged and ignored. A sequence in progress is
    /// abandoned. Returns whether the transition happened.
    pub fn play(&mut self, state: &str, options: PlayOptions) -> bool {
        if self.shut_down {
            debug!(state, "Ignoring play after shutdown");
            return false;
        }
        if !self.table.contains(state) {
            warn!(state, "Animation state not found");
            return false;
        }

        self.abandon_sequence();
        self.transition(state, options, None)
    }

    /// Play the entry state for a map room
    pub fn play_room_entry(&mut self, room: &str) -> bool {
        self.play(room_entry_state(room), PlayOptions::default())
    }

    /// Play the victory or defeat state for a battle outcome
    pub fn play_battle_result(&mut self, correct: bool, room: &str) -> bool {
        self.play(battle_result_state(correct, room), PlayOptions::default())
    }

    /// Play the standard lesson-completion sequence
    pub fn play_completion(&mut self, correct: bool, room: &str, has_loot: bool) {
        self.play_sequence(completion_sequence(correct, room, has_loot));
    }

    /// Finish the current state now, as if its auto-return had fired
    ///
    /// This is how zero-duration states (and sequence steps playing them)
    /// are moved along. Returns `false` when nothing was pending.
    pub fn finish_current(&mut self) -> bool {
        if self.shut_down || self.session.completion.is_none() {
            return false;
        }
        self.complete_current();
        true
    }

    /// Play `steps` back to back
    ///
    /// Replaces any sequence already running. An empty list is a no-op.
    pub fn play_sequence(&mut self, steps: impl IntoIterator<Item = SequenceStep>) {
        if self.shut_down {
            return;
        }
        let queue = SequenceQueue::new(steps);
        if queue.is_exhausted() {
            return;
        }

        self.abandon_sequence();
        debug!(steps = queue.remaining(), "Starting sequence");
        self.sequence = Some(SequenceRun {
            queue,
            pending_advance: None,
        });
        self.start_next_step();
    }

    /// Stop an in-flight lip-sync run and close the mouth
    pub fn cancel_lip_sync(&mut self) -> bool {
        if !self.session.lip_sync_active {
            return false;
        }
        for handle in std::mem::take(&mut self.session.lip_sync_timers) {
            self.timeline.cancel(handle);
        }
        self.session.lip_sync_active = false;
        self.update_mouth_shape(MouthShape::Closed);
        debug!("Lip-sync cancelled");
        true
    }

    // -------------------------------------------------------------------------
    // Time
    // -------------------------------------------------------------------------

    /// Move time forward by `delta`, firing every timer that comes due
    pub fn advance(&mut self, delta: Duration) {
        let target = self.timeline.deadline_after(delta);
        self.advance_to_ms(target);
    }

    /// Move time forward to `target_ms` since construction
    pub fn advance_to_ms(&mut self, target_ms: u64) {
        if self.shut_down {
            return;
        }
        self.advance_target_ms = target_ms;
        while let Some((handle, event)) = self.timeline.pop_due(target_ms) {
            trace!(?event, at_ms = handle.due_ms(), "Timer fired");
            self.handle_timer(handle, event);
        }
        self.timeline.settle(target_ms);
    }

    /// Cancel every timer and clear the render target
    ///
    /// Idempotent. Every later call on the animator is a no-op.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.timeline.clear();
        self.session.completion = None;
        self.session.lip_sync_active = false;
        self.session.lip_sync_timers.clear();
        self.session.idle_ticker = None;
        self.session.variation = None;
        self.sequence = None;

        if let Some(renderer) = self.renderer.as_mut() {
            renderer.clear_all();
        }
        self.shut_down = true;
        info!("Zap animator shut down");
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn transition(
        &mut self,
        state: &str,
        options: PlayOptions,
        advance_after_ms: Option<u64>,
    ) -> bool {
        let Some(def) = self.table.get(state) else {
            warn!(state, "Animation state not found");
            return false;
        };
        let visual_class = def.visual_class.clone();
        let default_duration_ms = def.default_duration_ms;
        let message = match options.message_override() {
            Some(m) => Some(m.to_string()),
            None => def.messages.choose(&mut *self.rng).cloned(),
        };

        self.cancel_completion();
        self.clear_state_classes();
        self.apply_class(&visual_class);
        self.session.current_state = state.to_string();

        if let (Some(text), Some(messenger)) = (message.as_deref(), self.messenger.as_mut()) {
            messenger.show(text, options.message_type);
        }

        if let Some(audio) = options.audio {
            if state == EXPLAINING {
                self.start_lip_sync(&audio);
            } else {
                debug!(state, "Audio data ignored outside the explaining state");
            }
        }

        let duration_ms = options.duration_ms.unwrap_or(default_duration_ms);
        let timer =
            (duration_ms > 0).then(|| self.timeline.schedule(duration_ms, TimerEvent::ReturnToIdle));
        self.session.completion = Some(Completion {
            timer,
            callback: options.callback,
            advance_after_ms,
        });

        debug!(state, duration_ms, "Playing animation state");

        if let Some(feedback) = self.feedback.as_mut() {
            feedback.trigger(state);
        }
        true
    }

    fn handle_timer(&mut self, handle: TimerHandle, event: TimerEvent) {
        match event {
            TimerEvent::ReturnToIdle => {
                let current = self
                    .session
                    .completion
                    .as_ref()
                    .is_some_and(|c| c.timer == Some(handle));
                if current {
                    self.complete_current();
                }
            }
            TimerEvent::IdleTick => self.on_idle_tick(),
            TimerEvent::IdleVariationEnd => self.on_variation_end(handle),
            TimerEvent::MouthShape(shape) => {
                self.session.lip_sync_timers.retain(|h| *h != handle);
                self.update_mouth_shape(shape);
            }
            TimerEvent::LipSyncReset => {
                for pending in std::mem::take(&mut self.session.lip_sync_timers) {
                    self.timeline.cancel(pending);
                }
                self.session.lip_sync_active = false;
                self.update_mouth_shape(MouthShape::Closed);
            }
            TimerEvent::SequenceAdvance => {
                let current = self
                    .sequence
                    .as_ref()
                    .is_some_and(|run| run.pending_advance == Some(handle));
                if current {
                    self.start_next_step();
                }
            }
        }
    }

    /// Return to idle, then run the callback, then advance any sequence
    fn complete_current(&mut self) {
        let Some(completion) = self.session.completion.take() else {
            return;
        };
        if let Some(timer) = completion.timer {
            self.timeline.cancel(timer);
        }

        self.return_to_idle();

        if let Some(callback) = completion.callback {
            callback();
        }
        if let Some(delay_ms) = completion.advance_after_ms {
            self.schedule_sequence_advance(delay_ms);
        }
    }

    fn return_to_idle(&mut self) {
        self.clear_state_classes();
        let idle_class = self.table.idle().visual_class.clone();
        self.apply_class(&idle_class);
        self.session.current_state = IDLE.to_string();
        debug!("Returned to idle");
    }

    fn cancel_completion(&mut self) {
        if let Some(timer) = self.session.completion.take().and_then(|c| c.timer) {
            self.timeline.cancel(timer);
        }
    }

    fn clear_state_classes(&mut self) {
        let variation = self.session.variation.take();
        if let Some(variation) = &variation {
            self.timeline.cancel(variation.revert);
        }

        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        for class in self.table.visual_classes() {
            renderer.clear_visual_class(class);
        }
        if let Some(variation) = variation {
            renderer.clear_visual_class(&variation.class);
        }
    }

    fn apply_class(&mut self, class: &str) {
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.apply_visual_class(class);
        }
    }

    // -- idle cycle -----------------------------------------------------------

    fn schedule_idle_tick(&mut self) {
        if self.settings.idle_tick_ms == 0 {
            return;
        }
        let handle = self
            .timeline
            .schedule(self.settings.idle_tick_ms, TimerEvent::IdleTick);
        self.session.idle_ticker = Some(handle);
    }

    /// Reschedule the ticker on the first period boundary past the current
    /// `advance` target, skipping ticks a long advance jumped over
    fn reschedule_idle_tick(&mut self) {
        let period = self.settings.idle_tick_ms;
        if period == 0 {
            return;
        }
        let now = self.timeline.now_ms();
        let behind = self.advance_target_ms.saturating_sub(now);
        let delay = (behind / period + 1)
            .checked_mul(period)
            .filter(|delay| now.checked_add(*delay).is_some());

        self.session.idle_ticker = match delay {
            Some(delay) => Some(self.timeline.schedule(delay, TimerEvent::IdleTick)),
            None => {
                debug!(now_ms = now, "Idle ticker reached the end of the timeline");
                None
            }
        };
    }

    fn on_idle_tick(&mut self) {
        self.reschedule_idle_tick();

        if self.session.current_state != IDLE || self.session.variation.is_some() {
            return;
        }
        let idle = self.table.idle();
        let Some(variation) = idle.variations.choose(&mut *self.rng) else {
            return;
        };
        let class = format!("zap-{variation}");
        let idle_class = idle.visual_class.clone();

        if let Some(renderer) = self.renderer.as_mut() {
            renderer.clear_visual_class(&idle_class);
            renderer.apply_visual_class(&class);
        }
        trace!(%class, "Idle variation");

        let revert = self
            .timeline
            .schedule(self.settings.idle_variation_ms, TimerEvent::IdleVariationEnd);
        self.session.variation = Some(IdleVariation { class, revert });
    }

    fn on_variation_end(&mut self, handle: TimerHandle) {
        let is_current = self
            .session
            .variation
            .as_ref()
            .is_some_and(|v| v.revert == handle);
        if !is_current {
            return;
        }
        let Some(variation) = self.session.variation.take() else {
            return;
        };

        let still_idle = self.session.current_state == IDLE;
        let idle_class = self.table.idle().visual_class.clone();
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.clear_visual_class(&variation.class);
            if still_idle {
                renderer.apply_visual_class(&idle_class);
            }
        }
    }

    // -- lip-sync -------------------------------------------------------------

    fn start_lip_sync(&mut self, audio: &AudioData) {
        if self.session.lip_sync_active {
            debug!("Lip-sync already active, ignoring request");
            return;
        }
        self.session.lip_sync_active = true;

        for phoneme in &audio.phonemes {
            let handle = self
                .timeline
                .schedule(phoneme.offset_ms, TimerEvent::MouthShape(phoneme.shape));
            self.session.lip_sync_timers.push(handle);
        }
        let reset = self
            .timeline
            .schedule(audio.duration_ms, TimerEvent::LipSyncReset);
        self.session.lip_sync_timers.push(reset);

        debug!(
            phonemes = audio.phonemes.len(),
            duration_ms = audio.duration_ms,
            "Lip-sync started"
        );
    }

    fn update_mouth_shape(&mut self, shape: MouthShape) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        for other in MouthShape::ALL {
            renderer.clear_visual_class(other.visual_class());
        }
        renderer.apply_visual_class(shape.visual_class());
    }

    // -- sequences ------------------------------------------------------------

    fn start_next_step(&mut self) {
        let Some(run) = self.sequence.as_mut() else {
            return;
        };
        run.pending_advance = None;

        let Some(step) = run.queue.next_step() else {
            debug!(steps = run.queue.played(), "Sequence finished");
            self.sequence = None;
            return;
        };

        if !self.table.contains(&step.state) {
            warn!(state = %step.state, "Skipping unknown sequence step");
            self.schedule_sequence_advance(step.delay_ms);
            return;
        }
        self.transition(&step.state, step.options, Some(step.delay_ms));
    }

    fn schedule_sequence_advance(&mut self, delay_ms: u64) {
        if self.sequence.is_none() {
            return;
        }
        let handle = self.timeline.schedule(delay_ms, TimerEvent::SequenceAdvance);
        if let Some(run) = self.sequence.as_mut() {
            run.pending_advance = Some(handle);
        }
    }

    fn abandon_sequence(&mut self) {
        let Some(run) = self.sequence.take() else {
            return;
        };
        if let Some(handle) = run.pending_advance {
            self.timeline.cancel(handle);
        }
        debug!(remaining = run.queue.remaining(), "Sequence abandoned");
    }
}

impl Drop for ZapAnimator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for ZapAnimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZapAnimator")
            .field("current_state", &self.session.current_state)
            .field("now_ms", &self.timeline.now_ms())
            .field("pending_timers", &self.timeline.len())
            .field("lip_sync_active", &self.session.lip_sync_active)
            .field("sequence_running", &self.sequence.is_some())
            .field("shut_down", &self.shut_down)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn animator() -> (ZapAnimator, MemorySurface) {
        let surface = MemorySurface::new();
        let animator = ZapAnimator::builder().surface(&surface).seed(1).build();
        (animator, surface)
    }

    #[test]
    fn test_starts_idle_with_idle_class() {
        let (animator, surface) = animator();
        assert_eq!(animator.current_state(), IDLE);
        assert!(surface.has_class("zap-idle"));
        assert!(!animator.auto_return_pending());
    }

    #[test]
    fn test_idle_ticker_is_the_only_timer_at_rest() {
        let (animator, _surface) = animator();
        assert_eq!(animator.pending_timers(), 1);
    }

    #[test]
    fn test_zero_tick_disables_idle_cycle() {
        let surface = MemorySurface::new();
        let mut animator = ZapAnimator::builder()
            .surface(&surface)
            .settings(AnimatorSettings {
                idle_tick_ms: 0,
                idle_variation_ms: 2000,
            })
            .seed(1)
            .build();
        assert_eq!(animator.pending_timers(), 0);

        animator.advance(Duration::from_secs(60));
        assert_eq!(surface.classes().len(), 1);
    }

    #[test]
    fn test_audio_ignored_outside_explaining() {
        let (mut animator, _surface) = animator();
        animator.play(
            "hint",
            PlayOptions::new().with_audio(AudioData::new(1000, Vec::new())),
        );
        assert!(!animator.lip_sync_active());
    }

    #[test]
    fn test_empty_override_message_falls_back_to_pool() {
        let (mut animator, surface) = animator();
        animator.play("victory", PlayOptions::new().with_message(""));
        let (text, _) = surface.last_message().unwrap();
        let pool = &animator.state_table().get("victory").unwrap().messages;
        assert!(pool.contains(&text));
    }

    #[test]
    fn test_finish_current_without_pending_is_noop() {
        let (mut animator, _surface) = animator();
        assert!(!animator.finish_current());
    }

    #[test]
    fn test_missing_collaborators_do_not_block_transitions() {
        let mut animator = ZapAnimator::builder().seed(3).build();
        assert!(animator.play("boss_victory", PlayOptions::default()));
        assert_eq!(animator.current_state(), "boss_victory");

        animator.advance(Duration::from_millis(5000));
        assert_eq!(animator.current_state(), IDLE);
    }
}
