//! The replayer: owns the live tree sink and drives it from a recorded session.
//!
//! The host calls [`Replayer::tick`] once per frame. Everything else happens
//! synchronously inside the public methods: seeking casts every passed event
//! through the catch-up index and applies one collapsed batch, later events are
//! released by the scheduler as their delay elapses.

use crate::apply::MutationApplier;
use crate::builder::TreeBuilder;
use crate::clock::{Clock, SystemClock};
use crate::config::ReplayConfig;
use crate::error::{ReplayError, report};
use crate::identity::IdentityMap;
use crate::machine::{Effect, MachineEvent, ReplayMachine};
use crate::scheduler::{ActionTimelineScheduler, ScheduledAction};
use crate::tree_index::TreeIndex;
use bus::{Emitter, ReplayerSignal};
use core_types::{Millis, NodeId, PlayerState, UNKNOWN_SIBLING};
use sink::TreeSink;
use snapshot::{
    Event, EventWithTime, FullCapture, IncrementalData, InputData, MouseInteractionData,
    ScrollData, TextSelectionData,
};
use std::sync::mpsc::Receiver;

const TARGET: &str = "replay.player";

/// Payload of a scheduled action.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Action {
    /// Cast the event at this index of the session.
    Cast(usize),
    Pointer { x: f64, y: f64, id: NodeId },
    /// Keeps the timeline busy until a pointer batch has played out.
    KeepAlive,
    /// Ends playback once everything the last event scheduled has fired.
    Finish,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlayerMetadata {
    pub start_time: Millis,
    pub end_time: Millis,
    pub total_time: Millis,
}

#[derive(Debug)]
struct StylesheetWait {
    deadline: Millis,
    resume_playing: bool,
}

pub struct Replayer<S: TreeSink, C: Clock = SystemClock> {
    sink: S,
    clock: C,
    config: ReplayConfig,
    ids: IdentityMap<S::Node>,
    builder: TreeBuilder,
    applier: MutationApplier<S::Node>,
    tree_index: TreeIndex,
    scheduler: ActionTimelineScheduler<Action>,
    machine: ReplayMachine,
    emitter: Emitter,
    poster_pending: bool,
    stylesheet_wait: Option<StylesheetWait>,
}

impl<S: TreeSink> Replayer<S, SystemClock> {
    pub fn new(events: Vec<EventWithTime>, sink: S, config: ReplayConfig) -> Self {
        Self::with_clock(events, sink, config, SystemClock::new())
    }
}

impl<S: TreeSink, C: Clock> Replayer<S, C> {
    /// The first Meta and FullCapture are shown as a poster on the first
    /// [`Replayer::tick`], so subscribers registered right after construction
    /// see them.
    pub fn with_clock(events: Vec<EventWithTime>, sink: S, config: ReplayConfig, clock: C) -> Self {
        if events.is_empty() {
            log::warn!(target: TARGET, "[replayer] constructed without events");
        }
        Self {
            sink,
            clock,
            applier: MutationApplier::new(&config),
            config,
            ids: IdentityMap::new(),
            builder: TreeBuilder::new(),
            tree_index: TreeIndex::new(),
            scheduler: ActionTimelineScheduler::new(),
            machine: ReplayMachine::new(events),
            emitter: Emitter::new(),
            poster_pending: true,
            stylesheet_wait: None,
        }
    }

    pub fn subscribe(&mut self) -> Receiver<ReplayerSignal> {
        self.emitter.subscribe()
    }

    /// Play from `time_offset` milliseconds after the first event. Works from
    /// any position: passed events are replayed synchronously.
    pub fn play(&mut self, time_offset: Millis) {
        self.poster_pending = false;
        if self.machine.state() != PlayerState::Paused {
            self.send(MachineEvent::Pause);
        }
        self.send(MachineEvent::Play { time_offset });
        self.sink.set_paused(false);
        if let Some(wait) = &mut self.stylesheet_wait {
            wait.resume_playing = true;
        }
        self.emitter.emit(ReplayerSignal::Start);
    }

    /// Pause where playback is, or seek to `time_offset` and pause there.
    pub fn pause(&mut self, time_offset: Option<Millis>) {
        match time_offset {
            None if self.machine.state() == PlayerState::Playing => {
                self.send(MachineEvent::Pause);
            }
            None => {}
            Some(offset) => {
                self.play(offset);
                self.send(MachineEvent::Pause);
            }
        }
        self.sink.set_paused(true);
        if let Some(wait) = &mut self.stylesheet_wait {
            wait.resume_playing = false;
        }
        self.emitter.emit(ReplayerSignal::Pause);
    }

    #[deprecated(note = "use `play`, which takes the same argument")]
    pub fn resume(&mut self, time_offset: Millis) {
        log::warn!(
            target: TARGET,
            "[replayer] 'resume' is deprecated, use 'play' which has the same interface"
        );
        self.play(time_offset);
        self.emitter.emit(ReplayerSignal::Resume);
    }

    /// Switch to live mode; appended events play relative to `baseline`
    /// (recorded time that corresponds to now, wall time when omitted).
    pub fn to_live(&mut self, baseline: Option<Millis>) {
        self.poster_pending = false;
        let baseline = baseline.unwrap_or_else(|| self.clock.wall_time());
        self.send(MachineEvent::ToLive { baseline });
    }

    pub fn add_event(&mut self, event: EventWithTime) {
        self.send(MachineEvent::AddEvent { event });
    }

    /// Host frame callback.
    pub fn tick(&mut self) {
        if self.poster_pending {
            self.poster_pending = false;
            self.show_poster();
        }
        let now = self.clock.now();
        if let Some(wait) = &self.stylesheet_wait
            && now >= wait.deadline
        {
            log::debug!(target: TARGET, "stylesheet wait timed out");
            self.finish_stylesheet_wait();
        }
        self.scheduler.advance(now);
        // actions performed here may schedule more due actions
        while let Some(action) = self.scheduler.pop_due() {
            self.perform(action);
        }
    }

    /// Call when the sink has finished loading the stylesheets it reported.
    pub fn stylesheets_loaded(&mut self) {
        if self.stylesheet_wait.is_some() {
            self.finish_stylesheet_wait();
        }
    }

    /// Call when the content document of an embedded container became
    /// available, to attach the children kept pending for it.
    pub fn embedded_document_ready(&mut self, container: S::Node) {
        self.applier
            .embedded_document_ready(&mut self.sink, &mut self.ids, &self.builder, container);
    }

    pub fn metadata(&self) -> PlayerMetadata {
        let events = &self.machine.context().events;
        match (events.first(), events.last()) {
            (Some(first), Some(last)) => PlayerMetadata {
                start_time: first.timestamp,
                end_time: last.timestamp,
                total_time: last.timestamp - first.timestamp,
            },
            _ => PlayerMetadata::default(),
        }
    }

    /// Playback position relative to the first event.
    pub fn current_time(&self) -> Millis {
        self.scheduler.time_offset() + self.time_offset()
    }

    /// Position playback last started from.
    pub fn time_offset(&self) -> Millis {
        let ctx = self.machine.context();
        ctx.baseline_time - ctx.first_timestamp()
    }

    pub fn state(&self) -> PlayerState {
        self.machine.state()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Live node currently bound to `id`.
    pub fn node(&self, id: NodeId) -> Option<S::Node> {
        self.ids.get(id)
    }

    pub fn pending_actions(&self) -> usize {
        self.scheduler.len()
    }

    pub fn is_ticking(&self) -> bool {
        self.scheduler.is_active()
    }

    fn send(&mut self, event: MachineEvent) {
        let before = self.machine.state();
        let effects = self.machine.send(event);
        let after = self.machine.state();
        if before != after {
            log::debug!(target: TARGET, "{} -> {}", before.as_str(), after.as_str());
            self.emitter.emit(ReplayerSignal::StateChange(after));
        }
        for effect in effects {
            self.run_effect(effect);
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::Play(plan) => {
                self.scheduler.clear();
                log::debug!(
                    target: TARGET,
                    "seek: {} sync, {} scheduled",
                    plan.sync.len(),
                    plan.scheduled.len()
                );
                for index in plan.sync {
                    self.cast(index, true);
                }
                self.flush();
                self.scheduler
                    .add_actions(plan.scheduled.into_iter().map(|cast| ScheduledAction {
                        payload: Action::Cast(cast.index),
                        delay: cast.delay,
                    }));
                self.scheduler.start(self.clock.now());
            }
            Effect::ClearScheduler => self.scheduler.clear(),
            Effect::StartLive { baseline } => {
                log::debug!(target: TARGET, "live from baseline {baseline}");
                self.scheduler
                    .set_live_mode(self.config.live_mode_tick_forever);
                self.scheduler.start(self.clock.now());
            }
            Effect::AddEvent { index, delay, sync } => {
                // a paused session picks appended events up on the next play
                if self.machine.state() == PlayerState::Paused {
                    return;
                }
                if sync {
                    self.cast(index, true);
                    self.flush();
                    return;
                }
                self.scheduler.add_action(Action::Cast(index), delay);
                if !self.scheduler.is_active() {
                    self.scheduler.resume(self.clock.now());
                }
            }
        }
    }

    fn perform(&mut self, action: Action) {
        match action {
            Action::Cast(index) => {
                self.cast(index, false);
                if let Some(event) = self.machine.event(index) {
                    self.emitter.emit(ReplayerSignal::EventCast {
                        timestamp: event.timestamp,
                    });
                }
                if self.machine.is_last_event(index) && self.machine.state() == PlayerState::Playing
                {
                    // a trailing pointer batch still has samples queued
                    match self.scheduler.last_delay() {
                        Some(delay) => self.scheduler.add_action(Action::Finish, delay),
                        None => self.finish(),
                    }
                }
            }
            Action::Pointer { x, y, id } => self.move_and_hover(x, y, id),
            Action::KeepAlive => {}
            Action::Finish => {
                if self.machine.state() == PlayerState::Playing {
                    self.finish();
                }
            }
        }
    }

    fn finish(&mut self) {
        self.send(MachineEvent::End);
        self.emitter.emit(ReplayerSignal::Finish);
    }

    fn cast(&mut self, index: usize, sync: bool) {
        let Some(event) = self.machine.event(index) else {
            return;
        };
        log::trace!(target: TARGET, "cast #{index} at {} (sync: {sync})", event.timestamp);
        match &event.event {
            Event::Meta(meta) => self.emitter.emit(ReplayerSignal::Resize(meta.viewport())),
            Event::FullCapture(full) => self.rebuild_full_capture(full, sync),
            Event::IncrementalCapture(data) => self.apply_incremental(&event, data, sync),
        }
        self.send(MachineEvent::CastEvent { index });
    }

    fn show_poster(&mut self) {
        let events = &self.machine.context().events;
        let meta = events.iter().find_map(|e| match &e.event {
            Event::Meta(meta) => Some(meta.viewport()),
            _ => None,
        });
        let full = events.iter().find(|e| matches!(e.event, Event::FullCapture(_))).cloned();
        if let Some(viewport) = meta {
            self.emitter.emit(ReplayerSignal::Resize(viewport));
        }
        if let Some(event) = full
            && let Event::FullCapture(full) = &event.event
        {
            self.rebuild_full_capture(full, false);
        }
    }

    fn rebuild_full_capture(&mut self, full: &FullCapture, sync: bool) {
        if !self.sink.is_alive() {
            report(TARGET, &ReplayError::EngineDestroyed, true);
            return;
        }
        self.applier.reset();
        self.ids.reset();
        self.tree_index = TreeIndex::new();

        let Some(built) = self.builder.build(&mut self.sink, &mut self.ids, &full.node) else {
            log::warn!(target: TARGET, "[replayer] full capture {} could not be rebuilt", full.node.node_id);
            return;
        };
        if let Err(err) = self.sink.set_root(built.node) {
            report(TARGET, &ReplayError::from_sink(err), true);
            return;
        }
        self.applier
            .attach_embeds(&mut self.sink, &mut self.ids, &self.builder, built.pending);
        let offset = full.initial_offset;
        if let Err(err) = self.sink.set_scroll(built.node, offset.left, offset.top) {
            log::debug!(target: TARGET, "initial scroll: {err}");
        }
        self.sink
            .set_paused(self.machine.state() != PlayerState::Playing);
        self.emitter.emit(ReplayerSignal::FullCaptureRebuilt);
        if !sync {
            self.wait_for_stylesheets();
        }
    }

    fn wait_for_stylesheets(&mut self) {
        let pending = self.sink.pending_stylesheets();
        if pending == 0 {
            return;
        }
        log::debug!(target: TARGET, "waiting for {pending} stylesheet(s)");
        let resume_playing = self.machine.state() == PlayerState::Playing;
        self.send(MachineEvent::Pause);
        self.emitter.emit(ReplayerSignal::LoadStylesheetStart);
        self.stylesheet_wait = Some(StylesheetWait {
            deadline: self.clock.now() + self.config.stylesheet_timeout_ms,
            resume_playing,
        });
    }

    fn finish_stylesheet_wait(&mut self) {
        let Some(wait) = self.stylesheet_wait.take() else {
            return;
        };
        if wait.resume_playing {
            self.play(self.current_time());
        }
        self.emitter.emit(ReplayerSignal::LoadStylesheetEnd);
    }

    fn apply_incremental(&mut self, event: &EventWithTime, data: &IncrementalData, sync: bool) {
        match data {
            IncrementalData::Mutation(batch) => {
                if !sync {
                    self.applier.apply_batch(
                        &mut self.sink,
                        &mut self.ids,
                        &self.builder,
                        batch,
                        false,
                    );
                    return;
                }
                // same order as a live batch, so a move is remove then add
                for m in &batch.removes {
                    self.tree_index.remove(m, &self.sink, &self.ids);
                }
                for m in &batch.adds {
                    self.tree_index.add(m);
                }
                for m in &batch.texts {
                    self.tree_index.text(m);
                }
                for m in &batch.attributes {
                    self.tree_index.attribute(m);
                }
            }
            IncrementalData::MouseMove { positions } | IncrementalData::TouchMove { positions } => {
                if sync {
                    if let Some(last) = positions.last() {
                        self.move_and_hover(last.x, last.y, last.id);
                    }
                    return;
                }
                let baseline = self.machine.context().baseline_time;
                for p in positions {
                    self.scheduler.add_action(
                        Action::Pointer { x: p.x, y: p.y, id: p.id },
                        event.timestamp + p.time_offset - baseline,
                    );
                }
                self.scheduler
                    .add_action(Action::KeepAlive, event.timestamp - baseline);
            }
            IncrementalData::MouseInteraction(d) => self.mouse_interaction(d, sync),
            IncrementalData::Scroll(d) => {
                if d.id == UNKNOWN_SIBLING {
                    return;
                }
                if sync {
                    self.tree_index.scroll(d);
                } else {
                    self.perform_scroll(d);
                }
            }
            IncrementalData::ViewportResize(viewport) => {
                self.emitter.emit(ReplayerSignal::Resize(*viewport));
            }
            IncrementalData::Input(d) => {
                if d.id == UNKNOWN_SIBLING {
                    return;
                }
                if sync {
                    self.tree_index.input(d);
                } else {
                    self.perform_input(d);
                }
            }
            IncrementalData::MediaInteraction(d) => {
                let Some(target) = self.lookup(d.id) else {
                    return;
                };
                if let Err(err) = self.sink.media(target, d.kind) {
                    log::warn!(target: TARGET, "[replayer] failed to replay media interaction: {err}");
                }
            }
            IncrementalData::StyleSheetRule(d) => {
                if sync {
                    self.apply_pending_index();
                }
                self.applier.apply_style_rules(&mut self.sink, &self.ids, d);
            }
            IncrementalData::TextSelection(d) => {
                if sync {
                    self.apply_pending_index();
                }
                self.select(d);
            }
        }
    }

    fn mouse_interaction(&mut self, d: &MouseInteractionData, sync: bool) {
        if d.id == UNKNOWN_SIBLING {
            return;
        }
        let Some(target) = self.lookup(d.id) else {
            return;
        };
        self.emitter.emit(ReplayerSignal::MouseInteraction {
            kind: d.kind,
            id: d.id,
        });
        if d.kind.is_click_like() {
            // clicks are only shown on the pointer, never dispatched
            if !sync {
                self.move_and_hover(d.x, d.y, d.id);
                self.sink.click_pulse();
            }
        } else {
            self.sink.dispatch_interaction(target, d.kind);
        }
    }

    fn select(&mut self, d: &TextSelectionData) {
        let sel = d.selection;
        let (Some(anchor), Some(focus)) = (self.lookup(sel.anchor_id), self.lookup(sel.focus_id))
        else {
            return;
        };
        let focus_offset = sel.focus_offset - self.config.selection_focus_adjust;
        if let Err(err) = self
            .sink
            .set_selection(anchor, sel.anchor_offset, focus, focus_offset)
        {
            log::debug!(target: TARGET, "selection: {err}");
        }
    }

    fn move_and_hover(&mut self, x: f64, y: f64, id: NodeId) {
        self.sink.move_pointer(x, y);
        if let Some(target) = self.lookup(id) {
            self.sink.hover(target);
        }
    }

    fn perform_scroll(&mut self, d: &ScrollData) {
        let Some(target) = self.lookup(d.id) else {
            return;
        };
        if let Err(err) = self.sink.set_scroll(target, d.x, d.y) {
            log::debug!(target: TARGET, "scroll of {}: {err}", d.id);
        }
    }

    fn perform_input(&mut self, d: &InputData) {
        let Some(target) = self.lookup(d.id) else {
            return;
        };
        if let Err(err) = self.sink.set_input_value(target, &d.text, d.is_checked) {
            log::debug!(target: TARGET, "input of {}: {err}", d.id);
        }
    }

    fn lookup(&self, id: NodeId) -> Option<S::Node> {
        let node = self.ids.get(id);
        if node.is_none() {
            report(
                TARGET,
                &ReplayError::ReferenceNotFound { id },
                self.config.warn_missing_nodes,
            );
        }
        node
    }

    // Materialize what the catch-up index holds so far without ending the
    // catch-up; sync events that address nodes directly need them live.
    fn apply_pending_index(&mut self) {
        if self.tree_index.is_empty() {
            return;
        }
        let flushed = self.tree_index.flush();
        self.applier.apply_batch(
            &mut self.sink,
            &mut self.ids,
            &self.builder,
            &flushed.batch,
            self.config.use_virtual_parent,
        );
        for d in flushed.scrolls.values() {
            self.tree_index.scroll(d);
        }
        for d in flushed.inputs.values() {
            self.tree_index.input(d);
        }
    }

    fn flush(&mut self) {
        let flushed = self.tree_index.flush();
        if !flushed.batch.is_empty() {
            let report = self.applier.apply_batch(
                &mut self.sink,
                &mut self.ids,
                &self.builder,
                &flushed.batch,
                self.config.use_virtual_parent,
            );
            log::debug!(target: TARGET, "flushed {} mutation(s): {report:?}", flushed.batch.len());
        }
        self.applier.reattach_virtual_parents(&mut self.sink);
        for d in flushed.scrolls.values() {
            self.perform_scroll(d);
        }
        for d in flushed.inputs.values() {
            self.perform_input(d);
        }
        self.emitter.emit(ReplayerSignal::Flush);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use replay_test_support::{
        BODY, add, adds, basic_page, element, full, interaction, meta, mouse_move, mutation,
        selection,
    };
    use sink::{ArenaNode, ArenaSink, VisualEffect};
    use snapshot::MouseInteraction;

    fn replayer(events: Vec<EventWithTime>) -> Replayer<ArenaSink, ManualClock> {
        Replayer::with_clock(events, ArenaSink::new(), ReplayConfig::default(), ManualClock::new())
    }

    fn page() -> Vec<EventWithTime> {
        vec![
            meta(0.0, 800, 600),
            full(0.0, basic_page()),
            mutation(100.0, adds(vec![add(BODY, None, element(10, "div", vec![]))])),
        ]
    }

    #[test]
    fn poster_is_built_on_first_tick() {
        let mut player = replayer(page());
        let rx = player.subscribe();
        assert!(player.node(BODY).is_none());
        player.tick();
        assert!(player.node(BODY).is_some());
        assert!(player.node(10).is_none());
        let got: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            got,
            vec![
                ReplayerSignal::Resize(core_types::Viewport { width: 800, height: 600 }),
                ReplayerSignal::FullCaptureRebuilt,
            ]
        );
    }

    #[test]
    fn metadata_spans_first_to_last_event() {
        let player = replayer(page());
        assert_eq!(
            player.metadata(),
            PlayerMetadata { start_time: 0.0, end_time: 100.0, total_time: 100.0 }
        );
        let empty = replayer(Vec::new());
        assert_eq!(empty.metadata(), PlayerMetadata::default());
    }

    #[test]
    fn scheduled_cast_reaches_the_end() {
        let mut player = replayer(page());
        let rx = player.subscribe();
        player.play(0.0);
        // nothing is behind a zero baseline, so every event is scheduled
        assert_eq!(player.pending_actions(), 3);
        player.clock().advance(99.0);
        player.tick();
        assert!(player.node(10).is_none());
        player.clock().advance(1.0);
        player.tick();
        assert!(player.node(10).is_some());
        assert_eq!(player.state(), PlayerState::Paused);
        let got: Vec<_> = rx.try_iter().collect();
        assert!(got.contains(&ReplayerSignal::EventCast { timestamp: 100.0 }));
        assert_eq!(got.last(), Some(&ReplayerSignal::Finish));
    }

    #[test]
    fn pointer_batch_plays_each_sample() {
        let mut events = page();
        events.push(mouse_move(200.0, &[(1.0, 2.0, 10, -50.0), (3.0, 4.0, 10, 0.0)]));
        events.push(mutation(300.0, adds(vec![])));
        let mut player = replayer(events);
        let pointers = |player: &Replayer<ArenaSink, ManualClock>| -> Vec<VisualEffect> {
            player
                .sink()
                .visual_log()
                .iter()
                .filter(|e| matches!(e, VisualEffect::Pointer { .. }))
                .cloned()
                .collect()
        };
        player.play(0.0);
        player.clock().advance(150.0);
        player.tick();
        assert_eq!(pointers(&player), vec![VisualEffect::Pointer { x: 1.0, y: 2.0 }]);
        player.clock().advance(50.0);
        player.tick();
        assert_eq!(pointers(&player).len(), 2);
        assert!(player.sink().visual_log().contains(&VisualEffect::Hover(Some(10))));
    }

    #[test]
    fn trailing_pointer_batch_keeps_playing_until_its_last_sample() {
        let mut events = page();
        events.push(mouse_move(
            200.0,
            &[(1.0, 1.0, 10, -60.0), (2.0, 2.0, 10, -30.0), (3.0, 3.0, 10, 0.0)],
        ));
        let mut player = replayer(events);
        let rx = player.subscribe();
        let pointer_count = |player: &Replayer<ArenaSink, ManualClock>| {
            player
                .sink()
                .visual_log()
                .iter()
                .filter(|e| matches!(e, VisualEffect::Pointer { .. }))
                .count()
        };
        player.play(0.0);
        player.clock().advance(140.0);
        player.tick();
        assert_eq!(pointer_count(&player), 1);
        assert!(player.is_ticking());
        assert_eq!(player.state(), PlayerState::Playing);

        player.clock().advance(30.0);
        player.tick();
        assert_eq!(pointer_count(&player), 2);
        assert!(player.is_ticking());
        assert!(!rx.try_iter().any(|s| s == ReplayerSignal::Finish));

        player.clock().advance(30.0);
        player.tick();
        assert_eq!(pointer_count(&player), 3);
        assert_eq!(player.state(), PlayerState::Paused);
        assert!(!player.is_ticking());
        assert!(rx.try_iter().any(|s| s == ReplayerSignal::Finish));
    }

    #[test]
    fn click_pulses_instead_of_dispatching() {
        let mut events = page();
        events.push(interaction(150.0, MouseInteraction::Click, 10));
        events.push(interaction(160.0, MouseInteraction::Focus, 10));
        let mut player = replayer(events);
        player.play(0.0);
        player.clock().advance(200.0);
        player.tick();
        let log = player.sink().visual_log();
        assert!(log.contains(&VisualEffect::Click));
        assert!(log.contains(&VisualEffect::Interaction {
            id: Some(10),
            kind: MouseInteraction::Focus
        }));
        assert!(!log.iter().any(|e| matches!(
            e,
            VisualEffect::Interaction { kind: MouseInteraction::Click, .. }
        )));
    }

    #[test]
    fn selection_focus_is_adjusted() {
        let mut events = page();
        events.push(selection(150.0, (10, 1), (10, 4)));
        let config = ReplayConfig {
            selection_focus_adjust: 1,
            ..ReplayConfig::default()
        };
        let mut player =
            Replayer::with_clock(events, ArenaSink::new(), config, ManualClock::new());
        player.play(200.0);
        assert!(player.sink().visual_log().contains(&VisualEffect::Selection {
            anchor: Some(10),
            anchor_offset: 1,
            focus: Some(10),
            focus_offset: 3,
        }));
    }

    #[test]
    fn state_changes_are_signalled_once() {
        let mut player = replayer(page());
        let rx = player.subscribe();
        player.play(0.0);
        player.play(10.0);
        let changes: Vec<_> = rx
            .try_iter()
            .filter(|s| matches!(s, ReplayerSignal::StateChange(_)))
            .collect();
        // play -> pause -> play
        assert_eq!(
            changes,
            vec![
                ReplayerSignal::StateChange(PlayerState::Playing),
                ReplayerSignal::StateChange(PlayerState::Paused),
                ReplayerSignal::StateChange(PlayerState::Playing),
            ]
        );
    }

    #[test]
    #[allow(deprecated)]
    fn resume_plays_and_signals() {
        let mut player = replayer(page());
        let rx = player.subscribe();
        player.resume(0.0);
        assert_eq!(player.state(), PlayerState::Playing);
        assert_eq!(rx.try_iter().last(), Some(ReplayerSignal::Resume));
    }

    #[test]
    fn destroyed_sink_is_left_alone() {
        let mut sink = ArenaSink::new();
        sink.destroy();
        let mut player =
            Replayer::with_clock(page(), sink, ReplayConfig::default(), ManualClock::new());
        player.play(500.0);
        let node: Option<ArenaNode> = player.node(BODY);
        assert!(node.is_none());
    }
}
