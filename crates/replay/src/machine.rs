//! Playback state machine.
//!
//! [`transition`] is pure with respect to the outside world: it updates the
//! [`ReplayContext`] it is handed and returns the [`Effect`]s the caller has to
//! carry out (casting events, touching the scheduler). Events not listed for a
//! state are ignored and leave both state and context untouched.
//!
//! | from     | event      | to      | effects                     |
//! |----------|------------|---------|-----------------------------|
//! | paused   | PLAY       | playing | `Play(plan)`                |
//! | paused   | CAST_EVENT | paused  | -                           |
//! | paused   | TO_LIVE    | live    | `StartLive`                 |
//! | paused   | ADD_EVENT  | paused  | `AddEvent`                  |
//! | playing  | PAUSE      | paused  | `ClearScheduler`            |
//! | playing  | CAST_EVENT | playing | -                           |
//! | playing  | END        | paused  | `ClearScheduler`            |
//! | playing  | ADD_EVENT  | playing | `AddEvent`                  |
//! | live     | ADD_EVENT  | live    | `AddEvent`                  |
//! | live     | CAST_EVENT | live    | -                           |
//! | interact | PLAY       | playing | -                           |
//! | interact | PAUSE, END | paused  | -                           |

use core_types::{Millis, PlayerState};
use snapshot::EventWithTime;
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct ReplayContext {
    pub events: Vec<Rc<EventWithTime>>,
    /// Playback position relative to the first event.
    pub time_offset: Millis,
    /// Absolute recorded time corresponding to the playback position.
    pub baseline_time: Millis,
    /// Index into `events` of the event cast most recently.
    pub last_played: Option<usize>,
}

impl ReplayContext {
    pub fn new(events: Vec<EventWithTime>) -> Self {
        Self {
            events: events.into_iter().map(Rc::new).collect(),
            ..Self::default()
        }
    }

    pub fn first_timestamp(&self) -> Millis {
        self.events.first().map_or(0.0, |e| e.timestamp)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum MachineEvent {
    Play { time_offset: Millis },
    Pause,
    CastEvent { index: usize },
    End,
    ToLive { baseline: Millis },
    AddEvent { event: EventWithTime },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScheduledCast {
    pub index: usize,
    pub delay: Millis,
}

/// What a PLAY does to the event list, in event order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlaybackPlan {
    /// Events already behind the baseline, cast immediately in sync mode.
    pub sync: Vec<usize>,
    pub scheduled: Vec<ScheduledCast>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Clear the scheduler, cast `sync`, flush, then schedule the rest.
    Play(PlaybackPlan),
    ClearScheduler,
    StartLive { baseline: Millis },
    /// An event was appended at `index`; cast now when `sync`, else schedule.
    AddEvent { index: usize, delay: Millis, sync: bool },
}

/// Index of the last Meta at or before `baseline`; earlier events belong to a
/// previous page and are never replayed.
pub fn needed_events_start(events: &[Rc<EventWithTime>], baseline: Millis) -> usize {
    events
        .iter()
        .rposition(|e| e.is_meta() && e.timestamp <= baseline)
        .unwrap_or(0)
}

pub fn plan_playback(ctx: &ReplayContext) -> PlaybackPlan {
    let baseline = ctx.baseline_time;
    let last_played_at = ctx
        .last_played
        .and_then(|i| ctx.events.get(i))
        .map(|e| e.effective_timestamp());
    let mut plan = PlaybackPlan::default();
    let start = needed_events_start(&ctx.events, baseline);
    for (index, event) in ctx.events.iter().enumerate().skip(start) {
        // seeking backwards replays from the last Meta again
        if let Some(last) = last_played_at
            && last <= baseline
            && (event.timestamp <= last || ctx.last_played == Some(index))
        {
            continue;
        }
        if event.timestamp < baseline {
            if event.must_replay_in_sync() {
                plan.sync.push(index);
            }
        } else {
            plan.scheduled.push(ScheduledCast {
                index,
                delay: event.delay_from(baseline),
            });
        }
    }
    plan
}

pub fn transition(
    state: PlayerState,
    ctx: &mut ReplayContext,
    event: MachineEvent,
) -> (PlayerState, Vec<Effect>) {
    use MachineEvent as E;
    use PlayerState as S;

    match (state, event) {
        (S::Paused, E::Play { time_offset }) => {
            ctx.time_offset = time_offset;
            ctx.baseline_time = ctx.first_timestamp() + time_offset;
            (S::Playing, vec![Effect::Play(plan_playback(ctx))])
        }
        (S::Paused | S::Playing | S::Live, E::CastEvent { index }) => {
            ctx.last_played = Some(index);
            (state, Vec::new())
        }
        (S::Paused, E::ToLive { baseline }) => {
            ctx.baseline_time = baseline;
            (S::Live, vec![Effect::StartLive { baseline }])
        }
        (S::Paused | S::Playing | S::Live, E::AddEvent { event }) => {
            let delay = event.delay_from(ctx.baseline_time);
            let sync = event.timestamp < ctx.baseline_time;
            ctx.events.push(Rc::new(event));
            let index = ctx.events.len() - 1;
            (state, vec![Effect::AddEvent { index, delay, sync }])
        }
        (S::Playing, E::Pause) => (S::Paused, vec![Effect::ClearScheduler]),
        (S::Playing, E::End) => {
            ctx.last_played = None;
            (S::Paused, vec![Effect::ClearScheduler])
        }
        (S::Interact, E::Play { .. }) => (S::Playing, Vec::new()),
        (S::Interact, E::Pause | E::End) => (S::Paused, Vec::new()),
        (state, event) => {
            log::trace!(target: "replay.player", "{} ignores {event:?}", state.as_str());
            (state, Vec::new())
        }
    }
}

/// Current state plus context, advanced through [`transition`].
#[derive(Debug, Default)]
pub struct ReplayMachine {
    state: PlayerState,
    context: ReplayContext,
}

impl ReplayMachine {
    pub fn new(events: Vec<EventWithTime>) -> Self {
        Self {
            state: PlayerState::Paused,
            context: ReplayContext::new(events),
        }
    }

    pub fn send(&mut self, event: MachineEvent) -> Vec<Effect> {
        let (next, effects) = transition(self.state, &mut self.context, event);
        self.state = next;
        effects
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn context(&self) -> &ReplayContext {
        &self.context
    }

    pub fn event(&self, index: usize) -> Option<Rc<EventWithTime>> {
        self.context.events.get(index).cloned()
    }

    pub fn is_last_event(&self, index: usize) -> bool {
        index + 1 == self.context.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replay_test_support::{
        adds, basic_page, element, full, add, interaction, meta, mouse_move, mutation, BODY,
    };
    use snapshot::MouseInteraction;

    fn session() -> Vec<EventWithTime> {
        vec![
            meta(0.0, 800, 600),
            full(0.0, basic_page()),
            mutation(100.0, adds(vec![add(BODY, None, element(10, "div", vec![]))])),
            interaction(150.0, MouseInteraction::Click, 10),
            mutation(200.0, adds(vec![add(10, None, element(11, "p", vec![]))])),
            mouse_move(320.0, &[(1.0, 1.0, 10, -20.0)]),
        ]
    }

    fn play(machine: &mut ReplayMachine, offset: Millis) -> PlaybackPlan {
        match machine.send(MachineEvent::Play { time_offset: offset }).as_slice() {
            [Effect::Play(plan)] => plan.clone(),
            other => panic!("expected a play plan, got {other:?}"),
        }
    }

    #[test]
    fn play_splits_sync_and_scheduled() {
        let mut machine = ReplayMachine::new(session());
        let plan = play(&mut machine, 175.0);
        assert_eq!(machine.state(), PlayerState::Playing);
        // the click at 150 is transient and dropped
        assert_eq!(plan.sync, vec![0, 1, 2]);
        assert_eq!(
            plan.scheduled,
            vec![
                ScheduledCast { index: 4, delay: 25.0 },
                ScheduledCast { index: 5, delay: 125.0 },
            ]
        );
    }

    #[test]
    fn passed_events_are_skipped_on_second_play() {
        let mut machine = ReplayMachine::new(session());
        let plan = play(&mut machine, 250.0);
        for index in plan.sync {
            machine.send(MachineEvent::CastEvent { index });
        }
        machine.send(MachineEvent::Pause);
        let again = play(&mut machine, 250.0);
        assert!(again.sync.is_empty());
        assert_eq!(again.scheduled.len(), 1);
    }

    #[test]
    fn last_meta_before_baseline_bounds_the_plan() {
        let mut events = session();
        events.push(meta(400.0, 1024, 768));
        events.push(full(400.0, basic_page()));
        let mut machine = ReplayMachine::new(events);
        let plan = play(&mut machine, 500.0);
        assert_eq!(plan.sync, vec![6, 7]);
    }

    #[test]
    fn end_resets_last_played_and_stops() {
        let mut machine = ReplayMachine::new(session());
        play(&mut machine, 0.0);
        machine.send(MachineEvent::CastEvent { index: 5 });
        assert_eq!(machine.context().last_played, Some(5));
        let effects = machine.send(MachineEvent::End);
        assert_eq!(effects, vec![Effect::ClearScheduler]);
        assert_eq!(machine.state(), PlayerState::Paused);
        assert_eq!(machine.context().last_played, None);
    }

    #[test]
    fn unlisted_events_are_ignored() {
        let mut ctx = ReplayContext::new(session());
        let (state, effects) = transition(PlayerState::Paused, &mut ctx, MachineEvent::End);
        assert_eq!((state, effects.len()), (PlayerState::Paused, 0));
        let (state, effects) =
            transition(PlayerState::Live, &mut ctx, MachineEvent::Play { time_offset: 5.0 });
        assert_eq!((state, effects.len()), (PlayerState::Live, 0));
        assert_eq!(ctx.time_offset, 0.0);
        let (state, _) = transition(PlayerState::Playing, &mut ctx, MachineEvent::ToLive {
            baseline: 1.0,
        });
        assert_eq!(state, PlayerState::Playing);
    }

    #[test]
    fn interact_returns_without_effects() {
        let mut ctx = ReplayContext::new(session());
        let (state, effects) =
            transition(PlayerState::Interact, &mut ctx, MachineEvent::Play { time_offset: 9.0 });
        assert_eq!(state, PlayerState::Playing);
        assert!(effects.is_empty());
        let (state, _) = transition(PlayerState::Interact, &mut ctx, MachineEvent::End);
        assert_eq!(state, PlayerState::Paused);
    }

    #[test]
    fn live_add_event_reports_delay_against_baseline() {
        let mut machine = ReplayMachine::new(vec![meta(1_000.0, 800, 600)]);
        let effects = machine.send(MachineEvent::ToLive { baseline: 1_000.0 });
        assert_eq!(effects, vec![Effect::StartLive { baseline: 1_000.0 }]);
        let effects = machine.send(MachineEvent::AddEvent {
            event: mutation(1_040.0, adds(vec![])),
        });
        assert_eq!(
            effects,
            vec![Effect::AddEvent { index: 1, delay: 40.0, sync: false }]
        );
        let effects = machine.send(MachineEvent::AddEvent {
            event: mutation(990.0, adds(vec![])),
        });
        assert_eq!(
            effects,
            vec![Effect::AddEvent { index: 2, delay: -10.0, sync: true }]
        );
        assert_eq!(machine.state(), PlayerState::Live);
    }
}
