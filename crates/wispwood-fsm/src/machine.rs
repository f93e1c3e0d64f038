//! The state machine runtime.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, trace};

use crate::error::FsmError;
use crate::state::{Activation, Directive, State, StateNode};

// =============================================================================
// StateMachine
// =============================================================================

/// Owns the states of one entity and drives their lifecycle.
///
/// # Invariants
///
/// - `current` is a registered key, or `None` before the first activation.
/// - Exactly one state is active at a time.
/// - Every entry into a state (including self-transitions) issues a fresh
///   [`Activation`]; halting issues one more so that outstanding tokens go
///   stale.
///
/// # Example
///
/// ```
/// use wispwood_fsm::{Activation, Directive, State, StateMachine, StateNode};
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum Door { Closed, Open }
///
/// impl std::fmt::Display for Door {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         write!(f, "{self:?}")
///     }
/// }
///
/// struct DoorState(Door);
///
/// impl StateNode for DoorState {
///     type Key = Door;
///     fn key(&self) -> Door { self.0 }
/// }
///
/// impl State<bool> for DoorState {
///     type Event = ();
///     fn execute(&mut self, push: &mut bool, _dt: f32) -> Directive<Door> {
///         match (self.0, *push) {
///             (Door::Closed, true) => Directive::Goto(Door::Open),
///             _ => Directive::Stay,
///         }
///     }
/// }
///
/// let mut fsm = StateMachine::new(
///     Door::Closed,
///     [DoorState(Door::Closed), DoorState(Door::Open)],
/// ).unwrap();
///
/// let mut push = false;
/// fsm.step(&mut push, 0.016).unwrap();
/// assert_eq!(fsm.current(), Some(Door::Closed));
///
/// push = true;
/// fsm.step(&mut push, 0.016).unwrap();
/// assert_eq!(fsm.current(), Some(Door::Open));
/// assert_eq!(fsm.activation(), Activation::new(2));
/// ```
pub struct StateMachine<S: StateNode> {
    states: HashMap<S::Key, S>,
    initial: S::Key,
    current: Option<S::Key>,
    activation: Activation,
    halted: bool,
}

impl<S: StateNode> fmt::Debug for StateMachine<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("initial", &self.initial)
            .field("current", &self.current)
            .field("activation", &self.activation)
            .field("halted", &self.halted)
            .field("states", &format!("[{} states]", self.states.len()))
            .finish()
    }
}

impl<S: StateNode> StateMachine<S> {
    /// Builds a machine from its states.
    ///
    /// # Errors
    ///
    /// - [`FsmError::DuplicateState`] if two states share a key.
    /// - [`FsmError::UnknownState`] if `initial` is not among `states`.
    pub fn new<I>(initial: S::Key, states: I) -> Result<Self, FsmError>
    where
        I: IntoIterator<Item = S>,
    {
        let mut map = HashMap::new();
        for state in states {
            let key = state.key();
            if map.insert(key, state).is_some() {
                return Err(FsmError::DuplicateState(key.to_string()));
            }
        }
        if !map.contains_key(&initial) {
            return Err(FsmError::UnknownState(initial.to_string()));
        }

        Ok(Self {
            states: map,
            initial,
            current: None,
            activation: Activation::NONE,
            halted: false,
        })
    }

    /// Returns the key of the active state, or `None` before the first step.
    #[must_use]
    pub fn current(&self) -> Option<S::Key> {
        self.current
    }

    /// Returns the configured initial state.
    #[must_use]
    pub fn initial(&self) -> S::Key {
        self.initial
    }

    /// Returns the most recently issued activation.
    #[must_use]
    pub fn activation(&self) -> Activation {
        self.activation
    }

    /// Returns `true` once the machine has halted.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Returns `true` if `key` is the active state.
    #[must_use]
    pub fn is_in(&self, key: S::Key) -> bool {
        self.current == Some(key)
    }

    /// Returns `true` if `key` is registered.
    #[must_use]
    pub fn contains(&self, key: S::Key) -> bool {
        self.states.contains_key(&key)
    }

    /// Returns the number of registered states.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Returns `true` if no states are registered.
    ///
    /// A machine built through [`StateMachine::new`] always has at least its
    /// initial state.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Returns a registered state by key.
    #[must_use]
    pub fn state(&self, key: S::Key) -> Option<&S> {
        self.states.get(&key)
    }

    /// Returns the active state.
    #[must_use]
    pub fn current_state(&self) -> Option<&S> {
        self.current.and_then(|key| self.states.get(&key))
    }

    /// Advances countdowns of the active state.
    ///
    /// Does nothing before the first activation or after halting.
    pub fn elapse(&mut self, dt: f32) {
        if self.halted {
            return;
        }
        if let Some(key) = self.current {
            if let Some(state) = self.states.get_mut(&key) {
                state.elapse(dt);
            }
        }
    }

    /// Runs one tick.
    ///
    /// On the first call the initial state is entered. The active state's
    /// `execute` then runs, and the directive it returns is applied.
    /// A halted machine ignores the call.
    ///
    /// # Errors
    ///
    /// Propagates errors from the transition requested by `execute`.
    pub fn step<C: ?Sized>(&mut self, ctx: &mut C, dt: f32) -> Result<(), FsmError>
    where
        S: State<C>,
    {
        if self.halted {
            return Ok(());
        }

        let key = if let Some(key) = self.current {
            key
        } else {
            let initial = self.initial;
            self.current = Some(initial);
            self.enter_current(ctx)?;
            initial
        };

        let directive = self.state_mut(key)?.execute(ctx, dt);
        self.apply(directive, ctx)
    }

    /// Moves to `to`: exit the active state (if any), then enter `to`.
    ///
    /// A self-transition still runs the full exit/enter cycle and issues a
    /// new activation.
    ///
    /// # Errors
    ///
    /// - [`FsmError::UnknownState`] if `to` is not registered; `current` is
    ///   left unchanged.
    /// - [`FsmError::Halted`] if the machine has halted.
    /// - [`FsmError::InvalidTransition`] if the active state is terminal.
    pub fn transition<C: ?Sized>(&mut self, to: S::Key, ctx: &mut C) -> Result<(), FsmError>
    where
        S: State<C>,
    {
        if !self.states.contains_key(&to) {
            return Err(FsmError::UnknownState(to.to_string()));
        }
        if self.halted {
            return Err(FsmError::Halted(to.to_string()));
        }

        let from = self.current;
        if let Some(from_key) = from {
            let state = self.state_mut(from_key)?;
            if state.is_terminal() {
                return Err(FsmError::InvalidTransition {
                    from: from_key.to_string(),
                    to: to.to_string(),
                });
            }
            state.exit(ctx);
        }

        self.current = Some(to);
        self.enter_current(ctx)?;
        debug!(from = ?from, to = %to, activation = %self.activation, "state transition");
        Ok(())
    }

    /// Delivers an animation-complete notification.
    ///
    /// Returns `Ok(false)` without touching any state when `activation` is
    /// not the active one (the state that asked for it has already exited).
    ///
    /// # Errors
    ///
    /// Propagates errors from the transition requested by `on_complete`.
    pub fn complete<C: ?Sized>(
        &mut self,
        activation: Activation,
        ctx: &mut C,
    ) -> Result<bool, FsmError>
    where
        S: State<C>,
    {
        let Some(key) = self.current else {
            return Ok(false);
        };
        if self.halted || activation != self.activation {
            trace!(
                token = %activation,
                active = %self.activation,
                "stale completion ignored"
            );
            return Ok(false);
        }

        let directive = self.state_mut(key)?.on_complete(ctx);
        self.apply(directive, ctx)?;
        Ok(true)
    }

    /// Forwards a signal to the active state.
    ///
    /// Returns `Ok(false)` if no state is active yet or the machine halted.
    ///
    /// # Errors
    ///
    /// Propagates errors from the transition requested by `on_event`.
    pub fn dispatch<C: ?Sized>(
        &mut self,
        event: &<S as State<C>>::Event,
        ctx: &mut C,
    ) -> Result<bool, FsmError>
    where
        S: State<C>,
    {
        let Some(key) = self.current else {
            return Ok(false);
        };
        if self.halted {
            return Ok(false);
        }

        let directive = self.state_mut(key)?.on_event(ctx, event);
        self.apply(directive, ctx)?;
        Ok(true)
    }

    /// Runs the active state's exit hook and stops the machine.
    ///
    /// The last state stays recorded as `current`. Halting twice is a no-op.
    pub fn halt<C: ?Sized>(&mut self, ctx: &mut C)
    where
        S: State<C>,
    {
        if self.halted {
            return;
        }
        if let Some(key) = self.current {
            if let Some(state) = self.states.get_mut(&key) {
                state.exit(ctx);
            }
        }
        self.halted = true;
        self.activation = self.activation.next();
        debug!(last = ?self.current, "state machine halted");
    }

    fn apply<C: ?Sized>(&mut self, directive: Directive<S::Key>, ctx: &mut C) -> Result<(), FsmError>
    where
        S: State<C>,
    {
        match directive {
            Directive::Stay => Ok(()),
            Directive::Goto(to) => self.transition(to, ctx),
            Directive::Halt => {
                self.halt(ctx);
                Ok(())
            }
        }
    }

    fn enter_current<C: ?Sized>(&mut self, ctx: &mut C) -> Result<(), FsmError>
    where
        S: State<C>,
    {
        let key = self.current.unwrap_or(self.initial);
        self.activation = self.activation.next();
        let activation = self.activation;
        self.state_mut(key)?.enter(ctx, activation);
        Ok(())
    }

    fn state_mut(&mut self, key: S::Key) -> Result<&mut S, FsmError> {
        self.states
            .get_mut(&key)
            .ok_or_else(|| FsmError::UnknownState(key.to_string()))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Lamp {
        Off,
        On,
        Flicker,
        Broken,
        // Never registered; used to exercise wiring errors.
        Missing,
    }

    impl fmt::Display for Lamp {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let name = match self {
                Self::Off => "off",
                Self::On => "on",
                Self::Flicker => "flicker",
                Self::Broken => "broken",
                Self::Missing => "missing",
            };
            f.write_str(name)
        }
    }

    #[derive(Debug, PartialEq, Eq, Clone)]
    enum Hook {
        Enter(Lamp, Activation),
        Execute(Lamp),
        Exit(Lamp),
        Complete(Lamp),
        Event(Lamp, u8),
    }

    #[derive(Default)]
    struct Ctx {
        log: Vec<Hook>,
        request: Option<Lamp>,
        halt: bool,
    }

    struct LampState {
        key: Lamp,
        countdown: f32,
    }

    impl LampState {
        fn new(key: Lamp) -> Self {
            Self { key, countdown: 0.0 }
        }
    }

    impl StateNode for LampState {
        type Key = Lamp;

        fn key(&self) -> Lamp {
            self.key
        }

        fn is_terminal(&self) -> bool {
            self.key == Lamp::Broken
        }

        fn elapse(&mut self, dt: f32) {
            self.countdown -= dt;
        }
    }

    impl State<Ctx> for LampState {
        type Event = u8;

        fn enter(&mut self, ctx: &mut Ctx, activation: Activation) {
            self.countdown = 1.0;
            ctx.log.push(Hook::Enter(self.key, activation));
        }

        fn execute(&mut self, ctx: &mut Ctx, _dt: f32) -> Directive<Lamp> {
            ctx.log.push(Hook::Execute(self.key));
            if ctx.halt {
                return Directive::Halt;
            }
            ctx.request.take().map_or(Directive::Stay, Directive::Goto)
        }

        fn exit(&mut self, ctx: &mut Ctx) {
            ctx.log.push(Hook::Exit(self.key));
        }

        fn on_complete(&mut self, ctx: &mut Ctx) -> Directive<Lamp> {
            ctx.log.push(Hook::Complete(self.key));
            Directive::Goto(Lamp::Off)
        }

        fn on_event(&mut self, ctx: &mut Ctx, event: &u8) -> Directive<Lamp> {
            ctx.log.push(Hook::Event(self.key, *event));
            if *event == 9 {
                Directive::Goto(Lamp::Flicker)
            } else {
                Directive::Stay
            }
        }
    }

    fn lamp() -> StateMachine<LampState> {
        StateMachine::new(
            Lamp::Off,
            [Lamp::Off, Lamp::On, Lamp::Flicker, Lamp::Broken].map(LampState::new),
        )
        .unwrap()
    }

    fn enters(log: &[Hook]) -> usize {
        log.iter().filter(|h| matches!(h, Hook::Enter(..))).count()
    }

    mod construction_tests {
        use super::*;

        #[test]
        fn starts_inactive() {
            let fsm = lamp();
            assert_eq!(fsm.current(), None);
            assert_eq!(fsm.initial(), Lamp::Off);
            assert_eq!(fsm.activation(), Activation::NONE);
            assert_eq!(fsm.len(), 4);
            assert!(!fsm.is_empty());
        }

        #[test]
        fn duplicate_key_rejected() {
            let err = StateMachine::new(
                Lamp::Off,
                [LampState::new(Lamp::Off), LampState::new(Lamp::Off)],
            )
            .unwrap_err();
            assert_eq!(err, FsmError::DuplicateState("off".into()));
        }

        #[test]
        fn unregistered_initial_rejected() {
            let err = StateMachine::new(Lamp::Missing, [LampState::new(Lamp::Off)]).unwrap_err();
            assert_eq!(err, FsmError::UnknownState("missing".into()));
        }
    }

    mod step_tests {
        use super::*;

        #[test]
        fn first_step_enters_initial_once() {
            let mut fsm = lamp();
            let mut ctx = Ctx::default();

            fsm.step(&mut ctx, 0.1).unwrap();
            fsm.step(&mut ctx, 0.1).unwrap();
            fsm.step(&mut ctx, 0.1).unwrap();

            assert_eq!(fsm.current(), Some(Lamp::Off));
            assert_eq!(
                ctx.log,
                vec![
                    Hook::Enter(Lamp::Off, Activation::new(1)),
                    Hook::Execute(Lamp::Off),
                    Hook::Execute(Lamp::Off),
                    Hook::Execute(Lamp::Off),
                ]
            );
        }

        #[test]
        fn execute_directive_applied_after_execute() {
            let mut fsm = lamp();
            let mut ctx = Ctx::default();
            fsm.step(&mut ctx, 0.1).unwrap();

            ctx.request = Some(Lamp::On);
            fsm.step(&mut ctx, 0.1).unwrap();

            assert_eq!(fsm.current(), Some(Lamp::On));
            assert_eq!(
                &ctx.log[2..],
                &[
                    Hook::Execute(Lamp::Off),
                    Hook::Exit(Lamp::Off),
                    Hook::Enter(Lamp::On, Activation::new(2)),
                ]
            );
        }

        #[test]
        fn halted_machine_ignores_step() {
            let mut fsm = lamp();
            let mut ctx = Ctx {
                halt: true,
                ..Ctx::default()
            };
            fsm.step(&mut ctx, 0.1).unwrap();
            assert!(fsm.is_halted());

            let logged = ctx.log.len();
            fsm.step(&mut ctx, 0.1).unwrap();
            assert_eq!(ctx.log.len(), logged);
        }
    }

    mod transition_tests {
        use super::*;

        #[test]
        fn exit_runs_before_enter() {
            let mut fsm = lamp();
            let mut ctx = Ctx::default();
            fsm.step(&mut ctx, 0.1).unwrap();
            ctx.log.clear();

            fsm.transition(Lamp::On, &mut ctx).unwrap();
            assert_eq!(
                ctx.log,
                vec![Hook::Exit(Lamp::Off), Hook::Enter(Lamp::On, Activation::new(2))]
            );
        }

        #[test]
        fn self_transition_runs_full_cycle() {
            let mut fsm = lamp();
            let mut ctx = Ctx::default();
            fsm.transition(Lamp::On, &mut ctx).unwrap();
            fsm.transition(Lamp::On, &mut ctx).unwrap();

            assert_eq!(
                ctx.log,
                vec![
                    Hook::Enter(Lamp::On, Activation::new(1)),
                    Hook::Exit(Lamp::On),
                    Hook::Enter(Lamp::On, Activation::new(2)),
                ]
            );
        }

        #[test]
        fn transition_before_first_step_skips_initial() {
            let mut fsm = lamp();
            let mut ctx = Ctx::default();
            fsm.transition(Lamp::Flicker, &mut ctx).unwrap();
            fsm.step(&mut ctx, 0.1).unwrap();

            assert_eq!(fsm.current(), Some(Lamp::Flicker));
            assert_eq!(enters(&ctx.log), 1);
        }

        #[test]
        fn unknown_target_leaves_current_unchanged() {
            let mut fsm = lamp();
            let mut ctx = Ctx::default();
            fsm.step(&mut ctx, 0.1).unwrap();
            ctx.log.clear();

            let err = fsm.transition(Lamp::Missing, &mut ctx).unwrap_err();
            assert_eq!(err, FsmError::UnknownState("missing".into()));
            assert_eq!(fsm.current(), Some(Lamp::Off));
            assert!(ctx.log.is_empty());
        }

        #[test]
        fn terminal_state_rejects_transitions() {
            let mut fsm = lamp();
            let mut ctx = Ctx::default();
            fsm.transition(Lamp::Broken, &mut ctx).unwrap();

            let err = fsm.transition(Lamp::On, &mut ctx).unwrap_err();
            assert!(matches!(err, FsmError::InvalidTransition { .. }));
            assert!(!err.is_fatal());
            assert_eq!(fsm.current(), Some(Lamp::Broken));

            let err = fsm.transition(Lamp::Broken, &mut ctx).unwrap_err();
            assert!(matches!(err, FsmError::InvalidTransition { .. }));
        }

        #[test]
        fn halted_machine_rejects_transitions() {
            let mut fsm = lamp();
            let mut ctx = Ctx::default();
            fsm.transition(Lamp::On, &mut ctx).unwrap();
            fsm.halt(&mut ctx);

            assert_eq!(
                fsm.transition(Lamp::Off, &mut ctx).unwrap_err(),
                FsmError::Halted("off".into())
            );
        }
    }

    mod completion_tests {
        use super::*;

        #[test]
        fn current_activation_resolves() {
            let mut fsm = lamp();
            let mut ctx = Ctx::default();
            fsm.transition(Lamp::On, &mut ctx).unwrap();
            let token = fsm.activation();

            assert!(fsm.complete(token, &mut ctx).unwrap());
            assert_eq!(fsm.current(), Some(Lamp::Off));
            assert!(ctx.log.contains(&Hook::Complete(Lamp::On)));
        }

        #[test]
        fn stale_activation_is_noop() {
            let mut fsm = lamp();
            let mut ctx = Ctx::default();
            fsm.transition(Lamp::On, &mut ctx).unwrap();
            let stale = fsm.activation();
            fsm.transition(Lamp::On, &mut ctx).unwrap();
            ctx.log.clear();

            assert!(!fsm.complete(stale, &mut ctx).unwrap());
            assert!(ctx.log.is_empty());
            assert_eq!(fsm.current(), Some(Lamp::On));
        }

        #[test]
        fn halting_invalidates_outstanding_tokens() {
            let mut fsm = lamp();
            let mut ctx = Ctx::default();
            fsm.transition(Lamp::On, &mut ctx).unwrap();
            let token = fsm.activation();
            fsm.halt(&mut ctx);

            assert!(!fsm.complete(token, &mut ctx).unwrap());
            assert_eq!(ctx.log.last(), Some(&Hook::Exit(Lamp::On)));
        }

        #[test]
        fn completion_before_start_is_noop() {
            let mut fsm = lamp();
            let mut ctx = Ctx::default();
            assert!(!fsm.complete(Activation::NONE, &mut ctx).unwrap());
        }
    }

    mod event_tests {
        use super::*;

        #[test]
        fn dispatch_reaches_active_state() {
            let mut fsm = lamp();
            let mut ctx = Ctx::default();
            fsm.step(&mut ctx, 0.1).unwrap();

            assert!(fsm.dispatch(&3, &mut ctx).unwrap());
            assert_eq!(ctx.log.last(), Some(&Hook::Event(Lamp::Off, 3)));

            fsm.dispatch(&9, &mut ctx).unwrap();
            assert_eq!(fsm.current(), Some(Lamp::Flicker));
        }

        #[test]
        fn dispatch_before_start_is_dropped() {
            let mut fsm = lamp();
            let mut ctx = Ctx::default();
            assert!(!fsm.dispatch(&9, &mut ctx).unwrap());
            assert_eq!(fsm.current(), None);
        }

        #[test]
        fn elapse_only_touches_active_state() {
            let mut fsm = lamp();
            let mut ctx = Ctx::default();
            fsm.transition(Lamp::On, &mut ctx).unwrap();
            fsm.elapse(0.25);

            assert!((fsm.current_state().unwrap().countdown - 0.75).abs() < 1e-6);
            assert!((fsm.state(Lamp::Off).unwrap().countdown - 0.0).abs() < 1e-6);
        }
    }

    // =========================================================================
    // Property tests
    // =========================================================================

    #[derive(Debug, Clone)]
    enum Op {
        Step,
        Goto(Lamp),
        Complete(bool),
        Event(u8),
    }

    fn lamp_key() -> impl Strategy<Value = Lamp> {
        prop_oneof![
            Just(Lamp::Off),
            Just(Lamp::On),
            Just(Lamp::Flicker),
            Just(Lamp::Broken),
            Just(Lamp::Missing),
        ]
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Step),
            lamp_key().prop_map(Op::Goto),
            any::<bool>().prop_map(Op::Complete),
            (0_u8..12).prop_map(Op::Event),
        ]
    }

    proptest! {
        #[test]
        fn lifecycle_stays_balanced(ops in prop::collection::vec(op(), 0..64)) {
            let mut fsm = lamp();
            let mut ctx = Ctx::default();

            for op in ops {
                let before = fsm.current();
                match op {
                    Op::Step => {
                        fsm.step(&mut ctx, 0.1).unwrap();
                    }
                    Op::Goto(key) => {
                        if let Err(err) = fsm.transition(key, &mut ctx) {
                            prop_assert_eq!(fsm.current(), before);
                            if key == Lamp::Missing {
                                prop_assert!(err.is_fatal());
                            }
                        }
                    }
                    Op::Complete(fresh) => {
                        let token = if fresh {
                            fsm.activation()
                        } else {
                            Activation::new(fsm.activation().as_u64().saturating_sub(1))
                        };
                        if let Err(err) = fsm.complete(token, &mut ctx) {
                            prop_assert!(!err.is_fatal());
                        }
                    }
                    Op::Event(e) => {
                        if let Err(err) = fsm.dispatch(&e, &mut ctx) {
                            prop_assert!(!err.is_fatal());
                        }
                    }
                }

                if let Some(key) = fsm.current() {
                    prop_assert!(fsm.contains(key));
                }
            }

            // Every exit is immediately followed by an enter, except a final
            // halt; every enter carries a strictly larger activation.
            let mut last = Activation::NONE;
            let mut entered = 0_usize;
            let mut exited = 0_usize;
            for (i, hook) in ctx.log.iter().enumerate() {
                match hook {
                    Hook::Enter(_, act) => {
                        prop_assert!(*act > last);
                        last = *act;
                        entered += 1;
                    }
                    Hook::Exit(_) => {
                        exited += 1;
                        let next = ctx.log.get(i + 1);
                        prop_assert!(
                            matches!(next, Some(Hook::Enter(..)) | None) || fsm.is_halted()
                        );
                    }
                    _ => {}
                }
            }
            if fsm.current().is_some() {
                let open = usize::from(!fsm.is_halted());
                prop_assert_eq!(entered, exited + open);
            }
        }
    }
}
