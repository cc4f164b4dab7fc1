use super::intent::Intent;
use super::state::ViewState;

/// `(State, Intent) -> State`, with no side effects.
pub trait Reducer {
    type State: ViewState;
    type Intent: Intent;

    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State;
}
