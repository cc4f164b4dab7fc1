/// Marker trait for controller state.
///
/// Values are replaced, never mutated in place, and compared to detect
/// whether a transition changed anything.
pub trait ViewState: Clone + PartialEq + Default + Send + 'static {}
