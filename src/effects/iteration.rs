/// One `(state, action)` pair published by the host store.
///
/// Iterations are shared between every running effect as `Arc<Iteration<S, A>>`;
/// nothing is retained once all effects have consumed them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Iteration<S, A> {
    /// Store state after the action was reduced.
    pub state: S,
    /// Action that produced this state.
    pub action: A,
}

impl<S, A> Iteration<S, A> {
    /// Creates a new iteration.
    pub fn new(state: S, action: A) -> Self {
        Self { state, action }
    }
}
