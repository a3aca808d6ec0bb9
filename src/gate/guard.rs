//! Gate stacks wrapped around a child view

use super::{Denial, Gate, GateContext, GateDecision, Redirect, Route};

/// Something that can be rendered once access is granted
pub trait View {
    type Output;

    fn render(&self, ctx: &GateContext<'_>) -> Self::Output;
}

impl<F, T> View for F
where
    F: Fn(&GateContext<'_>) -> T,
{
    type Output = T;

    fn render(&self, ctx: &GateContext<'_>) -> T {
        self(ctx)
    }
}

/// What a guarded view shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered<T> {
    View(T),
    Redirect(Redirect),
    Loading,
    Denied(Denial),
}

impl<T> Rendered<T> {
    pub fn into_view(self) -> Option<T> {
        match self {
            Rendered::View(view) => Some(view),
            _ => None,
        }
    }
}

/// A child view behind a stack of gates, outermost first
pub struct Guarded<V> {
    gates: Vec<Gate>,
    child: V,
}

impl<V: View> Guarded<V> {
    pub fn new(child: V) -> Self {
        Self {
            gates: Vec::new(),
            child,
        }
    }

    /// Wrap `child` in the gates registered for `route`
    pub fn for_route(route: &Route, child: V) -> Self {
        Self {
            gates: route.gates(),
            child,
        }
    }

    /// Add a gate inside the existing ones
    pub fn gate(mut self, gate: Gate) -> Self {
        self.gates.push(gate);
        self
    }

    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// First refusal from the outermost gate inwards, or `Allow`
    pub fn decide(&self, ctx: &GateContext<'_>) -> GateDecision {
        self.gates
            .iter()
            .map(|gate| gate.evaluate(ctx))
            .find(|decision| !decision.is_allowed())
            .unwrap_or(GateDecision::Allow)
    }

    /// Run the lookups the gates need.
    ///
    /// Stops at the first gate that refuses outright so inner gates never
    /// fetch on behalf of a user who will be redirected.
    pub async fn prepare(&self, ctx: &GateContext<'_>) {
        for gate in &self.gates {
            gate.prepare(ctx).await;
            if let GateDecision::Redirect(_) | GateDecision::Denied(_) = gate.evaluate(ctx) {
                break;
            }
        }
    }

    /// Render the child only if every gate allows
    pub fn render(&self, ctx: &GateContext<'_>) -> Rendered<V::Output> {
        match self.decide(ctx) {
            GateDecision::Allow => Rendered::View(self.child.render(ctx)),
            GateDecision::Redirect(redirect) => Rendered::Redirect(redirect),
            GateDecision::Loading => Rendered::Loading,
            GateDecision::Denied(denial) => Rendered::Denied(denial),
        }
    }

    /// `prepare` followed by `render`
    pub async fn resolve(&self, ctx: &GateContext<'_>) -> Rendered<V::Output> {
        self.prepare(ctx).await;
        self.render(ctx)
    }
}
