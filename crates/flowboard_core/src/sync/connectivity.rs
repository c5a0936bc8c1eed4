//! Connectivity monitor.
//!
//! Thin wrapper over the platform reachability signal. Reports only real
//! state changes; an `Offline -> Online` transition is the sync trigger.

use log::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityState {
    Online,
    Offline,
}

impl ConnectivityState {
    pub fn from_reachable(reachable: bool) -> Self {
        if reachable {
            Self::Online
        } else {
            Self::Offline
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityTransition {
    WentOnline,
    WentOffline,
}

/// Platform reachability probe.
pub trait ReachabilitySignal {
    fn is_reachable(&self) -> bool;
}

impl<F: Fn() -> bool> ReachabilitySignal for F {
    fn is_reachable(&self) -> bool {
        self()
    }
}

type Listener = Box<dyn FnMut(ConnectivityTransition)>;

pub struct ConnectivityMonitor {
    state: ConnectivityState,
    listeners: Vec<Listener>,
}

impl ConnectivityMonitor {
    pub fn new(initial: ConnectivityState) -> Self {
        Self {
            state: initial,
            listeners: Vec::new(),
        }
    }

    pub fn state(&self) -> ConnectivityState {
        self.state
    }

    pub fn is_online(&self) -> bool {
        self.state == ConnectivityState::Online
    }

    /// Registers a listener called on every transition.
    pub fn subscribe(&mut self, listener: impl FnMut(ConnectivityTransition) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Feeds one reachability observation. Returns the transition it caused,
    /// if any.
    pub fn update(&mut self, reachable: bool) -> Option<ConnectivityTransition> {
        let next = ConnectivityState::from_reachable(reachable);
        if next == self.state {
            return None;
        }
        self.state = next;

        let transition = match next {
            ConnectivityState::Online => ConnectivityTransition::WentOnline,
            ConnectivityState::Offline => ConnectivityTransition::WentOffline,
        };
        info!(
            "event=connectivity_change module=sync status=ok state={}",
            next.as_str()
        );
        for listener in &mut self.listeners {
            listener(transition);
        }
        Some(transition)
    }

    /// Samples `signal` and feeds the result into `update`.
    pub fn poll(&mut self, signal: &dyn ReachabilitySignal) -> Option<ConnectivityTransition> {
        self.update(signal.is_reachable())
    }
}
