//! Native event loop for a [`Session`].
//!
//! Requests run as local tasks on the current thread; their completions are
//! queued and applied to the session one at a time, in arrival order. Must be
//! used from within a `tokio::task::LocalSet`.

use tokio::sync::mpsc;

use crate::map::MapSurface;
use crate::service::{execute, Command, Event, RouteService};
use crate::session::{Handled, Session};

pub struct Driver<S: MapSurface, R: RouteService + Clone + 'static> {
    session: Session<S>,
    service: R,
    completed_tx: mpsc::UnboundedSender<Event>,
    completed_rx: mpsc::UnboundedReceiver<Event>,
    in_flight: usize,
}

impl<S, R> Driver<S, R>
where
    S: MapSurface,
    R: RouteService + Clone + 'static,
{
    pub fn new(session: Session<S>, service: R) -> Self {
        let (completed_tx, completed_rx) = mpsc::unbounded_channel();
        Self {
            session,
            service,
            completed_tx,
            completed_rx,
            in_flight: 0,
        }
    }

    pub fn session(&self) -> &Session<S> {
        &self.session
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Runs a session mutation and issues the requests it returns.
    pub fn apply<T>(&mut self, mutate: impl FnOnce(&mut Session<S>) -> T) -> T
    where
        T: IntoCommands,
    {
        let mut output = mutate(&mut self.session);
        let commands = output.take_commands();
        self.dispatch(commands);
        output
    }

    pub fn dispatch(&mut self, commands: Vec<Command>) {
        for command in commands {
            let service = self.service.clone();
            let completed = self.completed_tx.clone();
            self.in_flight += 1;
            tokio::task::spawn_local(async move {
                let event = execute(&service, command).await;
                // The receiver lives as long as the driver.
                let _ = completed.send(event);
            });
        }
    }

    /// Waits for the next completion and applies it. Returns `None` when
    /// nothing is in flight.
    pub async fn next(&mut self) -> Option<Handled> {
        if self.in_flight == 0 {
            return None;
        }
        let event = self.completed_rx.recv().await?;
        self.in_flight -= 1;
        let mut handled = self.session.handle(event);
        let follow_up = std::mem::take(&mut handled.commands);
        self.dispatch(follow_up);
        Some(handled)
    }

    /// Applies completions until nothing is in flight.
    pub async fn settle(&mut self) -> Vec<Handled> {
        let mut all = Vec::new();
        while let Some(handled) = self.next().await {
            all.push(handled);
        }
        all
    }

    pub fn into_session(self) -> Session<S> {
        self.session
    }
}

/// Session results that carry requests to issue.
pub trait IntoCommands {
    fn take_commands(&mut self) -> Vec<Command>;
}

impl IntoCommands for Vec<Command> {
    fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(self)
    }
}

impl<E> IntoCommands for Result<Vec<Command>, E> {
    fn take_commands(&mut self) -> Vec<Command> {
        match self {
            Ok(commands) => std::mem::take(commands),
            Err(_) => Vec::new(),
        }
    }
}

impl IntoCommands for () {
    fn take_commands(&mut self) -> Vec<Command> {
        Vec::new()
    }
}
