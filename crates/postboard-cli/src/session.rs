use std::mem;

use crate::client::{CliError, Ctx};
use crate::view::{Effect, Event, ViewState, transition};

/// Drives the view machine, turning each effect into an HTTP call and
/// feeding the outcome back as the next event.
pub struct Session {
    ctx: Ctx,
    state: ViewState,
}

impl Session {
    /// Build a session and load the initial post list.
    pub async fn start(ctx: Ctx) -> (Self, Vec<String>) {
        let (state, effect) = ViewState::start();
        let mut session = Self { ctx, state };
        let alerts = session.run(effect).await;
        (session, alerts)
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Apply one event and everything it triggers. Returns the alerts raised.
    pub async fn dispatch(&mut self, event: Event) -> Vec<String> {
        let effect = self.step(event);
        self.run(effect).await
    }

    /// Re-fetch the post list from the server.
    pub async fn refresh(&mut self) -> Vec<String> {
        self.run(Effect::FetchPosts).await
    }

    fn step(&mut self, event: Event) -> Effect {
        let (next, effect) = transition(mem::take(&mut self.state), event);
        self.state = next;
        effect
    }

    async fn run(&mut self, mut effect: Effect) -> Vec<String> {
        let mut alerts = Vec::new();
        loop {
            let completion = match effect {
                Effect::None => break,
                Effect::Alert(message) => {
                    alerts.push(message);
                    break;
                }
                Effect::FetchPosts => completed(self.ctx.list_posts().await, Event::Loaded),
                Effect::CreatePost(payload) => {
                    completed(self.ctx.create_post(&payload).await, Event::Created)
                }
                Effect::UpdatePost(id, payload) => {
                    completed(self.ctx.update_post(id, &payload).await, Event::Updated)
                }
                Effect::DeletePost(id) => {
                    completed(self.ctx.delete_post(id).await, |_| Event::Deleted(id))
                }
            };
            effect = self.step(completion);
        }
        alerts
    }
}

fn completed<T>(result: Result<T, CliError>, on_success: impl FnOnce(T) -> Event) -> Event {
    match result {
        Ok(value) => on_success(value),
        Err(err) => Event::Failed(err.to_string()),
    }
}
