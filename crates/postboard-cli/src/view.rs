//! Client view state machine.
//!
//! `transition` is pure: it consumes the current state and one event and
//! yields the next state plus at most one effect for the session to run.
//! Effects that talk to the server come back as completion events
//! (`Loaded`, `Created`, `Updated`, `Deleted`, `Failed`).

use postboard_api_types::{Post, PostPayload};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Home,
    Create,
    Details,
    Edit,
}

/// Fields being edited in the create or edit view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form {
    pub title: String,
    pub description: String,
    /// Data URI of the chosen image.
    pub image: Option<String>,
}

impl Form {
    fn from_post(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            description: post.description.clone(),
            image: Some(post.image.clone()),
        }
    }

    fn is_complete(&self) -> bool {
        !self.title.trim().is_empty()
            && !self.description.trim().is_empty()
            && self
                .image
                .as_deref()
                .is_some_and(|image| !image.trim().is_empty())
    }

    fn to_payload(&self) -> PostPayload {
        PostPayload {
            title: Some(self.title.clone()),
            description: Some(self.description.clone()),
            image: self.image.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub view: View,
    /// Cached posts, newest first.
    pub posts: Vec<Post>,
    pub selected: Option<Uuid>,
    pub form: Form,
    /// A create, update or delete call is in flight.
    pub busy: bool,
}

impl ViewState {
    /// Initial state and the fetch that populates it.
    pub fn start() -> (Self, Effect) {
        (Self::default(), Effect::FetchPosts)
    }

    pub fn selected_post(&self) -> Option<&Post> {
        let id = self.selected?;
        self.posts.iter().find(|post| post.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Loaded(Vec<Post>),
    NewPost,
    OpenPost(Uuid),
    Back,
    SetTitle(String),
    SetDescription(String),
    SetImage(String),
    StartEdit,
    Submit,
    Delete,
    Created(Post),
    Updated(Option<Post>),
    Deleted(Uuid),
    Failed(String),
}

impl Event {
    fn is_user_input(&self) -> bool {
        !matches!(
            self,
            Self::Loaded(_) | Self::Created(_) | Self::Updated(_) | Self::Deleted(_) | Self::Failed(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    FetchPosts,
    CreatePost(PostPayload),
    UpdatePost(Uuid, PostPayload),
    DeletePost(Uuid),
    Alert(String),
}

pub const INCOMPLETE_FORM_ALERT: &str = "title, description and image are required";
pub const UPDATE_MISSING_ALERT: &str = "the server returned no post for this update";

pub fn transition(state: ViewState, event: Event) -> (ViewState, Effect) {
    if !event.is_user_input() {
        return complete(state, event);
    }
    if state.busy {
        return (state, Effect::None);
    }
    handle_input(state, event)
}

fn handle_input(mut state: ViewState, event: Event) -> (ViewState, Effect) {
    match (state.view, event) {
        (View::Home, Event::NewPost) => {
            state.form = Form::default();
            state.selected = None;
            state.view = View::Create;
            (state, Effect::None)
        }
        (View::Home, Event::OpenPost(id)) => {
            if state.posts.iter().any(|post| post.id == id) {
                state.selected = Some(id);
                state.view = View::Details;
                (state, Effect::None)
            } else {
                (state, Effect::Alert(format!("no post with id {id}")))
            }
        }
        (View::Create | View::Details, Event::Back) => {
            state.form = Form::default();
            state.selected = None;
            state.view = View::Home;
            (state, Effect::None)
        }
        (View::Edit, Event::Back) => {
            state.form = Form::default();
            state.view = View::Details;
            (state, Effect::None)
        }
        (View::Create | View::Edit, Event::SetTitle(title)) => {
            state.form.title = title;
            (state, Effect::None)
        }
        (View::Create | View::Edit, Event::SetDescription(description)) => {
            state.form.description = description;
            (state, Effect::None)
        }
        (View::Create | View::Edit, Event::SetImage(image)) => {
            state.form.image = Some(image);
            (state, Effect::None)
        }
        (View::Details, Event::StartEdit) => {
            if let Some(form) = state.selected_post().map(Form::from_post) {
                state.form = form;
                state.view = View::Edit;
            }
            (state, Effect::None)
        }
        (View::Create, Event::Submit) => {
            if !state.form.is_complete() {
                return (state, Effect::Alert(INCOMPLETE_FORM_ALERT.to_string()));
            }
            state.busy = true;
            let payload = state.form.to_payload();
            (state, Effect::CreatePost(payload))
        }
        (View::Edit, Event::Submit) => {
            let Some(id) = state.selected else {
                return (state, Effect::None);
            };
            if !state.form.is_complete() {
                return (state, Effect::Alert(INCOMPLETE_FORM_ALERT.to_string()));
            }
            state.busy = true;
            let payload = state.form.to_payload();
            (state, Effect::UpdatePost(id, payload))
        }
        (View::Details, Event::Delete) => {
            let Some(id) = state.selected else {
                return (state, Effect::None);
            };
            state.busy = true;
            (state, Effect::DeletePost(id))
        }
        _ => (state, Effect::None),
    }
}

/// Apply the outcome of a server call, in whatever view the user is in.
fn complete(mut state: ViewState, event: Event) -> (ViewState, Effect) {
    match event {
        Event::Loaded(posts) => {
            state.posts = posts;
            return (state, Effect::None);
        }
        Event::Created(post) => {
            state.posts.insert(0, post);
            state.form = Form::default();
            state.selected = None;
            state.view = View::Home;
        }
        Event::Updated(Some(post)) => {
            let id = post.id;
            if let Some(slot) = state.posts.iter_mut().find(|cached| cached.id == id) {
                *slot = post;
            }
            state.selected = Some(id);
            state.form = Form::default();
            state.view = View::Details;
        }
        Event::Updated(None) => {
            state.busy = false;
            return (state, Effect::Alert(UPDATE_MISSING_ALERT.to_string()));
        }
        Event::Deleted(id) => {
            state.posts.retain(|post| post.id != id);
            state.selected = None;
            state.form = Form::default();
            state.view = View::Home;
        }
        Event::Failed(message) => {
            state.busy = false;
            return (state, Effect::Alert(message));
        }
        _ => return (state, Effect::None),
    }
    state.busy = false;
    (state, Effect::None)
}
