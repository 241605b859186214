//! Line-driven interactive session over the post views.

use std::fmt::Write as _;
use std::io::Write as _;
use std::path::PathBuf;

use time::format_description::well_known::Rfc3339;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::client::{CliError, Ctx};
use crate::io::read_image;
use crate::session::Session;
use crate::view::{Event, View, ViewState};

pub const HELP: &str = "\
commands:
  list                 refresh and show posts
  new                  start a new post
  open <n>             show post number <n>
  title <text>         set the form title
  description <text>   set the form description
  image <path>         attach an image file
  save                 submit the form
  edit                 edit the open post
  delete               delete the open post
  back                 leave the current view
  help                 show this help
  quit                 exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    List,
    New,
    Open(usize),
    Title(String),
    Description(String),
    Image(PathBuf),
    Save,
    Edit,
    Delete,
    Back,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<BrowseCommand, String> {
    let line = line.trim();
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(word, rest)| (word, rest.trim()));

    let command = match word {
        "list" | "ls" => BrowseCommand::List,
        "new" => BrowseCommand::New,
        "open" => {
            let n = rest
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| format!("open needs a post number, got `{rest}`"))?;
            BrowseCommand::Open(n)
        }
        "title" => BrowseCommand::Title(rest.to_string()),
        "description" | "desc" => BrowseCommand::Description(rest.to_string()),
        "image" => {
            if rest.is_empty() {
                return Err("image needs a file path".to_string());
            }
            BrowseCommand::Image(PathBuf::from(rest))
        }
        "save" | "submit" => BrowseCommand::Save,
        "edit" => BrowseCommand::Edit,
        "delete" | "rm" => BrowseCommand::Delete,
        "back" => BrowseCommand::Back,
        "help" | "?" => BrowseCommand::Help,
        "quit" | "exit" | "q" => BrowseCommand::Quit,
        "" => return Err("empty command; try `help`".to_string()),
        other => return Err(format!("unknown command `{other}`; try `help`")),
    };
    Ok(command)
}

/// Resolve a command into a view event. `Err` carries a message for the user.
fn to_event(command: BrowseCommand, state: &ViewState) -> Result<Option<Event>, String> {
    let event = match command {
        BrowseCommand::New => Event::NewPost,
        BrowseCommand::Open(n) => {
            let post = state
                .posts
                .get(n - 1)
                .ok_or_else(|| format!("there is no post number {n}"))?;
            Event::OpenPost(post.id)
        }
        BrowseCommand::Title(title) => Event::SetTitle(title),
        BrowseCommand::Description(description) => Event::SetDescription(description),
        BrowseCommand::Image(path) => {
            let image = read_image(&path).map_err(|err| err.to_string())?;
            Event::SetImage(image.to_data_uri())
        }
        BrowseCommand::Save => Event::Submit,
        BrowseCommand::Edit => Event::StartEdit,
        BrowseCommand::Delete => Event::Delete,
        BrowseCommand::Back => Event::Back,
        BrowseCommand::List | BrowseCommand::Help | BrowseCommand::Quit => return Ok(None),
    };
    Ok(Some(event))
}

fn format_time(value: time::OffsetDateTime) -> String {
    value.format(&Rfc3339).unwrap_or_else(|_| value.to_string())
}

fn describe_image(image: &str) -> String {
    let mime = image
        .strip_prefix("data:")
        .and_then(|rest| rest.split([';', ',']).next())
        .unwrap_or("unknown");
    format!("{mime}, {} chars", image.len())
}

pub fn render(state: &ViewState) -> String {
    let mut out = String::new();
    match state.view {
        View::Home => {
            let _ = writeln!(out, "== posts ({}) ==", state.posts.len());
            if state.posts.is_empty() {
                let _ = writeln!(out, "(no posts yet; `new` to write one)");
            }
            for (index, post) in state.posts.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "{:>3}. {}  [{}]",
                    index + 1,
                    post.title,
                    format_time(post.created_at)
                );
            }
        }
        View::Create | View::Edit => {
            let heading = if state.view == View::Create {
                "new post"
            } else {
                "edit post"
            };
            let _ = writeln!(out, "== {heading} ==");
            let _ = writeln!(out, "title:       {}", state.form.title);
            let _ = writeln!(out, "description: {}", state.form.description);
            let image = state
                .form
                .image
                .as_deref()
                .map_or_else(|| "(none)".to_string(), describe_image);
            let _ = writeln!(out, "image:       {image}");
        }
        View::Details => match state.selected_post() {
            Some(post) => {
                let _ = writeln!(out, "== {} ==", post.title);
                let _ = writeln!(out, "{}", post.description);
                let _ = writeln!(out, "id:      {}", post.id);
                let _ = writeln!(out, "image:   {}", describe_image(&post.image));
                let _ = writeln!(out, "created: {}", format_time(post.created_at));
                let _ = writeln!(out, "updated: {}", format_time(post.updated_at));
            }
            None => {
                let _ = writeln!(out, "(post no longer available; `back` to return)");
            }
        },
    }
    if state.busy {
        let _ = writeln!(out, "(working...)");
    }
    out
}

fn show(state: &ViewState, alerts: &[String]) {
    for alert in alerts {
        println!("! {alert}");
    }
    print!("{}", render(state));
}

fn prompt(state: &ViewState) -> Result<(), CliError> {
    let label = match state.view {
        View::Home => "home",
        View::Create => "create",
        View::Details => "details",
        View::Edit => "edit",
    };
    print!("{label}> ");
    std::io::stdout().flush()?;
    Ok(())
}

pub async fn run(ctx: Ctx) -> Result<(), CliError> {
    let (mut session, alerts) = Session::start(ctx).await;
    show(session.state(), &alerts);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt(session.state())?;
        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("! {message}");
                continue;
            }
        };

        match command {
            BrowseCommand::Quit => break,
            BrowseCommand::Help => {
                println!("{HELP}");
                continue;
            }
            BrowseCommand::List => {
                let alerts = session.refresh().await;
                show(session.state(), &alerts);
                continue;
            }
            _ => {}
        }

        match to_event(command, session.state()) {
            Ok(Some(event)) => {
                let alerts = session.dispatch(event).await;
                show(session.state(), &alerts);
            }
            Ok(None) => {}
            Err(message) => println!("! {message}"),
        }
    }
    Ok(())
}
