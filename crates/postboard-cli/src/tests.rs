use std::io::Write as _;

use httpmock::MockServer;
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::args::{Cli, Commands, PostContentArgs, PostsCmd};
use crate::client::{CliError, Ctx, build_ctx_from_cli};
use crate::handlers::posts;
use crate::session::Session;
use crate::view::{Event, View};

const POST_ID: &str = "6f1c9a52-4c1e-4a55-9d39-5a1d7b3f0e21";

fn ctx(server: &MockServer) -> Ctx {
    Ctx::new(&server.base_url()).expect("ctx")
}

fn tmp_file(contents: &[u8], suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("tmp file");
    file.write_all(contents).expect("write tmp");
    file
}

fn post_json(title: &str) -> String {
    format!(
        r#"{{"id":"{POST_ID}","title":"{title}","description":"D","image":"data:image/png;base64,Zm9v","createdAt":"2024-05-01T10:00:00Z","updatedAt":"2024-05-01T10:00:00Z"}}"#
    )
}

fn content(image: &NamedTempFile, upload: bool) -> PostContentArgs {
    PostContentArgs {
        title: "T".into(),
        description: Some("D".into()),
        description_file: None,
        image: image.path().to_path_buf(),
        upload,
    }
}

#[test]
fn build_ctx_requires_site() {
    let cli = Cli {
        site: None,
        command: Commands::Browse,
    };
    let err = build_ctx_from_cli(&cli).expect_err("missing site should fail");
    assert!(matches!(err, CliError::MissingSite));
}

#[test]
fn read_value_prefers_file_over_inline() -> Result<(), CliError> {
    let file = tmp_file(b"from-file", ".txt");
    let val = crate::io::read_value(Some("inline".into()), Some(file.path().to_path_buf()))?;
    assert_eq!(val, "from-file");
    Ok(())
}

#[test]
fn read_image_builds_data_uri_from_extension() -> Result<(), CliError> {
    let file = tmp_file(b"foo", ".png");
    let image = crate::io::read_image(file.path())?;
    assert_eq!(image.mime, "image/png");
    assert_eq!(image.to_data_uri(), "data:image/png;base64,Zm9v");
    Ok(())
}

#[test]
fn read_image_rejects_empty_file() {
    let file = tmp_file(b"", ".gif");
    let err = crate::io::read_image(file.path()).expect_err("empty image");
    assert!(matches!(err, CliError::InvalidInput(_)));
}

#[tokio::test]
async fn posts_list_hits_endpoint() -> Result<(), CliError> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET").path("/posts");
        then.status(200)
            .header("content-type", "application/json")
            .body(format!("[{}]", post_json("listed")));
    });

    posts::handle(&ctx(&server), PostsCmd::List).await?;
    mock.assert();
    Ok(())
}

#[tokio::test]
async fn posts_create_inlines_image_as_data_uri() -> Result<(), CliError> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST")
            .path("/posts")
            .json_body_includes(r#"{"title":"T","description":"D","image":"data:image/png;base64,Zm9v"}"#);
        then.status(201)
            .header("content-type", "application/json")
            .body(post_json("T"));
    });

    let image = tmp_file(b"foo", ".png");
    posts::handle(&ctx(&server), PostsCmd::Create(content(&image, false))).await?;
    mock.assert();
    Ok(())
}

#[tokio::test]
async fn posts_create_with_upload_sends_multipart() -> Result<(), CliError> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST").path("/posts");
        then.status(201)
            .header("content-type", "application/json")
            .body(post_json("T"));
    });

    let image = tmp_file(b"foo", ".png");
    posts::handle(&ctx(&server), PostsCmd::Create(content(&image, true))).await?;
    mock.assert();
    Ok(())
}

#[tokio::test]
async fn posts_update_of_missing_post_is_not_found() {
    let server = MockServer::start();
    let id = Uuid::new_v4();
    let path = format!("/posts/{id}");
    let mock = server.mock(|when, then| {
        when.method("PUT").path(path.as_str());
        then.status(200)
            .header("content-type", "application/json")
            .body("null");
    });

    let image = tmp_file(b"foo", ".png");
    let err = posts::handle(
        &ctx(&server),
        PostsCmd::Update {
            id,
            content: content(&image, false),
        },
    )
    .await
    .expect_err("missing post");
    assert!(matches!(err, CliError::NotFound(missing) if missing == id));
    mock.assert();
}

#[tokio::test]
async fn posts_delete_hits_item_endpoint() -> Result<(), CliError> {
    let server = MockServer::start();
    let id = Uuid::new_v4();
    let path = format!("/posts/{id}");
    let mock = server.mock(|when, then| {
        when.method("DELETE").path(path.as_str());
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"message":"post deleted"}"#);
    });

    posts::handle(&ctx(&server), PostsCmd::Delete { id }).await?;
    mock.assert();
    Ok(())
}

#[tokio::test]
async fn session_create_flow_prepends_server_post() {
    let server = MockServer::start();
    let list = server.mock(|when, then| {
        when.method("GET").path("/posts");
        then.status(200)
            .header("content-type", "application/json")
            .body("[]");
    });
    let create = server.mock(|when, then| {
        when.method("POST").path("/posts");
        then.status(201)
            .header("content-type", "application/json")
            .body(post_json("A"));
    });

    let (mut session, alerts) = Session::start(ctx(&server)).await;
    assert!(alerts.is_empty());
    list.assert();

    for event in [
        Event::NewPost,
        Event::SetTitle("A".into()),
        Event::SetDescription("D".into()),
        Event::SetImage("data:image/png;base64,Zm9v".into()),
    ] {
        assert!(session.dispatch(event).await.is_empty());
    }
    let alerts = session.dispatch(Event::Submit).await;
    assert!(alerts.is_empty(), "unexpected alerts: {alerts:?}");
    create.assert();

    let state = session.state();
    assert_eq!(state.view, View::Home);
    assert!(!state.busy);
    assert_eq!(state.posts.len(), 1);
    assert_eq!(state.posts[0].title, "A");
}

#[tokio::test]
async fn session_surfaces_server_errors_as_alerts() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/posts");
        then.status(200)
            .header("content-type", "application/json")
            .body("[]");
    });
    server.mock(|when, then| {
        when.method("POST").path("/posts");
        then.status(400)
            .header("content-type", "application/json")
            .body(r#"{"error":{"code":"invalid_input","message":"Invalid post"}}"#);
    });

    let (mut session, _) = Session::start(ctx(&server)).await;
    for event in [
        Event::NewPost,
        Event::SetTitle("A".into()),
        Event::SetDescription("D".into()),
        Event::SetImage("data:image/png;base64,Zm9v".into()),
    ] {
        session.dispatch(event).await;
    }

    let alerts = session.dispatch(Event::Submit).await;
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].contains("400"));
    assert!(alerts[0].ends_with("Invalid post"), "alert: {}", alerts[0]);
    assert_eq!(session.state().view, View::Create);
    assert!(!session.state().busy);
    assert!(session.state().posts.is_empty());
}
