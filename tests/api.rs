use std::sync::Arc;

use axum::{
    Router,
    body::{Body, Bytes},
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use postboard::application::posts::PostService;
use postboard::infra::http::{ApiState, build_api_router};
use postboard::infra::memory::MemoryPostsRepo;
use postboard_api_types::{ApiErrorBody, MessageResponse, Post, PostPayload};
use serde::de::DeserializeOwned;
use tower::ServiceExt;
use uuid::Uuid;

const PNG_URI: &str = "data:image/png;base64,iVBORw0KGgo=";
const DEFAULT_LIMIT: usize = 50 * 1024 * 1024;

fn router_with_limit(limit: usize) -> Router {
    let repo = Arc::new(MemoryPostsRepo::new());
    let service = PostService::new(repo.clone(), repo);
    build_api_router(ApiState::new(service), limit)
}

fn router() -> Router {
    router_with_limit(DEFAULT_LIMIT)
}

fn json_request(method: Method, uri: &str, body: &impl serde::Serialize) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).expect("serialize body")))
        .expect("request")
}

fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Bytes) {
    let response = router.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    (status, body)
}

fn decode<T: DeserializeOwned>(body: &Bytes) -> T {
    serde_json::from_slice(body).expect("json body")
}

async fn create(router: &Router, title: &str) -> Post {
    let payload = PostPayload::new(title, format!("{title} description"), PNG_URI);
    let (status, body) = send(router, json_request(Method::POST, "/posts", &payload)).await;
    assert_eq!(status, StatusCode::CREATED);
    decode(&body)
}

async fn list(router: &Router) -> Vec<Post> {
    let (status, body) = send(router, empty_request(Method::GET, "/posts")).await;
    assert_eq!(status, StatusCode::OK);
    decode(&body)
}

#[tokio::test]
async fn create_list_delete_round_trip() {
    let router = router();
    assert!(list(&router).await.is_empty());

    let created = create(&router, "Sunset").await;
    assert_eq!(created.title, "Sunset");
    assert_eq!(created.description, "Sunset description");
    assert_eq!(created.image, PNG_URI);
    assert_eq!(created.created_at, created.updated_at);

    let posts = list(&router).await;
    assert_eq!(posts, vec![created.clone()]);

    let (status, body) = send(
        &router,
        empty_request(Method::DELETE, &format!("/posts/{}", created.id)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let message: MessageResponse = decode(&body);
    assert_eq!(message.message, "post deleted");

    assert!(list(&router).await.is_empty());
}

#[tokio::test]
async fn create_rejects_missing_fields_without_persisting() {
    let router = router();
    let payload = PostPayload {
        title: Some("Only a title".to_string()),
        ..Default::default()
    };

    let (status, body) = send(&router, json_request(Method::POST, "/posts", &payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: ApiErrorBody = decode(&body);
    assert_eq!(error.error.code, "invalid_input");
    assert_eq!(error.error.hint.as_deref(), Some("description, image"));

    assert!(list(&router).await.is_empty());
}

#[tokio::test]
async fn create_rejects_blank_fields() {
    let router = router();
    let payload = PostPayload::new("   ", "text", PNG_URI);

    let (status, _) = send(&router, json_request(Method::POST, "/posts", &payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(list(&router).await.is_empty());
}

#[tokio::test]
async fn create_rejects_image_that_is_not_a_data_uri() {
    let router = router();
    let payload = PostPayload::new("Title", "text", "https://example.com/cat.png");

    let (status, body) = send(&router, json_request(Method::POST, "/posts", &payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: ApiErrorBody = decode(&body);
    assert_eq!(error.error.code, "invalid_input");
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let router = router();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/posts")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .expect("request");

    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: ApiErrorBody = decode(&body);
    assert_eq!(error.error.code, "bad_request");
}

#[tokio::test]
async fn list_returns_newest_first() {
    let router = router();
    let first = create(&router, "first").await;
    let second = create(&router, "second").await;
    let third = create(&router, "third").await;

    let ids: Vec<Uuid> = list(&router).await.into_iter().map(|post| post.id).collect();
    assert_eq!(ids, vec![third.id, second.id, first.id]);
}

#[tokio::test]
async fn update_replaces_content_and_keeps_identity() {
    let router = router();
    let original = create(&router, "Draft").await;

    let payload = PostPayload::new("Final", "Rewritten", "data:image/gif;base64,R0lGODlh");
    let (status, body) = send(
        &router,
        json_request(Method::PUT, &format!("/posts/{}", original.id), &payload),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let updated: Option<Post> = decode(&body);
    let updated = updated.expect("updated post");
    assert_eq!(updated.id, original.id);
    assert_eq!(updated.created_at, original.created_at);
    assert!(updated.updated_at >= original.updated_at);
    assert_eq!(updated.title, "Final");
    assert_eq!(updated.description, "Rewritten");
    assert_eq!(updated.image, "data:image/gif;base64,R0lGODlh");

    assert_eq!(list(&router).await, vec![updated]);
}

#[tokio::test]
async fn update_of_unknown_post_returns_null() {
    let router = router();
    let payload = PostPayload::new("Title", "text", PNG_URI);

    for id in [Uuid::new_v4().to_string(), "not-a-uuid".to_string()] {
        let (status, body) = send(
            &router,
            json_request(Method::PUT, &format!("/posts/{id}"), &payload),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], b"null");
    }

    assert!(list(&router).await.is_empty());
}

#[tokio::test]
async fn update_validates_fields() {
    let router = router();
    let original = create(&router, "Keep").await;

    let payload = PostPayload {
        title: Some("New".to_string()),
        ..Default::default()
    };
    let (status, _) = send(
        &router,
        json_request(Method::PUT, &format!("/posts/{}", original.id), &payload),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(list(&router).await, vec![original]);
}

#[tokio::test]
async fn delete_of_unknown_post_still_succeeds() {
    let router = router();
    let kept = create(&router, "kept").await;

    for id in [Uuid::new_v4().to_string(), "garbage".to_string()] {
        let (status, body) =
            send(&router, empty_request(Method::DELETE, &format!("/posts/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        let message: MessageResponse = decode(&body);
        assert_eq!(message.message, "post deleted");
    }

    assert_eq!(list(&router).await, vec![kept]);
}

#[tokio::test]
async fn unsupported_methods_answer_405() {
    let router = router();
    let id = Uuid::new_v4();

    let cases = [
        (Method::PATCH, "/posts".to_string()),
        (Method::DELETE, "/posts".to_string()),
        (Method::GET, format!("/posts/{id}")),
        (Method::POST, format!("/posts/{id}")),
    ];

    for (method, uri) in cases {
        let (status, body) = send(&router, empty_request(method.clone(), &uri)).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{method} {uri}");
        let error: ApiErrorBody = decode(&body);
        assert_eq!(error.error.code, "method_not_allowed");
    }
}

#[tokio::test]
async fn multipart_upload_is_stored_as_data_uri() {
    let router = router();
    let boundary = "postboard-boundary";
    let image_bytes: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nHarbour\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"description\"\r\n\r\nBoats at dawn\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"harbour.png\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(image_bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/posts")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .expect("request");

    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::CREATED);
    let post: Post = decode(&body);
    assert_eq!(post.title, "Harbour");
    assert_eq!(post.description, "Boats at dawn");
    assert_eq!(post.image, "data:image/png;base64,iVBORw0KGgo=");
}

#[tokio::test]
async fn multipart_without_image_is_rejected() {
    let router = router();
    let boundary = "b0undary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nNo picture\r\n--{boundary}--\r\n"
    );

    let request = Request::builder()
        .method(Method::POST)
        .uri("/posts")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .expect("request");

    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: ApiErrorBody = decode(&body);
    assert_eq!(error.error.hint.as_deref(), Some("description, image"));
    assert!(list(&router).await.is_empty());
}

#[tokio::test]
async fn oversized_body_is_rejected_with_413() {
    let router = router_with_limit(1024);
    let big_image = format!("data:image/png;base64,{}", "A".repeat(4096));
    let payload = PostPayload::new("Big", "too big", big_image);

    let (status, body) = send(&router, json_request(Method::POST, "/posts", &payload)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    let error: ApiErrorBody = decode(&body);
    assert_eq!(error.error.code, "payload_too_large");
    assert!(list(&router).await.is_empty());
}

#[tokio::test]
async fn health_endpoint_reports_memory_store_ready() {
    let router = router();
    let (status, body) = send(&router, empty_request(Method::GET, "/_health/db")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let router = router();
    let ok = router
        .clone()
        .oneshot(empty_request(Method::GET, "/posts"))
        .await
        .expect("response");
    let rejected = router
        .clone()
        .oneshot(empty_request(Method::PATCH, "/posts"))
        .await
        .expect("response");

    let ok_id = ok.headers().get("x-request-id").expect("request id on success");
    let rejected_id = rejected
        .headers()
        .get("x-request-id")
        .expect("request id on error");
    assert_ne!(ok_id, rejected_id);
    assert!(Uuid::parse_str(ok_id.to_str().expect("ascii")).is_ok());
}

const BOUNDARY: &str = "postboard-test-boundary";

enum FormPart<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

fn multipart_request(method: Method, uri: &str, parts: &[FormPart<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        match part {
            FormPart::Text(name, value) => body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            ),
            FormPart::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request")
}

#[tokio::test]
async fn multipart_update_replaces_post() {
    let router = router();
    let created = create(&router, "before").await;

    let request = multipart_request(
        Method::PUT,
        &format!("/posts/{}", created.id),
        &[
            FormPart::Text("title", "after"),
            FormPart::Text("description", "new words"),
            FormPart::File {
                name: "image",
                file_name: "new.gif",
                content_type: "image/gif",
                bytes: b"bar",
            },
        ],
    );
    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::OK);
    let updated: Option<Post> = decode(&body);
    let updated = updated.expect("post exists");
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(updated.title, "after");
    assert_eq!(updated.image, "data:image/gif;base64,YmFy");
    assert_eq!(list(&router).await, vec![updated]);
}

#[tokio::test]
async fn multipart_text_image_is_stored_verbatim() {
    let router = router();
    let request = multipart_request(
        Method::POST,
        "/posts",
        &[
            FormPart::Text("title", "Inline"),
            FormPart::Text("description", "typed in a form"),
            FormPart::Text("image", PNG_URI),
        ],
    );

    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::CREATED);
    let post: Post = decode(&body);
    assert_eq!(post.image, PNG_URI);
}

#[tokio::test]
async fn multipart_keeps_first_value_of_repeated_fields() {
    let router = router();
    let request = multipart_request(
        Method::POST,
        "/posts",
        &[
            FormPart::Text("title", "first"),
            FormPart::Text("title", "second"),
            FormPart::Text("description", "kept"),
            FormPart::Text("description", "dropped"),
            FormPart::Text("image", PNG_URI),
            FormPart::Text("image", "data:image/gif;base64,YmFy"),
        ],
    );

    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::CREATED);
    let post: Post = decode(&body);
    assert_eq!(post.title, "first");
    assert_eq!(post.description, "kept");
    assert_eq!(post.image, PNG_URI);
}

#[tokio::test]
async fn multipart_upload_ignores_content_type_parameters() {
    let router = router();
    let request = multipart_request(
        Method::POST,
        "/posts",
        &[
            FormPart::Text("title", "Params"),
            FormPart::Text("description", "charset on a png"),
            FormPart::File {
                name: "image",
                file_name: "x.png",
                content_type: "image/png; charset=binary",
                bytes: b"foo",
            },
        ],
    );

    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::CREATED);
    let post: Post = decode(&body);
    assert_eq!(post.image, "data:image/png;base64,Zm9v");
}

#[tokio::test]
async fn well_formed_data_uris_are_stored_as_sent() {
    let router = router();
    for image in [
        "data:image/svg+xml,%3Csvg%2F%3E",
        "data:image/png;BASE64,Zm9v",
        "data:image/png;base64,Zm9",
    ] {
        let payload = PostPayload::new("Any", "data uri", image);
        let (status, body) = send(&router, json_request(Method::POST, "/posts", &payload)).await;
        assert_eq!(status, StatusCode::CREATED, "rejected {image}");
        let post: Post = decode(&body);
        assert_eq!(post.image, image);
    }
}
