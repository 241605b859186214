use postboard_api_types::{ApiErrorBody, MessageResponse, POSTS_PATH, Post, PostPayload, post_path};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, Response, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

use crate::args::Cli;
use crate::io::ImageFile;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("no site given; pass --site or set POSTBOARD_SITE_URL")]
    MissingSite,
    #[error("cannot read {path}: {source}")]
    InputFile {
        path: String,
        source: std::io::Error,
    },
    #[error("terminal: {0}")]
    Terminal(#[from] std::io::Error),
    #[error("bad site url: {0}")]
    Url(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server answered {status}: {message}")]
    Server { status: StatusCode, message: String },
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("no post with id {0}")]
    NotFound(Uuid),
    #[error("{0}")]
    InvalidInput(String),
}

/// Text fields plus the raw image file for a multipart submission.
#[derive(Debug, Clone)]
pub struct UploadForm {
    pub title: String,
    pub description: String,
    pub image: ImageFile,
}

impl UploadForm {
    fn into_form(self) -> Result<Form, CliError> {
        let part = Part::bytes(self.image.bytes)
            .file_name(self.image.file_name)
            .mime_str(&self.image.mime)?;
        Ok(Form::new()
            .text("title", self.title)
            .text("description", self.description)
            .part("image", part))
    }
}

const USER_AGENT: &str = concat!("postboard-cli/", env!("CARGO_PKG_VERSION"));

/// Typed calls against one postboard site.
#[derive(Clone, Debug)]
pub struct Ctx {
    pub client: Client,
    pub base: Url,
}

impl Ctx {
    pub fn new(site: &str) -> Result<Self, CliError> {
        let base = Url::parse(site)?.join("/")?;
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client, base })
    }

    fn url(&self, path: &str) -> Result<Url, CliError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(CliError::Url)
    }

    pub async fn list_posts(&self) -> Result<Vec<Post>, CliError> {
        self.request::<(), _>(Method::GET, POSTS_PATH, None).await
    }

    pub async fn create_post(&self, payload: &PostPayload) -> Result<Post, CliError> {
        self.request(Method::POST, POSTS_PATH, Some(payload)).await
    }

    pub async fn upload_post(&self, form: UploadForm) -> Result<Post, CliError> {
        self.multipart(Method::POST, POSTS_PATH, form).await
    }

    /// `None` when the server had no post with this id.
    pub async fn update_post(
        &self,
        id: Uuid,
        payload: &PostPayload,
    ) -> Result<Option<Post>, CliError> {
        self.request(Method::PUT, &post_path(id), Some(payload))
            .await
    }

    pub async fn upload_update(&self, id: Uuid, form: UploadForm) -> Result<Option<Post>, CliError> {
        self.multipart(Method::PUT, &post_path(id), form).await
    }

    pub async fn delete_post(&self, id: Uuid) -> Result<MessageResponse, CliError> {
        self.request::<(), _>(Method::DELETE, &post_path(id), None)
            .await
    }

    async fn request<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, CliError> {
        let mut req = self.client.request(method, self.url(path)?);
        if let Some(b) = body {
            req = req.json(b);
        }

        let resp = req.send().await?;
        Self::handle(resp).await
    }

    async fn multipart<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        form: UploadForm,
    ) -> Result<T, CliError> {
        let resp = self
            .client
            .request(method, self.url(path)?)
            .multipart(form.into_form()?)
            .send()
            .await?;
        Self::handle(resp).await
    }

    /// Decode a success body, or turn the error envelope into `CliError::Server`.
    async fn handle<T: DeserializeOwned>(resp: Response) -> Result<T, CliError> {
        let status = resp.status();
        let body = resp.bytes().await?;
        if status.is_success() {
            return Ok(serde_json::from_slice(&body)?);
        }

        let message = match serde_json::from_slice::<ApiErrorBody>(&body) {
            Ok(ApiErrorBody { error }) => match error.hint {
                Some(hint) => format!("{} ({hint})", error.message),
                None => error.message,
            },
            Err(_) => String::from_utf8_lossy(&body).trim().to_string(),
        };
        Err(CliError::Server { status, message })
    }
}

pub fn build_ctx_from_cli(cli: &Cli) -> Result<Ctx, CliError> {
    cli.site.as_deref().ok_or(CliError::MissingSite).and_then(Ctx::new)
}
